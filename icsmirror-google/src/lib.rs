//! Google Calendar v3 backend for icsmirror.
//!
//! `GoogleCalendar` implements the core's `CalendarService` over plain REST;
//! `session` and `authenticate` take care of OAuth tokens.

pub mod authenticate;
pub mod client;
pub mod credentials;
pub mod google_event;
pub mod session;
pub mod types;

pub use client::{CALENDAR_API, GoogleCalendar};
pub use credentials::ClientSecret;
pub use session::Session;
