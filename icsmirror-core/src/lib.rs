//! Core of icsmirror: one-way mirroring of an ICS feed into a remote calendar.
//!
//! - `event` holds the canonical `CalendarEntry` every feed entry is normalized into
//! - `ics` turns feed text into entries
//! - `remote` defines the remote event model and the `CalendarService` seam
//! - `sync` runs the reconciliation pipeline against a `CalendarService`

pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod remote;
pub mod sync;
pub mod timezone;

pub use config::SyncConfig;
pub use error::{CoreError, CoreResult, RemoteError, RemoteResult};
pub use event::{CalendarEntry, EventTime};
pub use remote::CalendarService;
pub use sync::{Reconciler, SyncReport};
