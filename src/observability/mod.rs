//! Observability
//!
//! Structured logging through `tracing`. Call sites log with a typed
//! [`Event`] in the `event` field:
//!
//! ```ignore
//! use stocktake::observability::Event;
//!
//! tracing::info!(event = %Event::SnapshotWritten, path = %path.display(), "snapshot written");
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::init_tracing;
