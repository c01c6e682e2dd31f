//! Murmur Listeners - Polling state machines over the external sources.
//!
//! Each listener exposes an explicit `tick()` that runs one
//! poll-process cycle, and a `run()` loop that adds the interval sleep, a
//! shutdown signal checked at tick boundaries, and an optional iteration
//! bound for tests and one-shot runs. Listeners hold all state per
//! instance; two listeners in one process never share anything but the
//! database.

mod document;
mod error;
mod interactions;

#[cfg(test)]
pub(crate) mod test_support;

pub use document::{DocumentListener, DocumentListenerConfig, DocumentTickSummary};
pub use error::{ListenerError, ListenerResult};
pub use interactions::{
    InteractionListener, InteractionListenerConfig, InteractionTickSummary, ResponseMode,
};
