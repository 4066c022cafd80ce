//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and under the `test-support` feature.

mod clock;
mod in_memory;
mod notifier;

pub use clock::MutableClock;
pub use in_memory::{CallCounts, InMemoryBackend};
pub use notifier::RecordingNotifier;
