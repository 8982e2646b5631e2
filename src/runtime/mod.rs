//! Runtime adapters: interrupt binding and main-loop pollers.

pub mod binding;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_poller;

pub use binding::interrupt_binding;
#[cfg(feature = "tokio-runtime")]
pub use tokio_poller::{spawn_poller, PollerHandle};
