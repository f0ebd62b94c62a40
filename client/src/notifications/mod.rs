//! Notification badge support.

pub mod poller;

pub use poller::{PollerHandle, UnreadPoller};
