//! End-to-end journey tests for the coordination engine.
//!
//! The harness drives a real `Coordinator` through channel-backed fake
//! connections; no sockets are involved, so every journey is
//! deterministic.

pub mod harness;
