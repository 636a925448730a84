//! Multi-network fire-and-forget transaction dispatcher.
//!
//! Every configured network gets an endpoint pool, an optimistic sequence allocator and a
//! dispatcher; one scheduler loop drives them all while a signal producer keeps the shared
//! target register current.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod pool;
pub mod runtime;
pub mod scheduler;
pub mod sequence;
pub mod signal;
pub mod sizing;
pub mod target;
pub mod transport;
