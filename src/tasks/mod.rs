//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: purges expired entries from every named cache (opt-in)

mod sweep;

pub use sweep::spawn_sweep_task;
