//! Tracer engine.
//!
//! This module contains the [`Tracer`] lifecycle, the endpoint registry and
//! the scheduler loop that drives probe batches.

mod registry;
mod scheduler;
mod status;
mod tracer;

pub use status::Status;
pub use tracer::Tracer;
