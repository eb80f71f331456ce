//! netpulse HTTP server
//!
//! Read-only JSON API over the measurement database: router, handlers,
//! query-parameter validation, pagination envelope, and error mapping. The
//! binary entry point in `main.rs` wires the environment, the pool, and the
//! listener together.

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod params;
pub mod router;
pub mod state;
