//! Shared types for the netpulse API.
//!
//! Plain row/record structs as they are served on the wire, the typed query
//! structs consumed by `np-database`, and the pagination envelope. This crate
//! does no I/O; row mapping from the database lives in `np-database`.

pub mod atlas;
pub mod disco;
pub mod hegemony;
pub mod link;
pub mod metis;
pub mod network;
pub mod traceroute;
pub mod wire;
