//! netpulse database crate
//!
//! Postgres access for the netpulse API:
//! - Pool construction from the environment (`init`).
//! - Table registry and idempotent schema setup, including TimescaleDB
//!   hypertable conversion, compression configuration, and secondary
//!   indexes (`schema`).
//! - Ordering/pagination helpers shared by the query modules (`filter`).
//! - One query module per API domain, each returning a page of wire rows
//!   plus the total count of the filtered set.
//!
//! All predicates are bound parameters; identifier fragments (ordering
//! columns, table names) only ever come from static whitelists.

pub mod disco;
pub mod filter;
pub mod hegemony;
pub mod init;
pub mod link;
pub mod metis;
pub mod network_delay;
pub mod networks;
pub mod schema;
pub mod tr_hegemony;
