//! One handler module per API area. Each handler validates its parameters,
//! builds the typed query for `np-database`, and wraps the page in the
//! pagination envelope.

pub mod countries;
pub mod disco;
pub mod hegemony;
pub mod link;
pub mod metis;
pub mod network_delay;
pub mod networks;
pub mod root;
pub mod tr_hegemony;
