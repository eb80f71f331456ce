use np_database::init::Connection;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Connection,
    pub page_size: u32,
}

impl AppState {
    pub fn new(db: Connection, page_size: u32) -> Self {
        Self { db, page_size }
    }
}
