use crate::auth::SessionStore;
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(conn: Connection, sessions: SessionStore) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            sessions,
        }
    }
}
