//! Remote-API layer: the reqwest-backed journal and auth clients, client
//! configuration, and the file-backed session store.

pub mod auth;
pub mod config;
pub mod journal;
pub mod session_store;

pub use auth::AuthClient;
pub use config::ClientConfig;
pub use journal::JournalClient;
pub use session_store::SessionStore;
