//! Shared server state.

pub mod sessions;
pub mod store;

pub use sessions::SessionStore;
pub use store::AppState;
