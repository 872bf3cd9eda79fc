//! Authentication state and persisted session storage.

pub mod session;
pub mod store;

pub use session::{AuthPhase, AuthSession};
pub use store::{SessionStore, StoredSession};
