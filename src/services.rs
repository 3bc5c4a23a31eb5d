pub mod auth_service;
pub mod dashboard_service;
pub mod dataset_service;
pub mod session_store;

pub use auth_service::{AuthError, AuthService};
pub use dataset_service::{DatasetKey, DatasetService};
pub use session_store::{SessionState, SessionStore};
