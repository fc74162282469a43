pub mod session;

pub use session::{generate_session_token, is_safe_redirect, validate_session_token, SESSION_COOKIE};
