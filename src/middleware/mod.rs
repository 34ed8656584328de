pub mod require_login;
pub mod session;

pub use require_login::require_login;
pub use session::{session_middleware, Session};
