mod auth;
mod request_log;

pub use auth::{auth_middleware, CurrentUser};
pub use request_log::request_log_middleware;
