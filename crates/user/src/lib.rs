mod error;
mod jwt;
mod password;
mod queries;
mod types;

pub use error::{UserError, UserResult};
pub use jwt::{generate_jwt, validate_jwt, Claims};
pub use password::{hash_password, verify_password};
pub use queries::{authenticate, create_user, spend_action_token, user_by_id, NewUser};
pub use types::User;
