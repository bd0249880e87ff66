/// Authentication module
///
/// Token issuance/verification and password hashing.

mod claims;
mod jwt;
mod password;

pub use claims::Claims;
pub use jwt::issue_token;
pub use jwt::verify_token;
pub use password::hash_password;
pub use password::verify_password;
