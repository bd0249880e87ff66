/// Middleware module
///
/// Role-gated authentication for protected routes.

mod auth_guard;

pub use auth_guard::AuthGuard;
