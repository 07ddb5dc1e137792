// Authentication module
// Decision: one of two token strategies is live per process (stored opaque
// token or signed token), selected by configuration
// Decision: cookie-based sessions for the UI, bearer tokens for API clients

pub mod bootstrap;
pub mod config;
pub mod middleware;
pub mod policy;
pub mod routes;
pub mod token;

pub use bootstrap::ensure_bootstrap_admin;
pub use config::{AuthConfig, AuthStrategy};
pub use middleware::{AuthState, AuthUser};
pub use routes::routes;
