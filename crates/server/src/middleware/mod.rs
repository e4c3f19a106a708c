//! HTTP middleware stack for the shop API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (permissive, the browser client may be served elsewhere)
//! 5. Rate limiting (governor, per route group)
//!
//! Authentication is done per handler through the extractors in [`auth`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthUser, RequireActiveUser, RequireAuth, RequireManager};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
