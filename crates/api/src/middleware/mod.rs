//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Trailing slash normalization (wraps the router)
//! 2. Sentry layers (capture errors, transactions)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Rate limiting on credential routes (governor)
//! 6. Auth extractors, per handler

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AccessDenied, RequireAuth, RequireCustomer, RequireRetailer, authorize};
pub use rate_limit::{RateLimiterLayer, auth_rate_limiter};
pub use request_id::request_id_middleware;
