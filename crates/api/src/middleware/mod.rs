//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Path normalization (trailing slash trimmed before routing)
//! 2. Sentry layers (hub per request, HTTP transaction)
//! 3. `TraceLayer` (request span with method, uri, status, latency)
//! 4. Request ID (recorded on the span, Sentry scope and response header)
//!
//! Authentication is not a layer: protected handlers take the
//! [`RequireAuth`] extractor, so public routes need no exemption list.

pub mod auth;
pub mod request_id;

pub use auth::RequireAuth;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
