pub mod auth;
pub mod error_handling;
pub mod request_logging;
pub mod security_headers;
pub mod validation;

pub use auth::{auth_middleware, Claims, JwtService};
pub use request_logging::request_logging;
pub use security_headers::security_headers_middleware;
