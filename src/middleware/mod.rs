/// Middleware module
///
/// Custom middleware for authentication, webhook keys and hit counting.

mod api_key_middleware;
mod hit_counter;
mod jwt_middleware;

pub use api_key_middleware::ApiKeyMiddleware;
pub use hit_counter::{HitCounter, HitCounterMiddleware};
pub use jwt_middleware::JwtMiddleware;
