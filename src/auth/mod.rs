// Authentication: bcrypt passwords, HS256 JWTs and the bearer-token extractor

pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod service;

pub use errors::AuthError;
pub use jwt::{extract_bearer_token, Claims, JwtService};
pub use middleware::AuthUser;
pub use service::AuthService;
