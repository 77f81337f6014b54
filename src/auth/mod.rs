pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod utils;

pub use claims::{Claims, RefreshClaims};
pub use jwt::{IssuedTokens, JwtService};
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use password::{hash_password, hash_token, verify_password};
pub use utils::require_self;
