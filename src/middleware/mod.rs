/// Request middleware
///
/// Access-token verification for the protected `/api/v1/users` routes.

mod jwt_middleware;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
