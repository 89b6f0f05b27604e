pub mod auth;
pub mod response;

pub use auth::{auth_middleware, extract_bearer_token, optional_session, AuthUser};
pub use response::{ApiResponse, ApiResult};
