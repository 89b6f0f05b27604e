// Public handlers - no authentication required
pub mod auth;
pub mod qr;

pub use auth::current_user;
pub use auth::login;
pub use qr::get as qr_get;
