pub mod auth;
pub mod event;
pub mod guest;
pub mod qr;
pub mod start;
