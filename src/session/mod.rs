//! Client-side authentication state: the controller, the display-name
//! prompt and the view gate built on top of them.

pub mod controller;
pub mod error;
pub mod gate;
pub mod ports;
pub mod prompt;

pub use controller::{AuthController, AuthSnapshot, AuthState};
pub use error::{ProfileUpdateError, SignOutError};
pub use gate::GateView;
pub use ports::{ProfileStore, ServiceError, SessionStore};
pub use prompt::DisplayNamePrompt;
