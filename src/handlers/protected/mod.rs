// Protected handlers - bearer authentication required (see middleware::auth)
pub mod auth;
pub mod events;
pub mod guests;
pub mod profile;

pub use auth::sign_out;

pub use profile::get as profile_get;
pub use profile::put as profile_put;

pub use events::create as event_create;
pub use events::delete as event_delete;
pub use events::get as event_get;
pub use events::list as event_list;
pub use events::patch as event_patch;

pub use guests::add as guest_add;
pub use guests::check_in as guest_check_in;
pub use guests::list as guest_list;
pub use guests::remove as guest_remove;
pub use guests::scan as guest_scan;
