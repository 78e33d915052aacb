//! Business logic services.

pub mod events;
pub mod localized;
pub mod users;

pub use events::EventService;
pub use localized::{owned_by, LocalizedService};
pub use users::UserService;
