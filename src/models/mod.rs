pub mod collection;
pub mod endpoint;
pub mod user;

pub use collection::Collection;
pub use endpoint::{Endpoint, EndpointFields};
pub use user::{NewUser, User};
