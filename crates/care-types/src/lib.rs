pub mod entities;
pub mod query;
pub mod role;
pub mod session;

pub use entities::*;
pub use query::QueryKey;
pub use role::Role;
pub use session::{AuthToken, Identity, Session};
