pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use middleware::{optional_access, require_access, require_admin};
