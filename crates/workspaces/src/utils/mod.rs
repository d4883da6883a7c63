//! Internal utilities shared by the services.

pub mod permissions;
pub mod validation;

pub use permissions::PermissionChecker;
pub use validation::{format_file_size, Validator};
