//! Small helpers shared by the services, vault and export modules.

pub mod encoding;
pub mod hashing;
pub mod paths;
pub mod text;
