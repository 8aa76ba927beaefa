pub mod loader;
pub mod types;

pub use loader::parse_bool;
pub use types::*;
