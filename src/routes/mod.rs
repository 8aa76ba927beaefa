pub mod common;
pub mod docs;

pub use common::{health, root, HealthBody, MessageBody};
