pub mod loader;
pub mod resolved;
pub mod types;

pub use loader::SpaceBuilder;
pub use resolved::*;
pub use types::*;
