pub mod engine;
pub mod object;
pub mod metadata;
pub mod local;

pub use engine::*;
pub use object::*;
pub use metadata::*;
