// Re-export all model types for ease of use

pub mod archive;
pub mod node;

pub use archive::*;
pub use node::*;
