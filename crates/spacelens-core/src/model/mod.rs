/// Data model — the size-annotated file tree and display helpers.
pub mod node;
pub mod size;

pub use node::Node;
pub use size::{format_count, format_size};
