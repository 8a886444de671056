/// Spacelens Core — scanning, caching, and treemap layout.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`] — Size-annotated file tree and supporting types.
/// - [`scanner`] — Depth-bounded, batch-concurrent filesystem scanning.
/// - [`cache`] — Path-keyed on-disk cache of scan results.
/// - [`treemap`] — Squarified treemap layout (pure geometry).
/// - [`engine`] — Scan-request façade tying scanner and cache together.
/// - [`reveal`] — Open a path in the host's file browser.
/// - [`error`] — Error taxonomy for scan and cache operations.
pub mod cache;
pub mod engine;
pub mod error;
pub mod model;
pub mod reveal;
pub mod scanner;
pub mod treemap;

pub use engine::{Engine, ScanOutcome};
pub use error::{CacheError, ScanError};
pub use model::Node;
