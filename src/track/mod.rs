// Track geometry and the registry that maps session track names to it

pub mod registry;
pub mod types;

// Re-export commonly used types
pub use registry::{FileBasedRegistry, InMemoryRegistry, TrackEntry, TrackRegistry};
pub use types::TrackDefinition;
