// Export modules for use in tests
pub mod panic_handler;
pub mod pdf;
pub mod settings;

pub mod test_utils;

// Re-export the viewer core
pub use pdf::{DocumentBackend, Viewer, ViewerConfig, ViewerError};
