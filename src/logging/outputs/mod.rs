//! Output handlers for different logging destinations
//!
//! - Console output (with colors)
//! - File output (success/error split)

pub mod console;
pub mod file;

pub use console::ConsoleOutput;
pub use file::FileOutput;
