//! Command-line interface.
//!
//! The parser and dispatcher live in `commands`; each subcommand has its
//! own module.

mod commands;

pub use commands::run;

/// Check if verbose mode is enabled (for early logging setup, before
/// clap has parsed anything).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}
