pub mod cli;
pub mod commands;
pub mod utils;

// Re-export commonly used items
pub use cli::Cli;

/// Process exit code for a failed invocation: 2 for usage errors, 1 otherwise
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<toolbox_core::Error>() {
        Some(err) if err.is_usage() => 2,
        _ => 1,
    }
}
