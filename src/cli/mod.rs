//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;

// Re-export commonly used types
pub use app::{
    load_merged_config, run_crop, run_generate, run_stitch, RunError, EXIT_ERROR, EXIT_SUCCESS,
    EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, CropArgs, GenerateAction, RenderArgs, StitchArgs};
pub use config_cmd::handle_config_command;
pub use presenter::Presenter;
