//! Reelforge CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use reelforge::cli::{
    app::{load_merged_config, run_crop, run_generate, run_stitch, EXIT_ERROR},
    args::{Cli, Commands, RenderArgs},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use reelforge::domain::config::AppConfig;
use reelforge::infrastructure::XdgConfigStore;

fn init_logging(verbose: bool) {
    let default = if verbose { "reelforge=debug" } else { "reelforge=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Logs share stderr with the presenter; stdout stays clean for results
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Settings shared by both compositor commands
fn render_config(render: &RenderArgs) -> AppConfig {
    AppConfig {
        frame_rate: render.fps,
        encodings: render.encodings.clone(),
        origin: render.origin.clone(),
        ..Default::default()
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let presenter = Presenter::new();

    let result = match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Commands::Stitch(args) => {
            // Build CLI config from args
            let cli_config = AppConfig {
                image_duration: args.duration.clone(),
                stitch_timeout: args.render.timeout.clone(),
                monitor_audio: if args.monitor { Some(true) } else { None },
                ..render_config(&args.render)
            };
            let config = load_merged_config(cli_config).await;
            run_stitch(args, config).await
        }
        Commands::Crop(args) => {
            let cli_config = AppConfig {
                crop_timeout: args.render.timeout.clone(),
                ..render_config(&args.render)
            };
            let config = load_merged_config(cli_config).await;
            run_crop(args, config).await
        }
        Commands::Generate { action } => {
            let config = load_merged_config(AppConfig::empty()).await;
            run_generate(action, config).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            presenter.error(e.message());
            e.exit_code()
        }
    }
}
