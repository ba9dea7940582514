mod cli;

use clap::Parser;
use env_logger::Env;

use cli::{Args, Command, SimulateOptions};
use leafsnap::config::Config;

/// Load environment variables from .env file.
/// Silently ignores if .env file doesn't exist.
fn load_env() {
    let _ = dotenv::dotenv();
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    load_env();

    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    // If --config is specified, require the file to exist
    if let Some(ref path) = args.config {
        if !path.exists() {
            eprintln!("Error: Config file not found: {}", path.display());
            std::process::exit(1);
        }
    }
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Serve { bind } => cli::serve(&config, bind).await,
        Command::Identify { file, relay, json } => cli::identify(&config, &file, relay, json).await,
        Command::Simulate {
            rig,
            facing,
            switch,
            no_events,
            out,
            identify,
            relay,
        } => {
            let opts = SimulateOptions {
                rig,
                facing,
                switch,
                no_events,
                out,
                identify,
                relay,
            };
            cli::simulate(&config, opts).await
        }
        Command::Config { action } => cli::handle_config_action(&config, action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
