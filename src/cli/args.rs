//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use leafsnap::camera::FacingMode;

use super::enums::Rig;

/// Identify plants from photos or a live camera session
#[derive(Parser, Debug)]
#[command(name = "leafsnap")]
#[command(version, about = "Plant identification from photos and camera captures", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Run the identification relay (needs PLANT_ID_API_KEY)
    leafsnap serve

    # Identify a photo through the relay
    leafsnap identify monstera.jpg

    # Drive a simulated front-only device and save the still
    leafsnap simulate --rig front-only --facing environment --out still.jpg

ENVIRONMENT:
    PLANT_ID_API_KEY    Plant.id API key used by `serve`.
    RUST_LOG            Log filter (default: info).")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the identification relay server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Identify a plant photo through the relay
    Identify {
        /// Image file (JPEG or PNG)
        file: PathBuf,

        /// Relay base URL (overrides config)
        #[arg(long)]
        relay: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Run a camera session against simulated hardware
    Simulate {
        /// Simulated device
        #[arg(long, value_enum, default_value_t = Rig::Phone)]
        rig: Rig,

        /// Requested camera (default from config)
        #[arg(long)]
        facing: Option<FacingMode>,

        /// Switch cameras once before capturing
        #[arg(long)]
        switch: bool,

        /// Skip sink events and rely on the readiness fallback check
        #[arg(long)]
        no_events: bool,

        /// Where to write the captured JPEG
        #[arg(long, short, default_value = "capture.jpg")]
        out: PathBuf,

        /// Send the capture to the relay for identification
        #[arg(long)]
        identify: bool,

        /// Relay base URL (overrides config)
        #[arg(long)]
        relay: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init,
}
