//! Subcommand handlers for serve, identify, simulate and config actions.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use leafsnap::camera::synthetic::{SyntheticPlatform, SyntheticSink};
use leafsnap::camera::{CameraSession, FacingMode, ReadyState, SinkEvent};
use leafsnap::config::{default_path as get_config_path, Config, DEFAULT_CONFIG_TOML};
use leafsnap::identify::{IdentifyClient, IdentifyError, PlantIdClient};
use leafsnap::server::{self, AppState};

use super::args::ConfigAction;
use super::enums::Rig;

/// Number of suggestions printed by `identify` without `--json`.
const SUGGESTIONS_SHOWN: usize = 3;

/// Run the identification relay until Ctrl+C.
pub async fn serve(config: &Config, bind: Option<SocketAddr>) -> Result<(), String> {
    let api_key = config
        .identify
        .resolved_api_key()
        .ok_or_else(|| IdentifyError::MissingApiKey.to_string())?;

    let upstream = PlantIdClient::with_base_url(api_key, config.identify.base_url.clone())
        .map_err(|e| e.to_string())?
        .with_geo_hint(config.identify.geo_hint());
    let state = AppState::new(upstream).with_network_retries(config.identify.network_retries);

    let addr = bind.unwrap_or(config.server.bind);
    server::serve(addr, state)
        .await
        .map_err(|e| format!("Relay failed on {}: {}", addr, e))
}

/// Identify a photo from disk through the relay.
pub async fn identify(
    config: &Config,
    file: &Path,
    relay: Option<String>,
    json: bool,
) -> Result<(), String> {
    let relay = relay.unwrap_or_else(|| config.identify.relay_url.clone());
    let client = IdentifyClient::new(relay).map_err(|e| e.to_string())?;

    println!("Identifying {} via {}...", file.display(), client.base_url());
    let result = client.identify_file(file).await.map_err(|e| e.to_string())?;
    print_result(&result, json)
}

/// Options for the `simulate` subcommand.
#[derive(Debug)]
pub struct SimulateOptions {
    pub rig: Rig,
    pub facing: Option<FacingMode>,
    pub switch: bool,
    pub no_events: bool,
    pub out: PathBuf,
    pub identify: bool,
    pub relay: Option<String>,
}

/// Drive a camera session against simulated hardware and save the capture.
pub async fn simulate(config: &Config, opts: SimulateOptions) -> Result<(), String> {
    let platform = Arc::new(opts.rig.platform());
    let session = CameraSession::with_settings(platform, config.camera.session_settings());
    let sink = SyntheticSink::new();
    session.bind_sink(sink.clone());

    let devices = session.enumerate_devices().await;
    if devices.is_empty() {
        println!("No cameras found.");
    } else {
        println!("Available cameras:");
        for device in &devices {
            println!("  {}", device);
        }
    }

    let facing = opts.facing.unwrap_or_else(|| session.facing_mode());
    if let Err(e) = session.start(facing).await {
        println!("Camera status: {}", session.status());
        return Err(e.to_string());
    }
    println!(
        "Camera status: {} (requested {}, using {})",
        session.status(),
        facing,
        session.facing_mode()
    );
    wait_until_ready(&session, &sink, opts.no_events).await?;

    if opts.switch {
        session.switch_camera().await.map_err(|e| e.to_string())?;
        println!("Switched to {} camera", session.facing_mode());
        wait_until_ready(&session, &sink, opts.no_events).await?;
    }

    let frame = session.capture().map_err(|e| e.to_string())?;
    session.stop();

    tokio::fs::write(&opts.out, &frame.jpeg)
        .await
        .map_err(|e| format!("Failed to write {}: {}", opts.out.display(), e))?;
    println!(
        "Saved {}x{} capture to {}{}",
        frame.width,
        frame.height,
        opts.out.display(),
        if frame.mirrored { " (mirrored)" } else { "" }
    );

    if opts.identify {
        let relay = opts
            .relay
            .unwrap_or_else(|| config.identify.relay_url.clone());
        let client = IdentifyClient::new(relay).map_err(|e| e.to_string())?;
        let result = client
            .identify_frame(&frame)
            .await
            .map_err(|e| e.to_string())?;
        print_result(&result, false)?;
    }

    Ok(())
}

async fn wait_until_ready(
    session: &CameraSession<SyntheticPlatform>,
    sink: &SyntheticSink,
    no_events: bool,
) -> Result<(), String> {
    sink.advance(ReadyState::HaveMetadata);
    if !no_events {
        session.handle_sink_event(SinkEvent::LoadedMetadata);
    }
    sink.advance(ReadyState::HaveEnoughData);
    if !no_events {
        session.handle_sink_event(SinkEvent::CanPlay);
        session.handle_sink_event(SinkEvent::Playing);
    } else {
        session.readiness_fallback().await;
    }

    if session.is_video_ready() {
        println!("Camera status: {}", session.status());
        Ok(())
    } else {
        Err("Video never became ready".to_string())
    }
}

fn print_result(result: &Value, json: bool) -> Result<(), String> {
    let suggestions = result
        .pointer("/result/classification/suggestions")
        .and_then(Value::as_array);

    match suggestions {
        Some(suggestions) if !json => {
            if suggestions.is_empty() {
                println!("No plant suggestions returned.");
            }
            for (i, suggestion) in suggestions.iter().take(SUGGESTIONS_SHOWN).enumerate() {
                let name = suggestion
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let probability = suggestion
                    .get("probability")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                let common = suggestion
                    .pointer("/details/common_names/0")
                    .and_then(Value::as_str);
                match common {
                    Some(common) => println!(
                        "  {}. {} ({}) {:.1}%",
                        i + 1,
                        name,
                        common,
                        probability * 100.0
                    ),
                    None => println!("  {}. {} {:.1}%", i + 1, name, probability * 100.0),
                }
            }
            Ok(())
        }
        _ => {
            let pretty = serde_json::to_string_pretty(result).map_err(|e| e.to_string())?;
            println!("{}", pretty);
            Ok(())
        }
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(config: &Config, action: ConfigAction) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Relay bind: {}", config.server.bind);
            println!("  Plant.id URL: {}", config.identify.base_url);
            println!(
                "  API key: {}",
                if config.identify.resolved_api_key().is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!("  Relay URL: {}", config.identify.relay_url);
            println!(
                "  Location: {}, {}",
                config.identify.latitude, config.identify.longitude
            );
            println!("  Network retries: {}", config.identify.network_retries);
            println!("  Initial camera: {}", config.camera.facing);
            println!("  Ready fallback: {}ms", config.camera.ready_fallback_ms);
            println!();

            let config_path = get_config_path();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            let config_path = get_config_path();

            if config_path.exists() {
                return Err(format!(
                    "Config file already exists: {}\nUse 'leafsnap config show' to view current settings.",
                    config_path.display()
                ));
            }

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Error creating config directory: {}", e))?;
            }
            std::fs::write(&config_path, DEFAULT_CONFIG_TOML)
                .map_err(|e| format!("Error writing config file: {}", e))?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(rig: Rig, out: PathBuf) -> SimulateOptions {
        SimulateOptions {
            rig,
            facing: None,
            switch: false,
            no_events: false,
            out,
            identify: false,
            relay: None,
        }
    }

    #[tokio::test]
    async fn test_simulate_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("still.jpg");

        simulate(&Config::default(), opts(Rig::Phone, out.clone()))
            .await
            .unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_simulate_unsupported_rig_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("still.jpg");

        let err = simulate(&Config::default(), opts(Rig::Unsupported, out.clone()))
            .await
            .unwrap_err();
        assert!(err.contains("not supported"));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_simulate_fallback_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("still.jpg");
        let mut config = Config::default();
        config.camera.ready_fallback_ms = 10;

        let mut options = opts(Rig::FrontOnly, out.clone());
        options.no_events = true;
        options.switch = true;
        simulate(&config, options).await.unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_print_result_handles_unexpected_shape() {
        assert!(print_result(&serde_json::json!({"status": "COMPLETED"}), false).is_ok());
    }
}
