//! collarsim - Main Entry Point
//!
//! Wires the remote collaborators, credential provisioner, MQTT connector,
//! and publish loop together from a TOML config and runs the device.

use clap::{Parser, Subcommand};
use collarsim::cadence::CadenceController;
use collarsim::clock::SystemClock;
use collarsim::config::{EncoderKind, SimulatorConfig};
use collarsim::credentials::CredentialProvisioner;
use collarsim::error::SimulatorError;
use collarsim::observability::{init_default_logging, LogMirror};
use collarsim::publisher::{LoopOptions, PublishLoop};
use collarsim::simulate::{HerdPositionSource, HerdVitalsSource};
use collarsim::sources::{
    HttpEndpointResolver, HttpParameterStore, HttpSecretStore, ParameterStore,
};
use collarsim::telemetry::{Encoder, PositionEncoder, ReadingSource, VitalsEncoder, VitalsSchema};
use collarsim::transport::MqttConnector;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Mock IoT collar telemetry publisher
#[derive(Parser)]
#[command(name = "collarsim")]
#[command(about = "Mock IoT collar simulator publishing telemetry over TLS MQTT")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the device simulator
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting collarsim v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_simulator(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<SimulatorConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(SimulatorConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = ["collarsim.toml", "config/collarsim.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(SimulatorConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create collarsim.toml"
            );
            process::exit(1);
        }
    }
}

async fn run_simulator(config: SimulatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        client_id = %config.device.client_id,
        encoder = ?config.device.encoder,
        testing = config.device.testing,
        "device starting"
    );

    let parameter_store = Arc::new(HttpParameterStore::new(&config.sources.parameter_store_url));

    // The topic is required for production but testing mode makes no network
    // calls at all, so it uses a local placeholder of the same shape.
    let topic = if config.device.testing {
        format!("testing/{}", config.device.client_id)
    } else {
        parameter_store
            .get_parameter(&config.settings.topic_parameter)
            .await
            .map_err(SimulatorError::RequiredSetting)?
    };
    info!(topic = %topic, "publish topic resolved");

    let secret_store = Arc::new(HttpSecretStore::new(&config.sources.secret_store_url));
    let resolver = Arc::new(HttpEndpointResolver::new(&config.sources.endpoint_api_url));
    let provisioner = CredentialProvisioner::new(
        secret_store,
        &config.device.secret_name,
        &config.sources.trust_root_url,
        config.sources.artifact_dir.clone(),
    );
    let connector = MqttConnector::new(
        &config.device.client_id,
        config.mqtt.clone(),
        resolver,
        provisioner,
    );
    let cadence = CadenceController::new(
        parameter_store.clone(),
        &config.settings.interval_parameter,
        config.settings.fallback_interval_secs,
    );

    let encoder: Box<dyn Encoder> = match config.device.encoder {
        EncoderKind::Position => Box::new(PositionEncoder::new(topic.clone())),
        EncoderKind::Vitals => Box::new(VitalsEncoder::new(topic.clone(), VitalsSchema::default())),
    };
    let source: Box<dyn ReadingSource> = match config.device.encoder {
        EncoderKind::Position => Box::new(HerdPositionSource::new(config.device.herd_size)),
        EncoderKind::Vitals => Box::new(HerdVitalsSource::new(config.device.herd_size)),
    };

    let options = LoopOptions {
        reconnect_backoff: Duration::from_secs(config.settings.reconnect_backoff_secs),
        testing: config.device.testing,
        testing_interval: Duration::from_secs(config.settings.testing_interval_secs),
    };

    let mut publish_loop = PublishLoop::new(
        connector,
        encoder,
        source,
        cadence,
        Arc::new(SystemClock),
        topic,
        options,
    );
    if let Some(url) = &config.sources.log_mirror_url {
        publish_loop = publish_loop.with_mirror(LogMirror::new(url, &config.device.client_id));
    }

    // Runs until the process is killed; only an encoder defect returns
    publish_loop.run().await?;
    Ok(())
}

fn handle_config_command(
    config: SimulatorConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
