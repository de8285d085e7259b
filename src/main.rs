//! Climate relay controller - main entry point
//!
//! Starts the control loop and the HTTP shell, and releases the relay on
//! Ctrl-C.

use climate_relay::{
    climate::{
        control_loop::ControlLoop,
        gate::CommandGate,
        lock::SystemClock,
        overrides::OverrideApi,
    },
    config::ServerConfig,
    hardware::{Actuator, IioHumiditySensor, OpenWeatherClient, SensorSource, SysfsGpioRelay},
    logging::{init_logging, LogConfig},
    mock::{MockActuator, MockSensor, MockWeather},
    server::{AppState, HttpServer},
};

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Climate relay controller
#[derive(Parser, Debug)]
#[command(name = "climate-relay")]
#[command(about = "Hysteresis thermostat for a single heating/cooling relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Config {
    /// TOML configuration file
    #[arg(long, env = "CLIMATE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Also write logs to this file (rotated daily)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    /// Use in-memory sensor, relay and weather instead of hardware
    #[arg(long)]
    simulate: bool,
}

impl Config {
    /// Load layered configuration and apply command line overrides
    fn server_config(&self) -> climate_relay::Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;

        if let Some(host) = &self.host {
            config.http.host = host.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(log_file) = &self.log_file {
            config.logging.file = Some(log_file.clone());
        }
        if self.json_logs {
            config.logging.json = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Config::parse();
    let config = cli.server_config().context("loading configuration")?;

    init_logging(LogConfig::from_config(&config.logging, cli.debug)?)
        .context("initializing logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        simulate = cli.simulate,
        "Starting climate relay controller"
    );

    let actuator: Box<dyn Actuator> = if cli.simulate {
        Box::new(MockActuator::new())
    } else {
        // Without the relay there is nothing to control.
        Box::new(
            SysfsGpioRelay::open(
                &config.relay.gpio_base,
                config.relay.line,
                config.relay.active_low,
            )
            .await
            .context("opening relay GPIO line")?,
        )
    };

    let sensor: Box<dyn SensorSource> = if cli.simulate {
        Box::new(MockSensor::new(
            config.policy.lower_bound() - 0.5,
            45.0,
        ))
    } else {
        Box::new(IioHumiditySensor::new(
            &config.sensor.device_dir,
            config.control.sensor_retry.clone(),
        ))
    };

    let gate = Arc::new(CommandGate::new(actuator, Arc::new(SystemClock)));

    let mut control = ControlLoop::new(
        gate.clone(),
        sensor,
        config.policy,
        config.control.poll_interval,
    );

    if cli.simulate {
        control = control.with_weather(
            Box::new(MockWeather::new(10.0, 60.0)),
            config.weather.location_code.clone(),
        );
    } else if let Some(api_key) = config.weather.enabled_key() {
        let client = OpenWeatherClient::new(
            config.weather.base_url()?,
            api_key,
            config.weather.timeout,
        )?;
        control = control.with_weather(Box::new(client), config.weather.location_code.clone());
    } else {
        warn!("No weather API key configured, outdoor override disabled");
    }

    let shutdown = CancellationToken::new();

    let control_task = tokio::spawn(control.run(shutdown.clone()));

    let server = HttpServer::new(
        config.http.clone(),
        AppState {
            api: OverrideApi::new(gate.clone()),
            policy: config.policy,
        },
    );
    let server_task = tokio::spawn(server.start(shutdown.clone()));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
        signal_token.cancel();
    });

    let server_result = server_task.await.context("HTTP server task panicked")?;
    // A server that fails to start takes the controller down with it.
    shutdown.cancel();
    control_task.await.context("control loop task panicked")?;

    if let Err(e) = gate.close().await {
        error!("Failed to release relay: {e}");
    }

    server_result?;
    info!("Climate relay controller stopped");
    Ok(())
}
