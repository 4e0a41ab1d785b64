//! Command-line fan-out control of Wiz lights.
//!
//! Every subcommand performs one fan-out run, prints exactly one JSON
//! object to stdout (an error-shaped body on whole-run failure), and exits
//! non-zero when the run did not succeed. Operation parameters arrive
//! either as address arguments (`on`, `off`) or as a JSON request
//! (`color`, `warm-white`, `cold-white`), matching the scripts this tool
//! replaces.
//!
//! Run with: wiz-fanout --help

use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;

use wiz_fanout::{
    Brightness, Color, Connect, Error, FanoutConfig, FanoutController, Operation, SuccessPolicy,
    TargetResult, White, WizConnector, broadcast_address, discover_bulbs,
};

#[derive(Parser)]
#[command(name = "wiz-fanout")]
#[command(about = "Batched fan-out control of Wiz smart lights", long_about = None)]
struct Cli {
    /// Targets started together before waiting for the group
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Maximum simultaneous in-flight operations
    #[arg(long, global = true)]
    max_concurrent: Option<usize>,

    /// Per-attempt deadline in seconds
    #[arg(long, global = true)]
    attempt_timeout: Option<u64>,

    /// Additional attempts after a first timed-out attempt
    #[arg(long, global = true)]
    retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover bulbs on the network and query each one's state
    Discover {
        /// Discovery timeout in seconds
        #[arg(short, long, default_value = "5")]
        timeout: u64,

        /// Broadcast address for the probe (default: BROADCAST_ADDRESS
        /// environment variable, falling back to 255.255.255.255)
        #[arg(short, long)]
        broadcast: Option<Ipv4Addr>,
    },

    /// Turn the given bulbs on
    On {
        /// Bulb IP addresses
        ips: Vec<Ipv4Addr>,
    },

    /// Turn the given bulbs off
    Off {
        /// Bulb IP addresses
        ips: Vec<Ipv4Addr>,
    },

    /// Set an RGB color from a JSON request:
    /// {"ips": ["10.0.0.1"], "color": [255, 0, 0], "brightness": 80}
    Color {
        /// JSON request body
        request: String,
    },

    /// Set warm white intensity from a JSON request:
    /// {"ips": ["10.0.0.1"], "intensity": 80}
    WarmWhite {
        /// JSON request body
        request: String,
    },

    /// Set cold white intensity from a JSON request:
    /// {"ips": ["10.0.0.1"], "intensity": 80}
    ColdWhite {
        /// JSON request body
        request: String,
    },
}

impl Cli {
    fn fanout_config(&self) -> FanoutConfig {
        let mut config = FanoutConfig::default();
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(max_concurrent) = self.max_concurrent {
            config.max_concurrent = max_concurrent;
        }
        if let Some(secs) = self.attempt_timeout {
            config.attempt_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.retries {
            config.max_retries = retries;
        }
        config
    }
}

#[derive(Deserialize)]
struct ColorRequest {
    ips: Vec<Ipv4Addr>,
    color: [u8; 3],
    brightness: Option<u8>,
}

#[derive(Deserialize)]
struct WhiteRequest {
    ips: Vec<Ipv4Addr>,
    intensity: u8,
}

#[derive(Serialize)]
struct DiscoverResponse {
    success: bool,
    count: usize,
    bulbs: Vec<TargetResult>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            // Whole-run failures still produce a JSON body for the caller.
            println!("{}", json!({"success": false, "error": err.to_string()}));
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<bool, Error> {
    let controller = FanoutController::with_config(WizConnector, cli.fanout_config());

    match cli.command {
        Commands::Discover { timeout, broadcast } => {
            let broadcast = broadcast.unwrap_or_else(broadcast_address);
            let bulbs = discover_bulbs(broadcast, Duration::from_secs(timeout)).await?;
            let targets: Vec<Ipv4Addr> = bulbs.iter().map(|b| b.ip).collect();

            let result = controller
                .run(&targets, &Operation::QueryState, SuccessPolicy::Any)
                .await;
            let response = DiscoverResponse {
                success: result.overall_success,
                count: result.total_count,
                bulbs: result.results,
            };
            emit(&response)?;
            Ok(response.success)
        }

        Commands::On { ips } => run_control(&controller, &ips, Operation::TurnOn).await,

        Commands::Off { ips } => run_control(&controller, &ips, Operation::TurnOff).await,

        Commands::Color { request } => {
            let request: ColorRequest = parse_request(&request)?;
            let brightness = request
                .brightness
                .map(|level| {
                    Brightness::create(level)
                        .ok_or_else(|| Error::input("brightness must be between 10 and 100"))
                })
                .transpose()?;
            let [red, green, blue] = request.color;
            let op = Operation::SetColor {
                color: Color::rgb(red, green, blue),
                brightness,
            };
            run_control(&controller, &request.ips, op).await
        }

        Commands::WarmWhite { request } => {
            let request: WhiteRequest = parse_request(&request)?;
            let white = parse_intensity(request.intensity)?;
            run_control(&controller, &request.ips, Operation::SetWarmWhite(white)).await
        }

        Commands::ColdWhite { request } => {
            let request: WhiteRequest = parse_request(&request)?;
            let white = parse_intensity(request.intensity)?;
            run_control(&controller, &request.ips, Operation::SetColdWhite(white)).await
        }
    }
}

async fn run_control<C: Connect>(
    controller: &FanoutController<C>,
    targets: &[Ipv4Addr],
    op: Operation,
) -> Result<bool, Error> {
    let result = controller.run(targets, &op, SuccessPolicy::All).await;
    emit(&result)?;
    Ok(result.overall_success)
}

fn parse_request<'a, T: Deserialize<'a>>(raw: &'a str) -> Result<T, Error> {
    serde_json::from_str(raw).map_err(|e| Error::input(format!("malformed request: {e}")))
}

fn parse_intensity(intensity: u8) -> Result<White, Error> {
    White::create(intensity).ok_or_else(|| Error::input("intensity must be between 1 and 100"))
}

fn emit<T: Serialize>(body: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string(body).map_err(Error::JsonDump)?);
    Ok(())
}
