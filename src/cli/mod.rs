pub mod commands;

use crate::{Result, TelemetryError};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ptp-telemetry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish linuxptp synchronization quality as Prometheus metrics", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Parse log lines from stdin and serve metrics over HTTP")]
    Serve(ServeArgs),
    #[command(about = "Parse a single ptp4l log line and print the extracted fields")]
    Parse {
        #[arg(help = "Raw ptp4l log line")]
        line: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(
        short,
        long,
        env = "PTP_METRICS_ADDR",
        default_value = "0.0.0.0:9091",
        help = "Metrics server listen address (host:port)"
    )]
    pub listen_addr: String,

    #[arg(
        long,
        env = "NODE_NAME",
        help = "Node label for published series (defaults to the host name)"
    )]
    pub node_name: Option<String>,

    #[arg(short, long, help = "Network label for ingested lines, e.g. the interface name")]
    pub network: String,

    #[arg(short, long, default_value = "ptp4l", help = "Process that produced the lines (ptp4l, phc2sys)")]
    pub process: String,

    #[arg(long, default_value_t = 1000, help = "Capacity of the parser message channel")]
    pub channel_capacity: usize,

    #[arg(long, default_value_t = 5, help = "Seconds to wait before restarting a failed metrics server")]
    pub retry_interval_secs: u64,
}

impl ServeArgs {
    pub fn validate(&self) -> Result<()> {
        if self.network.trim().is_empty() {
            return Err(TelemetryError::ConfigError(
                "network label must not be empty".to_string(),
            ));
        }
        if self.process.trim().is_empty() {
            return Err(TelemetryError::ConfigError(
                "process name must not be empty".to_string(),
            ));
        }
        if matches!(&self.node_name, Some(name) if name.trim().is_empty()) {
            return Err(TelemetryError::ConfigError(
                "node name must not be empty".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(TelemetryError::ConfigError(
                "channel capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Explicit node name, else the host name, else "unknown"
    pub fn resolve_node_name(&self) -> String {
        self.node_name
            .clone()
            .or_else(|| {
                hostname::get()
                    .ok()
                    .map(|h| h.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}
