use crate::cli::{Commands, ServeArgs};
use crate::ingest::forward_lines;
use crate::metrics::{MetricsServer, PtpMetrics};
use crate::parser::{parse_ptp4l_line, Parser};
use crate::{Result, TelemetryError};
use ptp_common::ProcessType;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const UNRECOGNIZED_LINE: &str = "Line is not a ptp4l master offset or rms report";

pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve(args) => handle_serve(args).await,
        Commands::Parse { line } => handle_parse(&line),
    }
}

async fn handle_serve(args: ServeArgs) -> Result<()> {
    args.validate()?;

    let node_name = args.resolve_node_name();
    let process = ProcessType::from_name(&args.process);
    info!(
        "Publishing {} metrics for node {}, network {}",
        process, node_name, args.network
    );

    let metrics = PtpMetrics::new()?;

    MetricsServer::new(args.listen_addr.clone(), metrics.clone())
        .with_retry_interval(Duration::from_secs(args.retry_interval_secs))
        .spawn();

    let shutdown = CancellationToken::new();
    let (tx, rx) = mpsc::channel(args.channel_capacity);

    let parser = tokio::spawn(Parser::new(node_name, metrics, shutdown.clone(), rx).run());

    let network = args.network.clone();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        match forward_lines(stdin, &network, process, tx).await {
            Ok(count) => info!("Input closed after {} lines", count),
            Err(e) => warn!("Failed to read log input: {}", e),
        }
    });

    wait_for_shutdown().await?;
    info!("Shutdown signal received");
    shutdown.cancel();

    match parser.await {
        Ok(result) => result?,
        Err(e) => error!("Parser task failed: {}", e),
    }

    info!("ptp-telemetry stopped");
    Ok(())
}

fn handle_parse(line: &str) -> Result<()> {
    println!("{}", render_parse(line)?);
    Ok(())
}

/// Pretty JSON of the extracted fields, or a note that the line is not a report
fn render_parse(line: &str) -> Result<String> {
    match parse_ptp4l_line(line) {
        Some(sample) => serde_json::to_string_pretty(&sample)
            .map_err(|e| TelemetryError::EncodingError(e.to_string())),
        None => Ok(UNRECOGNIZED_LINE.to_string()),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_parse_prints_fields_as_json() {
        let output =
            render_parse("ptp4l[123.456]: master offset 10 s2 freq -20000 path delay 500").unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "offset": 10,
                "frequency": -20000,
                "path_delay": 500,
            })
        );
    }

    #[test]
    fn test_render_parse_unrecognized_line() {
        let output = render_parse("ptp4l[10.1]: selected /dev/ptp0 as PTP clock").unwrap();

        assert_eq!(output, UNRECOGNIZED_LINE);
    }

    #[tokio::test]
    async fn test_parse_command_succeeds() {
        let result = handle_command(Commands::Parse {
            line: "ptp4l[1.0]: rms 1 max 2 freq 3 +/- 4 delay 5 +/- 6".to_string(),
        })
        .await;

        assert!(result.is_ok());
    }
}
