//! Log-to-metric parser loop
//!
//! Consumes [`Message`]s in channel order and publishes ptp4l measurements
//! for this node. The loop is the only writer of offset series and never
//! blocks on anything but the next message or the shutdown signal.

pub mod line;

pub use line::{parse_ptp4l_line, Ptp4lSample, ReportLayout};

use crate::metrics::PtpMetrics;
use crate::Result;
use ptp_common::{Message, ProcessType};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Parser {
    node_name: String,
    metrics: PtpMetrics,
    shutdown: CancellationToken,
    messages: mpsc::Receiver<Message>,
}

impl Parser {
    pub fn new(
        node_name: impl Into<String>,
        metrics: PtpMetrics,
        shutdown: CancellationToken,
        messages: mpsc::Receiver<Message>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            metrics,
            shutdown,
            messages,
        }
    }

    /// Process messages until shutdown is signalled or every sender is gone.
    ///
    /// Messages still queued at shutdown are dropped.
    pub async fn run(mut self) -> Result<()> {
        self.metrics.register()?;

        info!("PTP log parser started for node {}", self.node_name);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("PTP log parser stop signal received, exiting");
                    return Ok(());
                }
                msg = self.messages.recv() => match msg {
                    Some(msg) => self.handle_message(&msg),
                    None => {
                        info!("PTP log channel closed, parser exiting");
                        return Ok(());
                    }
                },
            }
        }
    }

    fn handle_message(&self, msg: &Message) {
        match msg.process() {
            ProcessType::Ptp4l => {
                debug!(
                    "Parser message({}) received: {}",
                    msg.process(),
                    msg.content()
                );
                match parse_ptp4l_line(msg.content()) {
                    Some(sample) => {
                        self.metrics
                            .update_ptp4l_metrics(&self.node_name, msg.name(), &sample)
                    }
                    None => debug!("No ptp4l report in line from {}", msg.name()),
                }
            }
            ProcessType::Phc2sys => {
                debug!(
                    "Parser message({}) received: {}",
                    msg.process(),
                    msg.content()
                );
            }
            ProcessType::Other(name) => {
                debug!(
                    "Ignoring message of unknown type {} from {}",
                    name,
                    msg.name()
                );
            }
        }
    }
}
