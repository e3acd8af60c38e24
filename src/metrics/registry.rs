//! Labeled gauge series for ptp4l synchronization quality
//!
//! One [`PtpMetrics`] is built per process and cloned into both the parser
//! loop (writer) and the HTTP exporter (reader). The prometheus crate does
//! per-series atomic sets, so no extra locking is needed here.
//!
//! Series handles are cached once created. Reads go through the cache only,
//! so looking up a pair that was never written does not export it.

use crate::parser::Ptp4lSample;
use crate::{Result, TelemetryError};
use dashmap::DashMap;
use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tracing::debug;

pub const PTP4L_RMS_METRIC: &str = "ptp4l_root_mean_square_value";
pub const NODE_LABEL: &str = "node";
pub const NETWORK_LABEL: &str = "network";

#[derive(Clone)]
pub struct PtpMetrics {
    registry: Registry,
    ptp4l_rms: IntGaugeVec,
    /// (node, network) -> series handle
    series: Arc<DashMap<(String, String), IntGauge>>,
}

impl PtpMetrics {
    /// Create the gauge family and register it with a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create the gauge family and register it with an existing registry.
    ///
    /// Fails if the registry already holds a family with the same name: a
    /// second gauge vector would never be exported.
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let ptp4l_rms = IntGaugeVec::new(
            Opts::new(
                PTP4L_RMS_METRIC,
                "Root mean square of master offset for ptp4l instance.",
            ),
            &[NODE_LABEL, NETWORK_LABEL],
        )?;

        registry.register(Box::new(ptp4l_rms.clone()))?;

        Ok(Self {
            registry,
            ptp4l_rms,
            series: Arc::new(DashMap::new()),
        })
    }

    /// Register the gauge family. Registering it again is a no-op.
    pub fn register(&self) -> Result<()> {
        match self.registry.register(Box::new(self.ptp4l_rms.clone())) {
            Ok(()) => Ok(()),
            Err(prometheus::Error::AlreadyReg) => {
                debug!("{} already registered", PTP4L_RMS_METRIC);
                Ok(())
            }
            Err(e) => Err(TelemetryError::MetricsError(e)),
        }
    }

    /// Set the series for (node, network) to `value`, creating it on first use
    pub fn set_offset_metric(&self, node: &str, network: &str, value: i64) {
        self.series
            .entry((node.to_string(), network.to_string()))
            .or_insert_with(|| self.ptp4l_rms.with_label_values(&[node, network]))
            .set(value);
    }

    /// Publish the measurements of one parsed ptp4l line
    pub fn update_ptp4l_metrics(&self, node: &str, network: &str, sample: &Ptp4lSample) {
        self.set_offset_metric(node, network, sample.offset);
    }

    /// Current value of the series for (node, network), if it was ever set
    pub fn offset(&self, node: &str, network: &str) -> Option<i64> {
        self.series
            .get(&(node.to_string(), network.to_string()))
            .map(|gauge| gauge.get())
    }

    /// Render all registered families in the text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();

        encoder
            .encode(&families, &mut buf)
            .map_err(|e| TelemetryError::EncodingError(e.to_string()))?;

        String::from_utf8(buf).map_err(|e| TelemetryError::EncodingError(e.to_string()))
    }
}
