pub mod exporter;
pub mod registry;

pub use exporter::{router, MetricsServer};
pub use registry::PtpMetrics;
