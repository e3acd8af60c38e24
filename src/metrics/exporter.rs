//! HTTP exposition of [`PtpMetrics`]
//!
//! The server is supervised: a failed bind or a listener that stops serving
//! is logged and retried after a fixed interval for the life of the process.

use crate::metrics::PtpMetrics;
use crate::{Result, TelemetryError};
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const METRICS_PATH: &str = "/metrics";
pub const HEALTHZ_PATH: &str = "/healthz";
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Build the exporter routes over a shared registry
pub fn router(metrics: PtpMetrics) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route(METRICS_PATH, get(metrics_handler))
        .route(HEALTHZ_PATH, get(healthz_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PtpMetrics>) -> Response {
    match metrics.encode() {
        Ok(body) => ([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn healthz_handler() -> (StatusCode, &'static str) {
    (
        StatusCode::OK,
        StatusCode::OK.canonical_reason().unwrap_or("OK"),
    )
}

async fn index_handler() -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>PTP Daemon Metrics Server</title></head>\n\
         <body>\n\
         <h1>PTP Metrics</h1>\n\
         <ul>\n\
         <li><a href='{METRICS_PATH}'>metrics</a></li>\n\
         <li><a href='{HEALTHZ_PATH}'>healthz</a></li>\n\
         </ul>\n\
         </body>\n\
         </html>\n"
    ))
}

pub struct MetricsServer {
    address: String,
    metrics: PtpMetrics,
    retry_interval: Duration,
}

impl MetricsServer {
    /// `address` is a `host:port` string, resolved on every bind attempt
    pub fn new(address: impl Into<String>, metrics: PtpMetrics) -> Self {
        Self {
            address: address.into(),
            metrics,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Run the server as an independent background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Serve forever, restarting the listener after every failure
    pub async fn run(self) {
        let app = router(self.metrics.clone());

        loop {
            match self.serve_once(app.clone()).await {
                Ok(()) => warn!("Metrics server on {} stopped serving", self.address),
                Err(e) => error!("Starting metrics server failed: {}", e),
            }

            tokio::time::sleep(self.retry_interval).await;
        }
    }

    async fn serve_once(&self, app: Router) -> Result<()> {
        let listener =
            TcpListener::bind(self.address.as_str())
                .await
                .map_err(|source| TelemetryError::BindFailed {
                    address: self.address.clone(),
                    source,
                })?;

        info!("Metrics server listening on {}", self.address);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    async fn get_path(app: Router, path: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_healthz_independent_of_registry() {
        let metrics = PtpMetrics::new().unwrap();

        let (status, body) = get_path(router(metrics.clone()), HEALTHZ_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        metrics.set_offset_metric("node1", "eth0", 1);
        let (status, _) = get_path(router(metrics), HEALTHZ_PATH).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_lists_series() {
        let metrics = PtpMetrics::new().unwrap();
        metrics.set_offset_metric("node1", "eth0", -42);

        let response = router(metrics)
            .oneshot(Request::get(METRICS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            prometheus::TEXT_FORMAT
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let series: Vec<&str> = text
            .lines()
            .filter(|line| line.starts_with("ptp4l_root_mean_square_value{"))
            .collect();

        assert_eq!(series.len(), 1);
        assert!(series[0].contains("node=\"node1\""));
        assert!(series[0].contains("network=\"eth0\""));
        assert_eq!(
            series[0].rsplit(' ').next().unwrap().parse::<f64>().unwrap(),
            -42.0
        );
    }

    #[tokio::test]
    async fn test_index_links_endpoints() {
        let (status, body) = get_path(router(PtpMetrics::new().unwrap()), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("href='/metrics'"));
        assert!(body.contains("href='/healthz'"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (status, _) = get_path(router(PtpMetrics::new().unwrap()), "/debug").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_retries_until_address_is_free() {
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = blocker.local_addr().unwrap();

        let server = MetricsServer::new(addr.to_string(), PtpMetrics::new().unwrap())
            .with_retry_interval(Duration::from_millis(50));
        let handle = server.spawn();

        // Let at least one bind attempt fail
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!handle.is_finished());
        drop(blocker);

        let mut response = String::new();
        for _ in 0..100 {
            if let Ok(mut stream) = TcpStream::connect(addr).await {
                stream
                    .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                    .await
                    .unwrap();
                stream.read_to_string(&mut response).await.unwrap();
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        handle.abort();

        assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
        assert!(response.ends_with("OK"));
    }
}
