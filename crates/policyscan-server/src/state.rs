//! Shared application state

use crate::config::ServerConfig;
use crate::extract::{PdfTextExtractor, TextExtractor};
use metrics_exporter_prometheus::PrometheusHandle;
use policyscan_analysis::{AnalysisConfig, PatternRegistry, PolicyAnalyzer};
use std::sync::Arc;
use tracing::info;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    /// Assembled analysis pipeline
    pub analyzer: Arc<PolicyAnalyzer>,

    /// Pattern set the pipeline was built from
    pub registry: Arc<PatternRegistry>,

    /// Upload-to-text converter
    pub extractor: Arc<dyn TextExtractor>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Initialize application state from configuration
    ///
    /// Fails when the pattern set cannot be loaded; the server must not start
    /// without a valid registry.
    pub fn new(config: &ServerConfig, metrics_handle: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        info!("Initializing application state");

        let registry = Arc::new(config.load_registry()?);
        let mut state = Self::from_parts(registry, &config.analysis, Arc::new(PdfTextExtractor::new()))?;
        state.metrics_handle = metrics_handle;
        state.max_upload_bytes = config.max_upload_bytes;

        info!(
            "Pattern set v{} ready with {} patterns, extractor: {}",
            state.registry.version(),
            state.registry.pattern_count(),
            state.extractor.name()
        );
        Ok(state)
    }

    /// Build state from an already loaded registry and a custom extractor
    pub fn from_parts(
        registry: Arc<PatternRegistry>,
        analysis: &AnalysisConfig,
        extractor: Arc<dyn TextExtractor>,
    ) -> anyhow::Result<Self> {
        let analyzer = PolicyAnalyzer::new(registry.clone(), analysis)?;
        Ok(Self {
            analyzer: Arc::new(analyzer),
            registry,
            extractor,
            metrics_handle: None,
            max_upload_bytes: ServerConfig::default().max_upload_bytes,
        })
    }

    /// Override the upload limit
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}
