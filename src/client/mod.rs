//! Core library client for type-context
//!
//! This module provides the main client interface for using type-context
//! as a library in your own Rust applications.

use crate::config::Config;
use crate::context::extract_context;
use crate::error::{ContextError, ValidationError};
use crate::paths::{normalize_workspace, resolve_in_workspace};
use crate::provider::provider_for;
use crate::types::*;

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Main client for extracting type context
///
/// Every extraction gets its own symbol provider, started and shut down
/// inside the call, so one client can serve concurrent requests.
///
/// # Example
///
/// ```no_run
/// use type_context::{ContextClient, ExtractRequest};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = ContextClient::new()?;
///
///     let request = ExtractRequest::new(
///         "/path/to/project",
///         "src/model.rs",
///         "pub fn area(&self) -> f64",
///     );
///     let response = client.extract(request).await?;
///     println!("{}", response.context);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ContextClient {
    pub(crate) config: Arc<Config>,
}

impl ContextClient {
    /// Create a new client from the default configuration file and environment
    pub fn new() -> Result<Self> {
        let config = Config::new().context("Failed to load configuration")?;
        Ok(Self::with_config(config))
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: Config) -> Self {
        tracing::debug!(
            "Context client: merge_impls={}, ignore_std={}, timeout={}s",
            config.extraction.merge_impls,
            config.extraction.ignore_std,
            config.extraction.timeout_secs
        );
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract the type context of one function
    ///
    /// The extraction runs on a blocking thread and is bounded by
    /// `extraction.timeout_secs`; exceeding it fails the call with a provider
    /// timeout. A blocking task cannot be aborted, so on timeout the
    /// extraction is flagged as cancelled and stops at its next dependent
    /// type, shutting its provider down. Building the workspace index is not
    /// interrupted.
    pub async fn extract(&self, request: ExtractRequest) -> Result<ExtractResponse> {
        request.validate().map_err(|e| anyhow::anyhow!(e))?;

        let config = self.config.clone();
        let secs = config.extraction.timeout_secs;
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let task =
            tokio::task::spawn_blocking(move || run_extraction(&config, &request, Some(flag)));

        match tokio::time::timeout(Duration::from_secs(secs), task).await {
            Ok(joined) => Ok(joined.context("Extraction task panicked")??),
            Err(_) => {
                cancelled.store(true, Ordering::Relaxed);
                tracing::warn!("Extraction exceeded {}s; cancelling the call", secs);
                Err(ContextError::timeout("extract", secs.saturating_mul(1000)).into())
            }
        }
    }

    /// Extract many functions in parallel, one provider per request
    ///
    /// Results keep input order. A failed request yields an empty context
    /// and its error message instead of failing the batch.
    pub async fn extract_batch(&self, requests: Vec<ExtractRequest>) -> Result<Vec<BatchExtractResult>> {
        let config = self.config.clone();
        let start = Instant::now();

        let results = tokio::task::spawn_blocking(move || {
            requests
                .par_iter()
                .map(|request| batch_entry(&config, request))
                .collect::<Vec<_>>()
        })
        .await
        .context("Batch extraction task panicked")?;

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        tracing::info!(
            "Batch of {} extractions finished in {} ms ({} failed)",
            results.len(),
            start.elapsed().as_millis(),
            failed
        );
        Ok(results)
    }
}

fn batch_entry(config: &Config, request: &ExtractRequest) -> BatchExtractResult {
    let (context, error) = match run_extraction(config, request, None) {
        Ok(response) => (response.context, None),
        Err(e) => {
            tracing::warn!(
                "Extraction of `{}` in {} failed: {}",
                request.signature,
                request.file,
                e
            );
            (String::new(), Some(e.to_string()))
        }
    };
    BatchExtractResult {
        file: request.file.clone(),
        signature: request.signature.clone(),
        context,
        error,
    }
}

/// One complete extraction on the current thread
pub(crate) fn run_extraction(
    config: &Config,
    request: &ExtractRequest,
    cancelled: Option<Arc<AtomicBool>>,
) -> Result<ExtractResponse, ContextError> {
    request
        .validate()
        .map_err(ValidationError::InvalidRequest)?;
    let start = Instant::now();

    let workspace = normalize_workspace(&request.workspace)?;
    let language = request
        .language()
        .ok_or_else(|| ContextError::UnsupportedLanguage(request.file.clone()))?;

    let file = resolve_in_workspace(&workspace, &request.file);
    if !file.is_file() {
        return Err(ValidationError::PathNotFound(file.display().to_string()).into());
    }
    let file = file.canonicalize()?;

    let mut options = request.options(&config.extraction);
    if let Some(flag) = cancelled {
        options = options.with_cancellation_flag(flag);
    }
    let mut provider = provider_for(language, &workspace, &config.provider)?;
    let extraction = extract_context(provider.as_mut(), &file, &request.signature, &options)?;

    Ok(ExtractResponse {
        context: extraction.context,
        language,
        types_visited: extraction.types_visited,
        entries: extraction.entries,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
