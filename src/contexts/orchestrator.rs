use crate::contexts::{
    CancellationToken, GenerationBackend, GenerationError, Prompt, constraint_enforcer, prompt_builder,
    response_parser, style_audit,
};
use crate::data::{Credentials, GenerationRequest, GenerationResult, HistorySink};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pause between batch items, to stay clear of upstream rate limits
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

/// Trait for resolving the credential used when a request carries none of its own
pub trait CredentialProvider {
    /// The configured credential, or `None` when there is nothing to offer
    fn credentials(&self) -> Option<Credentials>;
}

/// Outcome of one batch item, in the position of the request that produced it
pub type BatchOutcome = Result<GenerationResult, GenerationError>;

/// Generation Orchestrator context runs requests through the full pipeline:
/// prompt, backend call, parse, length repair and style audit.
pub struct GenerationOrchestrator<B, C>
where
    B: GenerationBackend,
    C: CredentialProvider,
{
    /// Transport that executes prompts
    backend: B,
    /// Fallback credentials for requests without an override
    credential_provider: C,
    /// Optional destination for completed results
    history: Option<Arc<dyn HistorySink + Send + Sync>>,
    /// History writes handed off and not yet awaited
    pending_history: Mutex<Vec<JoinHandle<()>>>,
    batch_delay: Duration,
}

impl<B, C> GenerationOrchestrator<B, C>
where
    B: GenerationBackend,
    C: CredentialProvider,
{
    /// Creates a new GenerationOrchestrator context
    ///
    /// # Arguments
    /// * `backend` - Transport used for every generation call
    /// * `credential_provider` - Consulted when a request has no credentials of its own
    pub fn new(backend: B, credential_provider: C) -> Self {
        Self {
            backend,
            credential_provider,
            history: None,
            pending_history: Mutex::new(Vec::new()),
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistorySink + Send + Sync>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Validates `request` and builds its prompt without contacting the backend
    pub fn preview(&self, request: &GenerationRequest) -> Result<Prompt, GenerationError> {
        request.validate()?;
        Ok(prompt_builder::build(
            &request.source_text,
            &request.style_rules,
            &request.limits,
        ))
    }

    /// Role method: credentials.resolve
    ///
    /// The request's own credentials win; otherwise the provider is asked.
    fn resolve_credentials(&self, request: &GenerationRequest) -> Result<Credentials, GenerationError> {
        request
            .credentials
            .clone()
            .filter(|c| !c.is_blank())
            .or_else(|| self.credential_provider.credentials().filter(|c| !c.is_blank()))
            .ok_or(GenerationError::MissingCredentials)
    }

    /// Runs one request through the pipeline, stopping at the first failure.
    ///
    /// A result with violations is still `Ok`: the caller decides how to show it.
    pub async fn generate_one(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        // Step 1: Validate and build the prompt
        let prompt = self.preview(request)?;

        // Step 2: Resolve credentials before anything leaves the process
        let credentials = self.resolve_credentials(request)?;

        // Step 3: Execute
        let raw = self.backend.invoke(&prompt.text, &credentials).await?;
        debug!(raw_chars = raw.chars().count(), "Received model output");

        // Step 4: Parse, repair and audit
        let record = response_parser::parse(&raw, &prompt.expected_keys)?;
        let mut result = constraint_enforcer::enforce(&record, &request.limits);
        result.style_findings = style_audit::audit(&result, &request.style_rules);

        if result.is_degraded() {
            let labels: Vec<&str> = result.violations.iter().map(|v| v.label.as_str()).collect();
            warn!(labels = ?labels, "Generation completed with limits still exceeded");
        }

        // Step 5: Hand off to history; its outcome never affects ours
        self.record_history(request, &result);

        Ok(result)
    }

    /// Role method: history.record
    ///
    /// Runs the sink on the blocking pool so slow I/O or a panicking sink
    /// cannot hold up or fail the generation that produced the result.
    fn record_history(&self, request: &GenerationRequest, result: &GenerationResult) {
        let Some(history) = &self.history else {
            return;
        };

        let sink = Arc::clone(history);
        let mut request = request.clone();
        request.credentials = None;
        let result = result.clone();
        let handle = tokio::task::spawn_blocking(move || sink.record(&request, &result));

        if let Ok(mut pending) = self.pending_history.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    /// Waits for history writes handed off so far. Call before exiting so the
    /// last results are not lost with the runtime.
    pub async fn flush_history(&self) {
        let pending: Vec<JoinHandle<()>> = match self.pending_history.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };

        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "History write did not complete");
            }
        }
    }

    /// Runs `requests` one after another; see [`generate_batch_with`](Self::generate_batch_with)
    pub async fn generate_batch(
        &self,
        requests: &[GenerationRequest],
        cancel: &CancellationToken,
    ) -> Vec<BatchOutcome> {
        self.generate_batch_with(requests, cancel, |_, _| {}).await
    }

    /// Runs `requests` strictly in sequence, pausing between items.
    ///
    /// A failed item never stops the batch. The output has one entry per
    /// request, in request order. Once `cancel` fires, items not yet started
    /// are returned as `Cancelled`. `on_item` sees each outcome as it lands.
    pub async fn generate_batch_with<F>(
        &self,
        requests: &[GenerationRequest],
        cancel: &CancellationToken,
        mut on_item: F,
    ) -> Vec<BatchOutcome>
    where
        F: FnMut(usize, &BatchOutcome),
    {
        let total = requests.len();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, request) in requests.iter().enumerate() {
            let outcome = if cancel.is_cancelled() {
                Err(GenerationError::Cancelled)
            } else {
                info!(item = idx + 1, total, "Generating batch item");
                self.generate_one(request).await
            };

            match &outcome {
                Err(GenerationError::Cancelled) => {}
                Err(e) => warn!(item = idx + 1, kind = e.kind().as_str(), error = %e, "Batch item failed"),
                Ok(_) => {}
            }

            on_item(idx, &outcome);
            outcomes.push(outcome);

            let is_last = idx + 1 == total;
            if !is_last && !cancel.is_cancelled() && !self.batch_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.batch_delay) => {}
                    _ = cancel.cancelled() => debug!(item = idx + 1, "Batch delay cut short by cancellation"),
                }
            }
        }

        outcomes
    }
}
