use crate::data::{GenerationRequest, GenerationResult};

/// Destination for completed generations.
///
/// Implementations should handle errors gracefully without panicking.
pub trait HistorySink {
    /// Records a completed generation together with the request it answered.
    ///
    /// # Arguments
    /// * `request` - The originating request (credentials are never part of what is stored)
    /// * `result` - The result handed back to the caller
    ///
    /// # Notes
    /// This method does not return errors to maintain fire-and-forget semantics.
    /// The pipeline's outcome never depends on whether recording succeeded.
    fn record(&self, request: &GenerationRequest, result: &GenerationResult);
}
