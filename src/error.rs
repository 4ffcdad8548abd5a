use thiserror::Error;

/// Failure kinds a scenario can record. Any of these ends the owning
/// scenario; none of them is ever retried or crosses a scenario boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TbError {
    /// Malformed request to a bus master (width overflow, burst length
    /// mismatch). Raised before anything is driven onto the bus.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The bounded acknowledgment wait was exhausted.
    #[error("no acknowledgment within {cycles} clock cycles")]
    Timeout { cycles: u32 },

    /// Observed data or signal level differs from the expectation.
    #[error("{context}: expected {expected:#x}, observed {observed:#x}")]
    Mismatch {
        context: String,
        expected: u64,
        observed: u64,
    },

    /// The event queue drained while the scenario was still running.
    #[error("scenario did not run to completion before the event queue drained")]
    Incomplete,

    /// The awaited task was torn down before producing a result.
    #[error("awaited task was cancelled")]
    Cancelled,
}
