use thiserror::Error;

/// Failures a refresh cycle can hit. Both variants carry the same contract:
/// the loop logs them and skips the cycle, gauges keep their last value,
/// and the next scheduled tick is the retry.
///
/// Degenerate computations (zero total DC power) are not errors; the
/// calculator guards them to a defined default.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// The local CSV source is missing, empty, or malformed.
    #[error("PV data unavailable: {0}")]
    DataUnavailable(String),

    /// The weather endpoint failed: network error, non-2xx status, or a
    /// body that does not decode.
    #[error("weather fetch unavailable: {0}")]
    FetchUnavailable(String),
}
