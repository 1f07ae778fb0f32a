use thiserror::Error;

/// Errors produced while compiling, executing or exporting a search request.
///
/// The variants split into three groups: request/predicate validation errors
/// (rejected before anything reaches the backend), backend failures
/// (normalized from the transport layer by the executor), and the
/// [`DataError::EmptyResult`] marker, which travels the failure channel but
/// is not a true error — callers distinguish it via [`DataError::is_empty_result`].
#[derive(Error, Debug)]
pub enum DataError {
    /// Request or predicate shape is invalid, or the resource does not
    /// support a requested predicate category.
    #[error("{0}")]
    Validation(String),

    /// A supplied time value is not a parseable ISO-8601 zoned timestamp.
    #[error("exception while parsing date/time: {0}")]
    DateParse(String),

    /// A polygon ring does not close on itself.
    #[error("Coordinate mismatch (Polygon)")]
    CoordinateMismatch,

    /// Geo parameters match none of the recognized shapes.
    #[error("Missing/Invalid geo parameters")]
    MissingGeoParameters,

    /// An attribute predicate carries an unknown operator or cannot be decoded.
    #[error("invalid attribute operator: {0}")]
    InvalidAttributeOperator(String),

    /// No recognized predicate category matched the request.
    #[error("Invalid search query")]
    InvalidSearchQuery,

    /// A DURING/BETWEEN window ends before it starts.
    #[error("end date is before start date")]
    EndBeforeStart,

    /// Count queries cannot carry a field-selection filter.
    #[error("Count is not supported with filtering")]
    CountNotSupportedWithFiltering,

    /// An interactive search matched more records than the service will page.
    #[error("result limit exceeded: {0} matching records")]
    ResultWindowExceeded(u64),

    /// Zero matching records. Not a hard error; carries a 204-like marker.
    #[error("Empty response")]
    EmptyResult,

    /// The capability lookup for the target resource failed.
    #[error("failed to get filters for validation: {0}")]
    CapabilityLookup(String),

    /// The backend could not be reached or the request never completed.
    #[error("backend transport error: {0}")]
    BackendTransport(String),

    /// The backend answered with a non-success status.
    ///
    /// `detail` is the reason extracted from the backend's structured error
    /// body when one was present, or a generic bad-parameters message.
    #[error("backend responded {status}: {detail}")]
    BackendResponse { status: u16, detail: String },

    /// Configuration file or time-limit policy string is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to an export sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// HTTP-like status marker for this error, as reported to the API layer.
    pub fn status_code(&self) -> u16 {
        match self {
            DataError::Validation(_)
            | DataError::DateParse(_)
            | DataError::CoordinateMismatch
            | DataError::MissingGeoParameters
            | DataError::InvalidAttributeOperator(_)
            | DataError::InvalidSearchQuery
            | DataError::EndBeforeStart
            | DataError::CountNotSupportedWithFiltering
            | DataError::BackendTransport(_) => 400,
            DataError::ResultWindowExceeded(_) => 413,
            DataError::EmptyResult => 204,
            DataError::BackendResponse { status, .. } => *status,
            DataError::CapabilityLookup(_)
            | DataError::Config(_)
            | DataError::Serialization(_)
            | DataError::Io(_) => 500,
        }
    }

    /// True for the zero-matches marker, which is delivered through the
    /// failure channel but must not be reported as a hard error.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, DataError::EmptyResult)
    }
}
