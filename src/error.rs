use std::fmt;

/// Domain error kinds distinguished from plain I/O failure.
///
/// `ReferentialDrift` (submissions referencing units absent from the graph)
/// and `NumericSentinel` (a dissimilarity entry equal to the infinity
/// sentinel) are deliberately absent here: per the ingest and clustering
/// contracts, both are recovered in place rather than surfaced as errors.
#[derive(Debug)]
pub enum AnalysisError {
    /// A required file path, environment value, or CLI argument is missing
    /// or invalid.
    Config(String),
    /// An adjacency document, submission row, or tile-sequence literal could
    /// not be parsed.
    InputFormat(String),
    /// A cached artifact (distance matrix, id attribute) doesn't match the
    /// graph it's being loaded against.
    SchemaMismatch(String),
    /// No submissions remained after ingest and referential-drift filtering.
    EmptyInput(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Config(msg) => write!(f, "configuration error: {msg}"),
            AnalysisError::InputFormat(msg) => write!(f, "input format error: {msg}"),
            AnalysisError::SchemaMismatch(msg) => write!(f, "schema mismatch: {msg}"),
            AnalysisError::EmptyInput(msg) => write!(f, "empty input: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}
