use std::fmt;

/// Errors produced while reading and parsing a conn log stream.
#[derive(Debug)]
pub enum ReaderError {
    IoError(std::io::Error),
    /// The stream contained no data rows at all (blank or comments only).
    EmptyInput,
    /// A mandatory field failed type coercion.
    MalformedRecord {
        line_no: usize,
        field: &'static str,
        raw: String,
    },
    /// A one-shot source (stdin) was already consumed by an earlier request.
    SourceExhausted,
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::IoError(e) => write!(f, "IO error: {}", e),
            ReaderError::EmptyInput => write!(f, "Input contained no connection records"),
            ReaderError::MalformedRecord { line_no, field, raw } => write!(
                f,
                "Malformed record at line {}: field '{}' failed to coerce in {:?}",
                line_no, field, raw
            ),
            ReaderError::SourceExhausted => {
                write!(f, "Standard input was already consumed and cannot be re-read")
            }
        }
    }
}

impl std::error::Error for ReaderError {}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::IoError(err)
    }
}

/// Errors produced while enriching a parsed batch for display.
#[derive(Debug)]
pub enum EnrichError {
    /// Every record was filtered out, leaving the layout maxima undefined.
    EmptyBatch,
    /// A color-assignment invariant was violated. Implementation bug, not bad input.
    InternalInconsistency(String),
}

impl fmt::Display for EnrichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichError::EmptyBatch => {
                write!(f, "No connections survived the duration filter")
            }
            EnrichError::InternalInconsistency(e) => {
                write!(f, "Internal inconsistency: {}", e)
            }
        }
    }
}

impl std::error::Error for EnrichError {}

/// Errors produced by the web layer while rendering a page.
#[derive(Debug)]
pub enum WebError {
    MissingAsset(String),
    TemplateError(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::MissingAsset(name) => write!(f, "Embedded asset not found: {}", name),
            WebError::TemplateError(e) => write!(f, "Template rendering failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

/// Aggregate error for one render request, whichever stage failed.
#[derive(Debug)]
pub enum PipelineError {
    ReaderError(ReaderError),
    EnrichError(EnrichError),
    WebError(WebError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::ReaderError(e) => write!(f, "Reader error: {}", e),
            PipelineError::EnrichError(e) => write!(f, "Enrichment error: {}", e),
            PipelineError::WebError(e) => write!(f, "Web error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ReaderError> for PipelineError {
    fn from(err: ReaderError) -> Self {
        PipelineError::ReaderError(err)
    }
}

impl From<EnrichError> for PipelineError {
    fn from(err: EnrichError) -> Self {
        PipelineError::EnrichError(err)
    }
}

impl From<WebError> for PipelineError {
    fn from(err: WebError) -> Self {
        PipelineError::WebError(err)
    }
}

/// Non-fatal conditions recorded while parsing under the skip policy.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// A record was dropped because a mandatory field failed coercion.
    MalformedRecord {
        line_no: usize,
        field: &'static str,
        raw: String,
    },
    /// A tab-separated row carried more than the schema width; the tail was dropped.
    TruncatedLine {
        line_no: usize,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::MalformedRecord { line_no, field, raw } => write!(
                f,
                "Skipped malformed record at line {}: field '{}' failed to coerce in {:?}",
                line_no, field, raw
            ),
            ParseWarning::TruncatedLine { line_no, expected, got } => write!(
                f,
                "Line {} carried {} fields, truncated to the {}-column schema",
                line_no, got, expected
            ),
        }
    }
}
