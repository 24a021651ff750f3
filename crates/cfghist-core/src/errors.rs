use cfghist_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using HistError
pub type Result<T> = std::result::Result<T, HistError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and CLI exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    ConstraintViolation,

    // Delta
    /// The delta engine produced a set of operations that does not account
    /// for its inputs (should never occur in correct builds)
    InvariantViolation,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::InvariantViolation => "ERR_INVARIANT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context (operation, entity id,
/// correlation ids) for debugging. Built with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (snapshot id, diff id, rule id, table name)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Kernel-level failures raised while deriving keys or computing deltas
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistError {
    /// An item's descriptive info cannot be serialized deterministically
    #[error("Item {dn} has non-canonical info: {reason}")]
    NonCanonicalInfo { dn: String, reason: String },

    /// A payload nests deeper than the canonical serializer accepts
    #[error("Item {dn} nests deeper than {limit} levels")]
    NestingTooDeep { dn: String, limit: usize },

    /// The computed delta does not account for its inputs
    #[error("Delta invariant violated: {reason}")]
    DeltaInvariant { reason: String },

    /// JSON serialization failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<HistError> for ExError {
    fn from(err: HistError) -> Self {
        let message = err.to_string();
        match err {
            HistError::NonCanonicalInfo { dn, .. } | HistError::NestingTooDeep { dn, .. } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("derive_key")
                    .with_entity_id(dn)
                    .with_message(message)
            }
            HistError::DeltaInvariant { .. } => ExError::new(ExErrorKind::InvariantViolation)
                .with_op("produce_delta")
                .with_message(message),
            HistError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for HistError {
    fn from(err: serde_json::Error) -> Self {
        HistError::Serialization {
            message: err.to_string(),
        }
    }
}
