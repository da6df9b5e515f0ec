use std::fmt;

/// Machine-readable error codes for callers that map failures to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    MissingLanguage,
    MissingHub,
    MissingCondition,
    InvalidRelationship,
    EntityNotFound,
    RelationshipNotFound,
    TemplateNotFound,
    PropertyNameConflict,
    StoreFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::MissingLanguage => "E2001",
            Self::MissingHub => "E2002",
            Self::MissingCondition => "E2003",
            Self::InvalidRelationship => "E2004",
            Self::EntityNotFound => "E3001",
            Self::RelationshipNotFound => "E3002",
            Self::TemplateNotFound => "E3003",
            Self::PropertyNameConflict => "E4001",
            Self::StoreFailure => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::MissingLanguage => "Language can't be undefined",
            Self::MissingHub => "Single relationships must have a hub",
            Self::MissingCondition => "Can't delete without a condition",
            Self::InvalidRelationship => "Invalid relationship",
            Self::EntityNotFound => "Entity not found",
            Self::RelationshipNotFound => "Relationship not found",
            Self::TemplateNotFound => "Template not found",
            Self::PropertyNameConflict => "Properties can't swap names",
            Self::StoreFailure => "Relationship store failure",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .hubgraph/config.toml and retry."),
            Self::MissingLanguage => Some("Pass one of the configured language keys."),
            Self::MissingHub => Some("Save the relationship together with its hub siblings."),
            Self::MissingCondition => Some("Narrow the delete to an id, hub, entity or template."),
            Self::InvalidRelationship => None,
            Self::EntityNotFound | Self::RelationshipNotFound | Self::TemplateNotFound => None,
            Self::PropertyNameConflict => {
                Some("Rename the property in two steps through an unused name.")
            }
            Self::StoreFailure => Some("Retry the whole operation; no rollback was performed."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the relationship engine.
///
/// Store and collaborator failures are wrapped in [`GraphError::Backend`]
/// unchanged; the engine performs no compensating rollback, so a failed
/// multi-step operation may leave rows written but metadata not yet
/// recomputed.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A required argument was missing or malformed.
    #[error("{code}: {message}")]
    InvalidArgument { code: ErrorCode, message: String },

    /// The request collides with existing state.
    #[error("{code}: {message}")]
    Conflict { code: ErrorCode, message: String },

    /// A referenced record does not exist.
    #[error("{code}: {message}")]
    NotFound { code: ErrorCode, message: String },

    /// Failure reported by the store or a collaborator service.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl GraphError {
    pub(crate) fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn missing_language() -> Self {
        Self::invalid(ErrorCode::MissingLanguage, ErrorCode::MissingLanguage.message())
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { code, .. }
            | Self::Conflict { code, .. }
            | Self::NotFound { code, .. } => *code,
            Self::Backend(_) => ErrorCode::StoreFailure,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Result alias for engine operations.
pub type GraphResult<T> = Result<T, GraphError>;
