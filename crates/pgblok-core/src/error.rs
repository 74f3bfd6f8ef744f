use std::fmt;
use thiserror::Error as ThisError;

/// Boxed error raised by an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

///
/// ErrorClass
///
/// Stable classification: declaration errors abort the registry build,
/// collaborator errors are surfaced exactly as the collaborator reported them.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    Declaration,
    Collaborator,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Declaration => "declaration",
            Self::Collaborator => "collaborator",
        };
        write!(f, "{label}")
    }
}

///
/// DeclarationError
///
/// Raised while building the model registry. Every variant names the
/// offending model.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum DeclarationError {
    #[error("model '{model}' is declared twice")]
    DuplicateModel { model: String },

    #[error("model '{model}' has no primary key defined")]
    MissingPrimaryKey { model: String },

    #[error("model '{model}': view '{view}' projects no columns")]
    EmptyView { model: String, view: String },

    #[error("model '{model}': a view declaration is required to define the query of the view")]
    MissingViewDeclaration { model: String },

    #[error("model '{model}': referenced model '{target}' is not bound to a materialized view")]
    UnboundViewReference { model: String, target: String },

    #[error("model '{model}': column '{column}' is not projected by view '{view}'")]
    UnknownViewColumn {
        model: String,
        view: String,
        column: String,
    },

    #[error(
        "model '{model}': relation '{relation}' pairs {local} local column(s) with {remote} remote column(s)"
    )]
    RelationArity {
        model: String,
        relation: String,
        local: usize,
        remote: usize,
    },

    #[error("model '{model}': relation '{relation}' targets unknown model '{target}'")]
    UnknownRelationTarget {
        model: String,
        relation: String,
        target: String,
    },
}

impl DeclarationError {
    /// Registry name of the model whose declaration is invalid.
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::DuplicateModel { model }
            | Self::EmptyView { model, .. }
            | Self::MissingPrimaryKey { model }
            | Self::MissingViewDeclaration { model }
            | Self::UnboundViewReference { model, .. }
            | Self::RelationArity { model, .. }
            | Self::UnknownViewColumn { model, .. }
            | Self::UnknownRelationTarget { model, .. } => model,
        }
    }
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// Mapper construction failed; the message is the collaborator's own.
    #[error("{source}")]
    Mapper {
        model: String,
        #[source]
        source: BoxError,
    },
}

impl Error {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Declaration(_) => ErrorClass::Declaration,
            Self::Mapper { .. } => ErrorClass::Collaborator,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::Declaration(err) => err.model(),
            Self::Mapper { model, .. } => model,
        }
    }

    #[must_use]
    pub const fn as_declaration(&self) -> Option<&DeclarationError> {
        match self {
            Self::Declaration(err) => Some(err),
            Self::Mapper { .. } => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {}", self.class(), self)
    }
}
