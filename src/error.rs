use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormError>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Null value for field \"{key}\": encode it as the string \"null\" if intended")]
    NullValueRejected { key: String },

    #[error("Maximum nesting depth of {max_depth} exceeded at field \"{key}\"")]
    MaxDepthExceeded { max_depth: usize, key: String },

    #[error("Unsupported value type {kind} for field \"{key}\"")]
    UnsupportedValueType { key: String, kind: &'static str },

    #[error("Invalid form configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fieldless discriminant of [`FormError`] for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormErrorKind {
    NullValueRejected,
    MaxDepthExceeded,
    UnsupportedValueType,
    InvalidConfiguration,
    Io,
}

impl FormError {
    pub fn kind(&self) -> FormErrorKind {
        match self {
            Self::NullValueRejected { .. } => FormErrorKind::NullValueRejected,
            Self::MaxDepthExceeded { .. } => FormErrorKind::MaxDepthExceeded,
            Self::UnsupportedValueType { .. } => FormErrorKind::UnsupportedValueType,
            Self::InvalidConfiguration(_) => FormErrorKind::InvalidConfiguration,
            Self::Io(_) => FormErrorKind::Io,
        }
    }

    /// The field path the error refers to, if it is tied to one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NullValueRejected { key }
            | Self::MaxDepthExceeded { key, .. }
            | Self::UnsupportedValueType { key, .. } => Some(key.as_str()),
            Self::InvalidConfiguration(_) | Self::Io(_) => None,
        }
    }
}
