use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for patchdoc operations.
///
/// Each kind names a category of failure so callers can branch on it without
/// parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use patchdoc::errors::{PatchError, ErrorKind, PatchResult};
///
/// fn example() -> PatchResult<()> {
///     Err(PatchError::new("Attribute could not be read", ErrorKind::AccessError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// An attribute value could not be read from a record instance
    AccessError,
    /// Error mapping a value to or from a record type
    ObjectMappingError,
    /// A date/time value could not be converted
    ConversionError,
    /// Invalid or duplicate attribute/field name
    InvalidFieldName,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The requested entity or document was not found
    NotFound,
    /// Error reported by the external document store operations
    BackendError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::AccessError => write!(f, "Access error"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::ConversionError => write!(f, "Conversion error"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom patchdoc error type.
///
/// `PatchError` carries a message, a kind, an optional cause and, for
/// attribute access failures, the name of the attribute that failed. A
/// backtrace is captured on construction.
///
/// # Examples
///
/// ```rust,ignore
/// use patchdoc::errors::{PatchError, ErrorKind};
///
/// let cause = PatchError::new("lock poisoned", ErrorKind::InternalError);
/// let err = PatchError::access("User", "age", cause);
/// assert_eq!(err.attribute(), Some("age"));
/// ```
#[derive(Clone)]
pub struct PatchError {
    message: String,
    error_kind: ErrorKind,
    attribute: Option<String>,
    cause: Option<Box<PatchError>>,
    backtrace: Atomic<Backtrace>,
}

impl PatchError {
    /// Creates a new `PatchError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        PatchError {
            message: message.to_string(),
            error_kind,
            attribute: None,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `PatchError` with a cause error.
    ///
    /// The cause is preserved and reported through [`Error::source`] and the
    /// `Debug` output.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: PatchError) -> Self {
        PatchError {
            message: message.to_string(),
            error_kind,
            attribute: None,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates an [`ErrorKind::AccessError`] for one attribute of a record shape.
    ///
    /// The error keeps the attribute name so callers can decide per attribute
    /// whether to retry, skip or abort the surrounding write.
    pub fn access(shape: &str, attribute: &str, cause: PatchError) -> Self {
        PatchError {
            message: format!(
                "Failed to read attribute '{}' of '{}': {}",
                attribute, shape, cause.message
            ),
            error_kind: ErrorKind::AccessError,
            attribute: Some(attribute.to_string()),
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    /// Name of the attribute this error is about, if any.
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn cause(&self) -> Option<&PatchError> {
        self.cause.as_deref()
    }
}

impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for PatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for patchdoc operations.
pub type PatchResult<T> = Result<T, PatchError>;

impl From<std::fmt::Error> for PatchError {
    fn from(err: std::fmt::Error) -> Self {
        PatchError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<String> for PatchError {
    fn from(msg: String) -> Self {
        PatchError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for PatchError {
    fn from(msg: &str) -> Self {
        PatchError::new(msg, ErrorKind::InternalError)
    }
}
