use serde::{Deserialize, Serialize};

/// The category of a failure, every category carries a stable numeric code which is
/// what `Session::get_errnum` reports.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The operation is not valid in the current session, page or path state.
    State,
    /// The handle is stale, closed, of the wrong kind or belongs to another session.
    InvalidHandle,
    /// A font, image, document or profile could not be located.
    ResourceNotFound,
    /// A resource was located but its data could not be understood.
    Format,
    /// An option list is malformed or contains an unknown or ill-typed key.
    Option,
    /// The output destination could not be written.
    Io,
    /// A numeric or keyword argument is out of its accepted range.
    Argument,
}

impl ErrorKind {
    /// The numeric code associated to the error kind.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::State => 2100,
            ErrorKind::InvalidHandle => 2200,
            ErrorKind::ResourceNotFound => 2300,
            ErrorKind::Format => 2400,
            ErrorKind::Option => 2500,
            ErrorKind::Io => 2600,
            ErrorKind::Argument => 2700,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ErrorKind::State => "state error",
            ErrorKind::InvalidHandle => "invalid handle",
            ErrorKind::ResourceNotFound => "resource not found",
            ErrorKind::Format => "format error",
            ErrorKind::Option => "option error",
            ErrorKind::Io => "I/O error",
            ErrorKind::Argument => "illegal argument",
        }
    }
}

/// An error with a kind, a context, possibly the propagated source error and the name of
/// the session operation which failed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub context: String,
    pub source_error: Option<String>,
    /// The name of the failing operation, empty until the error leaves the session.
    pub operation: String,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.operation.is_empty() {
            write!(formatter, "{}: ", self.operation)?;
        }
        match &self.source_error {
            Some(source_error) => write!(
                formatter,
                "{} ({}): {}",
                self.context,
                self.kind.label(),
                minimize_first_letter(source_error.to_string()),
            ),
            None => write!(formatter, "{} ({})", self.context, self.kind.label()),
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Create a new `SessionError` of the given kind with the given context.
    pub fn with_context<S: Into<String>>(kind: ErrorKind, context: S) -> SessionError {
        SessionError {
            kind,
            context: context.into(),
            source_error: None,
            operation: String::new(),
        }
    }

    /// Create a new `SessionError` of the given kind with the given context and source error.
    pub fn with_error<S: Into<String>>(
        kind: ErrorKind,
        context: S,
        error: &dyn std::error::Error,
    ) -> SessionError {
        SessionError {
            kind,
            context: context.into(),
            source_error: Some(error.to_string()),
            operation: String::new(),
        }
    }

    pub fn state<S: Into<String>>(context: S) -> SessionError {
        SessionError::with_context(ErrorKind::State, context)
    }

    pub fn invalid_handle<S: Into<String>>(context: S) -> SessionError {
        SessionError::with_context(ErrorKind::InvalidHandle, context)
    }

    pub fn argument<S: Into<String>>(context: S) -> SessionError {
        SessionError::with_context(ErrorKind::Argument, context)
    }

    pub fn option<S: Into<String>>(context: S) -> SessionError {
        SessionError::with_context(ErrorKind::Option, context)
    }

    /// Attach the name of the failing operation, keeping one that is already set.
    pub(crate) fn in_operation(mut self, operation: &str) -> SessionError {
        if self.operation.is_empty() {
            self.operation = operation.to_string();
        }
        self
    }

    /// The numeric code of the error.
    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    /// The human-readable message of the error, without the operation name.
    pub fn message(&self) -> String {
        match &self.source_error {
            Some(source_error) => format!(
                "{}: {}",
                self.context,
                minimize_first_letter(source_error.to_string())
            ),
            None => self.context.clone(),
        }
    }
}

/// Maps an I/O error encountered while opening a resource into the matching error kind.
pub(crate) fn resource_io_error(context: String, error: &std::io::Error) -> SessionError {
    let kind = match error.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::ResourceNotFound,
        _ => ErrorKind::Io,
    };
    SessionError::with_error(kind, context, error)
}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}
