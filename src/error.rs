// ABOUTME: Error taxonomy shared by every admin operation
// ABOUTME: Classifies driver failures so callers can tell retryable from permanent errors

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the library operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// Errors produced by the admin operations.
///
/// Driver errors are mapped through [`AdminError::from_postgres`] which inspects the
/// SQLSTATE code. Only [`AdminError::Connection`] is considered retryable.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The server could not be reached, refused the login, or dropped the session.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A uniqueness, foreign key, not-null or check constraint rejected a statement.
    #[error("Constraint violation ({code}): {message}")]
    ConstraintViolation { code: String, message: String },

    /// A required input file does not exist.
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// SQL that does not parse, an empty migration, or an invalid identifier/URL.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The row an operation targets does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An applied migration was edited after it was recorded in the ledger.
    #[error("Checksum mismatch for migration '{id}': ledger has {expected}, file has {actual}")]
    ChecksumMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    /// The operator declined a destructive action.
    #[error("Operation cancelled: {0}")]
    Confirmation(String),

    /// Any other server-side failure.
    #[error("Database error{}: {message}", .code.as_deref().map(|c| format!(" ({})", c)).unwrap_or_default())]
    Database {
        code: Option<String>,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// Classify a `tokio_postgres` error by SQLSTATE.
    pub fn from_postgres(err: tokio_postgres::Error) -> Self {
        let message = err
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| err.to_string());

        let Some(state) = err.code() else {
            // No SQLSTATE: the failure happened on the client side of the wire.
            if err.is_closed() || source_is_io(&err) {
                return AdminError::Connection(message);
            }
            return AdminError::Database {
                code: None,
                message,
            };
        };

        let code = state.code().to_string();
        match sqlstate_class(&code) {
            SqlStateClass::Connection => AdminError::Connection(format!("{} ({})", message, code)),
            SqlStateClass::Constraint => AdminError::ConstraintViolation { code, message },
            SqlStateClass::Syntax => AdminError::MalformedInput(format!("{} ({})", message, code)),
            SqlStateClass::Other => AdminError::Database {
                code: Some(code),
                message,
            },
        }
    }

    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdminError::Connection(_))
    }

    /// Short machine-friendly name of the error kind, used in the final log line.
    pub fn kind(&self) -> &'static str {
        match self {
            AdminError::Connection(_) => "connection",
            AdminError::ConstraintViolation { .. } => "constraint_violation",
            AdminError::FileNotFound { .. } => "file_not_found",
            AdminError::MalformedInput(_) => "malformed_input",
            AdminError::NotFound(_) => "not_found",
            AdminError::ChecksumMismatch { .. } => "checksum_mismatch",
            AdminError::Confirmation(_) => "cancelled",
            AdminError::Database { .. } => "database",
            AdminError::Io(_) => "io",
        }
    }

    /// Prefix the message with `prefix` and append `suffix`, keeping the variant.
    ///
    /// Variants without a free-form message are returned unchanged.
    pub fn with_context(self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        let (prefix, suffix) = (prefix.into(), suffix.into());
        let wrap = |msg: String| format!("{}: {}{}", prefix, msg, suffix);
        match self {
            AdminError::Connection(msg) => AdminError::Connection(wrap(msg)),
            AdminError::ConstraintViolation { code, message } => AdminError::ConstraintViolation {
                code,
                message: wrap(message),
            },
            AdminError::MalformedInput(msg) => AdminError::MalformedInput(wrap(msg)),
            AdminError::NotFound(msg) => AdminError::NotFound(wrap(msg)),
            AdminError::Confirmation(msg) => AdminError::Confirmation(wrap(msg)),
            AdminError::Database { code, message } => AdminError::Database {
                code,
                message: wrap(message),
            },
            other => other,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        AdminError::MalformedInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AdminError::NotFound(msg.into())
    }
}

impl From<tokio_postgres::Error> for AdminError {
    fn from(err: tokio_postgres::Error) -> Self {
        AdminError::from_postgres(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqlStateClass {
    Connection,
    Constraint,
    Syntax,
    Other,
}

/// Map a five-character SQLSTATE to the taxonomy bucket it belongs to.
///
/// - `08xxx` connection exception, `28xxx` invalid authorization,
///   `53300` too many connections, `57P01`..`57P03` server shutdown/unavailable
/// - `23xxx` integrity constraint violation
/// - `42xxx` syntax error or access rule violation
fn sqlstate_class(code: &str) -> SqlStateClass {
    if code.starts_with("08")
        || code.starts_with("28")
        || code == "53300"
        || matches!(code, "57P01" | "57P02" | "57P03")
    {
        SqlStateClass::Connection
    } else if code.starts_with("23") {
        SqlStateClass::Constraint
    } else if code.starts_with("42") {
        SqlStateClass::Syntax
    } else {
        SqlStateClass::Other
    }
}

fn source_is_io(err: &tokio_postgres::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner.is::<std::io::Error>() {
            return true;
        }
        source = inner.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlstate_classes() {
        assert_eq!(sqlstate_class("08006"), SqlStateClass::Connection);
        assert_eq!(sqlstate_class("28P01"), SqlStateClass::Connection);
        assert_eq!(sqlstate_class("57P01"), SqlStateClass::Connection);
        assert_eq!(sqlstate_class("53300"), SqlStateClass::Connection);
        assert_eq!(sqlstate_class("23505"), SqlStateClass::Constraint);
        assert_eq!(sqlstate_class("23503"), SqlStateClass::Constraint);
        assert_eq!(sqlstate_class("42601"), SqlStateClass::Syntax);
        assert_eq!(sqlstate_class("42P01"), SqlStateClass::Syntax);
        assert_eq!(sqlstate_class("57014"), SqlStateClass::Other);
        assert_eq!(sqlstate_class("3D000"), SqlStateClass::Other);
    }

    #[test]
    fn test_only_connection_errors_are_retryable() {
        assert!(AdminError::Connection("refused".into()).is_retryable());
        assert!(!AdminError::malformed("bad sql").is_retryable());
        assert!(!AdminError::not_found("user").is_retryable());
        assert!(!AdminError::ConstraintViolation {
            code: "23505".into(),
            message: "duplicate key".into()
        }
        .is_retryable());
        assert!(!AdminError::FileNotFound {
            path: PathBuf::from("missing.sql")
        }
        .is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = AdminError::Database {
            code: Some("XX000".into()),
            message: "internal".into(),
        };
        assert_eq!(err.to_string(), "Database error (XX000): internal");

        let err = AdminError::Database {
            code: None,
            message: "odd".into(),
        };
        assert_eq!(err.to_string(), "Database error: odd");

        let err = AdminError::FileNotFound {
            path: PathBuf::from("migrations/x.sql"),
        };
        assert_eq!(err.to_string(), "File not found: migrations/x.sql");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(AdminError::Connection("x".into()).kind(), "connection");
        assert_eq!(AdminError::not_found("x").kind(), "not_found");
        assert_eq!(
            AdminError::ChecksumMismatch {
                id: "a".into(),
                expected: "b".into(),
                actual: "c".into()
            }
            .kind(),
            "checksum_mismatch"
        );
    }
}
