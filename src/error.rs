use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Gateway unreachable: {0}")]
    Transport(String),

    #[error("Upstream returned a non-JSON response (status {status}, content-type {content_type}): {preview}")]
    UpstreamFormat {
        status: u16,
        content_type: String,
        preview: String,
    },

    #[error("Upstream rejected the request: {message}")]
    UpstreamRejection {
        status: Option<u16>,
        message: String,
    },

    #[error("Not allowed: {0}")]
    Policy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsoleError {
    /// True when the upstream refused the admin code.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ConsoleError::UpstreamRejection { message, status } => {
                *status == Some(401) || message.to_lowercase().contains("unauthorized")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        ConsoleError::Transport(err.to_string())
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> ConsoleResult<T>;
    fn with_context<F>(self, f: F) -> ConsoleResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ErrorContext<T> for ConsoleResult<T> {
    fn context(self, msg: &str) -> ConsoleResult<T> {
        self.map_err(|e| prefix(e, msg))
    }

    fn with_context<F>(self, f: F) -> ConsoleResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| prefix(e, &f()))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, msg: &str) -> ConsoleResult<T> {
        self.ok_or_else(|| ConsoleError::InvalidInput(msg.to_string()))
    }

    fn with_context<F>(self, f: F) -> ConsoleResult<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| ConsoleError::InvalidInput(f()))
    }
}

// Keeps the variant so callers can still match on the error kind.
fn prefix(err: ConsoleError, msg: &str) -> ConsoleError {
    match err {
        ConsoleError::Transport(m) => ConsoleError::Transport(format!("{}: {}", msg, m)),
        ConsoleError::UpstreamRejection { status, message } => ConsoleError::UpstreamRejection {
            status,
            message: format!("{}: {}", msg, message),
        },
        ConsoleError::Policy(m) => ConsoleError::Policy(format!("{}: {}", msg, m)),
        ConsoleError::Config(m) => ConsoleError::Config(format!("{}: {}", msg, m)),
        ConsoleError::InvalidInput(m) => ConsoleError::InvalidInput(format!("{}: {}", msg, m)),
        ConsoleError::Parse(m) => ConsoleError::Parse(format!("{}: {}", msg, m)),
        other => other,
    }
}

#[macro_export]
macro_rules! console_error {
    ($error_type:ident, $msg:expr) => {
        $crate::error::ConsoleError::$error_type($msg.to_string())
    };
    ($error_type:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::error::ConsoleError::$error_type(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_variant() {
        let result: ConsoleResult<()> = Err(ConsoleError::Transport("connection refused".into()));
        match result.context("Listing teams") {
            Err(ConsoleError::Transport(msg)) => {
                assert!(msg.contains("Listing teams"));
                assert!(msg.contains("connection refused"));
            }
            other => panic!("Expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn test_context_on_option() {
        let option: Option<String> = None;
        match option.with_context(|| format!("Team '{}' not found", "T9")) {
            Err(ConsoleError::InvalidInput(msg)) => assert_eq!(msg, "Team 'T9' not found"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_unauthorized_detection() {
        let by_message = ConsoleError::UpstreamRejection {
            status: Some(200),
            message: "Unauthorized".into(),
        };
        let by_status = ConsoleError::UpstreamRejection {
            status: Some(401),
            message: "nope".into(),
        };
        let other = ConsoleError::UpstreamRejection {
            status: None,
            message: "team not found".into(),
        };
        assert!(by_message.is_unauthorized());
        assert!(by_status.is_unauthorized());
        assert!(!other.is_unauthorized());
        assert!(!ConsoleError::Transport("unauthorized".into()).is_unauthorized());
    }

    #[test]
    fn test_console_error_macro() {
        match console_error!(Policy, "no primary team") {
            ConsoleError::Policy(msg) => assert_eq!(msg, "no primary team"),
            _ => panic!("Expected Policy"),
        }
        match console_error!(InvalidInput, "bad email: {}", "x") {
            ConsoleError::InvalidInput(msg) => assert_eq!(msg, "bad email: x"),
            _ => panic!("Expected InvalidInput"),
        }
    }
}
