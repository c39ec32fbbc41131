//! The `line N: message` error shape used by every stage (§7 of the design:
//! lexical, syntactic, and usage errors are all fatal and report one line).

use std::fmt;

/// A fatal error tied to a source line, plus the usage-error case which has
/// no source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Unknown token, overlong integer, malformed string constant, ...
    Lexical { line: u32, message: String },
    /// Unexpected token, unknown mnemonic, bad segment name, ...
    Syntactic { line: u32, message: String },
    /// Missing or invalid CLI arguments. Has no source position.
    Usage(String),
}

impl Diagnostic {
    #[must_use]
    pub fn lexical(line: u32, message: impl Into<String>) -> Self {
        Self::Lexical {
            line,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn syntactic(line: u32, message: impl Into<String>) -> Self {
        Self::Syntactic {
            line,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical { line, message } => write!(f, "line {line}: {message}"),
            Self::Syntactic { line, message } => write!(f, "line {line}: {message}"),
            Self::Usage(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Diagnostic {}
