use std::fmt;
use std::io;

/// Errors surfaced by the search engine, the instruction parser, and
/// the cache dump/load paths.
///
/// Search cutoffs are not errors; they are reported as an infinite
/// cost with an empty sequence and the cache's lower bound updated.
#[derive(Debug)]
pub enum Error {
    /// A negative multiplier was requested under a profile that has
    /// neither a negate instruction nor a reversible subtract.
    UnsupportedNegation { profile: String, multiplier: i64 },
    /// Malformed compact instruction text.
    Parse(String),
    /// The cache failed a consistency check; a programming defect,
    /// not a user-facing condition.
    InvariantViolation(String),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedNegation {
                profile,
                multiplier,
            } => write!(
                f,
                "cpu profile '{}' does not support multiplication by negative numbers (got {})",
                profile, multiplier
            ),
            Error::Parse(msg) => write!(f, "parse error: {}", msg),
            Error::InvariantViolation(msg) => write!(f, "cache invariant violated: {}", msg),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unsupported_negation() {
        let e = Error::UnsupportedNegation {
            profile: "chained adds".to_string(),
            multiplier: -7,
        };
        let msg = e.to_string();
        assert!(msg.contains("chained adds"));
        assert!(msg.contains("-7"));
    }

    #[test]
    fn test_display_parse() {
        let e = Error::Parse("unconvertible string \"n*2\"".to_string());
        assert!(e.to_string().starts_with("parse error:"));
    }

    #[test]
    fn test_io_conversion() {
        let e: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, Error::Io(_)));
    }
}
