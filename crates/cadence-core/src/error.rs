use std::fmt;

/// Machine-readable error codes for diagnostics and agent-friendly output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ConfigInvalid,
    ExportParseError,
    MalformedTimestamp,
    NegativeDuration,
    OutputWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ConfigInvalid => "E1002",
            Self::ExportParseError => "E2001",
            Self::MalformedTimestamp => "E2002",
            Self::NegativeDuration => "E3001",
            Self::OutputWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ConfigInvalid => "Config failed validation",
            Self::ExportParseError => "Changelog export parse error",
            Self::MalformedTimestamp => "Malformed event timestamp",
            Self::NegativeDuration => "Negative phase duration",
            Self::OutputWriteFailed => "Output file write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the cadence config TOML and retry."),
            Self::ConfigInvalid => {
                Some("Every phase class needs at least one status value; check the [classes] table.")
            }
            Self::ExportParseError => {
                Some("The export file must be a JSON array of items with `histories` entries.")
            }
            Self::MalformedTimestamp => {
                Some("The offending event was skipped; re-export the changelog if this recurs.")
            }
            Self::NegativeDuration => {
                Some("Events arrived out of timestamp order upstream; the value is reported as-is.")
            }
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
