// ABOUTME: Severity tags and the keyword heuristic that assigns them from message text.
// ABOUTME: Pure functions only; error keywords always win over warning keywords.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Substrings that mark a message as an error. Checked before warnings.
pub const ERROR_KEYWORDS: &[&str] = &["error", "exception", "failed", "missing"];

/// Substrings that mark a message as a warning when no error keyword matched.
pub const WARNING_KEYWORDS: &[&str] = &["warning", "aware", "careful"];

/// The closed set of severities a log entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Message,
}

impl Severity {
    /// The tag written into the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Message => "message",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "message" => Ok(Severity::Message),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Classify a message by case-insensitive substring match.
pub fn classify(message: &str) -> Severity {
    let lower = message.to_lowercase();

    if ERROR_KEYWORDS.iter().any(|word| lower.contains(word)) {
        Severity::Error
    } else if WARNING_KEYWORDS.iter().any(|word| lower.contains(word)) {
        Severity::Warning
    } else {
        Severity::Message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_keywords_classify_as_error() {
        assert_eq!(classify("Payment failed: timeout"), Severity::Error);
        assert_eq!(classify("NullPointerException thrown"), Severity::Error);
        assert_eq!(classify("config key missing"), Severity::Error);
        assert_eq!(classify("ERROR while saving"), Severity::Error);
    }

    #[test]
    fn warning_keywords_classify_as_warning() {
        assert_eq!(classify("Disk usage warning"), Severity::Warning);
        assert_eq!(classify("WARNING: low memory"), Severity::Warning);
        assert_eq!(classify("be careful with that"), Severity::Warning);
        assert_eq!(classify("be aware of rate limits"), Severity::Warning);
    }

    #[test]
    fn plain_text_classifies_as_message() {
        assert_eq!(classify("User logged in"), Severity::Message);
        assert_eq!(classify(""), Severity::Message);
    }

    #[test]
    fn error_takes_precedence_over_warning() {
        assert_eq!(classify("warning: upload failed"), Severity::Error);
        assert_eq!(classify("Careful, Exception ahead"), Severity::Error);
    }

    #[test]
    fn severity_round_trips_through_tag() {
        for severity in [Severity::Error, Severity::Warning, Severity::Message] {
            assert_eq!(severity.as_str().parse::<Severity>().unwrap(), severity);
        }
        assert!("fatal".parse::<Severity>().is_err());
    }
}
