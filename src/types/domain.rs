// ABOUTME: Validated DNS domain under which the cluster services are exposed.
// ABOUTME: Each dot-separated label must follow RFC 1123 hostname rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain cannot be empty")]
    Empty,

    #[error("domain exceeds maximum length of 253 characters")]
    TooLong,

    #[error("domain must contain at least two labels")]
    SingleLabel,

    #[error("invalid domain label '{0}'")]
    InvalidLabel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim().trim_end_matches('.');
        if trimmed.is_empty() {
            return Err(DomainError::Empty);
        }
        if trimmed.len() > 253 {
            return Err(DomainError::TooLong);
        }

        let lowered = trimmed.to_ascii_lowercase();
        let labels: Vec<&str> = lowered.split('.').collect();
        if labels.len() < 2 {
            return Err(DomainError::SingleLabel);
        }

        for label in &labels {
            if !is_valid_label(label) {
                return Err(DomainError::InvalidLabel(label.to_string()));
            }
        }

        Ok(Self(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host name of a service published under this domain.
    pub fn host(&self, service: &str) -> String {
        format!("{}.{}", service, self.0)
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl TryFrom<String> for Domain {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes() {
        let domain = Domain::new("Example.COM.").unwrap();
        assert_eq!(domain.as_str(), "example.com");
        assert_eq!(domain.host("vault"), "vault.example.com");
    }

    #[test]
    fn rejects_invalid_domains() {
        assert_eq!(Domain::new("  "), Err(DomainError::Empty));
        assert_eq!(Domain::new("localhost"), Err(DomainError::SingleLabel));
        assert_eq!(
            Domain::new("bad_label.example.com"),
            Err(DomainError::InvalidLabel("bad_label".to_string()))
        );
        assert_eq!(
            Domain::new("-lead.example.com"),
            Err(DomainError::InvalidLabel("-lead".to_string()))
        );
        assert_eq!(
            Domain::new("a..b"),
            Err(DomainError::InvalidLabel(String::new()))
        );
    }
}
