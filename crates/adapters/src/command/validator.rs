// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deny-list command validator.

use super::{CommandError, CommandValidator};
use async_trait::async_trait;
use regex::Regex;

/// Patterns rejected by the default policy
const DEFAULT_DENIED: &[(&str, &str)] = &[
    (r"\brm\s+(-[a-zA-Z]*[rf][a-zA-Z]*\s+)+/(\s|$)", "recursive delete of filesystem root"),
    (r"\bmkfs(\.\w+)?\b", "filesystem formatting"),
    (r"\bdd\s+.*\bof=/dev/", "raw write to a device"),
    (r":\(\)\s*\{\s*:\|:&\s*\};:", "fork bomb"),
    (r"\b(shutdown|reboot|halt|poweroff)\b", "host power control"),
    (r"\b(curl|wget)\b[^|]*\|\s*(sudo\s+)?(ba|z)?sh\b", "piping a download into a shell"),
    (r"\bchmod\s+(-R\s+)?777\s+/(\s|$)", "world-writable filesystem root"),
    (r">\s*/dev/sd[a-z]", "overwriting a block device"),
];

/// Rejects commands matching any deny pattern.
#[derive(Debug, Clone)]
pub struct DenyListValidator {
    rules: Vec<(Regex, String)>,
}

impl DenyListValidator {
    /// Validator with the built-in deny list.
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_patterns(
            DEFAULT_DENIED
                .iter()
                .map(|(pattern, reason)| (pattern.to_string(), reason.to_string())),
        )
    }

    /// Validator with caller-provided `(pattern, reason)` rules.
    pub fn with_patterns(
        patterns: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, regex::Error> {
        let rules = patterns
            .into_iter()
            .map(|(pattern, reason)| Ok((Regex::new(&pattern)?, reason)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Reason the command is denied, if any.
    pub fn check(&self, command: &str) -> Option<&str> {
        if command.trim().is_empty() {
            return Some("empty command");
        }
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(command))
            .map(|(_, reason)| reason.as_str())
    }
}

#[async_trait]
impl CommandValidator for DenyListValidator {
    async fn validate_command(&self, command: &str) -> Result<bool, CommandError> {
        match self.check(command) {
            Some(reason) => {
                tracing::warn!(command, reason, "command rejected");
                Err(CommandError::Rejected {
                    command: command.to_string(),
                    reason: reason.to_string(),
                })
            }
            None => Ok(true),
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
