// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::path::PathBuf;
use std::time::Duration;

fn parse_u64(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_bool(var: &str) -> Option<bool> {
    let value = std::env::var(var).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolve state directory: PILOT_STATE_DIR > XDG_STATE_HOME/pilot > ~/.local/state/pilot
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("PILOT_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("pilot"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/pilot"))
}

pub fn max_consecutive_errors() -> Option<u32> {
    parse_u64("PILOT_MAX_CONSECUTIVE_ERRORS").and_then(|n| u32::try_from(n).ok())
}

/// Autosave interval override
pub fn checkpoint_interval() -> Option<Duration> {
    parse_u64("PILOT_CHECKPOINT_INTERVAL_MS").map(Duration::from_millis)
}

pub fn auto_retry() -> Option<bool> {
    parse_bool("PILOT_AUTO_RETRY")
}

pub fn auto_approve() -> Option<bool> {
    parse_bool("PILOT_AUTO_APPROVE")
}

pub fn default_max_retries() -> Option<u32> {
    parse_u64("PILOT_DEFAULT_MAX_RETRIES").and_then(|n| u32::try_from(n).ok())
}

pub fn command_timeout() -> Option<Duration> {
    parse_u64("PILOT_COMMAND_TIMEOUT_SECS").map(Duration::from_secs)
}

pub fn session_id() -> Option<String> {
    std::env::var("PILOT_SESSION_ID")
        .ok()
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
