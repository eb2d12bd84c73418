// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Security helpers for the identity service
//!
//! Input validation for identifiers sent to the Identity service, scrubbing of
//! secrets before they reach log output, and bookkeeping of credentials the
//! client has vended so they can be forgotten in one call.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

const MAX_WORKLOAD_NAME_LEN: usize = 255;
const REDACTED: &str = "[REDACTED]";
/// Opaque words at least this long are treated as secrets when sanitizing.
const SECRET_MIN_LEN: usize = 32;

pub struct SecurityValidator;

impl SecurityValidator {
    /// Workload names are 1-255 characters of `[A-Za-z0-9_.-]` and start with
    /// an alphanumeric character.
    pub fn validate_workload_name(name: &str) -> bool {
        if name.is_empty() || name.len() > MAX_WORKLOAD_NAME_LEN {
            return false;
        }
        let mut chars = name.chars();
        let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
        first_ok && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    /// Make `input` safe to log: control characters become spaces (no forged
    /// log lines) and bearer tokens, JWTs and long opaque strings are redacted.
    pub fn sanitize_log_data(input: &str) -> String {
        let flattened: String = input
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();

        let mut out = Vec::new();
        let mut redact_next = false;
        for word in flattened.split(' ') {
            if redact_next && !word.is_empty() {
                out.push(REDACTED.to_string());
                redact_next = false;
                continue;
            }
            if word.eq_ignore_ascii_case("bearer") {
                redact_next = true;
                out.push(word.to_string());
            } else if looks_like_secret(word) {
                out.push(REDACTED.to_string());
            } else {
                out.push(word.to_string());
            }
        }
        out.join(" ")
    }
}

fn looks_like_secret(word: &str) -> bool {
    let is_token_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '/' | '=');
    let jwt = {
        let parts: Vec<&str> = word.split('.').collect();
        parts.len() == 3
            && parts.iter().all(|p| !p.is_empty() && p.chars().all(is_token_char))
            && word.starts_with("eyJ")
    };
    let opaque = word.len() >= SECRET_MIN_LEN
        && word.chars().all(is_token_char)
        && word.chars().any(|c| c.is_ascii_digit())
        && word.chars().any(|c| c.is_ascii_alphabetic());
    jwt || opaque
}

/// Tracks identifiers of credentials vended during the client's lifetime.
///
/// Only ids are kept; secret material never enters the manager.
#[derive(Debug, Default)]
pub struct TokenManager {
    tokens: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_token(&self, token_id: impl Into<String>) {
        self.tokens.lock().insert(token_id.into(), Utc::now());
    }

    pub fn is_registered(&self, token_id: &str) -> bool {
        self.tokens.lock().contains_key(token_id)
    }

    pub fn active_count(&self) -> usize {
        self.tokens.lock().len()
    }

    /// Forget every tracked token, returning how many there were.
    pub fn cleanup_all(&self) -> usize {
        let mut tokens = self.tokens.lock();
        let count = tokens.len();
        tokens.clear();
        count
    }
}
