//! Secret handling
//!
//! The completion token is read from the process environment (see
//! [`crate::config::LLMConfig::api_token`]) and carried as a [`SecretString`]
//! so it cannot leak through `Debug` or `Display` in log output.
//!
//! Upstream error bodies end up inside answers, so they pass through
//! [`scrub`] first.

pub mod string;

pub use string::SecretString;

use regex::Regex;
use std::sync::OnceLock;

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns match:
/// - OpenAI-style keys: sk-[a-zA-Z0-9]{20,}
/// - Google API keys: AIza[0-9A-Za-z-_]{35}
/// - Bearer tokens: Bearer\s+[^\s]{20,}
/// - JWTs (proxy tokens): eyJ...\.eyJ...\....
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid OpenAI pattern"),
            Regex::new(r"AIza[0-9A-Za-z\-_]{35}").expect("Invalid Google pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
            Regex::new(r"eyJ[a-zA-Z0-9\-_]+\.eyJ[a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-_]+")
                .expect("Invalid JWT pattern"),
        ]
    })
}

/// Replace anything that looks like a credential with `[REDACTED]`.
pub fn scrub(text: &str) -> String {
    let mut result = text.to_string();

    for pattern in get_secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    result
}
