// src/dispatch/credentials.rs

use crate::error::{AppError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Ordered, non-empty list of API keys for one service.
///
/// Order is first-try preference. The set is immutable once built.
#[derive(Clone)]
pub struct CredentialSet {
    keys: Vec<SecretString>,
}

impl CredentialSet {
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<SecretString> = keys
            .into_iter()
            .map(|k| SecretString::new(k.into()))
            .collect();

        if keys.is_empty() {
            return Err(AppError::validation(
                "credentials",
                "at least one credential is required",
            ));
        }
        if keys.iter().any(|k| k.expose_secret().trim().is_empty()) {
            return Err(AppError::validation("credentials", "credentials cannot be blank"));
        }

        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SecretString> {
        self.keys.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SecretString> {
        self.keys.iter()
    }

    pub fn preview(&self, index: usize) -> String {
        self.get(index)
            .map(|k| preview_key(k.expose_secret()))
            .unwrap_or_else(|| "<none>".to_string())
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.keys.iter().map(|k| preview_key(k.expose_secret())))
            .finish()
    }
}

/// Short, log-safe rendering of a key: first and last four characters.
pub fn preview_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_hides_middle() {
        assert_eq!(preview_key("AIzaSyA1234567890xyz"), "AIza...0xyz");
        assert_eq!(preview_key("short"), "****");
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(CredentialSet::new(Vec::<String>::new()).is_err());
        assert!(CredentialSet::new(["ok", "  "]).is_err());
    }

    #[test]
    fn test_debug_never_prints_keys() {
        let set = CredentialSet::new(["first-secret-key", "second-secret-key"]).unwrap();
        let rendered = format!("{:?}", set);
        assert!(!rendered.contains("first-secret-key"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.preview(1), "seco...-key");
    }
}
