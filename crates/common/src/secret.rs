//! Secret wrapper for key material (master key, issued tokens in transit)

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value - redacted in Debug/Display/logs, zeroed on drop
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Read a secret from an environment variable.
    ///
    /// Unset, empty and whitespace-only values all yield `None` so callers
    /// treat "configured but blank" the same as "not configured".
    pub fn from_env(key: &str) -> Option<Self> {
        let value = std::env::var(key).ok()?;
        Self::non_blank(value)
    }

    /// Wrap `value` as-is unless it is empty or whitespace-only.
    pub fn non_blank(mut value: String) -> Option<Self> {
        if value.trim().is_empty() {
            value.zeroize();
            return None;
        }
        Some(Self(value))
    }

    /// Wrap key material read from a file, dropping surrounding whitespace
    /// such as the trailing newline editors add.
    pub fn from_file_contents(mut contents: String) -> Option<Self> {
        let trimmed = contents.trim().to_owned();
        contents.zeroize();
        Self::non_blank(trimmed)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug_and_display() {
        let secret = Secret::new(String::from("master-key-value"));
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn secret_exposes_value() {
        let secret = Secret::new(String::from("master-key-value"));
        assert_eq!(secret.expose(), "master-key-value");
        assert_eq!(secret.as_bytes(), b"master-key-value");
    }

    #[test]
    fn blank_values_are_not_secrets() {
        assert!(Secret::non_blank(String::new()).is_none());
        assert!(Secret::non_blank("  \n ".into()).is_none());
    }

    #[test]
    fn non_blank_keeps_surrounding_whitespace() {
        let secret = Secret::non_blank(" padded-key ".into()).unwrap();
        assert_eq!(secret.expose(), " padded-key ");
    }

    #[test]
    fn file_contents_are_trimmed() {
        let secret = Secret::from_file_contents("  key-with-newline\n".into()).unwrap();
        assert_eq!(secret.expose(), "key-with-newline");
        assert!(Secret::from_file_contents("\n\n".into()).is_none());
    }
}
