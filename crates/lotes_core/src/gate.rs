//! Shared-secret gate for office-only actions.
//!
//! The service never consults this; callers check it before routing batch
//! creation or report edit/delete requests.

/// Compares supplied input against the configured admin secret.
#[derive(Clone, Default)]
pub struct AdminGate {
    secret: Option<String>,
}

impl AdminGate {
    /// `None` builds a gate that denies every input.
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Returns `true` only for an exact match of the configured secret.
    pub fn is_authorized(&self, supplied: &str) -> bool {
        match &self.secret {
            Some(secret) => constant_time_eq(secret.as_bytes(), supplied.as_bytes()),
            None => false,
        }
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn constant_time_eq(expected: &[u8], supplied: &[u8]) -> bool {
    let mut diff = expected.len() ^ supplied.len();
    for (index, byte) in expected.iter().enumerate() {
        let other = supplied.get(index).copied().unwrap_or(0);
        diff |= usize::from(byte ^ other);
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::AdminGate;

    #[test]
    fn accepts_only_exact_secret() {
        let gate = AdminGate::new(Some("cafe123".to_string()));
        assert!(gate.is_authorized("cafe123"));
        assert!(!gate.is_authorized("cafe12"));
        assert!(!gate.is_authorized("cafe1234"));
        assert!(!gate.is_authorized(" cafe123"));
        assert!(!gate.is_authorized(""));
    }

    #[test]
    fn unset_secret_denies_everything() {
        let gate = AdminGate::new(None);
        assert!(!gate.is_configured());
        assert!(!gate.is_authorized(""));
        assert!(!gate.is_authorized("anything"));
    }

    #[test]
    fn debug_output_hides_secret() {
        let gate = AdminGate::new(Some("cafe123".to_string()));
        assert!(!format!("{gate:?}").contains("cafe123"));
    }
}
