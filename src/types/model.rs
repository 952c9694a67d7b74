use std::fmt;

/// Model requested when none is specified.
pub const DEFAULT_MODEL: &str = "llama-2-13b-chat";

/// Provider paired with [`DEFAULT_MODEL`].
pub const DEFAULT_PROVIDER: &str = "anyscale";

/// A (model, provider) pair identifying the backend deployment that serves
/// a request, rendered on the wire as `model@provider`.
///
/// No validation is performed locally; an unknown pairing surfaces as a
/// remote error when the request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model: String,
    pub provider: String,
}

impl ModelSpec {
    pub fn new(model: impl Into<String>, provider: impl Into<String>) -> Self {
        ModelSpec {
            model: model.into(),
            provider: provider.into(),
        }
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::new(DEFAULT_MODEL, DEFAULT_PROVIDER)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.model, self.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_joins_model_and_provider() {
        let spec = ModelSpec::new("llama-2-70b-chat", "anyscale");
        assert_eq!(spec.to_string(), "llama-2-70b-chat@anyscale");
    }

    #[test]
    fn test_default_spec_matches_the_documented_pair() {
        assert_eq!(
            ModelSpec::default().to_string(),
            "llama-2-13b-chat@anyscale"
        );
    }
}
