//! Salted substitutes for syntax the HTML parser cannot carry through.
//!
//! A [`PlaceholderRegistry`] is created for one encode/decode pair and owns
//! both the template delimiter substitutes and the binding attribute prefix.
//! Nothing here is process-wide: two documents transcoded concurrently get
//! different salts and cannot garble each other's content.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Template delimiters in replacement order.
///
/// Three-character tokens come before the two-character tokens they start or
/// end with, otherwise `{{` would eat the front of `{{{`.
pub const TEMPLATE_TOKENS: [&str; 7] = ["{{{", "}}}", "{{#", "{{^", "{{/", "{{", "}}"];

/// Start of every template placeholder.
pub const TEMPLATE_PLACEHOLDER_PREFIX: &str = "_amp_mustache_";

/// Start of every binding attribute prefix.
pub const BINDING_PREFIX_START: &str = "amp-binding-";

/// Number of hex digits kept from each digest.
const DIGEST_HEX_LEN: usize = 32;

/// Per-invocation mapping between non-standard tokens and parser-safe text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRegistry {
    salt: String,
    binding_prefix: String,
    placeholders: Vec<(&'static str, String)>,
}

impl PlaceholderRegistry {
    /// Registry salted with a fresh random UUID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_salt(Uuid::new_v4().to_string())
    }

    /// Registry with an explicit salt, for reproducible output.
    #[must_use]
    pub fn with_salt(salt: impl Into<String>) -> Self {
        let salt = salt.into();
        let binding_prefix = format!("{BINDING_PREFIX_START}{}-", digest_hex(&salt, ""));
        let placeholders = TEMPLATE_TOKENS
            .iter()
            .map(|&token| {
                let substitute =
                    format!("{TEMPLATE_PLACEHOLDER_PREFIX}{}", digest_hex(&salt, token));
                (token, substitute)
            })
            .collect();

        Self {
            salt,
            binding_prefix,
            placeholders,
        }
    }

    /// The salt this registry was built from.
    #[must_use]
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Attribute name prefix standing in for `[`…`]`, e.g.
    /// `amp-binding-0cc175b9c0f1b6a831c399e269772661-`.
    #[must_use]
    pub fn binding_prefix(&self) -> &str {
        &self.binding_prefix
    }

    /// `(token, substitute)` pairs in replacement order.
    #[must_use]
    pub fn template_placeholders(&self) -> &[(&'static str, String)] {
        &self.placeholders
    }

    /// Replace every template delimiter in `markup` with its substitute.
    #[must_use]
    pub fn substitute_templates(&self, markup: &str) -> String {
        self.placeholders
            .iter()
            .fold(markup.to_string(), |text, (token, substitute)| {
                if text.contains(token) {
                    text.replace(token, substitute)
                } else {
                    text
                }
            })
    }

    /// Put the template delimiters back.
    ///
    /// Substitutes all have the same length and distinct digests, so the
    /// order of restoration does not matter.
    #[must_use]
    pub fn restore_templates(&self, markup: &str) -> String {
        if !markup.contains(TEMPLATE_PLACEHOLDER_PREFIX) {
            return markup.to_string();
        }
        self.placeholders
            .iter()
            .fold(markup.to_string(), |text, (token, substitute)| {
                text.replace(substitute.as_str(), token)
            })
    }

    /// Attribute name a binding attribute `[name]` is stored under.
    #[must_use]
    pub fn encode_binding_name(&self, name: &str) -> String {
        format!("{}{name}", self.binding_prefix)
    }

    /// Map a prefixed attribute name back to `[name]`.
    ///
    /// Returns `None` for attributes that were not binding attributes.
    #[must_use]
    pub fn binding_attribute_name(&self, attribute: &str) -> Option<String> {
        attribute
            .strip_prefix(self.binding_prefix.as_str())
            .filter(|name| !name.is_empty())
            .map(|name| format!("[{name}]"))
    }
}

impl Default for PlaceholderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// First [`DIGEST_HEX_LEN`] lowercase hex digits of SHA-256(`salt` ‖ `token`).
fn digest_hex(salt: &str, token: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(token.as_bytes())
        .finalize();
    hex::encode(&digest[..DIGEST_HEX_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_salt_same_registry() {
        assert_eq!(
            PlaceholderRegistry::with_salt("a"),
            PlaceholderRegistry::with_salt("a")
        );
        assert_ne!(
            PlaceholderRegistry::with_salt("a").binding_prefix(),
            PlaceholderRegistry::with_salt("b").binding_prefix()
        );
    }

    #[test]
    fn test_random_registries_differ() {
        assert_ne!(
            PlaceholderRegistry::new().binding_prefix(),
            PlaceholderRegistry::new().binding_prefix()
        );
    }

    #[test]
    fn test_shapes() {
        let registry = PlaceholderRegistry::with_salt("salt");
        let prefix = registry.binding_prefix();
        assert!(prefix.starts_with(BINDING_PREFIX_START));
        assert!(prefix.ends_with('-'));
        assert_eq!(prefix.len(), BINDING_PREFIX_START.len() + DIGEST_HEX_LEN + 1);

        let tokens: Vec<&str> = registry
            .template_placeholders()
            .iter()
            .map(|(token, _)| *token)
            .collect();
        assert_eq!(tokens, TEMPLATE_TOKENS);

        for (_, substitute) in registry.template_placeholders() {
            let digest = &substitute[TEMPLATE_PLACEHOLDER_PREFIX.len()..];
            assert_eq!(digest.len(), DIGEST_HEX_LEN);
            assert!(digest.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }

    #[test]
    fn test_binding_attribute_name() {
        let registry = PlaceholderRegistry::with_salt("salt");
        let encoded = registry.encode_binding_name("text");
        assert_eq!(
            registry.binding_attribute_name(&encoded).as_deref(),
            Some("[text]")
        );
        assert_eq!(registry.binding_attribute_name("text"), None);
        assert_eq!(registry.binding_attribute_name(registry.binding_prefix()), None);
    }
}
