// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let ctx = &config.context;
    if ctx.message_size_limit == 0 {
        fail("context.message_size_limit must be greater than 0".to_string());
    }
    if ctx.message_size_keep == 0 {
        fail("context.message_size_keep must be greater than 0".to_string());
    }
    if ctx.message_size_keep > ctx.message_size_limit {
        fail(format!(
            "context.message_size_keep ({}) must not exceed context.message_size_limit ({})",
            ctx.message_size_keep, ctx.message_size_limit
        ));
    }
    if ctx.plugin_chunk_size == 0 {
        fail("context.plugin_chunk_size must be greater than 0".to_string());
    }
    for (model, size) in &ctx.model_chunk_sizes {
        if *size == 0 {
            fail(format!("context.model_chunk_sizes.{model} must be greater than 0"));
        }
    }

    if config.session.source_count == 0 {
        fail("session.source_count must be at least 1".to_string());
    }
    if config.session.title_max_chars == 0 {
        fail("session.title_max_chars must be at least 1".to_string());
    }

    if let Err(e) = reqwest::Url::parse(&config.endpoints.base_url) {
        fail(format!(
            "endpoints.base_url `{}` is not a valid URL: {e}",
            config.endpoints.base_url
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&ParleyConfig::default()).is_ok());
    }

    #[test]
    fn keep_larger_than_limit_fails() {
        let mut config = ParleyConfig::default();
        config.context.message_size_keep = 20_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("message_size_keep")));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ParleyConfig::default();
        config.context.plugin_chunk_size = 0;
        config.session.source_count = 0;
        config.endpoints.base_url = "not a url".to_string();
        config.context.model_chunk_sizes.insert("broken".into(), 0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        let msgs = messages(&errors);
        assert!(msgs.iter().any(|m| m.contains("model_chunk_sizes.broken")));
        assert!(msgs.iter().any(|m| m.contains("base_url")));
    }
}
