// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parley.toml` > `~/.config/parley/parley.toml` > `/etc/parley/parley.toml`
//! with environment variable overrides via the `PARLEY_` prefix and the bare
//! `MESSAGE_SIZE_LIMIT` / `MESSAGE_SIZE_KEEP` variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParleyConfig;

/// Bare environment variables honored for history clipping.
const CLIP_ENV_VARS: [&str; 2] = ["MESSAGE_SIZE_LIMIT", "MESSAGE_SIZE_KEEP"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parley/parley.toml`
/// 3. `~/.config/parley/parley.toml`
/// 4. `./parley.toml`
/// 5. `MESSAGE_SIZE_LIMIT` / `MESSAGE_SIZE_KEEP`
/// 6. `PARLEY_*` environment variables
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(clip_env_provider())
        .merge(env_provider())
        .extract()
}

/// The Figment used for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file("/etc/parley/parley.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("parley/parley.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("parley.toml"))
        .merge(clip_env_provider())
        .merge(env_provider())
}

/// `MESSAGE_SIZE_LIMIT` -> `context.message_size_limit`, same for `_KEEP`.
fn clip_env_provider() -> Env {
    Env::raw()
        .only(&CLIP_ENV_VARS)
        .map(|key| format!("context.{}", key.as_str().to_ascii_lowercase()).into())
}

/// `PARLEY_<SECTION>_<KEY>` -> `<section>.<key>`.
///
/// Uses `map()` rather than `split("_")` because key names contain underscores:
/// `PARLEY_CONTEXT_PLUGIN_CHUNK_SIZE` must become `context.plugin_chunk_size`.
fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| {
        let mapped = key.as_str().to_ascii_lowercase();
        for section in ["agent", "context", "session", "endpoints"] {
            if let Some(rest) = mapped.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_env_vars_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MESSAGE_SIZE_LIMIT", "500");
            jail.set_env("MESSAGE_SIZE_KEEP", "50");
            let config: ParleyConfig = build_figment().extract()?;
            assert_eq!(config.context.message_size_limit, 500);
            assert_eq!(config.context.message_size_keep, 50);
            Ok(())
        });
    }

    #[test]
    fn prefixed_env_maps_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PARLEY_CONTEXT_PLUGIN_CHUNK_SIZE", "4000");
            jail.set_env("PARLEY_SESSION_STOP_GRACE_MS", "5");
            jail.set_env("PARLEY_ENDPOINTS_BASE_URL", "http://example.test");
            let config: ParleyConfig = build_figment().extract()?;
            assert_eq!(config.context.plugin_chunk_size, 4000);
            assert_eq!(config.session.stop_grace_ms, 5);
            assert_eq!(config.endpoints.base_url, "http://example.test");
            Ok(())
        });
    }

    #[test]
    fn local_file_is_merged() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "parley.toml",
                r#"
[agent]
name = "from-file"

[context.model_chunk_sizes]
my-model = 3000
"#,
            )?;
            let config: ParleyConfig = build_figment().extract()?;
            assert_eq!(config.agent.name, "from-file");
            assert_eq!(config.context.model_chunk_sizes.get("my-model"), Some(&3000));
            assert_eq!(
                config.context.model_chunk_sizes.get("mistral-large"),
                Some(&8000)
            );
            Ok(())
        });
    }
}
