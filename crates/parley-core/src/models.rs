// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in model catalogue.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Model identifier whose chunk size is capped below its context length.
pub const GPT4_MODEL_ID: &str = "gpt-4-turbo-preview";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    Openai,
    Mistral,
    Anthropic,
    Openrouter,
    Ollama,
    Custom,
}

/// A selectable language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmModel {
    pub model_id: String,
    pub model_name: String,
    pub provider: ModelProvider,
    #[serde(default)]
    pub hosted_id: Option<String>,
    #[serde(default)]
    pub image_input: bool,
}

impl LlmModel {
    fn builtin(model_id: &str, model_name: &str, provider: ModelProvider, image_input: bool) -> Self {
        Self {
            model_id: model_id.to_string(),
            model_name: model_name.to_string(),
            provider,
            hosted_id: None,
            image_input,
        }
    }

    /// A workspace-defined model served by a custom endpoint.
    pub fn custom(model_id: &str, model_name: &str, hosted_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            model_name: model_name.to_string(),
            provider: ModelProvider::Custom,
            hosted_id: Some(hosted_id.to_string()),
            image_input: false,
        }
    }
}

/// Models shipped with every installation.
pub fn builtin_models() -> Vec<LlmModel> {
    vec![
        LlmModel::builtin(GPT4_MODEL_ID, "GPT-4 Turbo", ModelProvider::Openai, true),
        LlmModel::builtin("gpt-3.5-turbo", "GPT-3.5 Turbo", ModelProvider::Openai, false),
        LlmModel::builtin("mistral-medium", "Mistral Medium", ModelProvider::Mistral, false),
        LlmModel::builtin("mistral-large", "Mistral Large", ModelProvider::Mistral, false),
        LlmModel::builtin(
            "claude-3-5-sonnet-20240620",
            "Claude 3.5 Sonnet",
            ModelProvider::Anthropic,
            true,
        ),
    ]
}

/// Finds `model_id` among custom models first, then the built-in list, then
/// any extra provider lists.
pub fn find_model<'a>(
    model_id: &str,
    custom: &'a [LlmModel],
    builtin: &'a [LlmModel],
    extra: &'a [LlmModel],
) -> Option<&'a LlmModel> {
    custom
        .iter()
        .chain(builtin)
        .chain(extra)
        .find(|m| m.model_id == model_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_contains_capped_models() {
        let models = builtin_models();
        assert!(models.iter().any(|m| m.model_id == GPT4_MODEL_ID));
        assert!(models.iter().any(|m| m.model_id == "mistral-large"));
    }

    #[test]
    fn custom_models_shadow_builtin() {
        let builtin = builtin_models();
        let custom = vec![LlmModel::custom("mistral-medium", "My Mistral", "h-1")];
        let found = find_model("mistral-medium", &custom, &builtin, &[]).unwrap();
        assert_eq!(found.provider, ModelProvider::Custom);
        assert!(find_model("nope", &custom, &builtin, &[]).is_none());
    }
}
