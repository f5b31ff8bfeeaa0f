use serde_json::{Map, Value};

use super::patch::{build_patch, subtree, ConfigPatch};
use crate::error::{ConsoleError, Result};
use crate::models::OAuthProvider;

/// 当前 auth.method.oauth.{provider} 设置，缺失时为空 object
pub fn provider_settings(tree: &Value, provider: OAuthProvider) -> Value {
    subtree(tree, &["auth", "method", "oauth", provider.as_str()])
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// 更新某个 OAuth 提供方的设置。表单未包含的字段（如 scope）沿用当前值。
/// 启用状态下必填字段不能为空。
pub fn update_provider(
    tree: &Value,
    provider: OAuthProvider,
    form: &Map<String, Value>,
) -> Result<ConfigPatch> {
    let patch = build_patch(
        tree,
        &["auth", "method", "oauth", provider.as_str()],
        form,
    )?;

    let enabled = patch
        .value
        .get("enabled")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if enabled {
        let missing: Vec<&str> = provider
            .required_fields()
            .iter()
            .copied()
            .filter(|field| {
                patch
                    .value
                    .get(*field)
                    .and_then(Value::as_str)
                    .map(|s| s.trim().is_empty())
                    .unwrap_or(true)
            })
            .collect();
        if !missing.is_empty() {
            return Err(ConsoleError::Validation(format!(
                "{} requires: {}",
                provider,
                missing.join(", ")
            )));
        }
    }

    Ok(patch)
}

/// 开关新用户注册，auth.signUp.enabled
pub fn set_sign_up_enabled(tree: &Value, enabled: bool) -> Result<ConfigPatch> {
    let mut form = Map::new();
    form.insert("enabled".to_string(), Value::Bool(enabled));
    build_patch(tree, &["auth", "signUp"], &form)
}
