use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::service_url::UrlSettings;
use crate::error::{ConsoleError, Result};
use crate::models::{App, DeploymentContext, ServiceTarget, Tier};

/// 控制台运行设置：可选 YAML 文件为底，CONSOLE_* 环境变量覆盖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub data_path: PathBuf,
    pub listen: String,
    /// true 为托管云，false 为自托管
    pub platform: bool,
    pub tier: Tier,
    pub urls: UrlSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("console-data.json"),
            listen: "127.0.0.1:3000".to_string(),
            platform: false,
            tier: Tier::Production,
            urls: UrlSettings::default(),
        }
    }
}

impl Settings {
    /// 加载设置。文件中的字符串值支持 ${VAR} 替换。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_json::Value = serde_yaml::from_str(content)
            .map_err(|e| ConsoleError::SettingsError(e.to_string()))?;
        let resolved = resolve_env_vars(raw);
        if resolved.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(resolved).map_err(|e| ConsoleError::SettingsError(e.to_string()))
    }

    /// 用环境变量覆盖，`lookup` 便于测试注入
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("CONSOLE_DATA_PATH") {
            self.data_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CONSOLE_LISTEN") {
            self.listen = v;
        }
        if let Some(v) = lookup("CONSOLE_PLATFORM") {
            self.platform = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("CONSOLE_ENV") {
            self.tier = v.parse().map_err(ConsoleError::SettingsError)?;
        }
        if let Some(v) = lookup("CONSOLE_BACKEND_URL") {
            self.urls.dev_backend_url = Some(v);
        }
        if let Some(v) = lookup("CONSOLE_BASE_DOMAIN") {
            self.urls.base_domain = v;
        }
        if let Some(v) = lookup("CONSOLE_ADMIN_SECRET") {
            self.urls.admin_secret = Some(v);
        }
        for service in ServiceTarget::ALL {
            if let Some(v) = lookup(&endpoint_env_key(service)) {
                self.urls.endpoints.set(service, v);
            }
        }
        Ok(())
    }

    /// 应用的部署上下文：先看部署模式，托管模式再带上 tier
    pub fn deployment_for(&self, app: &App) -> DeploymentContext {
        if self.platform {
            DeploymentContext::Managed {
                tier: self.tier,
                subdomain: app.subdomain.clone(),
                region: app.region.clone(),
            }
        } else {
            DeploymentContext::SelfHosted
        }
    }
}

/// auth → CONSOLE_AUTH_URL, database-admin → CONSOLE_DATABASE_ADMIN_URL
fn endpoint_env_key(service: ServiceTarget) -> String {
    format!(
        "CONSOLE_{}_URL",
        service.as_str().replace('-', "_").to_uppercase()
    )
}

/// Recursively resolve ${VAR} patterns in JSON values using process environment variables.
/// If env var is not set, keep the original "${VAR}" unchanged.
fn resolve_env_vars(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(substitute_env_in_string(&s)),
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(resolve_env_vars).collect())
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, resolve_env_vars(v)))
                .collect(),
        ),
        other => other,
    }
}

fn substitute_env_in_string(s: &str) -> String {
    let mut result = s.to_string();
    let mut search_from = 0;
    while let Some(rel_start) = result[search_from..].find("${") {
        let start = search_from + rel_start;
        let Some(rel_end) = result[start..].find('}') else {
            break;
        };
        let end = start + rel_end;
        let var_name = &result[start + 2..end];
        match std::env::var(var_name) {
            Ok(val) => {
                result = format!("{}{}{}", &result[..start], val, &result[end + 1..]);
                search_from = start + val.len();
            }
            // 未设置，跳过这个 ${...}
            Err(_) => search_from = end + 1,
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_app() -> App {
        App {
            id: "id-1".to_string(),
            name: "demo".to_string(),
            slug: "demo".to_string(),
            subdomain: "abcdefgh".to_string(),
            region: "eu-central-1".to_string(),
            base_folder: ".".to_string(),
            created_at: 0,
            config: serde_json::json!({}),
            config_version: 0,
            secrets: vec![],
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.platform);
        assert_eq!(settings.tier, Tier::Production);
        assert_eq!(settings.urls.base_domain, "nhost.run");
    }

    #[test]
    fn test_from_yaml() {
        let settings = Settings::from_yaml(
            "platform: true\ntier: staging\nurls:\n  base-domain: example.dev\n  endpoints:\n    auth: http://localhost:4000\n",
        )
        .unwrap();
        assert!(settings.platform);
        assert_eq!(settings.tier, Tier::Staging);
        assert_eq!(settings.urls.base_domain, "example.dev");
        assert_eq!(
            settings.urls.endpoints.get(ServiceTarget::Auth),
            Some("http://localhost:4000")
        );
        // 未写的部分保持默认
        assert_eq!(settings.listen, "127.0.0.1:3000");
    }

    #[test]
    fn test_from_empty_yaml() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_yaml_tier_accepts_short_names() {
        for (yaml, tier) in [
            ("tier: dev\n", Tier::Development),
            ("tier: prod\n", Tier::Production),
            ("tier: development\n", Tier::Development),
        ] {
            assert_eq!(Settings::from_yaml(yaml).unwrap().tier, tier);
            let name = yaml.trim_start_matches("tier: ").trim();
            assert_eq!(name.parse::<Tier>().unwrap(), tier);
        }
    }

    #[test]
    fn test_from_invalid_yaml() {
        let err = Settings::from_yaml("{{invalid yaml").unwrap_err();
        assert!(matches!(err, ConsoleError::SettingsError(_)));
    }

    #[test]
    fn test_yaml_env_substitution() {
        std::env::set_var("TEST_CONSOLE_GRAPHQL_HOST", "gql.local");
        let settings = Settings::from_yaml(
            "urls:\n  endpoints:\n    graphql: \"http://${TEST_CONSOLE_GRAPHQL_HOST}/v1\"\n    storage: \"${MISSING_CONSOLE_VAR_XYZ}\"\n",
        )
        .unwrap();
        assert_eq!(
            settings.urls.endpoints.get(ServiceTarget::Graphql),
            Some("http://gql.local/v1")
        );
        assert_eq!(
            settings.urls.endpoints.get(ServiceTarget::Storage),
            Some("${MISSING_CONSOLE_VAR_XYZ}")
        );
        std::env::remove_var("TEST_CONSOLE_GRAPHQL_HOST");
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CONSOLE_PLATFORM", "true"),
            ("CONSOLE_ENV", "dev"),
            ("CONSOLE_BACKEND_URL", "http://localhost:1337"),
            ("CONSOLE_DATABASE_ADMIN_URL", "http://localhost:8080"),
            ("CONSOLE_LISTEN", "0.0.0.0:8000"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert!(settings.platform);
        assert_eq!(settings.tier, Tier::Development);
        assert_eq!(
            settings.urls.dev_backend_url.as_deref(),
            Some("http://localhost:1337")
        );
        assert_eq!(
            settings.urls.endpoints.get(ServiceTarget::DatabaseAdmin),
            Some("http://localhost:8080")
        );
        assert_eq!(settings.listen, "0.0.0.0:8000");
    }

    #[test]
    fn test_apply_env_bad_tier() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|key| (key == "CONSOLE_ENV").then(|| "qa".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConsoleError::SettingsError(_)));
    }

    #[test]
    fn test_deployment_for() {
        let app = sample_app();
        let mut settings = Settings::default();
        assert_eq!(settings.deployment_for(&app), DeploymentContext::SelfHosted);

        settings.platform = true;
        settings.tier = Tier::Staging;
        assert_eq!(
            settings.deployment_for(&app),
            DeploymentContext::Managed {
                tier: Tier::Staging,
                subdomain: "abcdefgh".to_string(),
                region: "eu-central-1".to_string(),
            }
        );
    }

    #[test]
    fn test_endpoint_env_key() {
        assert_eq!(endpoint_env_key(ServiceTarget::Auth), "CONSOLE_AUTH_URL");
        assert_eq!(
            endpoint_env_key(ServiceTarget::DatabaseAdmin),
            "CONSOLE_DATABASE_ADMIN_URL"
        );
    }

    #[test]
    fn test_substitute_env_in_string() {
        std::env::set_var("TEST_CONSOLE_SUB_A", "hello");
        assert_eq!(substitute_env_in_string("${TEST_CONSOLE_SUB_A}"), "hello");
        assert_eq!(
            substitute_env_in_string("prefix_${TEST_CONSOLE_SUB_A}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(substitute_env_in_string("no vars here"), "no vars here");
        assert_eq!(substitute_env_in_string("${UNTERMINATED"), "${UNTERMINATED");
        std::env::remove_var("TEST_CONSOLE_SUB_A");
    }
}
