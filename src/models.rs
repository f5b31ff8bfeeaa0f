use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 可寻址的后端服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceTarget {
    Auth,
    Graphql,
    Functions,
    Storage,
    DatabaseAdmin,
}

impl ServiceTarget {
    pub const ALL: [ServiceTarget; 5] = [
        ServiceTarget::Auth,
        ServiceTarget::Graphql,
        ServiceTarget::Functions,
        ServiceTarget::Storage,
        ServiceTarget::DatabaseAdmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceTarget::Auth => "auth",
            ServiceTarget::Graphql => "graphql",
            ServiceTarget::Functions => "functions",
            ServiceTarget::Storage => "storage",
            ServiceTarget::DatabaseAdmin => "database-admin",
        }
    }

    /// 托管云主机名中的服务段，数据库管理服务在平台上叫 hasura
    pub fn host_label(self) -> &'static str {
        match self {
            ServiceTarget::DatabaseAdmin => "hasura",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown service: {}", s))
    }
}

/// 部署环境等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[serde(alias = "dev")]
    Development,
    Staging,
    #[serde(alias = "prod")]
    Production,
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Tier::Development),
            "staging" => Ok(Tier::Staging),
            "prod" | "production" => Ok(Tier::Production),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// 部署上下文：自托管，或托管云（带等级、子域名、区域）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentContext {
    SelfHosted,
    Managed {
        tier: Tier,
        subdomain: String,
        region: String,
    },
}

/// 应用（项目）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct App {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub subdomain: String,
    pub region: String,
    #[serde(default)]
    pub base_folder: String,
    /// unix 秒
    pub created_at: u64,
    /// 后端配置树，根为 object
    pub config: serde_json::Value,
    pub config_version: u64,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

/// 完整的控制台状态，用于内存存储和文件持久化
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsoleState {
    pub apps: Vec<App>,
}

/// 环境变量（列表中按 name 唯一）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

/// 密钥（按 name 唯一）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub value: String,
}

/// auth.user.roles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolesConfig {
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default = "default_role")]
    pub default: String,
}

fn default_role() -> String {
    crate::core::roles::FALLBACK_ROLE.to_string()
}

/// 支持的 OAuth 登录提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Apple,
    Github,
    Google,
    Discord,
    Gitlab,
    Facebook,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Apple => "apple",
            OAuthProvider::Github => "github",
            OAuthProvider::Google => "google",
            OAuthProvider::Discord => "discord",
            OAuthProvider::Gitlab => "gitlab",
            OAuthProvider::Facebook => "facebook",
        }
    }

    /// 启用时必须填写的字段
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            OAuthProvider::Apple => &["teamId", "keyId", "clientId", "privateKey"],
            _ => &["clientId", "clientSecret"],
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown oauth provider: {}", s))
    }
}
