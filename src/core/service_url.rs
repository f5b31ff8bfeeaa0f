use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};
use crate::models::{DeploymentContext, OAuthProvider, ServiceTarget, Tier};

pub const DEFAULT_BASE_DOMAIN: &str = "nhost.run";

/// 服务 → 路径后缀。每个 ServiceTarget 对应一个字段，不存在缺项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceUrlMap {
    pub auth: String,
    pub graphql: String,
    pub functions: String,
    pub storage: String,
    pub database_admin: String,
}

impl ServiceUrlMap {
    /// 本地运行（自托管、或连接共享开发后端）时的后缀
    pub fn local() -> Self {
        Self {
            auth: "/v1/auth".to_string(),
            graphql: "/v1/graphql".to_string(),
            functions: "/v1/functions".to_string(),
            storage: "/v1/files".to_string(),
            database_admin: String::new(),
        }
    }

    /// 托管云（staging / production）下的后缀
    pub fn remote() -> Self {
        Self {
            auth: "/v1".to_string(),
            graphql: "/v1".to_string(),
            functions: "/v1".to_string(),
            storage: "/v1".to_string(),
            database_admin: String::new(),
        }
    }

    pub fn slug(&self, service: ServiceTarget) -> &str {
        match service {
            ServiceTarget::Auth => &self.auth,
            ServiceTarget::Graphql => &self.graphql,
            ServiceTarget::Functions => &self.functions,
            ServiceTarget::Storage => &self.storage,
            ServiceTarget::DatabaseAdmin => &self.database_admin,
        }
    }
}

/// 自托管模式下每个服务的基础地址，来自外部环境
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServiceEndpoints {
    pub auth: Option<String>,
    pub graphql: Option<String>,
    pub functions: Option<String>,
    pub storage: Option<String>,
    pub database_admin: Option<String>,
}

impl ServiceEndpoints {
    /// 空字符串视为未设置
    pub fn get(&self, service: ServiceTarget) -> Option<&str> {
        let value = match service {
            ServiceTarget::Auth => &self.auth,
            ServiceTarget::Graphql => &self.graphql,
            ServiceTarget::Functions => &self.functions,
            ServiceTarget::Storage => &self.storage,
            ServiceTarget::DatabaseAdmin => &self.database_admin,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, service: ServiceTarget, url: impl Into<String>) {
        let slot = match service {
            ServiceTarget::Auth => &mut self.auth,
            ServiceTarget::Graphql => &mut self.graphql,
            ServiceTarget::Functions => &mut self.functions,
            ServiceTarget::Storage => &mut self.storage,
            ServiceTarget::DatabaseAdmin => &mut self.database_admin,
        };
        *slot = Some(url.into());
    }
}

/// 地址解析所需的全部外部输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UrlSettings {
    pub endpoints: ServiceEndpoints,
    /// development 等级下所有服务共用的后端地址
    pub dev_backend_url: Option<String>,
    pub base_domain: String,
    pub local_slugs: ServiceUrlMap,
    pub remote_slugs: ServiceUrlMap,
    /// development 下直连数据库管理服务用的 admin secret
    pub admin_secret: Option<String>,
}

impl Default for UrlSettings {
    fn default() -> Self {
        Self {
            endpoints: ServiceEndpoints::default(),
            dev_backend_url: None,
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            local_slugs: ServiceUrlMap::local(),
            remote_slugs: ServiceUrlMap::remote(),
            admin_secret: None,
        }
    }
}

/// 解析某个服务的基础 URL。纯函数，不做缓存。
///
/// 先判断部署模式，只有托管模式才看 tier。托管云主机名用 `ServiceTarget::host_label`。
pub fn resolve(
    service: ServiceTarget,
    deployment: &DeploymentContext,
    settings: &UrlSettings,
) -> Result<String> {
    match deployment {
        DeploymentContext::SelfHosted => settings
            .endpoints
            .get(service)
            .map(|url| url.to_string())
            .ok_or(ConsoleError::Configuration { service }),
        DeploymentContext::Managed {
            tier,
            subdomain,
            region,
        } => match tier {
            Tier::Development => {
                let backend = settings
                    .dev_backend_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConsoleError::Configuration { service })?;
                Ok(format!(
                    "{}{}",
                    backend.trim_end_matches('/'),
                    settings.local_slugs.slug(service)
                ))
            }
            Tier::Staging => Ok(format!(
                "https://{}.{}.{}.staging.{}{}",
                subdomain,
                service.host_label(),
                region,
                settings.base_domain,
                settings.remote_slugs.slug(service)
            )),
            Tier::Production => Ok(format!(
                "https://{}.{}.{}.{}{}",
                subdomain,
                service.host_label(),
                region,
                settings.base_domain,
                settings.remote_slugs.slug(service)
            )),
        },
    }
}

/// OAuth 提供方回调地址，需要在提供方后台登记
pub fn oauth_callback_url(
    provider: OAuthProvider,
    deployment: &DeploymentContext,
    settings: &UrlSettings,
) -> Result<String> {
    let auth = resolve(ServiceTarget::Auth, deployment, settings)?;
    Ok(format!("{}/signin/provider/{}/callback", auth, provider))
}

/// 直连应用自身 GraphQL 接口所需的地址和 admin secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEndpoint {
    pub url: String,
    pub admin_secret: String,
}

/// development 下 secret 来自本地设置，其余情况读应用配置 hasura.adminSecret
pub fn remote_graphql_endpoint(
    config: &serde_json::Value,
    deployment: &DeploymentContext,
    settings: &UrlSettings,
) -> Result<RemoteEndpoint> {
    let url = resolve(ServiceTarget::Graphql, deployment, settings)?;

    let local_secret = matches!(
        deployment,
        DeploymentContext::Managed {
            tier: Tier::Development,
            ..
        }
    );
    let secret = if local_secret {
        settings.admin_secret.clone()
    } else {
        config
            .pointer("/hasura/adminSecret")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    let admin_secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(ConsoleError::Configuration {
            service: ServiceTarget::DatabaseAdmin,
        })?;

    Ok(RemoteEndpoint { url, admin_secret })
}
