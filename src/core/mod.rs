pub mod app;
pub mod env;
pub mod list;
pub mod patch;
pub mod roles;
pub mod secrets;
pub mod service_url;
pub mod sign_in;
pub mod submit;

use serde_json::Value;

use crate::error::Result;
use crate::models::{App, DeploymentContext, OAuthProvider, ServiceTarget};
use crate::settings::Settings;
use crate::storage::Storage;
use patch::ConfigPatch;
use service_url::RemoteEndpoint;

/// 控制台：应用存储 + 运行设置。
/// 所有补丁构造在调用方完成，这里只负责查询快照和提交。
pub struct Console {
    storage: Storage,
    settings: Settings,
}

impl Console {
    pub fn new(settings: Settings) -> Result<Self> {
        let storage = Storage::load(&settings.data_path)?;
        tracing::debug!(
            "loaded {} apps from {:?}",
            storage.state().apps.len(),
            storage.file_path()
        );
        Ok(Self { storage, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn create_app(&mut self, name: &str, region: &str) -> Result<App> {
        app::create_app(&mut self.storage, name, region)
    }

    pub fn list_apps(&self) -> Vec<&App> {
        app::list_apps(&self.storage)
    }

    pub fn get_app(&self, app_id: &str) -> Result<&App> {
        app::get_app(&self.storage, app_id)
    }

    pub fn delete_app(&mut self, app_id: &str) -> Result<()> {
        app::delete_app(&mut self.storage, app_id)
    }

    pub fn update_app(&mut self, app_id: &str, update: app::AppUpdate<'_>) -> Result<App> {
        app::update_app(&mut self.storage, app_id, update)
    }

    pub fn rename_app(&mut self, app_id: &str, name: &str) -> Result<App> {
        app::rename_app(&mut self.storage, app_id, name)
    }

    pub fn set_base_folder(&mut self, app_id: &str, folder: &str) -> Result<App> {
        app::set_base_folder(&mut self.storage, app_id, folder)
    }

    pub fn config_snapshot(&self, app_id: &str) -> Result<(Value, u64)> {
        submit::config_snapshot(&self.storage, app_id)
    }

    pub fn submit_patch(
        &mut self,
        app_id: &str,
        patch: &ConfigPatch,
        expected_version: Option<u64>,
    ) -> Result<u64> {
        submit::submit_patch(&mut self.storage, app_id, patch, expected_version)
    }

    /// 对当前快照构造补丁并提交，构造失败时不会发出请求
    pub fn update_config(
        &mut self,
        app_id: &str,
        build: impl FnOnce(&Value) -> Result<ConfigPatch>,
    ) -> Result<u64> {
        let (tree, version) = self.config_snapshot(app_id)?;
        let patch = build(&tree)?;
        self.submit_patch(app_id, &patch, Some(version))
    }

    pub fn list_secrets(&self, app_id: &str) -> Result<Vec<String>> {
        secrets::list_secrets(&self.storage, app_id)
    }

    pub fn create_secret(&mut self, app_id: &str, name: &str, value: &str) -> Result<()> {
        secrets::create_secret(&mut self.storage, app_id, name, value)
    }

    pub fn update_secret(&mut self, app_id: &str, name: &str, value: &str) -> Result<()> {
        secrets::update_secret(&mut self.storage, app_id, name, value)
    }

    pub fn delete_secret(&mut self, app_id: &str, name: &str) -> Result<()> {
        secrets::delete_secret(&mut self.storage, app_id, name)
    }

    pub fn deployment(&self, app_id: &str) -> Result<DeploymentContext> {
        let app = self.get_app(app_id)?;
        Ok(self.settings.deployment_for(app))
    }

    pub fn service_url(&self, app_id: &str, service: ServiceTarget) -> Result<String> {
        let deployment = self.deployment(app_id)?;
        service_url::resolve(service, &deployment, &self.settings.urls)
    }

    pub fn oauth_callback_url(&self, app_id: &str, provider: OAuthProvider) -> Result<String> {
        let deployment = self.deployment(app_id)?;
        service_url::oauth_callback_url(provider, &deployment, &self.settings.urls)
    }

    pub fn remote_graphql_endpoint(&self, app_id: &str) -> Result<RemoteEndpoint> {
        let app = self.get_app(app_id)?;
        let deployment = self.settings.deployment_for(app);
        service_url::remote_graphql_endpoint(&app.config, &deployment, &self.settings.urls)
    }
}
