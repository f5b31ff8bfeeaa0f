use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ConsoleError, Result};
use crate::models::App;
use crate::storage::Storage;

const SUBDOMAIN_LEN: usize = 20;

/// 创建应用：名称 1-32 字符，slug 由名称生成且唯一，子域名随机。
/// 配置树初始为空 object，版本号为 0。
pub fn create_app(storage: &mut Storage, name: &str, region: &str) -> Result<App> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 32 {
        return Err(ConsoleError::Validation(
            "the project name must be between 1 and 32 characters".to_string(),
        ));
    }
    if region.trim().is_empty() {
        return Err(ConsoleError::Validation("region is required".to_string()));
    }

    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ConsoleError::Validation(format!(
            "project name has no usable characters: {:?}",
            name
        )));
    }
    if storage.state().apps.iter().any(|a| a.slug == slug) {
        return Err(ConsoleError::DuplicateKey(slug));
    }

    let subdomain: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SUBDOMAIN_LEN)
        .collect();

    let app = App {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        slug,
        subdomain,
        region: region.to_string(),
        base_folder: ".".to_string(),
        created_at: now_secs(),
        config: serde_json::json!({}),
        config_version: 0,
        secrets: vec![],
    };

    let created = app.clone();
    storage.commit(|state| {
        state.apps.push(app);
        Ok(())
    })?;

    tracing::info!("created app {} ({})", created.slug, created.id);
    Ok(created)
}

/// 列出所有应用
pub fn list_apps(storage: &Storage) -> Vec<&App> {
    storage.state().apps.iter().collect()
}

/// 按 id 或 slug 查找
pub fn get_app<'a>(storage: &'a Storage, app_id: &str) -> Result<&'a App> {
    storage
        .state()
        .apps
        .iter()
        .find(|a| a.id == app_id || a.slug == app_id)
        .ok_or_else(|| ConsoleError::AppNotFound(app_id.to_string()))
}

pub fn delete_app(storage: &mut Storage, app_id: &str) -> Result<()> {
    let id = get_app(storage, app_id)?.id.clone();
    storage.commit(|state| {
        state.apps.retain(|a| a.id != id);
        Ok(())
    })?;
    tracing::info!("deleted app {}", id);
    Ok(())
}

/// 应用设置的可修改字段，`None` 表示不改
#[derive(Debug, Clone, Default)]
pub struct AppUpdate<'a> {
    pub name: Option<&'a str>,
    pub base_folder: Option<&'a str>,
}

/// 先校验全部字段，再在一次提交内写入，任何一项不合法都不会留下部分修改。
/// `app_id` 可以是 id 或 slug，改名后 slug 会变，所以提交时按 id 定位。
pub fn update_app(
    storage: &mut Storage,
    app_id: &str,
    update: AppUpdate<'_>,
) -> Result<App> {
    let id = get_app(storage, app_id)?.id.clone();

    let renamed = match update.name {
        Some(name) => {
            let name = name.trim();
            let len = name.chars().count();
            if !(3..=32).contains(&len) {
                return Err(ConsoleError::Validation(
                    "the project name must be between 3 and 32 characters".to_string(),
                ));
            }
            let slug = slugify(name);
            if storage
                .state()
                .apps
                .iter()
                .any(|a| a.slug == slug && a.id != id)
            {
                return Err(ConsoleError::DuplicateKey(slug));
            }
            Some((name.to_string(), slug))
        }
        None => None,
    };

    let folder = match update.base_folder {
        Some(folder) => {
            let folder = folder.trim();
            if folder.is_empty() {
                return Err(ConsoleError::Validation("base folder is required".to_string()));
            }
            Some(folder.to_string())
        }
        None => None,
    };

    let updated = storage.commit(|state| {
        let app = find_mut(&mut state.apps, &id)?;
        if let Some((name, slug)) = renamed {
            app.name = name;
            app.slug = slug;
        }
        if let Some(folder) = folder {
            app.base_folder = folder;
        }
        Ok(app.clone())
    })?;

    tracing::info!("updated app {} ({})", updated.slug, updated.id);
    Ok(updated)
}

/// 修改应用名称（3-32 字符），slug 随之更新
pub fn rename_app(storage: &mut Storage, app_id: &str, name: &str) -> Result<App> {
    update_app(
        storage,
        app_id,
        AppUpdate {
            name: Some(name),
            ..AppUpdate::default()
        },
    )
}

/// 设置仓库中后端工程所在的基础目录
pub fn set_base_folder(storage: &mut Storage, app_id: &str, folder: &str) -> Result<App> {
    update_app(
        storage,
        app_id,
        AppUpdate {
            base_folder: Some(folder),
            ..AppUpdate::default()
        },
    )
}

pub(crate) fn find_mut<'a>(apps: &'a mut [App], id: &str) -> Result<&'a mut App> {
    apps.iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| ConsoleError::AppNotFound(id.to_string()))
}

/// 小写，字母数字保留，空白和连字符折叠为单个 '-'，其余字符丢弃
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
