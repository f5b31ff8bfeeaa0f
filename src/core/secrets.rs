use super::app::{find_mut, get_app};
use super::list::{create_entry, delete_entry, edit_entry};
use crate::error::{ConsoleError, Result};
use crate::models::Secret;
use crate::storage::Storage;

/// 列出应用的密钥名称，值不外露
pub fn list_secrets(storage: &Storage, app_id: &str) -> Result<Vec<String>> {
    let app = get_app(storage, app_id)?;
    Ok(app.secrets.iter().map(|s| s.name.clone()).collect())
}

/// 创建密钥。名称重复报 DuplicateKey。写时持久化，失败回滚。
pub fn create_secret(storage: &mut Storage, app_id: &str, name: &str, value: &str) -> Result<()> {
    validate(name, value)?;
    let id = get_app(storage, app_id)?.id.clone();
    storage.commit(|state| {
        let app = find_mut(&mut state.apps, &id)?;
        app.secrets = create_entry(
            &app.secrets,
            Secret {
                name: name.to_string(),
                value: value.to_string(),
            },
        )?;
        Ok(())
    })?;
    tracing::info!("created secret {} for app {}", name, id);
    Ok(())
}

/// 更新密钥值，名称不可修改
pub fn update_secret(storage: &mut Storage, app_id: &str, name: &str, value: &str) -> Result<()> {
    validate(name, value)?;
    let id = get_app(storage, app_id)?.id.clone();
    storage.commit(|state| {
        let app = find_mut(&mut state.apps, &id)?;
        app.secrets = edit_entry(
            &app.secrets,
            name,
            Secret {
                name: name.to_string(),
                value: value.to_string(),
            },
        )?;
        Ok(())
    })?;
    tracing::info!("updated secret {} for app {}", name, id);
    Ok(())
}

pub fn delete_secret(storage: &mut Storage, app_id: &str, name: &str) -> Result<()> {
    let id = get_app(storage, app_id)?.id.clone();
    storage.commit(|state| {
        let app = find_mut(&mut state.apps, &id)?;
        app.secrets = delete_entry(&app.secrets, name)?;
        Ok(())
    })?;
    tracing::info!("deleted secret {} for app {}", name, id);
    Ok(())
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConsoleError::Validation("secret name is required".to_string()));
    }
    if value.is_empty() {
        return Err(ConsoleError::Validation("secret value is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::create_app;
    use tempfile::NamedTempFile;

    fn setup() -> (Storage, String) {
        let tmp = NamedTempFile::new().unwrap();
        let mut storage = Storage::load(tmp.path()).unwrap();
        let app = create_app(&mut storage, "demo", "eu-central-1").unwrap();
        (storage, app.id)
    }

    #[test]
    fn test_create_and_list_secrets() {
        let (mut storage, id) = setup();
        assert!(list_secrets(&storage, &id).unwrap().is_empty());

        create_secret(&mut storage, &id, "STRIPE_KEY", "sk_1").unwrap();
        create_secret(&mut storage, &id, "SMTP_PASSWORD", "p").unwrap();
        assert_eq!(
            list_secrets(&storage, &id).unwrap(),
            vec!["STRIPE_KEY".to_string(), "SMTP_PASSWORD".to_string()]
        );
    }

    #[test]
    fn test_create_duplicate_secret() {
        let (mut storage, id) = setup();
        create_secret(&mut storage, &id, "KEY", "v").unwrap();
        let err = create_secret(&mut storage, &id, "KEY", "w").unwrap_err();
        assert!(matches!(err, ConsoleError::DuplicateKey(_)));
    }

    #[test]
    fn test_update_secret() {
        let (mut storage, id) = setup();
        create_secret(&mut storage, &id, "KEY", "old").unwrap();
        update_secret(&mut storage, &id, "KEY", "new").unwrap();
        let app = get_app(&storage, &id).unwrap();
        assert_eq!(app.secrets[0].value, "new");
    }

    #[test]
    fn test_update_missing_secret() {
        let (mut storage, id) = setup();
        let err = update_secret(&mut storage, &id, "KEY", "new").unwrap_err();
        assert!(matches!(err, ConsoleError::EntryNotFound(_)));
    }

    #[test]
    fn test_delete_secret() {
        let (mut storage, id) = setup();
        create_secret(&mut storage, &id, "KEY", "v").unwrap();
        delete_secret(&mut storage, &id, "KEY").unwrap();
        assert!(list_secrets(&storage, &id).unwrap().is_empty());

        let err = delete_secret(&mut storage, &id, "KEY").unwrap_err();
        assert!(matches!(err, ConsoleError::EntryNotFound(_)));
    }

    #[test]
    fn test_empty_value_rejected() {
        let (mut storage, id) = setup();
        let err = create_secret(&mut storage, &id, "KEY", "").unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
    }

    #[test]
    fn test_app_not_found() {
        let (mut storage, _) = setup();
        let err = create_secret(&mut storage, "nope", "KEY", "v").unwrap_err();
        assert!(matches!(err, ConsoleError::AppNotFound(_)));
    }
}
