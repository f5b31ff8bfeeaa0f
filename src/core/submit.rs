use serde_json::Value;

use super::app::{find_mut, get_app};
use super::list::find_duplicate;
use super::patch::{apply_patch, read_typed, ConfigPatch};
use super::roles::{is_system_role, roles_config};
use crate::error::{ConsoleError, Result};
use crate::models::EnvironmentVariable;
use crate::storage::Storage;

/// 当前配置树快照及其版本号
pub fn config_snapshot(storage: &Storage, app_id: &str) -> Result<(Value, u64)> {
    let app = get_app(storage, app_id)?;
    Ok((app.config.clone(), app.config_version))
}

/// 提交补丁：替换对应子树，版本号加一。
///
/// 带 `expected_version` 时做条件更新，版本不一致报 VersionConflict；
/// 不带时后写者覆盖。后端校验失败返回 Remote，状态不变。
pub fn submit_patch(
    storage: &mut Storage,
    app_id: &str,
    patch: &ConfigPatch,
    expected_version: Option<u64>,
) -> Result<u64> {
    if patch.path.is_empty() {
        return Err(ConsoleError::Remote(
            "patch path must not be empty".to_string(),
        ));
    }

    let id = get_app(storage, app_id)?.id.clone();
    let version = storage.commit(|state| {
        let app = find_mut(&mut state.apps, &id)?;
        if let Some(expected) = expected_version {
            if expected != app.config_version {
                return Err(ConsoleError::VersionConflict {
                    expected,
                    actual: app.config_version,
                });
            }
        }

        let mut candidate = app.config.clone();
        apply_patch(&mut candidate, patch).map_err(|e| ConsoleError::Remote(e.to_string()))?;
        validate_config(&candidate)?;

        app.config = candidate;
        app.config_version += 1;
        Ok(app.config_version)
    })?;

    tracing::info!(
        "applied patch {} to app {}, version {}",
        patch.dotted_path(),
        id,
        version
    );
    Ok(version)
}

/// 后端对整棵配置树的约束
fn validate_config(tree: &Value) -> Result<()> {
    let roles = roles_config(tree).map_err(|e| ConsoleError::Remote(e.to_string()))?;
    if !is_system_role(&roles.default) && !roles.allowed.contains(&roles.default) {
        return Err(ConsoleError::Remote(format!(
            "default role {:?} is not an allowed role",
            roles.default
        )));
    }

    let variables: Vec<EnvironmentVariable> = read_typed(tree, &["global", "environment"])
        .map_err(|e| ConsoleError::Remote(e.to_string()))?;
    if let Some(name) = find_duplicate(&variables) {
        return Err(ConsoleError::Remote(format!(
            "duplicate environment variable: {}",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::create_app;
    use crate::core::env::{create_environment_variable, edit_environment_variable};
    use crate::core::roles::{create_role, delete_role, set_default_role};
    use crate::models::EnvironmentVariable;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn setup() -> (Storage, String) {
        let tmp = NamedTempFile::new().unwrap();
        let mut storage = Storage::load(tmp.path()).unwrap();
        let app = create_app(&mut storage, "demo", "eu-central-1").unwrap();
        (storage, app.id)
    }

    fn var(name: &str, value: &str) -> EnvironmentVariable {
        EnvironmentVariable {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_submit_bumps_version() {
        let (mut storage, id) = setup();
        let (tree, version) = config_snapshot(&storage, &id).unwrap();
        assert_eq!(version, 0);

        let patch = create_environment_variable(&tree, var("A", "1")).unwrap();
        let version = submit_patch(&mut storage, &id, &patch, Some(0)).unwrap();
        assert_eq!(version, 1);

        let (tree, version) = config_snapshot(&storage, &id).unwrap();
        assert_eq!(version, 1);
        assert_eq!(
            tree,
            json!({"global": {"environment": [{"name": "A", "value": "1"}]}})
        );
    }

    #[test]
    fn test_edit_scenario_end_to_end() {
        let (mut storage, id) = setup();
        for (name, value) in [("A", "1"), ("B", "2")] {
            let (tree, _) = config_snapshot(&storage, &id).unwrap();
            let patch = create_environment_variable(&tree, var(name, value)).unwrap();
            submit_patch(&mut storage, &id, &patch, None).unwrap();
        }

        let (tree, _) = config_snapshot(&storage, &id).unwrap();
        let patch = edit_environment_variable(&tree, "B", var("B2", "2")).unwrap();
        submit_patch(&mut storage, &id, &patch, None).unwrap();

        let (tree, version) = config_snapshot(&storage, &id).unwrap();
        assert_eq!(version, 3);
        assert_eq!(
            tree["global"]["environment"],
            json!([{"name": "A", "value": "1"}, {"name": "B2", "value": "2"}])
        );
    }

    #[test]
    fn test_version_conflict_leaves_state() {
        let (mut storage, id) = setup();
        let (tree, _) = config_snapshot(&storage, &id).unwrap();
        let first = create_environment_variable(&tree, var("A", "1")).unwrap();
        let second = create_environment_variable(&tree, var("B", "2")).unwrap();

        submit_patch(&mut storage, &id, &first, Some(0)).unwrap();
        let err = submit_patch(&mut storage, &id, &second, Some(0)).unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::VersionConflict {
                expected: 0,
                actual: 1
            }
        ));

        let (tree, version) = config_snapshot(&storage, &id).unwrap();
        assert_eq!(version, 1);
        assert_eq!(tree["global"]["environment"], json!([{"name": "A", "value": "1"}]));
    }

    #[test]
    fn test_last_write_wins_without_version() {
        let (mut storage, id) = setup();
        let (tree, _) = config_snapshot(&storage, &id).unwrap();
        let first = create_environment_variable(&tree, var("A", "1")).unwrap();
        let second = create_environment_variable(&tree, var("B", "2")).unwrap();

        submit_patch(&mut storage, &id, &first, None).unwrap();
        submit_patch(&mut storage, &id, &second, None).unwrap();

        let (tree, _) = config_snapshot(&storage, &id).unwrap();
        assert_eq!(tree["global"]["environment"], json!([{"name": "B", "value": "2"}]));
    }

    #[test]
    fn test_remote_rejects_dangling_default_role() {
        let (mut storage, id) = setup();
        let patch = ConfigPatch::new(
            &["auth", "user", "roles"],
            json!({"allowed": ["user"], "default": "ghost"}),
        );
        let err = submit_patch(&mut storage, &id, &patch, None).unwrap_err();
        assert!(matches!(err, ConsoleError::Remote(ref m) if m.contains("ghost")));
        assert_eq!(config_snapshot(&storage, &id).unwrap().1, 0);
    }

    #[test]
    fn test_remote_rejects_duplicate_environment() {
        let (mut storage, id) = setup();
        let patch = ConfigPatch::new(
            &["global"],
            json!({"environment": [{"name": "A", "value": "1"}, {"name": "A", "value": "2"}]}),
        );
        let err = submit_patch(&mut storage, &id, &patch, None).unwrap_err();
        assert!(matches!(err, ConsoleError::Remote(_)));
    }

    #[test]
    fn test_remote_rejects_empty_path() {
        let (mut storage, id) = setup();
        let patch = ConfigPatch::new(&[], json!({}));
        assert!(matches!(
            submit_patch(&mut storage, &id, &patch, None).unwrap_err(),
            ConsoleError::Remote(_)
        ));
    }

    #[test]
    fn test_role_lifecycle() {
        let (mut storage, id) = setup();

        let (tree, _) = config_snapshot(&storage, &id).unwrap();
        submit_patch(&mut storage, &id, &create_role(&tree, "admin").unwrap(), None).unwrap();

        let (tree, _) = config_snapshot(&storage, &id).unwrap();
        submit_patch(&mut storage, &id, &set_default_role(&tree, "admin").unwrap(), None).unwrap();

        let (tree, _) = config_snapshot(&storage, &id).unwrap();
        submit_patch(&mut storage, &id, &delete_role(&tree, "admin").unwrap(), None).unwrap();

        let (tree, version) = config_snapshot(&storage, &id).unwrap();
        assert_eq!(version, 3);
        assert_eq!(
            tree["auth"]["user"]["roles"],
            json!({"allowed": [], "default": "user"})
        );
    }

    #[test]
    fn test_submit_app_not_found() {
        let (mut storage, _) = setup();
        let patch = ConfigPatch::new(&["global"], json!({}));
        assert!(matches!(
            submit_patch(&mut storage, "nope", &patch, None).unwrap_err(),
            ConsoleError::AppNotFound(_)
        ));
    }
}
