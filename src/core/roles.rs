use serde_json::{Map, Value};

use super::list::{create_entry, delete_entry, edit_entry};
use super::patch::{build_patch, subtree, ConfigPatch};
use crate::error::{ConsoleError, Result};
use crate::models::RolesConfig;

/// 删除默认角色后回落到的角色
pub const FALLBACK_ROLE: &str = "user";

/// 系统内置角色，不可编辑或删除
pub const SYSTEM_ROLES: &[&str] = &["user", "me"];

const ROLES: &[&str] = &["auth", "user", "roles"];

/// 读取 auth.user.roles，缺失时 allowed 为空、default 为 "user"
pub fn roles_config(tree: &Value) -> Result<RolesConfig> {
    match subtree(tree, ROLES) {
        None | Some(Value::Null) => Ok(RolesConfig {
            allowed: vec![],
            default: FALLBACK_ROLE.to_string(),
        }),
        Some(value) => Ok(serde_json::from_value(value.clone())?),
    }
}

pub fn is_system_role(name: &str) -> bool {
    SYSTEM_ROLES.contains(&name)
}

pub fn create_role(tree: &Value, name: &str) -> Result<ConfigPatch> {
    validate_role_name(name)?;
    let roles = roles_config(tree)?;
    let allowed = create_entry(&roles.allowed, name.to_string())?;
    roles_patch(tree, allowed, roles.default)
}

/// 重命名角色；被重命名的若是默认角色，默认指针跟随新名字
pub fn edit_role(tree: &Value, original: &str, name: &str) -> Result<ConfigPatch> {
    reject_system_role(original)?;
    validate_role_name(name)?;
    let roles = roles_config(tree)?;
    let allowed = edit_entry(&roles.allowed, original, name.to_string())?;
    let default = if roles.default == original {
        name.to_string()
    } else {
        roles.default
    };
    roles_patch(tree, allowed, default)
}

/// 删除角色；删除的若是默认角色，默认改为 FALLBACK_ROLE
pub fn delete_role(tree: &Value, name: &str) -> Result<ConfigPatch> {
    reject_system_role(name)?;
    let roles = roles_config(tree)?;
    let allowed = delete_entry(&roles.allowed, name)?;
    let default = if roles.default == name {
        FALLBACK_ROLE.to_string()
    } else {
        roles.default
    };
    roles_patch(tree, allowed, default)
}

pub fn set_default_role(tree: &Value, name: &str) -> Result<ConfigPatch> {
    let roles = roles_config(tree)?;
    if !roles.allowed.iter().any(|r| r == name) {
        return Err(ConsoleError::EntryNotFound(name.to_string()));
    }
    roles_patch(tree, roles.allowed, name.to_string())
}

fn roles_patch(tree: &Value, allowed: Vec<String>, default: String) -> Result<ConfigPatch> {
    let mut form = Map::new();
    form.insert("allowed".to_string(), serde_json::to_value(allowed)?);
    form.insert("default".to_string(), Value::String(default));
    build_patch(tree, ROLES, &form)
}

fn reject_system_role(name: &str) -> Result<()> {
    if is_system_role(name) {
        return Err(ConsoleError::Validation(format!(
            "system role cannot be modified: {}",
            name
        )));
    }
    Ok(())
}

fn validate_role_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
        return Err(ConsoleError::Validation(format!("invalid role name: {:?}", name)));
    }
    Ok(())
}
