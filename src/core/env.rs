use serde_json::{Map, Value};

use super::list::{create_entry, delete_entry, edit_entry};
use super::patch::{build_patch, read_typed, ConfigPatch};
use crate::error::{ConsoleError, Result};
use crate::models::EnvironmentVariable;

const GLOBAL: &[&str] = &["global"];
const ENVIRONMENT: &[&str] = &["global", "environment"];

/// 当前配置树中的环境变量列表
pub fn list_environment_variables(tree: &Value) -> Result<Vec<EnvironmentVariable>> {
    read_typed(tree, ENVIRONMENT)
}

/// 新增环境变量。补丁建在 global 上，保留 environment 之外的兄弟字段。
pub fn create_environment_variable(
    tree: &Value,
    variable: EnvironmentVariable,
) -> Result<ConfigPatch> {
    validate_name(&variable.name)?;
    let current = list_environment_variables(tree)?;
    let next = create_entry(&current, variable)?;
    environment_patch(tree, next)
}

/// 编辑环境变量，可改名。列表顺序不变。
pub fn edit_environment_variable(
    tree: &Value,
    original_name: &str,
    variable: EnvironmentVariable,
) -> Result<ConfigPatch> {
    validate_name(&variable.name)?;
    let current = list_environment_variables(tree)?;
    let next = edit_entry(&current, original_name, variable)?;
    environment_patch(tree, next)
}

pub fn delete_environment_variable(tree: &Value, name: &str) -> Result<ConfigPatch> {
    let current = list_environment_variables(tree)?;
    let next = delete_entry(&current, name)?;
    environment_patch(tree, next)
}

fn environment_patch(tree: &Value, variables: Vec<EnvironmentVariable>) -> Result<ConfigPatch> {
    let mut form = Map::new();
    form.insert("environment".to_string(), serde_json::to_value(variables)?);
    build_patch(tree, GLOBAL, &form)
}

/// 变量名：字母或下划线开头，只含字母、数字、下划线
fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ConsoleError::Validation(format!(
            "invalid environment variable name: {:?}",
            name
        )))
    }
}
