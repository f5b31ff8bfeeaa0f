use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConsoleError, Result};

/// 对远端配置树某个子树的整体替换。
///
/// 传输语义是“替换该子树”而不是“合并键”，所以 `value` 必须列出子树中
/// 所有需要保留的兄弟字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigPatch {
    pub fn new(path: &[&str], value: Value) -> Self {
        Self {
            path: path.iter().map(|s| s.to_string()).collect(),
            value,
        }
    }

    /// 按路径嵌套成 mutation 载荷，例如 {"auth":{"user":{"roles":{...}}}}
    pub fn to_document(&self) -> Value {
        self.path
            .iter()
            .rev()
            .fold(self.value.clone(), |inner, key| {
                let mut map = Map::new();
                map.insert(key.clone(), inner);
                Value::Object(map)
            })
    }

    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// 读取路径上的子树，路径不存在返回 None
pub fn subtree<'a, S: AsRef<str>>(tree: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter()
        .try_fold(tree, |node, key| node.as_object()?.get(key.as_ref()))
}

/// 构造替换 `branch_path` 子树的补丁：表单值全部写入，其余兄弟字段原样保留。
/// 子树不存在视为空 object；路径上遇到非 object 值报 InvalidPath。
pub fn build_patch<S: AsRef<str>>(
    current: &Value,
    branch_path: &[S],
    form_values: &Map<String, Value>,
) -> Result<ConfigPatch> {
    let path: Vec<String> = branch_path.iter().map(|s| s.as_ref().to_string()).collect();

    let mut node = current;
    let mut missing = false;
    for (depth, key) in path.iter().enumerate() {
        let map = node
            .as_object()
            .ok_or_else(|| ConsoleError::InvalidPath(path[..depth].join(".")))?;
        match map.get(key) {
            Some(next) if !next.is_null() => node = next,
            _ => {
                missing = true;
                break;
            }
        }
    }

    let mut merged = if missing {
        Map::new()
    } else {
        node.as_object()
            .cloned()
            .ok_or_else(|| ConsoleError::InvalidPath(path.join(".")))?
    };

    for (key, value) in form_values {
        merged.insert(key.clone(), value.clone());
    }

    Ok(ConfigPatch {
        path,
        value: Value::Object(merged),
    })
}

/// 将补丁应用到配置树：缺失的中间节点补成 object，目标子树整体替换
pub fn apply_patch(tree: &mut Value, patch: &ConfigPatch) -> Result<()> {
    let Some((last, parents)) = patch.path.split_last() else {
        return Err(ConsoleError::InvalidPath(String::new()));
    };

    if tree.is_null() {
        *tree = Value::Object(Map::new());
    }

    let mut node = tree;
    for (depth, key) in parents.iter().enumerate() {
        let map = node
            .as_object_mut()
            .ok_or_else(|| ConsoleError::InvalidPath(patch.path[..depth].join(".")))?;
        let child = map
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if child.is_null() {
            *child = Value::Object(Map::new());
        }
        node = child;
    }

    let map = node
        .as_object_mut()
        .ok_or_else(|| ConsoleError::InvalidPath(parents.join(".")))?;
    map.insert(last.clone(), patch.value.clone());
    Ok(())
}

/// 按类型读取路径上的值，缺失或 null 时返回 Default
pub fn read_typed<T, S>(tree: &Value, path: &[S]) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
    S: AsRef<str>,
{
    match subtree(tree, path) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => Ok(serde_json::from_value(value.clone())?),
    }
}

/// 把 Value 转成表单 Map，非 object 报 Validation
pub fn form_from_value(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ConsoleError::Validation(format!(
            "form values must be an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Map<String, Value> {
        form_from_value(value).unwrap()
    }

    #[test]
    fn test_build_patch_preserves_siblings() {
        let tree = json!({"settings": {"a": 1, "b": 2, "c": 3}});
        let patch = build_patch(&tree, &["settings"], &form(json!({"b": 5}))).unwrap();
        assert_eq!(patch.path, vec!["settings"]);
        assert_eq!(patch.value, json!({"a": 1, "b": 5, "c": 3}));
    }

    #[test]
    fn test_build_patch_missing_branch() {
        let tree = json!({"auth": {}});
        let patch = build_patch(
            &tree,
            &["auth", "method", "oauth", "github"],
            &form(json!({"enabled": true})),
        )
        .unwrap();
        assert_eq!(patch.value, json!({"enabled": true}));
    }

    #[test]
    fn test_build_patch_null_branch_is_empty() {
        let tree = json!({"auth": null});
        let patch = build_patch(&tree, &["auth", "signUp"], &form(json!({"enabled": false}))).unwrap();
        assert_eq!(patch.value, json!({"enabled": false}));
    }

    #[test]
    fn test_build_patch_through_scalar_fails() {
        let tree = json!({"auth": {"user": "oops"}});
        let err = build_patch(&tree, &["auth", "user", "roles"], &form(json!({}))).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidPath(ref p) if p == "auth.user"));
    }

    #[test]
    fn test_build_patch_does_not_touch_current() {
        let tree = json!({"global": {"environment": [], "other": true}});
        let before = tree.clone();
        build_patch(&tree, &["global"], &form(json!({"environment": [{"name": "A"}]}))).unwrap();
        assert_eq!(tree, before);
    }

    #[test]
    fn test_to_document_nests_path() {
        let patch = ConfigPatch::new(&["auth", "user", "roles"], json!({"default": "user"}));
        assert_eq!(
            patch.to_document(),
            json!({"auth": {"user": {"roles": {"default": "user"}}}})
        );
        assert_eq!(patch.dotted_path(), "auth.user.roles");
    }

    #[test]
    fn test_apply_patch_replaces_subtree() {
        let mut tree = json!({"global": {"environment": [{"name": "A", "value": "1"}], "keep": 1}, "auth": {"x": 1}});
        let patch = ConfigPatch::new(&["global"], json!({"environment": []}));
        apply_patch(&mut tree, &patch).unwrap();
        // 替换语义：global 下未列出的 keep 被丢弃，兄弟分支 auth 不受影响
        assert_eq!(tree, json!({"global": {"environment": []}, "auth": {"x": 1}}));
    }

    #[test]
    fn test_apply_patch_creates_intermediate_nodes() {
        let mut tree = Value::Null;
        let patch = ConfigPatch::new(&["auth", "signUp"], json!({"enabled": true}));
        apply_patch(&mut tree, &patch).unwrap();
        assert_eq!(tree, json!({"auth": {"signUp": {"enabled": true}}}));
    }

    #[test]
    fn test_apply_patch_empty_path() {
        let mut tree = json!({});
        let patch = ConfigPatch::new(&[], json!({}));
        assert!(matches!(
            apply_patch(&mut tree, &patch).unwrap_err(),
            ConsoleError::InvalidPath(_)
        ));
    }

    #[test]
    fn test_apply_built_patch_keeps_siblings() {
        let mut tree = json!({"settings": {"a": 1, "b": 2, "c": 3}, "other": "x"});
        let patch = build_patch(&tree, &["settings"], &form(json!({"b": 5}))).unwrap();
        apply_patch(&mut tree, &patch).unwrap();
        assert_eq!(tree, json!({"settings": {"a": 1, "b": 5, "c": 3}, "other": "x"}));
    }

    #[test]
    fn test_subtree_lookup() {
        let tree = json!({"a": {"b": {"c": 1}}});
        assert_eq!(subtree(&tree, &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(subtree(&tree, &["a", "x"]), None);
        assert_eq!(subtree::<&str>(&tree, &[]), Some(&tree));
    }

    #[test]
    fn test_form_from_non_object() {
        assert!(matches!(
            form_from_value(json!([1])).unwrap_err(),
            ConsoleError::Validation(_)
        ));
    }
}
