use crate::error::{ConsoleError, Result};
use crate::models::{EnvironmentVariable, Secret};

/// 列表型配置字段中的条目，按 key 唯一
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

impl Keyed for EnvironmentVariable {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Secret {
    fn key(&self) -> &str {
        &self.name
    }
}

// 后端对列表字段做整体替换，以下函数都返回完整的新列表

/// 追加条目，key 重复报 DuplicateKey
pub fn create_entry<T: Keyed + Clone>(entries: &[T], entry: T) -> Result<Vec<T>> {
    if entries.iter().any(|e| e.key() == entry.key()) {
        return Err(ConsoleError::DuplicateKey(entry.key().to_string()));
    }
    let mut next = entries.to_vec();
    next.push(entry);
    Ok(next)
}

/// 原位替换 key 为 `original_key` 的条目，保持顺序。
/// 新 key 与另一条已有条目冲突时报 DuplicateKey。
pub fn edit_entry<T: Keyed + Clone>(entries: &[T], original_key: &str, entry: T) -> Result<Vec<T>> {
    let pos = entries
        .iter()
        .position(|e| e.key() == original_key)
        .ok_or_else(|| ConsoleError::EntryNotFound(original_key.to_string()))?;

    if entries
        .iter()
        .enumerate()
        .any(|(i, e)| i != pos && e.key() == entry.key())
    {
        return Err(ConsoleError::DuplicateKey(entry.key().to_string()));
    }

    let mut next = entries.to_vec();
    next[pos] = entry;
    Ok(next)
}

/// 移除 key 对应的条目
pub fn delete_entry<T: Keyed + Clone>(entries: &[T], key: &str) -> Result<Vec<T>> {
    if !entries.iter().any(|e| e.key() == key) {
        return Err(ConsoleError::EntryNotFound(key.to_string()));
    }
    Ok(entries.iter().filter(|e| e.key() != key).cloned().collect())
}

/// 第一个重复的 key
pub fn find_duplicate<T: Keyed>(entries: &[T]) -> Option<&str> {
    entries.iter().enumerate().find_map(|(i, e)| {
        entries[..i]
            .iter()
            .any(|prev| prev.key() == e.key())
            .then(|| e.key())
    })
}
