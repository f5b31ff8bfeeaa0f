use std::path::{Path, PathBuf};

use crate::error::{ConsoleError, Result};
use crate::models::ConsoleState;

/// 存储引擎：内存状态 + JSON 文件持久化
pub struct Storage {
    state: ConsoleState,
    file_path: PathBuf,
}

impl Storage {
    /// 从 JSON 文件加载状态。文件不存在或为空时初始化空状态；
    /// 文件读不出或解析失败直接报错，避免下一次写入覆盖掉已有数据。
    pub fn load(file_path: &Path) -> Result<Self> {
        let state = if file_path.exists() {
            let content = std::fs::read_to_string(file_path).map_err(|e| {
                ConsoleError::StorageError(format!("cannot read {:?}: {}", file_path, e))
            })?;
            if content.trim().is_empty() {
                ConsoleState::default()
            } else {
                serde_json::from_str::<ConsoleState>(&content).map_err(|e| {
                    tracing::error!("数据文件损坏: {:?}: {}", file_path, e);
                    ConsoleError::StorageError(format!("corrupt data file {:?}: {}", file_path, e))
                })?
            }
        } else {
            ConsoleState::default()
        };

        Ok(Self {
            state,
            file_path: file_path.to_path_buf(),
        })
    }

    /// 将内存状态序列化为 JSON 写入文件
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| ConsoleError::StorageError(e.to_string()))?;

        // 确保父目录存在
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&self.file_path, json)?;
        Ok(())
    }

    /// 写时持久化：在状态上执行修改并保存，修改或保存失败都回滚到修改前
    pub fn commit<T>(&mut self, f: impl FnOnce(&mut ConsoleState) -> Result<T>) -> Result<T> {
        let snapshot = self.state.clone();
        let out = match f(&mut self.state) {
            Ok(out) => out,
            Err(e) => {
                self.state = snapshot;
                return Err(e);
            }
        };
        if let Err(e) = self.save() {
            self.state = snapshot;
            return Err(e);
        }
        Ok(out)
    }

    /// 获取状态的不可变引用
    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}
