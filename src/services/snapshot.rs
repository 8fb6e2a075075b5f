//! 目录快照
//!
//! 文件名 → 修改时间，前后两次快照做差得出"新出现或被修改"的文件

use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

use tokio::fs;

use crate::error::DetectError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    entries: HashMap<String, SystemTime>,
}

impl DirectorySnapshot {
    /// 读取目录下所有普通文件的修改时间
    pub async fn capture(dir: &Path) -> Result<Self, DetectError> {
        let io_err = |e| DetectError::filesystem(dir.display().to_string(), e);

        let mut entries = HashMap::new();
        let mut read_dir = fs::read_dir(dir).await.map_err(io_err)?;
        while let Some(entry) = read_dir.next_entry().await.map_err(io_err)? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // 列目录和读元数据之间文件被删除（例如浏览器的临时文件）
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_err(e)),
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(io_err)?;
            entries.insert(entry.file_name().to_string_lossy().to_string(), modified);
        }

        Ok(Self { entries })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, SystemTime)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<SystemTime> {
        self.entries.get(name).copied()
    }

    /// `later` 中相对本快照新增、或修改时间严格更晚的文件，最新的在前
    pub fn changed_in(&self, later: &DirectorySnapshot) -> Vec<(String, SystemTime)> {
        let mut changed: Vec<_> = later
            .entries
            .iter()
            .filter(|(name, modified)| match self.entries.get(*name) {
                Some(before) => *modified > before,
                None => true,
            })
            .map(|(name, modified)| (name.clone(), *modified))
            .collect();
        changed.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        changed
    }
}
