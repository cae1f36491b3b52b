//! JSON 文件记录存储
//!
//! 单写者：所有读-改-写序列必须在一次 `acquire()` 得到的 StoreGuard 内完成，
//! guard 在任何退出路径（正常返回、错误、future 被取消）上随 Drop 释放。
//! 写入先落到同目录临时文件再 rename，读者不会看到半写的文档。

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

use crate::store::RecordCollection;

/// 存储层错误：文件损坏与 I/O 失败分开，损坏永远不会被当作空集合
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("store file {path} has no ids left to assign")]
    IdSpaceExhausted { path: PathBuf },

    #[error("store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 用户记录存储：持有文件路径与互斥锁
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

/// 独占访问窗口：只有持有 guard 才能写入
pub struct StoreGuard<'a> {
    store: &'a RecordStore,
    _lock: MutexGuard<'a, ()>,
}

impl RecordStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 获取独占访问；等待期间挂起当前任务
    pub async fn acquire(&self) -> StoreGuard<'_> {
        let lock = self.lock.lock().await;
        StoreGuard { store: self, _lock: lock }
    }

    /// 在 guard 内读取一次一致快照（List、GET /api/users 使用）
    pub async fn read(&self) -> Result<RecordCollection, StoreError> {
        let guard = self.acquire().await;
        guard.read().await
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "users.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> Result<RecordCollection, StoreError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "store file absent, bootstrapping empty collection");
                let empty = RecordCollection::default();
                self.persist(&empty).await?;
                return Ok(empty);
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let collection: RecordCollection =
            serde_json::from_str(&data).map_err(|e| self.corrupt(e.to_string()))?;
        self.check_integrity(&collection)?;
        Ok(collection)
    }

    /// 文件被外部改坏（重复 id / 重复 email）同样按损坏处理
    fn check_integrity(&self, collection: &RecordCollection) -> Result<(), StoreError> {
        let mut ids = HashSet::new();
        let mut emails = HashSet::new();
        for u in &collection.users {
            if !ids.insert(u.id) {
                return Err(self.corrupt(format!("duplicate id {}", u.id)));
            }
            if !emails.insert(u.email.trim().to_lowercase()) {
                return Err(self.corrupt(format!("duplicate email {}", u.email)));
            }
        }
        Ok(())
    }

    async fn persist(&self, collection: &RecordCollection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }
        let body = serde_json::to_string_pretty(collection)
            .map_err(|e| self.corrupt(format!("serialize: {e}")))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, body).await.map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

impl StoreGuard<'_> {
    /// 读取当前集合；文件不存在时初始化为空集合并落盘（幂等）
    pub async fn read(&self) -> Result<RecordCollection, StoreError> {
        self.store.load().await
    }

    /// 原子替换整个集合
    pub async fn write(&self, collection: &RecordCollection) -> Result<(), StoreError> {
        self.store.persist(collection).await
    }

    /// 与随后的 write 处于同一 guard 内计算下一个 id
    pub fn next_id(&self, collection: &RecordCollection) -> Result<u64, StoreError> {
        collection.next_id().ok_or_else(|| StoreError::IdSpaceExhausted {
            path: self.store.path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserRecord;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/users.json");
        let store = RecordStore::new(&path);

        assert!(store.read().await.unwrap().is_empty());
        assert!(store.read().await.unwrap().is_empty());
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&on_disk).unwrap(),
            serde_json::json!({"users": []})
        );
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("users.json"));
        let mut c = RecordCollection::default();
        c.push(UserRecord {
            id: 1,
            name: "Nguyễn Văn A".into(),
            email: "a@x.vn".into(),
        });
        c.push(UserRecord {
            id: 4,
            name: "Bob".into(),
            email: "bob@x.com".into(),
        });
        c.users.retain(|u| u.id != 4);

        {
            let guard = store.acquire().await;
            guard.write(&c).await.unwrap();
        }
        let back = store.read().await.unwrap();
        assert_eq!(back, c);
        assert_eq!(back.next_id(), Some(5));
        assert!(!dir.path().join("users.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        for body in ["{not json", "", "[]", r#"{"users": "nope"}"#] {
            std::fs::write(&path, body).unwrap();
            let store = RecordStore::new(&path);
            let err = store.read().await.unwrap_err();
            assert!(matches!(err, StoreError::Corrupt { .. }), "body {body:?}");
            assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_on_disk_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"{"users":[{"id":1,"name":"a","email":"A@x.com"},{"id":2,"name":"b","email":"a@X.com"}]}"#,
        )
        .unwrap();
        let err = RecordStore::new(&path).read().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_guard_released_when_future_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(RecordStore::new(dir.path().join("users.json")));

        let held = store.acquire().await;
        let s = store.clone();
        let waiter = tokio::spawn(async move {
            let _g = s.acquire().await;
        });
        tokio::task::yield_now().await;
        waiter.abort();
        let _ = waiter.await;
        drop(held);

        let got = tokio::time::timeout(std::time::Duration::from_secs(1), store.acquire()).await;
        assert!(got.is_ok());
    }
}
