//! 运行记录存储 - 业务能力层
//!
//! 每个用户一个目录，每条运行记录一个 JSON 文档：
//! `<data_dir>/runs/<user>/<run_id>.json`
//!
//! 同一 id 重复写入会覆盖原文档；订阅者每次收到的是完整快照。
//! 同一用户的"写入 + 发布快照"在用户锁内串行执行，快照不会回退

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::fs;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, StoreError};
use crate::models::{validate_document_id, Run};

type Snapshot = Vec<Run>;

/// 临时文件序号，保证并发写入各用各的临时文件
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// 运行记录存储
pub struct RunStore {
    root: PathBuf,
    snapshot_limit: usize,
    channels: Mutex<HashMap<String, Arc<watch::Sender<Snapshot>>>>,
    user_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl RunStore {
    /// 打开存储目录（不存在时创建）
    ///
    /// `snapshot_limit` 决定订阅快照中保留的最近记录数
    pub async fn open(data_dir: impl AsRef<Path>, snapshot_limit: usize) -> AppResult<Self> {
        let root = data_dir.as_ref().join("runs");
        fs::create_dir_all(&root)
            .await
            .map_err(|e| write_failed(&root, e))?;

        info!("📁 运行记录目录: {}", root.display());

        Ok(Self {
            root,
            snapshot_limit,
            channels: Mutex::new(HashMap::new()),
            user_locks: Mutex::new(HashMap::new()),
        })
    }

    fn user_dir(&self, user: &str) -> PathBuf {
        self.root.join(user)
    }

    /// 写入（或覆盖）一条运行记录，并通知该用户的订阅者
    pub async fn upsert(&self, user: &str, run: &Run) -> AppResult<()> {
        validate_document_id(user, "user")?;
        validate_document_id(&run.id, "id")?;

        let dir = self.user_dir(user);
        let path = dir.join(format!("{}.json", run.id));
        let content = serde_json::to_string_pretty(run).map_err(|e| write_failed(&path, e))?;

        let lock = self.user_lock(user);
        let _guard = lock.lock().await;

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| write_failed(&dir, e))?;

        // 先写临时文件再改名，读者不会看到写了一半的文档
        let tmp_path = dir.join(format!(
            ".{}.{}.{}.tmp",
            run.id,
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = fs::write(&tmp_path, content).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_failed(&tmp_path, e));
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_failed(&path, e));
        }

        debug!("写入运行记录: 用户 {} | 运行 {} | 状态 {:?}", user, run.id, run.status);

        self.publish(user).await
    }

    /// 读取单条运行记录
    pub async fn get(&self, user: &str, run_id: &str) -> AppResult<Option<Run>> {
        validate_document_id(user, "user")?;
        validate_document_id(run_id, "id")?;

        let path = self.user_dir(user).join(format!("{}.json", run_id));
        match fs::read_to_string(&path).await {
            Ok(content) => parse_run(&path, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(read_failed(&path, e)),
        }
    }

    /// 按时间倒序列出最近的运行记录
    ///
    /// 损坏的文档会被跳过并记录警告
    pub async fn list_recent(&self, user: &str, limit: usize) -> AppResult<Vec<Run>> {
        validate_document_id(user, "user")?;

        let dir = self.user_dir(user);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_failed(&dir, e)),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| read_failed(&dir, e))? {
            let path = entry.path();
            let is_document = path.extension().and_then(|s| s.to_str()) == Some("json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_document {
                continue;
            }

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| read_failed(&path, e))?;
            match parse_run(&path, &content) {
                Ok(run) => runs.push(run),
                Err(e) => warn!("⚠️ 跳过损坏的运行记录: {}", e),
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        runs.truncate(limit);
        Ok(runs)
    }

    /// 订阅某个用户的运行记录
    ///
    /// 返回的接收端立即持有当前快照，此后每次写入都会整体替换快照
    pub async fn subscribe(&self, user: &str) -> AppResult<watch::Receiver<Snapshot>> {
        validate_document_id(user, "user")?;

        if let Some(sender) = self.sender(user) {
            return Ok(sender.subscribe());
        }

        // 持有用户锁读取快照并注册通道，期间不会有写入插进来
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        if let Some(sender) = self.sender(user) {
            return Ok(sender.subscribe());
        }

        let snapshot = self.list_recent(user, self.snapshot_limit).await?;
        let (tx, rx) = watch::channel(snapshot);
        self.lock_channels().insert(user.to_string(), Arc::new(tx));

        debug!("新增订阅: 用户 {}", user);
        Ok(rx)
    }

    /// 重新读取快照并发送；调用方必须持有该用户的锁
    async fn publish(&self, user: &str) -> AppResult<()> {
        let Some(sender) = self.sender(user) else {
            return Ok(());
        };

        let snapshot = self.list_recent(user, self.snapshot_limit).await?;
        sender.send_replace(snapshot);
        Ok(())
    }

    fn sender(&self, user: &str) -> Option<Arc<watch::Sender<Snapshot>>> {
        self.lock_channels().get(user).cloned()
    }

    fn user_lock(&self, user: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(user.to_string()).or_default().clone()
    }

    fn lock_channels(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<watch::Sender<Snapshot>>>> {
        // 锁内只有 HashMap 操作，中毒后数据仍然可用
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn parse_run(path: &Path, content: &str) -> AppResult<Run> {
    serde_json::from_str(content).map_err(|e| {
        AppError::Store(StoreError::CorruptDocument {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })
}

fn write_failed(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::Store(StoreError::WriteFailed {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}

fn read_failed(path: &Path, source: std::io::Error) -> AppError {
    AppError::Store(StoreError::ReadFailed {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}
