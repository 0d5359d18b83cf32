//! 快照单元
//!
//! 后台线程（唯一生产者）发布最新状态，调度线程（消费者）无锁读取。
//! 读取方永远得到一次完整发布的值，不会看到写到一半的状态。

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 单生产者快照
///
/// 基于 `ArcSwap`：发布是一次原子指针替换，读取是 wait-free 的 `load_full`。
/// `version` 在每次发布后递增，可用于判断是否有新数据。
pub struct SnapshotCell<T> {
    inner: Arc<ArcSwap<T>>,
    version: Arc<AtomicU64>,
}

impl<T> SnapshotCell<T> {
    /// 创建快照单元，`initial` 作为发布前的默认状态
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 发布新状态
    pub fn publish(&self, value: T) {
        self.inner.store(Arc::new(value));
        self.version.fetch_add(1, Ordering::Release);
    }

    /// 读取最新状态
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// 已发布次数（初始值不计入）
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

// 手动实现：不要求 T: Clone
impl<T> Clone for SnapshotCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            version: Arc::clone(&self.version),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SnapshotCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCell")
            .field("value", &self.inner.load())
            .field("version", &self.version())
            .finish()
    }
}
