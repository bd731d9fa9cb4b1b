//! 外部（非托管）存储与其所有者句柄 [`ForeignBuffer`]。
//!
//! # 模块定位（Why）
//! - 纹理上传、顶点提交、音频回调等原生 API 要求一段地址稳定的连续内存；
//!   这类内存要么由框架按需分配，要么由调用方（原生库）直接提供；
//! - 与堆存储不同，外部存储的生命周期由唯一的所有者显式管理：切片、复制与类型化视图
//!   只引用存储，永远不会释放它。
//!
//! # 设计概要（How）
//! - [`ExternalStorage`] 记录起始地址与长度，地址放在 `spin::RwLock` 中，
//!   释放时置空，之后的所有访问返回 `StorageReleased`；
//! - [`ForeignBuffer`] 是唯一所有者：显式 [`release`](ForeignBuffer::release) 或被丢弃时释放存储，
//!   并通过 [`ExternalStats`] 回报分配账目（沿用“租约在 Drop 时回报容量”的做法）。

use alloc::{boxed::Box, sync::Arc, vec};
use core::{
    fmt,
    ops::Range,
    ptr::{self, NonNull},
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

use spin::RwLock;

use super::{ArrayGuard, ByteStorage, out_of_storage};
use crate::{
    byte_buffer::ByteBuffer,
    error::{BufferError, Result},
    order::ByteOrder,
};

/// 外部内存的来源。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    /// 由框架分配，释放时归还给分配器。
    Owned,
    /// 由调用方提供，框架从不释放。
    Borrowed,
}

struct Region {
    base: Option<NonNull<u8>>,
    origin: Origin,
}

// SAFETY: `base` 只在持有 `ExternalStorage::region` 锁时解引用，读锁下只生成共享切片，
// 写锁下只生成唯一的可变切片；地址本身可以在线程间自由传递。
unsafe impl Send for Region {}
// SAFETY: 同上，共享访问全部经过锁。
unsafe impl Sync for Region {}

pub(crate) struct ExternalStorage {
    len: usize,
    region: RwLock<Region>,
}

impl ExternalStorage {
    fn owned(len: usize) -> Self {
        let block: Box<[u8]> = vec![0u8; len].into_boxed_slice();
        let raw = Box::into_raw(block);
        Self {
            len,
            region: RwLock::new(Region {
                base: NonNull::new(raw.cast::<u8>()),
                origin: Origin::Owned,
            }),
        }
    }

    fn borrowed(base: NonNull<u8>, len: usize) -> Self {
        Self {
            len,
            region: RwLock::new(Region {
                base: Some(base),
                origin: Origin::Borrowed,
            }),
        }
    }

    /// 释放存储；返回 `true` 表示本次调用完成了释放。
    ///
    /// 以阻塞方式取写锁，等待其他线程上正在执行的借用闭包结束。
    fn release(&self) -> bool {
        let mut region = self.region.write();
        let Some(base) = region.base.take() else {
            return false;
        };
        if region.origin == Origin::Owned {
            // SAFETY: `base` 来自 `owned` 中的 `Box::into_raw`，长度为 `self.len`，
            // 且 `take()` 保证只会重建一次。
            unsafe {
                drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                    base.as_ptr(),
                    self.len,
                )));
            }
        }
        true
    }

    fn is_released(&self) -> bool {
        self.region.read().base.is_none()
    }

    fn checked(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.len {
            return Err(out_of_storage(range, self.len));
        }
        Ok(())
    }
}

impl ByteStorage for ExternalStorage {
    fn len(&self) -> usize {
        self.len
    }

    fn is_direct(&self) -> bool {
        true
    }

    fn view(&self, range: Range<usize>, f: &mut dyn FnMut(&[u8])) -> Result<()> {
        self.checked(&range)?;
        let region = self.region.try_read().ok_or(BufferError::StorageBusy)?;
        let base = region.base.ok_or(BufferError::StorageReleased)?;
        // SAFETY: 区间已校验位于 `[0, len)` 内，读锁保证释放与可变借用都不会并发发生。
        let bytes =
            unsafe { core::slice::from_raw_parts(base.as_ptr().add(range.start), range.len()) };
        f(bytes);
        Ok(())
    }

    fn view_mut(&self, range: Range<usize>, f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        self.checked(&range)?;
        let region = self.region.try_write().ok_or(BufferError::StorageBusy)?;
        let base = region.base.ok_or(BufferError::StorageReleased)?;
        // SAFETY: 区间已校验；写锁保证这是该存储唯一存活的切片。
        let bytes = unsafe {
            core::slice::from_raw_parts_mut(base.as_ptr().add(range.start), range.len())
        };
        f(bytes);
        Ok(())
    }

    fn array(&self) -> Result<ArrayGuard<'_, u8>> {
        Err(BufferError::NoBackingArray)
    }

    fn address(&self) -> Option<NonNull<u8>> {
        self.region.read().base
    }
}

impl Drop for ExternalStorage {
    fn drop(&mut self) {
        // 所有者句柄总会先行释放；这里只兜住句柄被 `mem::forget` 的情况，避免泄漏框架自有内存。
        self.release();
    }
}

/// 外部存储的分配账目。
///
/// # 契约说明（What）
/// - 只由 [`ForeignBuffer`] 在分配与释放时更新，视图从不触碰；
/// - 各计数器相互独立地原子更新，快照在并发分配时可能瞬时不一致，但最终收敛。
#[derive(Debug, Default)]
pub(crate) struct ExternalStats {
    live_handles: AtomicUsize,
    allocated_bytes: AtomicUsize,
    total_allocations: AtomicU64,
    total_releases: AtomicU64,
}

impl ExternalStats {
    fn record_allocation(&self, len: usize) {
        self.live_handles.fetch_add(1, Ordering::Relaxed);
        self.allocated_bytes.fetch_add(len, Ordering::Relaxed);
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_release(&self, len: usize) {
        self.live_handles.fetch_sub(1, Ordering::Relaxed);
        self.allocated_bytes.fetch_sub(len, Ordering::Relaxed);
        self.total_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExternalStatsSnapshot {
        ExternalStatsSnapshot {
            live_handles: self.live_handles.load(Ordering::Relaxed),
            allocated_bytes: self.allocated_bytes.load(Ordering::Relaxed),
            total_allocations: self.total_allocations.load(Ordering::Relaxed),
            total_releases: self.total_releases.load(Ordering::Relaxed),
        }
    }
}

/// 外部分配账目的一次快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalStatsSnapshot {
    /// 尚未释放的所有者句柄数。
    pub live_handles: usize,
    /// 尚未释放的字节总数。
    pub allocated_bytes: usize,
    /// 累计分配次数。
    pub total_allocations: u64,
    /// 累计释放次数。
    pub total_releases: u64,
}

/// `ForeignBuffer` 是外部存储的唯一所有者句柄。
///
/// # 设计动机（Why）
/// - 原生 API 需要一个在整个使用期内都不会移动的地址，且释放时机必须由调用方掌控；
/// - 把“所有权”显式落在一个不可克隆的句柄上，切片、复制、视图都只能借用存储，
///   从类型层面杜绝视图误释放。
///
/// # 契约说明（What）
/// - [`as_ptr`](Self::as_ptr) 在句柄存活期间恒定不变，可直接交给原生 API；
/// - [`byte_buffer`](Self::byte_buffer) 产生的缓冲在句柄释放后仍可持有，但任何读写都会返回
///   `StorageReleased`；
/// - 句柄被丢弃等价于调用 [`release`](Self::release)；框架分配的内存归还分配器，
///   调用方提供的内存仅被解除关联。
///
/// # 风险提示（Trade-offs）
/// - 对调用方内存而言，框架无法知道其真实生命周期，正确性完全依赖
///   [`from_raw_parts`](Self::from_raw_parts) 的安全前提。
pub struct ForeignBuffer {
    storage: Arc<ExternalStorage>,
    order: ByteOrder,
    accounting: Option<Arc<ExternalStats>>,
}

impl ForeignBuffer {
    /// 分配 `len` 字节、全部置零、地址稳定的外部存储。
    pub fn allocate(len: usize) -> Self {
        Self::allocate_with(len, crate::config::default_order(), None)
    }

    pub(crate) fn allocate_with(
        len: usize,
        order: ByteOrder,
        accounting: Option<Arc<ExternalStats>>,
    ) -> Self {
        let storage = Arc::new(ExternalStorage::owned(len));
        if let Some(stats) = &accounting {
            stats.record_allocation(len);
        }
        tracing::debug!(len, %order, "allocated external buffer storage");
        Self {
            storage,
            order,
            accounting,
        }
    }

    /// 以调用方提供的内存创建句柄，框架永远不会释放这段内存。
    ///
    /// # Safety
    /// - `base` 必须指向至少 `len` 字节、可读可写的有效内存；
    /// - 在句柄释放（或被丢弃）之前，这段内存必须保持有效，且不得被框架之外的代码
    ///   读写，也不得再次包装成另一个 `ForeignBuffer`。
    pub unsafe fn from_raw_parts(base: NonNull<u8>, len: usize) -> Self {
        tracing::debug!(len, "wrapped caller-provided external memory");
        Self {
            storage: Arc::new(ExternalStorage::borrowed(base, len)),
            order: ByteOrder::default(),
            accounting: None,
        }
    }

    /// 存储的稳定起始地址。
    pub fn as_ptr(&self) -> *mut u8 {
        self.storage
            .address()
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    pub fn len(&self) -> usize {
        self.storage.len
    }

    pub fn is_empty(&self) -> bool {
        self.storage.len == 0
    }

    /// 新视图的初始字节序。
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// 覆盖后续 [`byte_buffer`](Self::byte_buffer) 产生的视图的初始字节序。
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// 以整个存储为窗口创建一个新的字节缓冲视图。
    pub fn byte_buffer(&self) -> ByteBuffer {
        let storage: Arc<dyn ByteStorage> = self.storage.clone();
        ByteBuffer::from_storage(storage, self.order)
    }

    /// 释放存储。之后由本句柄产生的所有视图访问都会返回 `StorageReleased`。
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ForeignBuffer {
    fn drop(&mut self) {
        if self.storage.release() {
            if let Some(stats) = &self.accounting {
                stats.record_release(self.storage.len);
            }
            tracing::debug!(len = self.storage.len, "released external buffer storage");
        }
    }
}

impl fmt::Debug for ForeignBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignBuffer")
            .field("len", &self.storage.len)
            .field("address", &self.as_ptr())
            .field("released", &self.storage.is_released())
            .finish()
    }
}
