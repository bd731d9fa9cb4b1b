//! 后备存储策略。
//!
//! # 模块定位（Why）
//! - 缓冲对象只持有“存储句柄 + 偏移 + 游标”，真正的字节由两种可互换的存储提供：
//!   - [`heap`]：由框架自己分配并管理的连续内存，可暴露后备数组；
//!   - [`external`]：调用方提供或为原生图形/音频 API 预留的固定地址内存，不暴露数组。
//! - 切片、复制、只读化与类型化视图都只是克隆 `Arc` 句柄并叠加偏移，从不复制字节。
//!
//! # 设计概要（How）
//! - [`ByteStorage`] 以闭包方式借出区间切片：`view` 借出只读切片、`view_mut` 借出可写切片；
//!   借用期间由存储内部的读写锁保证不存在可变别名；
//! - 数据访问（`view`、`view_mut`、`copy_within`、`array`）只以 `try_*` 方式取锁：
//!   缓冲本身不做同步，并发的冲突访问会得到 `StorageBusy` 而不是阻塞或数据竞争；
//! - 锁覆盖整个存储而非单个区间，因此两个线程写入同一存储上互不相交的切片同样会冲突，
//!   其中一方得到 `StorageBusy`，需要由调用方重试或按阶段移交；
//! - 外部存储的 `release`、`is_released` 与 `address` 以阻塞方式取锁：释放必须等待
//!   正在执行的借用闭包结束，地址查询只持锁读取一个指针。

use alloc::sync::Arc;
use core::{ops::Range, ptr::NonNull};

use crate::error::{BufferError, Result};

pub mod external;
pub mod heap;

pub use external::{ExternalStatsSnapshot, ForeignBuffer};
pub use heap::ArrayGuard;

/// 字节存储的访问契约。
///
/// # 契约说明（What）
/// - `range` 为存储内的绝对字节区间；越过 [`len`](Self::len) 时返回 `IndexOutOfRange`；
/// - `view` 与 `view_mut` 只在闭包执行期间持有内部锁；闭包内不得再次访问同一存储；
/// - 外部存储被释放后，所有访问返回 `StorageReleased`。
pub(crate) trait ByteStorage: Send + Sync + 'static {
    /// 存储总字节数，创建后不变。
    fn len(&self) -> usize;

    /// 是否为外部（非托管）存储。
    fn is_direct(&self) -> bool;

    /// 借出只读区间。
    fn view(&self, range: Range<usize>, f: &mut dyn FnMut(&[u8])) -> Result<()>;

    /// 借出可写区间。
    fn view_mut(&self, range: Range<usize>, f: &mut dyn FnMut(&mut [u8])) -> Result<()>;

    /// 独占借出整块后备数组。
    fn array(&self) -> Result<ArrayGuard<'_, u8>>;

    /// 外部存储的稳定起始地址；堆存储返回 `None`。
    fn address(&self) -> Option<NonNull<u8>>;

    fn read(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        let end = offset + dst.len();
        self.view(offset..end, &mut |src| dst.copy_from_slice(src))
    }

    fn write(&self, offset: usize, src: &[u8]) -> Result<()> {
        let end = offset + src.len();
        self.view_mut(offset..end, &mut |dst| dst.copy_from_slice(src))
    }

    /// 在同一存储内搬运字节，区间允许重叠（`memmove` 语义）。
    fn copy_within(&self, src: Range<usize>, dst: usize) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        let dst_end = dst + src.len();
        let lo = src.start.min(dst);
        let hi = src.end.max(dst_end);
        self.view_mut(lo..hi, &mut |bytes| {
            bytes.copy_within(src.start - lo..src.end - lo, dst - lo)
        })
    }
}

/// 判断两个句柄是否指向同一块存储。
pub(crate) fn same_storage(a: &Arc<dyn ByteStorage>, b: &Arc<dyn ByteStorage>) -> bool {
    core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// 区间越界时统一构造的错误。
pub(crate) fn out_of_storage(range: &Range<usize>, len: usize) -> BufferError {
    BufferError::IndexOutOfRange {
        index: range.start,
        width: range.end.saturating_sub(range.start),
        limit: len,
    }
}
