//! 堆存储：框架自有的连续内存块。

use alloc::{boxed::Box, vec, vec::Vec};
use core::{
    fmt,
    ops::{Deref, DerefMut, Range},
    ptr::NonNull,
};

use spin::{RwLock, RwLockWriteGuard};

use super::{ByteStorage, out_of_storage};
use crate::error::{BufferError, Result};

/// `HeapStorage` 持有一块定长的元素数组，字节缓冲使用 `HeapStorage<u8>`，
/// 独立分配的类型化缓冲使用 `HeapStorage<T>`。
///
/// # 设计动机（Why）
/// - 多个缓冲视图需要共享同一块数组并各自读写，Rust 的别名规则要求可变访问互斥；
///   这里以 `spin::RwLock` 包裹数组，读访问可并发、写访问独占；
/// - 数组创建后长度不变（`Box<[T]>`），缓冲的 capacity 因而恒定。
///
/// # 契约说明（What）
/// - 所有访问都以 `try_read`/`try_write` 获取锁，失败即返回 `StorageBusy`；
/// - [`array`](Self::array) 返回的守卫在存活期间独占整块存储。
pub(crate) struct HeapStorage<T> {
    cells: RwLock<Box<[T]>>,
    len: usize,
}

impl<T: Copy + Default> HeapStorage<T> {
    /// 分配 `len` 个默认值（数值类型即零）元素。
    pub(crate) fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![T::default(); len])
    }
}

impl<T> HeapStorage<T> {
    /// 接管调用方的数组，不复制。
    pub(crate) fn from_vec(values: Vec<T>) -> Self {
        let cells = values.into_boxed_slice();
        let len = cells.len();
        Self {
            cells: RwLock::new(cells),
            len,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn with_slice<R>(&self, range: Range<usize>, f: impl FnOnce(&[T]) -> R) -> Result<R> {
        let cells = self.cells.try_read().ok_or(BufferError::StorageBusy)?;
        let slice = cells
            .get(range.clone())
            .ok_or_else(|| out_of_storage(&range, self.len))?;
        Ok(f(slice))
    }

    pub(crate) fn with_slice_mut<R>(
        &self,
        range: Range<usize>,
        f: impl FnOnce(&mut [T]) -> R,
    ) -> Result<R> {
        let mut cells = self.cells.try_write().ok_or(BufferError::StorageBusy)?;
        let slice = cells
            .get_mut(range.clone())
            .ok_or_else(|| out_of_storage(&range, self.len))?;
        Ok(f(slice))
    }

    /// 独占借出整块数组。
    pub(crate) fn array(&self) -> Result<ArrayGuard<'_, T>> {
        self.cells
            .try_write()
            .map(|guard| ArrayGuard { guard })
            .ok_or(BufferError::StorageBusy)
    }
}

impl<T: Copy> HeapStorage<T> {
    pub(crate) fn copy_within(&self, src: Range<usize>, dst: usize) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        let dst_end = dst + src.len();
        let end = src.end.max(dst_end);
        self.with_slice_mut(0..end, |cells| cells.copy_within(src, dst))
    }
}

impl ByteStorage for HeapStorage<u8> {
    fn len(&self) -> usize {
        self.len
    }

    fn is_direct(&self) -> bool {
        false
    }

    fn view(&self, range: Range<usize>, f: &mut dyn FnMut(&[u8])) -> Result<()> {
        self.with_slice(range, f)
    }

    fn view_mut(&self, range: Range<usize>, f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        self.with_slice_mut(range, f)
    }

    fn array(&self) -> Result<ArrayGuard<'_, u8>> {
        HeapStorage::array(self)
    }

    fn address(&self) -> Option<NonNull<u8>> {
        None
    }
}

/// 对整块后备数组的独占借用。
///
/// # 契约说明（What）
/// - 解引用得到完整的存储数组（而非缓冲窗口），缓冲的数组偏移由 `array_offset()` 给出；
/// - 通过守卫的修改对共享该存储的所有缓冲立即可见，反之亦然；
/// - 守卫存活期间，任何缓冲对该存储的访问都会返回 `StorageBusy`，用完应尽快释放。
pub struct ArrayGuard<'a, T> {
    guard: RwLockWriteGuard<'a, Box<[T]>>,
}

impl<T> Deref for ArrayGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.guard
    }
}

impl<T> DerefMut for ArrayGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.guard
    }
}

impl<T: fmt::Debug> fmt::Debug for ArrayGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.guard.iter()).finish()
    }
}
