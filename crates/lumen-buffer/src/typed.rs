//! 类型化缓冲：独立堆分配的元素数组，或字节缓冲之上的别名视图。

use alloc::{string::String, sync::Arc, vec, vec::Vec};
use core::{cmp::Ordering, fmt, hash};

use crate::{
    bounds,
    compare,
    cursor::{Buffer, Cursor, sealed::Sealed},
    element::Element,
    error::{BufferError, Result},
    order::ByteOrder,
    storage::{ArrayGuard, ByteStorage, heap::HeapStorage, same_storage},
};

pub type ShortBuffer = TypedBuffer<i16>;
pub type CharBuffer = TypedBuffer<u16>;
pub type IntBuffer = TypedBuffer<i32>;
pub type LongBuffer = TypedBuffer<i64>;
pub type FloatBuffer = TypedBuffer<f32>;
pub type DoubleBuffer = TypedBuffer<f64>;

/// 元素的实际落点。
enum Backing<T> {
    /// 独立分配的元素数组；`offset` 为本缓冲索引 0 所在的元素下标。
    Heap {
        cells: Arc<HeapStorage<T>>,
        offset: usize,
    },
    /// 字节存储上的别名；`offset` 为索引 0 所在的字节偏移，`order` 在创建时锁定。
    View {
        bytes: Arc<dyn ByteStorage>,
        offset: usize,
        order: ByteOrder,
    },
}

impl<T> Backing<T> {
    fn share(&self) -> Self {
        match self {
            Self::Heap { cells, offset } => Self::Heap {
                cells: Arc::clone(cells),
                offset: *offset,
            },
            Self::View {
                bytes,
                offset,
                order,
            } => Self::View {
                bytes: Arc::clone(bytes),
                offset: *offset,
                order: *order,
            },
        }
    }
}

impl<T: Element> Backing<T> {
    /// 把本缓冲的元素索引平移 `by` 个元素。
    fn shifted(&self, by: usize) -> Self {
        match self {
            Self::Heap { cells, offset } => Self::Heap {
                cells: Arc::clone(cells),
                offset: offset + by,
            },
            Self::View {
                bytes,
                offset,
                order,
            } => Self::View {
                bytes: Arc::clone(bytes),
                offset: offset + by * T::SIZE,
                order: *order,
            },
        }
    }

    fn load(&self, index: usize, dst: &mut [T]) -> Result<()> {
        match self {
            Self::Heap { cells, offset } => {
                let start = offset + index;
                cells.with_slice(start..start + dst.len(), |src| dst.copy_from_slice(src))
            }
            Self::View {
                bytes,
                offset,
                order,
            } => {
                let start = offset + index * T::SIZE;
                let order = *order;
                bytes.view(start..start + dst.len() * T::SIZE, &mut |raw| {
                    for (chunk, out) in raw.chunks_exact(T::SIZE).zip(dst.iter_mut()) {
                        *out = T::decode(chunk, order);
                    }
                })
            }
        }
    }

    fn store(&self, index: usize, src: &[T]) -> Result<()> {
        match self {
            Self::Heap { cells, offset } => {
                let start = offset + index;
                cells.with_slice_mut(start..start + src.len(), |dst| dst.copy_from_slice(src))
            }
            Self::View {
                bytes,
                offset,
                order,
            } => {
                let start = offset + index * T::SIZE;
                let order = *order;
                bytes.view_mut(start..start + src.len() * T::SIZE, &mut |raw| {
                    for (chunk, value) in raw.chunks_exact_mut(T::SIZE).zip(src) {
                        value.encode(order, chunk);
                    }
                })
            }
        }
    }

    /// 从共享同一存储的 `src` 搬运 `count` 个元素到本后备，区间允许重叠。
    /// 调用方须先以 [`shares_layout_with`](Self::shares_layout_with) 确认两者布局一致。
    fn copy_from_shared(&self, src: &Self, from: usize, to: usize, count: usize) -> Result<()> {
        match (self, src) {
            (Self::Heap { cells, offset }, Self::Heap { offset: src_offset, .. }) => {
                let start = src_offset + from;
                cells.copy_within(start..start + count, offset + to)
            }
            (Self::View { bytes, offset, .. }, Self::View { offset: src_offset, .. }) => {
                let start = src_offset + from * T::SIZE;
                bytes.copy_within(start..start + count * T::SIZE, offset + to * T::SIZE)
            }
            _ => Err(BufferError::StorageBusy),
        }
    }

    /// 两个后备是否为同一存储且元素布局一致，可以直接按字节搬运。
    fn shares_layout_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Heap { cells: a, .. }, Self::Heap { cells: b, .. }) => Arc::ptr_eq(a, b),
            (
                Self::View {
                    bytes: a, order: x, ..
                },
                Self::View {
                    bytes: b, order: y, ..
                },
            ) => same_storage(a, b) && x == y,
            _ => false,
        }
    }
}

/// `TypedBuffer<T>` 是以元素为单位导航的缓冲，六种传统缓冲都是它的别名。
///
/// # 设计动机（Why）
/// - 网格构建器写入 `f32` 顶点、索引缓冲写入 `i16`/`i32`，它们最终都要落进同一块字节存储，
///   因此类型化缓冲既能独立分配，也能作为字节缓冲的别名视图存在；
/// - 两种形态共用一套导航与边界规则，区别只在 [`Backing`] 如何取放元素。
///
/// # 契约说明（What）
/// - capacity/position/limit/mark 全部以元素计；
/// - 视图形态下，索引 `i` 对应父存储中的字节偏移 `offset + i * T::SIZE`，读写使用创建时锁定的字节序；
///   之后修改父缓冲的字节序不影响已存在的视图；
/// - 独立分配形态报告 [`ByteOrder::native()`]，且不可修改；
/// - 相等、哈希、排序都只看剩余窗口，浮点元素中所有 NaN 相等、`0.0 == -0.0`。
///
/// # Panics
/// `PartialEq`、`Ord` 与 `Hash` 在读取窗口失败时 panic：
/// - 后备存储上的 [`ArrayGuard`] 仍然存活；
/// - 视图所在的外部存储已被释放。
///
/// 需要错误值时改用 [`try_eq`](Self::try_eq) 与 [`try_compare`](Self::try_compare)。
pub struct TypedBuffer<T: Element> {
    backing: Backing<T>,
    cursor: Cursor,
    read_only: bool,
}

impl<T: Element> TypedBuffer<T> {
    /// 独立分配 `capacity` 个零值元素。
    pub fn allocate(capacity: usize) -> Self {
        tracing::trace!(view = T::BUFFER_NAME, capacity, "allocated heap typed buffer");
        Self::from_cells(HeapStorage::zeroed(capacity))
    }

    /// 接管 `values` 作为后备数组。
    pub fn wrap(values: Vec<T>) -> Self {
        Self::from_cells(HeapStorage::from_vec(values))
    }

    /// 接管 `values`，窗口为 `[offset, offset + length)`。
    pub fn wrap_range(values: Vec<T>, offset: usize, length: usize) -> Result<Self> {
        bounds::check_sub_range(values.len(), offset, length)?;
        let mut buffer = Self::wrap(values);
        buffer.cursor = Cursor::with_window(buffer.capacity(), offset, offset + length)?;
        Ok(buffer)
    }

    fn from_cells(cells: HeapStorage<T>) -> Self {
        let capacity = cells.len();
        Self {
            backing: Backing::Heap {
                cells: Arc::new(cells),
                offset: 0,
            },
            cursor: Cursor::new(capacity),
            read_only: false,
        }
    }

    pub(crate) fn over_bytes(
        bytes: Arc<dyn ByteStorage>,
        offset: usize,
        capacity: usize,
        order: ByteOrder,
        read_only: bool,
    ) -> Self {
        Self {
            backing: Backing::View {
                bytes,
                offset,
                order,
            },
            cursor: Cursor::new(capacity),
            read_only,
        }
    }

    /// 元素的字节序：视图为创建时锁定的字节序，独立分配为平台字节序。
    pub fn order(&self) -> ByteOrder {
        match &self.backing {
            Backing::Heap { .. } => ByteOrder::native(),
            Backing::View { order, .. } => *order,
        }
    }

    /// 独占借出整个元素数组；只读缓冲返回 `ReadOnly`，视图返回 `NoBackingArray`。
    pub fn backing_array(&self) -> Result<ArrayGuard<'_, T>> {
        bounds::check_mutable(self.read_only)?;
        match &self.backing {
            Backing::Heap { cells, .. } => cells.array(),
            Backing::View { .. } => Err(BufferError::NoBackingArray),
        }
    }

    /// 本缓冲索引 0 在后备数组中的元素下标。
    pub fn array_offset(&self) -> Result<usize> {
        bounds::check_mutable(self.read_only)?;
        match &self.backing {
            Backing::Heap { offset, .. } => Ok(*offset),
            Backing::View { .. } => Err(BufferError::NoBackingArray),
        }
    }

    fn load_one(&self, index: usize) -> Result<T> {
        let mut value = [T::default()];
        self.backing.load(index, &mut value)?;
        Ok(value[0])
    }

    pub fn get(&mut self) -> Result<T> {
        let index = self.cursor.check_get(1)?;
        let value = self.load_one(index)?;
        self.cursor.advance(1);
        Ok(value)
    }

    pub fn get_at(&self, index: usize) -> Result<T> {
        self.cursor.check_index(index, 1)?;
        self.load_one(index)
    }

    pub fn put(&mut self, value: T) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        let index = self.cursor.check_put(1)?;
        self.backing.store(index, &[value])?;
        self.cursor.advance(1);
        Ok(())
    }

    pub fn put_at(&mut self, index: usize, value: T) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        self.cursor.check_index(index, 1)?;
        self.backing.store(index, &[value])
    }

    /// 读满 `dst`；剩余不足时返回 `Underflow` 且 position 不变。
    pub fn get_slice(&mut self, dst: &mut [T]) -> Result<()> {
        let index = self.cursor.check_get(dst.len())?;
        self.backing.load(index, dst)?;
        self.cursor.advance(dst.len());
        Ok(())
    }

    pub fn get_array(&mut self, dst: &mut [T], offset: usize, length: usize) -> Result<()> {
        bounds::check_sub_range(dst.len(), offset, length)?;
        self.get_slice(&mut dst[offset..offset + length])
    }

    pub fn get_slice_at(&self, index: usize, dst: &mut [T]) -> Result<()> {
        self.cursor.check_index(index, dst.len())?;
        self.backing.load(index, dst)
    }

    /// 写入整个 `src`；剩余不足时返回 `Overflow` 且不写入任何元素。
    pub fn put_slice(&mut self, src: &[T]) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        let index = self.cursor.check_put(src.len())?;
        self.backing.store(index, src)?;
        self.cursor.advance(src.len());
        Ok(())
    }

    pub fn put_array(&mut self, src: &[T], offset: usize, length: usize) -> Result<()> {
        bounds::check_sub_range(src.len(), offset, length)?;
        self.put_slice(&src[offset..offset + length])
    }

    pub fn put_slice_at(&mut self, index: usize, src: &[T]) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        self.cursor.check_index(index, src.len())?;
        self.backing.store(index, src)
    }

    /// 把 `src` 的剩余元素全部写入本缓冲。
    ///
    /// 两者共享存储且布局一致时原地搬运（`memmove` 语义）；
    /// 否则先解码到临时数组再写入，重叠区间同样按先读后写处理。
    pub fn put_buffer(&mut self, src: &mut TypedBuffer<T>) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        let count = src.remaining();
        let dst_index = self.cursor.check_put(count)?;
        let src_index = src.position();
        if self.backing.shares_layout_with(&src.backing) {
            self.backing
                .copy_from_shared(&src.backing, src_index, dst_index, count)?;
        } else {
            let mut staged = vec![T::default(); count];
            src.backing.load(src_index, &mut staged)?;
            self.backing.store(dst_index, &staged)?;
        }
        src.cursor.advance(count);
        self.cursor.advance(count);
        Ok(())
    }

    fn derive(&self, backing: Backing<T>, cursor: Cursor) -> Self {
        Self {
            backing,
            cursor,
            read_only: self.read_only,
        }
    }

    /// 以剩余窗口为全部容量的新缓冲，共享后备。
    pub fn slice(&self) -> Self {
        self.derive(
            self.backing.shifted(self.position()),
            Cursor::new(self.remaining()),
        )
    }

    /// 以 `[index, index + length)` 为全部容量的新缓冲。
    pub fn slice_range(&self, index: usize, length: usize) -> Result<Self> {
        self.cursor.check_index(index, length)?;
        Ok(self.derive(self.backing.shifted(index), Cursor::new(length)))
    }

    pub fn duplicate(&self) -> Self {
        self.derive(self.backing.share(), self.cursor)
    }

    pub fn as_read_only(&self) -> Self {
        let mut view = self.duplicate();
        view.read_only = true;
        view
    }

    /// 把剩余元素搬到开头，语义同 [`ByteBuffer::compact`](crate::ByteBuffer::compact)。
    pub fn compact(&mut self) -> Result<&mut Self> {
        bounds::check_mutable(self.read_only)?;
        self.backing
            .copy_from_shared(&self.backing, self.position(), 0, self.remaining())?;
        self.cursor.compacted();
        tracing::trace!(
            view = T::BUFFER_NAME,
            moved = self.position(),
            "compacted typed buffer"
        );
        Ok(self)
    }

    /// 复制剩余窗口，不移动 position。
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mut out = vec![T::default(); self.remaining()];
        self.backing.load(self.position(), &mut out)?;
        Ok(out)
    }

    /// 与另一个缓冲比较剩余窗口；存储不可访问时返回错误。
    pub fn try_compare(&self, other: &TypedBuffer<T>) -> Result<Ordering> {
        Ok(compare::compare_elements(&self.to_vec()?, &other.to_vec()?))
    }

    pub fn try_eq(&self, other: &TypedBuffer<T>) -> Result<bool> {
        if self.remaining() != other.remaining() {
            return Ok(false);
        }
        Ok(compare::elements_equal(&self.to_vec()?, &other.to_vec()?))
    }

    fn window(&self) -> Vec<T> {
        self.to_vec().unwrap_or_else(|err| {
            panic!("{} window access failed: {err}", T::BUFFER_NAME)
        })
    }
}

impl CharBuffer {
    /// 把 `text` 按 UTF-16 编码写入；空间不足时返回 `Overflow` 且不写入任何码元。
    pub fn put_str(&mut self, text: &str) -> Result<()> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.put_slice(&units)
    }

    /// 把剩余窗口按 UTF-16 解码，非法代理对替换为 U+FFFD；不移动 position。
    pub fn to_string_lossy(&self) -> Result<String> {
        Ok(String::from_utf16_lossy(&self.to_vec()?))
    }
}

impl<T: Element> Sealed for TypedBuffer<T> {
    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

impl<T: Element> Buffer for TypedBuffer<T> {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn has_array(&self) -> bool {
        !self.read_only && matches!(self.backing, Backing::Heap { .. })
    }

    fn is_direct(&self) -> bool {
        match &self.backing {
            Backing::Heap { .. } => false,
            Backing::View { bytes, .. } => bytes.is_direct(),
        }
    }
}

impl<T: Element> PartialEq for TypedBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.remaining() == other.remaining()
            && compare::elements_equal(&self.window(), &other.window())
    }
}

impl<T: Element> Eq for TypedBuffer<T> {}

impl<T: Element> PartialOrd for TypedBuffer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Element> Ord for TypedBuffer<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        compare::compare_elements(&self.window(), &other.window())
    }
}

impl<T: Element> hash::Hash for TypedBuffer<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        compare::hash_elements(&self.window(), state);
    }
}

impl<T: Element> fmt::Display for TypedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::BUFFER_NAME, self.cursor)
    }
}

impl<T: Element> fmt::Debug for TypedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(T::BUFFER_NAME)
            .field("cursor", &self.cursor)
            .field("order", &self.order())
            .field("read_only", &self.read_only)
            .field("direct", &self.is_direct())
            .finish()
    }
}
