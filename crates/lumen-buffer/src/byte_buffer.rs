//! [`ByteBuffer`]：规范的按字节寻址缓冲。

use alloc::{sync::Arc, vec, vec::Vec};
use core::{cmp::Ordering, fmt, hash, ptr::NonNull};

use crate::{
    bounds,
    config::default_order,
    cursor::{Buffer, Cursor, sealed::Sealed},
    element::Element,
    error::{BufferError, Result},
    order::ByteOrder,
    storage::{ArrayGuard, ByteStorage, heap::HeapStorage, same_storage},
    typed::{CharBuffer, DoubleBuffer, FloatBuffer, IntBuffer, LongBuffer, ShortBuffer, TypedBuffer},
};

/// `ByteBuffer` 是所有缓冲的根存储类型：纹理像素、顶点/索引数据、压缩图像与网络负载
/// 都先以字节形式写入它，再按需读出或派生类型化视图。
///
/// # 设计动机（Why）
/// - 上层编解码器需要在同一块内存上以不同游标、不同宽度反复读写，且不能复制；
/// - 原生 API 需要一段平坦连续的字节区间，因此缓冲必须能直接落在外部存储上。
///
/// # 架构关系（How）
/// - `storage`：共享的存储句柄（堆或外部），切片与复制只克隆 `Arc`；
/// - `offset`：本缓冲索引 0 在存储中的字节偏移；
/// - `cursor`：独立的导航状态；`order`：多字节读写的字节序；`read_only`：只读标记。
///
/// # 契约说明（What）
/// - 相对读写在 `remaining()` 不足时分别返回 `Underflow`/`Overflow`，且不推进 position；
/// - 绝对读写以 `limit`（而非 `capacity`）为界，宽度为 `n` 的访问要求 `index + n <= limit`；
/// - 批量传输先校验再搬运，失败时不写入任何字节；
/// - 只读缓冲的一切修改返回 `ReadOnly`；
/// - 相等、哈希与排序只看剩余窗口 `[position, limit)` 的内容，与绝对起点无关；
///   排序按无符号字节字典序，前缀较短者更小。
///
/// # 风险与取舍（Trade-offs）
/// - 缓冲本身不做同步；共享存储的多个视图跨线程并发写入时，冲突的一方会得到
///   `StorageBusy` 而非阻塞。需要跨线程流水线时应在外部加锁或按阶段移交所有权。
///
/// # Panics
/// `PartialEq`、`Ord` 与 `Hash` 无法返回错误，存储不可访问时会 panic：
/// - 同一存储上的 [`ArrayGuard`](crate::ArrayGuard) 仍然存活（得到 `StorageBusy`）；
/// - 外部存储已由 [`ForeignBuffer`](crate::ForeignBuffer) 释放（得到 `StorageReleased`）。
///
/// 这两种情况下应改用 [`try_eq`](Self::try_eq) 与 [`try_compare`](Self::try_compare)。
pub struct ByteBuffer {
    storage: Arc<dyn ByteStorage>,
    offset: usize,
    cursor: Cursor,
    order: ByteOrder,
    read_only: bool,
}

impl ByteBuffer {
    /// 在堆上分配 `capacity` 字节、全部置零、字节序为大端的缓冲。
    pub fn allocate(capacity: usize) -> Self {
        Self::allocate_in(capacity, default_order())
    }

    pub(crate) fn allocate_in(capacity: usize, order: ByteOrder) -> Self {
        tracing::trace!(capacity, %order, "allocated heap byte buffer");
        Self::from_storage(Arc::new(HeapStorage::<u8>::zeroed(capacity)), order)
    }

    /// 接管 `bytes` 作为后备数组，窗口覆盖整个数组。
    pub fn wrap(bytes: Vec<u8>) -> Self {
        Self::wrap_in(bytes, default_order())
    }

    pub(crate) fn wrap_in(bytes: Vec<u8>, order: ByteOrder) -> Self {
        Self::from_storage(Arc::new(HeapStorage::from_vec(bytes)), order)
    }

    /// 接管 `bytes` 作为后备数组，容量为整个数组，窗口为 `[offset, offset + length)`。
    pub fn wrap_range(bytes: Vec<u8>, offset: usize, length: usize) -> Result<Self> {
        Self::wrap_range_in(bytes, offset, length, default_order())
    }

    pub(crate) fn wrap_range_in(
        bytes: Vec<u8>,
        offset: usize,
        length: usize,
        order: ByteOrder,
    ) -> Result<Self> {
        bounds::check_sub_range(bytes.len(), offset, length)?;
        let mut buffer = Self::wrap_in(bytes, order);
        buffer.cursor = Cursor::with_window(buffer.capacity(), offset, offset + length)?;
        Ok(buffer)
    }

    pub(crate) fn from_storage(storage: Arc<dyn ByteStorage>, order: ByteOrder) -> Self {
        let capacity = storage.len();
        Self {
            storage,
            offset: 0,
            cursor: Cursor::new(capacity),
            order,
            read_only: false,
        }
    }

    fn derive(&self, offset: usize, cursor: Cursor) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            offset,
            cursor,
            order: self.order,
            read_only: self.read_only,
        }
    }

    /// 多字节读写当前使用的字节序。
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// 修改字节序；已创建的类型化视图不受影响。
    pub fn set_order(&mut self, order: ByteOrder) -> &mut Self {
        self.order = order;
        self
    }

    /// 独占借出整个后备数组。
    ///
    /// 返回的是完整存储而非窗口，本缓冲的索引 0 位于 [`array_offset`](Self::array_offset)。
    /// 只读缓冲返回 `ReadOnly`，外部存储返回 `NoBackingArray`。
    pub fn backing_array(&self) -> Result<ArrayGuard<'_, u8>> {
        bounds::check_mutable(self.read_only)?;
        self.storage.array()
    }

    /// 本缓冲索引 0 在后备数组中的位置。
    pub fn array_offset(&self) -> Result<usize> {
        bounds::check_mutable(self.read_only)?;
        if self.storage.is_direct() {
            return Err(BufferError::NoBackingArray);
        }
        Ok(self.offset)
    }

    /// 外部存储上本缓冲索引 0 的稳定地址，可直接交给原生 API；堆缓冲返回 `None`。
    pub fn address(&self) -> Option<NonNull<u8>> {
        let base = self.storage.address()?;
        // SAFETY: `offset <= storage.len()`，结果仍位于同一分配之内（或恰在末尾）。
        Some(unsafe { base.add(self.offset) })
    }

    // ---- 内部读写原语 ----

    fn load<T: Element>(&self, index: usize) -> Result<T> {
        let start = self.offset + index;
        let order = self.order;
        let mut value = T::default();
        self.storage
            .view(start..start + T::SIZE, &mut |bytes| value = T::decode(bytes, order))?;
        Ok(value)
    }

    fn store<T: Element>(&self, index: usize, value: T) -> Result<()> {
        let start = self.offset + index;
        let order = self.order;
        self.storage
            .view_mut(start..start + T::SIZE, &mut |bytes| value.encode(order, bytes))
    }

    fn get_value<T: Element>(&mut self) -> Result<T> {
        let index = self.cursor.check_get(T::SIZE)?;
        let value = self.load(index)?;
        self.cursor.advance(T::SIZE);
        Ok(value)
    }

    fn get_value_at<T: Element>(&self, index: usize) -> Result<T> {
        self.cursor.check_index(index, T::SIZE)?;
        self.load(index)
    }

    fn put_value<T: Element>(&mut self, value: T) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        let index = self.cursor.check_put(T::SIZE)?;
        self.store(index, value)?;
        self.cursor.advance(T::SIZE);
        Ok(())
    }

    fn put_value_at<T: Element>(&mut self, index: usize, value: T) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        self.cursor.check_index(index, T::SIZE)?;
        self.store(index, value)
    }

    // ---- 单字节访问 ----

    /// 读取 position 处的字节并推进 position。
    pub fn get(&mut self) -> Result<u8> {
        let index = self.cursor.check_get(1)?;
        let mut byte = [0u8; 1];
        self.storage.read(self.offset + index, &mut byte)?;
        self.cursor.advance(1);
        Ok(byte[0])
    }

    /// 读取绝对索引处的字节。
    pub fn get_at(&self, index: usize) -> Result<u8> {
        self.cursor.check_index(index, 1)?;
        let mut byte = [0u8; 1];
        self.storage.read(self.offset + index, &mut byte)?;
        Ok(byte[0])
    }

    /// 在 position 处写入字节并推进 position。
    pub fn put(&mut self, byte: u8) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        let index = self.cursor.check_put(1)?;
        self.storage.write(self.offset + index, &[byte])?;
        self.cursor.advance(1);
        Ok(())
    }

    /// 在绝对索引处写入字节。
    pub fn put_at(&mut self, index: usize, byte: u8) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        self.cursor.check_index(index, 1)?;
        self.storage.write(self.offset + index, &[byte])
    }

    // ---- 批量访问 ----

    /// 从 position 起读满 `dst`；剩余不足时返回 `Underflow` 且不读取任何字节。
    pub fn get_slice(&mut self, dst: &mut [u8]) -> Result<()> {
        let index = self.cursor.check_get(dst.len())?;
        self.storage.read(self.offset + index, dst)?;
        self.cursor.advance(dst.len());
        Ok(())
    }

    /// 读取 `length` 字节到 `dst[offset..offset + length]`。
    pub fn get_array(&mut self, dst: &mut [u8], offset: usize, length: usize) -> Result<()> {
        bounds::check_sub_range(dst.len(), offset, length)?;
        self.get_slice(&mut dst[offset..offset + length])
    }

    /// 从绝对索引起读满 `dst`，不移动 position。
    pub fn get_slice_at(&self, index: usize, dst: &mut [u8]) -> Result<()> {
        self.cursor.check_index(index, dst.len())?;
        self.storage.read(self.offset + index, dst)
    }

    /// 从 position 起写入整个 `src`；剩余不足时返回 `Overflow` 且不写入任何字节。
    pub fn put_slice(&mut self, src: &[u8]) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        let index = self.cursor.check_put(src.len())?;
        self.storage.write(self.offset + index, src)?;
        self.cursor.advance(src.len());
        Ok(())
    }

    /// 写入 `src[offset..offset + length]`。
    pub fn put_array(&mut self, src: &[u8], offset: usize, length: usize) -> Result<()> {
        bounds::check_sub_range(src.len(), offset, length)?;
        self.put_slice(&src[offset..offset + length])
    }

    /// 从绝对索引起写入整个 `src`，不移动 position。
    pub fn put_slice_at(&mut self, index: usize, src: &[u8]) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        self.cursor.check_index(index, src.len())?;
        self.storage.write(self.offset + index, src)
    }

    /// 把 `src` 的全部剩余字节写入本缓冲，两者的 position 同步推进。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：解码器常把一个缓冲的剩余内容整体转存到另一个缓冲（例如拼接像素行）；
    /// - **契约 (What)**：
    ///   - 本缓冲剩余空间不足时返回 `Overflow`，两边状态均不变；
    ///   - 同一实例自拷贝由借用规则在编译期排除；
    ///   - 两个不同视图共享存储且区间重叠时，结果等同于先把源窗口复制到临时区再写入
    ///     （`memmove` 语义）；
    /// - **执行 (How)**：共享存储时在存储内原地搬运；否则在源的读借用内直接写入目标，
    ///   不经过中间缓冲。
    pub fn put_buffer(&mut self, src: &mut ByteBuffer) -> Result<()> {
        bounds::check_mutable(self.read_only)?;
        let count = src.remaining();
        let dst_index = self.cursor.check_put(count)?;
        let src_start = src.offset + src.position();
        let dst_start = self.offset + dst_index;
        if same_storage(&self.storage, &src.storage) {
            self.storage
                .copy_within(src_start..src_start + count, dst_start)?;
        } else {
            let target = &self.storage;
            let mut written = Ok(());
            src.storage.view(src_start..src_start + count, &mut |bytes| {
                written = target.write(dst_start, bytes);
            })?;
            written?;
        }
        src.cursor.advance(count);
        self.cursor.advance(count);
        Ok(())
    }

    // ---- 派生缓冲 ----

    /// 以剩余窗口为全部容量的新缓冲，共享存储、游标独立。
    pub fn slice(&self) -> Self {
        let start = self.offset + self.position();
        self.derive(start, Cursor::new(self.remaining()))
    }

    /// 以 `[index, index + length)` 为全部容量的新缓冲，区间须位于 limit 之内。
    pub fn slice_range(&self, index: usize, length: usize) -> Result<Self> {
        self.cursor.check_index(index, length)?;
        Ok(self.derive(self.offset + index, Cursor::new(length)))
    }

    /// 游标状态完全相同、共享存储的新缓冲，继承只读属性与字节序。
    pub fn duplicate(&self) -> Self {
        self.derive(self.offset, self.cursor)
    }

    /// 只读的复制品；对只读缓冲调用等价于 [`duplicate`](Self::duplicate)。
    pub fn as_read_only(&self) -> Self {
        let mut view = self.duplicate();
        view.read_only = true;
        view
    }

    /// 把 `[position, limit)` 搬到开头，position 置为搬运的字节数，limit 置为 capacity，
    /// 丢弃 mark。
    pub fn compact(&mut self) -> Result<&mut Self> {
        bounds::check_mutable(self.read_only)?;
        let start = self.offset + self.position();
        let end = self.offset + self.limit();
        self.storage.copy_within(start..end, self.offset)?;
        self.cursor.compacted();
        tracing::trace!(moved = self.position(), "compacted byte buffer");
        Ok(self)
    }

    /// 从 position 起创建类型化视图，容量为 `remaining() / T::SIZE`，
    /// 字节序锁定为调用时的 [`order`](Self::order)。
    pub fn as_typed<T: Element>(&self) -> TypedBuffer<T> {
        let start = self.offset + self.position();
        let capacity = self.remaining() / T::SIZE;
        tracing::trace!(
            view = T::BUFFER_NAME,
            capacity,
            order = %self.order,
            "created typed view over byte buffer"
        );
        TypedBuffer::over_bytes(
            Arc::clone(&self.storage),
            start,
            capacity,
            self.order,
            self.read_only,
        )
    }

    pub fn as_short_buffer(&self) -> ShortBuffer {
        self.as_typed()
    }

    pub fn as_char_buffer(&self) -> CharBuffer {
        self.as_typed()
    }

    pub fn as_int_buffer(&self) -> IntBuffer {
        self.as_typed()
    }

    pub fn as_long_buffer(&self) -> LongBuffer {
        self.as_typed()
    }

    pub fn as_float_buffer(&self) -> FloatBuffer {
        self.as_typed()
    }

    pub fn as_double_buffer(&self) -> DoubleBuffer {
        self.as_typed()
    }

    /// 复制剩余窗口，不移动 position。
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.remaining()];
        self.get_slice_at(self.position(), &mut out)?;
        Ok(out)
    }

    /// 在读借用内访问剩余窗口。
    pub(crate) fn with_window<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let start = self.offset + self.position();
        let mut f = Some(f);
        let mut out = None;
        self.storage
            .view(start..start + self.remaining(), &mut |bytes| {
                if let Some(f) = f.take() {
                    out = Some(f(bytes));
                }
            })?;
        out.ok_or(BufferError::StorageBusy)
    }

    /// 与另一个缓冲比较剩余窗口。
    pub fn try_compare(&self, other: &ByteBuffer) -> Result<Ordering> {
        self.with_window(|lhs| other.with_window(|rhs| crate::compare::compare_bytes(lhs, rhs)))?
    }

    /// 剩余窗口是否相等；存储不可访问时返回错误。
    pub fn try_eq(&self, other: &ByteBuffer) -> Result<bool> {
        if self.remaining() != other.remaining() {
            return Ok(false);
        }
        self.try_compare(other).map(Ordering::is_eq)
    }
}

macro_rules! multi_byte_accessors {
    ($ty:ty, $get:ident, $get_at:ident, $put:ident, $put_at:ident) => {
        impl ByteBuffer {
            #[doc = concat!("按当前字节序读取一个 `", stringify!($ty), "` 并推进 position。")]
            pub fn $get(&mut self) -> Result<$ty> {
                self.get_value()
            }

            #[doc = concat!("按当前字节序读取绝对索引处的 `", stringify!($ty), "`。")]
            pub fn $get_at(&self, index: usize) -> Result<$ty> {
                self.get_value_at(index)
            }

            #[doc = concat!("按当前字节序写入一个 `", stringify!($ty), "` 并推进 position。")]
            pub fn $put(&mut self, value: $ty) -> Result<()> {
                self.put_value(value)
            }

            #[doc = concat!("按当前字节序在绝对索引处写入 `", stringify!($ty), "`。")]
            pub fn $put_at(&mut self, index: usize, value: $ty) -> Result<()> {
                self.put_value_at(index, value)
            }
        }
    };
}

multi_byte_accessors!(i16, get_short, get_short_at, put_short, put_short_at);
multi_byte_accessors!(u16, get_char, get_char_at, put_char, put_char_at);
multi_byte_accessors!(i32, get_int, get_int_at, put_int, put_int_at);
multi_byte_accessors!(i64, get_long, get_long_at, put_long, put_long_at);
multi_byte_accessors!(f32, get_float, get_float_at, put_float, put_float_at);
multi_byte_accessors!(f64, get_double, get_double_at, put_double, put_double_at);

impl Sealed for ByteBuffer {
    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

impl Buffer for ByteBuffer {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn has_array(&self) -> bool {
        !self.read_only && !self.storage.is_direct()
    }

    fn is_direct(&self) -> bool {
        self.storage.is_direct()
    }
}

impl PartialEq for ByteBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.remaining() == other.remaining() && self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ByteBuffer {}

impl PartialOrd for ByteBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteBuffer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.try_compare(other)
            .unwrap_or_else(|err| panic!("ByteBuffer comparison failed: {err}"))
    }
}

impl hash::Hash for ByteBuffer {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.with_window(|bytes| hash::Hash::hash(bytes, state))
            .unwrap_or_else(|err| panic!("ByteBuffer hashing failed: {err}"));
    }
}

impl fmt::Display for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteBuffer{}", self.cursor)
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("cursor", &self.cursor)
            .field("offset", &self.offset)
            .field("order", &self.order)
            .field("read_only", &self.read_only)
            .field("direct", &self.storage.is_direct())
            .finish()
    }
}
