//! 导航状态与 [`Buffer`] 公共能力。
//!
//! # 设计背景（Why）
//! - 所有缓冲（字节缓冲与六种类型化缓冲）共享同一套 mark/position/limit/capacity 记账规则，
//!   因此把导航状态抽成纯值类型 [`Cursor`]，与存储访问彻底分离；
//! - 缓冲之间的“共享存储、独立游标”关系由此变得平凡：复制一个 `Cursor` 即得到独立游标。
//!
//! # 契约说明（What）
//! - 任意时刻满足 `0 <= mark <= position <= limit <= capacity`（mark 可缺省）；
//! - 所有单位均为“元素”，对字节缓冲即字节，对类型化缓冲即对应宽度的元素。

use core::fmt;

use crate::{
    bounds,
    error::{BufferError, Result},
};

/// 缓冲的导航状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    mark: Option<usize>,
    position: usize,
    limit: usize,
    capacity: usize,
}

impl Cursor {
    /// 创建 `position = 0`、`limit = capacity`、无 mark 的游标。
    pub const fn new(capacity: usize) -> Self {
        Self {
            mark: None,
            position: 0,
            limit: capacity,
            capacity,
        }
    }

    /// 以给定窗口创建游标，供 `wrap_range` 一类构造使用。
    pub(crate) fn with_window(capacity: usize, position: usize, limit: usize) -> Result<Self> {
        let mut cursor = Self::new(capacity);
        cursor.set_limit(limit)?;
        cursor.set_position(position)?;
        Ok(cursor)
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn position(&self) -> usize {
        self.position
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// 当前 mark，未设置时为 `None`。
    pub const fn mark_value(&self) -> Option<usize> {
        self.mark
    }

    pub const fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// 检查不变量 `mark <= position <= limit <= capacity`。
    pub fn is_consistent(&self) -> bool {
        self.mark.is_none_or(|mark| mark <= self.position)
            && self.position <= self.limit
            && self.limit <= self.capacity
    }

    pub(crate) fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(BufferError::InvalidArgument {
                name: "position",
                value: position,
                bound: self.limit,
            });
        }
        if self.mark.is_some_and(|mark| mark > position) {
            self.mark = None;
        }
        self.position = position;
        Ok(())
    }

    pub(crate) fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity {
            return Err(BufferError::InvalidArgument {
                name: "limit",
                value: limit,
                bound: self.capacity,
            });
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.is_some_and(|mark| mark > limit) {
            self.mark = None;
        }
        Ok(())
    }

    pub(crate) fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    pub(crate) fn reset(&mut self) -> Result<()> {
        let mark = self.mark.ok_or(BufferError::MarkNotSet)?;
        self.position = mark;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity;
        self.mark = None;
    }

    pub(crate) fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
    }

    pub(crate) fn rewind(&mut self) {
        self.position = 0;
        self.mark = None;
    }

    /// 确认还能读取 `count` 个元素，返回起始位置；position 由调用方在成功后推进。
    pub(crate) fn check_get(&self, count: usize) -> Result<usize> {
        bounds::check_readable(count, self.remaining())?;
        Ok(self.position)
    }

    /// 确认还能写入 `count` 个元素，返回起始位置；position 由调用方在成功后推进。
    pub(crate) fn check_put(&self, count: usize) -> Result<usize> {
        bounds::check_writable(count, self.remaining())?;
        Ok(self.position)
    }

    /// 推进 position；调用前必须已通过 `check_get`/`check_put`。
    pub(crate) fn advance(&mut self, count: usize) {
        debug_assert!(count <= self.remaining());
        self.position += count;
    }

    /// 校验绝对访问 `[index, index + width)` 落在 limit 之内。
    pub(crate) fn check_index(&self, index: usize, width: usize) -> Result<()> {
        bounds::check_index(index, width, self.limit)
    }

    /// `compact` 之后的游标：剩余元素已被搬到开头。
    pub(crate) fn compacted(&mut self) {
        self.position = self.remaining();
        self.limit = self.capacity;
        self.mark = None;
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[pos={} lim={} cap={}]",
            self.position, self.limit, self.capacity
        )
    }
}

pub(crate) mod sealed {
    use super::Cursor;

    /// 限制 [`Buffer`](super::Buffer) 只能由本 crate 的缓冲实现。
    pub trait Sealed {
        fn cursor_mut(&mut self) -> &mut Cursor;
    }
}

/// `Buffer` 是所有缓冲共享的导航能力。
///
/// # 设计背景（Why）
/// - 字节缓冲与类型化缓冲的 position/limit/mark 语义完全一致，只是元素宽度不同；
///   以 trait 默认方法承载这些规则，具体缓冲只需暴露自己的 [`Cursor`]。
///
/// # 契约说明（What）
/// - `set_position(p)`：`p > limit` 时返回 `InvalidArgument`；若 `p < mark` 则丢弃 mark；
/// - `set_limit(l)`：`l > capacity` 时返回 `InvalidArgument`；position 超出时被截断到 `l`，
///   mark 超出时被丢弃；
/// - `reset()`：未设置 mark 时返回 `InvalidState` 类错误；
/// - `clear`/`flip`/`rewind` 均会丢弃 mark。
///
/// # 风险提示（Trade-offs）
/// - trait 被封闭（sealed），外部无法实现，避免第三方缓冲破坏游标不变量。
pub trait Buffer: sealed::Sealed {
    /// 当前导航状态的只读视图。
    fn cursor(&self) -> &Cursor;

    /// 是否拒绝一切修改。
    fn is_read_only(&self) -> bool;

    /// 是否存在可访问的后备数组。
    fn has_array(&self) -> bool;

    /// 是否由外部（非托管）存储支撑。
    fn is_direct(&self) -> bool;

    fn capacity(&self) -> usize {
        self.cursor().capacity()
    }

    fn position(&self) -> usize {
        self.cursor().position()
    }

    fn limit(&self) -> usize {
        self.cursor().limit()
    }

    fn remaining(&self) -> usize {
        self.cursor().remaining()
    }

    fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    fn set_position(&mut self, position: usize) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.cursor_mut().set_position(position)?;
        Ok(self)
    }

    fn set_limit(&mut self, limit: usize) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.cursor_mut().set_limit(limit)?;
        Ok(self)
    }

    /// 记录当前 position。
    fn mark(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.cursor_mut().mark();
        self
    }

    /// 把 position 恢复到 mark。
    fn reset(&mut self) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.cursor_mut().reset()?;
        Ok(self)
    }

    /// 准备重新填充：`position = 0`，`limit = capacity`。
    fn clear(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.cursor_mut().clear();
        self
    }

    /// 填充结束、准备读出：`limit = position`，`position = 0`。
    fn flip(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.cursor_mut().flip();
        self
    }

    /// 从头重读，limit 不变。
    fn rewind(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.cursor_mut().rewind();
        self
    }
}
