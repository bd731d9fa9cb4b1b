//! 所有缓冲共用的索引与区间校验。
//!
//! 校验函数只做判断、不修改任何状态，调用方据此保证“先校验、后搬运”：
//! 任何一次失败都不会留下部分完成的读写。

use crate::error::{BufferError, Result};

/// 校验以 `index` 起始、跨度为 `width` 个元素的绝对访问是否落在 `[0, limit)` 内。
#[inline]
pub(crate) fn check_index(index: usize, width: usize, limit: usize) -> Result<()> {
    match index.checked_add(width) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(BufferError::IndexOutOfRange {
            index,
            width,
            limit,
        }),
    }
}

/// 校验 `(offset, length)` 是否描述了长度为 `len` 的数组中的合法子区间。
#[inline]
pub(crate) fn check_sub_range(len: usize, offset: usize, length: usize) -> Result<()> {
    if offset > len {
        return Err(BufferError::InvalidArgument {
            name: "offset",
            value: offset,
            bound: len,
        });
    }
    if length > len - offset {
        return Err(BufferError::InvalidArgument {
            name: "length",
            value: length,
            bound: len - offset,
        });
    }
    Ok(())
}

/// 读取前确认剩余量充足。
#[inline]
pub(crate) fn check_readable(requested: usize, remaining: usize) -> Result<()> {
    if requested > remaining {
        Err(BufferError::Underflow {
            requested,
            remaining,
        })
    } else {
        Ok(())
    }
}

/// 写入前确认剩余量充足。
#[inline]
pub(crate) fn check_writable(requested: usize, remaining: usize) -> Result<()> {
    if requested > remaining {
        Err(BufferError::Overflow {
            requested,
            remaining,
        })
    } else {
        Ok(())
    }
}

/// 只读缓冲拒绝一切修改。
#[inline]
pub(crate) fn check_mutable(read_only: bool) -> Result<()> {
    if read_only {
        Err(BufferError::ReadOnly)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_checks_respect_width_and_overflow() {
        assert!(check_index(0, 4, 4).is_ok());
        assert!(check_index(1, 4, 4).is_err());
        assert_eq!(
            check_index(usize::MAX, 2, 8),
            Err(BufferError::IndexOutOfRange {
                index: usize::MAX,
                width: 2,
                limit: 8
            }),
            "索引加宽度溢出时也必须判定为越界"
        );
    }

    #[test]
    fn sub_range_rejects_offsets_and_lengths_past_the_end() {
        assert!(check_sub_range(4, 4, 0).is_ok());
        assert!(check_sub_range(4, 5, 0).is_err());
        assert!(check_sub_range(4, 1, 4).is_err());
    }
}
