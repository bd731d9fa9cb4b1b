//! 字节序枚举与字节交换工具。

use core::fmt;

use serde::{Deserialize, Serialize};

/// 多字节数值在字节序列中的排列约定。
///
/// # 契约说明（What）
/// - 缓冲默认使用 [`ByteOrder::BigEndian`]；
/// - [`ByteOrder::native`] 在编译期由目标平台决定，不依赖任何运行时全局状态。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// 当前目标平台的原生字节序。
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// 返回相反的字节序。
    pub const fn opposite(self) -> Self {
        match self {
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
        }
    }

    /// 判断是否与平台原生字节序一致；一致时编码等价于内存中的原始表示。
    pub const fn is_native(self) -> bool {
        matches!(
            (self, Self::native()),
            (ByteOrder::BigEndian, ByteOrder::BigEndian)
                | (ByteOrder::LittleEndian, ByteOrder::LittleEndian)
        )
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ByteOrder::BigEndian => "BIG_ENDIAN",
            ByteOrder::LittleEndian => "LITTLE_ENDIAN",
        })
    }
}

/// 交换 16 位值的字节顺序。
#[inline]
pub const fn swap_u16(value: u16) -> u16 {
    value.swap_bytes()
}

/// 交换 32 位值的字节顺序。
#[inline]
pub const fn swap_u32(value: u32) -> u32 {
    value.swap_bytes()
}

/// 交换 64 位值的字节顺序。
#[inline]
pub const fn swap_u64(value: u64) -> u64 {
    value.swap_bytes()
}
