//! 类型化缓冲的元素编解码。
//!
//! 六种元素类型与传统缓冲族一一对应：
//!
//! | 缓冲           | 元素  | 宽度 |
//! |----------------|-------|------|
//! | `ShortBuffer`  | `i16` | 2    |
//! | `CharBuffer`   | `u16` | 2    |
//! | `IntBuffer`    | `i32` | 4    |
//! | `LongBuffer`   | `i64` | 8    |
//! | `FloatBuffer`  | `f32` | 4    |
//! | `DoubleBuffer` | `f64` | 8    |
//!
//! `CharBuffer` 的元素是 UTF-16 码元而不是 Rust `char`。

use core::{cmp::Ordering, fmt};

use crate::order::{ByteOrder, swap_u16, swap_u32, swap_u64};

mod sealed {
    pub trait Sealed {}
}

/// 可以放进类型化缓冲的元素。
///
/// # 契约说明（What）
/// - [`decode`](Self::decode)/[`encode`](Self::encode) 处理的切片长度恰好为 [`SIZE`](Self::SIZE)；
/// - [`same`](Self::same) 定义缓冲相等：整数按值比较；浮点数中 `0.0` 与 `-0.0` 相等、
///   任意两个 NaN 相等；
/// - [`compare`](Self::compare) 与 `same` 一致，[`hash_bits`](Self::hash_bits) 对 `same`
///   相等的值给出相同结果。
pub trait Element: Copy + Default + fmt::Debug + Send + Sync + 'static + sealed::Sealed {
    /// 元素宽度（字节）。
    const SIZE: usize;

    /// 对应缓冲的显示名，例如 `IntBuffer`。
    const BUFFER_NAME: &'static str;

    /// 按字节序解码一个元素。
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// 按字节序编码一个元素。
    fn encode(self, order: ByteOrder, out: &mut [u8]);

    fn same(a: Self, b: Self) -> bool;

    fn compare(a: Self, b: Self) -> Ordering;

    fn hash_bits(self) -> u64;
}

macro_rules! integer_element {
    ($ty:ty, $bits:ty, $swap:ident, $name:literal) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const SIZE: usize = core::mem::size_of::<$ty>();
            const BUFFER_NAME: &'static str = $name;

            #[inline]
            fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                let bits = <$bits>::from_ne_bytes(raw);
                let bits = if order.is_native() { bits } else { $swap(bits) };
                bits as $ty
            }

            #[inline]
            fn encode(self, order: ByteOrder, out: &mut [u8]) {
                let bits = self as $bits;
                let bits = if order.is_native() { bits } else { $swap(bits) };
                out[..Self::SIZE].copy_from_slice(&bits.to_ne_bytes());
            }

            #[inline]
            fn same(a: Self, b: Self) -> bool {
                a == b
            }

            #[inline]
            fn compare(a: Self, b: Self) -> Ordering {
                a.cmp(&b)
            }

            #[inline]
            fn hash_bits(self) -> u64 {
                self as $bits as u64
            }
        }
    };
}

macro_rules! float_element {
    ($ty:ty, $bits:ty, $swap:ident, $name:literal) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const SIZE: usize = core::mem::size_of::<$ty>();
            const BUFFER_NAME: &'static str = $name;

            #[inline]
            fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                let bits = <$bits>::from_ne_bytes(raw);
                let bits = if order.is_native() { bits } else { $swap(bits) };
                <$ty>::from_bits(bits)
            }

            #[inline]
            fn encode(self, order: ByteOrder, out: &mut [u8]) {
                let bits = self.to_bits();
                let bits = if order.is_native() { bits } else { $swap(bits) };
                out[..Self::SIZE].copy_from_slice(&bits.to_ne_bytes());
            }

            #[inline]
            fn same(a: Self, b: Self) -> bool {
                a == b || (a.is_nan() && b.is_nan())
            }

            #[inline]
            fn compare(a: Self, b: Self) -> Ordering {
                canonical(a).total_cmp(&canonical(b))
            }

            #[inline]
            fn hash_bits(self) -> u64 {
                canonical(self).to_bits() as u64
            }
        }

        impl Canonical for $ty {
            #[inline]
            fn canonical(self) -> Self {
                if self.is_nan() {
                    <$ty>::NAN
                } else if self == 0.0 {
                    0.0
                } else {
                    self
                }
            }
        }
    };
}

/// 把所有 NaN 折叠为正的规范 NaN、把 `-0.0` 折叠为 `0.0`，使全序与 `same` 保持一致。
trait Canonical {
    fn canonical(self) -> Self;
}

#[inline]
fn canonical<T: Canonical>(value: T) -> T {
    value.canonical()
}

integer_element!(i16, u16, swap_u16, "ShortBuffer");
integer_element!(u16, u16, swap_u16, "CharBuffer");
integer_element!(i32, u32, swap_u32, "IntBuffer");
integer_element!(i64, u64, swap_u64, "LongBuffer");
float_element!(f32, u32, swap_u32, "FloatBuffer");
float_element!(f64, u64, swap_u64, "DoubleBuffer");

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: Element>(value: T, order: ByteOrder) -> [u8; 8] {
        let mut out = [0u8; 8];
        value.encode(order, &mut out);
        out
    }

    #[test]
    fn integers_follow_requested_order() {
        assert_eq!(
            encoded(0x1122_3344i32, ByteOrder::BigEndian)[..4],
            [0x11, 0x22, 0x33, 0x44]
        );
        assert_eq!(
            encoded(0x1122_3344i32, ByteOrder::LittleEndian)[..4],
            [0x44, 0x33, 0x22, 0x11]
        );
        assert_eq!(i16::decode(&[0xff, 0xfe], ByteOrder::BigEndian), -2);
        assert_eq!(u16::decode(&[0xff, 0xfe], ByteOrder::LittleEndian), 0xfeff);
    }

    #[test]
    fn floats_round_trip_through_both_orders() {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            let bytes = encoded(-1.5f64, order);
            assert_eq!(f64::decode(&bytes, order), -1.5);
            let bytes = encoded(3.25f32, order);
            assert_eq!(f32::decode(&bytes, order), 3.25);
        }
        assert_eq!(
            encoded(1.0f32, ByteOrder::BigEndian)[..4],
            [0x3f, 0x80, 0x00, 0x00]
        );
    }

    #[test]
    fn float_equality_treats_nans_and_signed_zeroes_as_equal() {
        assert!(f32::same(f32::NAN, -f32::NAN));
        assert!(f64::same(0.0, -0.0));
        assert_eq!(f64::compare(0.0, -0.0), Ordering::Equal);
        assert_eq!(f32::compare(f32::NAN, f32::INFINITY), Ordering::Greater);
        assert_eq!(f32::compare(-f32::NAN, f32::INFINITY), Ordering::Greater);
        assert_eq!((-0.0f64).hash_bits(), 0.0f64.hash_bits());
    }
}
