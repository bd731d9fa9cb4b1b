//! 剩余窗口的相等、排序与哈希。
//!
//! 所有缓冲的比较都只看 `[position, limit)`，与窗口在存储中的绝对位置无关。
//! 字节按无符号值比较；元素按 [`Element::compare`] 比较。两种情况下较短的前缀更小。

use core::{cmp::Ordering, hash::Hasher};

use crate::element::Element;

/// 按无符号字节字典序比较两个窗口。
pub(crate) fn compare_bytes(lhs: &[u8], rhs: &[u8]) -> Ordering {
    lhs.cmp(rhs)
}

pub(crate) fn elements_equal<T: Element>(lhs: &[T], rhs: &[T]) -> bool {
    lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(a, b)| T::same(*a, *b))
}

pub(crate) fn compare_elements<T: Element>(lhs: &[T], rhs: &[T]) -> Ordering {
    lhs.iter()
        .zip(rhs)
        .map(|(a, b)| T::compare(*a, *b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| lhs.len().cmp(&rhs.len()))
}

/// 与 [`elements_equal`] 一致的哈希：先写入元素个数，再逐个写入规范化后的位模式。
pub(crate) fn hash_elements<T: Element, H: Hasher>(values: &[T], state: &mut H) {
    state.write_usize(values.len());
    for value in values {
        state.write_u64(value.hash_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_compare_unsigned_and_shorter_prefix_first() {
        assert_eq!(compare_bytes(&[0x80], &[0x7f]), Ordering::Greater);
        assert_eq!(compare_bytes(&[1, 2], &[1, 2, 0]), Ordering::Less);
        assert_eq!(compare_bytes(&[], &[]), Ordering::Equal);
    }

    #[test]
    fn float_windows_treat_nan_as_equal() {
        assert!(elements_equal(&[f32::NAN, 1.0], &[f32::NAN, 1.0]));
        assert_eq!(
            compare_elements(&[f64::NAN], &[f64::NAN]),
            Ordering::Equal
        );
        assert_eq!(compare_elements(&[1i32], &[1, 0]), Ordering::Less);
        assert_eq!(compare_elements(&[-1i16, 9], &[0]), Ordering::Less);
    }
}
