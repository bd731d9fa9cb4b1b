//! `buffer_navigation_contract` 集成测试：聚焦 mark/position/limit/capacity 的导航契约。
//!
//! # 测试总览（Why）
//! - 所有缓冲共享同一套导航规则，这里以字节缓冲与类型化缓冲各取样本，确认默认方法的行为一致；
//! - 覆盖非法参数、mark 失效与 `reset` 失败等错误路径，确保错误分类稳定。

use lumen_buffer::{Buffer, BufferError, ByteBuffer, ErrorKind, IntBuffer};

/// 越界的 position/limit 返回 `InvalidArgument`，且不改变任何状态。
#[test]
fn out_of_range_navigation_is_rejected_without_side_effects() {
    let mut buffer = ByteBuffer::allocate(8);
    buffer.set_limit(4).expect("4 <= capacity");
    buffer.set_position(2).expect("2 <= limit");

    let err = buffer.set_position(5).expect_err("5 > limit");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = buffer.set_limit(9).expect_err("9 > capacity");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert_eq!((buffer.position(), buffer.limit()), (2, 4));
}

/// `reset` 未设置 mark 时失败；mark 超出新 limit 后被丢弃。
#[test]
fn reset_requires_a_live_mark() {
    let mut buffer = ByteBuffer::allocate(8);
    assert_eq!(buffer.reset().err(), Some(BufferError::MarkNotSet));

    buffer.set_position(6).expect("6 <= limit").mark();
    buffer.set_limit(5).expect("5 <= capacity");
    assert_eq!(buffer.position(), 5, "position 被截断到新 limit");
    let err = buffer.reset().expect_err("mark 已被丢弃");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    buffer.set_position(1).expect("1 <= limit").mark();
    buffer.set_position(3).expect("3 <= limit");
    buffer.reset().expect("mark 仍然有效");
    assert_eq!(buffer.position(), 1);
}

/// `clear`/`flip`/`rewind` 的标准流程：填充、翻转、读取、重读、清空。
#[test]
fn fill_flip_drain_cycle() {
    let mut ints = IntBuffer::allocate(4);
    ints.put(10).expect("写入");
    ints.put(20).expect("写入");
    ints.flip();
    assert_eq!((ints.position(), ints.limit(), ints.remaining()), (0, 2, 2));

    assert_eq!(ints.get(), Ok(10));
    ints.mark();
    assert_eq!(ints.get(), Ok(20));
    assert!(!ints.has_remaining());

    ints.rewind();
    assert_eq!(ints.position(), 0);
    assert_eq!(ints.limit(), 2, "rewind 不改变 limit");
    assert!(ints.reset().is_err(), "rewind 丢弃 mark");

    ints.clear();
    assert_eq!((ints.position(), ints.limit()), (0, ints.capacity()));
    assert!(ints.cursor().is_consistent());
}

/// 导航方法返回 `&mut Self`，可以链式调用。
#[test]
fn navigation_methods_chain() {
    let mut buffer = ByteBuffer::wrap(vec![1, 2, 3, 4]);
    buffer
        .set_limit(3)
        .expect("3 <= capacity")
        .set_position(1)
        .expect("1 <= limit");
    assert_eq!(buffer.to_vec(), Ok(vec![2, 3]));
    assert_eq!(buffer.rewind().flip().limit(), 0);
}
