//! `typed_view_contract` 集成测试：聚焦类型化缓冲的两种形态。
//!
//! # 测试总览（Why）
//! - 视图形态：元素索引映射到父存储的字节偏移，读写经由创建时锁定的字节序；
//! - 独立形态：以元素为单位管理自己的数组，报告平台字节序并暴露后备数组；
//! - 两种形态在导航、边界、批量传输与比较上遵循与字节缓冲相同的契约。

use lumen_buffer::{
    Buffer, BufferError, ByteBuffer, ByteOrder, CharBuffer, DoubleBuffer, ErrorKind, FloatBuffer,
    IntBuffer, LongBuffer, ShortBuffer,
};

/// 大端 short 视图的第 0 个元素等于前两个字节的大端组合。
#[test]
fn short_view_decodes_big_endian_pairs() {
    let bytes = ByteBuffer::wrap(vec![0x12, 0x34, 0xab, 0xcd, 0xff]);
    let shorts = bytes.as_short_buffer();
    assert_eq!(shorts.capacity(), 2, "容量向下取整");
    let expected = i16::from_be_bytes([
        bytes.get_at(0).expect("字节 0"),
        bytes.get_at(1).expect("字节 1"),
    ]);
    assert_eq!(shorts.get_at(0), Ok(expected));
    assert_eq!(shorts.get_at(1), Ok(0xabcdu16 as i16));
    assert!(!shorts.has_array());
    assert_eq!(shorts.backing_array().err(), Some(BufferError::NoBackingArray));
}

/// 视图从父缓冲当前 position 起算，写入视图即写入父存储。
#[test]
fn view_starts_at_parent_position_and_writes_through() {
    let mut bytes = ByteBuffer::allocate(12);
    bytes.set_order(ByteOrder::LittleEndian);
    bytes.set_position(4).expect("4 <= limit");
    let mut ints = bytes.as_int_buffer();
    assert_eq!(ints.capacity(), 2);
    ints.put(0x0102_0304).expect("写入第一个元素");
    ints.put_at(1, -1).expect("写入第二个元素");
    assert_eq!(bytes.get_at(4), Ok(0x04));
    assert_eq!(bytes.get_at(7), Ok(0x01));
    assert_eq!(bytes.get_int_at(8), Ok(-1));

    let err = ints.put(5).expect_err("视图已满");
    assert_eq!(err.kind(), ErrorKind::BufferOverflow);
}

/// 视图的切片与复制保留别名关系与字节序。
#[test]
fn view_slice_and_duplicate_keep_alias() {
    let mut bytes = ByteBuffer::allocate(32);
    bytes.set_order(ByteOrder::LittleEndian);
    let mut longs = bytes.as_long_buffer();
    longs.set_position(1).expect("1 <= limit");
    let mut tail = longs.slice();
    assert_eq!(tail.capacity(), 3);
    assert_eq!(tail.order(), ByteOrder::LittleEndian);
    tail.put(0x1122).expect("写入切片");
    assert_eq!(bytes.get_long_at(8), Ok(0x1122));

    let copy = longs.duplicate();
    assert_eq!(copy.position(), 1);
    assert_eq!(copy.get_at(1), Ok(0x1122));
}

/// 只读字节缓冲派生的视图同样只读。
#[test]
fn view_of_read_only_buffer_is_read_only() {
    let bytes = ByteBuffer::allocate(8).as_read_only();
    let mut doubles = bytes.as_double_buffer();
    assert!(doubles.is_read_only());
    assert_eq!(doubles.put(1.0).err(), Some(BufferError::ReadOnly));
    assert_eq!(doubles.get(), Ok(0.0));
}

/// 独立分配的缓冲报告平台字节序，批量传输先校验后搬运。
#[test]
fn heap_buffer_bulk_transfer_is_all_or_nothing() {
    let mut floats = FloatBuffer::allocate(4);
    assert_eq!(floats.order(), ByteOrder::native());
    assert!(floats.has_array());
    assert!(!floats.is_direct());

    floats.put_array(&[1.0, 2.0, 3.0], 0, 3).expect("写入三个元素");
    let err = floats.put_slice(&[4.0, 5.0]).expect_err("剩余 1 < 2");
    assert_eq!(
        err,
        BufferError::Overflow {
            requested: 2,
            remaining: 1
        }
    );
    floats.flip();

    let mut out = [0f32; 4];
    let err = floats.get_slice(&mut out).expect_err("剩余 3 < 4");
    assert_eq!(err.kind(), ErrorKind::BufferUnderflow);
    assert_eq!(floats.position(), 0);
    floats.get_array(&mut out, 1, 3).expect("恰好读完");
    assert_eq!(out, [0.0, 1.0, 2.0, 3.0]);
}

/// `wrap_range` 的窗口与后备数组偏移。
#[test]
fn heap_wrap_range_exposes_array() {
    let shorts = ShortBuffer::wrap_range(vec![1, 2, 3, 4, 5], 1, 3).expect("合法区间");
    assert_eq!((shorts.position(), shorts.limit(), shorts.capacity()), (1, 4, 5));
    assert_eq!(shorts.to_vec(), Ok(vec![2, 3, 4]));
    let sliced = shorts.slice();
    assert_eq!(sliced.array_offset(), Ok(1));
    assert_eq!(&sliced.backing_array().expect("堆缓冲")[..], &[1, 2, 3, 4, 5]);
    assert!(ShortBuffer::wrap_range(vec![1], 1, 1).is_err());
}

/// 不同存储、不同字节序之间的 `put_buffer` 逐元素转换。
#[test]
fn put_buffer_converts_between_orders() {
    let big = ByteBuffer::allocate(8);
    let mut little = ByteBuffer::allocate(8);
    little.set_order(ByteOrder::LittleEndian);

    let mut src = IntBuffer::wrap(vec![0x0102_0304, 0x0506_0708]);
    let mut dst = big.as_int_buffer();
    dst.put_buffer(&mut src).expect("写入两个元素");
    assert_eq!(big.to_vec(), Ok(vec![1, 2, 3, 4, 5, 6, 7, 8]));

    let mut from_big = big.as_int_buffer();
    let mut into_little = little.as_int_buffer();
    into_little.put_buffer(&mut from_big).expect("写入两个元素");
    assert_eq!(little.to_vec(), Ok(vec![4, 3, 2, 1, 8, 7, 6, 5]));
    assert_eq!(from_big.remaining(), 0);
}

/// 同一存储上字节序不同的两个视图：先读出全部源元素，再写入。
#[test]
fn put_buffer_between_views_with_different_orders_stages_source() {
    let mut bytes = ByteBuffer::wrap(vec![0, 1, 0, 2, 0, 3]);
    let mut src = bytes.as_short_buffer();
    src.set_limit(2).expect("2 <= capacity");
    bytes.set_order(ByteOrder::LittleEndian);
    bytes.set_position(2).expect("2 <= limit");
    let mut dst = bytes.as_short_buffer();
    dst.put_buffer(&mut src).expect("容量恰好");
    bytes.rewind();
    assert_eq!(bytes.to_vec(), Ok(vec![0, 1, 1, 0, 2, 0]));
}

/// 浮点缓冲的相等与排序：NaN 彼此相等，`0.0 == -0.0`，窗口比较不看绝对位置。
#[test]
fn float_equality_is_total() {
    let a = DoubleBuffer::wrap(vec![f64::NAN, -0.0, 1.0]);
    let b = DoubleBuffer::wrap(vec![f64::NAN, 0.0, 1.0]);
    assert_eq!(a, b);

    let mut shifted = DoubleBuffer::wrap(vec![42.0, f64::NAN, 0.0, 1.0]);
    shifted.set_position(1).expect("1 <= limit");
    assert_eq!(shifted, a);
    assert_eq!(shifted.cmp(&a), std::cmp::Ordering::Equal);

    let smaller = DoubleBuffer::wrap(vec![f64::NAN, -0.0]);
    assert!(smaller < a);
}

/// 独立缓冲与视图缓冲只要剩余元素相同即相等。
#[test]
fn heap_and_view_buffers_compare_by_content() {
    let bytes = ByteBuffer::wrap(vec![0, 0, 0, 7, 0, 0, 0, 9]);
    let view = bytes.as_int_buffer();
    let heap = IntBuffer::wrap(vec![7, 9]);
    assert_eq!(view, heap);
    assert!(IntBuffer::wrap(vec![7, 8]) < view);
    assert_eq!(LongBuffer::allocate(0), LongBuffer::wrap(Vec::new()));
}

/// `CharBuffer` 的文本写入是全有或全无的。
#[test]
fn char_buffer_text_helpers() {
    let bytes = ByteBuffer::allocate(8);
    let mut chars = bytes.as_char_buffer();
    chars.put_str("hé").expect("两个码元");
    let err = chars.put_str("𝄞𝄞").expect_err("需要四个码元");
    assert_eq!(err.kind(), ErrorKind::BufferOverflow);
    assert_eq!(chars.position(), 2);
    chars.flip();
    assert_eq!(chars.to_string_lossy(), Ok(String::from("hé")));
    assert_eq!(bytes.get_char_at(2), Ok(u16::from(b'\xe9')));

    let lone = CharBuffer::wrap(vec![0xd800]);
    assert_eq!(lone.to_string_lossy(), Ok(String::from("\u{fffd}")));
}

#[test]
fn display_uses_buffer_family_name() {
    let mut shorts = ShortBuffer::allocate(4);
    shorts.put(1).expect("写入");
    assert_eq!(shorts.to_string(), "ShortBuffer[pos=1 lim=4 cap=4]");
    assert_eq!(
        ByteBuffer::allocate(9).as_double_buffer().to_string(),
        "DoubleBuffer[pos=0 lim=1 cap=1]"
    );
}

/// 绝对访问以 `limit` 为界，按元素计。
#[test]
fn absolute_access_respects_element_limit() {
    let mut ints = IntBuffer::allocate(4);
    ints.set_limit(2).expect("2 <= capacity");
    ints.put_at(1, 7).expect("索引 1 < limit");
    assert_eq!(ints.get_at(1), Ok(7));
    assert_eq!(
        ints.get_at(2).err().map(|err| err.kind()),
        Some(ErrorKind::IndexOutOfRange)
    );
    assert_eq!(
        ints.put_at(2, 1).err().map(|err| err.kind()),
        Some(ErrorKind::IndexOutOfRange)
    );
    let mut pair = [0; 2];
    assert_eq!(
        ints.get_slice_at(1, &mut pair).err().map(|err| err.kind()),
        Some(ErrorKind::IndexOutOfRange)
    );
}

/// 向下取整后的视图容量同样约束绝对访问，多余的尾部字节不可达。
#[test]
fn rounded_down_view_rejects_trailing_bytes() {
    let bytes = ByteBuffer::allocate(7);
    let mut ints = bytes.as_int_buffer();
    assert_eq!((ints.capacity(), ints.limit()), (1, 1));
    assert_eq!(ints.get_at(0), Ok(0));
    assert_eq!(
        ints.get_at(1).err().map(|err| err.kind()),
        Some(ErrorKind::IndexOutOfRange)
    );
    assert_eq!(
        ints.put_at(1, 1).err().map(|err| err.kind()),
        Some(ErrorKind::IndexOutOfRange)
    );
    assert_eq!(bytes.as_long_buffer().capacity(), 0);
}

/// 视图的 compact 在父存储的字节偏移处搬运，不触碰偏移之前的字节。
#[test]
fn view_compact_moves_bytes_at_parent_offset() {
    let mut bytes = ByteBuffer::wrap(vec![9, 9, 0, 1, 0, 2, 0, 3, 0, 4]);
    bytes.set_position(2).expect("2 <= limit");
    let mut shorts = bytes.as_short_buffer();
    assert_eq!(shorts.capacity(), 4);
    shorts.set_position(1).expect("1 <= limit");
    shorts.compact().expect("可写视图允许 compact");
    assert_eq!((shorts.position(), shorts.limit()), (3, 4));

    bytes.rewind();
    assert_eq!(bytes.to_vec(), Ok(vec![9, 9, 0, 2, 0, 3, 0, 4, 0, 4]));
    shorts.flip();
    assert_eq!(shorts.to_vec(), Ok(vec![2, 3, 4]));
}

/// 只读的视图与独立缓冲都拒绝 compact，且不改动游标。
#[test]
fn read_only_compact_is_rejected() {
    let bytes = ByteBuffer::wrap(vec![0, 1, 0, 2]);
    let mut view = bytes.as_read_only().as_short_buffer();
    view.set_position(1).expect("1 <= limit");
    assert_eq!(view.compact().err(), Some(BufferError::ReadOnly));
    assert_eq!(view.position(), 1);
    assert_eq!(bytes.to_vec(), Ok(vec![0, 1, 0, 2]));

    let mut heap = LongBuffer::wrap(vec![1, 2]).as_read_only();
    heap.set_position(1).expect("1 <= limit");
    assert_eq!(heap.compact().err(), Some(BufferError::ReadOnly));
    assert_eq!(heap.get_at(0), Ok(1));
}

/// 后备数组被借出时，可失败的比较接口返回 `StorageBusy`。
#[test]
fn fallible_comparison_reports_busy_array() {
    let a = ShortBuffer::wrap(vec![1, 2]);
    let b = ShortBuffer::wrap(vec![1, 2]);
    {
        let _guard = a.backing_array().expect("独立缓冲有后备数组");
        assert_eq!(a.try_eq(&b), Err(BufferError::StorageBusy));
        assert_eq!(b.try_compare(&a), Err(BufferError::StorageBusy));
    }
    assert_eq!(a.try_eq(&b), Ok(true));
    assert_eq!(a.try_compare(&ShortBuffer::wrap(vec![1])), Ok(std::cmp::Ordering::Greater));
}
