#![cfg_attr(not(any(feature = "std", test)), no_std)]

//! `lumen-buffer` 是 Lumen 图形框架的二进制缓冲层。
//!
//! # 模块定位（Why）
//! - 像素编解码器、压缩纹理读取器、网格构建器与网络/文件 IO 都在同一块连续内存上
//!   组装自己的格式；本 crate 提供这块内存以及在其上按游标读写的统一契约；
//! - 原生图形/音频 API 需要地址稳定的内存，因此存储分为框架自管的堆存储与
//!   由唯一所有者显式释放的外部存储两类。
//!
//! # 设计概要（How）
//! - [`Cursor`] 承载 mark/position/limit/capacity 记账，[`Buffer`] trait 以默认方法提供导航；
//! - [`ByteBuffer`] 以 `Arc` 共享存储句柄，切片、复制、只读化都只叠加偏移与独立游标；
//! - [`TypedBuffer`] 既可独立分配，也可作为字节缓冲上的别名视图，按创建时锁定的字节序编解码；
//! - [`BufferAllocator`] 把字节序与容量上限作为显式配置传入分配调用，并为外部分配记账。
//!
//! # 命名约定（Consistency）
//! - 传统缓冲族名称以类型别名保留：[`ShortBuffer`]、[`CharBuffer`]、[`IntBuffer`]、
//!   [`LongBuffer`]、[`FloatBuffer`]、[`DoubleBuffer`]；
//! - 绝对访问统一以 `_at` 结尾，批量访问以 `_slice`/`_array` 结尾。

extern crate alloc;

mod bounds;
mod byte_buffer;
mod compare;
pub mod config;
mod cursor;
pub mod element;
pub mod error;
mod interop;
pub mod order;
pub mod storage;
mod typed;

pub use byte_buffer::ByteBuffer;
pub use config::{BufferAllocator, BufferConfig, ConfigError, OrderPreference};
pub use cursor::{Buffer, Cursor};
pub use element::Element;
pub use error::{BufferError, ErrorKind, Result};
pub use order::ByteOrder;
pub use storage::{ArrayGuard, ExternalStatsSnapshot, ForeignBuffer};
pub use typed::{
    CharBuffer, DoubleBuffer, FloatBuffer, IntBuffer, LongBuffer, ShortBuffer, TypedBuffer,
};
