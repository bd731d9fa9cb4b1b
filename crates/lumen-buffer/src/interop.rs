//! 与 `bytes` 生态及 `std::io` 的互操作。
//!
//! - `Read` 从剩余窗口取出字节，`Write` 填入剩余窗口；两者都推进 position；
//! - `Bytes`/`Vec<u8>` 转换接管载荷而不复制，`to_bytes` 复制剩余窗口。

use alloc::vec::Vec;

use bytes::Bytes;

use crate::{byte_buffer::ByteBuffer, error::Result};
#[cfg(feature = "std")]
use crate::cursor::Buffer;

impl ByteBuffer {
    /// 把剩余窗口复制为 [`Bytes`]，不移动 position。
    pub fn to_bytes(&self) -> Result<Bytes> {
        self.to_vec().map(Bytes::from)
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        ByteBuffer::wrap(bytes)
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(bytes: Bytes) -> Self {
        // 唯一持有时 `Vec::from` 直接取回分配，否则复制一次。
        ByteBuffer::wrap(Vec::from(bytes))
    }
}

#[cfg(feature = "std")]
impl std::io::Read for ByteBuffer {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let count = buf.len().min(self.remaining());
        self.get_slice(&mut buf[..count])?;
        Ok(count)
    }
}

#[cfg(feature = "std")]
impl std::io::Write for ByteBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let count = buf.len().min(self.remaining());
        self.put_slice(&buf[..count])?;
        Ok(count)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
