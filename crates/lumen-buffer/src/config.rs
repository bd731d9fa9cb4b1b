//! 分配配置与显式分配入口。
//!
//! # 模块定位（Why）
//! - 缓冲的默认字节序不再来自隐式的进程全局状态，而是作为配置值显式传入分配调用，
//!   测试与生产环境因此得到完全一致、可复现的行为；
//! - [`BufferAllocator`] 同时承担外部分配的记账职责，便于宿主观察原生内存占用。
//!
//! # 配置格式（What）
//! ```toml
//! byte-order = "little-endian"   # big-endian（默认）| little-endian | native
//! max-capacity = 16777216         # 可选，单次分配的字节上限
//! ```

use alloc::{string::String, sync::Arc, vec::Vec};

use serde::{Deserialize, Serialize};

use crate::{
    byte_buffer::ByteBuffer,
    element::Element,
    error::{BufferError, Result},
    order::ByteOrder,
    storage::{
        ExternalStatsSnapshot, ForeignBuffer,
        external::ExternalStats,
    },
    typed::TypedBuffer,
};

/// 配置中声明的字节序偏好。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderPreference {
    #[default]
    BigEndian,
    LittleEndian,
    /// 目标平台的原生字节序，编译期确定。
    Native,
}

impl OrderPreference {
    pub const fn resolve(self) -> ByteOrder {
        match self {
            OrderPreference::BigEndian => ByteOrder::BigEndian,
            OrderPreference::LittleEndian => ByteOrder::LittleEndian,
            OrderPreference::Native => ByteOrder::native(),
        }
    }
}

impl From<ByteOrder> for OrderPreference {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::BigEndian => OrderPreference::BigEndian,
            ByteOrder::LittleEndian => OrderPreference::LittleEndian,
        }
    }
}

/// 缓冲分配配置。
///
/// # 契约说明（What）
/// - 缺省值为大端、无容量上限，与自由构造函数（`ByteBuffer::allocate` 等）的行为一致；
/// - 反序列化拒绝未知字段，拼写错误会直接暴露为 [`ConfigError`]。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct BufferConfig {
    pub byte_order: OrderPreference,
    pub max_capacity: Option<usize>,
}

impl BufferConfig {
    /// 以给定字节序构造配置。
    pub fn with_order(order: ByteOrder) -> Self {
        Self {
            byte_order: order.into(),
            ..Self::default()
        }
    }

    /// 解析出的具体字节序。
    pub const fn resolved_order(&self) -> ByteOrder {
        self.byte_order.resolve()
    }

    /// 从 TOML 文本加载配置。
    #[cfg(feature = "std")]
    pub fn from_toml_str(text: &str) -> core::result::Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    fn check_capacity(&self, bytes: usize) -> Result<()> {
        match self.max_capacity {
            Some(max) if bytes > max => Err(BufferError::InvalidArgument {
                name: "capacity",
                value: bytes,
                bound: max,
            }),
            _ => Ok(()),
        }
    }
}

/// 自由构造函数使用的字节序。
pub(crate) fn default_order() -> ByteOrder {
    BufferConfig::default().resolved_order()
}

/// 配置加载失败。
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid buffer config: {message}")]
    Parse { message: String },
}

impl ConfigError {
    pub const fn code(&self) -> &'static str {
        match self {
            ConfigError::Parse { .. } => "buffer.config_invalid",
        }
    }
}

/// `BufferAllocator` 是按配置分配缓冲的显式入口。
///
/// # 教案式说明
/// - **意图 (Why)**：把字节序与容量上限从全局状态中拿出来，由宿主在启动时构造一次、
///   再传给像素编解码器、网格构建器等消费者；
/// - **契约 (What)**：
///   - 产生的字节缓冲与外部句柄都以配置的字节序开始；
///   - 请求的字节数超过 `max_capacity` 时返回 `InvalidArgument`，不分配任何内存；
///   - 经由本分配器创建的 [`ForeignBuffer`] 在分配与释放时更新
///     [`external_stats`](Self::external_stats)；
/// - **执行 (How)**：分配器可廉价克隆，克隆体共享同一份外部账目。
#[derive(Clone, Debug, Default)]
pub struct BufferAllocator {
    config: BufferConfig,
    external: Arc<ExternalStats>,
}

impl BufferAllocator {
    pub fn new(config: BufferConfig) -> Self {
        Self {
            config,
            external: Arc::new(ExternalStats::default()),
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// 新缓冲的初始字节序。
    pub fn order(&self) -> ByteOrder {
        self.config.resolved_order()
    }

    /// 在堆上分配 `capacity` 字节。
    pub fn allocate(&self, capacity: usize) -> Result<ByteBuffer> {
        self.config.check_capacity(capacity)?;
        Ok(ByteBuffer::allocate_in(capacity, self.order()))
    }

    /// 接管 `bytes`，窗口覆盖整个数组。
    pub fn wrap(&self, bytes: Vec<u8>) -> Result<ByteBuffer> {
        self.config.check_capacity(bytes.len())?;
        Ok(ByteBuffer::wrap_in(bytes, self.order()))
    }

    /// 接管 `bytes`，窗口为 `[offset, offset + length)`。
    pub fn wrap_range(&self, bytes: Vec<u8>, offset: usize, length: usize) -> Result<ByteBuffer> {
        self.config.check_capacity(bytes.len())?;
        ByteBuffer::wrap_range_in(bytes, offset, length, self.order())
    }

    /// 分配地址稳定的外部存储，并计入外部账目。
    pub fn allocate_external(&self, len: usize) -> Result<ForeignBuffer> {
        self.config.check_capacity(len)?;
        Ok(ForeignBuffer::allocate_with(
            len,
            self.order(),
            Some(Arc::clone(&self.external)),
        ))
    }

    /// 独立分配 `capacity` 个元素；容量上限按字节计。
    pub fn allocate_elements<T: Element>(&self, capacity: usize) -> Result<TypedBuffer<T>> {
        let bytes = capacity.checked_mul(T::SIZE).ok_or(BufferError::InvalidArgument {
            name: "capacity",
            value: capacity,
            bound: usize::MAX / T::SIZE,
        })?;
        self.config.check_capacity(bytes)?;
        Ok(TypedBuffer::allocate(capacity))
    }

    /// 外部分配账目的当前快照。
    pub fn external_stats(&self) -> ExternalStatsSnapshot {
        self.external.snapshot()
    }
}
