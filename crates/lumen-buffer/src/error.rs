//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为所有缓冲类型提供统一的失败语义：导航越界、读写溢出、只读违规、存储状态异常；
//! - 像素编解码、网格构建等上层消费者只需匹配 [`ErrorKind`] 即可决定处置方式，
//!   无需关心具体由哪一种缓冲产生。
//!
//! ## 设计要求（What）
//! - 所有失败均为本地、同步、不可由框架自行恢复的错误：框架不重试、不吞掉；
//! - 批量传输在搬运任何元素之前完成校验，失败时缓冲状态保持不变；
//! - 错误码遵循 `<领域>.<语义>` 约定，集中登记在 [`codes`] 中。

/// `BufferError` 是缓冲框架对外暴露的唯一错误类型。
///
/// # 教案式说明
/// - **意图 (Why)**：每个变体都携带足以排障的数值上下文（请求量、剩余量、索引与上限），
///   避免调用方再去回读缓冲状态；
/// - **契约 (What)**：
///   - 所有变体均满足 `Send + Sync + 'static`，且可 `Clone`，便于在测试中直接比较；
///   - [`kind`](Self::kind) 将变体归并到六类稳定语义，[`code`](Self::code) 返回稳定错误码；
/// - **设计权衡 (Trade-offs)**：不携带 `String`，构造零分配，适合在热路径频繁返回。
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// 导航或构造参数超出允许范围，例如 `limit > capacity`。
    #[error("invalid argument `{name}`: {value} exceeds bound {bound}")]
    InvalidArgument {
        name: &'static str,
        value: usize,
        bound: usize,
    },

    /// 绝对访问落在 `[0, limit)` 之外；`width` 为本次访问的元素跨度。
    #[error("index {index} with width {width} is out of range for limit {limit}")]
    IndexOutOfRange {
        index: usize,
        width: usize,
        limit: usize,
    },

    /// 相对或批量读取请求的元素多于 `remaining()`。
    #[error("buffer underflow: requested {requested}, remaining {remaining}")]
    Underflow { requested: usize, remaining: usize },

    /// 相对或批量写入请求的元素多于 `remaining()`。
    #[error("buffer overflow: requested {requested}, remaining {remaining}")]
    Overflow { requested: usize, remaining: usize },

    /// 在只读缓冲上执行了修改操作或请求了可写数组。
    #[error("buffer is read-only")]
    ReadOnly,

    /// 外部存储没有可暴露的后备数组。
    #[error("buffer is not backed by an accessible array")]
    NoBackingArray,

    /// `reset()` 时尚未设置 mark。
    #[error("reset requires a mark, but none is set")]
    MarkNotSet,

    /// 存储正被某个后备数组守卫独占借用。
    #[error("storage is exclusively borrowed through a backing array guard")]
    StorageBusy,

    /// 外部存储已被其所有者释放。
    #[error("external storage has been released by its owner")]
    StorageReleased,
}

/// 错误的稳定分类，对应框架对外承诺的六类失败语义。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    IndexOutOfRange,
    BufferUnderflow,
    BufferOverflow,
    UnsupportedOperation,
    InvalidState,
}

impl BufferError {
    /// 将具体变体归并为稳定分类。
    ///
    /// - `ReadOnly` 与 `NoBackingArray` 同属“不支持的操作”；
    /// - `MarkNotSet`、`StorageBusy`、`StorageReleased` 同属“状态非法”，
    ///   调用方通常需要调整调用顺序而不是重试。
    pub fn kind(&self) -> ErrorKind {
        match self {
            BufferError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            BufferError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            BufferError::Underflow { .. } => ErrorKind::BufferUnderflow,
            BufferError::Overflow { .. } => ErrorKind::BufferOverflow,
            BufferError::ReadOnly | BufferError::NoBackingArray => ErrorKind::UnsupportedOperation,
            BufferError::MarkNotSet | BufferError::StorageBusy | BufferError::StorageReleased => {
                ErrorKind::InvalidState
            }
        }
    }

    /// 返回稳定错误码，可直接写入日志字段或指标标签。
    pub fn code(&self) -> &'static str {
        match self {
            BufferError::InvalidArgument { .. } => codes::INVALID_ARGUMENT,
            BufferError::IndexOutOfRange { .. } => codes::INDEX_OUT_OF_RANGE,
            BufferError::Underflow { .. } => codes::UNDERFLOW,
            BufferError::Overflow { .. } => codes::OVERFLOW,
            BufferError::ReadOnly => codes::READ_ONLY,
            BufferError::NoBackingArray => codes::NO_BACKING_ARRAY,
            BufferError::MarkNotSet => codes::MARK_NOT_SET,
            BufferError::StorageBusy => codes::STORAGE_BUSY,
            BufferError::StorageReleased => codes::STORAGE_RELEASED,
        }
    }
}

/// 缓冲框架的稳定错误码。
///
/// # 契约说明（What）
/// - 码值一经发布不再修改，新增语义只追加新常量；
/// - 所有码值均以 `buffer.` 为前缀，便于在跨组件日志中聚合检索。
pub mod codes {
    /// 参数越界。
    pub const INVALID_ARGUMENT: &str = "buffer.invalid_argument";
    /// 绝对索引越界。
    pub const INDEX_OUT_OF_RANGE: &str = "buffer.index_out_of_range";
    /// 读取下溢。
    pub const UNDERFLOW: &str = "buffer.underflow";
    /// 写入上溢。
    pub const OVERFLOW: &str = "buffer.overflow";
    /// 只读缓冲拒绝修改。
    pub const READ_ONLY: &str = "buffer.read_only";
    /// 没有后备数组。
    pub const NO_BACKING_ARRAY: &str = "buffer.no_backing_array";
    /// 未设置 mark。
    pub const MARK_NOT_SET: &str = "buffer.mark_not_set";
    /// 存储被独占借用。
    pub const STORAGE_BUSY: &str = "buffer.storage_busy";
    /// 外部存储已释放。
    pub const STORAGE_RELEASED: &str = "buffer.storage_released";
}

/// 框架统一的 `Result` 别名。
pub type Result<T, E = BufferError> = core::result::Result<T, E>;

#[cfg(feature = "std")]
impl From<BufferError> for std::io::Error {
    fn from(err: BufferError) -> Self {
        let kind = match err.kind() {
            ErrorKind::InvalidArgument | ErrorKind::IndexOutOfRange => {
                std::io::ErrorKind::InvalidInput
            }
            ErrorKind::BufferUnderflow => std::io::ErrorKind::UnexpectedEof,
            ErrorKind::BufferOverflow => std::io::ErrorKind::WriteZero,
            ErrorKind::UnsupportedOperation => std::io::ErrorKind::Unsupported,
            ErrorKind::InvalidState => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 每个变体都应映射到预期分类，且错误码带统一前缀。
    #[test]
    fn variants_map_to_stable_kinds_and_codes() {
        let cases = [
            (
                BufferError::InvalidArgument {
                    name: "limit",
                    value: 9,
                    bound: 8,
                },
                ErrorKind::InvalidArgument,
            ),
            (
                BufferError::IndexOutOfRange {
                    index: 8,
                    width: 1,
                    limit: 8,
                },
                ErrorKind::IndexOutOfRange,
            ),
            (
                BufferError::Underflow {
                    requested: 4,
                    remaining: 0,
                },
                ErrorKind::BufferUnderflow,
            ),
            (
                BufferError::Overflow {
                    requested: 4,
                    remaining: 0,
                },
                ErrorKind::BufferOverflow,
            ),
            (BufferError::ReadOnly, ErrorKind::UnsupportedOperation),
            (BufferError::NoBackingArray, ErrorKind::UnsupportedOperation),
            (BufferError::MarkNotSet, ErrorKind::InvalidState),
            (BufferError::StorageBusy, ErrorKind::InvalidState),
            (BufferError::StorageReleased, ErrorKind::InvalidState),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err} 的分类不符合预期");
            assert!(err.code().starts_with("buffer."));
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn converts_into_io_error_with_matching_kind() {
        let io: std::io::Error = BufferError::Underflow {
            requested: 2,
            remaining: 1,
        }
        .into();
        assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
        assert!(io.to_string().contains("requested 2"));
    }
}
