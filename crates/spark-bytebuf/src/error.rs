//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 缓冲核心的所有失败只落入两个类别：取值越界（Range）与类型不符（Type），
//!   调用方据此决定“缩小尺寸重试”还是“直接拒绝输入”；
//! - 集中定义错误码，使日志与指标能够按 `<域>.<语义>` 聚合。
//!
//! ## 设计要求（What）
//! - [`BufferError`] 派生 `thiserror::Error`，消息格式保持稳定，便于排障比对；
//! - 每个变体都能通过 [`BufferError::kind`] 映射到 [`ErrorKind`]，且只存在这两种分类；
//! - 任何错误都是局部、可恢复的，不会触发 panic 或中止进程。

use std::borrow::Cow;

use thiserror::Error;

/// 稳定错误码集合。
///
/// # 契约说明（What）
/// - 命名遵循 `<领域>.<语义>`，与 [`BufferError::code`] 一一对应；
/// - 码值一经发布不再变更，新增语义只追加常量。
pub mod codes {
    /// 数值参数超出合法区间。
    pub const OUT_OF_RANGE: &str = "buffer.out_of_range";
    /// 访问超出缓冲边界。
    pub const OUT_OF_BOUNDS: &str = "buffer.out_of_bounds";
    /// 缓冲长度不是交换单元的整数倍。
    pub const INVALID_SIZE: &str = "buffer.invalid_size";
    /// 解码结果超过字符串上限。
    pub const STRING_TOO_LONG: &str = "buffer.string_too_long";
    /// 参数类型不符。
    pub const INVALID_ARG_TYPE: &str = "buffer.invalid_arg_type";
    /// 参数取值无法被接受（类型正确但内容非法）。
    pub const INVALID_ARG_VALUE: &str = "buffer.invalid_arg_value";
    /// 未知的文本编码标识。
    pub const UNKNOWN_ENCODING: &str = "buffer.unknown_encoding";
}

/// 错误分类：仅有越界与类型不符两种。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 类型正确，但取值超出其合法定义域。
    Range,
    /// 参数类型错误：不可转换的尺寸/偏移、非法接收者、未知编码、不支持的值类型。
    Type,
}

/// 缓冲核心错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把分配、视图、编解码、检索中的所有失败收敛为一个枚举，
///   调用方只需匹配 [`ErrorKind`] 即可完成重试/拒绝决策；
/// - **契约 (What)**：
///   - 所有变体均为 `Send + Sync + 'static`，可跨线程传播到宿主；
///   - `Display` 文本形如 `The value of "offset" is out of range. It must be ... Received ...`；
///   - 失败发生在任何可观测的写入之前（检索的“未命中”不属于错误）。
/// - **设计权衡 (Trade-offs)**：参数名使用 `Cow<'static, str>`，
///   常见路径零分配，`list[3]` 这类动态名称才落到堆上。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// 数值取值超出区间。
    #[error("The value of \"{name}\" is out of range. It must be {range}. Received {received}")]
    OutOfRange {
        name: Cow<'static, str>,
        range: String,
        received: String,
    },

    /// 访问越过缓冲末尾；`name` 为空时表示整体越界。
    #[error("{}", bounds_message(.name))]
    OutOfBounds { name: Option<&'static str> },

    /// 交换操作要求长度为单元宽度的整数倍。
    #[error("Buffer size must be a multiple of {bits}-bits")]
    InvalidBufferSize { bits: u8 },

    /// 解码结果超过 [`MAX_STRING_LENGTH`](crate::MAX_STRING_LENGTH)。
    #[error("Cannot create a string longer than 0x{max:x} characters")]
    StringTooLong { max: usize },

    /// 参数类型不符。
    #[error("The \"{name}\" argument must be {expected}. Received {received}")]
    InvalidArgType {
        name: Cow<'static, str>,
        expected: &'static str,
        received: String,
    },

    /// 参数类型正确但内容不可用，例如无法解码出任何字节的填充串。
    #[error("The argument '{name}' is invalid. Received {received}")]
    InvalidArgValue {
        name: &'static str,
        received: String,
    },

    /// 未识别的编码标识。
    #[error("Unknown encoding: {encoding}")]
    UnknownEncoding { encoding: String },
}

fn bounds_message(name: &Option<&'static str>) -> String {
    match name {
        Some(name) => format!("\"{name}\" is outside of buffer bounds"),
        None => "Attempt to access memory outside buffer bounds".to_owned(),
    }
}

impl BufferError {
    /// 返回错误分类。
    pub fn kind(&self) -> ErrorKind {
        match self {
            BufferError::OutOfRange { .. }
            | BufferError::OutOfBounds { .. }
            | BufferError::InvalidBufferSize { .. }
            | BufferError::StringTooLong { .. } => ErrorKind::Range,
            BufferError::InvalidArgType { .. }
            | BufferError::InvalidArgValue { .. }
            | BufferError::UnknownEncoding { .. } => ErrorKind::Type,
        }
    }

    /// 返回稳定错误码，供日志聚合使用。
    pub fn code(&self) -> &'static str {
        match self {
            BufferError::OutOfRange { .. } => codes::OUT_OF_RANGE,
            BufferError::OutOfBounds { .. } => codes::OUT_OF_BOUNDS,
            BufferError::InvalidBufferSize { .. } => codes::INVALID_SIZE,
            BufferError::StringTooLong { .. } => codes::STRING_TOO_LONG,
            BufferError::InvalidArgType { .. } => codes::INVALID_ARG_TYPE,
            BufferError::InvalidArgValue { .. } => codes::INVALID_ARG_VALUE,
            BufferError::UnknownEncoding { .. } => codes::UNKNOWN_ENCODING,
        }
    }

    /// 是否属于越界类错误。
    pub fn is_range(&self) -> bool {
        self.kind() == ErrorKind::Range
    }

    /// 是否属于类型类错误。
    pub fn is_type(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    pub(crate) fn out_of_range(
        name: impl Into<Cow<'static, str>>,
        range: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        BufferError::OutOfRange {
            name: name.into(),
            range: range.into(),
            received: received.into(),
        }
    }

    pub(crate) fn invalid_arg_type(
        name: impl Into<Cow<'static, str>>,
        expected: &'static str,
        received: impl Into<String>,
    ) -> Self {
        BufferError::InvalidArgType {
            name: name.into(),
            expected,
            received: received.into(),
        }
    }
}

/// 缓冲核心统一的返回值别名。
pub type Result<T, E = BufferError> = core::result::Result<T, E>;
