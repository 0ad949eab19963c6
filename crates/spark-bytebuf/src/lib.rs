#![deny(unsafe_code)]
#![doc = "spark-bytebuf: 池化字节缓冲、共享视图与数值/文本编解码核心。"]
#![doc = ""]
#![doc = "本 Crate 承载宿主运行时处理原始二进制数据（网络载荷、文件内容、密钥材料）的主缓冲类型。"]

//! # 模块定位（Why）
//! - 协议编解码、加密与文本工具都把缓冲当作不透明字节序列消费，
//!   它们依赖的是稳定的内存模型（池化分配、共享视图）与逐位精确的编解码；
//! - 本 Crate 只负责这一核心，上层协议与脚本引擎集成不在此处。
//!
//! # 模块划分（How）
//! - [`store`]：定长底层存储区 [`ByteStore`]，被所有视图以引用计数共享；
//! - [`view`]：`offset + length` 窗口 [`ByteView`]，承载下标访问、切片与复制；
//! - [`pool`]：显式分配上下文 [`BufferAllocator`]，小块请求从轮换的池 Arena 中切出；
//! - [`codec`]：定宽数值与文本编码的读写；
//! - [`search`]：前向/后向检索、字典序比较与相等判定；
//! - [`coerce`]/[`value`]：宿主动态值 [`HostValue`] 与统一的数值强制转换；
//! - [`error`]：只分 Range/Type 两类的 [`BufferError`]；
//! - [`config`]：可从 TOML 装载的 [`BufferConfig`]。
//!
//! # 线程模型（What）
//! - 所有类型刻意为 `!Send`：核心按“每实例单线程”运行，操作同步完成、无内部锁；
//! - 模块级便捷函数（[`alloc`]、[`alloc_unsafe`] 等）使用线程本地的默认分配器，
//!   因此每个线程天然持有独立的池游标。

pub mod codec;
pub mod coerce;
pub mod config;
pub mod error;
pub mod pool;
pub mod search;
pub mod store;
pub mod value;
pub mod view;

pub use codec::{ByteOrder, Encoding, IntFormat, byte_length, is_encoding};
pub use config::BufferConfig;
pub use error::{BufferError, ErrorKind, Result};
pub use pool::{BufferAllocator, PoolStats};
pub use search::compare;
pub use store::ByteStore;
pub use value::HostValue;
pub use view::ByteView;

/// 单个存储区的最大字节长度。
pub const MAX_LENGTH: usize = (u32::MAX as usize).saturating_add(1);

/// 解码结果允许的最大 UTF-16 码元数。
pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

/// `Debug` 输出中展示的最大字节数。
pub const INSPECT_MAX_BYTES: usize = 50;

/// 默认池容量（字节）。
pub const DEFAULT_POOL_SIZE: usize = 8 * 1024;

thread_local! {
    static DEFAULT_ALLOCATOR: BufferAllocator = BufferAllocator::new();
}

fn with_default<R>(f: impl FnOnce(&BufferAllocator) -> R) -> R {
    DEFAULT_ALLOCATOR.with(f)
}

/// 使用线程默认分配器执行清零分配，见 [`BufferAllocator::allocate_zeroed`]。
pub fn alloc(
    size: impl Into<HostValue>,
    fill: impl Into<HostValue>,
    encoding: Option<&str>,
) -> Result<ByteView> {
    with_default(|allocator| allocator.allocate_zeroed(size, fill, encoding))
}

/// 使用线程默认分配器执行池化分配，见 [`BufferAllocator::allocate`]。
pub fn alloc_unsafe(size: impl Into<HostValue>) -> Result<ByteView> {
    with_default(|allocator| allocator.allocate(size))
}

/// 使用线程默认分配器执行专用分配，见 [`BufferAllocator::allocate_dedicated`]。
pub fn alloc_unsafe_slow(size: impl Into<HostValue>) -> Result<ByteView> {
    with_default(|allocator| allocator.allocate_dedicated(size))
}

/// 线程默认分配器的池容量。
pub fn pool_size() -> usize {
    with_default(BufferAllocator::pool_size)
}

/// 修改线程默认分配器的池容量；只影响此后的分配。
pub fn set_pool_size(pool_size: usize) -> Result<()> {
    with_default(|allocator| allocator.set_pool_size(pool_size))
}

/// 使用线程默认分配器按值构造，见 [`BufferAllocator::from_value`]。
pub fn from_value(value: &HostValue, encoding: Option<&str>) -> Result<ByteView> {
    with_default(|allocator| allocator.from_value(value, encoding))
}

/// 使用线程默认分配器拼接视图，见 [`BufferAllocator::concat`]。
pub fn concat(list: &[ByteView], total_length: impl Into<HostValue>) -> Result<ByteView> {
    with_default(|allocator| allocator.concat(list, total_length))
}
