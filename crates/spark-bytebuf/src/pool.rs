use std::cell::{Cell, RefCell};

use tracing::{debug, trace};

use crate::{
    MAX_LENGTH,
    codec::Encoding,
    coerce::{validate_integer, validate_size},
    config::BufferConfig,
    error::{BufferError, Result},
    store::ByteStore,
    value::HostValue,
    view::{ByteView, array_like_bytes},
};

/// `BufferAllocator` 是缓冲的分配上下文：持有池 Arena、游标与可变的池容量设置。
///
/// # 模块角色（Why）
/// - 小块分配频繁且短命，逐个向系统申请内存代价高；池化路径从一块共享 Arena 中切出窗口，
///   把分配成本摊薄为一次游标推进；
/// - 游标是会被每次池化分配修改的共享状态，以显式上下文对象承载而不是隐藏的全局单例，
///   宿主可以为每个运行时实例（或每个线程）各持有一个分配器。
///
/// # 核心机制（How）
/// - 请求尺寸小于 `pool_size / 2` 时走池化路径：当前 Arena 剩余空间不足则整块换新，
///   否则在游标处切出视图，并把游标按 `pool_alignment` 向上对齐；
/// - 更大的请求、显式的专用分配与清零分配都创建独立存储区；
/// - `PoolMetrics` 以 `Cell` 计数记录 Arena 轮换、池化/专用分配次数与字节数，支撑 [`PoolStats`] 快照。
///
/// # 契约说明（What）
/// - **别名**：同一 Arena 中切出的视图区间互不重叠，彼此永不别名；
/// - **不清零**：池化分配不做清零，字节为 Arena 先前的内容；
/// - **配置生效时机**：修改池容量只影响此后的分配，已经切出的视图不受影响；
/// - **线程模型**：类型为 `!Send`，宿主需要为每个线程持有独立实例或在外部串行化访问。
///
/// # 设计权衡（Trade-offs）
/// - Arena 只前进不回收，被切出的视图会让整块 Arena 存活到最后一个视图释放为止；
///   这是池化的固有代价，需要长期持有小块数据时应使用 [`BufferAllocator::allocate_dedicated`]。
#[derive(Debug)]
pub struct BufferAllocator {
    pool_size: Cell<usize>,
    alignment: usize,
    arena: RefCell<PoolArena>,
    metrics: PoolMetrics,
}

/// 分配器统计快照。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 当前池容量设置。
    pub pool_size: usize,
    /// 当前 Arena 的容量（尚未创建时为 0）。
    pub arena_capacity: usize,
    /// 当前 Arena 的游标位置。
    pub arena_offset: usize,
    /// 累计创建的 Arena 数量。
    pub arenas_created: u64,
    /// 累计池化分配次数。
    pub pooled_allocations: u64,
    /// 累计专用分配次数。
    pub dedicated_allocations: u64,
    /// 累计池化分配字节数。
    pub pooled_bytes: u64,
    /// 累计专用分配字节数。
    pub dedicated_bytes: u64,
}

#[derive(Debug)]
struct PoolArena {
    store: ByteStore,
    cursor: usize,
}

impl PoolArena {
    fn unallocated() -> Self {
        Self {
            store: ByteStore::zeroed(0),
            cursor: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.store.byte_length().saturating_sub(self.cursor)
    }
}

#[derive(Debug, Default)]
struct PoolMetrics {
    arenas_created: Cell<u64>,
    pooled_allocations: Cell<u64>,
    dedicated_allocations: Cell<u64>,
    pooled_bytes: Cell<u64>,
    dedicated_bytes: Cell<u64>,
}

impl PoolMetrics {
    fn on_arena_created(&self) {
        bump(&self.arenas_created, 1);
    }

    fn on_pooled(&self, size: usize) {
        bump(&self.pooled_allocations, 1);
        bump(&self.pooled_bytes, size as u64);
    }

    fn on_dedicated(&self, size: usize) {
        bump(&self.dedicated_allocations, 1);
        bump(&self.dedicated_bytes, size as u64);
    }
}

fn bump(counter: &Cell<u64>, value: u64) {
    counter.set(counter.get().saturating_add(value));
}

impl Default for BufferAllocator {
    fn default() -> Self {
        let config = BufferConfig::default();
        Self {
            pool_size: Cell::new(config.pool_size),
            alignment: config.pool_alignment,
            arena: RefCell::new(PoolArena::unallocated()),
            metrics: PoolMetrics::default(),
        }
    }
}

impl BufferAllocator {
    /// 使用默认配置创建分配器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用给定配置创建分配器；配置非法时返回 Range 类错误。
    pub fn with_config(config: &BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool_size: Cell::new(config.pool_size),
            alignment: config.pool_alignment,
            arena: RefCell::new(PoolArena::unallocated()),
            metrics: PoolMetrics::default(),
        })
    }

    /// 当前池容量设置。
    pub fn pool_size(&self) -> usize {
        self.pool_size.get()
    }

    /// 修改池容量；只影响此后的分配。
    pub fn set_pool_size(&self, pool_size: usize) -> Result<()> {
        if pool_size > MAX_LENGTH {
            return Err(BufferError::out_of_range(
                "poolSize",
                format!(">= 0 && <= {MAX_LENGTH}"),
                pool_size.to_string(),
            ));
        }
        debug!(
            previous = self.pool_size.get(),
            pool_size, "buffer pool size updated"
        );
        self.pool_size.set(pool_size);
        Ok(())
    }

    /// 池化分配：不清零，可能与其它小块分配共享同一 Arena（但区间互不重叠）。
    ///
    /// # 契约说明
    /// - `size` 必须是 `[0, MAX_LENGTH]` 内的整数，否则返回 Range 类错误；非数值返回 Type 类错误；
    /// - 零尺寸返回合法的零长度视图。
    pub fn allocate(&self, size: impl Into<HostValue>) -> Result<ByteView> {
        let size = validate_size(&size.into())?;
        Ok(self.allocate_unchecked(size))
    }

    /// 清零分配：总是创建独立存储区，并可按填充语义写入 `fill`。
    ///
    /// `fill` 缺省或为 0 时保持全零；`encoding` 仅在 `fill` 为文本时生效。
    pub fn allocate_zeroed(
        &self,
        size: impl Into<HostValue>,
        fill: impl Into<HostValue>,
        encoding: Option<&str>,
    ) -> Result<ByteView> {
        let size = validate_size(&size.into())?;
        let fill = fill.into();
        let view = self.dedicated(size);
        let zero_fill = matches!(fill, HostValue::Undefined)
            || matches!(fill, HostValue::Number(n) if n == 0.0);
        if !zero_fill && size > 0 {
            view.fill(fill, (), (), encoding)?;
        }
        Ok(view)
    }

    /// 专用分配：绕过池化路径；零尺寸同样返回合法视图。
    pub fn allocate_dedicated(&self, size: impl Into<HostValue>) -> Result<ByteView> {
        let size = validate_size(&size.into())?;
        Ok(self.dedicated(size))
    }

    /// 复制字节序列，走与 [`BufferAllocator::allocate`] 相同的池化判定。
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<ByteView> {
        check_copy_length(bytes.len())?;
        let view = self.allocate_unchecked(bytes.len());
        view.write_bytes(0, bytes);
        Ok(view)
    }

    /// 复制已有视图的内容，结果与源视图不再别名。
    pub fn from_view(&self, source: &ByteView) -> Result<ByteView> {
        self.from_bytes(&source.to_vec())
    }

    /// 从类数组构造：元素逐项转换为数值并按模 256 折叠。
    pub fn from_array_like(&self, items: &[HostValue]) -> Result<ByteView> {
        let bytes = array_like_bytes(items)?;
        self.from_bytes(&bytes)
    }

    /// 按编码把文本转换为字节；编码缺省为 utf8，未知编码返回 Type 类错误。
    pub fn from_string(&self, text: &str, encoding: Option<&str>) -> Result<ByteView> {
        let encoding = Encoding::resolve(encoding)?;
        if text.is_empty() {
            return Ok(ByteView::empty());
        }
        let bytes = encoding.encode(text);
        self.from_bytes(&bytes)
    }

    /// 按值的类型分派到对应的构造路径。
    ///
    /// 数值不是合法输入（它表达的是尺寸而不是内容），返回 Type 类错误。
    pub fn from_value(&self, value: &HostValue, encoding: Option<&str>) -> Result<ByteView> {
        match value {
            HostValue::String(text) => self.from_string(text, encoding),
            HostValue::Bytes(view) => self.from_view(view),
            HostValue::Array(items) => self.from_array_like(items),
            HostValue::Number(_) => Err(BufferError::invalid_arg_type(
                "value",
                "not of type number",
                value.describe(),
            )),
            other => Err(BufferError::invalid_arg_type(
                "value",
                "of type string, Buffer, or Array",
                other.describe(),
            )),
        }
    }

    /// 零拷贝包装外部存储区，见 [`ByteView::from_store`]。
    pub fn from_store(
        &self,
        store: &ByteStore,
        byte_offset: impl Into<HostValue>,
        length: impl Into<HostValue>,
    ) -> Result<ByteView> {
        ByteView::from_store(store, byte_offset, length)
    }

    /// 顺序拼接多个视图。
    ///
    /// # 契约说明
    /// - `total_length` 缺省时取各视图长度之和；显式给出时截断超出部分，不足部分补零；
    /// - 空列表返回零长度视图。
    pub fn concat(&self, list: &[ByteView], total_length: impl Into<HostValue>) -> Result<ByteView> {
        if list.is_empty() {
            return Ok(ByteView::empty());
        }
        let total_length = total_length.into();
        let length = if total_length.is_undefined() {
            let sum = list.iter().map(ByteView::len).sum::<usize>();
            check_copy_length(sum)?;
            sum
        } else {
            validate_integer(&total_length, "length", 0, MAX_LENGTH)?
        };

        let joined = self.allocate_unchecked(length);
        let mut pos = 0;
        for view in list {
            pos += view.copy_clamped(&joined, pos, 0, view.len());
        }
        if pos < length {
            joined.write_bytes(pos, &vec![0; length - pos]);
        }
        Ok(joined)
    }

    /// 统计快照。
    pub fn statistics(&self) -> PoolStats {
        let arena = self.arena.borrow();
        PoolStats {
            pool_size: self.pool_size.get(),
            arena_capacity: arena.store.byte_length(),
            arena_offset: arena.cursor,
            arenas_created: self.metrics.arenas_created.get(),
            pooled_allocations: self.metrics.pooled_allocations.get(),
            dedicated_allocations: self.metrics.dedicated_allocations.get(),
            pooled_bytes: self.metrics.pooled_bytes.get(),
            dedicated_bytes: self.metrics.dedicated_bytes.get(),
        }
    }

    /// 已校验尺寸后的池化判定。
    fn allocate_unchecked(&self, size: usize) -> ByteView {
        if size == 0 {
            return ByteView::empty();
        }
        if size < self.pool_size.get() >> 1 {
            self.carve(size)
        } else {
            self.dedicated(size)
        }
    }

    fn carve(&self, size: usize) -> ByteView {
        let mut arena = self.arena.borrow_mut();
        if size > arena.remaining() {
            *arena = self.create_arena();
        }
        let view = ByteView::from_parts(arena.store.clone(), arena.cursor, size);
        arena.cursor = align_up(arena.cursor + size, self.alignment);
        self.metrics.on_pooled(size);
        view
    }

    fn create_arena(&self) -> PoolArena {
        let pool_size = self.pool_size.get();
        self.metrics.on_arena_created();
        debug!(
            pool_size,
            arenas_created = self.metrics.arenas_created.get(),
            "buffer pool arena created"
        );
        PoolArena {
            store: ByteStore::zeroed(pool_size),
            cursor: 0,
        }
    }

    fn dedicated(&self, size: usize) -> ByteView {
        trace!(size, "dedicated buffer allocation");
        self.metrics.on_dedicated(size);
        ByteView::from_parts(ByteStore::zeroed(size), 0, size)
    }
}

fn align_up(value: usize, alignment: usize) -> usize {
    let mask = alignment - 1;
    value.saturating_add(mask) & !mask
}

fn check_copy_length(len: usize) -> Result<()> {
    if len > MAX_LENGTH {
        return Err(BufferError::out_of_range(
            "length",
            format!(">= 0 && <= {MAX_LENGTH}"),
            len.to_string(),
        ));
    }
    Ok(())
}
