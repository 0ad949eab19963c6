use std::{cell::Cell, fmt, rc::Rc};

use crate::{
    MAX_LENGTH,
    error::{BufferError, Result},
};

/// `ByteStore` 是定长的底层内存区域，由所有引用它的视图共享。
///
/// # 设计动机（Why）
/// - 多个视图（切片、子数组、池内分配）需要别名同一块内存，并且通过任意视图写入的字节
///   都要对其它视图立即可见，不存在写时复制；
/// - 借助 `Rc<[Cell<u8>]>`，别名写入在安全 Rust 中成立，且当最后一个持有者释放时内存自动回收。
///
/// # 契约说明（What）
/// - 长度在创建后固定；克隆只增加引用计数，不复制字节；
/// - 类型刻意为 `!Send + !Sync`：核心按“每实例单线程”运行，跨线程共享需要宿主在外部串行化。
///
/// # 风险提示（Trade-offs）
/// - `Cell` 逐字节访问无法直接借出 `&[u8]`，批量读取需要复制；
///   换来的是无需 `unsafe` 即可表达任意重叠的别名写入。
#[derive(Clone)]
pub struct ByteStore {
    cells: Rc<[Cell<u8>]>,
}

impl ByteStore {
    /// 创建全零的存储区。
    pub fn new(len: usize) -> Result<Self> {
        check_length(len)?;
        Ok(Self::zeroed(len))
    }

    /// 从拥有所有权的字节向量创建存储区（外部内存包装的入口）。
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        check_length(bytes.len())?;
        Ok(Self::from_bytes_unchecked(&bytes))
    }

    pub(crate) fn zeroed(len: usize) -> Self {
        Self {
            cells: std::iter::repeat_with(|| Cell::new(0)).take(len).collect(),
        }
    }

    pub(crate) fn from_bytes_unchecked(bytes: &[u8]) -> Self {
        Self {
            cells: bytes.iter().copied().map(Cell::new).collect(),
        }
    }

    /// 存储区的字节长度。
    pub fn byte_length(&self) -> usize {
        self.cells.len()
    }

    /// 当前共享该存储区的句柄数量（视图与存储句柄本身）。
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.cells)
    }

    /// 两个句柄是否指向同一块内存。
    pub fn ptr_eq(&self, other: &ByteStore) -> bool {
        Rc::ptr_eq(&self.cells, &other.cells)
    }

    /// 复制全部字节。
    pub fn to_vec(&self) -> Vec<u8> {
        self.cells.iter().map(Cell::get).collect()
    }

    pub(crate) fn cells(&self) -> &[Cell<u8>] {
        &self.cells
    }
}

impl fmt::Debug for ByteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStore")
            .field("byte_length", &self.byte_length())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

fn check_length(len: usize) -> Result<()> {
    if len > MAX_LENGTH {
        return Err(BufferError::out_of_range(
            "size",
            format!(">= 0 && <= {MAX_LENGTH}"),
            len.to_string(),
        ));
    }
    Ok(())
}
