use std::{cell::Cell, fmt};

use bytes::Bytes;

use crate::{
    INSPECT_MAX_BYTES,
    coerce::{self, loose_integer, relative_index, to_integer_or_infinity, to_number, to_uint8},
    error::{BufferError, Result},
    store::ByteStore,
    value::{HostValue, format_number},
};

/// `ByteView` 是覆盖在 [`ByteStore`] 之上的 `offset + length` 窗口，是所有缓冲操作的寻址单元。
///
/// # 设计动机（Why）
/// - 分配、切片、池内划分都只产生新的窗口，不复制字节；同一存储区上的所有窗口互为别名，
///   通过任一窗口的写入对其它窗口立即可见，且在任意层级的嵌套派生中保持成立；
/// - 窗口持有存储区句柄，因此最后一个窗口释放时存储区随之回收。
///
/// # 契约说明（What）
/// - 不变量：`byte_offset + len <= store.byte_length()`，由所有构造路径保证；
/// - 下标读取越界返回 `None`；下标写入越界被忽略，永不扩展长度；
/// - 克隆视图只复制窗口描述，仍然别名同一块内存。
#[derive(Clone)]
pub struct ByteView {
    store: ByteStore,
    offset: usize,
    len: usize,
}

impl ByteView {
    pub(crate) fn from_parts(store: ByteStore, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= store.byte_length());
        Self { store, offset, len }
    }

    /// 零长度视图，拥有独立的空存储区。
    pub fn empty() -> Self {
        Self::from_parts(ByteStore::zeroed(0), 0, 0)
    }

    /// 零拷贝包装外部持有的存储区，可选偏移与长度窗口。
    ///
    /// # 契约说明
    /// - `byte_offset` 缺省或为 `NaN` 时取 0，负数或超过存储区长度时返回 Range 类错误；
    /// - `length` 缺省时覆盖剩余全部字节；非正值得到零长度视图；超出剩余字节时返回 Range 类错误。
    pub fn from_store(
        store: &ByteStore,
        byte_offset: impl Into<HostValue>,
        length: impl Into<HostValue>,
    ) -> Result<Self> {
        let max = store.byte_length();
        let byte_offset = byte_offset.into();
        let offset = if byte_offset.is_undefined() {
            0.0
        } else {
            to_integer_or_infinity(&byte_offset)?
        };
        if offset < 0.0 || offset > max as f64 {
            return Err(BufferError::OutOfBounds {
                name: Some("offset"),
            });
        }
        let offset = offset as usize;

        let length = length.into();
        let len = if length.is_undefined() {
            max - offset
        } else {
            let requested = to_integer_or_infinity(&length)?;
            if requested <= 0.0 {
                0
            } else if requested > (max - offset) as f64 {
                return Err(BufferError::OutOfBounds {
                    name: Some("length"),
                });
            } else {
                requested as usize
            }
        };
        Ok(Self::from_parts(store.clone(), offset, len))
    }

    /// 视图长度。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否为零长度。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 视图在存储区中的起始偏移。
    pub fn byte_offset(&self) -> usize {
        self.offset
    }

    /// 底层存储区句柄。
    pub fn store(&self) -> &ByteStore {
        &self.store
    }

    /// 两个视图是否别名同一存储区。
    pub fn shares_store_with(&self, other: &ByteView) -> bool {
        self.store.ptr_eq(&other.store)
    }

    /// 读取单个字节；越界返回 `None`。
    pub fn get(&self, index: usize) -> Option<u8> {
        self.cells().get(index).map(Cell::get)
    }

    /// 写入单个字节。
    ///
    /// 值先经 [`to_number`] 转换再按模 256 折叠；下标越界时静默忽略，
    /// 但不可转换的值仍返回 Type 类错误。
    pub fn set(&self, index: usize, value: impl Into<HostValue>) -> Result<()> {
        let byte = to_uint8(to_number(&value.into())?);
        if let Some(cell) = self.cells().get(index) {
            cell.set(byte);
        }
        Ok(())
    }

    /// 复制视图内容。
    pub fn to_vec(&self) -> Vec<u8> {
        self.cells().iter().map(Cell::get).collect()
    }

    /// 复制视图内容为 `bytes::Bytes`，供协议层等协作方消费。
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_vec())
    }

    /// 逐字节迭代（读取发生在迭代时刻）。
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells().iter().map(Cell::get)
    }

    /// 派生共享存储区的子视图；与 [`ByteView::subarray`] 语义相同。
    pub fn slice(&self, start: impl Into<HostValue>, end: impl Into<HostValue>) -> ByteView {
        self.subarray(start, end)
    }

    /// 派生共享存储区的子视图。
    ///
    /// # 契约说明
    /// - 负下标自尾部回数，结果夹取到 `[0, len]`，从不失败；
    /// - `start > end` 时得到合法的零长度视图；
    /// - 不复制任何字节，别名关系在多层嵌套派生中传递。
    pub fn subarray(&self, start: impl Into<HostValue>, end: impl Into<HostValue>) -> ByteView {
        let start = relative_index(&start.into(), self.len);
        let end = end.into();
        let end = if end.is_undefined() {
            self.len
        } else {
            relative_index(&end, self.len)
        };
        let len = end.saturating_sub(start);
        Self::from_parts(self.store.clone(), self.offset + start, len)
    }

    /// 以结构化方式对任意接收者执行切片。
    ///
    /// - 字节视图：共享存储区的子视图；
    /// - 类数组：先按元素转换为独立存储区，再切片；
    /// - 其它值：Type 类错误。
    pub fn slice_of(
        this: &HostValue,
        start: impl Into<HostValue>,
        end: impl Into<HostValue>,
    ) -> Result<ByteView> {
        match this {
            HostValue::Bytes(view) => Ok(view.subarray(start, end)),
            HostValue::Array(items) => {
                let bytes = array_like_bytes(items)?;
                Ok(ByteView::from(bytes).subarray(start, end))
            }
            other => Err(BufferError::invalid_arg_type(
                "this",
                "an instance of Buffer or an array-like object",
                other.describe(),
            )),
        }
    }

    /// 把本视图的 `[source_start, source_end)` 复制到 `target` 的 `target_start` 处，返回复制字节数。
    ///
    /// # 契约说明
    /// - 源与目标可以别名同一存储区（包括重叠区间），语义等同 `memmove`；
    /// - 复制长度被截断到目标剩余空间与源剩余字节；
    /// - `target_start`/`source_end` 为负、`source_start` 越过源长度时返回 Range 类错误。
    pub fn copy(
        &self,
        target: &ByteView,
        target_start: impl Into<HostValue>,
        source_start: impl Into<HostValue>,
        source_end: impl Into<HostValue>,
    ) -> Result<usize> {
        let target_start = target_start.into();
        let target_start = if target_start.is_undefined() {
            0.0
        } else {
            loose_integer(&target_start, 0.0)
        };
        if target_start < 0.0 {
            return Err(BufferError::out_of_range(
                "targetStart",
                ">= 0",
                format_number(target_start),
            ));
        }

        let source_start = source_start.into();
        let source_start = if source_start.is_undefined() {
            0.0
        } else {
            loose_integer(&source_start, 0.0)
        };
        if source_start < 0.0 || source_start > self.len as f64 {
            return Err(BufferError::out_of_range(
                "sourceStart",
                format!(">= 0 && <= {}", self.len),
                format_number(source_start),
            ));
        }

        let source_end = source_end.into();
        let source_end = if source_end.is_undefined() {
            self.len as f64
        } else {
            loose_integer(&source_end, 0.0)
        };
        if source_end < 0.0 {
            return Err(BufferError::out_of_range(
                "sourceEnd",
                ">= 0",
                format_number(source_end),
            ));
        }

        if target_start >= target.len as f64 || source_start >= source_end {
            return Ok(0);
        }
        Ok(self.copy_clamped(
            target,
            target_start as usize,
            source_start as usize,
            source_end.min(self.len as f64) as usize,
        ))
    }

    /// 已校验参数后的实际复制；返回复制字节数。
    pub(crate) fn copy_clamped(
        &self,
        target: &ByteView,
        target_start: usize,
        source_start: usize,
        source_end: usize,
    ) -> usize {
        let room = target.len.saturating_sub(target_start);
        let count = source_end
            .saturating_sub(source_start)
            .min(room)
            .min(self.len.saturating_sub(source_start));
        if count == 0 {
            return 0;
        }
        // 先落到临时区，重叠区间也能得到 memmove 语义。
        let staged: Vec<u8> = self.cells()[source_start..source_start + count]
            .iter()
            .map(Cell::get)
            .collect();
        target.write_bytes(target_start, &staged);
        count
    }

    /// 以 16 位为单元原地交换字节序。
    pub fn swap16(&self) -> Result<&Self> {
        self.swap_units(2)
    }

    /// 以 32 位为单元原地交换字节序。
    pub fn swap32(&self) -> Result<&Self> {
        self.swap_units(4)
    }

    /// 以 64 位为单元原地交换字节序。
    pub fn swap64(&self) -> Result<&Self> {
        self.swap_units(8)
    }

    fn swap_units(&self, width: usize) -> Result<&Self> {
        if self.len % width != 0 {
            return Err(BufferError::InvalidBufferSize {
                bits: (width * 8) as u8,
            });
        }
        for unit in self.cells().chunks_exact(width) {
            for i in 0..width / 2 {
                unit[i].swap(&unit[width - 1 - i]);
            }
        }
        Ok(self)
    }

    pub(crate) fn cells(&self) -> &[Cell<u8>] {
        &self.store.cells()[self.offset..self.offset + self.len]
    }

    /// 从 `start` 起写入 `src`；调用方保证不越界。
    pub(crate) fn write_bytes(&self, start: usize, src: &[u8]) {
        for (cell, byte) in self.cells()[start..start + src.len()].iter().zip(src) {
            cell.set(*byte);
        }
    }

    /// 复制 `[start, end)` 区间；调用方保证不越界。
    pub(crate) fn read_range(&self, start: usize, end: usize) -> Vec<u8> {
        self.cells()[start..end].iter().map(Cell::get).collect()
    }
}

/// 把类数组元素转换为字节：逐项 [`to_number`] 后按模 256 折叠。
pub(crate) fn array_like_bytes(items: &[HostValue]) -> Result<Vec<u8>> {
    items
        .iter()
        .map(|item| coerce::to_number(item).map(to_uint8))
        .collect()
}

impl Default for ByteView {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self::from_parts(ByteStore::from_bytes_unchecked(&bytes), 0, len)
    }
}

impl From<&[u8]> for ByteView {
    fn from(bytes: &[u8]) -> Self {
        Self::from_parts(ByteStore::from_bytes_unchecked(bytes), 0, bytes.len())
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        Self::from(bytes.as_ref())
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.len.min(INSPECT_MAX_BYTES);
        let hex: Vec<String> = self
            .cells()
            .iter()
            .take(shown)
            .map(|cell| format!("{:02x}", cell.get()))
            .collect();
        write!(f, "<Buffer {}", hex.join(" "))?;
        let remaining = self.len - shown;
        if remaining > 0 {
            let plural = if remaining > 1 { "s" } else { "" };
            write!(f, " ... {remaining} more byte{plural}")?;
        }
        f.write_str(">")
    }
}
