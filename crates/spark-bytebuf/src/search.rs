//! 检索与比较引擎。
//!
//! # 设计背景（Why）
//! - 检索目标是多态的（单字节数值、按编码解释的文本、另一个视图），
//!   先经 `Needle::normalize` 统一为字节序列，再交给同一套前向/后向扫描；
//! - 起始偏移的解析规则集中在 `resolve_start`：负值自尾部回数，越界时按方向决定
//!   “从头搜索”“未命中”或“夹到末尾”，因此检索永不因偏移报错。
//!
//! # 契约说明（What）
//! - 空目标总是命中：前向返回夹取后的起点（缺省 0），后向缺省返回视图长度；
//! - utf16le 目标按 2 字节码元在偶数偏移上匹配，起点向下取偶；
//! - 比较按无符号字节逐位进行，公共前缀相同时较短者更小。

use std::cmp::Ordering;

use crate::{
    MAX_LENGTH,
    codec::Encoding,
    coerce::{to_number, to_uint8, validate_integer},
    error::{BufferError, Result},
    value::HostValue,
    view::ByteView,
};

const OFFSET_MAX: f64 = 2_147_483_647.0;
const OFFSET_MIN: f64 = -2_147_483_648.0;

/// 归一化后的检索目标。
enum Needle {
    /// 单字节数值。
    Byte(u8),
    /// 字节序列；`wide` 表示按 2 字节码元匹配。
    Bytes { bytes: Vec<u8>, wide: bool },
}

impl Needle {
    fn normalize(value: &HostValue, encoding: Encoding) -> Result<Self> {
        match value {
            HostValue::Number(n) => Ok(Needle::Byte(to_uint8(*n))),
            HostValue::String(text) => Ok(Needle::Bytes {
                bytes: encoding.encode(text),
                wide: encoding == Encoding::Utf16Le,
            }),
            HostValue::Bytes(view) => Ok(Needle::Bytes {
                bytes: view.to_vec(),
                wide: encoding == Encoding::Utf16Le,
            }),
            other => Err(BufferError::invalid_arg_type(
                "value",
                "of type number or string or an instance of Buffer",
                other.describe(),
            )),
        }
    }

    fn len(&self) -> usize {
        match self {
            Needle::Byte(_) => 1,
            Needle::Bytes { bytes, .. } => bytes.len(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl ByteView {
    /// 自 `byte_offset` 起前向检索，返回首个命中的偏移。
    ///
    /// `byte_offset` 缺省或不可解析时为 0；负值自尾部回数；编码缺省为 utf8。
    pub fn index_of(
        &self,
        needle: impl Into<HostValue>,
        byte_offset: impl Into<HostValue>,
        encoding: Option<&str>,
    ) -> Result<Option<usize>> {
        self.search(&needle.into(), &byte_offset.into(), encoding, Direction::Forward)
    }

    /// 自 `byte_offset` 起后向检索，返回最后一个起点不超过该偏移的命中。
    ///
    /// `byte_offset` 缺省或不可解析时为视图长度。
    pub fn last_index_of(
        &self,
        needle: impl Into<HostValue>,
        byte_offset: impl Into<HostValue>,
        encoding: Option<&str>,
    ) -> Result<Option<usize>> {
        self.search(&needle.into(), &byte_offset.into(), encoding, Direction::Backward)
    }

    /// 是否包含目标，等价于 `index_of(..).is_some()`。
    pub fn includes(
        &self,
        needle: impl Into<HostValue>,
        byte_offset: impl Into<HostValue>,
        encoding: Option<&str>,
    ) -> Result<bool> {
        self.index_of(needle, byte_offset, encoding)
            .map(|found| found.is_some())
    }

    fn search(
        &self,
        needle: &HostValue,
        byte_offset: &HostValue,
        encoding: Option<&str>,
        direction: Direction,
    ) -> Result<Option<usize>> {
        let encoding = Encoding::resolve(encoding)?;
        let needle = Needle::normalize(needle, encoding)?;

        let offset = to_number(byte_offset).unwrap_or(f64::NAN);
        let offset = if offset.is_nan() {
            match direction {
                Direction::Forward => 0,
                Direction::Backward => self.len() as i64,
            }
        } else {
            offset.clamp(OFFSET_MIN, OFFSET_MAX).trunc() as i64
        };

        let start = resolve_start(self.len(), offset, needle.len(), direction);
        let haystack = self.to_vec();
        match needle {
            Needle::Byte(byte) => {
                let Some(start) = start.filter(|_| !haystack.is_empty()) else {
                    return Ok(None);
                };
                Ok(match direction {
                    Direction::Forward => haystack[start..]
                        .iter()
                        .position(|b| *b == byte)
                        .map(|pos| start + pos),
                    Direction::Backward => haystack[..=start].iter().rposition(|b| *b == byte),
                })
            }
            Needle::Bytes { bytes, wide } => {
                if bytes.is_empty() {
                    return Ok(start);
                }
                let Some(start) = start else {
                    return Ok(None);
                };
                if haystack.is_empty()
                    || bytes.len() > haystack.len()
                    || (direction == Direction::Forward && start + bytes.len() > haystack.len())
                {
                    return Ok(None);
                }
                if wide {
                    if haystack.len() < 2 || bytes.len() < 2 {
                        return Ok(None);
                    }
                    let hay_units = units(&haystack);
                    let needle_units = units(&bytes);
                    Ok(find(&hay_units, &needle_units, start / 2, direction).map(|unit| unit * 2))
                } else {
                    Ok(find(&haystack, &bytes, start, direction))
                }
            }
        }
    }

    /// 比较两个区间：`self[source_start..source_end]` 对 `target[target_start..target_end]`。
    ///
    /// # 契约说明
    /// - 起点缺省为 0，终点缺省为各自长度；起点只要求是非负整数，可以越过长度（视为空区间）；
    ///   终点超出对应视图长度返回 Range 类错误，非数值参数返回 Type 类错误；
    /// - 空区间小于任何非空区间，两个空区间相等。
    pub fn compare_range(
        &self,
        target: &ByteView,
        target_start: impl Into<HostValue>,
        target_end: impl Into<HostValue>,
        source_start: impl Into<HostValue>,
        source_end: impl Into<HostValue>,
    ) -> Result<Ordering> {
        let target_start = bound_or(target_start.into(), "targetStart", MAX_LENGTH, 0)?;
        let target_end = bound_or(target_end.into(), "targetEnd", target.len(), target.len())?;
        let source_start = bound_or(source_start.into(), "sourceStart", MAX_LENGTH, 0)?;
        let source_end = bound_or(source_end.into(), "sourceEnd", self.len(), self.len())?;

        if source_start >= source_end {
            return Ok(if target_start >= target_end {
                Ordering::Equal
            } else {
                Ordering::Less
            });
        }
        if target_start >= target_end {
            return Ok(Ordering::Greater);
        }
        let source = self.read_range(source_start, source_end);
        let target = target.read_range(target_start, target_end);
        Ok(source.cmp(&target))
    }

    /// 内容是否逐字节相等。
    pub fn equals(&self, other: &ByteView) -> bool {
        self.len() == other.len() && compare(self, other) == Ordering::Equal
    }
}

/// 按无符号字节字典序比较两个视图，公共前缀相同时较短者更小。
pub fn compare(a: &ByteView, b: &ByteView) -> Ordering {
    a.iter().cmp(b.iter())
}

fn bound_or(value: HostValue, name: &'static str, max: usize, default: usize) -> Result<usize> {
    if value.is_undefined() {
        Ok(default)
    } else {
        validate_integer(&value, name, 0, max)
    }
}

/// 把检索起点解析到 `[0, len]`，`None` 表示必然未命中。
fn resolve_start(len: usize, offset: i64, needle_len: usize, direction: Direction) -> Option<usize> {
    let len = len as i64;
    let needle_len = needle_len as i64;
    if offset < 0 {
        if offset + len >= 0 {
            Some((len + offset) as usize)
        } else if direction == Direction::Forward || needle_len == 0 {
            Some(0)
        } else {
            None
        }
    } else if offset + needle_len <= len {
        Some(offset as usize)
    } else if needle_len == 0 {
        Some(len as usize)
    } else if direction == Direction::Forward {
        None
    } else {
        Some((len - 1) as usize)
    }
}

fn units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// 朴素子序列匹配：前向取 `>= start` 的首个命中，后向取 `<= start` 的最后一个命中。
fn find<T: PartialEq>(haystack: &[T], needle: &[T], start: usize, direction: Direction) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let width = needle.len();
    match direction {
        Direction::Forward => haystack
            .get(start..)?
            .windows(width)
            .position(|window| window == needle)
            .map(|pos| start + pos),
        Direction::Backward => {
            let end = start.min(haystack.len() - width) + width;
            haystack[..end].windows(width).rposition(|window| window == needle)
        }
    }
}

impl PartialEq for ByteView {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for ByteView {}

impl PartialOrd for ByteView {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteView {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}
