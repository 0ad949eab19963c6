//! 定宽数值编解码。
//!
//! # 设计背景（Why）
//! - 协议与文件格式对数值编码要求逐位精确：字节序、宽度、补码表示、越界策略都必须可预期；
//! - 1–6 字节整数共享同一套“按字节拼装”的逻辑，8 字节整数因超出双精度安全整数范围，
//!   以任意精度整数（[`HostValue::BigInt`]）收发。
//!
//! # 契约说明（What）
//! - 大端先放最高有效字节，小端先放最低有效字节；有符号值按补码解释；
//! - 写入的检查顺序为：值转换 → 值域 → 偏移；任何失败都不会修改视图；
//! - 非整数值先向零截断再做值域检查，而非整数偏移直接报 Range 类错误，两者的不对称是有意保留的契约；
//! - 写入返回 `offset + width`，便于链式顺序写入。

use crate::{
    coerce::{codec_offset, to_integer_or_infinity, to_number},
    error::{BufferError, Result},
    value::{HostValue, format_number},
    view::ByteView,
};

/// 多字节数值的字节序。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// 大端：最高有效字节在前。
    Big,
    /// 小端：最低有效字节在前。
    Little,
}

/// 整数编解码描述符：宽度、符号与字节序。
///
/// 宽度取值为 `{1, 2, 3, 4, 5, 6, 8}`；宽度 1 不区分字节序。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntFormat {
    width: usize,
    signed: bool,
    order: ByteOrder,
}

impl IntFormat {
    /// 无符号 8 位。
    pub const U8: IntFormat = IntFormat::of(1, false, ByteOrder::Big);
    /// 有符号 8 位。
    pub const I8: IntFormat = IntFormat::of(1, true, ByteOrder::Big);
    /// 无符号 16 位大端。
    pub const U16_BE: IntFormat = IntFormat::of(2, false, ByteOrder::Big);
    /// 无符号 16 位小端。
    pub const U16_LE: IntFormat = IntFormat::of(2, false, ByteOrder::Little);
    /// 有符号 16 位大端。
    pub const I16_BE: IntFormat = IntFormat::of(2, true, ByteOrder::Big);
    /// 有符号 16 位小端。
    pub const I16_LE: IntFormat = IntFormat::of(2, true, ByteOrder::Little);
    /// 无符号 32 位大端。
    pub const U32_BE: IntFormat = IntFormat::of(4, false, ByteOrder::Big);
    /// 无符号 32 位小端。
    pub const U32_LE: IntFormat = IntFormat::of(4, false, ByteOrder::Little);
    /// 有符号 32 位大端。
    pub const I32_BE: IntFormat = IntFormat::of(4, true, ByteOrder::Big);
    /// 有符号 32 位小端。
    pub const I32_LE: IntFormat = IntFormat::of(4, true, ByteOrder::Little);
    /// 无符号 64 位大端。
    pub const U64_BE: IntFormat = IntFormat::of(8, false, ByteOrder::Big);
    /// 无符号 64 位小端。
    pub const U64_LE: IntFormat = IntFormat::of(8, false, ByteOrder::Little);
    /// 有符号 64 位大端。
    pub const I64_BE: IntFormat = IntFormat::of(8, true, ByteOrder::Big);
    /// 有符号 64 位小端。
    pub const I64_LE: IntFormat = IntFormat::of(8, true, ByteOrder::Little);

    const fn of(width: usize, signed: bool, order: ByteOrder) -> Self {
        Self {
            width,
            signed,
            order,
        }
    }

    /// 构造描述符；宽度不在 `{1..=6, 8}` 时返回 Range 类错误。
    pub fn new(width: usize, signed: bool, order: ByteOrder) -> Result<Self> {
        match width {
            1..=6 | 8 => Ok(Self::of(width, signed, order)),
            _ => Err(BufferError::out_of_range(
                "byteLength",
                "one of 1, 2, 3, 4, 5, 6 or 8",
                width.to_string(),
            )),
        }
    }

    /// 可变宽度读写入口使用的描述符：宽度限定在 `1..=6`。
    fn variable(byte_length: usize, signed: bool, order: ByteOrder) -> Result<Self> {
        if !(1..=6).contains(&byte_length) {
            return Err(BufferError::out_of_range(
                "byteLength",
                ">= 1 and <= 6",
                byte_length.to_string(),
            ));
        }
        Ok(Self::of(byte_length, signed, order))
    }

    /// 字节宽度。
    pub fn width(&self) -> usize {
        self.width
    }

    /// 是否为有符号整数。
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// 字节序。
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// 可表示的最小值。
    pub fn min(&self) -> i128 {
        if self.signed {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    /// 可表示的最大值。
    pub fn max(&self) -> i128 {
        if self.signed {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    fn bits(&self) -> u32 {
        (self.width * 8) as u32
    }

    /// 按描述符解码 `bytes`（长度必须等于宽度）。
    pub fn decode(&self, bytes: &[u8]) -> i128 {
        debug_assert_eq!(bytes.len(), self.width);
        let fold = |acc: u64, byte: &u8| (acc << 8) | u64::from(*byte);
        let raw = match self.order {
            ByteOrder::Big => bytes.iter().fold(0, fold),
            ByteOrder::Little => bytes.iter().rev().fold(0, fold),
        };
        let raw = i128::from(raw);
        if self.signed && raw >> (self.bits() - 1) == 1 {
            raw - (1i128 << self.bits())
        } else {
            raw
        }
    }

    /// 把 `value` 的补码表示写入 `out`（长度必须等于宽度）；调用方负责值域检查。
    pub fn encode(&self, value: i128, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.width);
        let raw = value as u128;
        for (i, slot) in out.iter_mut().enumerate() {
            let shift = match self.order {
                ByteOrder::Big => (self.width - 1 - i) * 8,
                ByteOrder::Little => i * 8,
            };
            *slot = (raw >> shift) as u8;
        }
    }

    /// 值域描述，用于错误消息。
    fn range_description(&self) -> String {
        let bits = self.bits();
        match (self.width, self.signed) {
            (8, false) => ">= 0n and < 2n ** 64n".to_owned(),
            (8, true) => ">= -(2n ** 63n) and < 2n ** 63n".to_owned(),
            (w, false) if w > 4 => format!(">= 0 and < 2 ** {bits}"),
            (w, true) if w > 4 => format!(">= -(2 ** {}) and < 2 ** {}", bits - 1, bits - 1),
            _ => format!(">= {} and <= {}", self.min(), self.max()),
        }
    }
}

impl ByteView {
    /// 按描述符读取整数。
    ///
    /// `offset` 缺省为 0；必须满足 `offset + width <= len`，否则返回 Range 类错误；
    /// 非数值偏移返回 Type 类错误。
    pub fn read_int_with(&self, offset: impl Into<HostValue>, format: IntFormat) -> Result<i128> {
        let offset = codec_offset(&offset.into(), format.width, self.len())?;
        Ok(format.decode(&self.read_range(offset, offset + format.width)))
    }

    /// 按描述符写入整数，返回 `offset + width`。
    ///
    /// # 契约说明
    /// - 宽度 8：值必须是 [`HostValue::BigInt`]，否则返回 Type 类错误；
    /// - 其余宽度：值经 [`to_integer_or_infinity`] 转换（`BigInt` 与不可转换值为 Type 类错误），
    ///   向零截断后检查值域，越界返回 Range 类错误，不做回绕。
    pub fn write_int_with(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
        format: IntFormat,
    ) -> Result<usize> {
        let value = value.into();
        let checked = if format.width == 8 {
            let HostValue::BigInt(n) = value else {
                return Err(BufferError::invalid_arg_type(
                    "value",
                    "of type bigint",
                    value.describe(),
                ));
            };
            if n < format.min() || n > format.max() {
                return Err(BufferError::out_of_range(
                    "value",
                    format.range_description(),
                    format!("{n}n"),
                ));
            }
            n
        } else {
            let n = to_integer_or_infinity(&value)?;
            if n < format.min() as f64 || n > format.max() as f64 {
                return Err(BufferError::out_of_range(
                    "value",
                    format.range_description(),
                    format_number(n),
                ));
            }
            n as i128
        };

        let offset = codec_offset(&offset.into(), format.width, self.len())?;
        let mut staged = [0u8; 8];
        let staged = &mut staged[..format.width];
        format.encode(checked, staged);
        self.write_bytes(offset, staged);
        Ok(offset + format.width)
    }

    /// 读取 32 位浮点（大端）。
    pub fn read_f32_be(&self, offset: impl Into<HostValue>) -> Result<f32> {
        self.read_array::<4>(offset).map(f32::from_be_bytes)
    }

    /// 读取 32 位浮点（小端）。
    pub fn read_f32_le(&self, offset: impl Into<HostValue>) -> Result<f32> {
        self.read_array::<4>(offset).map(f32::from_le_bytes)
    }

    /// 读取 64 位浮点（大端）。
    pub fn read_f64_be(&self, offset: impl Into<HostValue>) -> Result<f64> {
        self.read_array::<8>(offset).map(f64::from_be_bytes)
    }

    /// 读取 64 位浮点（小端）。
    pub fn read_f64_le(&self, offset: impl Into<HostValue>) -> Result<f64> {
        self.read_array::<8>(offset).map(f64::from_le_bytes)
    }

    /// 写入 32 位浮点（大端）；值只需可转换为数值，不做量级检查。
    pub fn write_f32_be(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
    ) -> Result<usize> {
        let bytes = (to_number(&value.into())? as f32).to_be_bytes();
        self.write_array(offset, bytes)
    }

    /// 写入 32 位浮点（小端）。
    pub fn write_f32_le(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
    ) -> Result<usize> {
        let bytes = (to_number(&value.into())? as f32).to_le_bytes();
        self.write_array(offset, bytes)
    }

    /// 写入 64 位浮点（大端）。
    pub fn write_f64_be(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
    ) -> Result<usize> {
        let bytes = to_number(&value.into())?.to_be_bytes();
        self.write_array(offset, bytes)
    }

    /// 写入 64 位浮点（小端）。
    pub fn write_f64_le(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
    ) -> Result<usize> {
        let bytes = to_number(&value.into())?.to_le_bytes();
        self.write_array(offset, bytes)
    }

    /// 可变宽度无符号读取（大端，`byte_length` 取 1–6）。
    pub fn read_uint_be(&self, offset: impl Into<HostValue>, byte_length: usize) -> Result<u64> {
        let format = IntFormat::variable(byte_length, false, ByteOrder::Big)?;
        self.read_int_with(offset, format).map(|v| v as u64)
    }

    /// 可变宽度无符号读取（小端）。
    pub fn read_uint_le(&self, offset: impl Into<HostValue>, byte_length: usize) -> Result<u64> {
        let format = IntFormat::variable(byte_length, false, ByteOrder::Little)?;
        self.read_int_with(offset, format).map(|v| v as u64)
    }

    /// 可变宽度有符号读取（大端）。
    pub fn read_int_be(&self, offset: impl Into<HostValue>, byte_length: usize) -> Result<i64> {
        let format = IntFormat::variable(byte_length, true, ByteOrder::Big)?;
        self.read_int_with(offset, format).map(|v| v as i64)
    }

    /// 可变宽度有符号读取（小端）。
    pub fn read_int_le(&self, offset: impl Into<HostValue>, byte_length: usize) -> Result<i64> {
        let format = IntFormat::variable(byte_length, true, ByteOrder::Little)?;
        self.read_int_with(offset, format).map(|v| v as i64)
    }

    /// 可变宽度无符号写入（大端）。
    pub fn write_uint_be(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
        byte_length: usize,
    ) -> Result<usize> {
        let format = IntFormat::variable(byte_length, false, ByteOrder::Big)?;
        self.write_int_with(value, offset, format)
    }

    /// 可变宽度无符号写入（小端）。
    pub fn write_uint_le(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
        byte_length: usize,
    ) -> Result<usize> {
        let format = IntFormat::variable(byte_length, false, ByteOrder::Little)?;
        self.write_int_with(value, offset, format)
    }

    /// 可变宽度有符号写入（大端）。
    pub fn write_int_be(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
        byte_length: usize,
    ) -> Result<usize> {
        let format = IntFormat::variable(byte_length, true, ByteOrder::Big)?;
        self.write_int_with(value, offset, format)
    }

    /// 可变宽度有符号写入（小端）。
    pub fn write_int_le(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
        byte_length: usize,
    ) -> Result<usize> {
        let format = IntFormat::variable(byte_length, true, ByteOrder::Little)?;
        self.write_int_with(value, offset, format)
    }

    fn read_array<const N: usize>(&self, offset: impl Into<HostValue>) -> Result<[u8; N]> {
        let offset = codec_offset(&offset.into(), N, self.len())?;
        let mut out = [0u8; N];
        for (slot, byte) in out.iter_mut().zip(self.read_range(offset, offset + N)) {
            *slot = byte;
        }
        Ok(out)
    }

    fn write_array<const N: usize>(
        &self,
        offset: impl Into<HostValue>,
        bytes: [u8; N],
    ) -> Result<usize> {
        let offset = codec_offset(&offset.into(), N, self.len())?;
        self.write_bytes(offset, &bytes);
        Ok(offset + N)
    }
}

/// 为固定描述符生成读写方法对。
macro_rules! fixed_int_accessors {
    ($($read:ident / $write:ident => $ty:ty, $format:ident, $what:literal;)*) => {
        impl ByteView {
            $(
                #[doc = concat!("读取", $what, "。")]
                ///
                /// `offset` 传 `usize`/`i32`/`f64`；`i64` 会被视为任意精度整数而返回 Type 类错误。
                pub fn $read(&self, offset: impl Into<HostValue>) -> Result<$ty> {
                    self.read_int_with(offset, IntFormat::$format).map(|v| v as $ty)
                }

                #[doc = concat!("写入", $what, "，返回 `offset + width`。")]
                pub fn $write(
                    &self,
                    value: impl Into<HostValue>,
                    offset: impl Into<HostValue>,
                ) -> Result<usize> {
                    self.write_int_with(value, offset, IntFormat::$format)
                }
            )*
        }
    };
}

fixed_int_accessors! {
    read_u8 / write_u8 => u8, U8, "无符号 8 位整数";
    read_i8 / write_i8 => i8, I8, "有符号 8 位整数";
    read_u16_be / write_u16_be => u16, U16_BE, "无符号 16 位整数（大端）";
    read_u16_le / write_u16_le => u16, U16_LE, "无符号 16 位整数（小端）";
    read_i16_be / write_i16_be => i16, I16_BE, "有符号 16 位整数（大端）";
    read_i16_le / write_i16_le => i16, I16_LE, "有符号 16 位整数（小端）";
    read_u32_be / write_u32_be => u32, U32_BE, "无符号 32 位整数（大端）";
    read_u32_le / write_u32_le => u32, U32_LE, "无符号 32 位整数（小端）";
    read_i32_be / write_i32_be => i32, I32_BE, "有符号 32 位整数（大端）";
    read_i32_le / write_i32_le => i32, I32_LE, "有符号 32 位整数（小端）";
    read_big_u64_be / write_big_u64_be => u64, U64_BE, "无符号 64 位整数（大端，任意精度整数）";
    read_big_u64_le / write_big_u64_le => u64, U64_LE, "无符号 64 位整数（小端，任意精度整数）";
    read_big_i64_be / write_big_i64_be => i64, I64_BE, "有符号 64 位整数（大端，任意精度整数）";
    read_big_i64_le / write_big_i64_le => i64, I64_LE, "有符号 64 位整数（小端，任意精度整数）";
}
