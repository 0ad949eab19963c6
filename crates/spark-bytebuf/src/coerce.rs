//! 数值强制转换的唯一入口。
//!
//! # 模块定位（Why）
//! - 尺寸、偏移、填充值、检索目标都需要把宿主动态值转换成数值；
//!   若每个 API 自行实现，`NaN`、布尔、数字串的处理很快就会出现分歧；
//! - 本模块集中实现所有规则，调用点只选择“严格”或“宽松”两种口径。
//!
//! # 规则摘要（What）
//! - [`to_number`]：缺省 → `NaN`，`null` → 0，布尔 → 0/1，文本按数字串解析（失败为 `NaN`）；
//!   `BigInt`、字节视图、数组、对象视为不可转换，返回 Type 类错误；
//! - [`to_integer_or_infinity`]：在 [`to_number`] 基础上 `NaN` → 0 并向零截断；
//! - [`relative_index`]：切片口径，负值自尾部回数，结果夹取到 `[0, len]`，不可转换的值按 0 处理；
//! - 严格口径（尺寸、编解码偏移、区间参数）只接受数值类型，越界与非整数都归为 Range 类错误。

use crate::{
    MAX_LENGTH,
    error::{BufferError, Result},
    value::{HostValue, format_number},
};

/// 将宿主值转换为数值。
pub fn to_number(value: &HostValue) -> Result<f64> {
    match value {
        HostValue::Undefined => Ok(f64::NAN),
        HostValue::Null => Ok(0.0),
        HostValue::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        HostValue::Number(n) => Ok(*n),
        HostValue::String(text) => Ok(string_to_number(text)),
        other => Err(BufferError::invalid_arg_type(
            "value",
            "coercible to a number",
            other.describe(),
        )),
    }
}

/// 在 [`to_number`] 的基础上执行 `NaN → 0` 与向零截断，保留 `±Infinity`。
pub fn to_integer_or_infinity(value: &HostValue) -> Result<f64> {
    let n = to_number(value)?;
    Ok(if n.is_nan() { 0.0 } else { n.trunc() })
}

/// 按字节单元语义把数值折叠进 `0..=255`：非有限值为 0，其余向零截断后取模 256。
pub fn to_uint8(n: f64) -> u8 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(256.0) as u8
}

/// 数字串解析。
///
/// - 去除首尾空白后为空串时得到 0；
/// - 支持 `0x`/`0o`/`0b` 前缀（不允许符号）与带符号的 `Infinity`；
/// - 其余内容必须是十进制浮点字面量，否则为 `NaN`。
pub fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix_body = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|body| (radix, body)));
    if let Some((radix, body)) = radix_body {
        if body.is_empty() {
            return f64::NAN;
        }
        let mut acc = 0.0f64;
        for ch in body.chars() {
            match ch.to_digit(radix) {
                Some(digit) => acc = acc * f64::from(radix) + f64::from(digit),
                None => return f64::NAN,
            }
        }
        return acc;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let literal = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !literal {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// 切片口径的相对下标：负值加上 `len`，结果夹取到 `[0, len]`。
///
/// 不可转换的值（对象、`BigInt` 等）与 `NaN` 一律视为 0，本函数从不失败。
pub fn relative_index(value: &HostValue, len: usize) -> usize {
    let n = to_number(value).map(f64::trunc).unwrap_or(0.0);
    if n.is_nan() || n == 0.0 {
        return 0;
    }
    let len_f = len as f64;
    if n < 0.0 {
        let shifted = n + len_f;
        return if shifted > 0.0 { shifted as usize } else { 0 };
    }
    if n < len_f { n as usize } else { len }
}

/// 校验分配尺寸：只接受数值，要求为 `[0, MAX_LENGTH]` 内的整数。
pub(crate) fn validate_size(value: &HostValue) -> Result<usize> {
    let n = match value {
        HostValue::Number(n) => *n,
        other => {
            return Err(BufferError::invalid_arg_type(
                "size",
                "of type number",
                other.describe(),
            ));
        }
    };
    if n.is_nan() || n < 0.0 || n > MAX_LENGTH as f64 {
        return Err(BufferError::out_of_range(
            "size",
            format!(">= 0 && <= {MAX_LENGTH}"),
            format_number(n),
        ));
    }
    if n.fract() != 0.0 {
        return Err(BufferError::out_of_range("size", "an integer", format_number(n)));
    }
    Ok(n as usize)
}

/// 严格整数校验：类型必须为数值，必须是整数，且落在 `[min, max]`。
pub(crate) fn validate_integer(
    value: &HostValue,
    name: &'static str,
    min: usize,
    max: usize,
) -> Result<usize> {
    let n = match value {
        HostValue::Number(n) => *n,
        other => {
            return Err(BufferError::invalid_arg_type(
                name,
                "of type number",
                other.describe(),
            ));
        }
    };
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(BufferError::out_of_range(name, "an integer", format_number(n)));
    }
    if n < min as f64 || n > max as f64 {
        return Err(BufferError::out_of_range(
            name,
            format!(">= {min} && <= {max}"),
            format_number(n),
        ));
    }
    Ok(n as usize)
}

/// 数值编解码偏移校验：要求 `offset + width <= len`。
///
/// 缺省为 0；非数值为 Type 类错误；负数、小数、`NaN`、`±Infinity`、越界均为 Range 类错误。
pub(crate) fn codec_offset(value: &HostValue, width: usize, len: usize) -> Result<usize> {
    let n = match value {
        HostValue::Undefined => return bounded_offset(0.0, width, len),
        HostValue::Number(n) => *n,
        other => {
            return Err(BufferError::invalid_arg_type(
                "offset",
                "of type number",
                other.describe(),
            ));
        }
    };
    bounded_offset(n, width, len)
}

fn bounded_offset(n: f64, width: usize, len: usize) -> Result<usize> {
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(BufferError::out_of_range("offset", "an integer", format_number(n)));
    }
    if n >= 0.0 && n + width as f64 <= len as f64 {
        return Ok(n as usize);
    }
    match len.checked_sub(width) {
        None => Err(BufferError::OutOfBounds { name: None }),
        Some(last) => Err(BufferError::out_of_range(
            "offset",
            format!(">= 0 and <= {last}"),
            format_number(n),
        )),
    }
}

/// 宽松整数：整数原样返回，其余在安全整数范围内向下取整，否则回落到 `default`。
pub(crate) fn loose_integer(value: &HostValue, default: f64) -> f64 {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    match to_number(value) {
        Ok(n) if n.is_finite() && n.fract() == 0.0 => n,
        Ok(n) if !n.is_nan() && (-MAX_SAFE..=MAX_SAFE).contains(&n) => n.floor(),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn string_to_number_follows_numeric_literal_rules() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("0b101"), 5.0);
        assert_eq!(string_to_number("-2.5e1"), -25.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12abc").is_nan());
        assert!(string_to_number("-0x10").is_nan());
    }

    #[test]
    fn to_uint8_wraps_modulo_256() {
        assert_eq!(to_uint8(256.0), 0);
        assert_eq!(to_uint8(-1.0), 255);
        assert_eq!(to_uint8(257.9), 1);
        assert_eq!(to_uint8(f64::NAN), 0);
        assert_eq!(to_uint8(f64::INFINITY), 0);
    }

    #[test]
    fn relative_index_clamps_and_never_fails() {
        assert_eq!(relative_index(&HostValue::from(-2), 5), 3);
        assert_eq!(relative_index(&HostValue::from(-9), 5), 0);
        assert_eq!(relative_index(&HostValue::from(f64::INFINITY), 5), 5);
        assert_eq!(relative_index(&HostValue::from(f64::NEG_INFINITY), 5), 0);
        assert_eq!(relative_index(&HostValue::from(true), 5), 1);
        assert_eq!(relative_index(&HostValue::from("3"), 5), 3);
        assert_eq!(relative_index(&HostValue::Object, 5), 0);
        assert_eq!(relative_index(&HostValue::from(7u64), 5), 0);
    }

    #[test]
    fn size_validation_separates_range_from_type() {
        assert_eq!(validate_size(&HostValue::from(16)).unwrap(), 16);
        assert_eq!(
            validate_size(&HostValue::from(-1)).unwrap_err().kind(),
            ErrorKind::Range
        );
        assert_eq!(
            validate_size(&HostValue::from(1.5)).unwrap_err().kind(),
            ErrorKind::Range
        );
        assert_eq!(
            validate_size(&HostValue::from("8")).unwrap_err().kind(),
            ErrorKind::Type
        );
    }

    #[test]
    fn codec_offset_reports_last_legal_offset() {
        let err = codec_offset(&HostValue::from(3), 2, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The value of \"offset\" is out of range. It must be >= 0 and <= 2. Received 3"
        );
        let err = codec_offset(&HostValue::from(0), 4, 2).unwrap_err();
        assert_eq!(err, BufferError::OutOfBounds { name: None });
        assert_eq!(codec_offset(&HostValue::Undefined, 4, 4).unwrap(), 0);
    }
}
