use crate::{
    MAX_LENGTH, MAX_STRING_LENGTH,
    coerce::{to_number, to_uint8, validate_integer},
    error::{BufferError, Result},
    value::HostValue,
    view::{ByteView, array_like_bytes},
};

use super::Encoding;

impl ByteView {
    /// 以 utf8 解码整个视图。
    pub fn to_utf8_string(&self) -> Result<String> {
        self.to_string_with(None, (), ())
    }

    /// 按编码解码 `[start, end)` 区间。
    ///
    /// # 契约说明
    /// - `start`/`end` 宽松夹取：`start <= 0` 取 0，`start >= len` 或 `end <= start` 得到空串，
    ///   `end` 缺省或超过长度时取 `len`，不可转换的值视为 0；区间参数从不报错；
    /// - 编码在区间判定之前解析，未知编码总是 Type 类错误；
    /// - 结果超过 [`MAX_STRING_LENGTH`] 个 UTF-16 码元时返回 Range 类错误。
    pub fn to_string_with(
        &self,
        encoding: Option<&str>,
        start: impl Into<HostValue>,
        end: impl Into<HostValue>,
    ) -> Result<String> {
        let encoding = Encoding::resolve(encoding)?;
        let len = self.len() as f64;

        let start = to_number(&start.into()).unwrap_or(f64::NAN);
        let start = if start <= 0.0 {
            0.0
        } else if start >= len {
            return Ok(String::new());
        } else {
            truncate_or_zero(start)
        };

        let end = end.into();
        let end = if end.is_undefined() {
            len
        } else {
            let end = to_number(&end).unwrap_or(f64::NAN);
            if end > len { len } else { truncate_or_zero(end) }
        };
        if end <= start {
            return Ok(String::new());
        }

        let (start, end) = (start as usize, end as usize);
        if let Some(units) = encoding.decoded_units(end - start) {
            check_string_length(units)?;
        }
        let text = encoding.decode(&self.read_range(start, end));
        if encoding == Encoding::Utf8 && end - start > MAX_STRING_LENGTH {
            check_string_length(text.encode_utf16().count())?;
        }
        Ok(text)
    }

    /// 把文本按编码写入 `[offset, offset + length)`，返回实际写入的字节数。
    ///
    /// # 契约说明
    /// - `offset` 缺省为 0，`length` 缺省为剩余长度；两者都必须是 `[0, len]` 内的整数，
    ///   非数值为 Type 类错误，越界或非整数为 Range 类错误；`length` 超出剩余空间时被截断；
    /// - 不写入半个字符（utf8）或半个码元（utf16le）；hex 在第一个畸形字节对处停止。
    pub fn write_string(
        &self,
        text: &str,
        offset: impl Into<HostValue>,
        length: impl Into<HostValue>,
        encoding: Option<&str>,
    ) -> Result<usize> {
        let offset = offset.into();
        let offset = if offset.is_undefined() {
            0
        } else {
            validate_integer(&offset, "offset", 0, self.len())?
        };
        let remaining = self.len() - offset;
        let length = length.into();
        let length = if length.is_undefined() {
            remaining
        } else {
            validate_integer(&length, "length", 0, self.len())?.min(remaining)
        };
        let encoding = Encoding::resolve(encoding)?;
        if text.is_empty() || length == 0 {
            return Ok(0);
        }
        let bytes = encoding.encode_bounded(text, length);
        self.write_bytes(offset, &bytes);
        Ok(bytes.len())
    }

    /// 以 `value` 循环填充 `[offset, end)`，返回自身以便链式调用。
    ///
    /// # 契约说明
    /// - `value` 为数值（及布尔、`null`、缺省）时按模 256 折叠为单字节；为文本时先按 `encoding` 编码；
    ///   为字节视图或类数组时按字节序列重复；`BigInt` 与对象返回 Type 类错误；
    /// - `offset` 缺省为 0，否则必须是 `[0, MAX_LENGTH]` 内的整数；`end` 缺省为 `len`，
    ///   否则必须是 `[0, len]` 内的整数，两者各自独立取缺省值；
    ///   `offset >= end` 时不做任何修改；
    /// - 零长度的 `value`（空串、空视图）在完成区间校验后不做任何修改；
    ///   非空文本编码后为空（例如畸形 hex）返回 Type 类错误。
    pub fn fill(
        &self,
        value: impl Into<HostValue>,
        offset: impl Into<HostValue>,
        end: impl Into<HostValue>,
        encoding: Option<&str>,
    ) -> Result<&Self> {
        let value = value.into();
        let pattern = match &value {
            HostValue::String(text) => {
                let encoding = Encoding::resolve(encoding)?;
                let bytes = encoding.encode(text);
                if bytes.is_empty() && !text.is_empty() {
                    return Err(BufferError::InvalidArgValue {
                        name: "value",
                        received: value.describe(),
                    });
                }
                bytes
            }
            HostValue::Bytes(view) => view.to_vec(),
            HostValue::Array(items) => array_like_bytes(items)?,
            other => vec![to_uint8(to_number(other)?)],
        };

        let offset = offset.into();
        let start = if offset.is_undefined() {
            0
        } else {
            validate_integer(&offset, "offset", 0, MAX_LENGTH)?
        };
        let end = end.into();
        let end = if end.is_undefined() {
            self.len()
        } else {
            validate_integer(&end, "end", 0, self.len())?
        };
        if start >= end || pattern.is_empty() {
            return Ok(self);
        }

        for (cell, byte) in self.cells()[start..end].iter().zip(pattern.iter().cycle()) {
            cell.set(*byte);
        }
        Ok(self)
    }
}

/// 按编码计算文本的字节长度；字节视图返回其长度。
///
/// 其它类型返回 Type 类错误；未知编码同样返回 Type 类错误。
pub fn byte_length(value: &HostValue, encoding: Option<&str>) -> Result<usize> {
    match value {
        HostValue::String(text) => Ok(Encoding::resolve(encoding)?.byte_length(text)),
        HostValue::Bytes(view) => Ok(view.len()),
        other => Err(BufferError::invalid_arg_type(
            "string",
            "of type string or an instance of Buffer",
            other.describe(),
        )),
    }
}

/// 编码标识是否可识别。
pub fn is_encoding(token: &str) -> bool {
    Encoding::from_token(token).is_some()
}

fn truncate_or_zero(n: f64) -> f64 {
    if n.is_nan() { 0.0 } else { n.trunc() }
}

fn check_string_length(units: usize) -> Result<()> {
    if units > MAX_STRING_LENGTH {
        return Err(BufferError::StringTooLong {
            max: MAX_STRING_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_string_clamps_range_arguments() {
        let view = ByteView::from(&b"hello"[..]);
        assert_eq!(view.to_string_with(None, 1, 3).unwrap(), "el");
        assert_eq!(view.to_string_with(None, -4, 99).unwrap(), "hello");
        assert_eq!(view.to_string_with(None, 9, ()).unwrap(), "");
        assert_eq!(view.to_string_with(None, 3, 1).unwrap(), "");
        assert_eq!(view.to_string_with(Some("hex"), "1", 2.7).unwrap(), "65");
        assert!(view.to_string_with(Some("nope"), 9, ()).unwrap_err().is_type());
    }

    #[test]
    fn write_string_never_splits_characters() {
        let view = ByteView::from(vec![0u8; 4]);
        assert_eq!(view.write_string("ab€", (), (), None).unwrap(), 2);
        assert_eq!(view.to_vec(), vec![b'a', b'b', 0, 0]);
        assert_eq!(view.write_string("ab", 3, (), Some("utf16le")).unwrap(), 0);
        assert_eq!(view.write_string("ffee", 2, 1, Some("hex")).unwrap(), 1);
        assert_eq!(view.to_vec(), vec![b'a', b'b', 0xff, 0]);
        assert!(view.write_string("x", 5, (), None).unwrap_err().is_range());
        assert!(view.write_string("x", "1", (), None).unwrap_err().is_type());
    }

    #[test]
    fn fill_repeats_pattern_cyclically() {
        let view = ByteView::from(vec![0u8; 5]);
        view.fill("ab", 1, (), None).unwrap();
        assert_eq!(view.to_vec(), vec![0, b'a', b'b', b'a', b'b']);
        view.fill(257, (), (), None).unwrap();
        assert_eq!(view.to_vec(), vec![1; 5]);
        view.fill("0102", 0, 3, Some("hex")).unwrap();
        assert_eq!(view.to_vec(), vec![1, 2, 1, 1, 1]);
    }

    #[test]
    fn fill_with_empty_value_still_validates_bounds() {
        let view = ByteView::from(vec![7u8; 3]);
        view.fill("", (), (), None).unwrap();
        assert_eq!(view.to_vec(), vec![7; 3]);
        assert!(view.fill("", 0, 4, None).unwrap_err().is_range());
        assert!(view.fill("zz", (), (), Some("hex")).unwrap_err().is_type());
        assert!(view.fill(1u64, (), (), None).unwrap_err().is_type());
    }

    #[test]
    fn byte_length_per_encoding() {
        let text = HostValue::from("aGVsbG8=");
        assert_eq!(byte_length(&text, Some("base64")).unwrap(), 5);
        assert_eq!(byte_length(&text, None).unwrap(), 8);
        assert_eq!(byte_length(&HostValue::from("€"), Some("utf8")).unwrap(), 3);
        assert_eq!(byte_length(&HostValue::from("abcd"), Some("hex")).unwrap(), 2);
        assert!(byte_length(&HostValue::from(3), None).unwrap_err().is_type());
        assert!(is_encoding("Latin1"));
        assert!(!is_encoding("utf-32"));
    }
}
