use crate::error::{BufferError, Result};

use super::base64;

/// 文本编码标识。
///
/// # 契约说明（What）
/// - 标识大小写不敏感，别名 `utf-8`、`ucs2`/`ucs-2`/`utf-16le`、`binary` 分别归一到对应编码；
/// - `latin1` 与 `ascii` 的编码方向都取每个 UTF-16 码元的低 8 位，
///   解码方向 `ascii` 会清除最高位；
/// - 所有解码方向都不会失败：畸形 utf8 以替换字符呈现，hex/base64 在畸形处截断。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Latin1,
    Ascii,
    Base64,
    Base64Url,
    Hex,
}

impl Encoding {
    /// 解析编码标识；无法识别时返回 `None`。
    pub fn from_token(token: &str) -> Option<Self> {
        let encoding = match token.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Encoding::Utf8,
            "ucs2" | "ucs-2" | "utf16le" | "utf-16le" => Encoding::Utf16Le,
            "latin1" | "binary" => Encoding::Latin1,
            "ascii" => Encoding::Ascii,
            "base64" => Encoding::Base64,
            "base64url" => Encoding::Base64Url,
            "hex" => Encoding::Hex,
            _ => return None,
        };
        Some(encoding)
    }

    /// 解析可缺省的编码参数：缺省为 utf8，无法识别返回 Type 类错误。
    pub fn resolve(token: Option<&str>) -> Result<Self> {
        match token {
            None => Ok(Encoding::Utf8),
            Some(token) => Self::from_token(token).ok_or_else(|| BufferError::UnknownEncoding {
                encoding: token.to_owned(),
            }),
        }
    }

    /// 规范名称。
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Utf16Le => "utf16le",
            Encoding::Latin1 => "latin1",
            Encoding::Ascii => "ascii",
            Encoding::Base64 => "base64",
            Encoding::Base64Url => "base64url",
            Encoding::Hex => "hex",
        }
    }

    /// 把文本编码为字节。
    pub fn encode(&self, text: &str) -> Vec<u8> {
        self.encode_bounded(text, usize::MAX)
    }

    /// 编码并最多产出 `limit` 个字节。
    ///
    /// 截断只发生在完整单元边界：utf8 不拆分字符，utf16le 不拆分码元，hex 不拆分字节对。
    pub fn encode_bounded(&self, text: &str, limit: usize) -> Vec<u8> {
        match self {
            Encoding::Utf8 => {
                if text.len() <= limit {
                    return text.as_bytes().to_vec();
                }
                let mut end = limit;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                text.as_bytes()[..end].to_vec()
            }
            Encoding::Utf16Le => text
                .encode_utf16()
                .take(limit / 2)
                .flat_map(u16::to_le_bytes)
                .collect(),
            Encoding::Latin1 | Encoding::Ascii => {
                text.encode_utf16().take(limit).map(|unit| unit as u8).collect()
            }
            Encoding::Hex => decode_hex_prefix(text.as_bytes(), limit),
            Encoding::Base64 | Encoding::Base64Url => {
                base64::decode_bounded(text.as_bytes(), limit)
            }
        }
    }

    /// 把字节解码为文本。
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Encoding::Latin1 => bytes.iter().map(|b| char::from(*b)).collect(),
            Encoding::Ascii => bytes.iter().map(|b| char::from(b & 0x7f)).collect(),
            Encoding::Hex => hex::encode(bytes),
            Encoding::Base64 => base64::encode_standard(bytes),
            Encoding::Base64Url => base64::encode_url(bytes),
        }
    }

    /// 解码 `byte_len` 个字节所得文本的 UTF-16 码元数；utf8 无法预知，返回 `None`。
    pub(crate) fn decoded_units(&self, byte_len: usize) -> Option<usize> {
        match self {
            Encoding::Utf8 => None,
            Encoding::Utf16Le => Some(byte_len / 2),
            Encoding::Latin1 | Encoding::Ascii => Some(byte_len),
            Encoding::Hex => Some(byte_len.saturating_mul(2)),
            Encoding::Base64 => Some(byte_len.div_ceil(3).saturating_mul(4)),
            Encoding::Base64Url => Some(byte_len / 3 * 4 + [0, 2, 3][byte_len % 3]),
        }
    }

    /// 不实际编码时的字节长度。
    ///
    /// base64 系列按有效字符数估算，末尾至多扣除两个 `=`，不会扫描非法字符。
    pub fn byte_length(&self, text: &str) -> usize {
        match self {
            Encoding::Utf8 => text.len(),
            Encoding::Utf16Le => text.encode_utf16().count() * 2,
            Encoding::Latin1 | Encoding::Ascii => text.encode_utf16().count(),
            Encoding::Hex => text.encode_utf16().count() >> 1,
            Encoding::Base64 | Encoding::Base64Url => base64::decoded_len(text),
        }
    }
}

/// 逐对解码十六进制，遇到第一个畸形字节对即停止；奇数长度时末尾单个字符被忽略。
fn decode_hex_prefix(input: &[u8], limit: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity((input.len() / 2).min(limit));
    for pair in input.chunks_exact(2) {
        if out.len() == limit {
            break;
        }
        let mut byte = [0u8; 1];
        if hex::decode_to_slice(pair, &mut byte).is_err() {
            break;
        }
        out.push(byte[0]);
    }
    out
}
