//! 宽松 Base64 编解码。
//!
//! 编码：标准字母表输出补齐的 `=`；URL 安全字母表不补齐。
//! 解码：同时接受两种字母表，跳过非法字符，遇到第一个 `=` 即停止；
//! 尾部不足 4 个字符的残组按已有比特位输出完整字节，单个残留字符被丢弃。

use ::base64::Engine;
use ::base64::alphabet;
use ::base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use ::base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// 解码引擎：输入已归一到标准字母表且去掉补齐，末组多余比特位直接丢弃。
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// 标准字母表编码，带 `=` 补齐。
pub(crate) fn encode_standard(input: &[u8]) -> String {
    STANDARD.encode(input)
}

/// URL 安全字母表编码，不补齐。
pub(crate) fn encode_url(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

fn normalize(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' => Some(byte),
        b'-' => Some(b'+'),
        b'_' => Some(b'/'),
        _ => None,
    }
}

/// 宽松解码，最多产出 `limit` 个字节。
pub(crate) fn decode_bounded(input: &[u8], limit: usize) -> Vec<u8> {
    let mut symbols: Vec<u8> = input
        .iter()
        .copied()
        .take_while(|byte| *byte != b'=')
        .filter_map(normalize)
        .collect();
    // 单个残留字符凑不出完整字节。
    if symbols.len() % 4 == 1 {
        symbols.pop();
    }
    // 过滤后只剩标准字母表符号、无补齐且长度模 4 不为 1，解码不会失败。
    let decoded = LENIENT.decode(&symbols);
    debug_assert!(decoded.is_ok(), "过滤后的 base64 输入解码失败");
    let mut out = decoded.unwrap_or_default();
    out.truncate(limit);
    out
}

/// 不实际解码时估算的字节数：按 UTF-16 码元数计算，末尾最多两个 `=` 会被扣除。
pub(crate) fn decoded_len(input: &str) -> usize {
    let units = input.encode_utf16().count();
    let padding = input.bytes().rev().take(2).take_while(|byte| *byte == b'=').count();
    ((units - padding) * 3) >> 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_lenient(input: &[u8]) -> Vec<u8> {
        decode_bounded(input, usize::MAX)
    }

    #[test]
    fn standard_encoding_pads() {
        assert_eq!(encode_standard(b"hi"), "aGk=");
        assert_eq!(encode_standard(b"hello"), "aGVsbG8=");
        assert_eq!(encode_standard(b""), "");
        assert_eq!(encode_url(&[0xfb, 0xff]), "-_8");
    }

    #[test]
    fn lenient_decode_skips_noise_and_stops_at_padding() {
        assert_eq!(decode_lenient(b"aGVs bG8="), b"hello");
        assert_eq!(decode_lenient(b"aGk=AAAA"), b"hi");
        assert_eq!(decode_lenient(b"-_8"), vec![0xfb, 0xff]);
        assert_eq!(decode_lenient(b"+/8"), vec![0xfb, 0xff]);
        assert_eq!(decode_lenient(b"Q"), Vec::<u8>::new());
        assert_eq!(decode_bounded(b"aGVsbG8", 2), b"he");
    }

    #[test]
    fn decoded_len_discounts_trailing_padding() {
        assert_eq!(decoded_len("aGk="), 2);
        assert_eq!(decoded_len("aGVsbG8="), 5);
        assert_eq!(decoded_len("QQ=="), 1);
        assert_eq!(decoded_len(""), 0);
        assert_eq!(decoded_len("=="), 0);
    }

    #[test]
    fn decoded_len_counts_utf16_units() {
        assert_eq!(decoded_len("ééé="), 2);
        assert_eq!(decoded_len("€€€€"), 3);
        assert_eq!(decoded_len("😀😀"), 3);
    }

    #[test]
    fn lenient_decode_accepts_every_residual_length() {
        let full = b"aGVsbG8gd29ybGQh";
        for len in 0..=full.len() {
            let noisy: Vec<u8> = full[..len].iter().flat_map(|byte| [*byte, b' ']).collect();
            let expected = (len * 3 / 4).min(12);
            assert_eq!(decode_lenient(&noisy), &b"hello world!"[..expected], "len {len}");
        }
    }
}
