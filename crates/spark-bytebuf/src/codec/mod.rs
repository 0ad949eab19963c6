//! 编解码引擎：字节序列与定宽数值、文本编码之间的无状态转换。
//!
//! # 模块划分（How）
//! - [`numeric`]：1–6、8 字节整数（有/无符号，大/小端）与 IEEE-754 浮点的读写；
//! - `encoding`：编码标识解析与逐编码的编码/解码/长度估算；
//! - `base64`：宽容的 base64/base64url 引擎；
//! - `text`：视图上的文本解码、写入与循环填充。
//!
//! # 契约说明（What）
//! - 所有转换都只读写视图覆盖的字节区间，成本与区间长度成正比；
//! - 失败发生在任何写入之前：编解码要么完整成功，要么完全不修改视图。

mod base64;
mod encoding;
pub mod numeric;
mod text;

pub use encoding::Encoding;
pub use numeric::{ByteOrder, IntFormat};
pub use text::{byte_length, is_encoding};
