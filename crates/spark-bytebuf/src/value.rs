//! 宿主侧动态取值的统一表示。
//!
//! # 模块定位（Why）
//! - 缓冲 API 的尺寸、偏移、填充值与检索目标在宿主侧都是“动态类型”，
//!   需要一个标签联合在边界处承接，再交由 [`crate::coerce`] 统一归一化；
//! - 直接在每个 API 上区分 `f64`/`&str`/`ByteView` 会让调用面膨胀，且无法表达“缺省参数”。
//!
//! # 契约说明（What）
//! - 小整数、`usize`、浮点转为 [`HostValue::Number`]；`i64`/`u64`/`i128` 转为 [`HostValue::BigInt`]，
//!   与 64 位编解码要求任意精度整数的约定保持一致；
//! - `()` 与 `None` 表示缺省参数 [`HostValue::Undefined`]。

use std::fmt;

use crate::view::ByteView;

/// 宿主传入的动态值。
///
/// # 整数转换注意
/// `i64`/`u64`/`i128` 转为 [`HostValue::BigInt`]，只适合作为 64 位编解码的写入值。
/// 尺寸、偏移与索引应传 `usize`、`i32` 或 `f64`；传入 `i64` 会得到 Type 类错误：
///
/// ```
/// use spark_bytebuf::ByteView;
///
/// let buf = ByteView::from(vec![7u8; 4]);
/// let index: i64 = 1;
/// assert!(buf.read_u8(index).unwrap_err().is_type());
/// assert_eq!(buf.read_u8(index as usize).unwrap(), 7);
/// ```
#[derive(Clone, Debug, Default)]
pub enum HostValue {
    /// 参数缺省。
    #[default]
    Undefined,
    /// 空值。
    Null,
    /// 布尔值。
    Bool(bool),
    /// 双精度数值。
    Number(f64),
    /// 任意精度整数（以 `i128` 承载，覆盖 64 位有符号/无符号全部取值）。
    BigInt(i128),
    /// 文本。
    String(String),
    /// 字节视图。
    Bytes(ByteView),
    /// 类数组：带长度与数值元素的结构。
    Array(Vec<HostValue>),
    /// 其余不透明对象。
    Object,
}

impl HostValue {
    /// 是否为缺省参数。
    pub fn is_undefined(&self) -> bool {
        matches!(self, HostValue::Undefined)
    }

    /// 返回宿主侧的类型名，用于错误消息。
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::BigInt(_) => "bigint",
            HostValue::String(_) => "string",
            HostValue::Bytes(_) => "Buffer",
            HostValue::Array(_) => "Array",
            HostValue::Object => "object",
        }
    }

    /// 生成错误消息中 `Received ...` 的片段。
    pub(crate) fn describe(&self) -> String {
        match self {
            HostValue::Undefined | HostValue::Null => self.type_name().to_owned(),
            HostValue::Number(n) => format_number(*n),
            HostValue::BigInt(n) => format!("{n}n"),
            HostValue::Bool(b) => format!("type boolean ({b})"),
            HostValue::String(s) => {
                let shown: String = s.chars().take(25).collect();
                if shown.len() < s.len() {
                    format!("type string ('{shown}...')")
                } else {
                    format!("type string ('{shown}')")
                }
            }
            HostValue::Bytes(view) => format!("an instance of Buffer (length {})", view.len()),
            HostValue::Array(items) => format!("an instance of Array (length {})", items.len()),
            HostValue::Object => "an instance of Object".to_owned(),
        }
    }
}

/// 按宿主习惯格式化数值：整数不带小数点，特殊值使用 `NaN`/`Infinity`。
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

macro_rules! number_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for HostValue {
                fn from(value: $ty) -> Self {
                    HostValue::Number(value as f64)
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, u8, u16, u32, isize, usize, f32, f64);

macro_rules! bigint_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for HostValue {
                fn from(value: $ty) -> Self {
                    HostValue::BigInt(value as i128)
                }
            }
        )*
    };
}

bigint_from!(i64, u64, i128);

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<ByteView> for HostValue {
    fn from(value: ByteView) -> Self {
        HostValue::Bytes(value)
    }
}

impl From<&ByteView> for HostValue {
    fn from(value: &ByteView) -> Self {
        HostValue::Bytes(value.clone())
    }
}

impl From<()> for HostValue {
    fn from(_: ()) -> Self {
        HostValue::Undefined
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        HostValue::Array(value)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Undefined, Into::into)
    }
}
