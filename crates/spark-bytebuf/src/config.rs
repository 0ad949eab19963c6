//! 分配器配置。
//!
//! # 设计背景（Why）
//! - 池容量是可变的进程级设置，但它只影响之后的分配；把它收拢为一个可序列化结构，
//!   宿主既能在启动时从 TOML 片段装载，也能在运行期通过 [`crate::BufferAllocator::set_pool_size`] 调整；
//! - 对齐粒度影响池内相邻视图的起始偏移，默认 8 字节，使 64 位数值读写落在自然边界上。
//!
//! # 契约说明（What）
//! - 缺省字段使用默认值：`pool_size = 8192`、`pool_alignment = 8`；
//! - [`BufferConfig::validate`] 拒绝超出 [`MAX_LENGTH`] 的池容量与非 2 的幂对齐。

use serde::Deserialize;

use crate::{
    DEFAULT_POOL_SIZE, MAX_LENGTH,
    error::{BufferError, Result},
};

/// 默认池内对齐粒度（字节）。
pub const DEFAULT_POOL_ALIGNMENT: usize = 8;

/// 分配器配置快照。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// 每个池 Arena 的容量；小于其一半的请求才会走池化路径。
    pub pool_size: usize,
    /// 池内相邻分配的起始偏移对齐粒度。
    pub pool_alignment: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            pool_alignment: DEFAULT_POOL_ALIGNMENT,
        }
    }
}

impl BufferConfig {
    /// 从 TOML 片段装载并校验配置。
    ///
    /// # 契约说明
    /// - 解析失败（语法错误、未知字段、字段类型不符）返回 Type 类错误；
    /// - 解析成功后执行 [`BufferConfig::validate`]。
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: BufferConfig =
            toml::from_str(source).map_err(|err| BufferError::InvalidArgValue {
                name: "config",
                received: err.message().to_owned(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 校验字段取值。
    pub fn validate(&self) -> Result<()> {
        if self.pool_size > MAX_LENGTH {
            return Err(BufferError::out_of_range(
                "pool_size",
                format!(">= 0 && <= {MAX_LENGTH}"),
                self.pool_size.to_string(),
            ));
        }
        if !self.pool_alignment.is_power_of_two() {
            return Err(BufferError::out_of_range(
                "pool_alignment",
                "a power of two",
                self.pool_alignment.to_string(),
            ));
        }
        Ok(())
    }
}
