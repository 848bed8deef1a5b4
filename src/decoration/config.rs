//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `DecorConfig`，保证运行时行为可观测、可调整、可测试。
//! 配置在启动时构建一次，随后以只读方式传入处理器，不存在跨请求的可变状态。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的默认值（与聊天机器人原有行为一致）。
//! - `validate` 在启动阶段拒绝明显不合理的参数，避免请求期才暴露问题。

use std::path::PathBuf;

use super::DecorError;

/// 默认画布边长（像素），所有环形样式都在该尺寸的圆形头像上绘制。
pub const DEFAULT_CANVAS_SIZE: u32 = 512;

/// 默认覆盖图目录（相对于工作目录）。
pub const DEFAULT_OVERLAY_DIR: &str = "assets/overlays";

/// 头像装饰配置。
///
/// 字段覆盖了下载、解码与绘制三个阶段。
#[derive(Debug, Clone)]
pub struct DecorConfig {
    /// 环形样式输出画布边长（像素）。
    pub canvas_size: u32,
    /// 覆盖图素材所在目录。
    pub overlay_dir: PathBuf,
    /// 下载/读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 网络下载总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问内网或本地地址（默认关闭，防 SSRF）。
    pub allow_private_network: bool,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码后单边超过该值时先降采样，再参与绘制。
    pub max_working_dimension: u32,
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            overlay_dir: PathBuf::from(DEFAULT_OVERLAY_DIR),
            max_file_size: 20 * 1024 * 1024,
            download_timeout: 20,
            connect_timeout: 8,
            max_redirects: 5,
            allow_private_network: false,
            max_decoded_pixels: 40_000_000,
            max_working_dimension: 2048,
        }
    }
}

impl DecorConfig {
    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), DecorError> {
        if !(16..=4096).contains(&self.canvas_size) {
            return Err(DecorError::InvalidArgument(format!(
                "canvas_size 必须在 16~4096 之间：{}",
                self.canvas_size
            )));
        }
        if self.max_file_size == 0 {
            return Err(DecorError::InvalidArgument("max_file_size 不能为 0".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(DecorError::InvalidArgument(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if self.download_timeout < self.connect_timeout {
            return Err(DecorError::InvalidArgument(
                "download_timeout 不能小于 connect_timeout".to_string(),
            ));
        }
        if self.max_working_dimension < self.canvas_size {
            return Err(DecorError::InvalidArgument(
                "max_working_dimension 不能小于 canvas_size".to_string(),
            ));
        }
        Ok(())
    }
}
