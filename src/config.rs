//! # 启动配置模块
//!
//! ## 设计思路
//!
//! 所有环境相关的输入在启动时一次性读成 `BotConfig`，之后显式传入服务，
//! 业务代码不再直接读取环境变量。
//!
//! ## 实现思路
//!
//! - `from_env`：先用 `dotenvy` 加载 `.env`（不存在时忽略），再读取进程环境。
//! - `from_lookup`：注入任意键值查找函数，测试不必修改进程环境。
//!
//! | 变量 | 含义 | 默认 |
//! |------|------|------|
//! | `DISCORD_TOKEN` | 机器人凭据 | 必填 |
//! | `COMMAND_PREFIX` | 命令前缀 | `!` |
//! | `OVERLAY_DIR` | 覆盖图目录 | `assets/overlays` |

use std::path::PathBuf;

use crate::decoration::DecorConfig;
use crate::error::AppError;

pub const TOKEN_ENV: &str = "DISCORD_TOKEN";
pub const PREFIX_ENV: &str = "COMMAND_PREFIX";
pub const OVERLAY_DIR_ENV: &str = "OVERLAY_DIR";

pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// 机器人启动配置。
#[derive(Clone)]
pub struct BotConfig {
    /// 平台凭据，只用于网关登录，不会写入日志。
    pub credential: String,
    pub command_prefix: String,
    pub decoration: DecorConfig,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("credential", &"<redacted>")
            .field("command_prefix", &self.command_prefix)
            .field("decoration", &self.decoration)
            .finish()
    }
}

impl BotConfig {
    /// 从 `.env` 与进程环境读取配置。
    pub fn from_env() -> Result<Self, AppError> {
        match dotenvy::dotenv() {
            Ok(path) => log::info!("📄 已加载环境文件：{}", path.display()),
            Err(err) if err.not_found() => log::debug!("未找到 .env，仅使用进程环境"),
            Err(err) => log::warn!("⚠️ .env 解析失败，已忽略：{}", err),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构建配置。
    ///
    /// # 示例
    /// ```rust
    /// use avatar_decorator::config::BotConfig;
    ///
    /// let config = BotConfig::from_lookup(|key| match key {
    ///     "DISCORD_TOKEN" => Some("secret".to_string()),
    ///     _ => None,
    /// })?;
    /// assert_eq!(config.command_prefix, "!");
    /// # Ok::<(), avatar_decorator::error::AppError>(())
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credential = non_empty(TOKEN_ENV)
            .ok_or_else(|| AppError::Config(format!("请在环境变量或 .env 中设置 {}", TOKEN_ENV)))?;

        let command_prefix = non_empty(PREFIX_ENV)
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string());

        let mut decoration = DecorConfig::default();
        if let Some(dir) = non_empty(OVERLAY_DIR_ENV) {
            decoration.overlay_dir = PathBuf::from(dir.trim());
        }
        decoration.validate()?;

        Ok(Self {
            credential,
            command_prefix,
            decoration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_credential_is_config_error() {
        let result = BotConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(AppError::Config(_))));

        let blank = BotConfig::from_lookup(lookup_from(&[(TOKEN_ENV, "   ")]));
        assert!(matches!(blank, Err(AppError::Config(_))));
    }

    #[test]
    fn defaults_apply_when_optional_values_absent() {
        let config =
            BotConfig::from_lookup(lookup_from(&[(TOKEN_ENV, "abc")])).expect("config should load");

        assert_eq!(config.credential, "abc");
        assert_eq!(config.command_prefix, DEFAULT_COMMAND_PREFIX);
        assert_eq!(config.decoration.overlay_dir, PathBuf::from("assets/overlays"));
    }

    #[test]
    fn overrides_prefix_and_overlay_dir() {
        let config = BotConfig::from_lookup(lookup_from(&[
            (TOKEN_ENV, "abc"),
            (PREFIX_ENV, "?"),
            (OVERLAY_DIR_ENV, "/srv/overlays"),
        ]))
        .expect("config should load");

        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.decoration.overlay_dir, PathBuf::from("/srv/overlays"));
    }

    #[test]
    fn debug_output_hides_credential() {
        let config = BotConfig::from_lookup(lookup_from(&[(TOKEN_ENV, "super-secret")]))
            .expect("config should load");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
    }
}
