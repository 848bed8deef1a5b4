//! # 命令解析模块
//!
//! 识别 `<前缀><命令> [子命令] [参数…]` 形式的消息。
//! 只负责切分与识别命令名，子命令语义交给 `DecorationStyle::parse`。

/// 装饰命令名（葡萄牙语 / 英语）。
pub const DECORATE_COMMANDS: [&str; 2] = ["decorar", "decorate"];

/// 帮助命令名。
pub const HELP_COMMANDS: [&str; 2] = ["help", "ajuda"];

/// 解析出的命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Decorate {
        /// 子命令（样式名），可能缺省。
        style_arg: Option<String>,
        /// 子命令之后的参数。
        args: Vec<String>,
    },
}

impl Command {
    /// 解析消息内容。不以前缀开头或命令名不认识时返回 `None`。
    ///
    /// # 示例
    /// ```rust
    /// use avatar_decorator::bot::Command;
    ///
    /// let cmd = Command::parse("!decorar anel #ff00ff", "!");
    /// assert_eq!(
    ///     cmd,
    ///     Some(Command::Decorate {
    ///         style_arg: Some("anel".to_string()),
    ///         args: vec!["#ff00ff".to_string()],
    ///     })
    /// );
    /// assert_eq!(Command::parse("hello", "!"), None);
    /// ```
    pub fn parse(content: &str, prefix: &str) -> Option<Self> {
        if prefix.is_empty() {
            return None;
        }
        let body = content.trim_start().strip_prefix(prefix)?;
        let mut tokens = body.split_whitespace();
        let name = tokens.next()?.to_ascii_lowercase();

        if HELP_COMMANDS.contains(&name.as_str()) {
            return Some(Self::Help);
        }
        if !DECORATE_COMMANDS.contains(&name.as_str()) {
            return None;
        }

        let style_arg = tokens.next().map(str::to_string);
        let args = tokens.map(str::to_string).collect();
        Some(Self::Decorate { style_arg, args })
    }
}
