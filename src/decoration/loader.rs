//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（URL / 本地文件 / 内存字节）的头像加载，并尽早执行输入校验，
//! 尽快失败，减少不必要的内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - URL：协议 + 主机安全 + 状态码 + 内容类型 + 体积上限 + 流式下载 + 签名探测。
//!   重定向手动跟随，每一跳都重新做主机安全校验。失败只报告一次，不重试。
//! - 文件：存在性 + metadata 体积限制 + 读取 + 签名。
//! - 内存字节：体积限制 + 签名。

use std::net::IpAddr;
use std::path::Path;

use super::source::{AvatarSource, RawImageData};
use super::{DecorConfig, DecorError, DecorationHandler};

const STREAM_SIGNATURE_PROBE_BYTES: usize = 4096;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

impl DecorationHandler {
    /// 按来源加载头像原始字节。
    pub(crate) async fn load_source(
        &self,
        source: &AvatarSource,
        config: &DecorConfig,
    ) -> Result<RawImageData, DecorError> {
        match source {
            AvatarSource::Url(url) => self.load_from_url(url, config).await,
            AvatarSource::FilePath(path) => Self::load_from_file(Path::new(path), config).await,
            AvatarSource::Bytes(bytes) => Self::load_from_bytes(bytes, config),
        }
    }

    /// 从 URL 下载图片原始字节。
    pub(crate) async fn load_from_url(
        &self,
        url: &str,
        config: &DecorConfig,
    ) -> Result<RawImageData, DecorError> {
        log::debug!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url));

        validate_url_safety(url, config)?;
        let bytes = self.download_with_validation(url, config).await?;

        Ok(RawImageData {
            bytes,
            source_hint: "url",
        })
    }

    /// 从本地文件读取图片原始字节。
    pub(crate) async fn load_from_file(
        path: &Path,
        config: &DecorConfig,
    ) -> Result<RawImageData, DecorError> {
        log::debug!("📁 开始读取本地图片 - 路径: {}", path.display());

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DecorError::FileSystem(format!("文件不存在：{}", path.display()))
            } else {
                DecorError::FileSystem(format!("无法读取文件信息：{}", e))
            }
        })?;

        if !metadata.is_file() {
            return Err(DecorError::FileSystem(format!(
                "不是普通文件：{}",
                path.display()
            )));
        }
        check_size_limit(metadata.len(), config)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DecorError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    fn load_from_bytes(bytes: &[u8], config: &DecorConfig) -> Result<RawImageData, DecorError> {
        check_size_limit(bytes.len() as u64, config)?;
        validate_image_signature(bytes)?;

        Ok(RawImageData {
            bytes: bytes.to_vec(),
            source_hint: "bytes",
        })
    }

    /// 流式下载头像，手动跟随重定向。
    ///
    /// 初始 URL 由调用方校验，每个跳转目标在这里重新校验。
    pub(crate) async fn download_with_validation(
        &self,
        url: &str,
        config: &DecorConfig,
    ) -> Result<Vec<u8>, DecorError> {
        let mut current = reqwest::Url::parse(url)
            .map_err(|e| DecorError::InvalidFormat(format!("URL 格式错误：{}", e)))?;
        let mut hops = 0;

        let mut response = loop {
            let response = self
                .client
                .get(current.clone())
                .header(reqwest::header::ACCEPT, "image/*")
                .send()
                .await
                .map_err(|e| map_reqwest_error(e, current.as_str(), config))?;

            if !response.status().is_redirection() {
                break response;
            }
            if hops == config.max_redirects {
                return Err(DecorError::Network(format!(
                    "重定向次数超过限制（{}）",
                    config.max_redirects
                )));
            }

            hops += 1;
            current = redirect_target(&response, &current)?;
            validate_url_safety(current.as_str(), config)?;
            log::debug!("↪️ 第 {} 次跳转: {}", hops, redact_url_for_log(current.as_str()));
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DecorError::Network(format!(
                "头像下载失败：HTTP {}",
                status.as_u16()
            )));
        }
        check_response_headers(&response, config)?;

        read_body(&mut response, current.as_str(), config).await
    }
}

fn redirect_target(
    response: &reqwest::Response,
    base: &reqwest::Url,
) -> Result<reqwest::Url, DecorError> {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .ok_or_else(|| DecorError::Network("重定向响应缺少 Location 头".to_string()))?
        .to_str()
        .map_err(|e| DecorError::InvalidFormat(format!("重定向地址无效：{}", e)))?;

    base.join(location)
        .map_err(|e| DecorError::InvalidFormat(format!("重定向 URL 解析失败：{}", e)))
}

/// 声明的内容类型必须是 `image/*`（缺省时放行，交给签名探测），声明长度不能超限。
fn check_response_headers(
    response: &reqwest::Response,
    config: &DecorConfig,
) -> Result<(), DecorError> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    if let Some(ct) = content_type.filter(|ct| !is_image_content_type(ct)) {
        return Err(DecorError::InvalidFormat(format!("不是图片类型：{}", ct)));
    }

    response
        .content_length()
        .map_or(Ok(()), |len| check_size_limit(len, config))
}

/// 按块读取响应体：累计体积超限立即中止，前几 KB 内完成签名识别。
async fn read_body(
    response: &mut reqwest::Response,
    url: &str,
    config: &DecorConfig,
) -> Result<Vec<u8>, DecorError> {
    let capacity = response
        .content_length()
        .map(|len| len.min(config.max_file_size) as usize)
        .filter(|len| *len > 0)
        .unwrap_or(BUFFER_INITIAL_CAPACITY);
    let mut buffer = Vec::with_capacity(capacity);
    let mut recognized = false;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| map_reqwest_error(e, url, config))?
    {
        check_size_limit((buffer.len() + chunk.len()) as u64, config)?;
        buffer.extend_from_slice(&chunk);

        if !recognized {
            recognized = validate_stream_signature_probe(&buffer, STREAM_SIGNATURE_PROBE_BYTES)?;
        }
    }

    if !recognized {
        validate_image_signature(&buffer)?;
    }

    log::debug!("✅ 头像下载完成 - {} bytes", buffer.len());
    Ok(buffer)
}

/// 构建共享的 HTTP 客户端：禁用自动重定向，由下载流程逐跳校验。
pub(crate) fn build_http_client(config: &DecorConfig) -> Result<reqwest::Client, DecorError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.download_timeout))
        .connect_timeout(std::time::Duration::from_secs(config.connect_timeout))
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DecorError::Network(format!("无法创建 HTTP 客户端：{}", e)))
}

/// 只允许 http/https；默认拒绝回环、内网等地址，防止借头像地址探测内网。
///
/// 只检查字面量主机，不做 DNS 解析。
fn validate_url_safety(url: &str, config: &DecorConfig) -> Result<(), DecorError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| DecorError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DecorError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
    }
    if config.allow_private_network {
        return Ok(());
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| DecorError::InvalidFormat("URL 缺少主机地址".to_string()))?;
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    let blocked = match literal.parse::<IpAddr>() {
        Ok(ip) => is_blocked_ip(ip),
        Err(_) => literal.trim_end_matches('.').eq_ignore_ascii_case("localhost"),
    };

    if blocked {
        return Err(DecorError::InvalidFormat(format!(
            "禁止访问本地或内网地址：{}",
            host
        )));
    }
    Ok(())
}

/// 头像应来自公网 CDN；回环、私有、链路本地、组播、`0.0.0.0/8` 与
/// 运营商 NAT（`100.64.0.0/10`）地址都会被拒绝，IPv4 映射的 IPv6 按 IPv4 判断。
fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_multicast()
                || a == 0
                || (a == 100 && (64..128).contains(&b))
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_blocked_ip(IpAddr::V4(v4)),
            None => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local()
                    || v6.is_multicast()
            }
        },
    }
}

fn check_size_limit(len: u64, config: &DecorConfig) -> Result<(), DecorError> {
    if len > config.max_file_size {
        return Err(DecorError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            len as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// 日志用的 URL：去掉用户信息、查询串与片段（头像 CDN 的签名参数在查询串里）。
pub fn redact_url_for_log(url: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    parsed.set_query(None);
    parsed.set_fragment(None);
    let _ = parsed.set_username("");
    let _ = parsed.set_password(None);
    parsed.to_string()
}

fn map_reqwest_error(e: reqwest::Error, url: &str, config: &DecorConfig) -> DecorError {
    if e.is_timeout() {
        return DecorError::Timeout(format!("下载超时（{}秒）", config.download_timeout));
    }

    let detail = e.to_string().replace(url, &redact_url_for_log(url));
    if e.is_connect() {
        DecorError::Network(format!("无法连接：{}", detail))
    } else {
        DecorError::Network(format!("请求失败：{}", detail))
    }
}

/// 通过文件签名（magic bytes）校验输入是否为图片。
fn validate_image_signature(bytes: &[u8]) -> Result<(), DecorError> {
    if bytes.is_empty() {
        return Err(DecorError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| DecorError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(DecorError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 流式下载阶段的签名探测。
///
/// - `Ok(true)`：已识别为图片
/// - `Ok(false)`：字节不足以判断，继续下载
/// - `Err(...)`：已识别为非图片，或达到探测上限仍无法识别
fn validate_stream_signature_probe(bytes: &[u8], probe_limit: usize) -> Result<bool, DecorError> {
    if bytes.is_empty() {
        return Ok(false);
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(DecorError::InvalidFormat(format!(
                "下载内容不是图片类型：{}",
                kind.mime_type()
            )));
        }
        return Ok(true);
    }

    if bytes.len() >= probe_limit {
        return Err(DecorError::InvalidFormat(format!(
            "下载前 {} 字节内无法识别图片类型",
            probe_limit
        )));
    }

    Ok(false)
}
