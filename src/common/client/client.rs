use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cookie::Cookie;
use cookie_store::CookieStore;
use flate2::read::GzDecoder;
use reqwest::{
    Client, ClientBuilder, Response, Url,
    header::{ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, REFERER, USER_AGENT},
};
use reqwest_cookie_store::CookieStoreMutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tracing::{debug, error};

use crate::common::client::error::ApiError;

pub const UDEMY_BASE: &str = "https://www.udemy.com";

// 自动携带认证Cookie的客户端
#[derive(Debug, Clone)]
pub struct UdemyClient {
    pub inner: Client,
    pub cookie_store: Arc<CookieStoreMutex>,
    base_url: String,
}

impl UdemyClient {
    // 创建基础客户端，未认证
    pub fn new() -> Self {
        // 创建 CookieStore
        let cookie_store = CookieStore::default();
        let cookie_store = CookieStoreMutex::new(cookie_store);
        let cookie_store = Arc::new(cookie_store);

        Self {
            inner: match ClientBuilder::new()
                .timeout(Duration::from_secs(30))
                .cookie_provider(Arc::clone(&cookie_store))
                .default_headers(Self::get_default_headers())
                .build()
            {
                Ok(client) => client,
                Err(e) => {
                    error!("Error creating client: {}", e);
                    panic!("Failed to create client");
                }
            },
            cookie_store,
            base_url: UDEMY_BASE.to_string(),
        }
    }

    // 从Netscape格式的cookies.txt创建已认证的客户端
    pub fn with_cookie_file(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let client = Self::new();
        client.load_cookie_file(path.as_ref())?;
        Ok(client)
    }

    // 替换API入口，测试时指向本地服务
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get_default_headers() -> reqwest::header::HeaderMap {
        // 创建默认请求头
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(ACCEPT, reqwest::header::HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,*/*;q=0.8"));
        headers.insert(
            ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(
            ACCEPT_ENCODING,
            reqwest::header::HeaderValue::from_static("gzip, deflate"),
        );
        headers.insert(
            REFERER,
            reqwest::header::HeaderValue::from_static("https://www.udemy.com/"),
        );
        headers.insert(USER_AGENT, reqwest::header::HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));

        headers
    }

    // 加载Netscape格式的Cookie文件，#HttpOnly_前缀的行也是有效Cookie
    fn load_cookie_file(&self, path: &Path) -> Result<(), ApiError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::CookieFile(format!("无法读取 {}: {}", path.display(), e))
        })?;

        let mut store = self.cookie_store.lock().unwrap();
        let mut loaded = 0usize;

        for line in content.lines() {
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            // 七列: domain / include_subdomains / path / secure / expiry / name / value
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 7 {
                continue;
            }

            let domain = fields[0].trim_start_matches('.');
            let cookie = Cookie::build((fields[5], fields[6]))
                .domain(domain.to_string())
                .path(fields[2].to_string())
                .into();

            let url = Url::parse(&format!("https://{}/", domain))
                .map_err(|e| ApiError::CookieFile(e.to_string()))?;

            if store.insert_raw(&cookie, &url).is_ok() {
                loaded += 1;
            }
        }

        if loaded == 0 {
            return Err(ApiError::CookieFile(
                "文件中没有任何可用的认证Cookie，请确认其为Netscape格式".to_string(),
            ));
        }

        debug!("已从 {} 加载 {} 条Cookie", path.display(), loaded);
        Ok(())
    }

    // 通用GET请求，返回反序列化后的JSON
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self.inner.get(url).send().await.map_err(|e| {
            error!("请求失败: {}", e);
            ApiError::Network(e)
        })?;

        debug!("Response Head: {:?}", resp);

        Self::handle_response::<T>(resp).await
    }

    // 获取原始响应，供流式写盘使用
    pub async fn get_raw_response(&self, url: &str) -> Result<Response, ApiError> {
        let resp = self.inner.get(url).send().await?;
        Ok(resp)
    }

    // 获取原始文本内容（课程落地页等非JSON资源）
    pub async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let resp = self.inner.get(url).send().await?;
        let raw_body = resp.bytes().await?;

        let decompressed = match Self::try_decompress(&raw_body) {
            Ok(data) => data,
            Err(_) => raw_body.to_vec(), // 解压失败则原样使用
        };

        Ok(String::from_utf8_lossy(&decompressed).into_owned())
    }

    fn try_decompress(raw: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut decoder = GzDecoder::new(raw);
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;
        Ok(decoded)
    }

    async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_server_error() {
            return Err(ApiError::InvalidResponse(format!(
                "服务端错误: {}",
                status
            )));
        }

        let url = resp.url().to_string();
        let raw_body = resp.bytes().await?;

        let decompressed = match Self::try_decompress(&raw_body) {
            Ok(data) => data,
            Err(_) => raw_body.to_vec(), // 解压失败则原样使用
        };

        let text = String::from_utf8_lossy(&decompressed);

        // 首先尝试解析 JSON
        match serde_json::from_str::<Value>(&text) {
            Ok(json_value) => {
                debug!("json_value: {}", json_value);

                // 尝试将 JSON 解析为目标类型
                match serde_json::from_value::<T>(json_value) {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        error!("失败的请求的URL: {}", url);
                        error!("JSON 结构匹配失败: {}", e);
                        error!("期望的结构 可能是: {}", std::any::type_name::<T>());
                        Err(ApiError::InvalidResponse(format!(
                            "结构匹配失败: {}",
                            e
                        )))
                    }
                }
            }
            Err(_) => {
                // 不是 JSON，可能是登录失效后跳转的 HTML 页面
                if text.contains("<!DOCTYPE html>") || text.contains("<html") {
                    return Err(ApiError::InvalidResponse(
                        "返回了HTML页面，Cookie可能已失效".to_string(),
                    ));
                }

                Err(ApiError::InvalidResponse(text.to_string()))
            }
        }
    }
}
