use thiserror::Error;

use crate::common::client::error::ApiError;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("无效的课程链接")]
    InvalidUrl,
    #[error("资源不存在: {0}")]
    NotFound(String),
    #[error("网络错误: {0}")]
    NetworkError(String),
    #[error("解析错误: {0}")]
    ParseError(String),
    #[error("缺少可用的媒体源: {0}")]
    MissingSource(String),
    #[error("不支持的媒体格式: {0}")]
    UnsupportedFormat(String),
}

impl From<ApiError> for ParseError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(e) => ParseError::NetworkError(e.to_string()),
            ApiError::InvalidResponse(msg) => ParseError::ParseError(msg),
            _ => ParseError::ParseError(err.to_string()),
        }
    }
}
