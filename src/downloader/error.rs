use thiserror::Error;

use crate::parser::errors::ParseError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("网络错误: {0}")]
    Network(String),
    #[error("解析错误: {0}")]
    Parse(String),
    #[error("缺少可用的媒体源: {0}")]
    MissingSource(String),
    #[error("不支持的媒体格式: {0}")]
    UnsupportedFormat(String),
    #[error("外部工具执行失败: {0}")]
    ExternalTool(String),
    #[error("未检测到外部工具: {0}")]
    ToolNotFound(String),
    #[error("任务调度失败: {0}")]
    Dispatch(String),
}

impl From<ParseError> for DownloadError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::MissingSource(msg) => DownloadError::MissingSource(msg),
            ParseError::UnsupportedFormat(msg) => DownloadError::UnsupportedFormat(msg),
            ParseError::NetworkError(msg) => DownloadError::Network(msg),
            _ => DownloadError::Parse(err.to_string()),
        }
    }
}
