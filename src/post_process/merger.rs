use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::common::models::DecryptionKey;
use crate::downloader::error::DownloadError;

// 自适应流的拉取与合并交给外部工具完成，这里只负责调用并检查结果
pub struct StreamMerger;

impl StreamMerger {
    // 检查外部工具是否就绪
    pub async fn check_prerequisites() -> Result<(), DownloadError> {
        debug!("检查系统中是否安装了 ffmpeg...");
        if !Self::probe(&Self::ffmpeg_cmd(), "-version").await {
            error!("❌ 未检测到 ffmpeg，请确保系统中已安装并配置了 ffmpeg 可执行路径。");
            error!("安装方法参考：https://ffmpeg.org/download.html");
            error!("或者设置环境变量 FFMPEG_PATH 指向 ffmpeg 可执行文件路径");
            return Err(DownloadError::ToolNotFound("ffmpeg".to_string()));
        }

        debug!("检查系统中是否安装了 n_m3u8dl-re...");
        if !Self::probe(&Self::n_m3u8dl_cmd(), "--version").await {
            error!("❌ 未检测到 n_m3u8dl-re，请确保系统中已安装 mp4decrypt 与 n_m3u8dl-re。");
            error!("或者设置环境变量 N_M3U8DL_RE_PATH 指向 n_m3u8dl-re 可执行文件路径");
            return Err(DownloadError::ToolNotFound("n_m3u8dl-re".to_string()));
        }

        Ok(())
    }

    // 拉取并合并 HLS 流
    pub async fn merge_hls(
        url: &str,
        save_dir: &Path,
        save_name: &str,
    ) -> Result<(), DownloadError> {
        Self::run_n_m3u8dl(url, save_dir, save_name, None).await
    }

    // 拉取并合并 DASH 流，密钥缺失时照常下载
    pub async fn merge_dash(
        url: &str,
        save_dir: &Path,
        save_name: &str,
        key: Option<&DecryptionKey>,
    ) -> Result<(), DownloadError> {
        Self::run_n_m3u8dl(url, save_dir, save_name, key).await
    }

    fn ffmpeg_cmd() -> String {
        std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string())
    }

    fn n_m3u8dl_cmd() -> String {
        std::env::var("N_M3U8DL_RE_PATH").unwrap_or_else(|_| "n_m3u8dl-re".to_string())
    }

    async fn probe(cmd: &str, arg: &str) -> bool {
        Command::new(cmd)
            .arg(arg)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn run_n_m3u8dl(
        url: &str,
        save_dir: &Path,
        save_name: &str,
        key: Option<&DecryptionKey>,
    ) -> Result<(), DownloadError> {
        debug!("开始拉取媒体流 -> 输出目录: {:?}", save_dir);

        let mut cmd = Command::new(Self::n_m3u8dl_cmd());
        cmd.arg(url)
            .arg("--save-dir")
            .arg(save_dir)
            .arg("--save-name")
            .arg(save_name)
            .arg("--auto-select")
            .arg("--concurrent-download")
            .arg("-M")
            .arg("format=mp4");

        if let Some(key) = key {
            cmd.arg("--key").arg(key.as_arg());
        }

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            error!("❌ 媒体流拉取合并失败，错误日志如下：\n{}", err_msg);

            error!(
                "请检查以下几点：\n\
                1. 媒体流地址是否已过期；\n\
                2. Cookie是否仍然有效；\n\
                3. 是否有写入权限到输出路径：{:?};",
                save_dir
            );

            return Err(DownloadError::ExternalTool(err_msg.to_string()));
        }

        info!("✅ 媒体流拉取合并完成: {}", save_name);
        Ok(())
    }
}
