use std::path::Path;

use chardetng::EncodingDetector;
use tracing::{debug, warn};

use crate::common::client::client::UdemyClient;
use crate::downloader::error::DownloadError;
use crate::parser::models::Caption;

// 按配置的语言/标签集合过滤字幕轨
pub fn filter_captions<'a>(captions: &'a [Caption], filter: &[String]) -> Vec<&'a Caption> {
    captions
        .iter()
        .filter(|c| {
            filter
                .iter()
                .any(|wanted| c.locale_id == *wanted || c.video_label == *wanted)
        })
        .collect()
}

fn caption_extension(caption: &Caption) -> &str {
    caption
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("vtt")
}

// 下载命中过滤集合的字幕轨，单条失败不影响其余
pub async fn download_captions(
    client: &UdemyClient,
    captions: &[Caption],
    save_dir: &Path,
    basename: &str,
    filter: &[String],
) -> Result<(), DownloadError> {
    for caption in filter_captions(captions, filter) {
        if caption.url.is_empty() {
            warn!("字幕 {} 缺少下载地址，已跳过", caption.locale_id);
            continue;
        }

        let file_name = format!(
            "{}.{}.{}",
            basename,
            caption.locale_id,
            caption_extension(caption)
        );

        if let Err(e) = download_one(client, caption, save_dir, &file_name).await {
            warn!("字幕 {} 下载失败: {}", caption.locale_id, e);
        }
    }

    Ok(())
}

async fn download_one(
    client: &UdemyClient,
    caption: &Caption,
    save_dir: &Path,
    file_name: &str,
) -> Result<(), DownloadError> {
    let resp = client
        .get_raw_response(&caption.url)
        .await
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    let raw_bytes = resp
        .bytes()
        .await
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    // 字幕编码不可靠，自动探测后统一转成UTF-8落盘
    let mut detector = EncodingDetector::new();
    detector.feed(&raw_bytes, true);
    let encoding = detector.guess(None, true);

    let (decoded, _, had_errors) = encoding.decode(&raw_bytes);
    if had_errors {
        warn!("字幕解码过程中发现错误，可能存在字符丢失");
    }

    let output_path = save_dir.join(file_name);
    tokio::fs::write(&output_path, decoded.into_owned()).await?;

    debug!("字幕下载完成: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(locale: &str, label: &str, file_name: &str) -> Caption {
        Caption {
            locale_id: locale.to_string(),
            video_label: label.to_string(),
            file_name: file_name.to_string(),
            url: "https://example.com/caption".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_by_locale_id() {
        let captions = vec![
            caption("en_US", "English", "en.vtt"),
            caption("zh_CN", "中文", "zh.vtt"),
        ];
        let filter = vec!["en_US".to_string()];

        let wanted = filter_captions(&captions, &filter);
        assert_eq!(wanted.len(), 1);
        assert_eq!(wanted[0].locale_id, "en_US");
    }

    #[test]
    fn test_filter_by_label() {
        let captions = vec![
            caption("en_US", "English", "en.vtt"),
            caption("zh_CN", "中文", "zh.vtt"),
        ];
        let filter = vec!["中文".to_string()];

        let wanted = filter_captions(&captions, &filter);
        assert_eq!(wanted.len(), 1);
        assert_eq!(wanted[0].locale_id, "zh_CN");
    }

    #[test]
    fn test_filter_no_match() {
        let captions = vec![caption("en_US", "English", "en.vtt")];
        let filter = vec!["ja_JP".to_string()];

        assert!(filter_captions(&captions, &filter).is_empty());
    }

    #[test]
    fn test_caption_extension_fallback() {
        assert_eq!(caption_extension(&caption("en_US", "", "a.srt")), "srt");
        assert_eq!(caption_extension(&caption("en_US", "", "noext")), "vtt");
    }
}
