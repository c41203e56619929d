use tracing::warn;

use super::errors::ParseError;
use super::models::LectureDetail;

pub const SOURCE_HLS: &str = "application/x-mpegURL";
pub const SOURCE_DASH: &str = "application/dash+xml";
pub const SOURCE_MP4: &str = "video/mp4";

// 选中的媒体源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedSource {
    Hls(String),
    Dash(String),
}

// 按课时的付费级别选择媒体源。免费课时只走M3U8，付费课时只走MPD，
// 两边不互相回退；付费课时仅有MP4直连时按不支持处理。
pub fn select_media_source(
    title: &str,
    is_free: bool,
    detail: &LectureDetail,
    has_key: bool,
) -> Result<SelectedSource, ParseError> {
    let find = |kind: &str| {
        detail
            .asset
            .media_sources
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.src.clone())
    };

    if is_free {
        return match find(SOURCE_HLS) {
            Some(url) => Ok(SelectedSource::Hls(url)),
            None => Err(ParseError::MissingSource(format!(
                "下载 \"{}\" 所需的M3U8地址缺失或无法定位",
                title
            ))),
        };
    }

    match find(SOURCE_DASH) {
        Some(url) => {
            if !has_key {
                warn!(
                    "课时 \"{}\" 受DRM保护，缺少Widevine解密密钥，下载结果可能无法播放",
                    title
                );
            }
            Ok(SelectedSource::Dash(url))
        }
        None => match find(SOURCE_MP4) {
            Some(_) => Err(ParseError::UnsupportedFormat(format!(
                "课时 \"{}\" 以MP4直连方式提供，暂不支持下载该格式",
                title
            ))),
            None => Err(ParseError::MissingSource(format!(
                "下载 \"{}\" 所需的MPD地址缺失或无法定位",
                title
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::{LectureAsset, MediaSource};

    fn detail_with_sources(sources: Vec<(&str, &str)>) -> LectureDetail {
        LectureDetail {
            id: 1,
            asset: LectureAsset {
                captions: Vec::new(),
                media_sources: sources
                    .into_iter()
                    .map(|(kind, src)| MediaSource {
                        kind: kind.to_string(),
                        src: src.to_string(),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_free_lecture_selects_hls() {
        let detail = detail_with_sources(vec![(SOURCE_HLS, "https://e.com/a.m3u8")]);
        let selected = select_media_source("L", true, &detail, false).unwrap();
        assert_eq!(selected, SelectedSource::Hls("https://e.com/a.m3u8".to_string()));
    }

    #[test]
    fn test_free_lecture_never_falls_back_to_dash() {
        let detail = detail_with_sources(vec![(SOURCE_DASH, "https://e.com/a.mpd")]);
        let result = select_media_source("L", true, &detail, false);
        assert!(matches!(result, Err(ParseError::MissingSource(_))));
    }

    #[test]
    fn test_paid_lecture_prefers_dash_over_mp4() {
        let detail = detail_with_sources(vec![
            (SOURCE_MP4, "https://e.com/a.mp4"),
            (SOURCE_DASH, "https://e.com/a.mpd"),
        ]);
        let selected = select_media_source("L", false, &detail, true).unwrap();
        assert_eq!(selected, SelectedSource::Dash("https://e.com/a.mpd".to_string()));
    }

    #[test]
    fn test_paid_lecture_mp4_only_is_unsupported() {
        let detail = detail_with_sources(vec![(SOURCE_MP4, "https://e.com/a.mp4")]);
        let result = select_media_source("L", false, &detail, true);
        assert!(matches!(result, Err(ParseError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_paid_lecture_without_sources_is_missing() {
        let detail = detail_with_sources(vec![]);
        let result = select_media_source("L", false, &detail, true);
        assert!(matches!(result, Err(ParseError::MissingSource(_))));
    }

    #[test]
    fn test_paid_lecture_without_key_still_selects_dash() {
        let detail = detail_with_sources(vec![(SOURCE_DASH, "https://e.com/a.mpd")]);
        let selected = select_media_source("L", false, &detail, false).unwrap();
        assert_eq!(selected, SelectedSource::Dash("https://e.com/a.mpd".to_string()));
    }
}
