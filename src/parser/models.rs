use serde::{Deserialize, Serialize};

// 课程基本信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInfo {
    pub id: u64,
    pub title: String,
}

// 目录接口返回的单个条目，_class 取值 chapter / lecture / practice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCurriculumItem {
    #[serde(rename = "_class", default)]
    pub class: String,
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub supplementary_assets: Vec<SupplementaryAsset>,
}

// 章节，children 的顺序决定磁盘上的编号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub children: Vec<RawCurriculumItem>,
}

pub type Curriculum = Vec<Chapter>;

// 分页接口的单页响应
#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<RawCurriculumItem>,
    #[serde(default)]
    pub detail: Option<String>,
}

// 课时详情，下载时逐个拉取，用完即弃
#[derive(Debug, Clone, Deserialize)]
pub struct LectureDetail {
    pub id: u64,
    #[serde(default)]
    pub asset: LectureAsset,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LectureAsset {
    #[serde(default)]
    pub captions: Vec<Caption>,
    #[serde(default)]
    pub media_sources: Vec<MediaSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaSource {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub src: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub locale_id: String,
    #[serde(default)]
    pub video_label: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub url: String,
}

// 课时附带的补充资料
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplementaryAsset {
    pub id: u64,
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filename: String,
}
