use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::common::client::client::UdemyClient;

use super::errors::ParseError;
use super::models::{CourseInfo, LectureDetail};

fn course_url(base: &str, course_id: u64) -> String {
    format!("{}/api-2.0/courses/{}/", base, course_id)
}

fn lecture_url(base: &str, course_id: u64, lecture_id: u64) -> String {
    format!(
        "{}/api-2.0/users/me/subscribed-courses/{}/lectures/{}/?fields[lecture]=asset,description,download_url,is_free,last_watched_second&fields[asset]=asset_type,length,media_license_token,course_is_drmed,media_sources,captions,thumbnail_sprite,slides,slide_urls,download_urls",
        base, course_id, lecture_id
    )
}

pub struct CourseParser<'a> {
    client: &'a UdemyClient,
}

impl<'a> CourseParser<'a> {
    pub fn new(client: &'a UdemyClient) -> Self {
        Self { client }
    }

    // 从课程落地页提取课程ID
    pub async fn extract_course_id(&self, course_page_url: &str) -> Result<u64, ParseError> {
        lazy_static! {
            // og:image 的地址里带有 /{course_id}_ 形式的数字段
            static ref OG_IMAGE_PATTERN: Regex =
                Regex::new(r#"<meta\s+property="og:image"\s+content="([^"]+)""#).unwrap();
            static ref COURSE_ID_PATTERN: Regex = Regex::new(r"/(\d+)_").unwrap();
        }

        info!("正在获取课程ID");
        let content = self.client.get_text(course_page_url).await?;

        let image_url = OG_IMAGE_PATTERN
            .captures(&content)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| {
                ParseError::ParseError(
                    "无法从课程链接中提取课程ID，请检查链接是否正确，或改用 --id 直接指定"
                        .to_string(),
                )
            })?;

        let course_id = COURSE_ID_PATTERN
            .captures(image_url.as_str())
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| {
                ParseError::ParseError(
                    "无法从课程链接中提取课程ID，请检查链接是否正确，或改用 --id 直接指定"
                        .to_string(),
                )
            })?
            .as_str()
            .parse::<u64>()
            .map_err(|e| ParseError::ParseError(e.to_string()))?;

        info!("课程ID提取成功: {}", course_id);
        Ok(course_id)
    }

    // 获取课程基本信息
    pub async fn fetch_course(&self, course_id: u64) -> Result<CourseInfo, ParseError> {
        let value: serde_json::Value = self
            .client
            .get(&course_url(self.client.base_url(), course_id))
            .await?;

        if value.get("detail").and_then(|v| v.as_str()) == Some("Not found.") {
            return Err(ParseError::NotFound(
                "根据提供的ID或链接找不到课程，请确认课程ID/链接正确，且课程公开可见或你拥有访问权限"
                    .to_string(),
            ));
        }

        let info: CourseInfo =
            serde_json::from_value(value).map_err(|e| ParseError::ParseError(e.to_string()))?;

        debug!("课程信息: {:?}", info);
        Ok(info)
    }

    // 获取单个课时的详细资产信息
    pub async fn fetch_lecture_detail(
        &self,
        course_id: u64,
        lecture_id: u64,
    ) -> Result<LectureDetail, ParseError> {
        let value: serde_json::Value = self
            .client
            .get(&lecture_url(self.client.base_url(), course_id, lecture_id))
            .await?;

        if value.get("detail").and_then(|v| v.as_str()) == Some("Not found.") {
            return Err(ParseError::NotFound(format!(
                "课时 {} 的详情不存在",
                lecture_id
            )));
        }

        serde_json::from_value(value).map_err(|e| ParseError::ParseError(e.to_string()))
    }
}
