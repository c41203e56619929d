use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::common::client::client::UdemyClient;

use super::errors::ParseError;
use super::models::{Chapter, Curriculum, CurriculumPage, RawCurriculumItem};

fn curriculum_url(base: &str, course_id: u64) -> String {
    format!(
        "{}/api-2.0/courses/{}/subscriber-curriculum-items/?page_size=100&fields[lecture]=title,object_index,is_published,sort_order,created,asset,supplementary_assets,is_free&fields[quiz]=title,object_index,is_published,sort_order,type&fields[practice]=title,object_index,is_published,sort_order&fields[chapter]=title,object_index,is_published,sort_order&fields[asset]=title,filename,asset_type,status,time_estimation,is_external",
        base, course_id
    )
}

pub struct CurriculumFetcher<'a> {
    client: &'a UdemyClient,
}

impl<'a> CurriculumFetcher<'a> {
    pub fn new(client: &'a UdemyClient) -> Self {
        Self { client }
    }

    // 沿next游标逐页拉取课程目录，总数以首页为准
    pub async fn fetch(&self, course_id: u64) -> Result<Vec<RawCurriculumItem>, ParseError> {
        info!("开始拉取课程目录，可能需要一段时间");

        let mut url = curriculum_url(self.client.base_url(), course_id);
        let mut all_results: Vec<RawCurriculumItem> = Vec::new();
        let mut total_count = 0u64;

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );

        loop {
            let page: CurriculumPage = self.client.get(&url).await?;

            if page.detail.as_deref() == Some("Not found.") {
                pb.finish_and_clear();
                return Err(ParseError::NotFound(
                    "课程存在，但无法获取课程目录（课时与资料），可能是接口受限或课程结构异常"
                        .to_string(),
                ));
            }

            if total_count == 0 {
                total_count = page.count;
                pb.set_length(total_count);
            }

            all_results.extend(page.results);
            pb.set_position(all_results.len() as u64);
            debug!("目录拉取进度: {}/{}", all_results.len(), total_count);

            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        pb.finish_and_clear();
        Ok(all_results)
    }

    // 把扁平的目录项折叠成 章节 -> 课时 的两层结构
    pub fn organize(items: Vec<RawCurriculumItem>) -> Curriculum {
        let mut curriculum: Curriculum = Vec::new();

        for item in items {
            if item.class == "chapter" {
                curriculum.push(Chapter {
                    id: item.id,
                    title: item.title,
                    description: item.description,
                    is_published: item.is_published,
                    children: Vec::new(),
                });
            } else if item.class == "lecture" || item.class == "practice" {
                match curriculum.last_mut() {
                    Some(chapter) => chapter.children.push(item),
                    None => {
                        // 没有所属章节的课时/练习项直接丢弃，不自动补建章节
                        warn!("发现没有所属章节的课时或练习项，已丢弃: {}", item.title);
                    }
                }
            }
        }

        info!("共发现章节: {}", curriculum.len());
        info!("共发现课时: {}", count_lectures(&curriculum));

        curriculum
    }
}

// 统计课时数，练习项不计入
pub fn count_lectures(curriculum: &Curriculum) -> usize {
    curriculum
        .iter()
        .flat_map(|chapter| chapter.children.iter())
        .filter(|item| item.class == "lecture")
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(class: &str, id: u64, title: &str) -> RawCurriculumItem {
        RawCurriculumItem {
            class: class.to_string(),
            id,
            title: title.to_string(),
            is_published: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_organize_two_chapters() {
        let items = vec![
            item("chapter", 1, "A"),
            item("lecture", 11, "L1"),
            item("practice", 12, "P1"),
            item("chapter", 2, "B"),
            item("lecture", 21, "L2"),
        ];

        let curriculum = CurriculumFetcher::organize(items);

        assert_eq!(curriculum.len(), 2);
        assert_eq!(curriculum[0].title, "A");
        assert_eq!(curriculum[0].children.len(), 2);
        assert_eq!(curriculum[0].children[0].title, "L1");
        assert_eq!(curriculum[0].children[1].title, "P1");
        assert_eq!(curriculum[1].title, "B");
        assert_eq!(curriculum[1].children.len(), 1);
        assert_eq!(curriculum[1].children[0].title, "L2");
        assert_eq!(count_lectures(&curriculum), 2);
    }

    #[test]
    fn test_organize_drops_orphan_lecture() {
        let items = vec![item("lecture", 10, "L0"), item("chapter", 1, "A")];

        let curriculum = CurriculumFetcher::organize(items);

        assert_eq!(curriculum.len(), 1);
        assert_eq!(curriculum[0].title, "A");
        assert!(curriculum[0].children.is_empty());
        assert_eq!(count_lectures(&curriculum), 0);
    }

    #[test]
    fn test_organize_preserves_order() {
        let items = vec![
            item("chapter", 1, "A"),
            item("lecture", 11, "L1"),
            item("lecture", 12, "L2"),
            item("lecture", 13, "L3"),
        ];

        let curriculum = CurriculumFetcher::organize(items);

        let ids: Vec<u64> = curriculum[0].children.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![11, 12, 13]);
    }

    #[test]
    fn test_organize_attaches_to_latest_chapter_only() {
        let items = vec![
            item("chapter", 1, "A"),
            item("chapter", 2, "B"),
            item("lecture", 21, "L"),
        ];

        let curriculum = CurriculumFetcher::organize(items);

        assert!(curriculum[0].children.is_empty());
        assert_eq!(curriculum[1].children.len(), 1);
    }

    #[test]
    fn test_organize_ignores_unknown_class() {
        let items = vec![
            item("chapter", 1, "A"),
            item("quiz", 15, "Q1"),
            item("lecture", 11, "L1"),
        ];

        let curriculum = CurriculumFetcher::organize(items);

        assert_eq!(curriculum[0].children.len(), 1);
        assert_eq!(curriculum[0].children[0].title, "L1");
    }
}
