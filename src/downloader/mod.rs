use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::common::client::client::UdemyClient;
use crate::common::models::RunConfig;
use crate::common::utils::sanitize_filename;
use crate::parser::course::CourseParser;
use crate::parser::models::{Chapter, Curriculum, RawCurriculumItem};
use crate::parser::stream_selector::{SelectedSource, select_media_source};
use crate::post_process::assets::process_supplementary_assets;
use crate::post_process::captions::download_captions;
use crate::post_process::merger::StreamMerger;

use error::DownloadError;

pub mod error;

// 章节顺序处理，章节内的课时由有界工作池并发下载
#[derive(Clone)]
pub struct CourseDownloader {
    client: UdemyClient,
    config: Arc<RunConfig>,
    semaphore: Arc<Semaphore>, // 控制并发数
}

impl CourseDownloader {
    pub fn new(client: UdemyClient, config: RunConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            client,
            config: Arc::new(config),
            semaphore,
        }
    }

    pub async fn run(&self, course_id: u64, curriculum: &Curriculum) -> Result<(), DownloadError> {
        let total_chapters = curriculum.len();

        for (index, chapter) in curriculum.iter().enumerate() {
            let ordinal = index + 1;
            info!(
                "开始下载章节: {} ({}/{})",
                chapter.title, ordinal, total_chapters
            );

            let chapter_dir = self
                .config
                .course_dir
                .join(format!("{}. {}", ordinal, sanitize_filename(&chapter.title)));
            create_directory(&chapter_dir).await?;

            // 上一章节的全部课时任务结束后才进入下一章节
            self.process_chapter(course_id, chapter, &chapter_dir).await;
        }

        Ok(())
    }

    async fn process_chapter(&self, course_id: u64, chapter: &Chapter, chapter_dir: &Path) {
        let total = chapter.children.len();
        let mut handles: Vec<JoinHandle<Result<(), DownloadError>>> = Vec::with_capacity(total);

        for (index, item) in chapter.children.iter().enumerate() {
            let this = self.clone();
            let item = item.clone();
            let chapter_dir = chapter_dir.to_path_buf();
            let semaphore = Arc::clone(&self.semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| DownloadError::Dispatch("信号量已关闭".to_string()))?;

                this.process_item(course_id, item, index + 1, total, &chapter_dir)
                    .await
            }));
        }

        let (completed, failed) = join_chapter_tasks(handles).await;
        if failed > 0 {
            warn!(
                "章节 \"{}\" 共 {} 个课时失败，{} 个完成",
                chapter.title, failed, completed
            );
        }
    }

    async fn process_item(
        &self,
        course_id: u64,
        item: RawCurriculumItem,
        ordinal: usize,
        total: usize,
        chapter_dir: &Path,
    ) -> Result<(), DownloadError> {
        // 每个目录项独占一个以ID命名的子目录，并发任务之间互不落入同一目录
        let item_dir = chapter_dir.join(item.id.to_string());
        create_directory(&item_dir).await?;

        match item.class.as_str() {
            "lecture" => {
                self.process_lecture(course_id, &item, ordinal, total, chapter_dir, &item_dir)
                    .await
            }
            // 练习项只占位，不产生下载动作
            "practice" => Ok(()),
            _ => Ok(()),
        }
    }

    async fn process_lecture(
        &self,
        course_id: u64,
        item: &RawCurriculumItem,
        ordinal: usize,
        total: usize,
        chapter_dir: &Path,
        item_dir: &Path,
    ) -> Result<(), DownloadError> {
        let parser = CourseParser::new(&self.client);
        let detail = parser.fetch_lecture_detail(course_id, item.id).await?;

        info!("开始下载课时: {} ({}/{})", item.title, ordinal, total);

        let basename = format!("{}. {}", ordinal, sanitize_filename(&item.title));

        // 字幕、附件、媒体流三者相互独立，前两者失败只记录
        if !detail.asset.captions.is_empty() {
            info!("开始下载 {} 条字幕", detail.asset.captions.len());
            if let Err(e) = download_captions(
                &self.client,
                &detail.asset.captions,
                chapter_dir,
                &basename,
                &self.config.captions_filter,
            )
            .await
            {
                error!("字幕下载失败: {}", e);
            }
        }

        if !item.supplementary_assets.is_empty() {
            info!("开始下载 {} 个附件", item.supplementary_assets.len());
            if let Err(e) = process_supplementary_assets(
                &self.client,
                &item.supplementary_assets,
                chapter_dir,
                course_id,
                detail.id,
            )
            .await
            {
                error!("附件下载失败: {}", e);
            }
        }

        let source = select_media_source(
            &item.title,
            item.is_free,
            &detail,
            self.config.decryption_key.is_some(),
        )?;

        match source {
            SelectedSource::Hls(url) => StreamMerger::merge_hls(&url, item_dir, &basename).await,
            SelectedSource::Dash(url) => {
                StreamMerger::merge_dash(
                    &url,
                    item_dir,
                    &basename,
                    self.config.decryption_key.as_ref(),
                )
                .await
            }
        }
    }
}

// 幂等地创建目录，已存在只警告
async fn create_directory(path: &Path) -> Result<(), DownloadError> {
    if path.exists() {
        warn!("目录 \"{}\" 已存在", path.display());
        return Ok(());
    }

    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

// 等待一个章节内的全部课时任务结束，失败只计数不中断兄弟任务
pub(crate) async fn join_chapter_tasks(
    handles: Vec<JoinHandle<Result<(), DownloadError>>>,
) -> (usize, usize) {
    let mut completed = 0usize;
    let mut failed = 0usize;

    for handle in handles {
        match handle.await {
            Ok(Ok(())) => completed += 1,
            Ok(Err(e)) => {
                failed += 1;
                error!("课时任务失败: {}", e);
            }
            Err(e) => {
                failed += 1;
                error!("课时任务异常退出: {}", e);
            }
        }
    }

    (completed, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_bounded_concurrency_and_failure_isolation() {
        let semaphore = Arc::new(Semaphore::new(2));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles: Vec<JoinHandle<Result<(), DownloadError>>> = Vec::new();
        for i in 0..8 {
            let semaphore = Arc::clone(&semaphore);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| DownloadError::Dispatch("信号量已关闭".to_string()))?;

                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                current.fetch_sub(1, Ordering::SeqCst);

                if i == 3 {
                    return Err(DownloadError::MissingSource("模拟缺少媒体源".to_string()));
                }
                Ok(())
            }));
        }

        let (completed, failed) = join_chapter_tasks(handles).await;

        assert_eq!(completed, 7);
        assert_eq!(failed, 1);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_create_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chapter");

        create_directory(&target).await.unwrap();
        create_directory(&target).await.unwrap();

        assert!(target.is_dir());
    }
}
