use clap::Parser;
use colored::Colorize;
use tracing::{error, info, warn};

use udemy_downloader::common::client::client::UdemyClient;
use udemy_downloader::common::models::{DecryptionKey, RunConfig};
use udemy_downloader::common::utils::{default_cache_path, sanitize_filename};
use udemy_downloader::downloader::CourseDownloader;
use udemy_downloader::parser::cache;
use udemy_downloader::parser::course::CourseParser;
use udemy_downloader::parser::curriculum::CurriculumFetcher;
use udemy_downloader::parser::models::Curriculum;
use udemy_downloader::post_process::merger::StreamMerger;

mod cli;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 解析并校验解密密钥
fn parse_decryption_key(args: &cli::Cli) -> Result<Option<DecryptionKey>> {
    match &args.key {
        None => Ok(None),
        Some(raw) => match DecryptionKey::parse(raw) {
            Some(key) => Ok(Some(key)),
            None => {
                Err("提供的Widevine密钥格式不正确，应为 kid:key 形式，请检查后重试".into())
            }
        },
    }
}

/// 解析字幕语言过滤集合，默认只下载 en_US
fn parse_captions_filter(args: &cli::Cli) -> Vec<String> {
    match &args.captions {
        Some(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec!["en_US".to_string()],
    }
}

/// 解析课程ID，--id 优先于 --url
async fn resolve_course_id(client: &UdemyClient, args: &cli::Cli) -> Result<u64> {
    if let Some(id) = args.id {
        if args.url.is_some() {
            warn!("同时提供了课程ID与课程链接，优先使用课程ID");
        }
        return Ok(id);
    }

    match &args.url {
        Some(url) => {
            let parser = CourseParser::new(client);
            Ok(parser.extract_course_id(url).await?)
        }
        None => Err("必须通过 --id 提供课程ID，或通过 --url 提供课程链接".into()),
    }
}

/// 获取或从缓存加载课程目录结构
async fn load_or_fetch_curriculum(
    client: &UdemyClient,
    args: &cli::Cli,
    course_id: u64,
) -> Result<Curriculum> {
    let curriculum = match &args.load {
        Some(explicit) => {
            let path = explicit.clone().unwrap_or_else(default_cache_path);
            let curriculum = cache::load(&path)?;
            info!("课程目录已从 {} 加载", path.display());
            curriculum
        }
        None => {
            let fetcher = CurriculumFetcher::new(client);
            let items = fetcher.fetch(course_id).await?;
            CurriculumFetcher::organize(items)
        }
    };

    if let Some(explicit) = &args.save {
        let path = explicit.clone().unwrap_or_else(default_cache_path);
        cache::save(&curriculum, &path)?;
        info!("课程目录已保存到 {}", path.display());
    }

    Ok(curriculum)
}

/// 主流程
async fn run(args: cli::Cli) -> Result<()> {
    let key = parse_decryption_key(&args)?;
    let captions_filter = parse_captions_filter(&args);

    StreamMerger::check_prerequisites().await?;

    let client = UdemyClient::with_cookie_file(&args.cookies).map_err(|e| {
        error!(
            "提供的Cookie文件无法读取或格式不正确，请确认其为包含有效认证Cookie的Netscape格式文件"
        );
        e
    })?;

    let course_id = resolve_course_id(&client, &args).await?;
    let course_info = CourseParser::new(&client).fetch_course(course_id).await?;
    info!("课程标题: {}", course_info.title);

    let course_dir = args.output_dir.join(sanitize_filename(&course_info.title));
    tokio::fs::create_dir_all(&course_dir).await?;

    let curriculum = load_or_fetch_curriculum(&client, &args, course_id).await?;

    let config = RunConfig {
        course_dir,
        decryption_key: key,
        captions_filter,
        concurrency: args.concurrency,
    };

    info!("课程下载即将开始，请等待全部资料下载完成");
    let downloader = CourseDownloader::new(client, config);
    downloader.run(course_id, &curriculum).await?;

    info!("{}", "全部课程资料下载完成！".green());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // 解析命令行参数
    let args = cli::Cli::parse();

    tokio::select! {
        result = run(args) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("收到中断信号，正在退出");
            Ok(())
        }
    }
}
