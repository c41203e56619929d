use clap::Parser;
use std::path::PathBuf;

/// Udemy课程下载器
#[derive(Parser, Debug)]
#[command(name = "udemydl")]
#[command(version = "1.0")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "一个简单的Udemy课程下载工具", long_about = None)]
pub struct Cli {
    /// 课程ID
    #[arg(long, short = 'i', value_name = "ID")]
    pub id: Option<u64>,

    /// 课程链接
    #[arg(long, short = 'u', value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// Widevine解密密钥 (kid:key 形式，下载DRM保护的视频时使用)
    #[arg(long, short = 'k', value_name = "KEY")]
    pub key: Option<String>,

    /// cookies.txt 文件路径 (Netscape格式)
    #[arg(long, short = 'c', value_name = "FILE")]
    #[arg(default_value = "cookies.txt")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub cookies: PathBuf,

    /// 从缓存文件加载课程目录，跳过拉取 (可指定路径，默认 ~/course.json)
    #[arg(long, short = 'l', value_name = "FILE", num_args = 0..=1)]
    pub load: Option<Option<PathBuf>>,

    /// 拉取后把课程目录保存到缓存文件 (可指定路径，默认 ~/course.json)
    #[arg(long, short = 's', value_name = "FILE", num_args = 0..=1)]
    pub save: Option<Option<PathBuf>>,

    /// 要下载的字幕语言，多个语言用逗号分隔
    #[arg(long, value_name = "LOCALES")]
    #[arg(help = "指定要下载的字幕语言，如: en_US,zh_CN")]
    pub captions: Option<String>,

    /// 课程保存目录
    #[arg(long, value_name = "DIR")]
    #[arg(default_value = ".")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    #[arg(long, short = 't', value_name = "并发数", default_value_t = 4)]
    pub concurrency: usize,
}
