use std::path::Path;

use futures::StreamExt;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::common::client::client::UdemyClient;
use crate::common::utils::sanitize_filename;
use crate::downloader::error::DownloadError;
use crate::parser::models::SupplementaryAsset;

fn file_asset_url(base: &str, course_id: u64, lecture_id: u64, asset_id: u64) -> String {
    format!(
        "{}/api-2.0/users/me/subscribed-courses/{}/lectures/{}/supplementary-assets/{}?fields[asset]=download_urls",
        base, course_id, lecture_id, asset_id
    )
}

fn link_asset_url(base: &str, course_id: u64, lecture_id: u64, asset_id: u64) -> String {
    format!(
        "{}/api-2.0/users/me/subscribed-courses/{}/lectures/{}/supplementary-assets/{}?fields[asset]=external_url",
        base, course_id, lecture_id, asset_id
    )
}

// 按类型分发课时附件，未知类型跳过
pub async fn process_supplementary_assets(
    client: &UdemyClient,
    assets: &[SupplementaryAsset],
    save_dir: &Path,
    course_id: u64,
    lecture_id: u64,
) -> Result<(), DownloadError> {
    for asset in assets {
        match asset.asset_type.as_str() {
            "File" => download_file_asset(client, asset, save_dir, course_id, lecture_id).await?,
            "ExternalLink" => {
                save_external_link(client, asset, save_dir, course_id, lecture_id).await?
            }
            "Article" => {}
            other => {
                error!("不支持的附件类型: {}，已跳过附件: {}", other, asset.title);
            }
        }
    }

    Ok(())
}

async fn download_file_asset(
    client: &UdemyClient,
    asset: &SupplementaryAsset,
    save_dir: &Path,
    course_id: u64,
    lecture_id: u64,
) -> Result<(), DownloadError> {
    let assets_dir = save_dir.join("assets");
    tokio::fs::create_dir_all(&assets_dir).await?;

    let file_name = if asset.filename.is_empty() {
        asset.id.to_string()
    } else {
        sanitize_filename(&asset.filename)
    };
    let target = assets_dir.join(&file_name);

    if target.exists() {
        warn!("附件 {} 已存在于 {}，跳过", asset.title, target.display());
        return Ok(());
    }

    let meta: Value = client
        .get(&file_asset_url(
            client.base_url(),
            course_id,
            lecture_id,
            asset.id,
        ))
        .await
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    let file_url = meta["download_urls"]["File"][0]["file"]
        .as_str()
        .ok_or_else(|| DownloadError::Parse("附件响应中缺少下载地址".to_string()))?;

    let resp = client
        .get_raw_response(file_url)
        .await
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    let mut file = tokio::fs::File::create(&target).await?;
    let mut stream = resp.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Network(e.to_string()))?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &chunk).await?;
    }

    info!("附件下载完成: {}", file_name);
    Ok(())
}

async fn save_external_link(
    client: &UdemyClient,
    asset: &SupplementaryAsset,
    save_dir: &Path,
    course_id: u64,
    lecture_id: u64,
) -> Result<(), DownloadError> {
    let links_dir = save_dir.join("external-links");
    tokio::fs::create_dir_all(&links_dir).await?;

    let base_name = if asset.filename.is_empty() {
        asset.title.clone()
    } else {
        asset.filename.clone()
    };
    let file_name = format!("{}.url", sanitize_filename(&base_name));
    let target = links_dir.join(&file_name);

    if target.exists() {
        warn!("附件 {} 已存在于 {}，跳过", asset.title, target.display());
        return Ok(());
    }

    let meta: Value = client
        .get(&link_asset_url(
            client.base_url(),
            course_id,
            lecture_id,
            asset.id,
        ))
        .await
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    let external_url = meta["external_url"]
        .as_str()
        .ok_or_else(|| DownloadError::Parse("附件响应中缺少外部链接地址".to_string()))?;

    tokio::fs::write(&target, format!("[InternetShortcut]\nURL={}\n", external_url)).await?;

    info!("外部链接已保存: {}", file_name);
    Ok(())
}
