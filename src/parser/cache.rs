use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::warn;

use super::models::Curriculum;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("课程目录缓存文件不存在: {0}")]
    NotFound(PathBuf),
    #[error("课程目录缓存文件已损坏或格式不正确: {0}")]
    Malformed(serde_json::Error),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

// 把课程目录写入缓存文件，4空格缩进，已存在则覆盖并警告
pub fn save(curriculum: &Curriculum, path: &Path) -> Result<(), CacheError> {
    if path.exists() {
        warn!("课程目录缓存文件已存在，将覆盖原有文件");
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut writer, formatter);
        curriculum
            .serialize(&mut serializer)
            .map_err(CacheError::Malformed)?;
    }
    writer.flush()?;

    Ok(())
}

// 从缓存文件加载课程目录，跳过拉取与整理，内容原样信任
pub fn load(path: &Path) -> Result<Curriculum, CacheError> {
    if !path.exists() {
        return Err(CacheError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(CacheError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::{Chapter, RawCurriculumItem};

    fn sample_curriculum() -> Curriculum {
        vec![
            Chapter {
                id: 1,
                title: "入门".to_string(),
                description: String::new(),
                is_published: true,
                children: vec![
                    RawCurriculumItem {
                        class: "lecture".to_string(),
                        id: 11,
                        title: "L1".to_string(),
                        ..Default::default()
                    },
                    RawCurriculumItem {
                        class: "practice".to_string(),
                        id: 12,
                        title: "P1".to_string(),
                        ..Default::default()
                    },
                ],
            },
            Chapter {
                id: 2,
                title: "进阶".to_string(),
                description: String::new(),
                is_published: true,
                children: vec![RawCurriculumItem {
                    class: "lecture".to_string(),
                    id: 21,
                    title: "L2".to_string(),
                    ..Default::default()
                }],
            },
        ]
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.json");

        let original = sample_curriculum();
        save(&original, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.len(), original.len());
        for (a, b) in loaded.iter().zip(original.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.title, b.title);
            assert_eq!(a.children.len(), b.children.len());
            for (x, y) in a.children.iter().zip(b.children.iter()) {
                assert_eq!(x.id, y.id);
                assert_eq!(x.class, y.class);
            }
        }
    }

    #[test]
    fn test_save_uses_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.json");

        save(&sample_curriculum(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.contains("\n    {"));
        assert!(content.contains("\n        \"id\""));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");

        let result = load(&path);
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "这不是JSON").unwrap();

        let result = load(&path);
        assert!(matches!(result, Err(CacheError::Malformed(_))));
    }
}
