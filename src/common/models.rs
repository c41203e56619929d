use std::path::PathBuf;

// 一次运行的全部配置，启动时构造完毕后只读
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub course_dir: PathBuf,
    pub decryption_key: Option<DecryptionKey>,
    pub captions_filter: Vec<String>,
    pub concurrency: usize,
}

// Widevine解密密钥，kid:key 形式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionKey {
    pub kid: String,
    pub key: String,
}

impl DecryptionKey {
    // 解析 kid:key 形式的密钥，缺少分隔符视为非法
    pub fn parse(raw: &str) -> Option<Self> {
        let (kid, key) = raw.split_once(':')?;
        if kid.is_empty() || key.is_empty() {
            return None;
        }

        Some(Self {
            kid: kid.to_string(),
            key: key.to_string(),
        })
    }

    // 传给外部下载工具的 --key 参数
    pub fn as_arg(&self) -> String {
        format!("{}:{}", self.kid, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_key() {
        let key = DecryptionKey::parse("abcd1234:deadbeef").unwrap();
        assert_eq!(key.kid, "abcd1234");
        assert_eq!(key.key, "deadbeef");
        assert_eq!(key.as_arg(), "abcd1234:deadbeef");
    }

    #[test]
    fn test_parse_key_without_separator() {
        assert!(DecryptionKey::parse("abcd1234deadbeef").is_none());
    }

    #[test]
    fn test_parse_key_with_empty_parts() {
        assert!(DecryptionKey::parse(":deadbeef").is_none());
        assert!(DecryptionKey::parse("abcd1234:").is_none());
    }
}
