//! 公共工具函数模块
//!
//! 提供各命令模块共享的功能，包括：
//! - 按 profile 建立 Commcell 会话
//! - 命令行过滤条件解析

use anyhow::{Context, Result};
use cv_sdk::{Commcell, ConnectOptions};
use tracing::info;

use crate::config::{CliConfig, PASSWORD_ENV};

/// 按 profile 连接并登录 Commcell
pub async fn connect(profile: Option<&str>) -> Result<Commcell> {
    let config = CliConfig::load()?;
    let (name, profile) = config.resolve_profile(profile)?;
    let password = profile.resolve_password(std::env::var(PASSWORD_ENV).ok())?;

    info!("使用 profile {} 连接 {}", name, profile.hostname);
    Commcell::connect(
        &profile.hostname,
        ConnectOptions::password(&profile.username, &password),
        profile.commcell_config(),
    )
    .await
    .with_context(|| format!("连接 Commcell {} 失败", profile.hostname))
}

/// 解析 `key=value` 形式的过滤条件
pub fn parse_pairs(items: &[String]) -> Result<Vec<(String, String)>> {
    items
        .iter()
        .map(|item| {
            let (key, value) = item
                .split_once('=')
                .with_context(|| format!("过滤条件格式应为 key=value: {}", item))?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("过滤条件缺少键: {}", item);
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let items = vec!["level=10".to_string(), " jobId = 42 ".to_string()];
        assert_eq!(
            parse_pairs(&items).unwrap(),
            vec![
                ("level".to_string(), "10".to_string()),
                ("jobId".to_string(), "42".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_pairs_rejects_malformed() {
        assert!(parse_pairs(&["level".to_string()]).is_err());
        assert!(parse_pairs(&["=10".to_string()]).is_err());
    }
}
