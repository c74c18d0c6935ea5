//! 软件缓存命令

use anyhow::{Context, Result};
use colored::Colorize;

use super::common::connect;

pub async fn handle(profile: Option<&str>, action: crate::CacheAction) -> Result<()> {
    let commcell = connect(profile).await?;
    let cache = commcell.commserv_cache();

    match action {
        crate::CacheAction::CsPath => {
            let path = cache.cs_cache_path().await.context("查询 CommServ 缓存路径失败")?;
            println!("{}", path.cyan());
        }
        crate::CacheAction::RemoteClients => {
            let clients = cache
                .remote_cache_clients()
                .await
                .context("查询远程缓存客户端失败")?;
            if clients.is_empty() {
                println!("{}", "没有远程缓存客户端".yellow());
            }
            for client in clients {
                let path = commcell
                    .remote_cache(&client)
                    .cache_path()
                    .await
                    .with_context(|| format!("查询 {} 的缓存路径失败", client))?;
                println!(
                    "  {} {}",
                    client.cyan().bold(),
                    path.unwrap_or_default().bright_black()
                );
            }
        }
        crate::CacheAction::Commit => {
            cache.commit_cache().await.context("提交 CommServ 缓存失败")?;
            println!("{} CommServ 缓存已提交", "✓".green().bold());
        }
    }
    Ok(())
}
