//! 登录命令

use anyhow::{Context, Result};
use colored::Colorize;

use super::common::connect;

pub async fn handle(profile: Option<&str>) -> Result<()> {
    let commcell = connect(profile).await?;

    println!("{} 登录成功", "✓".green().bold());
    println!("  用户:     {}", commcell.username().await.unwrap_or_default().cyan());
    println!("  Web 服务: {}", commcell.services().web_service().yellow());

    let details = commcell
        .commserv_details()
        .await
        .context("查询 CommServ 详情失败")?;
    println!("\n{}", "CommServ:".bold());
    println!("  名称:     {}", details.name.cyan().bold());
    println!("  主机名:   {}", details.hostname);
    println!("  ID:       {}", details.id);
    println!("  版本:     {} (SP{})", details.version, details.sp_version);
    println!("  时区:     {}", details.timezone);
    if let Some(release) = &details.release_name {
        println!("  发行版:   {}", release);
    }

    commcell.logout().await.context("登出失败")?;
    Ok(())
}
