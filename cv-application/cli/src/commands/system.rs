//! 系统设置命令

use anyhow::{Context, Result};
use colored::Colorize;

use super::common::connect;

pub async fn handle(profile: Option<&str>, action: crate::SystemAction) -> Result<()> {
    let commcell = connect(profile).await?;
    let system = commcell.system();

    match action {
        crate::SystemAction::GuiTimeout { set: Some(minutes) } => {
            system
                .set_gui_timeout(minutes)
                .await
                .context("设置 GUI 超时失败")?;
            println!("{} GUI 超时已设置为 {} 分钟", "✓".green().bold(), minutes);
        }
        crate::SystemAction::GuiTimeout { set: None } => {
            match system.gui_timeout().await.context("查询 GUI 超时失败")? {
                Some(value) => println!("GUI 超时: {} 分钟", value.cyan()),
                None => println!("{}", "未设置 GUI 超时".yellow()),
            }
        }
    }
    Ok(())
}
