//! QCommand 执行命令

use anyhow::{Context, Result};
use std::fs;

use super::common::connect;

pub async fn handle(profile: Option<&str>, action: crate::QcommandAction) -> Result<()> {
    match action {
        crate::QcommandAction::Exec { command, input_xml } => {
            let input = match input_xml {
                Some(path) => Some(
                    fs::read_to_string(&path)
                        .with_context(|| format!("读取输入 XML 失败: {}", path))?,
                ),
                None => None,
            };

            let commcell = connect(profile).await?;
            let response = commcell
                .execute_qcommand(&command, input.as_deref())
                .await
                .with_context(|| format!("执行 QCommand 失败: {}", command))?;
            println!("{}", response.text());
        }
    }
    Ok(())
}
