//! 全局过滤器命令

use anyhow::{Context, Result};
use colored::Colorize;
use cv_sdk::api::global_filter::GlobalFilter;

use super::common::connect;

pub async fn handle(profile: Option<&str>, action: crate::FiltersAction) -> Result<()> {
    let commcell = connect(profile).await?;
    let filters = commcell.global_filters();

    match action {
        crate::FiltersAction::Show { kind } => {
            let filter = filters.get(&kind).await.context("查询全局过滤器失败")?;
            print_filter(&filter);
        }
        crate::FiltersAction::Add { kind, filters: items } => {
            let mut filter = filters.get(&kind).await.context("查询全局过滤器失败")?;
            let items: Vec<&str> = items.iter().map(String::as_str).collect();
            filter.add(&items).await.context("追加全局过滤失败")?;
            println!("{} 已追加 {} 项", "✓".green().bold(), items.len());
            print_filter(&filter);
        }
        crate::FiltersAction::Overwrite { kind, filters: items } => {
            let mut filter = filters.get(&kind).await.context("查询全局过滤器失败")?;
            let items: Vec<&str> = items.iter().map(String::as_str).collect();
            filter.overwrite(&items).await.context("覆盖全局过滤失败")?;
            println!("{} 已覆盖", "✓".green().bold());
            print_filter(&filter);
        }
        crate::FiltersAction::Clear { kind } => {
            let mut filter = filters.get(&kind).await.context("查询全局过滤器失败")?;
            filter.delete_all().await.context("清空全局过滤失败")?;
            println!("{} {} 全局过滤已清空", "✓".green().bold(), filter.kind());
        }
    }
    Ok(())
}

fn print_filter(filter: &GlobalFilter<'_>) {
    println!("{} {}", filter.kind().to_string().cyan().bold(), "全局过滤:".bold());
    let content: Vec<&String> = filter.content().iter().filter(|f| !f.is_empty()).collect();
    if content.is_empty() {
        println!("  {}", "(空)".bright_black());
    }
    for item in content {
        println!("  {}", item);
    }
}
