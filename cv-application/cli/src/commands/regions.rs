//! 区域管理命令

use anyhow::{Context, Result};
use colored::Colorize;
use cv_sdk::RegionLocation;

use super::common::connect;

pub async fn handle(profile: Option<&str>, action: crate::RegionsAction) -> Result<()> {
    match action {
        crate::RegionsAction::List => list_regions(profile).await,
        crate::RegionsAction::Show { name } => show_region(profile, &name).await,
        crate::RegionsAction::Add {
            name,
            region_type,
            locations,
        } => {
            let locations = parse_locations(locations.as_deref())?;
            add_region(profile, &name, &region_type, &locations).await
        }
        crate::RegionsAction::Delete { name } => delete_region(profile, &name).await,
    }
}

/// 解析 JSON 数组形式的位置列表
fn parse_locations(input: Option<&str>) -> Result<Vec<RegionLocation>> {
    match input {
        None => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).context("位置列表应为 JSON 数组"),
    }
}

async fn list_regions(profile: Option<&str>) -> Result<()> {
    let commcell = connect(profile).await?;
    let mut regions: Vec<_> = commcell
        .regions()
        .all()
        .await
        .context("查询区域失败")?
        .into_iter()
        .collect();

    if regions.is_empty() {
        println!("{}", "没有区域".yellow());
        return Ok(());
    }
    regions.sort();

    println!("{}\n", "区域列表:".bold());
    for (name, id) in regions {
        println!("  {} {}", name.cyan().bold(), format!("(id={})", id).bright_black());
    }
    Ok(())
}

async fn show_region(profile: Option<&str>, name: &str) -> Result<()> {
    let commcell = connect(profile).await?;
    let region = commcell
        .regions()
        .get(name)
        .await
        .with_context(|| format!("查询区域 {} 失败", name))?;

    println!("{} {}", "区域".bold(), region.name.cyan().bold());
    println!("  ID:     {}", region.id);
    if let Some(kind) = &region.region_type {
        println!("  类型:   {}", kind);
    }
    println!("  位置:   {}", region.locations.len());
    if let Some(count) = region.associated_servers_count {
        println!("  服务器: {}", count);
    }
    if let Some(count) = region.associated_plans_count {
        println!("  计划:   {}", count);
    }
    Ok(())
}

async fn add_region(
    profile: Option<&str>,
    name: &str,
    region_type: &str,
    locations: &[RegionLocation],
) -> Result<()> {
    let commcell = connect(profile).await?;
    let region = commcell
        .regions()
        .add(name, region_type, locations)
        .await
        .with_context(|| format!("创建区域 {} 失败", name))?;

    println!(
        "{} 区域 {} 创建成功 (id={})",
        "✓".green().bold(),
        region.name.cyan().bold(),
        region.id
    );
    Ok(())
}

async fn delete_region(profile: Option<&str>, name: &str) -> Result<()> {
    let commcell = connect(profile).await?;
    commcell
        .regions()
        .delete(name)
        .await
        .with_context(|| format!("删除区域 {} 失败", name))?;
    println!("{} 区域 {} 已删除", "✓".green().bold(), name.cyan().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations() {
        assert!(parse_locations(None).unwrap().is_empty());

        let locations =
            parse_locations(Some(r#"[{"city": "Seattle", "country": "US"}]"#)).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].city, "Seattle");
        assert_eq!(locations[0].state, "");

        assert!(parse_locations(Some("Seattle")).is_err());
    }
}
