//! 事件查询命令

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colored::Colorize;
use cv_sdk::Event;

use super::common::{connect, parse_pairs};

pub async fn handle(profile: Option<&str>, action: crate::EventsAction) -> Result<()> {
    match action {
        crate::EventsAction::List { filters, details } => {
            list_events(profile, &filters, details).await
        }
        crate::EventsAction::Show { id } => show_event(profile, &id).await,
    }
}

async fn list_events(profile: Option<&str>, filters: &[String], details: bool) -> Result<()> {
    let pairs = parse_pairs(filters)?;
    let query: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let commcell = connect(profile).await?;
    let events = commcell.events();

    if details {
        let mut list: Vec<_> = events
            .events_with_details(&query)
            .await
            .context("查询事件失败")?
            .into_iter()
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        for (id, event) in list {
            println!("{}", id.cyan().bold());
            println!("{}\n", serde_json::to_string_pretty(&event)?);
        }
        return Ok(());
    }

    let mut list: Vec<_> = events
        .events(&query)
        .await
        .context("查询事件失败")?
        .into_iter()
        .collect();
    if list.is_empty() {
        println!("{}", "没有符合条件的事件".yellow());
        return Ok(());
    }
    list.sort_by(|a, b| a.0.cmp(&b.0));

    println!("{:<12} {}", "ID".bold(), "事件码".bold());
    for (id, code) in list {
        println!("{:<12} {}", id.cyan(), code);
    }
    Ok(())
}

async fn show_event(profile: Option<&str>, id: &str) -> Result<()> {
    let commcell = connect(profile).await?;
    let event = commcell
        .events()
        .get(id)
        .await
        .with_context(|| format!("查询事件 {} 失败", id))?;
    print_event(&event);
    Ok(())
}

fn print_event(event: &Event) {
    println!("{} {}", "事件".bold(), event.id.cyan().bold());
    println!("  事件码:   {}", event.event_code);
    if let Some(time) = event.time_source.and_then(format_time) {
        println!("  时间:     {}", time);
    }
    if let Some(severity) = event.severity {
        println!("  严重级别: {}", severity);
    }
    if let Some(job_id) = event.job_id {
        println!("  作业:     {}", job_id);
    }
    println!("  子系统:   {}", event.subsystem);
    println!("  描述:     {}", event.description.yellow());
    if event.is_backup_disabled() {
        println!("  {}", "备份已禁用".red().bold());
    }
    if event.is_restore_disabled() {
        println!("  {}", "恢复已禁用".red().bold());
    }
}

fn format_time(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|t| {
        t.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert!(format_time(1_700_000_000).is_some());
        assert!(format_time(i64::MAX).is_none());
    }
}
