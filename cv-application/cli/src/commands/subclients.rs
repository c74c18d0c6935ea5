//! 子客户端命令

use anyhow::{Context, Result};
use colored::Colorize;
use cv_sdk::api::subclient::{BackupOptions, SubclientScope};
use cv_sdk::{BackupLevel, Commcell, JobSubmission};

use super::common::connect;

pub async fn handle(profile: Option<&str>, action: crate::SubclientsAction) -> Result<()> {
    match action {
        crate::SubclientsAction::List {
            client,
            agent,
            instance,
            backupset,
        } => {
            let scope = build_scope(&agent, instance.as_deref(), backupset.as_deref());
            list_subclients(profile, &client, &scope).await
        }
        crate::SubclientsAction::Backup {
            client,
            subclient,
            agent,
            instance,
            backupset,
            level,
            incremental_backup,
            collect_metadata,
        } => {
            let scope = build_scope(&agent, instance.as_deref(), backupset.as_deref());
            let level: BackupLevel = level.parse()?;
            let options = BackupOptions {
                level,
                incremental_backup,
                collect_metadata,
                ..BackupOptions::level(level)
            };
            backup(profile, &client, &subclient, &scope, &options).await
        }
    }
}

fn build_scope(agent: &str, instance: Option<&str>, backupset: Option<&str>) -> SubclientScope {
    let mut scope = SubclientScope::agent(agent);
    if let Some(instance) = instance {
        scope = scope.instance(instance);
    }
    if let Some(backupset) = backupset {
        scope = scope.backupset(backupset);
    }
    scope
}

async fn client_id(commcell: &Commcell, client: &str) -> Result<i64> {
    let summary = commcell
        .clients()
        .get(client)
        .await
        .with_context(|| format!("查询客户端 {} 失败", client))?;
    Ok(summary.id)
}

async fn list_subclients(profile: Option<&str>, client: &str, scope: &SubclientScope) -> Result<()> {
    let commcell = connect(profile).await?;
    let id = client_id(&commcell, client).await?;

    let mut subclients: Vec<_> = commcell
        .subclients(id)
        .list(scope)
        .await
        .context("查询子客户端失败")?
        .into_iter()
        .collect();
    if subclients.is_empty() {
        println!("{}", "没有子客户端".yellow());
        return Ok(());
    }
    subclients.sort_by(|a, b| a.0.cmp(&b.0));

    println!("{} {}\n", client.cyan().bold(), "子客户端:".bold());
    for (key, subclient) in subclients {
        let marker = if subclient.is_default {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            "{} {} {}",
            marker,
            key.cyan(),
            format!("(id={}, {}/{})", subclient.id, subclient.instance, subclient.backupset)
                .bright_black()
        );
    }
    Ok(())
}

async fn backup(
    profile: Option<&str>,
    client: &str,
    subclient: &str,
    scope: &SubclientScope,
    options: &BackupOptions,
) -> Result<()> {
    let commcell = connect(profile).await?;
    let subclients = commcell.subclients(client_id(&commcell, client).await?);

    let target = subclients
        .get(scope, subclient)
        .await
        .with_context(|| format!("查询子客户端 {} 失败", subclient))?;
    let submission = subclients
        .backup(target.id, options)
        .await
        .with_context(|| format!("触发 {} 备份失败", subclient))?;

    println!(
        "{} {} 备份已提交 ({})",
        "✓".green().bold(),
        subclient.cyan().bold(),
        options.level.as_str()
    );
    match submission {
        JobSubmission::Job(job) => println!("  作业: {}", job.to_string().yellow()),
        JobSubmission::Jobs(jobs) => {
            for job in jobs {
                println!("  作业: {}", job.to_string().yellow());
            }
        }
        JobSubmission::Schedule(task_id) => println!("  计划任务: {}", task_id),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_scope() {
        let scope = build_scope("File System", Some("DefaultInstanceName"), None);
        assert_eq!(scope.agent, "file system");
        assert_eq!(scope.instance.as_deref(), Some("defaultinstancename"));
        assert_eq!(scope.backupset, None);
    }
}
