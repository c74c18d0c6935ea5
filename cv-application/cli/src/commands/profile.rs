//! Profile 管理命令

use anyhow::Result;
use colored::Colorize;

use crate::config::{CliConfig, ProfileConfig};

pub async fn handle(action: crate::ProfileAction) -> Result<()> {
    match action {
        crate::ProfileAction::Add {
            name,
            hostname,
            username,
            password,
            web_service_url,
            insecure,
            force_https,
            certificate,
        } => {
            let mut profile = ProfileConfig::new(&hostname, &username);
            profile.password = password;
            profile.web_service_url = web_service_url;
            profile.verify_ssl = !insecure;
            profile.force_https = force_https;
            profile.certificate_path = certificate;
            add_profile(&name, profile)
        }
        crate::ProfileAction::List => list_profiles(),
        crate::ProfileAction::Remove { name } => remove_profile(&name),
        crate::ProfileAction::Default { name } => set_default(&name),
    }
}

fn add_profile(name: &str, profile: ProfileConfig) -> Result<()> {
    let mut config = CliConfig::load()?;
    let hostname = profile.hostname.clone();
    config.add_profile(name, profile)?;
    config.save()?;

    println!("{} Profile {} 添加成功", "✓".green().bold(), name.cyan().bold());
    println!("  主机: {}", hostname.yellow());
    Ok(())
}

fn list_profiles() -> Result<()> {
    let config = CliConfig::load()?;
    let profiles = config.list_profiles();

    if profiles.is_empty() {
        println!("{}", "没有配置任何 profile".yellow());
        println!("\n使用以下命令添加:");
        println!(
            "  {} cvctl profile add <NAME> <HOSTNAME> --username <USER>",
            "$".bright_black()
        );
        return Ok(());
    }

    println!("{}\n", "配置的 Commcell 列表:".bold());
    for (name, profile) in profiles {
        let marker = if config.default_profile.as_deref() == Some(name) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!("{} {}", marker, name.cyan().bold());
        println!("    主机:   {}", profile.hostname.yellow());
        println!("    用户:   {}", profile.username);
        if let Some(url) = &profile.web_service_url {
            println!("    Web:    {}", url.bright_black());
        }
        if !profile.verify_ssl {
            println!("    {}", "不校验 SSL 证书".bright_black());
        }
        println!();
    }
    Ok(())
}

fn remove_profile(name: &str) -> Result<()> {
    let mut config = CliConfig::load()?;
    config.remove_profile(name)?;
    config.save()?;
    println!("{} Profile {} 已移除", "✓".green().bold(), name.cyan().bold());
    Ok(())
}

fn set_default(name: &str) -> Result<()> {
    let mut config = CliConfig::load()?;
    config.set_default_profile(name)?;
    config.save()?;
    println!("{} 默认 profile: {}", "✓".green().bold(), name.cyan().bold());
    Ok(())
}
