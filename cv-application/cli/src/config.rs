//! CLI 配置管理
//!
//! **数据存储方式**: TOML 文件 (~/.config/cvctl/config.toml)
//!
//! 每个 profile 对应一个 Commcell 连接；密码可以不落盘，
//! 改为通过 `CVCTL_PASSWORD` 环境变量提供。

use anyhow::{Context, Result};
use cv_sdk::CommcellConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 密码环境变量
pub const PASSWORD_ENV: &str = "CVCTL_PASSWORD";

/// CLI 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Commcell 连接列表
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,

    /// 默认 profile
    pub default_profile: Option<String>,

    /// 配置版本
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    120
}

/// 单个 Commcell 的连接配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Web 控制台主机名
    pub hostname: String,

    /// 登录用户名
    pub username: String,

    /// 登录密码（为空时读取环境变量）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// 覆盖默认的 Web 服务地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_service_url: Option<String>,

    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    #[serde(default)]
    pub force_https: bool,

    /// CA 证书路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_path: Option<String>,

    /// 请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ProfileConfig {
    pub fn new(hostname: &str, username: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            username: username.to_string(),
            password: None,
            web_service_url: None,
            verify_ssl: true,
            force_https: false,
            certificate_path: None,
            request_timeout: default_request_timeout(),
        }
    }

    /// 转换为 SDK 客户端配置
    pub fn commcell_config(&self) -> CommcellConfig {
        CommcellConfig {
            request_timeout: self.request_timeout,
            verify_ssl: self.verify_ssl,
            force_https: self.force_https,
            certificate_path: self.certificate_path.as_ref().map(PathBuf::from),
            web_service_url: self.web_service_url.clone(),
            ..Default::default()
        }
    }

    /// 解析登录密码，环境变量优先
    pub fn resolve_password(&self, env_password: Option<String>) -> Result<String> {
        env_password
            .filter(|p| !p.is_empty())
            .or_else(|| self.password.clone())
            .with_context(|| {
                format!(
                    "未配置 {} 的密码，请设置 {} 环境变量",
                    self.hostname, PASSWORD_ENV
                )
            })
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            profiles: HashMap::new(),
            default_profile: None,
            version: default_version(),
        }
    }
}

impl CliConfig {
    /// 获取配置文件路径
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("无法获取用户主目录")?;
        Ok(home.join(".config").join("cvctl").join("config.toml"))
    }

    /// 加载配置
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 从指定文件加载配置，文件不存在时返回默认配置
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {:?}", path))
    }

    /// 保存配置
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录失败: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("序列化配置失败")?;

        fs::write(path, content).with_context(|| format!("写入配置文件失败: {:?}", path))?;

        Ok(())
    }

    /// 添加 profile
    pub fn add_profile(&mut self, name: &str, profile: ProfileConfig) -> Result<()> {
        if self.profiles.contains_key(name) {
            anyhow::bail!("Profile {} 已存在", name);
        }

        self.profiles.insert(name.to_string(), profile);

        // 第一个 profile 设为默认
        if self.default_profile.is_none() {
            self.default_profile = Some(name.to_string());
        }

        Ok(())
    }

    /// 移除 profile
    pub fn remove_profile(&mut self, name: &str) -> Result<()> {
        if self.profiles.remove(name).is_none() {
            anyhow::bail!("Profile {} 不存在", name);
        }

        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }

        Ok(())
    }

    /// 获取 profile
    pub fn get_profile(&self, name: &str) -> Result<&ProfileConfig> {
        self.profiles
            .get(name)
            .with_context(|| format!("Profile {} 不存在", name))
    }

    /// 按名称或默认值选择 profile
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<(&str, &ProfileConfig)> {
        let name = match name {
            Some(name) => name,
            None => self
                .default_profile
                .as_deref()
                .context("未指定 profile，且没有默认 profile")?,
        };
        let (key, profile) = self
            .profiles
            .get_key_value(name)
            .with_context(|| format!("Profile {} 不存在", name))?;
        Ok((key.as_str(), profile))
    }

    /// 列出所有 profile，按名称排序
    pub fn list_profiles(&self) -> Vec<(&str, &ProfileConfig)> {
        let mut profiles: Vec<_> = self
            .profiles
            .iter()
            .map(|(name, profile)| (name.as_str(), profile))
            .collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// 设置默认 profile
    pub fn set_default_profile(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            anyhow::bail!("Profile {} 不存在", name);
        }

        self.default_profile = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(config.profiles.is_empty());
        assert_eq!(config.default_profile, None);
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_add_remove_profile() {
        let mut config = CliConfig::default();

        config.add_profile("prod", ProfileConfig::new("cs01", "admin")).unwrap();
        assert_eq!(config.default_profile, Some("prod".to_string()));

        config.add_profile("lab", ProfileConfig::new("cs02", "tester")).unwrap();
        assert_eq!(config.default_profile, Some("prod".to_string()));
        assert!(config.add_profile("lab", ProfileConfig::new("cs03", "x")).is_err());

        config.remove_profile("prod").unwrap();
        assert_eq!(config.default_profile, None);
        assert!(config.remove_profile("prod").is_err());
        assert_eq!(config.list_profiles().len(), 1);
    }

    #[test]
    fn test_resolve_profile() {
        let mut config = CliConfig::default();
        assert!(config.resolve_profile(None).is_err());

        config.add_profile("prod", ProfileConfig::new("cs01", "admin")).unwrap();
        config.add_profile("lab", ProfileConfig::new("cs02", "tester")).unwrap();

        let (name, profile) = config.resolve_profile(None).unwrap();
        assert_eq!(name, "prod");
        assert_eq!(profile.hostname, "cs01");

        config.set_default_profile("lab").unwrap();
        assert_eq!(config.resolve_profile(None).unwrap().0, "lab");
        assert_eq!(config.resolve_profile(Some("prod")).unwrap().0, "prod");
        assert!(config.resolve_profile(Some("missing")).is_err());
        assert!(config.set_default_profile("missing").is_err());
    }

    #[test]
    fn test_resolve_password() {
        let mut profile = ProfileConfig::new("cs01", "admin");
        assert!(profile.resolve_password(None).is_err());

        profile.password = Some("stored".to_string());
        assert_eq!(profile.resolve_password(None).unwrap(), "stored");
        assert_eq!(
            profile.resolve_password(Some("from-env".to_string())).unwrap(),
            "from-env"
        );
        assert_eq!(profile.resolve_password(Some(String::new())).unwrap(), "stored");
    }

    #[test]
    fn test_commcell_config() {
        let mut profile = ProfileConfig::new("cs01", "admin");
        profile.verify_ssl = false;
        profile.certificate_path = Some("/etc/cv/ca.pem".to_string());

        let config = profile.commcell_config();
        assert!(!config.verify_ssl);
        assert_eq!(config.certificate_path, Some(PathBuf::from("/etc/cv/ca.pem")));
        assert_eq!(config.request_timeout, 120);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cvctl").join("config.toml");

        let mut config = CliConfig::default();
        let mut profile = ProfileConfig::new("cs01", "admin");
        profile.web_service_url = Some("http://cs01:81/SearchSvc/CVWebService.svc".to_string());
        config.add_profile("prod", profile.clone()).unwrap();
        config.save_to(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("password"));

        let loaded = CliConfig::load_from(&path).unwrap();
        assert_eq!(loaded.default_profile, Some("prod".to_string()));
        assert_eq!(loaded.get_profile("prod").unwrap(), &profile);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_load_minimal_profile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "default_profile = \"prod\"\n\n[profiles.prod]\nhostname = \"cs01\"\nusername = \"admin\"\n",
        )
        .unwrap();

        let config = CliConfig::load_from(&path).unwrap();
        let profile = config.get_profile("prod").unwrap();
        assert!(profile.verify_ssl);
        assert!(!profile.force_https);
        assert_eq!(profile.request_timeout, 120);
    }
}
