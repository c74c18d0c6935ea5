//! Commcell 数据模型
//!
//! 服务端响应以 `serde_json::Value` 接收后映射为这里的类型，
//! 字段名沿用 Rust 命名，序列化时按服务端的驼峰命名输出。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorModule, SdkError};

/// CommServ 详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommservDetails {
    /// Commcell 名称
    pub name: String,

    /// CommServ 主机名
    pub hostname: String,

    /// CommServ GUID
    pub guid: Option<String>,

    /// Commcell ID
    pub id: i64,

    /// 时区描述，例如 `(UTC+08:00) Beijing`
    pub timezone: String,

    /// 时区名称
    pub timezone_name: String,

    /// 当前 SP 版本号
    pub sp_version: i64,

    /// 规范化版本，例如 `11.32.0`
    pub version: String,

    /// 发行版名称
    pub release_name: Option<String>,
}

/// 客户端摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: i64,
    pub name: String,
    pub hostname: String,
}

/// 事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub event_code: String,
    /// 事件时间（Unix 时间戳）
    pub time_source: Option<i64>,
    pub severity: Option<i64>,
    pub job_id: Option<i64>,
    pub description: String,
    pub subsystem: String,
}

/// 禁用备份事件码
pub const EVENT_BACKUP_DISABLED: &str = "318767861";

/// 禁用恢复事件码
pub const EVENT_RESTORE_DISABLED: &str = "318767864";

impl Event {
    /// 是否为备份被禁用事件
    pub fn is_backup_disabled(&self) -> bool {
        self.event_code == EVENT_BACKUP_DISABLED
    }

    /// 是否为恢复被禁用事件
    pub fn is_restore_disabled(&self) -> bool {
        self.event_code == EVENT_RESTORE_DISABLED
    }
}

/// 区域类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionType {
    UserCreated,
    Oci,
    Aws,
    Azure,
    Gcp,
}

impl RegionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionType::UserCreated => "USER_CREATED",
            RegionType::Oci => "OCI",
            RegionType::Aws => "AWS",
            RegionType::Azure => "AZURE",
            RegionType::Gcp => "GCP",
        }
    }
}

impl FromStr for RegionType {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER_CREATED" => Ok(RegionType::UserCreated),
            "OCI" => Ok(RegionType::Oci),
            "AWS" => Ok(RegionType::Aws),
            "AZURE" => Ok(RegionType::Azure),
            "GCP" => Ok(RegionType::Gcp),
            _ => Err(SdkError::with_message(
                ErrorModule::Region,
                102,
                "Invalid region type",
            )),
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 区域位置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

/// 区域详情
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub region_type: Option<String>,
    pub locations: Vec<Value>,
    pub associated_servers_count: Option<i64>,
    pub associated_servers: Vec<Value>,
    pub associated_plans_count: Option<i64>,
    pub associated_plans: Vec<Value>,
}

/// 内容分析器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAnalyzer {
    pub ca_url: String,
    pub client_name: String,
    pub client_id: i64,
}

/// 任务提交结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSubmission {
    /// 立即运行的作业
    Job(JobRef),
    /// 一次提交多个作业
    Jobs(Vec<JobRef>),
    /// 创建的计划任务 ID
    Schedule(i64),
}

impl JobSubmission {
    /// 所有作业 ID
    pub fn job_ids(&self) -> Vec<i64> {
        match self {
            JobSubmission::Job(job) => vec![job.id],
            JobSubmission::Jobs(jobs) => jobs.iter().map(|j| j.id).collect(),
            JobSubmission::Schedule(_) => Vec::new(),
        }
    }
}

/// 作业引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRef {
    pub id: i64,
}

impl JobRef {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// 作业详情
#[derive(Debug, Clone, PartialEq)]
pub struct JobDetails {
    pub id: i64,
    pub status: String,
    pub job_type: String,
    pub client_name: Option<String>,
    pub percent_complete: Option<i64>,
    pub raw: Value,
}

/// 子客户端摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubclientSummary {
    pub id: i64,
    pub name: String,
    pub agent: String,
    pub instance: String,
    pub backupset: String,
    pub is_default: bool,
}

/// 备份级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupLevel {
    Full,
    Incremental,
    TransactionLog,
    Differential,
    SyntheticFull,
}

impl BackupLevel {
    /// 请求中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupLevel::Full => "Full",
            BackupLevel::Incremental => "Incremental",
            BackupLevel::TransactionLog => "Transaction_Log",
            BackupLevel::Differential => "Differential",
            BackupLevel::SyntheticFull => "Synthetic_full",
        }
    }
}

impl FromStr for BackupLevel {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(BackupLevel::Full),
            "incremental" => Ok(BackupLevel::Incremental),
            "transaction_log" => Ok(BackupLevel::TransactionLog),
            "differential" => Ok(BackupLevel::Differential),
            "synthetic_full" => Ok(BackupLevel::SyntheticFull),
            _ => Err(SdkError::new(ErrorModule::Subclient, 103)),
        }
    }
}

/// 增量备份所处阶段（合成全备前/后）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalLevel {
    Before,
    After,
}

impl IncrementalLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncrementalLevel::Before => "BEFORE_SYNTH",
            IncrementalLevel::After => "AFTER_SYNTH",
        }
    }
}

/// 备份网络接口对的一端所属实体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairEntity {
    Client(String),
    ClientGroup(String),
}

/// 备份网络接口对的一端
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEndpoint {
    pub entity: PairEntity,
    /// 接口 IP、网段或 `No Default Interface`
    pub interface: String,
}

impl InterfaceEndpoint {
    pub fn client(name: &str, interface: &str) -> Self {
        Self {
            entity: PairEntity::Client(name.to_string()),
            interface: interface.to_string(),
        }
    }

    pub fn client_group(name: &str, interface: &str) -> Self {
        Self {
            entity: PairEntity::ClientGroup(name.to_string()),
            interface: interface.to_string(),
        }
    }
}

/// 备份网络接口对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfacePair {
    pub source: InterfaceEndpoint,
    pub destination: InterfaceEndpoint,
}

impl InterfacePair {
    pub fn new(source: InterfaceEndpoint, destination: InterfaceEndpoint) -> Self {
        Self { source, destination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_level_parse() {
        assert_eq!("FULL".parse::<BackupLevel>().unwrap(), BackupLevel::Full);
        assert_eq!(
            "synthetic_full".parse::<BackupLevel>().unwrap().as_str(),
            "Synthetic_full"
        );
        let err = "weekly".parse::<BackupLevel>().unwrap_err();
        assert!(err.is(ErrorModule::Subclient, 103));
    }

    #[test]
    fn test_region_type_parse() {
        assert_eq!("aws".parse::<RegionType>().unwrap(), RegionType::Aws);
        assert!("moon".parse::<RegionType>().is_err());
    }

    #[test]
    fn test_event_codes() {
        let event = Event {
            id: "1".to_string(),
            event_code: EVENT_BACKUP_DISABLED.to_string(),
            time_source: None,
            severity: None,
            job_id: None,
            description: String::new(),
            subsystem: String::new(),
        };
        assert!(event.is_backup_disabled());
        assert!(!event.is_restore_disabled());
    }

    #[test]
    fn test_job_submission_ids() {
        let submission = JobSubmission::Jobs(vec![JobRef::new(1), JobRef::new(2)]);
        assert_eq!(submission.job_ids(), vec![1, 2]);
        assert!(JobSubmission::Schedule(9).job_ids().is_empty());
    }
}
