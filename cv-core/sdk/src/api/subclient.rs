//! 子客户端 API
//!
//! 按客户端列出子客户端，并按代理、实例、备份集过滤；支持属性读写、
//! 重命名、删除与触发备份。

use std::collections::{HashMap, HashSet};

use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::api::job::parse_job_submission;
use crate::client::{update_response, Commcell, Payload};
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::{BackupLevel, IncrementalLevel, JobSubmission, SubclientSummary};
use crate::response::{error_code, int_field, str_field, HttpResponse};
use crate::services::Service;

/// 子客户端的列出范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubclientScope {
    /// 代理名称，例如 `file system`
    pub agent: String,
    pub instance: Option<String>,
    pub backupset: Option<String>,
}

impl SubclientScope {
    pub fn agent(agent: &str) -> Self {
        Self {
            agent: agent.to_lowercase(),
            instance: None,
            backupset: None,
        }
    }

    pub fn instance(mut self, instance: &str) -> Self {
        self.instance = Some(instance.to_lowercase());
        self
    }

    /// 限定备份集，需要同时限定实例
    pub fn backupset(mut self, backupset: &str) -> Self {
        self.backupset = Some(backupset.to_lowercase());
        self
    }

    fn matches(&self, summary: &SubclientSummary) -> bool {
        summary.agent == self.agent
            && self.instance.as_ref().map_or(true, |i| *i == summary.instance)
            && self.backupset.as_ref().map_or(true, |b| *b == summary.backupset)
    }
}

/// 备份选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupOptions {
    pub level: BackupLevel,
    /// 合成全备时是否同时运行增量备份
    pub incremental_backup: bool,
    pub incremental_level: IncrementalLevel,
    pub collect_metadata: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            level: BackupLevel::Incremental,
            incremental_backup: false,
            incremental_level: IncrementalLevel::Before,
            collect_metadata: false,
        }
    }
}

impl BackupOptions {
    pub fn level(level: BackupLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    fn request(&self) -> String {
        let mut request = self.level.as_str().to_lowercase();
        if self.level == BackupLevel::SyntheticFull {
            if self.incremental_backup {
                request.push_str("&runIncrementalBackup=True");
                request.push_str(&format!(
                    "&incrementalLevel={}",
                    self.incremental_level.as_str().to_lowercase()
                ));
            } else {
                request.push_str("&runIncrementalBackup=False");
            }
        }
        let collect = if self.collect_metadata { "True" } else { "False" };
        request.push_str(&format!("&collectMetaInfo={}", collect));
        request
    }
}

/// 子客户端 API
pub struct SubclientsApi<'a> {
    commcell: &'a Commcell,
    client_id: i64,
}

impl<'a> SubclientsApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell, client_id: i64) -> Self {
        Self {
            commcell,
            client_id,
        }
    }

    /// 列出范围内的子客户端
    ///
    /// 键为小写子客户端名；范围内存在多个实例或备份集时，键带上
    /// `instance\backupset\` 前缀以区分。
    pub async fn list(&self, scope: &SubclientScope) -> Result<HashMap<String, SubclientSummary>> {
        info!("查询客户端 {} 的子客户端 ({})", self.client_id, scope.agent);
        let url = self
            .commcell
            .services()
            .url_with(Service::GetAllSubclients, &[&self.client_id.to_string()])?;
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        let value = success_json(&response)?;

        let entries = value
            .get("subClientProperties")
            .and_then(Value::as_array)
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))?;
        Ok(index_subclients(entries, scope))
    }

    /// 按名称查询子客户端（名称格式与 [`SubclientsApi::list`] 的键一致）
    pub async fn get(&self, scope: &SubclientScope, name: &str) -> Result<SubclientSummary> {
        let key = name.to_lowercase();
        self.list(scope).await?.remove(&key).ok_or_else(|| {
            SdkError::with_message(
                ErrorModule::Subclient,
                102,
                format!("No subclient exists with name: {}", key),
            )
        })
    }

    /// 默认子客户端的键
    pub async fn default_subclient(&self, scope: &SubclientScope) -> Result<Option<String>> {
        Ok(self
            .list(scope)
            .await?
            .into_iter()
            .find(|(_, s)| s.is_default)
            .map(|(key, _)| key))
    }

    /// 子客户端属性（`subClientProperties[0]`）
    pub async fn properties(&self, subclient_id: i64) -> Result<Value> {
        let url = self.subclient_url(subclient_id)?;
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        let value = success_json(&response)?;
        value
            .pointer("/subClientProperties/0")
            .cloned()
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))
    }

    /// 更新子客户端属性
    ///
    /// `properties` 通常取自 [`SubclientsApi::properties`] 并修改后提交；
    /// `subClientEntity.subclientName` 变化时一并重命名。
    pub async fn update_properties(&self, subclient_id: i64, properties: Value) -> Result<()> {
        let current = self.properties(subclient_id).await?;
        let request = update_request(&current, properties);

        info!("更新子客户端 {} 的属性", subclient_id);
        let url = self.subclient_url(subclient_id)?;
        let response = self
            .commcell
            .make_request(Method::POST, &url, Some(Payload::Json(request)), None)
            .await?;

        let (code, message) = update_result(&success_json(&response)?)?;
        if code == "0" {
            return Ok(());
        }
        Err(SdkError::with_message(
            ErrorModule::Subclient,
            102,
            format!("Failed to update subclient properties\nError: \"{}\"", message),
        ))
    }

    /// 重命名子客户端
    pub async fn rename(&self, subclient_id: i64, new_name: &str) -> Result<()> {
        let mut properties = self.properties(subclient_id).await?;
        match properties.get_mut("subClientEntity").and_then(Value::as_object_mut) {
            Some(entity) => {
                entity.insert("subclientName".to_string(), json!(new_name));
            }
            None => return Err(SdkError::new(ErrorModule::Response, 102)),
        }
        self.update_properties(subclient_id, properties).await
    }

    /// 删除子客户端
    pub async fn delete(&self, scope: &SubclientScope, name: &str) -> Result<()> {
        let subclient = self.get(scope, name).await?;
        info!("删除子客户端: {} (id={})", subclient.name, subclient.id);

        let url = self.subclient_url(subclient.id)?;
        let response = self
            .commcell
            .make_request(Method::DELETE, &url, None, None)
            .await?;
        let value = success_json(&response)?;
        let Some(result) = value.pointer("/response/0") else {
            return Ok(());
        };
        if let Some(message) = str_field(result, "errorString").filter(|m| !m.is_empty()) {
            return Err(SdkError::with_message(
                ErrorModule::Subclient,
                102,
                format!("Failed to delete subclient\nError: \"{}\"", message),
            ));
        }
        let code = str_field(result, "errorCode").unwrap_or_default();
        if code == "0" {
            return Ok(());
        }
        Err(SdkError::with_message(
            ErrorModule::Subclient,
            102,
            format!(
                "Failed to delete subclient with Error Code: \"{}\"\nPlease check the documentation for more details on the error",
                code
            ),
        ))
    }

    /// 触发子客户端备份
    pub async fn backup(&self, subclient_id: i64, options: &BackupOptions) -> Result<JobSubmission> {
        info!(
            "触发子客户端 {} 的 {} 备份",
            subclient_id,
            options.level.as_str()
        );
        let url = self.commcell.services().url_with(
            Service::SubclientBackup,
            &[&subclient_id.to_string(), &options.request()],
        )?;
        let response = self
            .commcell
            .make_request(Method::POST, &url, None, None)
            .await?;
        backup_submission(&success_json(&response)?)
    }

    fn subclient_url(&self, subclient_id: i64) -> Result<String> {
        self.commcell
            .services()
            .url_with(Service::Subclient, &[&subclient_id.to_string()])
    }
}

fn success_json(response: &HttpResponse) -> Result<Value> {
    if !response.is_success() {
        return Err(SdkError::with_message(
            ErrorModule::Response,
            101,
            update_response(response.text()),
        ));
    }
    response.json_non_empty()
}

fn summary_from(entry: &Value) -> Option<SubclientSummary> {
    let entity = entry.get("subClientEntity")?;
    let lower = |key: &str| str_field(entity, key).unwrap_or_default().to_lowercase();
    Some(SubclientSummary {
        id: int_field(entity, "subclientId")?,
        name: lower("subclientName"),
        agent: lower("appName"),
        instance: lower("instanceName"),
        backupset: lower("backupsetName"),
        is_default: entry
            .pointer("/commonProperties/isDefaultSubclient")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn index_subclients(entries: &[Value], scope: &SubclientScope) -> HashMap<String, SubclientSummary> {
    let matched: Vec<SubclientSummary> = entries
        .iter()
        .filter_map(summary_from)
        .filter(|s| scope.matches(s))
        .collect();

    let instances: HashSet<&str> = matched.iter().map(|s| s.instance.as_str()).collect();
    let mut backupsets: HashMap<&str, HashSet<&str>> = HashMap::new();
    for s in &matched {
        backupsets
            .entry(s.instance.as_str())
            .or_default()
            .insert(s.backupset.as_str());
    }

    let prefix_instance = scope.instance.is_none() && instances.len() > 1;
    let prefix_backupset = |instance: &str| {
        scope.backupset.is_none() && backupsets.get(instance).map_or(0, HashSet::len) > 1
    };

    matched
        .iter()
        .map(|s| {
            let mut key = String::new();
            if prefix_instance {
                key.push_str(&s.instance);
                key.push('\\');
            }
            if prefix_backupset(&s.instance) {
                key.push_str(&s.backupset);
                key.push('\\');
            }
            key.push_str(&s.name);
            (key, s.clone())
        })
        .collect()
}

fn update_request(current: &Value, properties: Value) -> Value {
    let new_name = properties
        .pointer("/subClientEntity/subclientName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .filter(|name| {
            current.pointer("/subClientEntity/subclientName").and_then(Value::as_str) != Some(*name)
        })
        .map(str::to_string);

    let mut request = json!({"subClientProperties": properties});
    if let Some(name) = new_name {
        request["newName"] = json!(name);
    }
    request
}

/// 解析更新响应，返回 (错误码, 错误消息)
fn update_result(value: &Value) -> Result<(String, String)> {
    if let Some(first) = value.pointer("/response/0") {
        let code = str_field(first, "errorCode").unwrap_or_default();
        let message = str_field(first, "errorString").unwrap_or_default();
        return Ok((code, message));
    }
    if value.get("errorCode").is_some() {
        let code = value
            .get("errorCode")
            .and_then(error_code)
            .map(|c| c.to_string())
            .unwrap_or_default();
        let message = str_field(value, "errorMessage").unwrap_or_default();
        return Ok((code, message));
    }
    Err(SdkError::new(ErrorModule::Response, 102))
}

fn backup_submission(value: &Value) -> Result<JobSubmission> {
    if let Some(submission) = parse_job_submission(value) {
        return Ok(submission);
    }
    let message = match value.get("errorCode") {
        Some(_) => format!(
            "Initializing backup failed\nError: \"{}\"",
            str_field(value, "errorMessage").unwrap_or_default()
        ),
        None => "Initializing backup failed".to_string(),
    };
    Err(SdkError::with_message(ErrorModule::Subclient, 102, message))
}
