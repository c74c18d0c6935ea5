//! 软件缓存配置 API
//!
//! CommServ 缓存与远程缓存（Remote Cache）。早期版本只能通过
//! `EVGui_SetUpdateAgentInfoReq` XML 请求操作缓存，SP34 起提供 REST 端点。

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::{Commcell, Payload};
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::ClientSummary;
use crate::qoperation::ensure_success;
use crate::response::{error_code, is_empty_json, str_field, HttpResponse};
use crate::services::Service;

/// 通过 REST 端点配置远程缓存的最低 SP 版本
const REST_CONFIGURE_MIN_SP: i64 = 34;

/// 配置远程缓存的 uaOpCode
const OP_CONFIGURE_REMOTE_CACHE: &str = "5";

/// `EVGui_SetUpdateAgentInfoReq` 请求
#[derive(Debug, Clone, PartialEq, Eq)]
struct UpdateAgentRequest {
    delete_package_cache: String,
    delete_update_cache: String,
    sw_agent_op_type: String,
    ua_op_code: String,
    cache_path: Option<String>,
    /// 是否携带 uaPackageCacheStatus / uaUpdateCacheStatus
    cache_status: bool,
    ua_id: String,
    ua_name: String,
}

impl Default for UpdateAgentRequest {
    fn default() -> Self {
        Self {
            delete_package_cache: String::new(),
            delete_update_cache: String::new(),
            sw_agent_op_type: String::new(),
            ua_op_code: "0".to_string(),
            cache_path: None,
            cache_status: true,
            ua_id: "2".to_string(),
            ua_name: String::new(),
        }
    }
}

impl UpdateAgentRequest {
    fn delete_cache() -> Self {
        Self {
            delete_package_cache: "1".to_string(),
            delete_update_cache: "1".to_string(),
            sw_agent_op_type: "1".to_string(),
            ..Default::default()
        }
    }

    fn commit_cache() -> Self {
        Self {
            delete_package_cache: "0".to_string(),
            delete_update_cache: "0".to_string(),
            sw_agent_op_type: "4".to_string(),
            ..Default::default()
        }
    }

    fn configure_remote_cache(client: &ClientSummary, path: &str) -> Self {
        Self {
            ua_op_code: OP_CONFIGURE_REMOTE_CACHE.to_string(),
            cache_path: Some(path.to_string()),
            cache_status: false,
            ..Default::default()
        }
        .for_client(client)
    }

    fn for_client(mut self, client: &ClientSummary) -> Self {
        self.ua_id = client.id.to_string();
        self.ua_name = client.name.clone();
        self
    }

    fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        let mut ua_info = BytesStart::new("uaInfo");
        ua_info.push_attribute(("deletePackageCache", self.delete_package_cache.as_str()));
        ua_info.push_attribute(("deleteUpdateCache", self.delete_update_cache.as_str()));
        ua_info.push_attribute(("swAgentOpType", self.sw_agent_op_type.as_str()));
        ua_info.push_attribute(("uaOpCode", self.ua_op_code.as_str()));
        if self.cache_status {
            ua_info.push_attribute(("uaPackageCacheStatus", "0"));
            ua_info.push_attribute(("uaUpdateCacheStatus", "0"));
        }
        if let Some(path) = &self.cache_path {
            ua_info.push_attribute(("uaCachePath", path.as_str()));
        }

        let mut ua_name = BytesStart::new("uaName");
        ua_name.push_attribute(("id", self.ua_id.as_str()));
        ua_name.push_attribute(("name", self.ua_name.as_str()));

        let mut client = BytesStart::new("client");
        client.push_attribute(("_type_", "3"));

        let events = [
            Event::Start(BytesStart::new("EVGui_SetUpdateAgentInfoReq")),
            Event::Start(ua_info),
            Event::Empty(ua_name),
            Event::Empty(client),
            Event::End(BytesEnd::new("uaInfo")),
            Event::End(BytesEnd::new("EVGui_SetUpdateAgentInfoReq")),
        ];
        for event in events {
            writer.write_event(event).map_err(xml_error)?;
        }

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| SdkError::with_message(ErrorModule::CvSdk, 102, e.to_string()))
    }
}

fn xml_error(e: quick_xml::Error) -> SdkError {
    SdkError::with_message(ErrorModule::CvSdk, 102, format!("XML 处理失败: {}", e))
}

/// 远程缓存可关联的实体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntity {
    Client(String),
    ClientGroup(String),
}

/// 一组操作系统与其需要同步的软件包
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSelection {
    pub os_ids: Vec<i64>,
    pub package_ids: Vec<i64>,
}

impl PackageSelection {
    fn is_empty(&self) -> bool {
        self.os_ids.is_empty()
    }

    fn arguments(&self) -> String {
        let join = |ids: &[i64]| ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        format!("-si {} -si {}", join(&self.os_ids), join(&self.package_ids))
    }
}

/// CommServ 缓存 API
pub struct CommServeCacheApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> CommServeCacheApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// CommServ 缓存路径（全局参数 Patch Directory）
    pub async fn cs_cache_path(&self) -> Result<String> {
        let path = self
            .commcell
            .get_gxglobalparam_value("Patch Directory")
            .await
            .map_err(|_| {
                SdkError::with_message(
                    ErrorModule::Response,
                    101,
                    "Failed to execute api for get_cs_cache_path",
                )
            })?;
        match path {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(SdkError::new(ErrorModule::Response, 102)),
        }
    }

    /// 清空 CommServ 缓存
    pub async fn delete_cache(&self) -> Result<()> {
        info!("清空 CommServ 软件缓存");
        let xml = UpdateAgentRequest::delete_cache().to_xml()?;
        let value = self.commcell.qoperation_execute(Payload::Text(xml)).await?;
        check_qoperation(&value)
    }

    /// 提交 CommServ 缓存
    pub async fn commit_cache(&self) -> Result<()> {
        info!("提交 CommServ 软件缓存");
        let xml = UpdateAgentRequest::commit_cache().to_xml()?;
        let value = self.commcell.qoperation_execute(Payload::Text(xml)).await?;
        check_qoperation(&value)
    }

    /// 已配置为远程缓存的客户端名称（不含 CommServ）
    pub async fn remote_cache_clients(&self) -> Result<Vec<String>> {
        let url = self.commcell.services().url(Service::GetRemoteCacheClients);
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        if !response.is_success() {
            return Err(SdkError::new(ErrorModule::Response, 101));
        }

        let commserv = self.commcell.commserv_details().await?.name.clone();
        let names = client_names_from_xml(response.text())?;
        Ok(names.into_iter().filter(|n| *n != commserv).collect())
    }
}

/// 单个客户端的远程缓存 API
pub struct RemoteCacheApi<'a> {
    commcell: &'a Commcell,
    client_name: String,
}

impl<'a> RemoteCacheApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell, client_name: &str) -> Self {
        Self {
            commcell,
            client_name: client_name.to_string(),
        }
    }

    async fn client(&self) -> Result<ClientSummary> {
        self.commcell.clients().get(&self.client_name).await
    }

    /// 远程缓存路径，未配置时返回 None
    pub async fn cache_path(&self) -> Result<Option<String>> {
        let client = self.client().await?;
        let value = self
            .commcell
            .qoperation_execute(Payload::Text("<EVGui_GetUpdateAgentInfoReq />".to_string()))
            .await?;
        if is_empty_json(&value) {
            return Err(SdkError::new(ErrorModule::Response, 102));
        }
        cache_path_for(&value, &client.name)
    }

    /// 将客户端配置为远程缓存
    pub async fn configure(&self, cache_path: &str) -> Result<()> {
        let client = self.client().await?;
        let sp_version = self.commcell.commserv_details().await?.sp_version;
        info!("配置远程缓存: {} -> {}", client.name, cache_path);

        if sp_version >= REST_CONFIGURE_MIN_SP {
            let body = json!({
                "cacheDirectory": cache_path,
                "associations": [],
                "cache": {"name": client.name, "id": client.id},
            });
            let url = self.commcell.services().url(Service::SoftwareCache);
            let response = self
                .commcell
                .make_request(Method::POST, &url, Some(Payload::Json(body)), None)
                .await?;
            return check_software_cache(&response);
        }

        let xml = UpdateAgentRequest::configure_remote_cache(&client, cache_path).to_xml()?;
        let value = self.commcell.qoperation_execute(Payload::Text(xml)).await?;
        check_qoperation(&value)
    }

    /// 配置远程缓存需要同步的软件包；两组均为空时同步全部
    pub async fn configure_packages_to_sync(
        &self,
        windows: &PackageSelection,
        unix: &PackageSelection,
    ) -> Result<()> {
        let client = self.client().await?;
        let script = sync_script(&client.name, windows, unix);
        let value = self.commcell.qoperation_execscript(&script).await?;

        let Some(generic) = value.get("CVGui_GenericResp") else {
            return Ok(());
        };
        let code = generic.get("@errorCode").and_then(error_code).unwrap_or(0);
        if code == 0 {
            return Ok(());
        }
        let message = str_field(generic, "@errorMessage").unwrap_or_default();
        Err(qoperation_error(code, &message))
    }

    /// 清空远程缓存内容
    pub async fn delete_contents(&self) -> Result<()> {
        let client = self.client().await?;
        info!("清空远程缓存内容: {}", client.name);
        let xml = UpdateAgentRequest::delete_cache().for_client(&client).to_xml()?;
        let value = self.commcell.qoperation_execute(Payload::Text(xml)).await?;
        check_qoperation(&value)
    }

    /// 将客户端或客户端组关联到远程缓存
    pub async fn assoc_entity(&self, entity: &CacheEntity) -> Result<()> {
        let client = self.client().await?;
        let (entity_id, entity_name, entity_type) = match entity {
            CacheEntity::Client(name) => {
                let target = self.commcell.clients().all().await?.remove(&name.to_lowercase());
                let target = target.ok_or_else(|| not_exists(name))?;
                (target.id, target.name, "0")
            }
            CacheEntity::ClientGroup(name) => {
                let groups = self.commcell.client_groups().all().await?;
                let id = groups.get(&name.to_lowercase()).copied().ok_or_else(|| not_exists(name))?;
                (id, name.clone(), "1")
            }
        };
        info!("关联 {} 到远程缓存 {}", entity_name, client.name);

        let cache_path = self.cache_path().await?;
        let body = json!({
            "EVGui_SetUpdateAgentInfoReq": {
                "uaInfo": {
                    "uaCachePath": cache_path,
                    "uaOpCode": OP_CONFIGURE_REMOTE_CACHE,
                    "uaName": {"id": client.id.to_string(), "name": client.name},
                },
                "uaList": {
                    "addedList": {
                        "id": entity_id.to_string(),
                        "name": entity_name,
                        "type": entity_type,
                    }
                }
            }
        });

        let url = self.commcell.services().url(Service::ExecuteQcommand);
        let response = self
            .commcell
            .make_request(Method::POST, &url, Some(Payload::Json(body)), None)
            .await?;
        ensure_success(&response)?;
        let value = response.json_non_empty()?;
        check_qoperation(&value)
    }

    /// 远程缓存详情
    pub async fn details(&self) -> Result<Value> {
        let client = self.client().await?;
        let value = self.get_software_cache(&format!("/{}", client.id)).await?;
        if is_empty_json(&value) {
            return Err(SdkError::new(ErrorModule::Response, 102));
        }
        value
            .pointer("/softwareCacheDetailList/0")
            .cloned()
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))
    }

    /// 可配置为远程缓存的服务器
    pub async fn qualified_servers(&self) -> Result<Vec<Value>> {
        let url = self.commcell.services().url(Service::QualifiedServersSw);
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        if !response.is_success() {
            return Err(SdkError::new(ErrorModule::Response, 101));
        }
        detail_list(&response.json_non_empty()?)
    }

    /// 修改远程缓存目录
    pub async fn update_cache_path(&self, path: &str) -> Result<()> {
        self.update(json!({"cacheDirectory": path})).await
    }

    pub async fn enable(&self) -> Result<()> {
        self.update(json!({"enabled": true})).await
    }

    pub async fn disable(&self) -> Result<()> {
        self.update(json!({"enabled": false})).await
    }

    /// 替换远程缓存关联的实体
    pub async fn update_associations(&self, associations: Vec<Value>) -> Result<()> {
        self.update(json!({"associations": associations})).await
    }

    /// 删除远程缓存
    pub async fn delete(&self) -> Result<()> {
        let client = self.client().await?;
        info!("删除远程缓存: {}", client.name);
        let url = format!(
            "{}/{}",
            self.commcell.services().url(Service::SoftwareCache),
            client.id
        );
        let response = self
            .commcell
            .make_request(Method::DELETE, &url, None, None)
            .await?;
        check_software_cache(&response)
    }

    /// 全部远程缓存
    pub async fn all(&self) -> Result<Vec<Value>> {
        let value = self.get_software_cache("").await?;
        if is_empty_json(&value) {
            return Ok(Vec::new());
        }
        detail_list(&value)
    }

    async fn update(&self, body: Value) -> Result<()> {
        let client = self.client().await?;
        debug!("更新远程缓存 {}: {}", client.name, body);
        let url = format!(
            "{}/{}",
            self.commcell.services().url(Service::SoftwareCache),
            client.id
        );
        let response = self
            .commcell
            .make_request(Method::PUT, &url, Some(Payload::Json(body)), None)
            .await?;
        check_software_cache(&response)
    }

    async fn get_software_cache(&self, suffix: &str) -> Result<Value> {
        let url = format!("{}{}", self.commcell.services().url(Service::SoftwareCache), suffix);
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        if !response.is_success() {
            return Err(SdkError::new(ErrorModule::Response, 101));
        }
        response.json()
    }
}

fn not_exists(name: &str) -> SdkError {
    SdkError::with_message(ErrorModule::RemoteCache, 102, format!("{} does not exist", name))
}

fn qoperation_error(code: i64, message: &str) -> SdkError {
    SdkError::with_message(
        ErrorModule::Response,
        101,
        format!(
            "Error Code:\"{}\"\nError Message: \"Failed with error: [{}]\"",
            code, message
        ),
    )
}

/// 要求响应中带有 `errorCode` 且为 0，缺失时同样视为失败
fn check_qoperation(value: &Value) -> Result<()> {
    match value.get("errorCode").and_then(error_code) {
        Some(0) => Ok(()),
        Some(code) => {
            let message = str_field(value, "errorMessage").unwrap_or_default();
            Err(qoperation_error(code, &message))
        }
        None => Err(SdkError::with_message(
            ErrorModule::Response,
            101,
            value.to_string(),
        )),
    }
}

fn check_software_cache(response: &HttpResponse) -> Result<()> {
    if !response.is_success() {
        return Err(SdkError::new(ErrorModule::Response, 101));
    }
    let value = response.json_non_empty()?;
    let code = value.get("errorCode").and_then(error_code).unwrap_or(0);
    if code != 0 {
        return Err(SdkError::with_message(
            ErrorModule::Response,
            101,
            format!("Error Code: \"{}\"", code),
        ));
    }
    Ok(())
}

fn detail_list(value: &Value) -> Result<Vec<Value>> {
    value
        .get("softwareCacheDetailList")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))
}

fn cache_path_for(value: &Value, client_name: &str) -> Result<Option<String>> {
    let entries = value
        .get("uaInfo")
        .and_then(Value::as_array)
        .ok_or_else(|| SdkError::new(ErrorModule::Response, 101))?;
    Ok(entries
        .iter()
        .find(|e| e.pointer("/client/clientName").and_then(Value::as_str) == Some(client_name))
        .and_then(|e| str_field(e, "uaCachePath")))
}

fn sync_script(client_name: &str, windows: &PackageSelection, unix: &PackageSelection) -> String {
    let base = format!("-sn QS_GranularConfigRemoteCache -si '{}'", client_name);
    let selections: Vec<String> = [windows, unix]
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.arguments())
        .collect();
    if selections.is_empty() {
        format!("{} -si SyncAll", base)
    } else {
        format!("{} -si SyncCustom {}", base, selections.join(" "))
    }
}

/// 解析 XML 中所有 `client` 元素的 clientName
fn client_names_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut names = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"client" {
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        if attr.key.as_ref() == b"clientName" {
                            names.push(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ClientSummary {
        ClientSummary {
            id: 21,
            name: "rc01".to_string(),
            hostname: "rc01.local".to_string(),
        }
    }

    #[test]
    fn test_commit_cache_xml() {
        let xml = UpdateAgentRequest::commit_cache().to_xml().unwrap();
        assert!(xml.starts_with("<EVGui_SetUpdateAgentInfoReq><uaInfo "));
        assert!(xml.contains("deletePackageCache=\"0\""));
        assert!(xml.contains("swAgentOpType=\"4\""));
        assert!(xml.contains("uaPackageCacheStatus=\"0\""));
        assert!(xml.contains("<uaName id=\"2\" name=\"\"/>"));
        assert!(xml.contains("<client _type_=\"3\"/>"));
    }

    #[test]
    fn test_configure_remote_cache_xml() {
        let xml = UpdateAgentRequest::configure_remote_cache(&client(), "/opt/cache")
            .to_xml()
            .unwrap();
        assert!(xml.contains("uaOpCode=\"5\""));
        assert!(xml.contains("uaCachePath=\"/opt/cache\""));
        assert!(!xml.contains("uaPackageCacheStatus"));
        assert!(xml.contains("<uaName id=\"21\" name=\"rc01\"/>"));
    }

    #[test]
    fn test_client_names_from_xml() {
        let xml = r#"<App_GetRemoteCacheResp>
            <client clientName="cs01" clientId="2"/>
            <client clientName="rc01" clientId="21"></client>
        </App_GetRemoteCacheResp>"#;
        assert_eq!(client_names_from_xml(xml).unwrap(), vec!["cs01", "rc01"]);
    }

    #[test]
    fn test_sync_script() {
        let none = PackageSelection::default();
        assert_eq!(
            sync_script("rc01", &none, &none),
            "-sn QS_GranularConfigRemoteCache -si 'rc01' -si SyncAll"
        );

        let windows = PackageSelection {
            os_ids: vec![3, 4],
            package_ids: vec![1, 702],
        };
        let unix = PackageSelection {
            os_ids: vec![16],
            package_ids: vec![1101],
        };
        assert_eq!(
            sync_script("rc01", &windows, &none),
            "-sn QS_GranularConfigRemoteCache -si 'rc01' -si SyncCustom -si 3,4 -si 1,702"
        );
        assert_eq!(
            sync_script("rc01", &windows, &unix),
            "-sn QS_GranularConfigRemoteCache -si 'rc01' -si SyncCustom -si 3,4 -si 1,702 -si 16 -si 1101"
        );
    }

    #[test]
    fn test_cache_path_for() {
        let value = json!({"uaInfo": [
            {"client": {"clientName": "cs01"}, "uaCachePath": "C:\\cache"},
            {"client": {"clientName": "rc01"}, "uaCachePath": "/opt/cache"}
        ]});
        assert_eq!(cache_path_for(&value, "rc01").unwrap().as_deref(), Some("/opt/cache"));
        assert_eq!(cache_path_for(&value, "other").unwrap(), None);
        assert!(cache_path_for(&json!({"x": 1}), "rc01").is_err());
    }

    #[test]
    fn test_check_qoperation() {
        assert!(check_qoperation(&json!({"errorCode": 0})).is_ok());
        let err = check_qoperation(&json!({"errorCode": 9, "errorMessage": "denied"})).unwrap_err();
        assert!(err.is(ErrorModule::Response, 101));
        assert!(err
            .message()
            .ends_with("Error Code:\"9\"\nError Message: \"Failed with error: [denied]\""));
    }

    #[test]
    fn test_check_qoperation_requires_error_code() {
        let err = check_qoperation(&json!({"output": "<html>login</html>"})).unwrap_err();
        assert!(err.is(ErrorModule::Response, 101));
        assert!(err.message().contains("<html>login</html>"));
    }
}
