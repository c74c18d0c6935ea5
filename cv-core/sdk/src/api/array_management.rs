//! 存储阵列与快照管理 API
//!
//! 快照操作（挂载、卸载、删除、回滚、对账）提交后返回作业；阵列的增删改
//! 直接作用于 `StorageArrays` 端点。

use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::client::{Commcell, Payload};
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::JobRef;
use crate::response::{error_code, int_field, str_field, HttpResponse};
use crate::services::Service;

/// 阵列控制选项 Pruning 的 ID
const PRUNING_OPTION_ID: i64 = 262144;

/// 快照操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapOperation {
    Mount,
    Unmount,
    ForceUnmount,
    Delete,
    ForceDelete,
    Revert,
    Reconcile,
}

impl SnapOperation {
    /// 操作码
    pub fn code(&self) -> i64 {
        match self {
            SnapOperation::Mount => 0,
            SnapOperation::Unmount | SnapOperation::ForceUnmount => 1,
            SnapOperation::Delete | SnapOperation::ForceDelete => 2,
            SnapOperation::Revert => 3,
            SnapOperation::Reconcile => 7,
        }
    }

    fn flags(&self) -> i64 {
        match self {
            SnapOperation::ForceUnmount => 1,
            SnapOperation::ForceDelete => 2,
            _ => 0,
        }
    }
}

/// 挂载选项
#[derive(Debug, Clone)]
pub struct MountOptions {
    /// 挂载到的客户端
    pub client_name: String,
    /// 挂载路径
    pub mount_path: String,
    pub do_vss_protection: bool,
    /// 代理服务器凭据，设置后 serverType 为 1
    pub user_credentials: Option<Value>,
    pub server_name: Option<String>,
    pub instance_details: Option<Value>,
    pub dest_client_id: Option<i64>,
}

impl MountOptions {
    pub fn new(client_name: &str, mount_path: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            mount_path: mount_path.to_string(),
            do_vss_protection: true,
            user_credentials: None,
            server_name: None,
            instance_details: None,
            dest_client_id: None,
        }
    }
}

/// 新增阵列的参数
#[derive(Debug, Clone, Default)]
pub struct ArrayDefinition {
    pub vendor_name: String,
    pub array_name: String,
    /// 凭据库中的凭据名
    pub credential_name: String,
    pub vendor_id: i64,
    /// masterConfigId → 值；为 None 时不下发快照配置
    pub config_data: Option<Vec<(i64, String)>>,
    pub control_host: Option<String>,
    pub access_nodes: Vec<String>,
    /// NetApp 阵列是否通过 OCUM 管理
    pub is_ocum: bool,
}

/// 快照配置的生效层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    Array,
    Copy(i64),
    Subclient(i64),
    Client(i64),
}

impl ConfigLevel {
    fn assoc_type(&self) -> i64 {
        match self {
            ConfigLevel::Array => 3,
            ConfigLevel::Copy(_) => 6,
            ConfigLevel::Subclient(_) => 9,
            ConfigLevel::Client(_) => 8,
        }
    }

    fn query(&self, control_host_id: i64) -> String {
        let assoc = self.assoc_type();
        match self {
            ConfigLevel::Array => format!("/{}", control_host_id),
            ConfigLevel::Copy(id) => {
                format!("/{}?copyId={}&assocType={}", control_host_id, id, assoc)
            }
            ConfigLevel::Subclient(id) => {
                format!("/{}?appId={}&assocType={}", control_host_id, id, assoc)
            }
            ConfigLevel::Client(id) => {
                format!("/{}?clientId={}&assocType={}", control_host_id, id, assoc)
            }
        }
    }
}

/// 别名类配置项的修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasEdit {
    Add(String),
    Delete(String),
    /// 将 `from` 重命名为 `to`
    Rename { from: String, to: String },
}

/// 配置项的新值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEdit {
    Value(String),
    Aliases(Vec<AliasEdit>),
}

/// 访问节点的修改
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEdit {
    Add,
    Delete,
}

/// 存储阵列与快照 API
pub struct ArrayManagementApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> ArrayManagementApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 挂载快照
    pub async fn mount(&self, volume_ids: &[i64], options: &MountOptions) -> Result<JobRef> {
        let client_id = self.commcell.clients().get(&options.client_name).await?.id;
        let volumes = self.volumes(volume_ids, SnapOperation::Mount, Some((client_id, options))).await?;
        self.submit(SnapOperation::Mount, volumes, options).await
    }

    /// 卸载快照
    pub async fn unmount(&self, volume_ids: &[i64]) -> Result<JobRef> {
        self.simple_operation(SnapOperation::Unmount, volume_ids).await
    }

    /// 强制卸载快照
    pub async fn force_unmount(&self, volume_ids: &[i64]) -> Result<JobRef> {
        self.simple_operation(SnapOperation::ForceUnmount, volume_ids).await
    }

    /// 删除快照
    pub async fn delete(&self, volume_ids: &[i64]) -> Result<JobRef> {
        self.simple_operation(SnapOperation::Delete, volume_ids).await
    }

    /// 强制删除快照
    pub async fn force_delete(&self, volume_ids: &[i64]) -> Result<JobRef> {
        self.simple_operation(SnapOperation::ForceDelete, volume_ids).await
    }

    /// 回滚到快照
    pub async fn revert(&self, volume_ids: &[i64]) -> Result<JobRef> {
        self.simple_operation(SnapOperation::Revert, volume_ids).await
    }

    /// 对账阵列上的快照
    pub async fn reconcile(&self, control_host_id: i64) -> Result<JobRef> {
        info!("提交快照对账: control host {}", control_host_id);
        let body = reconcile_request(control_host_id);
        self.post_snap(body).await
    }

    async fn simple_operation(&self, operation: SnapOperation, volume_ids: &[i64]) -> Result<JobRef> {
        let volumes = self.volumes(volume_ids, operation, None).await?;
        let body = snap_request(operation, volumes, &Value::Object(Map::new()), 0);
        info!("提交快照操作 {:?}: {:?}", operation, volume_ids);
        self.post_snap(body).await
    }

    async fn submit(
        &self,
        operation: SnapOperation,
        volumes: Vec<Value>,
        options: &MountOptions,
    ) -> Result<JobRef> {
        let app_id = match &options.user_credentials {
            Some(_) => options.instance_details.clone().unwrap_or_else(|| json!({})),
            None => json!({}),
        };
        let body = snap_request(operation, volumes, &app_id, options.dest_client_id.unwrap_or(0));
        info!("提交快照操作 {:?} 到客户端 {}", operation, options.client_name);
        self.post_snap(body).await
    }

    async fn volumes(
        &self,
        volume_ids: &[i64],
        operation: SnapOperation,
        mount: Option<(i64, &MountOptions)>,
    ) -> Result<Vec<Value>> {
        let commcell_id = self.commcell.commserv_details().await?.id;
        Ok(snap_volumes(volume_ids, operation, commcell_id, mount))
    }

    async fn post_snap(&self, body: Value) -> Result<JobRef> {
        let url = self.commcell.services().url(Service::SnapOperations);
        let response = self
            .commcell
            .make_request(Method::POST, &url, Some(Payload::Json(body)), None)
            .await?;
        if !response.is_success() {
            return Err(SdkError::new(ErrorModule::Snap, 102));
        }
        snap_job(&response.json()?)
    }

    /// 新增存储阵列，成功时返回服务端消息
    pub async fn add_array(&self, array: &ArrayDefinition) -> Result<String> {
        info!("添加存储阵列: {} ({})", array.array_name, array.vendor_name);

        let configs = match &array.config_data {
            Some(config_data) => {
                let vendor = self.vendor_configs(array.vendor_id).await?;
                let mut configs = vendor.get("configs").cloned().unwrap_or_else(|| json!({}));
                apply_vendor_configs(&mut configs, config_data);
                configs
            }
            None => json!({}),
        };

        let mut nodes = Vec::with_capacity(array.access_nodes.len());
        for node in &array.access_nodes {
            let client = self.commcell.clients().get(node).await?;
            nodes.push(access_node(node, client.id));
        }

        let body = add_array_request(array, configs, nodes);
        let response = self.storage_arrays(Method::POST, "", Some(body)).await?;
        let value = response.json()?;

        let Some(code) = value.get("errorCode").and_then(error_code) else {
            return Err(SdkError::new(ErrorModule::StorageArray, 102));
        };
        let message = str_field(&value, "errorMessage").unwrap_or_default();
        match code {
            0 => Ok(message),
            1 | 10 => Err(SdkError::new(ErrorModule::StorageArray, 101)),
            _ => Err(SdkError::with_message(
                ErrorModule::StorageArray,
                102,
                format!("Error: \"{}\"", message),
            )),
        }
    }

    /// 删除存储阵列
    pub async fn delete_array(&self, control_host_id: i64) -> Result<String> {
        info!("删除存储阵列: {}", control_host_id);
        let response = self
            .storage_arrays(Method::DELETE, &format!("/{}", control_host_id), None)
            .await?;
        let value = response.json()?;

        let message = str_field(&value, "errorMessage").unwrap_or_default();
        match value.get("errorCode").and_then(error_code) {
            Some(code) if code != 0 => {
                Err(SdkError::with_message(ErrorModule::StorageArray, 103, message))
            }
            _ => Ok(message),
        }
    }

    /// 修改阵列快照配置与访问节点
    ///
    /// # Arguments
    /// * `control_host_id` - 阵列控制主机 ID
    /// * `configs` - masterConfigId → 配置修改
    /// * `level` - 配置生效层级
    /// * `access_nodes` - 访问节点名 → 增/删
    pub async fn edit_array(
        &self,
        control_host_id: i64,
        configs: &[(i64, ConfigEdit)],
        level: ConfigLevel,
        access_nodes: &[(String, NodeEdit)],
    ) -> Result<()> {
        info!("修改存储阵列 {} 的快照配置 ({:?})", control_host_id, level);
        let current = self
            .storage_arrays(Method::GET, &level.query(control_host_id), None)
            .await?;
        let mut request = current.json()?;
        if !request.is_object() {
            return Err(SdkError::new(ErrorModule::Response, 102));
        }

        prepare_edit(&mut request, level);
        apply_config_edits(&mut request, configs, level);

        for (name, edit) in access_nodes {
            let client = self.commcell.clients().get(name).await?;
            apply_node_edit(&mut request, name, client.id, *edit);
        }
        finish_edit(&mut request);

        let response = self.storage_arrays(Method::PUT, "", Some(request)).await?;
        let value = response.json()?;
        match value.get("errorCode").and_then(error_code) {
            Some(0) => Ok(()),
            Some(1) => Err(SdkError::new(ErrorModule::StorageArray, 101)),
            Some(_) => {
                let message = str_field(&value, "errorMessage").unwrap_or_default();
                Err(SdkError::with_message(
                    ErrorModule::StorageArray,
                    103,
                    format!("Failed to update Snap Configs\nError: \"{}\"", message),
                ))
            }
            None => Err(SdkError::new(ErrorModule::StorageArray, 103)),
        }
    }

    async fn vendor_configs(&self, vendor_id: i64) -> Result<Value> {
        debug!("查询阵列厂商 {} 的默认快照配置", vendor_id);
        let response = self
            .storage_arrays(Method::GET, &format!("/Vendors/{}", vendor_id), None)
            .await?;
        response.json()
    }

    async fn storage_arrays(
        &self,
        method: Method,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse> {
        let url = format!(
            "{}{}",
            self.commcell.services().url(Service::StorageArrays),
            suffix
        );
        self.commcell
            .make_request(method, &url, body.map(Payload::Json), None)
            .await
    }
}

fn snap_volumes(
    volume_ids: &[i64],
    operation: SnapOperation,
    commcell_id: i64,
    mount: Option<(i64, &MountOptions)>,
) -> Vec<Value> {
    volume_ids
        .iter()
        .enumerate()
        .map(|(index, volume_id)| {
            if index > 0 {
                return json!({"volumeId": volume_id, "CommCellId": commcell_id});
            }

            let (client_id, options) = match mount {
                Some((id, options)) => (id, Some(options)),
                None => (0, None),
            };
            let credentials = options.and_then(|o| o.user_credentials.clone());
            let server_type = if credentials.is_some() { 1 } else { 0 };
            let server_name = match &credentials {
                Some(_) => options.and_then(|o| o.server_name.clone()).unwrap_or_default(),
                None => String::new(),
            };

            json!({
                "doVSSProtection": options.map(|o| o.do_vss_protection as i64).unwrap_or(1),
                "destClientId": client_id,
                "destPath": options.map(|o| Value::from(o.mount_path.clone())).unwrap_or(Value::Null),
                "serverType": server_type,
                "flags": operation.flags(),
                "serverName": server_name,
                "userCredentials": credentials.unwrap_or_else(|| json!({})),
                "volumeId": volume_id,
                "CommCellId": commcell_id,
            })
        })
        .collect()
}

fn snap_request(operation: SnapOperation, volumes: Vec<Value>, app_id: &Value, dest_client_id: i64) -> Value {
    json!({
        "reserveField": 0,
        "serverType": 0,
        "operation": operation.code(),
        "userCredentials": {},
        "volumes": volumes,
        "appId": app_id,
        "destClientId": dest_client_id,
    })
}

fn reconcile_request(control_host_id: i64) -> Value {
    json!({
        "reserveField": 0,
        "doVSSProtection": 0,
        "serverName": "",
        "controlHostId": control_host_id,
        "CopyId": 0,
        "smArrayId": "",
        "destClientId": 0,
        "destPath": "",
        "serverType": 0,
        "operation": SnapOperation::Reconcile.code(),
        "userCredentials": {},
        "scsiServer": {"_type_": 3},
    })
}

fn snap_job(value: &Value) -> Result<JobRef> {
    if let Some(job_id) = int_field(value, "jobId") {
        return Ok(JobRef::new(job_id));
    }
    if value.get("errorCode").is_some() {
        let message = str_field(value, "errorMessage").unwrap_or_default();
        return Err(SdkError::with_message(
            ErrorModule::Snap,
            102,
            format!("job for Snap Operation failed\nError: \"{}\"", message),
        ));
    }
    Err(SdkError::new(ErrorModule::Snap, 102))
}

fn access_node(name: &str, client_id: i64) -> Value {
    json!({
        "arrayControllerId": 0,
        "mediaAgent": {"name": name, "id": client_id},
        "arrCtrlOptions": [{
            "isEnabled": true,
            "arrCtrlOption": {"name": "Pruning", "id": PRUNING_OPTION_ID},
        }],
    })
}

fn apply_vendor_configs(configs: &mut Value, config_data: &[(i64, String)]) {
    let Some(list) = configs.get_mut("configList").and_then(Value::as_array_mut) else {
        return;
    };
    for (master_id, value) in config_data {
        for config in list.iter_mut() {
            if int_field(config, "masterConfigId") == Some(*master_id) {
                config["value"] = Value::from(value.clone());
            }
        }
    }
}

fn array_type(vendor_name: &str, is_ocum: bool) -> i64 {
    match (vendor_name == "NetApp", is_ocum) {
        (true, true) => 1,
        (true, false) => 2,
        _ => 0,
    }
}

fn add_array_request(array: &ArrayDefinition, configs: Value, nodes: Vec<Value>) -> Value {
    let assoc_type = if array.config_data.is_some() { 3 } else { 0 };
    json!({
        "clientId": 0,
        "flags": 0,
        "assocType": assoc_type,
        "copyId": 0,
        "appId": 0,
        "selectedMAs": nodes,
        "hostDG": {
            "doNotMoveDevices": true,
            "isOverridden": false,
            "hostDGName": "",
            "useOnlySpouseDevices": false,
            "flags": 0,
            "deviceGroupOption": 0,
        },
        "arrayDG": {
            "isOverridden": false,
            "arrayDGName": "",
            "flags": 0,
            "disableDG": false,
            "useDevicesFromThisDG": false,
        },
        "configs": configs,
        "array": {"name": "", "id": 0},
        "vendor": {"name": "", "id": 0},
        "info": {
            "passwordEdit": false,
            "offlineReason": "",
            "arrayType": array_type(&array.vendor_name, array.is_ocum),
            "flags": 0,
            "description": "",
            "ctrlHostName": array.control_host,
            "offlineCode": 0,
            "isEnabled": true,
            "arrayInfoType": 0,
            "uniqueIdentifier": "",
            "securityAssociations": {"processHiddenPermission": 0},
            "userPswd": {"userName": ""},
            "arraySecurity": {},
            "arrayName": {"name": array.array_name, "id": 0},
            "vendor": {"name": array.vendor_name, "id": 0},
            "client": {"name": "", "id": 0},
            "savedCredential": {"credentialName": array.credential_name},
        },
    })
}

fn level_ids(level: ConfigLevel) -> (i64, i64, i64) {
    match level {
        ConfigLevel::Array => (0, 0, 0),
        ConfigLevel::Copy(id) => (id, 0, 0),
        ConfigLevel::Subclient(id) => (0, id, 0),
        ConfigLevel::Client(id) => (0, 0, id),
    }
}

fn prepare_edit(request: &mut Value, level: ConfigLevel) {
    let (copy_id, app_id, client_id) = level_ids(level);
    if let Some(map) = request.as_object_mut() {
        map.insert("add".to_string(), json!(false));
        map.insert("forceAdd".to_string(), json!(false));
        map.insert("assocType".to_string(), json!(level.assoc_type()));
        map.insert("copyId".to_string(), json!(copy_id));
        map.insert("appId".to_string(), json!(app_id));
        map.insert("clientId".to_string(), json!(client_id));
    }
}

fn apply_config_edits(request: &mut Value, edits: &[(i64, ConfigEdit)], level: ConfigLevel) {
    let Some(list) = request
        .pointer_mut("/configList/configList")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for (master_id, edit) in edits {
        for config in list.iter_mut() {
            if int_field(config, "masterConfigId") != Some(*master_id) {
                continue;
            }
            match edit {
                ConfigEdit::Value(value) => config["value"] = Value::from(value.clone()),
                ConfigEdit::Aliases(aliases) => apply_alias_edits(config, aliases),
            }
            if level != ConfigLevel::Array {
                config["isOverridden"] = json!(true);
            }
        }
    }
}

fn apply_alias_edits(config: &mut Value, edits: &[AliasEdit]) {
    if !config.get("values").map(Value::is_array).unwrap_or(false) {
        config["values"] = json!([]);
    }
    let Some(values) = config.get_mut("values").and_then(Value::as_array_mut) else {
        return;
    };
    let name_of = |v: &Value| v.get("name").and_then(Value::as_str).map(str::to_string);

    for edit in edits {
        match edit {
            AliasEdit::Add(alias) => {
                if !values.iter().any(|v| name_of(v).as_deref() == Some(alias.as_str())) {
                    values.push(json!({"name": alias, "id": 0}));
                }
            }
            AliasEdit::Delete(alias) => {
                if let Some(pos) = values.iter().position(|v| name_of(v).as_deref() == Some(alias.as_str())) {
                    values.remove(pos);
                }
            }
            AliasEdit::Rename { from, to } => {
                for value in values.iter_mut() {
                    if name_of(value).as_deref() == Some(from.as_str()) {
                        value["name"] = Value::from(to.clone());
                    }
                }
            }
        }
    }
}

fn apply_node_edit(request: &mut Value, name: &str, client_id: i64, edit: NodeEdit) {
    let has_node = |nodes: &[Value]| {
        nodes
            .iter()
            .position(|n| n.pointer("/mediaAgent/id").and_then(Value::as_i64) == Some(client_id))
    };

    match edit {
        NodeEdit::Add => match request.get_mut("selectedMAs").and_then(Value::as_array_mut) {
            Some(nodes) => {
                if has_node(nodes.as_slice()).is_none() {
                    nodes.push(access_node(name, client_id));
                }
            }
            None => request["selectedMAs"] = json!([access_node(name, client_id)]),
        },
        NodeEdit::Delete => {
            if let Some(nodes) = request.get_mut("selectedMAs").and_then(Value::as_array_mut) {
                if let Some(pos) = has_node(nodes.as_slice()) {
                    nodes.remove(pos);
                }
            }
        }
    }
}

fn finish_edit(request: &mut Value) {
    if let Some(map) = request.as_object_mut() {
        if let Some(configs) = map.remove("configList") {
            map.insert("configs".to_string(), configs);
        }
    }
    if let Some(info) = request.get_mut("info").and_then(Value::as_object_mut) {
        info.remove("region");
    }
}
