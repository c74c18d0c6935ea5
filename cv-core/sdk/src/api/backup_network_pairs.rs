//! 备份网络接口对 API

use std::collections::HashMap;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::client::Commcell;
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::{ClientSummary, InterfaceEndpoint, InterfacePair, PairEntity};
use crate::response::error_code;
use crate::services::Service;
use crate::wrap::WrapOptions;

/// 接口对操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOperation {
    Add,
    Delete,
}

impl PairOperation {
    fn as_str(&self) -> &'static str {
        match self {
            PairOperation::Add => "ADD",
            PairOperation::Delete => "DELETE",
        }
    }
}

/// 备份网络接口对 API
pub struct BackupNetworkPairsApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> BackupNetworkPairsApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 查询客户端已配置的接口对，未配置时返回空列表
    pub async fn get_backup_interface_for_client(&self, client_name: &str) -> Result<Vec<Value>> {
        let client = self.commcell.clients().get(client_name).await?;
        info!("查询客户端 {} 的备份网络接口对", client.name);

        let value = self
            .commcell
            .wrap_request(
                Method::GET,
                Service::BackupNetworkPairs,
                &[&client.id.to_string()],
                WrapOptions::new().empty_check(false),
            )
            .await?;

        Ok(value
            .get("ArchPipeLineList")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// 添加接口对
    pub async fn add_backup_interface_pairs(&self, pairs: &[InterfacePair]) -> Result<()> {
        self.modify(pairs, PairOperation::Add).await
    }

    /// 删除接口对
    pub async fn delete_backup_interface_pairs(&self, pairs: &[InterfacePair]) -> Result<()> {
        self.modify(pairs, PairOperation::Delete).await
    }

    async fn modify(&self, pairs: &[InterfacePair], operation: PairOperation) -> Result<()> {
        info!("{} {} 个备份网络接口对", operation.as_str(), pairs.len());
        let clients = self.commcell.clients().all().await?;
        let groups = self.commcell.client_groups().all().await?;

        let body = pairs_request(pairs, operation, &clients, &groups);
        let value = self
            .commcell
            .wrap_request(
                Method::POST,
                Service::BackupNetworkPair,
                &[],
                WrapOptions::new()
                    .payload(body)
                    .empty_check(false)
                    .error_check(false),
            )
            .await?;

        match value.get("errorCode").and_then(error_code) {
            Some(code) if code != 0 => Err(SdkError::with_message(
                ErrorModule::BackupNetworkPairs,
                101,
                "Failed to set network pairs",
            )),
            _ => Ok(()),
        }
    }
}

fn pairs_request(
    pairs: &[InterfacePair],
    operation: PairOperation,
    clients: &HashMap<String, ClientSummary>,
    groups: &HashMap<String, i64>,
) -> Value {
    let client_id = |end: &InterfaceEndpoint| match &end.entity {
        PairEntity::Client(name) => clients.get(&name.to_lowercase()).map(|c| c.id).unwrap_or(0),
        PairEntity::ClientGroup(_) => 0,
    };
    let group_id = |end: &InterfaceEndpoint| match &end.entity {
        PairEntity::ClientGroup(name) => groups.get(&name.to_lowercase()).copied().unwrap_or(0),
        PairEntity::Client(_) => 0,
    };

    let list: Vec<Value> = pairs
        .iter()
        .map(|pair| {
            json!({
                "destGroupId": group_id(&pair.destination),
                "srcGroupId": group_id(&pair.source),
                "isActive": 1,
                "client2": {
                    "name": pair.destination.interface,
                    "id": client_id(&pair.destination),
                },
                "client1": {
                    "name": pair.source.interface,
                    "id": client_id(&pair.source),
                },
            })
        })
        .collect();

    json!({
        "operationType": operation.as_str(),
        "ArchPipeLineList": list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_request_resolves_ids() {
        let mut clients = HashMap::new();
        clients.insert(
            "featuretest".to_string(),
            ClientSummary {
                id: 11,
                name: "featuretest".to_string(),
                hostname: "ft.local".to_string(),
            },
        );
        let mut groups = HashMap::new();
        groups.insert("g1".to_string(), 5);

        let pairs = vec![
            InterfacePair::new(
                InterfaceEndpoint::client("FeatureTest", "172.19.96.123"),
                InterfaceEndpoint::client_group("G1", "No Default Interface"),
            ),
            InterfacePair::new(
                InterfaceEndpoint::client("unknown", "10.0.0.1"),
                InterfaceEndpoint::client_group("missing", "10.0.0.*"),
            ),
        ];

        let body = pairs_request(&pairs, PairOperation::Add, &clients, &groups);
        assert_eq!(body["operationType"], "ADD");

        let first = &body["ArchPipeLineList"][0];
        assert_eq!(first["client1"], json!({"name": "172.19.96.123", "id": 11}));
        assert_eq!(first["srcGroupId"], 0);
        assert_eq!(first["destGroupId"], 5);
        assert_eq!(first["client2"]["id"], 0);
        assert_eq!(first["isActive"], 1);

        let second = &body["ArchPipeLineList"][1];
        assert_eq!(second["client1"]["id"], 0);
        assert_eq!(second["destGroupId"], 0);
    }
}
