//! 客户端管理 API

use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::client::Commcell;
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::ClientSummary;
use crate::response::{int_field, str_field};
use crate::services::Service;
use crate::wrap::WrapOptions;

/// 客户端管理 API
pub struct ClientsApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> ClientsApi<'a> {
    /// 创建新的客户端 API 实例
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 查询全部客户端，键为小写客户端名
    pub async fn all(&self) -> Result<HashMap<String, ClientSummary>> {
        info!("查询客户端列表");
        let value = self
            .commcell
            .wrap_request(Method::GET, Service::GetAllClients, &[], WrapOptions::new())
            .await?;
        Ok(parse_clients(&value))
    }

    /// 客户端是否存在
    pub async fn has_client(&self, name: &str) -> Result<bool> {
        Ok(self.all().await?.contains_key(&name.to_lowercase()))
    }

    /// 按名称查询客户端
    pub async fn get(&self, name: &str) -> Result<ClientSummary> {
        self.all()
            .await?
            .remove(&name.to_lowercase())
            .ok_or_else(|| {
                SdkError::with_message(
                    ErrorModule::Client,
                    102,
                    format!("No client exists with name: {}", name),
                )
            })
    }

    /// 按名称查询客户端 ID，不存在时返回 None
    pub async fn id_of(&self, name: &str) -> Result<Option<i64>> {
        Ok(self.all().await?.get(&name.to_lowercase()).map(|c| c.id))
    }
}

fn parse_clients(value: &Value) -> HashMap<String, ClientSummary> {
    let mut clients = HashMap::new();
    let entries = value
        .get("clientProperties")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for entry in &entries {
        let Some(entity) = entry.pointer("/client/clientEntity") else {
            continue;
        };
        let Some(name) = str_field(entity, "clientName") else {
            continue;
        };
        let summary = ClientSummary {
            id: int_field(entity, "clientId").unwrap_or_default(),
            hostname: str_field(entity, "hostName").unwrap_or_default(),
            name: name.clone(),
        };
        clients.insert(name.to_lowercase(), summary);
    }
    clients
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_clients() {
        let value = json!({
            "clientProperties": [
                {"client": {"clientEntity": {"clientName": "MA01", "clientId": 3, "hostName": "ma01.local"}}},
                {"client": {}}
            ]
        });
        let clients = parse_clients(&value);
        assert_eq!(clients.len(), 1);
        let ma = &clients["ma01"];
        assert_eq!(ma.id, 3);
        assert_eq!(ma.name, "MA01");
        assert_eq!(ma.hostname, "ma01.local");
    }
}
