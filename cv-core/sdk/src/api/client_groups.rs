//! 客户端组管理 API

use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::api::unique_name_keys;
use crate::client::Commcell;
use crate::error::{ErrorModule, Result, SdkError};
use crate::response::{int_field, str_field};
use crate::services::Service;
use crate::wrap::WrapOptions;

/// 客户端组管理 API
pub struct ClientGroupsApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> ClientGroupsApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 查询全部客户端组，键为小写组名（跨公司同名时为 `name_(company)`）
    pub async fn all(&self) -> Result<HashMap<String, i64>> {
        info!("查询客户端组列表");
        let value = self
            .commcell
            .wrap_request(Method::GET, Service::ClientGroups, &[], WrapOptions::new())
            .await?;

        let groups = value
            .get("groups")
            .and_then(Value::as_array)
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))?;
        Ok(parse_groups(groups))
    }

    /// 客户端组是否存在
    pub async fn has_group(&self, name: &str) -> Result<bool> {
        Ok(self.all().await?.contains_key(&name.to_lowercase()))
    }

    /// 按名称查询客户端组 ID
    pub async fn get(&self, name: &str) -> Result<i64> {
        self.all()
            .await?
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| {
                SdkError::with_message(
                    ErrorModule::ClientGroup,
                    102,
                    format!("No ClientGroup exists with name: {}", name),
                )
            })
    }
}

fn parse_groups(groups: &[Value]) -> HashMap<String, i64> {
    let names: Vec<(String, String)> = groups
        .iter()
        .map(|g| {
            let name = str_field(g, "name").unwrap_or_default();
            let company = g
                .pointer("/clientGroup/entityInfo/companyName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (name, company)
        })
        .collect();

    let keys = unique_name_keys(names.iter().map(|(n, c)| (n.as_str(), c.as_str())));
    keys.into_iter()
        .zip(groups)
        .map(|(key, group)| (key, int_field(group, "Id").unwrap_or_default()))
        .collect()
}
