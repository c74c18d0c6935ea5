//! 内容分析器 API

use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::client::Commcell;
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::ContentAnalyzer;
use crate::response::{int_field, str_field};
use crate::services::Service;
use crate::wrap::WrapOptions;

/// 内容分析器 API
pub struct ContentAnalyzersApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> ContentAnalyzersApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 查询全部内容分析器，键为小写客户端名
    pub async fn all(&self) -> Result<HashMap<String, ContentAnalyzer>> {
        info!("查询内容分析器列表");
        let value = self
            .commcell
            .wrap_request(
                Method::GET,
                Service::GetContentAnalyzerCloud,
                &[],
                WrapOptions::new().empty_check(false),
            )
            .await?;
        parse_content_analyzers(&value)
    }

    /// 客户端是否为内容分析器
    pub async fn has_client(&self, client_name: &str) -> Result<bool> {
        Ok(self.all().await?.contains_key(&client_name.to_lowercase()))
    }

    /// 按客户端名查询内容分析器
    pub async fn get(&self, client_name: &str) -> Result<ContentAnalyzer> {
        self.all()
            .await?
            .remove(&client_name.to_lowercase())
            .ok_or_else(|| {
                SdkError::with_message(
                    ErrorModule::ContentAnalyzer,
                    102,
                    "Unable to get ContentAnalyzer class object",
                )
            })
    }
}

fn parse_content_analyzers(value: &Value) -> Result<HashMap<String, ContentAnalyzer>> {
    let list = value
        .get("contentAnalyzerList")
        .and_then(Value::as_array)
        .ok_or_else(|| SdkError::new(ErrorModule::ContentAnalyzer, 103))?;

    Ok(list
        .iter()
        .filter_map(|entry| {
            let client_name = str_field(entry, "clientName")?;
            let analyzer = ContentAnalyzer {
                ca_url: str_field(entry, "caUrl").unwrap_or_default(),
                client_id: int_field(entry, "clientId").unwrap_or(0),
                client_name: client_name.clone(),
            };
            Some((client_name.to_lowercase(), analyzer))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_content_analyzers() {
        let value = json!({"contentAnalyzerList": [
            {"clientName": "CA01", "caUrl": "http://ca01:22000", "clientId": 14},
            {"clientName": "ca02"}
        ]});
        let analyzers = parse_content_analyzers(&value).unwrap();
        assert_eq!(analyzers["ca01"].ca_url, "http://ca01:22000");
        assert_eq!(analyzers["ca01"].client_id, 14);
        assert_eq!(analyzers["ca02"].client_id, 0);
    }

    #[test]
    fn test_missing_list() {
        let err = parse_content_analyzers(&json!({})).unwrap_err();
        assert!(err.is(ErrorModule::ContentAnalyzer, 103));
    }
}
