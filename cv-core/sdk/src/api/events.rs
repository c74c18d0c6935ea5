//! 事件查询 API

use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::client::Commcell;
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::Event;
use crate::qoperation::ensure_success;
use crate::response::{int_field, str_field};
use crate::services::Service;

/// 事件查询 API
pub struct EventsApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> EventsApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 查询事件，返回 事件 ID → 事件码
    ///
    /// # Arguments
    /// * `query` - 查询参数，例如 `[("level", "10")]`
    pub async fn events(&self, query: &[(&str, &str)]) -> Result<HashMap<String, String>> {
        let events = self.fetch(query).await?;
        Ok(events
            .iter()
            .filter_map(|e| Some((str_field(e, "id")?, str_field(e, "eventCode").unwrap_or_default())))
            .collect())
    }

    /// 查询事件详情，返回 事件 ID → 去掉 `id` 字段的事件内容
    pub async fn events_with_details(
        &self,
        query: &[(&str, &str)],
    ) -> Result<HashMap<String, Value>> {
        let events = self.fetch(query).await?;
        Ok(events
            .into_iter()
            .filter_map(|mut e| {
                let id = str_field(&e, "id")?;
                if let Some(map) = e.as_object_mut() {
                    map.remove("id");
                }
                Some((id, e))
            })
            .collect())
    }

    /// 按 ID 查询单个事件
    pub async fn get(&self, event_id: &str) -> Result<Event> {
        info!("查询事件详情: {}", event_id);
        let url = self
            .commcell
            .services()
            .url_with(Service::GetEvent, &[event_id])?;
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        ensure_success(&response)?;

        let value = response.json()?;
        let first = value
            .pointer("/commservEvents/0")
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))?;
        parse_event(event_id, first)
    }

    async fn fetch(&self, query: &[(&str, &str)]) -> Result<Vec<Value>> {
        info!("查询事件列表");
        let url = events_url(&self.commcell.services().url(Service::GetEvents), query);
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        ensure_success(&response)?;

        let value = response.json()?;
        value
            .get("commservEvents")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))
    }
}

fn events_url(base: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return base.to_string();
    }
    let params = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, params)
}

fn parse_event(event_id: &str, value: &Value) -> Result<Event> {
    let event_code = str_field(value, "eventCode").ok_or_else(|| {
        SdkError::with_message(ErrorModule::Event, 101, "Missing key: eventCode")
    })?;

    Ok(Event {
        id: str_field(value, "id").unwrap_or_else(|| event_id.to_string()),
        event_code,
        time_source: int_field(value, "timeSource"),
        severity: int_field(value, "severity"),
        job_id: int_field(value, "jobId"),
        description: str_field(value, "description").unwrap_or_default(),
        subsystem: str_field(value, "subsystem").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_url() {
        let base = "https://cs/commandcenter/api/Events";
        assert_eq!(events_url(base, &[]), base);
        assert_eq!(
            events_url(base, &[("level", "10"), ("showInfo", "false")]),
            format!("{}?level=10&showInfo=false", base)
        );
        assert_eq!(
            events_url(base, &[("client name", "fs&01")]),
            format!("{}?client%20name=fs%2601", base)
        );
    }

    #[test]
    fn test_parse_event() {
        let value = json!({
            "id": 77, "eventCode": "318767861", "timeSource": 1700000000,
            "severity": 6, "jobId": 0, "description": "Backup disabled", "subsystem": "CommServe"
        });
        let event = parse_event("77", &value).unwrap();
        assert!(event.is_backup_disabled());
        assert_eq!(event.time_source, Some(1_700_000_000));
        assert_eq!(event.subsystem, "CommServe");
    }
}
