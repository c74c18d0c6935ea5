//! HTTP 响应封装

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::{ErrorModule, Result, SdkError};

/// 已读取完毕的 HTTP 响应
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl HttpResponse {
    pub fn new(status: u16, headers: HeaderMap, body: String) -> Self {
        Self { status, headers, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// 仅 HTTP 200 视为成功
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// `Content-Type` 是否为 JSON
    pub fn is_json(&self) -> bool {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false)
    }

    /// 解析 JSON 响应体
    ///
    /// 空响应体解析为 `Value::Null`，非法 JSON 返回 `Response/103`。
    pub fn json(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body).map_err(|_| {
            SdkError::with_message(ErrorModule::Response, 103, format!("Received: {}", self.body))
        })
    }

    /// 解析 JSON 且要求结果非空，否则返回 `Response/102`
    pub fn json_non_empty(&self) -> Result<Value> {
        let value = self.json()?;
        if is_empty_json(&value) {
            return Err(SdkError::new(ErrorModule::Response, 102));
        }
        Ok(value)
    }
}

/// 判断 JSON 值是否为空（null、空对象、空数组、空字符串）
pub fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// 读取错误码，兼容数字与字符串两种形式
pub fn error_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 读取字符串字段，数字也按字符串返回
pub fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 读取整数字段，兼容字符串形式的数字
pub fn int_field(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(error_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, HeaderMap::new(), body.to_string())
    }

    #[test]
    fn test_success_only_on_200() {
        assert!(response(200, "").is_success());
        assert!(!response(201, "").is_success());
        assert!(!response(401, "").is_success());
    }

    #[test]
    fn test_json_parsing() {
        assert_eq!(response(200, "").json().unwrap(), Value::Null);
        assert_eq!(response(200, r#"{"a":1}"#).json().unwrap(), json!({"a": 1}));

        let err = response(200, "<html>").json().unwrap_err();
        assert!(err.is(ErrorModule::Response, 103));
        assert!(err.message().contains("Received: <html>"));
    }

    #[test]
    fn test_json_non_empty() {
        let err = response(200, "{}").json_non_empty().unwrap_err();
        assert!(err.is(ErrorModule::Response, 102));
    }

    #[test]
    fn test_field_helpers() {
        let value = json!({"errorCode": "547", "id": 9, "name": "x"});
        assert_eq!(int_field(&value, "errorCode"), Some(547));
        assert_eq!(str_field(&value, "id").as_deref(), Some("9"));
        assert_eq!(str_field(&value, "missing"), None);
    }
}
