//! 统一的请求-校验流程
//!
//! 大多数 API 都是「按端点发请求 → 检查状态 → 解析 JSON → 检查错误码」，
//! 这里将该流程封装为 [`Commcell::wrap_request`]。

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

use crate::client::{Commcell, Payload};
use crate::error::{ErrorModule, Result, SdkError};
use crate::response::{error_code, is_empty_json, HttpResponse};
use crate::services::Service;

/// 从响应中读取 (错误码, 错误消息)
pub type ErrorReader = Box<dyn Fn(&Value) -> (i64, String) + Send + Sync>;

/// 错误码非 0 时的处理
pub type ErrorCallback = Box<dyn Fn(i64, &str) -> Result<()> + Send + Sync>;

/// [`Commcell::wrap_request`] 的选项
pub struct WrapOptions {
    payload: Option<Payload>,
    headers: Option<HeaderMap>,
    ignore_flag: bool,
    empty_check: bool,
    error_check: Option<bool>,
    sdk_exception: (ErrorModule, u16),
    error_read: Option<ErrorReader>,
    error_callback: Option<ErrorCallback>,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            payload: None,
            headers: None,
            ignore_flag: false,
            empty_check: true,
            error_check: None,
            sdk_exception: (ErrorModule::Response, 101),
            error_read: None,
            error_callback: None,
        }
    }
}

impl WrapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求体
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// 额外请求头
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// 忽略 HTTP 状态
    pub fn ignore_flag(mut self, ignore: bool) -> Self {
        self.ignore_flag = ignore;
        self
    }

    /// 空响应时报 `Response/102`，默认开启
    pub fn empty_check(mut self, check: bool) -> Self {
        self.empty_check = check;
        self
    }

    /// 检查响应中的错误码，默认 GET 以外的方法开启
    pub fn error_check(mut self, check: bool) -> Self {
        self.error_check = Some(check);
        self
    }

    /// 默认错误回调使用的错误
    pub fn sdk_exception(mut self, module: ErrorModule, id: u16) -> Self {
        self.sdk_exception = (module, id);
        self
    }

    pub fn error_read<F>(mut self, reader: F) -> Self
    where
        F: Fn(&Value) -> (i64, String) + Send + Sync + 'static,
    {
        self.error_read = Some(Box::new(reader));
        self
    }

    pub fn error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(i64, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.error_callback = Some(Box::new(callback));
        self
    }

    fn handle_errors(&self, value: &Value) -> Result<()> {
        let (code, message) = match &self.error_read {
            Some(reader) => reader(value),
            None => default_error_read(value),
        };
        if code == 0 {
            return Ok(());
        }
        match &self.error_callback {
            Some(callback) => callback(code, &message),
            None => {
                let (module, id) = self.sdk_exception;
                Err(SdkError::with_message(
                    module,
                    id,
                    format!("[{}: {}]", code, message),
                ))
            }
        }
    }
}

/// 默认错误读取：优先 `error` 子节点，兼容 errorCode/resultCode 与多种消息字段
pub fn default_error_read(value: &Value) -> (i64, String) {
    let node = match value.get("error") {
        Some(err) if err.is_object() => err,
        _ => value,
    };

    let code = node
        .get("errorCode")
        .or_else(|| node.get("resultCode"))
        .and_then(error_code)
        .unwrap_or(-1);

    let message = ["errorMessage", "errorString", "resultMessage"]
        .iter()
        .find_map(|key| node.get(*key).and_then(Value::as_str))
        .unwrap_or("No error message in response")
        .to_string();

    (code, message)
}

impl Commcell {
    /// 按端点发送请求并校验，返回 JSON
    ///
    /// # Arguments
    /// * `method` - HTTP 方法
    /// * `service` - 端点
    /// * `fill_params` - 端点模板的位置参数
    /// * `options` - 校验选项
    pub async fn wrap_request(
        &self,
        method: Method,
        service: Service,
        fill_params: &[&str],
        options: WrapOptions,
    ) -> Result<Value> {
        let (_, value) = self.wrap(method, service, fill_params, options, false).await?;
        Ok(value.unwrap_or(Value::Null))
    }

    /// 与 [`Commcell::wrap_request`] 相同，但返回原始响应
    ///
    /// 未开启错误码检查时不解析响应体。
    pub async fn wrap_request_raw(
        &self,
        method: Method,
        service: Service,
        fill_params: &[&str],
        options: WrapOptions,
    ) -> Result<HttpResponse> {
        let (response, _) = self.wrap(method, service, fill_params, options, true).await?;
        Ok(response)
    }

    /// 发送请求后在闭包中处理 JSON，闭包失败时附带响应内容返回 `Response/104`
    pub async fn wrapped_request<T, F>(
        &self,
        method: Method,
        service: Service,
        fill_params: &[&str],
        options: WrapOptions,
        handler: F,
    ) -> Result<T>
    where
        F: FnOnce(&Value) -> Result<T>,
    {
        let value = self.wrap_request(method, service, fill_params, options).await?;
        handler(&value).map_err(|e| {
            SdkError::with_message(
                ErrorModule::Response,
                104,
                format!("Got response: {}\n{}", value, e),
            )
        })
    }

    async fn wrap(
        &self,
        method: Method,
        service: Service,
        fill_params: &[&str],
        mut options: WrapOptions,
        return_raw: bool,
    ) -> Result<(HttpResponse, Option<Value>)> {
        let url = if fill_params.is_empty() {
            self.services().url(service)
        } else {
            self.services().url_with(service, fill_params)?
        };
        let error_check = options.error_check.unwrap_or(method != Method::GET);

        let response = self
            .make_request(method, &url, options.payload.take(), options.headers.take())
            .await?;

        if !response.is_success() && !options.ignore_flag {
            let parsed = response.json().ok().filter(|v| v.is_object());
            match parsed {
                Some(value) => options.handle_errors(&value).map_err(|_| {
                    SdkError::with_message(
                        ErrorModule::Response,
                        101,
                        response.text().to_string(),
                    )
                })?,
                None => {
                    return Err(SdkError::with_message(
                        ErrorModule::Response,
                        101,
                        response.text().to_string(),
                    ))
                }
            }
        }

        if return_raw && !error_check {
            return Ok((response, None));
        }

        let value: Value = serde_json::from_str(response.text()).map_err(|_| {
            SdkError::with_message(
                ErrorModule::Response,
                103,
                format!("Received: {}", response.text()),
            )
        })?;

        if options.empty_check && is_empty_json(&value) {
            return Err(SdkError::new(ErrorModule::Response, 102));
        }

        if error_check {
            options.handle_errors(&value)?;
        }

        Ok((response, Some(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_error_read_top_level() {
        let value = json!({"errorCode": 7, "errorMessage": "failed from server"});
        assert_eq!(default_error_read(&value), (7, "failed from server".to_string()));
    }

    #[test]
    fn test_default_error_read_error_node() {
        let value = json!({"error": {"resultCode": "12", "resultMessage": "nested"}});
        assert_eq!(default_error_read(&value), (12, "nested".to_string()));
    }

    #[test]
    fn test_default_error_read_missing() {
        let value = json!({"ok": true});
        assert_eq!(
            default_error_read(&value),
            (-1, "No error message in response".to_string())
        );
    }

    #[test]
    fn test_default_callback_message() {
        let options = WrapOptions::new().sdk_exception(ErrorModule::Region, 102);
        let err = options
            .handle_errors(&json!({"errorCode": 3, "errorString": "bad"}))
            .unwrap_err();
        assert!(err.is(ErrorModule::Region, 102));
        assert_eq!(err.message(), "[3: bad]");
    }

    #[test]
    fn test_zero_code_passes() {
        let options = WrapOptions::new();
        assert!(options.handle_errors(&json!({"errorCode": 0})).is_ok());
    }
}
