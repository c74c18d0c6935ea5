//! Commcell 级别的通用操作
//!
//! QCommand / qoperation 执行、GxGlobalParam 读写、CommServ 详情与 SAML 令牌。

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::client::{saml_error, saml_token_from, update_response, Commcell, Payload};
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::CommservDetails;
use crate::response::{int_field, str_field, HttpResponse};
use crate::services::Service;

/// 全局参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalParam {
    pub name: String,
    pub value: String,
}

impl GlobalParam {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn to_json(&self) -> Value {
        json!({"name": self.name, "value": self.value})
    }
}

impl Commcell {
    /// 执行 qoperation 请求（XML 文本或 JSON）
    ///
    /// 返回 JSON 响应；响应体不是 JSON 时返回 `{"output": 文本}`。
    pub async fn qoperation_execute(&self, request: impl Into<Payload>) -> Result<Value> {
        let response = self.post_qoperation(request.into(), None).await?;
        Ok(json_or_output(&response))
    }

    /// 执行 qoperation 请求并返回 XML 文本
    pub async fn qoperation_execute_xml(&self, request_xml: &str) -> Result<String> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));
        let response = self
            .post_qoperation(Payload::Text(request_xml.to_string()), Some(headers))
            .await?;
        Ok(response.text().to_string())
    }

    async fn post_qoperation(
        &self,
        payload: Payload,
        headers: Option<reqwest::header::HeaderMap>,
    ) -> Result<HttpResponse> {
        let url = self.services().url(Service::ExecuteQcommand);
        let response = self
            .make_request(Method::POST, &url, Some(payload), headers)
            .await?;
        ensure_success(&response)?;
        Ok(response)
    }

    /// 执行 qscript
    ///
    /// # Arguments
    /// * `arguments` - qscript 参数，例如 `-sn QS_Name -si arg`
    pub async fn qoperation_execscript(&self, arguments: &str) -> Result<Value> {
        info!("执行 qscript: {}", arguments);
        let encoded = urlencoding::encode(arguments);
        let url = self
            .services()
            .url_with(Service::ExecuteQscript, &[encoded.as_ref()])?;
        let response = self.make_request(Method::POST, &url, None, None).await?;
        ensure_success(&response)?;
        Ok(json_or_output(&response))
    }

    /// 以表单方式执行 QCommand
    pub async fn execute_qcommand(
        &self,
        command: &str,
        input_xml: Option<&str>,
    ) -> Result<HttpResponse> {
        info!("执行 QCommand: {}", command);
        let mut fields = vec![("command".to_string(), command.to_string())];
        if let Some(xml) = input_xml.filter(|x| !x.is_empty()) {
            fields.push(("inputRequestXML".to_string(), xml.to_string()));
        }

        let url = self.services().url(Service::Qcommand);
        let response = self
            .make_request(Method::POST, &url, Some(Payload::Form(fields)), None)
            .await?;
        ensure_success(&response)?;
        Ok(response)
    }

    /// 以 JSON 方式执行 QCommand（`QCommand/{command}`）
    pub async fn execute_qcommand_json(&self, command: &str, input: Value) -> Result<HttpResponse> {
        info!("执行 QCommand: {}", command);
        let url = format!("{}/{}", self.services().url(Service::Qcommand), command);
        let response = self
            .make_request(Method::POST, &url, Some(Payload::Json(input)), None)
            .await?;
        ensure_success(&response)?;
        Ok(response)
    }

    /// 批量读取 GxGlobalParam
    pub async fn get_gxglobalparam_values(&self, names: &[&str]) -> Result<Vec<GlobalParam>> {
        let url = self.services().url(Service::GetGlobalParam);
        let body = json!({"globalParamsRequestList": names});
        let response = self
            .make_request(Method::POST, &url, Some(Payload::Json(body)), None)
            .await?;
        ensure_success(&response)?;

        let value = response.json_non_empty()?;
        let results = value
            .get("globalParamsResultList")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(results
            .iter()
            .map(|item| GlobalParam {
                name: str_field(item, "name").unwrap_or_default(),
                value: str_field(item, "value").unwrap_or_default(),
            })
            .collect())
    }

    /// 读取单个 GxGlobalParam，不存在时返回 None
    pub async fn get_gxglobalparam_value(&self, name: &str) -> Result<Option<String>> {
        let params = self.get_gxglobalparam_values(&[name]).await?;
        Ok(params
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value))
    }

    /// 设置单个 GxGlobalParam
    pub async fn set_gxglobalparam_value(&self, param: &GlobalParam) -> Result<Value> {
        info!("设置全局参数: {}", param.name);
        let url = self.services().url(Service::SetGlobalParam);
        let response = self
            .make_request(Method::POST, &url, Some(Payload::Json(param.to_json())), None)
            .await?;
        ensure_success(&response)?;
        response.json_non_empty()
    }

    /// 批量设置 GxGlobalParam（通过 qoperation）
    pub async fn set_gxglobalparam_values(&self, params: &[GlobalParam]) -> Result<Value> {
        if params.is_empty() {
            return Err(SdkError::with_message(
                ErrorModule::Commcell,
                107,
                "Received an empty list of global params",
            ));
        }
        let global_params: Vec<Value> = params.iter().map(GlobalParam::to_json).collect();
        self.qoperation_execute(json!({
            "App_SetGlobalParamsReq": {
                "globalParams": global_params
            }
        }))
        .await
    }

    /// 获取当前用户的 SAML 令牌
    ///
    /// 服务端提示需要重新登录时续期一次令牌后重试。
    pub async fn get_saml_token(&self, validity: u32) -> Result<String> {
        let url = self
            .services()
            .url_with(Service::GetSamlToken, &[&validity.to_string()])?;

        let mut renewed = false;
        loop {
            let response = self.make_request(Method::GET, &url, None, None).await?;
            ensure_success(&response)?;
            let value = response.json_non_empty()?;

            match saml_token_from(&value) {
                Ok(token) => return Ok(token),
                Err((_, message)) if !renewed && message.to_lowercase().contains("relogin required") => {
                    self.renew_login_token().await?;
                    renewed = true;
                }
                Err((code, message)) => return Err(saml_error(&code, &message)),
            }
        }
    }

    pub(crate) async fn fetch_commserv_details(&self) -> Result<CommservDetails> {
        info!("查询 CommServ 详情");
        let url = self.services().url(Service::Commserv);
        let response = self.make_request(Method::GET, &url, None, None).await?;
        ensure_success(&response)?;
        let value = response.json_non_empty()?;
        parse_commserv_details(&value)
    }
}

/// 非 200 响应统一转换为 `Response/101`
pub(crate) fn ensure_success(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(SdkError::with_message(
            ErrorModule::Response,
            101,
            update_response(response.text()),
        ))
    }
}

fn json_or_output(response: &HttpResponse) -> Value {
    match serde_json::from_str::<Value>(response.text()) {
        Ok(value) => value,
        _ => json!({"output": response.text()}),
    }
}

/// 解析 CommServ 详情
pub fn parse_commserv_details(value: &Value) -> Result<CommservDetails> {
    let missing = |key: &str| {
        SdkError::with_message(ErrorModule::Commcell, 103, format!("Missing key: {}", key))
    };

    let commcell = value.get("commcell").ok_or_else(|| missing("commcell"))?;
    let name = str_field(commcell, "commCellName").ok_or_else(|| missing("commCellName"))?;
    let id = int_field(commcell, "commCellId").ok_or_else(|| missing("commCellId"))?;
    let hostname = str_field(value, "hostName").ok_or_else(|| missing("hostName"))?;
    let timezone_name = value
        .pointer("/csTimeZone/TimeZoneName")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("csTimeZone"))?
        .to_string();
    let sp_version = int_field(value, "currentSPVersion").ok_or_else(|| missing("currentSPVersion"))?;

    let version_info = str_field(value, "csVersionInfo").unwrap_or_default();
    let timezone = str_field(value, "timeZone")
        .map(|tz| normalize_timezone(&tz))
        .unwrap_or_default();

    Ok(CommservDetails {
        name,
        hostname,
        guid: str_field(commcell, "csGUID"),
        id,
        timezone,
        timezone_name,
        sp_version,
        version: normalize_version(&version_info),
        release_name: str_field(value, "releaseName"),
    })
}

/// 将 `11 SP21` 一类的版本信息规范为 `11.21.0`
pub fn normalize_version(version_info: &str) -> String {
    let replacements = [
        (".0 SP", "."),
        (" SP", "."),
        (" HPK", "."),
        ("+", ""),
        ("-", ""),
        ("a", ".1"),
        ("b", ".2"),
    ];

    let mut version = version_info.to_string();
    for (from, to) in replacements {
        version = version.replace(from, to);
    }

    let parts = version.split('.').count();
    if parts < 3 {
        version.push_str(&".0".repeat(3 - parts));
    }
    version
}

/// 截取 `(UTC+08:00) ...` 形式的时区描述，缺少括号时去掉前缀偏移量
pub fn normalize_timezone(timezone: &str) -> String {
    if let Some(start) = timezone.find('(') {
        return timezone[start..].to_string();
    }

    let mut rest = timezone;
    loop {
        let trimmed = rest.trim_start_matches(|c| c == '+' || c == '-' || c == '|');
        let digits = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
        match digits.strip_prefix(':') {
            Some(next) => rest = next,
            None => break,
        }
    }
    rest.to_string()
}
