//! Commcell 会话核心实现
//!
//! 负责 Web 服务探测、登录/续期/登出以及统一的 HTTP 请求入口。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, HOST, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::api::{
    AdDashboardApi, ArrayManagementApi, BackupNetworkPairsApi, ClientGroupsApi, ClientsApi,
    CommServeCacheApi, ContentAnalyzersApi, DevTestGroupApi, EventsApi, GlobalFiltersApi, JobsApi,
    RegionsApi, RemoteCacheApi, SubclientsApi, SystemApi,
};
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::CommservDetails;
use crate::response::HttpResponse;
use crate::services::{Service, Services};

/// 认证头名称
const AUTHTOKEN: HeaderName = HeaderName::from_static("authtoken");

/// 续期接口返回需要重新拉取 SAML 令牌时的有效期（分钟）
const SAML_RENEW_VALIDITY: u32 = 5;

/// Commcell 客户端配置
#[derive(Debug, Clone)]
pub struct CommcellConfig {
    /// 连接超时（秒）
    pub connect_timeout: u64,

    /// 请求超时（秒）
    pub request_timeout: u64,

    /// 401 时令牌续期的最大次数
    pub max_attempts: u32,

    /// 是否验证 SSL 证书
    pub verify_ssl: bool,

    /// 仅使用 HTTPS
    pub force_https: bool,

    /// CA 证书路径（PEM），设置后强制 HTTPS
    pub certificate_path: Option<PathBuf>,

    /// 自定义 User-Agent
    pub user_agent: Option<String>,

    /// 覆盖默认的 Web 服务地址
    pub web_service_url: Option<String>,
}

impl Default for CommcellConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            request_timeout: 120,
            max_attempts: 3,
            verify_ssl: true,
            force_https: false,
            certificate_path: None,
            user_agent: None,
            web_service_url: None,
        }
    }
}

/// 登录凭据
#[derive(Clone, Default)]
pub struct ConnectOptions {
    /// 用户名
    pub username: Option<String>,

    /// 明文密码（发送前自动 base64 编码）
    pub password: Option<String>,

    /// 已有的认证令牌
    pub authtoken: Option<String>,

    /// 主 Commcell 会话，设置后通过 SAML 令牌登录服务 Commcell
    pub master: Option<Arc<Commcell>>,
}

impl ConnectOptions {
    /// 使用用户名密码登录
    pub fn password(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    /// 使用已有令牌登录
    pub fn token(authtoken: &str) -> Self {
        Self {
            authtoken: Some(authtoken.to_string()),
            ..Default::default()
        }
    }

    /// 通过主 Commcell 登录服务 Commcell
    pub fn service_commcell(master: Arc<Commcell>) -> Self {
        Self {
            master: Some(master),
            ..Default::default()
        }
    }
}

/// 请求体
#[derive(Debug, Clone)]
pub enum Payload {
    /// JSON 请求体
    Json(Value),
    /// 原样发送的文本（通常为 XML）
    Text(String),
    /// `application/x-www-form-urlencoded` 表单
    Form(Vec<(String, String)>),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    token: Option<String>,
    username: Option<String>,
    saml: bool,
}

/// Commcell 会话
pub struct Commcell {
    /// 连接时使用的主机名
    hostname: String,

    /// 端点表
    services: Services,

    /// HTTP 客户端
    http_client: Client,

    /// 公共请求头（不含认证令牌）
    headers: HeaderMap,

    /// 认证状态
    session: Arc<RwLock<SessionState>>,

    /// 主 Commcell（服务 Commcell 场景）
    master: Option<Arc<Commcell>>,

    /// 登录使用的设备标识
    device_id: String,

    /// CommServ 详情缓存
    commserv: OnceCell<CommservDetails>,

    /// 配置
    config: CommcellConfig,
}

impl Commcell {
    /// 连接 Commcell 并完成认证
    ///
    /// # Arguments
    /// * `hostname` - Web 控制台主机名
    /// * `options` - 登录凭据
    /// * `config` - 客户端配置
    pub async fn connect(
        hostname: &str,
        options: ConnectOptions,
        mut config: CommcellConfig,
    ) -> Result<Self> {
        info!("连接 Commcell: {}", hostname);

        if config.certificate_path.is_some() {
            config.force_https = true;
        }

        let http_client = build_http_client(&config)?;
        let candidates = candidate_web_services(hostname, &config);

        let mut selected = None;
        for candidate in &candidates {
            match probe_web_service(&http_client, candidate).await {
                Ok(true) => {
                    selected = Some(candidate.clone());
                    break;
                }
                Ok(false) => debug!("Web 服务不可用: {}", candidate),
                Err(e) if config.force_https => return Err(e),
                Err(e) => debug!("Web 服务探测失败 {}: {}", candidate, e),
            }
        }

        let web_service = selected.ok_or_else(|| {
            SdkError::with_message(ErrorModule::Commcell, 101, format!("[{}]", hostname))
        })?;
        info!("使用 Web 服务: {}", web_service);

        let headers = base_headers(hostname, &config)?;
        let device_id = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "cv-sdk".to_string());

        let commcell = Self {
            hostname: hostname.to_string(),
            services: Services::new(&web_service),
            http_client,
            headers,
            session: Arc::new(RwLock::new(SessionState::default())),
            master: options.master.clone(),
            device_id,
            commserv: OnceCell::new(),
            config,
        };

        commcell.authenticate(options).await?;
        Ok(commcell)
    }

    async fn authenticate(&self, options: ConnectOptions) -> Result<()> {
        let mut validity_err = None;

        if let Some(master) = &options.master {
            info!("通过主 Commcell 获取 SAML 令牌");
            let saml = master.get_saml_token(30).await?;
            self.set_token(Some(saml), true).await;
            match self.who_am_i().await {
                Ok(user) => self.session.write().await.username = Some(user),
                Err(e) => {
                    self.set_token(None, false).await;
                    validity_err = Some(e);
                }
            }
        } else if let Some(authtoken) = options.authtoken.as_deref() {
            let token = normalize_authtoken(authtoken);
            let saml = token.starts_with("SAML ");
            self.set_token(Some(token), saml).await;

            match self.who_am_i().await {
                Ok(user) => self.session.write().await.username = Some(user),
                Err(e) => {
                    warn!("令牌校验失败: {}", e);
                    self.set_token(None, false).await;
                    validity_err = Some(e);
                }
            }
        }

        if self.token().await.is_none() {
            if let Some(username) = options.username.as_deref() {
                let password = options
                    .password
                    .as_deref()
                    .ok_or_else(|| SdkError::new(ErrorModule::CvSdk, 109))?;
                self.login(username, password).await?;
            }
        }

        if self.token().await.is_none() {
            return Err(validity_err.unwrap_or_else(|| SdkError::new(ErrorModule::Commcell, 102)));
        }

        Ok(())
    }

    /// 用户名密码登录，返回服务端下发的令牌
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        info!("Commcell 登录: {}", username);

        if username.is_empty() || password.is_empty() {
            return Err(SdkError::new(ErrorModule::CvSdk, 109));
        }

        let body = json!({
            "mode": 4,
            "username": username,
            "password": BASE64.encode(password.as_bytes()),
            "deviceId": self.device_id,
        });

        let url = self.services.url(Service::Login);
        let response = self
            .send_once(Method::POST, &url, Some(&Payload::Json(body)), None, None)
            .await?;

        let token = parse_login_response(&response)?;
        {
            let mut session = self.session.write().await;
            session.token = Some(token.clone());
            session.username = Some(username.to_string());
            session.saml = false;
        }

        info!("Commcell 登录成功");
        Ok(token)
    }

    /// 续期登录令牌
    pub async fn renew_login_token(&self) -> Result<String> {
        let state = self.session.read().await.clone();

        if state.saml {
            let master = self
                .master
                .as_ref()
                .ok_or_else(|| SdkError::new(ErrorModule::CvSdk, 106))?;
            info!("通过主 Commcell 续期 SAML 令牌");
            let token = master.fetch_saml_token(SAML_RENEW_VALIDITY).await?;
            self.set_token(Some(token.clone()), true).await;
            return Ok(token);
        }

        info!("续期登录令牌");
        let body = json!({
            "sessionId": state.token,
            "username": state.username,
        });
        let url = self.services.url(Service::RenewLoginToken);
        let response = self
            .send_once(Method::POST, &url, Some(&Payload::Json(body)), None, None)
            .await?;

        let token = if response.is_success() {
            response
                .json()
                .ok()
                .and_then(|v| v.get("token").and_then(Value::as_str).map(str::to_string))
        } else {
            None
        };

        match token {
            Some(token) => {
                self.session.write().await.token = Some(token.clone());
                Ok(token)
            }
            None => Err(SdkError::with_message(
                ErrorModule::CvSdk,
                108,
                update_response(response.text()),
            )),
        }
    }

    /// 登出并清除令牌
    pub async fn logout(&self) -> Result<String> {
        info!("Commcell 登出");

        if self.token().await.is_none() {
            return Ok("User already logged out.".to_string());
        }

        let url = self.services.url(Service::Logout);
        let response = self.make_request(Method::POST, &url, None, None).await?;
        self.set_token(None, false).await;

        if response.is_success() {
            Ok(response.text().to_string())
        } else {
            Ok("User already logged out".to_string())
        }
    }

    /// 当前登录用户
    pub async fn who_am_i(&self) -> Result<String> {
        let url = self.services.url(Service::WhoAmI);
        let response = self.make_request(Method::GET, &url, None, None).await?;

        if !response.is_success() {
            return Err(SdkError::with_message(
                ErrorModule::Response,
                101,
                update_response(response.text()),
            ));
        }

        let value = response.json_non_empty()?;
        value
            .get("userName")
            .or_else(|| value.pointer("/user/userName"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))
    }

    /// 发送请求，401 时续期令牌并重试
    ///
    /// 仅支持 GET/POST/PUT/DELETE，其余方法返回 `CVPySDK/103`。
    pub async fn make_request(
        &self,
        method: Method,
        url: &str,
        payload: Option<Payload>,
        headers: Option<HeaderMap>,
    ) -> Result<HttpResponse> {
        if !matches!(method, Method::GET | Method::POST | Method::PUT | Method::DELETE) {
            return Err(SdkError::new(ErrorModule::CvSdk, 103));
        }

        let mut attempts = 0;
        loop {
            let response = self
                .send_once(method.clone(), url, payload.as_ref(), headers.as_ref(), None)
                .await?;

            if response.status() == 401 && self.token().await.is_some() {
                if attempts >= self.config.max_attempts {
                    warn!("令牌续期次数已达上限: {}", url);
                    return Err(SdkError::new(ErrorModule::CvSdk, 107));
                }
                attempts += 1;
                warn!("请求返回 401，续期令牌后重试 ({}/{})", attempts, self.config.max_attempts);
                self.renew_login_token().await?;
                continue;
            }

            if !response.is_success() {
                warn!("API 请求失败: {} {} - {}", method, url, response.status());
            }
            return Ok(response);
        }
    }

    /// 相对地址的原始请求
    pub async fn request(
        &self,
        method: Method,
        relative_url: &str,
        payload: Option<Payload>,
    ) -> Result<HttpResponse> {
        let url = format!("{}{}", self.services.web_service(), relative_url.trim_start_matches('/'));
        self.make_request(method, &url, payload, None).await
    }

    /// 单次发送请求，不处理 401
    pub(crate) async fn send_once(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Payload>,
        extra_headers: Option<&HeaderMap>,
        token_override: Option<&str>,
    ) -> Result<HttpResponse> {
        debug!("Commcell API 请求: {} {}", method, url);

        let mut headers = self.headers.clone();
        let token = match token_override {
            Some(token) => Some(token.to_string()),
            None => self.token().await,
        };
        if let Some(token) = token {
            headers.insert(AUTHTOKEN, header_value(&token)?);
        }

        let mut request = self.http_client.request(method, url);
        match payload {
            Some(Payload::Json(body)) => {
                request = request.body(body.to_string());
            }
            Some(Payload::Text(body)) => {
                request = request.body(body.clone());
            }
            Some(Payload::Form(fields)) => {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                request = request.body(encode_form(fields));
            }
            None => {}
        }

        if let Some(extra) = extra_headers {
            for (name, value) in extra {
                headers.insert(name.clone(), value.clone());
            }
        }

        let response = request.headers(headers).send().await?;
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let body = response.text().await?;

        Ok(HttpResponse::new(status, response_headers, body))
    }

    /// 单次获取 SAML 令牌，供续期使用
    pub(crate) async fn fetch_saml_token(&self, validity: u32) -> Result<String> {
        let url = self
            .services
            .url_with(Service::GetSamlToken, &[&validity.to_string()])?;
        let response = self.send_once(Method::GET, &url, None, None, None).await?;
        if !response.is_success() {
            return Err(SdkError::with_message(
                ErrorModule::Response,
                101,
                update_response(response.text()),
            ));
        }
        let value = response.json_non_empty()?;
        saml_token_from(&value).map_err(|(code, msg)| saml_error(&code, &msg))
    }

    /// 获取当前令牌
    pub async fn token(&self) -> Option<String> {
        self.session.read().await.token.clone()
    }

    /// 当前登录用户名
    pub async fn username(&self) -> Option<String> {
        self.session.read().await.username.clone()
    }

    pub(crate) async fn set_token(&self, token: Option<String>, saml: bool) {
        let mut session = self.session.write().await;
        session.token = token;
        session.saml = saml;
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// 端点表
    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &CommcellConfig {
        &self.config
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// 是否为通过主 Commcell 登录的服务 Commcell
    pub fn is_service_commcell(&self) -> bool {
        self.master.is_some()
    }

    /// CommServ 详情（首次调用时查询并缓存）
    pub async fn commserv_details(&self) -> Result<&CommservDetails> {
        self.commserv
            .get_or_try_init(|| self.fetch_commserv_details())
            .await
    }

    /// 获取客户端管理 API
    pub fn clients(&self) -> ClientsApi<'_> {
        ClientsApi::new(self)
    }

    /// 获取客户端组管理 API
    pub fn client_groups(&self) -> ClientGroupsApi<'_> {
        ClientGroupsApi::new(self)
    }

    /// 获取系统设置 API
    pub fn system(&self) -> SystemApi<'_> {
        SystemApi::new(self)
    }

    /// 获取全局过滤器 API
    pub fn global_filters(&self) -> GlobalFiltersApi<'_> {
        GlobalFiltersApi::new(self)
    }

    /// 获取事件查询 API
    pub fn events(&self) -> EventsApi<'_> {
        EventsApi::new(self)
    }

    /// 获取区域管理 API
    pub fn regions(&self) -> RegionsApi<'_> {
        RegionsApi::new(self)
    }

    /// 获取备份网络对 API
    pub fn backup_network_pairs(&self) -> BackupNetworkPairsApi<'_> {
        BackupNetworkPairsApi::new(self)
    }

    /// 获取阵列与快照管理 API
    pub fn array_management(&self) -> ArrayManagementApi<'_> {
        ArrayManagementApi::new(self)
    }

    /// 获取内容分析器 API
    pub fn content_analyzers(&self) -> ContentAnalyzersApi<'_> {
        ContentAnalyzersApi::new(self)
    }

    /// 获取 AD 仪表盘 API
    pub fn ad_dashboard(&self) -> AdDashboardApi<'_> {
        AdDashboardApi::new(self)
    }

    /// 获取 CommServ 软件缓存 API
    pub fn commserv_cache(&self) -> CommServeCacheApi<'_> {
        CommServeCacheApi::new(self)
    }

    /// 获取指定客户端的远程缓存 API
    pub fn remote_cache(&self, client_name: &str) -> RemoteCacheApi<'_> {
        RemoteCacheApi::new(self, client_name)
    }

    /// 获取开发测试组 API
    pub fn dev_test_group(&self) -> DevTestGroupApi<'_> {
        DevTestGroupApi::new(self)
    }

    /// 获取指定客户端的子客户端 API
    pub fn subclients(&self, client_id: i64) -> SubclientsApi<'_> {
        SubclientsApi::new(self, client_id)
    }

    /// 获取作业 API
    pub fn jobs(&self) -> JobsApi<'_> {
        JobsApi::new(self)
    }
}

/// 从 HTML 错误页中提取 `<title>` 内容，其余情况原样返回
pub fn update_response(text: &str) -> String {
    if let Some(start) = text.find("<title>") {
        let rest = &text[start + "<title>".len()..];
        if let Some(end) = rest.find("</title>") {
            return rest[..end].to_string();
        }
    }
    text.to_string()
}

/// 令牌统一加上 `QSDK ` 前缀（已带 QSDK/SAML/Bearer 前缀的保持不变）
pub fn normalize_authtoken(authtoken: &str) -> String {
    if ["QSDK ", "SAML ", "Bearer "]
        .iter()
        .any(|prefix| authtoken.starts_with(prefix))
    {
        authtoken.to_string()
    } else {
        format!("QSDK {}", authtoken)
    }
}

/// 账户锁定提示
pub fn account_locked_message(remaining_seconds: i64) -> String {
    let hours = remaining_seconds / 3600;
    let minutes = (remaining_seconds % 3600) / 60;
    format!("User account is locked for {} hour(s) {} minute(s).", hours, minutes)
}

fn parse_login_response(response: &HttpResponse) -> Result<String> {
    if !response.is_success() {
        let access_denied = response
            .json()
            .ok()
            .and_then(|v| v.get("errorMessage").and_then(Value::as_str).map(str::to_string))
            .map(|msg| msg.contains("Access denied"))
            .unwrap_or(false);

        if access_denied {
            return Err(SdkError::with_message(
                ErrorModule::Response,
                101,
                "Access denied. There might be a problem with the SSL certificate of the web \
                 service, or the web service is not reachable over HTTPS",
            ));
        }
        return Err(SdkError::with_message(
            ErrorModule::Response,
            101,
            update_response(response.text()),
        ));
    }

    let value = response.json()?;
    if crate::response::is_empty_json(&value) {
        return Err(SdkError::new(ErrorModule::Response, 102));
    }

    if value.get("userName").is_some() {
        if let Some(token) = value.get("token").and_then(Value::as_str) {
            return Ok(token.to_string());
        }
    }

    let mut message = value
        .pointer("/errList/0/errLogMessage")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if value.get("isAccountLocked").and_then(Value::as_bool).unwrap_or(false) {
        let remaining = value
            .get("remainingLockTime")
            .and_then(crate::response::error_code)
            .unwrap_or(0);
        message = account_locked_message(remaining);
    }

    Err(SdkError::with_message(ErrorModule::CvSdk, 101, message))
}

/// 解析 SAML 令牌响应，失败时返回 (错误码, 错误消息)
pub(crate) fn saml_token_from(value: &Value) -> std::result::Result<String, (String, String)> {
    if let Some(token) = value.get("token").and_then(Value::as_str) {
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
    let code = value
        .pointer("/errList/0/errorCode")
        .map(|v| v.to_string())
        .unwrap_or_default();
    let message = value
        .pointer("/errList/0/errLogMessage")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err((code, message))
}

pub(crate) fn saml_error(code: &str, message: &str) -> SdkError {
    SdkError::with_message(
        ErrorModule::Commcell,
        106,
        format!("Error Code: {}\nError Message: {}", code, message),
    )
}

fn build_http_client(config: &CommcellConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .danger_accept_invalid_certs(!config.verify_ssl);

    if let Some(path) = &config.certificate_path {
        let pem = std::fs::read(path).map_err(|e| {
            SdkError::with_message(
                ErrorModule::CvSdk,
                104,
                format!("无法读取证书 {:?}: {}", path, e),
            )
        })?;
        let cert = reqwest::Certificate::from_pem(&pem)?;
        builder = builder.add_root_certificate(cert);
    }

    Ok(builder.build()?)
}

/// 待探测的 Web 服务地址，按优先级排列
pub fn candidate_web_services(hostname: &str, config: &CommcellConfig) -> Vec<String> {
    let force_https = config.force_https || config.certificate_path.is_some();

    match config.web_service_url.as_deref() {
        None => {
            let mut candidates = vec![format!("https://{}/commandcenter/api/", hostname)];
            if !force_https {
                candidates.push(format!("http://{}/commandcenter/api/", hostname));
            }
            candidates
        }
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
            vec![format!("{}/", url.trim_end_matches('/'))]
        }
        Some(url) => {
            let url = url.trim_end_matches('/');
            let mut candidates = vec![format!("https://{}/", url)];
            if !force_https {
                candidates.push(format!("http://{}/", url));
            }
            candidates
        }
    }
}

async fn probe_web_service(client: &Client, web_service: &str) -> Result<bool> {
    let response = client.get(web_service).send().await?;
    Ok(response.status().as_u16() == 200)
}

fn base_headers(hostname: &str, config: &CommcellConfig) -> Result<HeaderMap> {
    let host = match config.web_service_url.as_deref() {
        Some(url) => {
            let with_scheme = if url.contains("://") {
                url.to_string()
            } else {
                format!("https://{}", url)
            };
            url::Url::parse(&with_scheme)
                .ok()
                .and_then(|u| {
                    u.host_str().map(|h| match u.port() {
                        Some(port) => format!("{}:{}", h, port),
                        None => h.to_string(),
                    })
                })
                .unwrap_or_else(|| hostname.to_string())
        }
        None => hostname.to_string(),
    };

    let mut headers = HeaderMap::new();
    headers.insert(HOST, header_value(&host)?);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(agent) = &config.user_agent {
        headers.insert(USER_AGENT, header_value(agent)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        SdkError::with_message(ErrorModule::CvSdk, 102, format!("非法的请求头: {}", e))
    })
}

/// 构造单个自定义请求头，`name` 须为小写
pub fn header(name: &'static str, value: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(name), header_value(value)?);
    Ok(headers)
}

fn encode_form(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_response_extracts_title() {
        let html = "<html><head><title>404 Not Found</title></head></html>";
        assert_eq!(update_response(html), "404 Not Found");
        assert_eq!(update_response("plain"), "plain");
    }

    #[test]
    fn test_normalize_authtoken() {
        assert_eq!(normalize_authtoken("abc"), "QSDK abc");
        assert_eq!(normalize_authtoken("QSDK abc"), "QSDK abc");
        assert_eq!(normalize_authtoken("SAML abc"), "SAML abc");
        assert_eq!(normalize_authtoken("Bearer abc"), "Bearer abc");
    }

    #[test]
    fn test_account_locked_message() {
        assert_eq!(
            account_locked_message(7260),
            "User account is locked for 2 hour(s) 1 minute(s)."
        );
    }

    #[test]
    fn test_candidates_default() {
        let config = CommcellConfig::default();
        assert_eq!(
            candidate_web_services("cs", &config),
            vec![
                "https://cs/commandcenter/api/".to_string(),
                "http://cs/commandcenter/api/".to_string()
            ]
        );
    }

    #[test]
    fn test_candidates_force_https_and_certificate() {
        let mut config = CommcellConfig {
            force_https: true,
            ..Default::default()
        };
        assert_eq!(candidate_web_services("cs", &config).len(), 1);

        config.force_https = false;
        config.certificate_path = Some(PathBuf::from("/tmp/ca.pem"));
        assert_eq!(
            candidate_web_services("cs", &config),
            vec!["https://cs/commandcenter/api/".to_string()]
        );
    }

    #[test]
    fn test_candidates_web_service_url() {
        let config = CommcellConfig {
            web_service_url: Some("http://127.0.0.1:8080".to_string()),
            ..Default::default()
        };
        assert_eq!(
            candidate_web_services("cs", &config),
            vec!["http://127.0.0.1:8080/".to_string()]
        );

        let config = CommcellConfig {
            web_service_url: Some("proxy.local/api".to_string()),
            ..Default::default()
        };
        assert_eq!(
            candidate_web_services("cs", &config),
            vec![
                "https://proxy.local/api/".to_string(),
                "http://proxy.local/api/".to_string()
            ]
        );
    }

    #[test]
    fn test_form_encoding() {
        let fields = vec![
            ("command".to_string(), "qlist client".to_string()),
            ("inputRequestXML".to_string(), "<a b=\"1\"/>".to_string()),
        ];
        assert_eq!(
            encode_form(&fields),
            "command=qlist%20client&inputRequestXML=%3Ca%20b%3D%221%22%2F%3E"
        );
    }
}
