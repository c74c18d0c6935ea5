//! SDK 错误定义
//!
//! 所有失败统一为 [`SdkError`]，由 `(模块, 编号)` 唯一标识，错误消息取自静态错误表。

use std::fmt;

use thiserror::Error;

/// 错误所属模块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorModule {
    /// 会话与底层请求
    CvSdk,
    /// 响应检查
    Response,
    /// Commcell 级别操作
    Commcell,
    Client,
    ClientGroup,
    GlobalFilter,
    Event,
    Region,
    Regions,
    ContentAnalyzer,
    BackupNetworkPairs,
    StorageArray,
    Snap,
    Subclient,
    Job,
    RemoteCache,
    AdDashboard,
}

impl ErrorModule {
    /// 模块在错误表中的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorModule::CvSdk => "CVPySDK",
            ErrorModule::Response => "Response",
            ErrorModule::Commcell => "Commcell",
            ErrorModule::Client => "Client",
            ErrorModule::ClientGroup => "ClientGroup",
            ErrorModule::GlobalFilter => "GlobalFilter",
            ErrorModule::Event => "Event",
            ErrorModule::Region => "Region",
            ErrorModule::Regions => "Regions",
            ErrorModule::ContentAnalyzer => "ContentAnalyzer",
            ErrorModule::BackupNetworkPairs => "BackupNetworkPairs",
            ErrorModule::StorageArray => "StorageArray",
            ErrorModule::Snap => "Snap",
            ErrorModule::Subclient => "Subclient",
            ErrorModule::Job => "Job",
            ErrorModule::RemoteCache => "RemoteCache",
            ErrorModule::AdDashboard => "AdDashboard",
        }
    }
}

impl fmt::Display for ErrorModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SDK 错误
///
/// 消息组合规则：
/// - 无附加消息时使用错误表中的消息
/// - 错误表消息为空时直接使用附加消息
/// - 否则为 `"{表消息}\n{附加消息}"`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SdkError {
    module: ErrorModule,
    id: u16,
    message: String,
}

impl SdkError {
    /// 使用错误表中的消息创建错误
    pub fn new(module: ErrorModule, id: u16) -> Self {
        Self {
            module,
            id,
            message: Self::lookup(module, id).unwrap_or_default().to_string(),
        }
    }

    /// 创建带附加消息的错误
    pub fn with_message(module: ErrorModule, id: u16, extra: impl Into<String>) -> Self {
        let extra = extra.into();
        let base = Self::lookup(module, id).unwrap_or_default();

        let message = if extra.is_empty() {
            base.to_string()
        } else if base.is_empty() {
            extra
        } else {
            format!("{}\n{}", base, extra)
        };

        Self { module, id, message }
    }

    pub fn module(&self) -> ErrorModule {
        self.module
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 判断错误是否为指定的 `(模块, 编号)`
    pub fn is(&self, module: ErrorModule, id: u16) -> bool {
        self.module == module && self.id == id
    }

    /// 查询错误表
    pub fn lookup(module: ErrorModule, id: u16) -> Option<&'static str> {
        use ErrorModule::*;

        let message = match (module, id) {
            (CvSdk, 101) => "Failed to Login with the credentials provided",
            (CvSdk, 102) => "",
            (CvSdk, 103) => "Method not supported. Supported methods are GET, POST, PUT and DELETE",
            (CvSdk, 104) => "Failed to connect to the web service",
            (CvSdk, 106) => "Renewing a SAML session requires the master commcell session",
            (CvSdk, 107) => "Maximum number of login token renewal attempts reached",
            (CvSdk, 108) => "Failed to renew the login token",
            (CvSdk, 109) => "Username and password are required to login",

            (Response, 101) => "Response was not success",
            (Response, 102) => "Response received is empty",
            (Response, 103) => "Response received is not a valid JSON",
            (Response, 104) => "Failed to process the response",

            (Commcell, 101) => {
                "Commcell is not reachable. Please check the commcell name and services again"
            }
            (Commcell, 102) => "Failed to get the authentication token for the commcell",
            (Commcell, 103) => "Failed to get the CommServ details",
            (Commcell, 106) => "Failed to get the SAML token",
            (Commcell, 107) => "Invalid input for setting the global param",

            (Client, 101) => "Failed to get the list of clients",
            (Client, 102) => "",

            (ClientGroup, 101) => "Failed to get the list of client groups",
            (ClientGroup, 102) => "",

            (GlobalFilter, 101) => "Filters must be a non empty list of strings",
            (GlobalFilter, 102) => "",

            (Event, 101) => "Failed to get the event details",

            (Region, 101) => "Invalid region type",
            (Region, 102) => "",

            (Regions, 101) => "Region can not be set for the entity",
            (Regions, 102) => "",

            (ContentAnalyzer, 101) => "Failed to get the content analyzers",
            (ContentAnalyzer, 102) => "",
            (ContentAnalyzer, 103) => "Content analyzer list is missing in the response",

            (BackupNetworkPairs, 101) => "",

            (StorageArray, 101) => "Storage array operation failed. Array could not be authenticated",
            (StorageArray, 102) => "Failed to add the storage array",
            (StorageArray, 103) => "",

            (Snap, 101) => "Invalid snap operation",
            (Snap, 102) => "Failed to run the snap operation",

            (Subclient, 101) => "Failed to get the subclients",
            (Subclient, 102) => "",
            (Subclient, 103) => "Backup level must be one of full, incremental, transaction_log, differential or synthetic_full",

            (Job, 101) => "Failed to get the job details",
            (Job, 102) => "",

            (RemoteCache, 101) => "Failed to get the remote cache details",
            (RemoteCache, 102) => "",

            (AdDashboard, 101) => "Failed to get the AD dashboard details",

            _ => return None,
        };

        Some(message)
    }
}

/// SDK 结果类型
pub type Result<T> = std::result::Result<T, SdkError>;

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        SdkError::with_message(ErrorModule::CvSdk, 104, e.to_string())
    }
}
