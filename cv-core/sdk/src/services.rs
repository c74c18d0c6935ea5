//! REST 端点表
//!
//! 每个端点模板都以 `{0}` 表示 Web 服务基础地址，`%s` 为按顺序填充的位置参数。

use crate::error::{ErrorModule, Result, SdkError};

/// 端点定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Login,
    Logout,
    RenewLoginToken,
    WhoAmI,
    Commserv,
    GetAllClients,
    ClientGroups,
    Job,
    Browse,
    Restore,
    CreateTask,
    ExecuteQcommand,
    ExecuteQscript,
    Qcommand,
    GetGlobalParam,
    SetGlobalParam,
    GetSamlToken,
    GlobalFilter,
    GetEvents,
    GetEvent,
    Regions,
    Region,
    EditRegion,
    GetRegion,
    CalculateRegion,
    BackupNetworkPairs,
    BackupNetworkPair,
    SnapOperations,
    StorageArrays,
    GetContentAnalyzerCloud,
    AdDashboard,
    AdApps,
    GetRemoteCacheClients,
    SoftwareCache,
    QualifiedServersSw,
    GetAllSubclients,
    Subclient,
    SubclientBackup,
}

impl Service {
    /// 全部端点
    pub const ALL: &'static [Service] = &[
        Service::Login,
        Service::Logout,
        Service::RenewLoginToken,
        Service::WhoAmI,
        Service::Commserv,
        Service::GetAllClients,
        Service::ClientGroups,
        Service::Job,
        Service::Browse,
        Service::Restore,
        Service::CreateTask,
        Service::ExecuteQcommand,
        Service::ExecuteQscript,
        Service::Qcommand,
        Service::GetGlobalParam,
        Service::SetGlobalParam,
        Service::GetSamlToken,
        Service::GlobalFilter,
        Service::GetEvents,
        Service::GetEvent,
        Service::Regions,
        Service::Region,
        Service::EditRegion,
        Service::GetRegion,
        Service::CalculateRegion,
        Service::BackupNetworkPairs,
        Service::BackupNetworkPair,
        Service::SnapOperations,
        Service::StorageArrays,
        Service::GetContentAnalyzerCloud,
        Service::AdDashboard,
        Service::AdApps,
        Service::GetRemoteCacheClients,
        Service::SoftwareCache,
        Service::QualifiedServersSw,
        Service::GetAllSubclients,
        Service::Subclient,
        Service::SubclientBackup,
    ];

    /// 端点键名
    pub fn key(&self) -> &'static str {
        match self {
            Service::Login => "LOGIN",
            Service::Logout => "LOGOUT",
            Service::RenewLoginToken => "RENEW_LOGIN_TOKEN",
            Service::WhoAmI => "WHOAMI",
            Service::Commserv => "COMMSERV",
            Service::GetAllClients => "GET_ALL_CLIENTS",
            Service::ClientGroups => "CLIENTGROUPS",
            Service::Job => "JOB",
            Service::Browse => "BROWSE",
            Service::Restore => "RESTORE",
            Service::CreateTask => "CREATE_TASK",
            Service::ExecuteQcommand => "EXECUTE_QCOMMAND",
            Service::ExecuteQscript => "EXECUTE_QSCRIPT",
            Service::Qcommand => "QCOMMAND",
            Service::GetGlobalParam => "GET_GLOBAL_PARAM",
            Service::SetGlobalParam => "SET_GLOBAL_PARAM",
            Service::GetSamlToken => "GET_SAML_TOKEN",
            Service::GlobalFilter => "GLOBAL_FILTER",
            Service::GetEvents => "GET_EVENTS",
            Service::GetEvent => "GET_EVENT",
            Service::Regions => "REGIONS",
            Service::Region => "REGION",
            Service::EditRegion => "EDIT_REGION",
            Service::GetRegion => "GET_REGION",
            Service::CalculateRegion => "CALCULATE_REGION",
            Service::BackupNetworkPairs => "BACKUP_NETWORK_PAIRS",
            Service::BackupNetworkPair => "BACKUP_NETWORK_PAIR",
            Service::SnapOperations => "SNAP_OPERATIONS",
            Service::StorageArrays => "STORAGE_ARRAYS",
            Service::GetContentAnalyzerCloud => "GET_CONTENT_ANALYZER_CLOUD",
            Service::AdDashboard => "ADDASHBOARD",
            Service::AdApps => "ADAPPS",
            Service::GetRemoteCacheClients => "GET_REMOTE_CACHE_CLIENTS",
            Service::SoftwareCache => "SOFTWARE_CACHE",
            Service::QualifiedServersSw => "QUALIFIED_SERVERS_SW",
            Service::GetAllSubclients => "GET_ALL_SUBCLIENTS",
            Service::Subclient => "SUBCLIENT",
            Service::SubclientBackup => "SUBCLIENT_BACKUP",
        }
    }

    /// 端点模板
    pub fn template(&self) -> &'static str {
        match self {
            Service::Login => "{0}Login",
            Service::Logout => "{0}Logout",
            Service::RenewLoginToken => "{0}RenewLoginToken",
            Service::WhoAmI => "{0}WhoAmI",
            Service::Commserv => "{0}CommServ",
            Service::GetAllClients => "{0}Client",
            Service::ClientGroups => "{0}ClientGroup",
            Service::Job => "{0}Job/%s",
            Service::Browse => "{0}DoBrowse",
            Service::Restore => "{0}CreateTask",
            Service::CreateTask => "{0}CreateTask",
            Service::ExecuteQcommand => "{0}ExecuteQCommand",
            Service::ExecuteQscript => "{0}ExecuteQCommand?command=qscript%20%s",
            Service::Qcommand => "{0}QCommand",
            Service::GetGlobalParam => "{0}CommServ/GlobalParams",
            Service::SetGlobalParam => "{0}setGlobalParam",
            Service::GetSamlToken => "{0}Commcell/SAMLToken?validityInMins=%s",
            Service::GlobalFilter => "{0}GlobalFilter",
            Service::GetEvents => "{0}Events",
            Service::GetEvent => "{0}Events/%s",
            Service::Regions => "{0}Regions",
            Service::Region => "{0}Regions/%s",
            Service::EditRegion => "{0}V4/%s/%s/Region",
            Service::GetRegion => "{0}V4/%s/%s/Region?entityRegionType=%s",
            Service::CalculateRegion => "{0}V4/%s/%s/Region/Calculate?entityRegionType=%s",
            Service::BackupNetworkPairs => "{0}CommServ/DataInterfacePairs?ClientId=%s",
            Service::BackupNetworkPair => "{0}CommServ/DataInterfacePairs",
            Service::SnapOperations => "{0}Snap/Operations",
            Service::StorageArrays => "{0}StorageArrays",
            Service::GetContentAnalyzerCloud => "{0}getContentAnalyzerCloud",
            Service::AdDashboard => "{0}AD/Dashboard",
            Service::AdApps => "{0}AD/Apps",
            Service::GetRemoteCacheClients => "{0}SoftwareCache/RemoteCacheClients",
            Service::SoftwareCache => "{0}V4/SoftwareCache",
            Service::QualifiedServersSw => "{0}V4/SoftwareCache/QualifiedServers",
            Service::GetAllSubclients => "{0}Subclient?clientId=%s",
            Service::Subclient => "{0}Subclient/%s",
            Service::SubclientBackup => "{0}Subclient/%s/action/backup?backupLevel=%s",
        }
    }

    /// 模板中的位置参数个数
    pub fn param_count(&self) -> usize {
        self.template().matches("%s").count()
    }

    /// 按键名查找端点
    pub fn from_key(key: &str) -> Option<Service> {
        Self::ALL.iter().copied().find(|s| s.key() == key)
    }
}

/// 绑定了 Web 服务地址的端点表
#[derive(Debug, Clone)]
pub struct Services {
    web_service: String,
}

impl Services {
    pub fn new(web_service: &str) -> Self {
        Self {
            web_service: web_service.to_string(),
        }
    }

    /// Web 服务基础地址
    pub fn web_service(&self) -> &str {
        &self.web_service
    }

    /// 无参数端点的完整 URL
    pub fn url(&self, service: Service) -> String {
        service.template().replace("{0}", &self.web_service)
    }

    /// 填充位置参数后的完整 URL
    ///
    /// 参数个数必须与模板一致，否则返回 `CVPySDK/102`。
    pub fn url_with(&self, service: Service, params: &[&str]) -> Result<String> {
        let expected = service.param_count();
        if params.len() != expected {
            return Err(SdkError::with_message(
                ErrorModule::CvSdk,
                102,
                format!(
                    "Service {} expects {} parameter(s), got {}",
                    service.key(),
                    expected,
                    params.len()
                ),
            ));
        }

        let mut url = String::with_capacity(self.web_service.len() + 64);
        let template = self.url(service);
        let mut pieces = template.split("%s");
        if let Some(first) = pieces.next() {
            url.push_str(first);
        }
        for (piece, param) in pieces.zip(params) {
            url.push_str(param);
            url.push_str(piece);
        }

        Ok(url)
    }
}
