//! Active Directory 仪表盘 API
//!
//! 仪表盘汇总（`agentSummary` 第 0 项为 AD，第 1 项为 Azure AD）与应用列表
//! 各取一次，之后的统计视图都在本地计算。

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::client::{update_response, Commcell};
use crate::error::{ErrorModule, Result, SdkError};
use crate::response::is_empty_json;
use crate::services::Service;

/// AD 应用类型
pub const APP_TYPE_AD: i64 = 41;

/// Azure AD 应用类型
pub const APP_TYPE_AZURE_AD: i64 = 139;

const EXCLUDED_SLA: &str = "EXCLUDED_SLA";
const MET_SLA: &str = "MET_SLA";
const MISSED_SLA: &str = "MISSED_SLA";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SlaSummary {
    total_entities: i64,
    sla_not_met_entities: i64,
    never_backedup_entities: i64,
    sla_met_percentage: f64,
    sla_not_met_processed_atleast_once_percentage: f64,
    never_backedup_percentage: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AgentSummary {
    is_configured: Option<bool>,
    sla_summary: SlaSummary,
    application_size: f64,
    number_of_items: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SolutionSummary {
    sla_summary: SlaSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DashboardSummary {
    agent_summary: Vec<AgentSummary>,
    solution_summary: SolutionSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AdClient {
    is_configured: bool,
    app_type_id: i64,
    sla_status: String,
    number_of_items: i64,
    application_size: f64,
}

impl AdClient {
    fn counted(&self) -> bool {
        self.sla_status != EXCLUDED_SLA
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AdApps {
    #[serde(rename = "adClients")]
    ad_clients: Vec<AdClient>,
}

/// 配置状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfiguredStatus {
    pub ad_configured: Option<bool>,
    pub aad_configured: Option<bool>,
    pub apps_ad_configured: bool,
    pub apps_aad_configured: bool,
}

/// 域与租户数量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainsAndTenants {
    pub total_entities: i64,
    pub domain_controllers: i64,
    pub tenants: i64,
    pub apps_total_entities: i64,
    pub apps_domain_controllers: i64,
    pub apps_tenants: i64,
}

/// 备份健康度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupHealth {
    pub recently_backed_up: i64,
    pub recently_backed_up_pct: f64,
    pub recently_not_backed_up: i64,
    pub recently_not_backed_up_pct: f64,
    pub never_backed_up: i64,
    pub never_backed_up_pct: f64,
    pub apps_recently_backed_up: i64,
    pub apps_recently_not_backed_up: i64,
    pub apps_never_backed_up: i64,
    pub apps_total_entities: i64,
    pub apps_recently_backed_up_pct: f64,
    pub apps_recently_not_backed_up_pct: f64,
    pub apps_never_backed_up_pct: f64,
}

/// 数据分布，大小单位 MB
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataDistribution {
    pub backup_size: f64,
    pub backup_objects: i64,
    pub apps_backup_size: f64,
    pub apps_backup_objects: i64,
}

/// 单个应用类型的面板数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppPanel {
    /// 域或租户数
    pub entities: i64,
    pub backup_size: f64,
    pub backup_objects: i64,
    pub sla_pct: f64,
    pub not_sla_pct: f64,
}

/// 应用面板
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationPanel {
    pub ad: AppPanel,
    pub aad: AppPanel,
    pub apps_ad: AppPanel,
    pub apps_aad: AppPanel,
    /// 满足 SLA 的 AD 应用数
    pub apps_ad_sla: i64,
    /// 满足 SLA 的 Azure AD 应用数
    pub apps_aad_sla: i64,
}

/// AD 仪表盘 API
pub struct AdDashboardApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> AdDashboardApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 获取仪表盘与应用数据
    pub async fn fetch(&self) -> Result<AdDashboard> {
        info!("查询 AD 仪表盘");
        let dashboard_url = format!(
            "{}?slaNumberOfDays=1",
            self.commcell.services().url(Service::AdDashboard)
        );
        let dashboard = self.get_json(&dashboard_url).await?;
        let apps = self
            .get_json(&self.commcell.services().url(Service::AdApps))
            .await?;
        AdDashboard::from_values(&dashboard, &apps)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .commcell
            .make_request(Method::GET, url, None, None)
            .await?;
        if !response.is_success() {
            return Err(SdkError::with_message(
                ErrorModule::Response,
                101,
                update_response(response.text()),
            ));
        }
        let value = response.json()?;
        if is_empty_json(&value) {
            return Err(SdkError::with_message(
                ErrorModule::Response,
                102,
                update_response(response.text()),
            ));
        }
        Ok(value)
    }
}

/// AD 仪表盘数据
#[derive(Debug, Clone)]
pub struct AdDashboard {
    summary: DashboardSummary,
    apps: AdApps,
}

impl AdDashboard {
    /// 由仪表盘与应用响应构建
    pub fn from_values(dashboard: &Value, apps: &Value) -> Result<Self> {
        let parse_error = |e: serde_json::Error| {
            SdkError::with_message(ErrorModule::AdDashboard, 101, e.to_string())
        };
        Ok(Self {
            summary: DashboardSummary::deserialize(dashboard).map_err(parse_error)?,
            apps: AdApps::deserialize(apps).map_err(parse_error)?,
        })
    }

    fn agent(&self, index: usize) -> AgentSummary {
        self.summary.agent_summary.get(index).cloned().unwrap_or_default()
    }

    fn clients_of(&self, app_type: i64) -> impl Iterator<Item = &AdClient> {
        self.apps
            .ad_clients
            .iter()
            .filter(move |c| c.app_type_id == app_type)
    }

    /// AD 与 Azure AD 是否完成配置
    pub fn is_configured(&self) -> ConfiguredStatus {
        let configured = |app_type| self.clients_of(app_type).any(|c| c.is_configured);
        ConfiguredStatus {
            ad_configured: self.agent(0).is_configured,
            aad_configured: self.agent(1).is_configured,
            apps_ad_configured: configured(APP_TYPE_AD),
            apps_aad_configured: configured(APP_TYPE_AZURE_AD),
        }
    }

    pub fn domains_and_tenants(&self) -> DomainsAndTenants {
        let counted = |app_type| self.clients_of(app_type).filter(|c| c.counted()).count() as i64;
        DomainsAndTenants {
            total_entities: self.summary.solution_summary.sla_summary.total_entities,
            domain_controllers: self.agent(0).sla_summary.total_entities,
            tenants: self.agent(1).sla_summary.total_entities,
            apps_total_entities: self.apps.ad_clients.iter().filter(|c| c.counted()).count() as i64,
            apps_domain_controllers: counted(APP_TYPE_AD),
            apps_tenants: counted(APP_TYPE_AZURE_AD),
        }
    }

    pub fn backup_health(&self) -> BackupHealth {
        let sla = &self.summary.solution_summary.sla_summary;
        let clients = &self.apps.ad_clients;

        let apps_recent = clients.iter().filter(|c| c.sla_status == MET_SLA).count() as i64;
        let apps_not_recent = clients
            .iter()
            .filter(|c| c.sla_status == MISSED_SLA && c.number_of_items != 0)
            .count() as i64;
        let apps_never = clients
            .iter()
            .filter(|c| c.sla_status == MISSED_SLA && c.number_of_items == 0)
            .count() as i64;
        let apps_total = clients.iter().filter(|c| c.counted()).count() as i64;

        BackupHealth {
            recently_backed_up: sla.total_entities - sla.sla_not_met_entities,
            recently_backed_up_pct: sla.sla_met_percentage,
            recently_not_backed_up: sla.sla_not_met_entities - sla.never_backedup_entities,
            recently_not_backed_up_pct: sla.sla_not_met_processed_atleast_once_percentage,
            never_backed_up: sla.never_backedup_entities,
            never_backed_up_pct: sla.never_backedup_percentage,
            apps_recently_backed_up: apps_recent,
            apps_recently_not_backed_up: apps_not_recent,
            apps_never_backed_up: apps_never,
            apps_total_entities: apps_total,
            apps_recently_backed_up_pct: percent(apps_recent, apps_total),
            apps_recently_not_backed_up_pct: percent(apps_not_recent, apps_total),
            apps_never_backed_up_pct: percent(apps_never, apps_total),
        }
    }

    pub fn data_distribution(&self) -> DataDistribution {
        let (ad, aad) = (self.agent(0), self.agent(1));
        let clients = &self.apps.ad_clients;
        DataDistribution {
            backup_size: megabytes(ad.application_size + aad.application_size),
            backup_objects: ad.number_of_items + aad.number_of_items,
            apps_backup_size: megabytes(clients.iter().map(|c| c.application_size).sum()),
            apps_backup_objects: clients.iter().map(|c| c.number_of_items).sum(),
        }
    }

    pub fn application_panel(&self) -> ApplicationPanel {
        let agent_panel = |agent: AgentSummary| AppPanel {
            entities: agent.sla_summary.total_entities,
            backup_size: megabytes(agent.application_size),
            backup_objects: agent.number_of_items,
            sla_pct: agent.sla_summary.sla_met_percentage,
            not_sla_pct: agent.sla_summary.sla_not_met_processed_atleast_once_percentage,
        };
        let apps_panel = |app_type| {
            let entities = self.clients_of(app_type).filter(|c| c.counted()).count() as i64;
            let met = self
                .clients_of(app_type)
                .filter(|c| c.sla_status == MET_SLA)
                .count() as i64;
            let panel = AppPanel {
                entities,
                backup_size: megabytes(self.clients_of(app_type).map(|c| c.application_size).sum()),
                backup_objects: self.clients_of(app_type).map(|c| c.number_of_items).sum(),
                sla_pct: percent(met, entities),
                not_sla_pct: percent(entities - met, entities),
            };
            (panel, met)
        };

        let (apps_ad, apps_ad_sla) = apps_panel(APP_TYPE_AD);
        let (apps_aad, apps_aad_sla) = apps_panel(APP_TYPE_AZURE_AD);
        ApplicationPanel {
            ad: agent_panel(self.agent(0)),
            aad: agent_panel(self.agent(1)),
            apps_ad,
            apps_aad,
            apps_ad_sla,
            apps_aad_sla,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn megabytes(bytes: f64) -> f64 {
    round2(bytes / 1024.0 / 1024.0)
}

/// 分母为 0 时记为 0
fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> AdDashboard {
        let dashboard = json!({
            "solutionSummary": {"slaSummary": {
                "totalEntities": 10, "slaNotMetEntities": 4, "neverBackedupEntities": 1,
                "slaMetPercentage": 60.0, "slaNotMetProcessedAtleastOncePercentage": 30.0,
                "neverBackedupPercentage": 10.0
            }},
            "agentSummary": [
                {"isConfigured": true, "applicationSize": 1048576, "numberOfItems": 100,
                 "slaSummary": {"totalEntities": 6, "slaMetPercentage": 50.0}},
                {"isConfigured": false, "applicationSize": 2097152, "numberOfItems": 50,
                 "slaSummary": {"totalEntities": 4}}
            ]
        });
        let apps = json!({
            "totalADClients": 4,
            "adClients": [
                {"appTypeId": 41, "isConfigured": true, "slaStatus": "MET_SLA", "numberOfItems": 10, "applicationSize": 1048576},
                {"appTypeId": 41, "isConfigured": false, "slaStatus": "MISSED_SLA", "numberOfItems": 0, "applicationSize": 0},
                {"appTypeId": 139, "isConfigured": false, "slaStatus": "MISSED_SLA", "numberOfItems": 5, "applicationSize": 524288},
                {"appTypeId": 139, "isConfigured": false, "slaStatus": "EXCLUDED_SLA", "numberOfItems": 1, "applicationSize": 0}
            ]
        });
        AdDashboard::from_values(&dashboard, &apps).unwrap()
    }

    #[test]
    fn test_is_configured() {
        let status = sample().is_configured();
        assert_eq!(status.ad_configured, Some(true));
        assert_eq!(status.aad_configured, Some(false));
        assert!(status.apps_ad_configured);
        assert!(!status.apps_aad_configured);
    }

    #[test]
    fn test_domains_and_tenants() {
        let counts = sample().domains_and_tenants();
        assert_eq!(counts.total_entities, 10);
        assert_eq!(counts.domain_controllers, 6);
        assert_eq!(counts.tenants, 4);
        assert_eq!(counts.apps_total_entities, 3);
        assert_eq!(counts.apps_domain_controllers, 2);
        assert_eq!(counts.apps_tenants, 1);
    }

    #[test]
    fn test_backup_health() {
        let health = sample().backup_health();
        assert_eq!(health.recently_backed_up, 6);
        assert_eq!(health.recently_not_backed_up, 3);
        assert_eq!(health.apps_recently_backed_up, 1);
        assert_eq!(health.apps_recently_not_backed_up, 1);
        assert_eq!(health.apps_never_backed_up, 1);
        assert_eq!(health.apps_total_entities, 3);
        assert_eq!(health.apps_recently_backed_up_pct, 33.33);
    }

    #[test]
    fn test_data_distribution() {
        let data = sample().data_distribution();
        assert_eq!(data.backup_size, 3.0);
        assert_eq!(data.backup_objects, 150);
        assert_eq!(data.apps_backup_size, 1.5);
        assert_eq!(data.apps_backup_objects, 16);
    }

    #[test]
    fn test_application_panel() {
        let panel = sample().application_panel();
        assert_eq!(panel.ad.entities, 6);
        assert_eq!(panel.ad.backup_size, 1.0);
        assert_eq!(panel.apps_ad.entities, 2);
        assert_eq!(panel.apps_ad_sla, 1);
        assert_eq!(panel.apps_ad.sla_pct, 50.0);
        assert_eq!(panel.apps_aad.not_sla_pct, 100.0);
    }

    #[test]
    fn test_empty_apps_avoid_division_by_zero() {
        let dashboard = AdDashboard::from_values(&json!({}), &json!({"adClients": []})).unwrap();
        let health = dashboard.backup_health();
        assert_eq!(health.apps_recently_backed_up_pct, 0.0);
        assert_eq!(dashboard.application_panel().apps_aad.sla_pct, 0.0);
    }
}
