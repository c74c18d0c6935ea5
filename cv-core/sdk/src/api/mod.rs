//! Commcell 功能 API 模块
//!
//! 提供各功能区域的 API 封装，包括：
//! - 客户端与客户端组 (ClientsApi / ClientGroupsApi)
//! - 系统设置 (SystemApi)
//! - 全局过滤器 (GlobalFiltersApi)
//! - 事件查询 (EventsApi)
//! - 区域管理 (RegionsApi)
//! - 备份网络对 (BackupNetworkPairsApi)
//! - 阵列与快照 (ArrayManagementApi)
//! - 内容分析器 (ContentAnalyzersApi)
//! - AD 仪表盘 (AdDashboardApi)
//! - 软件缓存 (CommServeCacheApi / RemoteCacheApi)
//! - 开发测试组 (DevTestGroupApi)
//! - 子客户端 (SubclientsApi)
//! - 作业 (JobsApi)

pub mod ad_dashboard;
pub mod array_management;
pub mod backup_network_pairs;
pub mod cache_config;
pub mod client_groups;
pub mod clients;
pub mod content_analyzer;
pub mod dev_test_group;
pub mod events;
pub mod global_filter;
pub mod job;
pub mod regions;
pub mod subclient;
pub mod system;

pub use ad_dashboard::AdDashboardApi;
pub use array_management::ArrayManagementApi;
pub use backup_network_pairs::BackupNetworkPairsApi;
pub use cache_config::{CommServeCacheApi, RemoteCacheApi};
pub use client_groups::ClientGroupsApi;
pub use clients::ClientsApi;
pub use content_analyzer::ContentAnalyzersApi;
pub use dev_test_group::DevTestGroupApi;
pub use events::EventsApi;
pub use global_filter::GlobalFiltersApi;
pub use job::JobsApi;
pub use regions::RegionsApi;
pub use subclient::SubclientsApi;
pub use system::SystemApi;

use std::collections::{HashMap, HashSet};

/// 生成名称索引键
///
/// 名称统一小写；同名条目分属多个公司时，键为 `name_(company)`。
pub(crate) fn unique_name_keys<'v>(
    entries: impl IntoIterator<Item = (&'v str, &'v str)> + Clone,
) -> Vec<String> {
    let mut companies: HashMap<String, HashSet<String>> = HashMap::new();
    for (name, company) in entries.clone() {
        companies
            .entry(name.to_lowercase())
            .or_default()
            .insert(company.to_lowercase());
    }

    entries
        .into_iter()
        .map(|(name, company)| {
            let name = name.to_lowercase();
            let shared = companies.get(&name).map(|c| c.len() > 1).unwrap_or(false);
            if shared {
                format!("{}_({})", name, company.to_lowercase())
            } else {
                name
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_keys() {
        let entries = vec![("East", "Acme"), ("east", "Globex"), ("West", "")];
        assert_eq!(
            unique_name_keys(entries.iter().copied()),
            vec!["east_(acme)", "east_(globex)", "west"]
        );
    }

    #[test]
    fn test_same_company_duplicates_share_key() {
        let entries = vec![("Lab", "Acme"), ("lab", "acme")];
        assert_eq!(unique_name_keys(entries.iter().copied()), vec!["lab", "lab"]);
    }
}
