//! 区域管理 API
//!
//! 区域描述工作负载或备份数据所在的地理位置，可关联到 Commcell、公司、
//! 客户端、存储池等实体。

use std::collections::HashMap;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::unique_name_keys;
use crate::client::{update_response, Commcell, Payload};
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::{Region, RegionLocation, RegionType};
use crate::response::{error_code, int_field, is_empty_json, str_field, HttpResponse};
use crate::services::Service;
use crate::wrap::WrapOptions;

/// 区域不能设置到该实体
const ERROR_REGION_NOT_ALLOWED: i64 = 50000;

/// 区域 ID 无效
const ERROR_INVALID_REGION_ID: i64 = 547;

/// 区域管理 API
pub struct RegionsApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> RegionsApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 查询全部区域，返回 索引键 → 区域 ID
    pub async fn all(&self) -> Result<HashMap<String, i64>> {
        info!("查询区域列表");
        let value = self
            .commcell
            .wrap_request(Method::GET, Service::Regions, &[], WrapOptions::new())
            .await?;

        let regions = value
            .get("regions")
            .and_then(Value::as_array)
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))?;
        Ok(parse_regions(regions))
    }

    /// 区域是否存在
    pub async fn has_region(&self, name: &str) -> Result<bool> {
        Ok(self.all().await?.contains_key(&name.to_lowercase()))
    }

    /// 按名称查询区域详情
    pub async fn get(&self, name: &str) -> Result<Region> {
        let key = name.to_lowercase();
        let region_id = self.all().await?.get(&key).copied().ok_or_else(|| {
            SdkError::with_message(
                ErrorModule::Region,
                102,
                format!("Region {} not present in commcell", key),
            )
        })?;
        self.properties(region_id).await
    }

    /// 按 ID 查询区域详情
    pub async fn properties(&self, region_id: i64) -> Result<Region> {
        debug!("查询区域属性: {}", region_id);
        let value = self
            .commcell
            .wrap_request(
                Method::GET,
                Service::Region,
                &[&region_id.to_string()],
                WrapOptions::new(),
            )
            .await?;
        Ok(parse_region(&value))
    }

    /// 创建区域
    ///
    /// # Arguments
    /// * `name` - 区域名称
    /// * `region_type` - USER_CREATED / OCI / AWS / AZURE / GCP
    /// * `locations` - 区域包含的位置
    pub async fn add(
        &self,
        name: &str,
        region_type: &str,
        locations: &[RegionLocation],
    ) -> Result<Region> {
        if self.has_region(name).await? {
            return Err(SdkError::with_message(
                ErrorModule::Region,
                102,
                format!("Region \"{}\" already exists", name),
            ));
        }
        let region_type: RegionType = region_type.parse()?;

        info!("创建区域: {} ({})", name, region_type);
        let body = json!({
            "name": name,
            "type": region_type.as_str(),
            "locations": locations,
        });
        let value = self
            .commcell
            .wrap_request(
                Method::POST,
                Service::Regions,
                &[],
                WrapOptions::new().payload(body).error_check(false),
            )
            .await?;

        let code = value.get("errorCode").and_then(error_code).unwrap_or(0);
        if code != 0 {
            let message = str_field(&value, "errorMessage").unwrap_or_default();
            return Err(SdkError::with_message(
                ErrorModule::Region,
                102,
                format!("Failed to create new Region\nError: \"{}\"", message),
            ));
        }

        let created = str_field(&value, "name").unwrap_or_else(|| name.to_string());
        self.get(&created).await
    }

    /// 删除区域
    pub async fn delete(&self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        let region_id = self.all().await?.get(&key).copied().ok_or_else(|| {
            SdkError::with_message(
                ErrorModule::Region,
                102,
                format!("No Region exists with name: \"{}\"", key),
            )
        })?;

        info!("删除区域: {} (id={})", key, region_id);
        let value = self
            .commcell
            .wrap_request(
                Method::DELETE,
                Service::Region,
                &[&region_id.to_string()],
                WrapOptions::new().error_check(false),
            )
            .await?;

        if str_field(&value, "errorCode").as_deref() == Some("0") {
            return Ok(());
        }
        let message = str_field(&value, "errorMessage").unwrap_or_default();
        Err(SdkError::with_message(
            ErrorModule::Region,
            102,
            format!("Failed to delete region. Error: {}", message),
        ))
    }

    /// 为实体设置区域
    ///
    /// # Arguments
    /// * `entity_type` - COMMCELL / COMPANY / CLIENT / CLIENT_GROUP / MEDIAAGENT / STORAGE_POOL 等
    /// * `entity_id` - 实体 ID
    /// * `entity_region_type` - WORKLOAD 或 BACKUP
    /// * `region_id` - 区域 ID
    pub async fn set_region(
        &self,
        entity_type: &str,
        entity_id: i64,
        entity_region_type: &str,
        region_id: i64,
    ) -> Result<()> {
        info!(
            "设置实体区域: {} {} {} -> {}",
            entity_type, entity_id, entity_region_type, region_id
        );
        let url = self
            .commcell
            .services()
            .url_with(Service::EditRegion, &[entity_type, &entity_id.to_string()])?;
        let body = json!({
            "entityRegionType": entity_region_type,
            "region": {"id": region_id},
        });
        let response = self
            .commcell
            .make_request(Method::PUT, &url, Some(Payload::Json(body)), None)
            .await?;

        let value = success_json(&response)?;
        if is_empty_json(&value) {
            return Err(SdkError::new(ErrorModule::Response, 102));
        }
        check_set_region(&value)
    }

    /// 查询实体关联的区域 ID，未关联时为 0，空响应时为 None
    pub async fn get_region(
        &self,
        entity_type: &str,
        entity_id: i64,
        entity_region_type: &str,
    ) -> Result<Option<i64>> {
        let value = self
            .entity_region(Service::GetRegion, entity_type, entity_id, entity_region_type)
            .await?;
        if is_empty_json(&value) {
            return Ok(None);
        }
        region_id_from(&value).map(Some)
    }

    /// 计算实体应归属的区域 ID
    pub async fn calculate_region(
        &self,
        entity_type: &str,
        entity_id: i64,
        entity_region_type: &str,
    ) -> Result<i64> {
        let value = self
            .entity_region(Service::CalculateRegion, entity_type, entity_id, entity_region_type)
            .await?;
        if is_empty_json(&value) {
            return Err(SdkError::new(ErrorModule::Response, 102));
        }
        region_id_from(&value)
    }

    async fn entity_region(
        &self,
        service: Service,
        entity_type: &str,
        entity_id: i64,
        entity_region_type: &str,
    ) -> Result<Value> {
        let url = self.commcell.services().url_with(
            service,
            &[entity_type, &entity_id.to_string(), entity_region_type],
        )?;
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        success_json(&response)
    }
}

fn success_json(response: &HttpResponse) -> Result<Value> {
    if !response.is_success() {
        return Err(SdkError::with_message(
            ErrorModule::Response,
            101,
            update_response(response.text()),
        ));
    }
    response.json()
}

fn check_set_region(value: &Value) -> Result<()> {
    let code = value.get("errorCode").and_then(error_code).unwrap_or(0);
    match code {
        0 => Ok(()),
        ERROR_REGION_NOT_ALLOWED => Err(SdkError::new(ErrorModule::Regions, 101)),
        ERROR_INVALID_REGION_ID => Err(SdkError::with_message(
            ErrorModule::Regions,
            102,
            "Invalid regionID provided in request",
        )),
        _ => Err(SdkError::with_message(
            ErrorModule::Regions,
            102,
            str_field(value, "errorMessage").unwrap_or_default(),
        )),
    }
}

fn region_id_from(value: &Value) -> Result<i64> {
    let code = value.get("errorCode").and_then(error_code).unwrap_or(0);
    if code != 0 {
        return Err(SdkError::with_message(
            ErrorModule::Regions,
            102,
            str_field(value, "errorMessage").unwrap_or_default(),
        ));
    }
    Ok(int_field(value, "regionId").unwrap_or(0))
}

fn parse_regions(regions: &[Value]) -> HashMap<String, i64> {
    let names: Vec<(String, String)> = regions
        .iter()
        .map(|r| {
            let name = str_field(r, "name").unwrap_or_default();
            let company = r
                .pointer("/company/name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (name, company)
        })
        .collect();

    let keys = unique_name_keys(names.iter().map(|(n, c)| (n.as_str(), c.as_str())));
    keys.into_iter()
        .zip(regions)
        .map(|(key, region)| (key, int_field(region, "id").unwrap_or_default()))
        .collect()
}

fn parse_region(value: &Value) -> Region {
    let array = |pointer: &str| {
        value
            .pointer(pointer)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    let associated_plans = array("/associatedRegionBasedPlans/plans")
        .iter()
        .filter_map(|p| p.get("plan").cloned())
        .collect();

    Region {
        id: int_field(value, "id").unwrap_or_default(),
        name: str_field(value, "name").unwrap_or_default(),
        region_type: str_field(value, "regionType"),
        locations: array("/locations"),
        associated_servers_count: value
            .get("associatedServers")
            .and_then(|s| int_field(s, "serversCount")),
        associated_servers: array("/associatedServers/servers"),
        associated_plans_count: value
            .get("associatedRegionBasedPlans")
            .and_then(|p| int_field(p, "plansCount")),
        associated_plans,
    }
}
