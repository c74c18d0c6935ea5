//! 全局过滤器 API
//!
//! Commcell 为 Windows、Unix 与 NAS 代理分别维护一份全局过滤列表。

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::client::{Commcell, Payload};
use crate::error::{ErrorModule, Result, SdkError};
use crate::qoperation::ensure_success;
use crate::response::{error_code, is_empty_json};
use crate::services::Service;

/// 全局过滤器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalFilterKind {
    Windows,
    Unix,
    Nas,
}

impl GlobalFilterKind {
    /// 请求与响应中使用的键
    pub fn key(&self) -> &'static str {
        match self {
            GlobalFilterKind::Windows => "windowsGlobalFilters",
            GlobalFilterKind::Unix => "unixGlobalFilters",
            GlobalFilterKind::Nas => "nasGlobalFilters",
        }
    }
}

impl FromStr for GlobalFilterKind {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WINDOWS" => Ok(GlobalFilterKind::Windows),
            "UNIX" => Ok(GlobalFilterKind::Unix),
            "NAS" => Ok(GlobalFilterKind::Nas),
            _ => Err(SdkError::with_message(
                ErrorModule::GlobalFilter,
                102,
                format!("Invalid Global Filter name {}", s),
            )),
        }
    }
}

impl fmt::Display for GlobalFilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GlobalFilterKind::Windows => "WINDOWS",
            GlobalFilterKind::Unix => "UNIX",
            GlobalFilterKind::Nas => "NAS",
        };
        f.write_str(name)
    }
}

/// 更新操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    /// 新增与覆盖都以完整列表提交
    Overwrite,
    Delete,
}

impl FilterOp {
    fn code(&self) -> i64 {
        match self {
            FilterOp::Overwrite => 1,
            FilterOp::Delete => 3,
        }
    }
}

/// 全局过滤器 API
pub struct GlobalFiltersApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> GlobalFiltersApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 获取指定类型的全局过滤器（WINDOWS / UNIX / NAS）
    pub async fn get(&self, name: &str) -> Result<GlobalFilter<'a>> {
        let kind: GlobalFilterKind = name.parse()?;
        let mut filter = GlobalFilter {
            commcell: self.commcell,
            kind,
            content: Vec::new(),
        };
        filter.refresh().await?;
        Ok(filter)
    }
}

/// 单个代理类型的全局过滤器
pub struct GlobalFilter<'a> {
    commcell: &'a Commcell,
    kind: GlobalFilterKind,
    content: Vec<String>,
}

impl<'a> GlobalFilter<'a> {
    pub fn kind(&self) -> GlobalFilterKind {
        self.kind
    }

    /// 当前过滤列表
    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// 重新从 Commcell 读取过滤列表
    pub async fn refresh(&mut self) -> Result<()> {
        let url = self.commcell.services().url(Service::GlobalFilter);
        let response = self
            .commcell
            .make_request(Method::GET, &url, None, None)
            .await?;
        ensure_success(&response)?;

        let value = response.json()?;
        self.content = if is_empty_json(&value) {
            Vec::new()
        } else {
            filters_from(&value, self.kind)
        };
        Ok(())
    }

    /// 在现有列表前追加过滤项
    pub async fn add(&mut self, filters: &[&str]) -> Result<()> {
        info!("追加 {} 全局过滤: {:?}", self.kind, filters);
        let mut merged: Vec<String> = filters.iter().map(|f| f.to_string()).collect();
        merged.extend(self.content.iter().cloned());
        self.update(FilterOp::Overwrite, merged).await
    }

    /// 以给定列表覆盖现有过滤
    pub async fn overwrite(&mut self, filters: &[&str]) -> Result<()> {
        info!("覆盖 {} 全局过滤", self.kind);
        let list = filters.iter().map(|f| f.to_string()).collect();
        self.update(FilterOp::Overwrite, list).await
    }

    /// 删除指定过滤项
    pub async fn delete(&mut self, filters: &[&str]) -> Result<()> {
        info!("删除 {} 全局过滤: {:?}", self.kind, filters);
        let list = filters.iter().map(|f| f.to_string()).collect();
        self.update(FilterOp::Delete, list).await
    }

    /// 清空过滤列表
    pub async fn delete_all(&mut self) -> Result<()> {
        info!("清空 {} 全局过滤", self.kind);
        self.update(FilterOp::Overwrite, vec![String::new()]).await
    }

    async fn update(&mut self, op: FilterOp, filters: Vec<String>) -> Result<()> {
        let body = json!({
            (self.kind.key()): {
                "opType": op.code(),
                "filters": filters,
            }
        });

        let url = self.commcell.services().url(Service::GlobalFilter);
        let response = self
            .commcell
            .make_request(Method::POST, &url, Some(Payload::Json(body)), None)
            .await?;

        self.refresh().await?;
        ensure_success(&response)?;

        let value = response.json()?;
        let error = value
            .get("error")
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))?;
        let code = error
            .get("errorCode")
            .ok_or_else(|| SdkError::new(ErrorModule::Response, 102))?;

        if error_code(code).unwrap_or(-1) != 0 {
            return Err(SdkError::with_message(
                ErrorModule::GlobalFilter,
                102,
                "Failed to update global filters",
            ));
        }
        Ok(())
    }
}

fn filters_from(value: &Value, kind: GlobalFilterKind) -> Vec<String> {
    value
        .get(kind.key())
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
