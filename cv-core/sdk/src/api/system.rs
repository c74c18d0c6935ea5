//! 系统设置 API

use serde_json::Value;
use tracing::info;

use crate::client::Commcell;
use crate::error::Result;
use crate::qoperation::GlobalParam;

/// 系统设置 API
pub struct SystemApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> SystemApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 设置 Web 控制台会话超时（分钟）
    pub async fn set_gui_timeout(&self, minutes: u32) -> Result<Value> {
        info!("设置 GUI 超时: {} 分钟", minutes);
        self.commcell
            .set_gxglobalparam_value(&GlobalParam::new("Gui timeout", &minutes.to_string()))
            .await
    }

    /// 读取当前 GUI 超时设置
    pub async fn gui_timeout(&self) -> Result<Option<String>> {
        self.commcell.get_gxglobalparam_value("Gui timeout").await
    }
}
