//! Commcell REST API 客户端
//!
//! 提供与 Commcell Web 服务交互的会话与功能 API 封装。
//!
//! # 功能
//!
//! - **会话** (`Commcell`): Web 服务探测、密码/令牌/SAML 登录、401 自动续期、登出
//! - **请求封装** (`WrapOptions`): 统一的状态码、空响应与错误码检查
//! - **QOperation**: XML 执行、qscript、qcommand 与全局参数读写
//! - **功能 API**: 客户端、区域、事件、全局过滤器、阵列快照、软件缓存、
//!   子客户端备份等，见 [`api`] 模块
//!
//! # 示例
//!
//! ```ignore
//! use cv_sdk::{Commcell, CommcellConfig, ConnectOptions};
//!
//! let commcell = Commcell::connect(
//!     "webconsole.example.com",
//!     ConnectOptions::password("admin", "password"),
//!     CommcellConfig::default(),
//! )
//! .await?;
//!
//! // 查询区域
//! let regions = commcell.regions().all().await?;
//!
//! // 查询失败事件
//! let events = commcell.events().events(&[("level", "10")]).await?;
//!
//! commcell.logout().await?;
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod qoperation;
pub mod response;
pub mod services;
pub mod wrap;

pub use client::{Commcell, CommcellConfig, ConnectOptions, Payload};
pub use error::{ErrorModule, Result, SdkError};
pub use models::*;
pub use qoperation::GlobalParam;
pub use response::HttpResponse;
pub use services::{Service, Services};
pub use wrap::WrapOptions;
