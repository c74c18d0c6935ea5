//! CLI 命令处理模块

pub mod cache;
pub mod common; // 公共工具函数
pub mod events;
pub mod filters;
pub mod login;
pub mod profile;
pub mod qcommand;
pub mod regions;
pub mod subclients;
pub mod system;
