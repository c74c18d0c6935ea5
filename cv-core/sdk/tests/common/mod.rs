//! 集成测试公共工具

#![allow(dead_code)]

use cv_sdk::{Commcell, CommcellConfig, ConnectOptions};
use httpmock::prelude::*;
use serde_json::json;

/// 登录后下发的令牌
pub const TOKEN: &str = "QSDK tok";

/// 启动模拟 Web 服务，挂载探测与登录接口
pub async fn mock_commcell() -> MockServer {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("ok");
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/Login").json_body_partial(r#"{"mode": 4}"#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"userName": "admin", "token": TOKEN}));
        })
        .await;

    server
}

/// 指向模拟服务的客户端配置
pub fn config_for(server: &MockServer) -> CommcellConfig {
    CommcellConfig {
        web_service_url: Some(server.base_url()),
        max_attempts: 2,
        ..Default::default()
    }
}

/// 以 admin 登录模拟服务
pub async fn connect(server: &MockServer) -> Commcell {
    Commcell::connect(
        "127.0.0.1",
        ConnectOptions::password("admin", "password"),
        config_for(server),
    )
    .await
    .expect("登录模拟服务失败")
}
