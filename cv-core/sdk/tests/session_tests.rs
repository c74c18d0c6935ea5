//! 会话建立、令牌续期与登出测试

mod common;

use std::sync::Arc;

use common::{config_for, connect, mock_commcell, TOKEN};
use cv_sdk::{Commcell, ConnectOptions, ErrorModule};
use httpmock::prelude::*;
use reqwest::Method;
use serde_json::json;

#[tokio::test]
async fn test_password_login() {
    let server = mock_commcell().await;
    let commcell = connect(&server).await;

    assert_eq!(commcell.token().await.as_deref(), Some(TOKEN));
    assert_eq!(commcell.username().await.as_deref(), Some("admin"));
    assert_eq!(
        commcell.services().web_service(),
        format!("{}/", server.base_url())
    );
    assert!(!commcell.is_service_commcell());
}

#[tokio::test]
async fn test_unreachable_web_service() {
    // 未挂载任何接口，探测返回 404
    let server = MockServer::start_async().await;
    let result = Commcell::connect(
        "127.0.0.1",
        ConnectOptions::password("admin", "password"),
        config_for(&server),
    )
    .await;

    let err = result.err().expect("应当连接失败");
    assert!(err.is(ErrorModule::Commcell, 101));
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/Login");
            then.status(200).json_body(json!({
                "errList": [{"errLogMessage": "Invalid credentials", "errorCode": 1}]
            }));
        })
        .await;

    let err = Commcell::connect(
        "127.0.0.1",
        ConnectOptions::password("admin", "wrong"),
        config_for(&server),
    )
    .await
    .err()
    .expect("应当登录失败");

    assert!(err.is(ErrorModule::CvSdk, 101));
    assert!(err.message().contains("Invalid credentials"));
}

#[tokio::test]
async fn test_account_locked() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/Login");
            then.status(200)
                .json_body(json!({"isAccountLocked": true, "remainingLockTime": 3660}));
        })
        .await;

    let err = Commcell::connect(
        "127.0.0.1",
        ConnectOptions::password("admin", "password"),
        config_for(&server),
    )
    .await
    .err()
    .expect("应当登录失败");

    assert!(err.message().contains("1 hour(s) 1 minute(s)"));
}

#[tokio::test]
async fn test_token_login() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;
    let who_am_i = server
        .mock_async(|when, then| {
            when.method(GET).path("/WhoAmI").header("authtoken", "QSDK abc");
            then.status(200).json_body(json!({"userName": "bob"}));
        })
        .await;

    let commcell = Commcell::connect(
        "127.0.0.1",
        ConnectOptions::token("abc"),
        config_for(&server),
    )
    .await
    .expect("令牌登录失败");

    who_am_i.assert_async().await;
    assert_eq!(commcell.token().await.as_deref(), Some("QSDK abc"));
    assert_eq!(commcell.username().await.as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_renew_on_unauthorized() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/WhoAmI").header("authtoken", TOKEN);
            then.status(401);
        })
        .await;
    let renew = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/RenewLoginToken")
                .json_body_partial(r#"{"username": "admin"}"#);
            then.status(200).json_body(json!({"token": "QSDK renewed"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/WhoAmI").header("authtoken", "QSDK renewed");
            then.status(200).json_body(json!({"userName": "admin"}));
        })
        .await;

    let commcell = connect(&server).await;
    assert_eq!(commcell.who_am_i().await.unwrap(), "admin");
    renew.assert_hits_async(1).await;
    assert_eq!(commcell.token().await.as_deref(), Some("QSDK renewed"));
}

#[tokio::test]
async fn test_renew_attempts_exhausted() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/WhoAmI");
            then.status(401);
        })
        .await;
    let renew = server
        .mock_async(|when, then| {
            when.method(POST).path("/RenewLoginToken");
            then.status(200).json_body(json!({"token": TOKEN}));
        })
        .await;

    let commcell = connect(&server).await;
    let err = commcell.who_am_i().await.unwrap_err();
    assert!(err.is(ErrorModule::CvSdk, 107));
    renew.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_unsupported_method() {
    let server = mock_commcell().await;
    let commcell = connect(&server).await;
    let url = format!("{}/Client", server.base_url());

    let err = commcell
        .make_request(Method::PATCH, &url, None, None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorModule::CvSdk, 103));
}

#[tokio::test]
async fn test_logout() {
    let server = mock_commcell().await;
    let logout = server
        .mock_async(|when, then| {
            when.method(POST).path("/Logout").header("authtoken", TOKEN);
            then.status(200).body("User logged out");
        })
        .await;

    let commcell = connect(&server).await;
    assert_eq!(commcell.logout().await.unwrap(), "User logged out");
    assert!(commcell.token().await.is_none());
    assert_eq!(commcell.logout().await.unwrap(), "User already logged out.");
    logout.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_renew_failure() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/WhoAmI");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/RenewLoginToken");
            then.status(500).body("session expired");
        })
        .await;

    let commcell = connect(&server).await;
    let err = commcell.who_am_i().await.unwrap_err();
    assert!(err.is(ErrorModule::CvSdk, 108));
}

#[tokio::test]
async fn test_service_commcell_saml_login_and_renew() {
    let master_server = mock_commcell().await;
    let login_token = master_server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/Commcell/SAMLToken")
                .query_param("validityInMins", "30")
                .header("authtoken", TOKEN);
            then.status(200).json_body(json!({"token": "SAML first"}));
        })
        .await;
    let renew_token = master_server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/Commcell/SAMLToken")
                .query_param("validityInMins", "5");
            then.status(200).json_body(json!({"token": "SAML second"}));
        })
        .await;
    let master = Arc::new(connect(&master_server).await);

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/WhoAmI").header("authtoken", "SAML first");
            then.status(200).json_body(json!({"userName": "admin"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Regions").header("authtoken", "SAML first");
            then.status(401);
        })
        .await;
    let regions = server
        .mock_async(|when, then| {
            when.method(GET).path("/Regions").header("authtoken", "SAML second");
            then.status(200).json_body(json!({"regions": []}));
        })
        .await;

    let commcell = Commcell::connect(
        "127.0.0.1",
        ConnectOptions::service_commcell(master),
        config_for(&server),
    )
    .await
    .expect("服务 Commcell 登录失败");

    login_token.assert_async().await;
    assert!(commcell.is_service_commcell());
    assert_eq!(commcell.token().await.as_deref(), Some("SAML first"));
    assert_eq!(commcell.username().await.as_deref(), Some("admin"));

    let response = commcell.request(Method::GET, "Regions", None).await.unwrap();
    assert_eq!(response.status(), 200);
    renew_token.assert_hits_async(1).await;
    regions.assert_hits_async(1).await;
    assert_eq!(commcell.token().await.as_deref(), Some("SAML second"));
}

#[tokio::test]
async fn test_saml_renew_requires_master() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/WhoAmI").header("authtoken", "SAML lone");
            then.status(200).json_body(json!({"userName": "admin"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Regions");
            then.status(401);
        })
        .await;

    let commcell = Commcell::connect(
        "127.0.0.1",
        ConnectOptions::token("SAML lone"),
        config_for(&server),
    )
    .await
    .expect("令牌登录失败");

    let err = commcell.request(Method::GET, "Regions", None).await.unwrap_err();
    assert!(err.is(ErrorModule::CvSdk, 106));
}
