//! 功能 API 集成测试

mod common;

use common::{connect, mock_commcell};
use cv_sdk::api::subclient::{BackupOptions, SubclientScope};
use cv_sdk::{BackupLevel, ErrorModule, InterfaceEndpoint, InterfacePair, JobRef, JobSubmission};
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_regions_listing_and_lookup() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Regions");
            then.status(200).json_body(json!({"regions": [
                {"id": 1, "name": "East", "company": {"name": "Acme"}},
                {"id": 2, "name": "east", "company": {"name": "Globex"}},
                {"id": 3, "name": "West"}
            ]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Regions/3");
            then.status(200).json_body(json!({
                "id": 3, "name": "West", "regionType": "USER_CREATED",
                "locations": [{"city": "Seattle"}]
            }));
        })
        .await;

    let commcell = connect(&server).await;
    let regions = commcell.regions().all().await.unwrap();
    assert_eq!(regions["east_(acme)"], 1);
    assert_eq!(regions["east_(globex)"], 2);
    assert!(commcell.regions().has_region("WEST").await.unwrap());

    let west = commcell.regions().get("west").await.unwrap();
    assert_eq!(west.id, 3);
    assert_eq!(west.region_type.as_deref(), Some("USER_CREATED"));
    assert_eq!(west.locations.len(), 1);

    let err = commcell.regions().get("north").await.unwrap_err();
    assert!(err.is(ErrorModule::Region, 102));
    assert_eq!(err.message(), "Region north not present in commcell");
}

#[tokio::test]
async fn test_region_delete() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Regions");
            then.status(200)
                .json_body(json!({"regions": [{"id": 9, "name": "Lab"}]}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/Regions/9");
            then.status(200).json_body(json!({"errorCode": 0}));
        })
        .await;

    let commcell = connect(&server).await;
    commcell.regions().delete("LAB").await.unwrap();
    delete.assert_async().await;

    let err = commcell.regions().delete("missing").await.unwrap_err();
    assert_eq!(err.message(), "No Region exists with name: \"missing\"");
}

#[tokio::test]
async fn test_set_region_not_allowed() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/V4/CLIENT/12/Region");
            then.status(200)
                .json_body(json!({"errorCode": 50000, "errorMessage": "not allowed"}));
        })
        .await;

    let commcell = connect(&server).await;
    let err = commcell
        .regions()
        .set_region("CLIENT", 12, "WORKLOAD", 3)
        .await
        .unwrap_err();
    assert!(err.is(ErrorModule::Regions, 101));
}

#[tokio::test]
async fn test_events_query() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Events").query_param("level", "10");
            then.status(200).json_body(json!({"commservEvents": [
                {"id": 101, "eventCode": "318767861", "severity": 6},
                {"id": 102, "eventCode": "318767862"}
            ]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Events/101");
            then.status(200).json_body(json!({"commservEvents": [
                {"id": 101, "eventCode": "318767861", "severity": 6, "jobId": 55,
                 "description": "Backup job failed", "subsystem": "JobManager"}
            ]}));
        })
        .await;

    let commcell = connect(&server).await;
    let events = commcell.events().events(&[("level", "10")]).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events["101"], "318767861");

    let details = commcell
        .events()
        .events_with_details(&[("level", "10")])
        .await
        .unwrap();
    assert!(details["102"].get("id").is_none());

    let event = commcell.events().get("101").await.unwrap();
    assert_eq!(event.job_id, Some(55));
    assert_eq!(event.subsystem, "JobManager");
}

#[tokio::test]
async fn test_global_filter_add() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/GlobalFilter");
            then.status(200)
                .json_body(json!({"windowsGlobalFilters": ["*.tmp"]}));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(POST).path("/GlobalFilter").json_body(json!({
                "windowsGlobalFilters": {"opType": 1, "filters": ["*.bak", "*.tmp"]}
            }));
            then.status(200).json_body(json!({"error": {"errorCode": 0}}));
        })
        .await;

    let commcell = connect(&server).await;
    let filters = commcell.global_filters();
    let mut windows = filters.get("windows").await.unwrap();
    assert_eq!(windows.content(), ["*.tmp".to_string()]);

    windows.add(&["*.bak"]).await.unwrap();
    update.assert_async().await;

    assert!(commcell.global_filters().get("macos").await.is_err());
}

#[tokio::test]
async fn test_subclients_and_backup() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Subclient").query_param("clientId", "5");
            then.status(200).json_body(json!({"subClientProperties": [
                {
                    "subClientEntity": {
                        "subclientId": 12, "subclientName": "default", "appName": "File System",
                        "instanceName": "DefaultInstanceName", "backupsetName": "defaultBackupSet"
                    },
                    "commonProperties": {"isDefaultSubclient": true}
                },
                {
                    "subClientEntity": {
                        "subclientId": 13, "subclientName": "Docs", "appName": "File System",
                        "instanceName": "DefaultInstanceName", "backupsetName": "defaultBackupSet"
                    }
                },
                {
                    "subClientEntity": {
                        "subclientId": 20, "subclientName": "default", "appName": "SQL Server",
                        "instanceName": "MSSQL", "backupsetName": "defaultBackupSet"
                    }
                }
            ]}));
        })
        .await;
    let backup = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/Subclient/13/action/backup")
                .query_param("backupLevel", "full")
                .query_param("collectMetaInfo", "False");
            then.status(200).json_body(json!({"jobIds": ["4321"]}));
        })
        .await;

    let commcell = connect(&server).await;
    let subclients = commcell.subclients(5);
    let scope = SubclientScope::agent("File System");

    let listed = subclients.list(&scope).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(
        subclients.default_subclient(&scope).await.unwrap().as_deref(),
        Some("default")
    );

    let docs = subclients.get(&scope, "DOCS").await.unwrap();
    let job = subclients
        .backup(docs.id, &BackupOptions::level(BackupLevel::Full))
        .await
        .unwrap();
    assert_eq!(job, JobSubmission::Job(JobRef::new(4321)));
    backup.assert_async().await;

    let err = subclients.get(&scope, "logs").await.unwrap_err();
    assert_eq!(err.message(), "No subclient exists with name: logs");
}

#[tokio::test]
async fn test_commserv_cache_path() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/CommServ/GlobalParams")
                .json_body(json!({"globalParamsRequestList": ["Patch Directory"]}));
            then.status(200).json_body(json!({"globalParamsResultList": [
                {"name": "Patch Directory", "value": "C:\\CVCache"}
            ]}));
        })
        .await;

    let commcell = connect(&server).await;
    assert_eq!(
        commcell.commserv_cache().cs_cache_path().await.unwrap(),
        "C:\\CVCache"
    );
}

#[tokio::test]
async fn test_delete_array() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/StorageArrays/8");
            then.status(200)
                .json_body(json!({"errorCode": 0, "errorMessage": "Array deleted"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/StorageArrays/9");
            then.status(200)
                .json_body(json!({"errorCode": 5, "errorMessage": "Array in use"}));
        })
        .await;

    let commcell = connect(&server).await;
    let arrays = commcell.array_management();
    assert_eq!(arrays.delete_array(8).await.unwrap(), "Array deleted");

    let err = arrays.delete_array(9).await.unwrap_err();
    assert!(err.is(ErrorModule::StorageArray, 103));
    assert_eq!(err.message(), "Array in use");
}

#[tokio::test]
async fn test_content_analyzers() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/getContentAnalyzerCloud");
            then.status(200).json_body(json!({"contentAnalyzerList": [
                {"clientName": "CA01", "caUrl": "http://ca01:22000", "clientId": 14}
            ]}));
        })
        .await;

    let commcell = connect(&server).await;
    let analyzers = commcell.content_analyzers();
    assert!(analyzers.has_client("ca01").await.unwrap());
    assert_eq!(analyzers.get("CA01").await.unwrap().client_id, 14);
    assert!(analyzers
        .get("ca02")
        .await
        .unwrap_err()
        .is(ErrorModule::ContentAnalyzer, 102));
}

#[tokio::test]
async fn test_remote_cache_rest_operations() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Client");
            then.status(200).json_body(json!({"clientProperties": [
                {"client": {"clientEntity": {
                    "clientName": "rc01", "clientId": 12, "hostName": "rc01.local"
                }}}
            ]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/CommServ");
            then.status(200).json_body(json!({
                "commcell": {"commCellName": "cs01", "commCellId": 2, "csGUID": "guid-1"},
                "hostName": "cs01.local",
                "csTimeZone": {"TimeZoneName": "(UTC) Coordinated Universal Time"},
                "currentSPVersion": 34,
                "csVersionInfo": "11 SP34"
            }));
        })
        .await;
    let configure = server
        .mock_async(|when, then| {
            when.method(POST).path("/V4/SoftwareCache").json_body(json!({
                "cacheDirectory": "/opt/cache",
                "associations": [],
                "cache": {"name": "rc01", "id": 12}
            }));
            then.status(200).json_body(json!({"errorCode": 0}));
        })
        .await;
    let enable = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/V4/SoftwareCache/12")
                .json_body(json!({"enabled": true}));
            then.status(200).json_body(json!({"errorCode": 0}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/V4/SoftwareCache/12")
                .json_body(json!({"enabled": false}));
            then.status(200)
                .json_body(json!({"errorCode": 5, "errorMessage": "cache busy"}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/V4/SoftwareCache/12");
            then.status(200).json_body(json!({"errorCode": 0}));
        })
        .await;

    let commcell = connect(&server).await;
    let cache = commcell.remote_cache("RC01");
    cache.configure("/opt/cache").await.unwrap();
    cache.enable().await.unwrap();
    let err = cache.disable().await.unwrap_err();
    assert!(err.is(ErrorModule::Response, 101));
    assert!(err.message().contains("\"5\""));
    cache.delete().await.unwrap();

    configure.assert_async().await;
    enable.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_add_backup_interface_pairs() {
    let server = mock_commcell().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/Client");
            then.status(200).json_body(json!({"clientProperties": [
                {"client": {"clientEntity": {
                    "clientName": "fs01", "clientId": 11, "hostName": "fs01.local"
                }}}
            ]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ClientGroup");
            then.status(200).json_body(json!({"groups": [{"name": "ma-group", "Id": 5}]}));
        })
        .await;
    let add = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/CommServ/DataInterfacePairs")
                .json_body(json!({
                    "operationType": "ADD",
                    "ArchPipeLineList": [{
                        "destGroupId": 5,
                        "srcGroupId": 0,
                        "isActive": 1,
                        "client2": {"name": "No Default Interface", "id": 0},
                        "client1": {"name": "172.19.96.123", "id": 11}
                    }]
                }));
            then.status(200).json_body(json!({"errorCode": 0}));
        })
        .await;

    let commcell = connect(&server).await;
    let pair = InterfacePair::new(
        InterfaceEndpoint::client("FS01", "172.19.96.123"),
        InterfaceEndpoint::client_group("MA-Group", "No Default Interface"),
    );
    commcell
        .backup_network_pairs()
        .add_backup_interface_pairs(&[pair])
        .await
        .unwrap();
    add.assert_async().await;
}
