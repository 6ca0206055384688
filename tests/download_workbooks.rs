//! End-to-end tests for archive assembly.

use std::io::{Cursor, Read};
use std::sync::atomic::Ordering;

use serde_json::{json, Value};
use zip::ZipArchive;

mod common;

fn request(mock: &common::MockTableau, projects: Value) -> Value {
    json!({
        "username": "analyst",
        "password": "pw",
        "instance": mock.instance(),
        "projects": projects,
    })
}

fn selection(mock: &common::MockTableau) -> Value {
    json!([
        {
            "projectId": "p1",
            "projectName": "Finance",
            "workbooks": [
                {"workbookId": "wb1", "workbookName": "Sales", "downloadUrl": mock.content_url("wb1")},
                {"workbookId": "wb2", "workbookName": "Report.twb", "downloadUrl": mock.content_url("wb2")}
            ]
        },
        {
            "projectId": "p2",
            "projectName": "Marketing",
            "workbooks": [
                {"workbookId": "wb3", "workbookName": "Q1: \"Launch\"", "downloadUrl": mock.content_url("wb3")}
            ]
        }
    ])
}

fn entries(bytes: &[u8]) -> Vec<(String, String)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = String::new();
            file.read_to_string(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

#[tokio::test]
async fn test_bundles_selected_workbooks() {
    let mock = common::start_mock_tableau().await;
    let relay = common::start_relay(common::relay_config(&mock)).await;

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, selection(&mock)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/zip");
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=workbooks.zip"
    );
    assert_eq!(res.headers()["x-workbooks-included"], "3");
    assert_eq!(res.headers()["x-workbooks-failed"], "0");

    let bytes = res.bytes().await.unwrap();
    assert_eq!(
        entries(&bytes),
        vec![
            ("Sales.twbx".to_string(), "content-of-wb1".to_string()),
            ("Report.twb".to_string(), "content-of-wb2".to_string()),
            ("Q1_ _Launch_.twbx".to_string(), "content-of-wb3".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_failed_downloads_are_left_out() {
    let mock = common::start_mock_tableau().await;
    mock.fail_download("wb2");
    mock.slow_download("wb3");
    let relay = common::start_relay(common::relay_config(&mock)).await;

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, selection(&mock)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-workbooks-included"], "1");
    assert_eq!(res.headers()["x-workbooks-failed"], "2");

    let bytes = res.bytes().await.unwrap();
    let names: Vec<_> = entries(&bytes).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["Sales.twbx"]);
}

#[tokio::test]
async fn test_all_downloads_failing_still_yields_archive() {
    let mock = common::start_mock_tableau().await;
    for id in ["wb1", "wb2", "wb3"] {
        mock.fail_download(id);
    }
    let relay = common::start_relay(common::relay_config(&mock)).await;

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, selection(&mock)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let bytes = res.bytes().await.unwrap();
    assert!(entries(&bytes).is_empty());
}

#[tokio::test]
async fn test_invalid_selection_is_400_before_sign_in() {
    let mock = common::start_mock_tableau().await;
    let relay = common::start_relay(common::relay_config(&mock)).await;
    let client = common::client();

    for projects in [Value::Null, json!([]), json!({"p1": []}), json!("p1")] {
        let res = client
            .post(relay.url("/api/tableau/downloadWorkbooks"))
            .json(&request(&mock, projects))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "Invalid or empty projects array."}));
    }

    let res = client
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, json!([{"projectId": "p1", "workbooks": []}])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "No workbooks to download."}));

    assert_eq!(mock.state.sign_ins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_token_is_401_on_download() {
    let mock = common::start_mock_tableau().await;
    mock.state.omit_token.store(true, Ordering::SeqCst);
    let relay = common::start_relay(common::relay_config(&mock)).await;

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, selection(&mock)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    assert_eq!(mock.state.downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_is_not_sent_to_foreign_hosts() {
    let mock = common::start_mock_tableau().await;
    let other = common::start_mock_tableau().await;
    let relay = common::start_relay(common::relay_config(&mock)).await;

    let projects = json!([{
        "workbooks": [
            {"workbookName": "Local", "downloadUrl": mock.content_url("wb1")},
            {"workbookName": "Elsewhere", "downloadUrl": other.content_url("wb2")}
        ]
    }]);

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, projects))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-workbooks-failed"], "1");
    assert_eq!(other.state.downloads.load(Ordering::SeqCst), 0);

    let bytes = res.bytes().await.unwrap();
    let names: Vec<_> = entries(&bytes).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["Local.twbx"]);
}

#[tokio::test]
async fn test_bounded_pool_handles_large_selection() {
    let mock = common::start_mock_tableau().await;
    let mut config = common::relay_config(&mock);
    config.downloads.max_concurrent = 2;
    let relay = common::start_relay(config).await;

    let workbooks: Vec<Value> = (0..20)
        .map(|i| json!({"workbookName": "Sales", "downloadUrl": mock.content_url(&format!("wb{i}"))}))
        .collect();

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, json!([{ "workbooks": workbooks }])))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let bytes = res.bytes().await.unwrap();
    let names: Vec<_> = entries(&bytes).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names.len(), 20);
    assert_eq!(names[0], "Sales.twbx");
    assert_eq!(names[1], "Sales (2).twbx");
    assert_eq!(names[19], "Sales (20).twbx");
}

#[tokio::test]
async fn test_token_does_not_follow_cross_origin_redirects() {
    let mock = common::start_mock_tableau().await;
    let other = common::start_mock_tableau().await;
    mock.redirect_download("wb1", other.content_url("wb1"));
    mock.redirect_download("wb2", mock.content_url("wb9"));
    let relay = common::start_relay(common::relay_config(&mock)).await;

    let projects = json!([{
        "workbooks": [
            {"workbookName": "Moved", "downloadUrl": mock.content_url("wb1")},
            {"workbookName": "Renamed", "downloadUrl": mock.content_url("wb2")}
        ]
    }]);

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, projects))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-workbooks-included"], "1");
    assert_eq!(res.headers()["x-workbooks-failed"], "1");
    assert_eq!(other.state.downloads.load(Ordering::SeqCst), 0);

    let bytes = res.bytes().await.unwrap();
    assert_eq!(
        entries(&bytes),
        vec![("Renamed.twbx".to_string(), "content-of-wb9".to_string())]
    );
}

#[tokio::test]
async fn test_oversized_workbook_is_left_out() {
    let mock = common::start_mock_tableau().await;
    let mut config = common::relay_config(&mock);
    // "content-of-wb1" is 14 bytes.
    config.downloads.max_item_bytes = 8;
    let relay = common::start_relay(config).await;

    let res = common::client()
        .post(relay.url("/api/tableau/downloadWorkbooks"))
        .json(&request(&mock, selection(&mock)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-workbooks-included"], "0");
    assert_eq!(res.headers()["x-workbooks-failed"], "3");
    let bytes = res.bytes().await.unwrap();
    assert!(entries(&bytes).is_empty());
}
