//! Integration tests for the Fallback Handler and terminal 404 behavior.

mod common;

#[tokio::test]
async fn test_unmatched_route_receives_app_shell() {
    let web = tempfile::tempdir().unwrap();
    tokio::fs::write(
        web.path().join("index.html"),
        b"<html><body>app shell</body></html>",
    )
    .await
    .unwrap();

    let handle = common::start_gateway(&format!(
        r#"history_api_fallback = "{}""#,
        web.path().display()
    ))
    .await;

    let response = common::client()
        .get(common::gateway_url(&handle, "/dashboard/settings"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .contains("text/html"));
    assert_eq!(
        response.text().await.unwrap(),
        "<html><body>app shell</body></html>"
    );

    handle.stop().await;
}

#[tokio::test]
async fn test_fallback_with_explicit_file_path() {
    let web = tempfile::tempdir().unwrap();
    let entry = web.path().join("app.html");
    tokio::fs::write(&entry, b"<entry>").await.unwrap();

    // A path with an extension is served as-is, no index appended.
    let handle = common::start_gateway(&format!(
        r#"history_api_fallback = "{}""#,
        entry.display()
    ))
    .await;

    let response = common::client()
        .get(common::gateway_url(&handle, "/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "<entry>");

    handle.stop().await;
}

#[tokio::test]
async fn test_missing_entry_file_is_404() {
    let web = tempfile::tempdir().unwrap();

    let handle = common::start_gateway(&format!(
        r#"history_api_fallback = "{}""#,
        web.path().display()
    ))
    .await;

    let response = common::client()
        .get(common::gateway_url(&handle, "/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "Not Found");

    handle.stop().await;
}

#[tokio::test]
async fn test_empty_pipeline_is_404() {
    let handle = common::start_gateway("").await;

    let response = common::client()
        .get(common::gateway_url(&handle, "/nothing/configured"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "Not Found");

    handle.stop().await;
}

#[tokio::test]
async fn test_invalid_pattern_aborts_startup() {
    let config: devgate::GatewayConfig = toml::from_str(
        r#"
        [[local_rules]]
        path = "/api/(unclosed"
        filepath = "x.json"
        "#,
    )
    .unwrap();

    let err = devgate::start(config).await.unwrap_err();
    assert!(matches!(err, devgate::StartError::Config(_)));
}

#[tokio::test]
async fn test_independent_instances_coexist() {
    let a = common::start_gateway("").await;
    let b = common::start_gateway("").await;
    assert_ne!(a.local_addr(), b.local_addr());
    a.stop().await;

    // The second instance keeps serving after the first stopped.
    let response = common::client()
        .get(common::gateway_url(&b, "/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    b.stop().await;
}
