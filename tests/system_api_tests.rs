
use reqwest::StatusCode;
use serde_json::Value;
use test_utils::TestApp;

#[actix_rt::test]
async fn home_banner_lists_the_public_endpoints() {
    let app = TestApp::spawn().await;

    let response = app.client.get(&app.address).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Portfolio site API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["endpoints"]["contact"], "POST /api/contact");
}

#[actix_rt::test]
async fn health_check_reports_the_wired_collaborators() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sequence_store"], "OK");
    assert_eq!(body["email_transport"], "fake");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime"].is_string());
    assert!(body["system"]["cpu_count"].as_u64().unwrap() >= 1);
}

#[actix_rt::test]
async fn github_stats_come_back_for_the_configured_profile() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/api/github/stats", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "octocat");
    assert_eq!(body["public_repos"], 42);
    assert_eq!(body["followers"], 120);
    assert_eq!(body["total_stars"], 350);
    assert!(body["fetched_at"].is_string());
}

#[actix_rt::test]
async fn unknown_routes_fall_through_to_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/api/nope", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
