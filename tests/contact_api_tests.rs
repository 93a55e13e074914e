
use portfolio_api::repositories::leads::LeadRepository;
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::{contact_body, TestApp};

#[actix_rt::test]
async fn contact_submission_returns_success_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/contact", app.address))
        .json(&contact_body("ada@example.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("Thanks"));

    // Confirmation to the visitor, notification to the owner.
    let sent = app.mailer.sent_messages();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "ada@example.com");
    assert_eq!(sent[1].to, "owner@example.dev");

    let leads = app.store.load().await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].email, "ada@example.com");
    assert!(leads[0].is_pending());
}

#[actix_rt::test]
async fn invalid_fields_return_the_validation_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/contact", app.address))
        .json(&json!({
            "name": "Ada",
            "email": "not-an-email",
            "message": "short",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].is_array());

    assert_eq!(app.mailer.sent_count(), 0);
    assert!(app.store.load().await.unwrap().is_empty());
}

#[actix_rt::test]
async fn malformed_json_maps_to_the_validation_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/contact", app.address))
        .header("content-type", "application/json")
        .body("{ definitely not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");
}

#[actix_rt::test]
async fn fourth_submission_in_a_window_is_rate_limited() {
    let app = TestApp::spawn().await;
    let url = format!("{}/api/contact", app.address);

    // Same origin each time; distinct emails so de-duplication stays out
    // of the picture.
    for i in 0..3 {
        let response = app
            .client
            .post(&url)
            .header("x-forwarded-for", "203.0.113.7")
            .json(&contact_body(&format!("visitor{i}@example.com")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "submission {i}");
    }

    let response = app
        .client
        .post(&url)
        .header("x-forwarded-for", "203.0.113.7")
        .json(&contact_body("visitor3@example.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "rate_limit_error");

    // The rejected submission sent nothing and queued nothing.
    assert_eq!(app.mailer.sent_count(), 6);
    assert_eq!(app.store.load().await.unwrap().len(), 3);

    // A different origin still gets through.
    let response = app
        .client
        .post(&url)
        .header("x-forwarded-for", "198.51.100.20")
        .json(&contact_body("other@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn repeat_submission_same_email_still_succeeds_with_one_lead() {
    let app = TestApp::spawn().await;
    let url = format!("{}/api/contact", app.address);

    for _ in 0..2 {
        let response = app
            .client
            .post(&url)
            .json(&contact_body("ada@example.com"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Both submissions emailed the visitor and the owner, but the lead was
    // queued only once.
    assert_eq!(app.mailer.sent_count(), 4);
    assert_eq!(app.store.load().await.unwrap().len(), 1);
}

#[actix_rt::test]
async fn extended_inquiry_fields_reach_the_owner_notification() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/contact", app.address))
        .json(&json!({
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "description": "We need help with a compiler project.",
            "company": "Navy Research",
            "projectType": "consulting",
            "budget": "10k+",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let notification = app.mailer.last_message().unwrap();
    assert_eq!(notification.to, "owner@example.dev");
    assert!(notification.text.contains("Company: Navy Research"));
    assert!(notification.text.contains("Project type: consulting"));
    assert!(notification.text.contains("Budget: 10k+"));
    assert!(notification.text.contains("compiler project"));
}

#[actix_rt::test]
async fn failed_delivery_returns_a_friendly_server_error() {
    let app = TestApp::spawn().await;
    app.mailer.fail_for("ada@example.com");

    let response = app
        .client
        .post(format!("{}/api/contact", app.address))
        .json(&contact_body("ada@example.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "server_error");
    // No stack traces or transport detail for visitors.
    assert!(body["message"].as_str().unwrap().contains("try again"));
    assert!(app.store.load().await.unwrap().is_empty());
}
