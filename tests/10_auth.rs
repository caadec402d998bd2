mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.client.get(app.url("/health")).send().await?;
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn signup_returns_token_and_student_without_password() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            &json!({ "name": "Asha", "email": "Asha@Campus.edu", "password": "secret123" }),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["data"]["user"]["email"], "asha@campus.edu");
    assert_eq!(body["data"]["user"]["role"], "Student");
    assert!(body["data"]["user"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_conflicts() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.signup("Ravi", "ravi@campus.edu").await?;

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            &json!({ "name": "Ravi Again", "email": "RAVI@campus.edu", "password": "another1" }),
        )
        .await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn signup_validation_reports_each_field() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            &json!({ "name": "", "email": "nope", "password": "123" }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = &body["error"]["field_errors"];
    assert!(fields.get("name").is_some());
    assert!(fields.get("email").is_some());
    assert!(fields.get("password").is_some());
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .client
        .post(app.url("/api/auth/signin"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn signin_checks_password() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.signup("Meera", "meera@campus.edu").await?;

    let (status, body) = app
        .post(
            "/api/auth/signin",
            None,
            &json!({ "email": "meera@campus.edu", "password": "secret123" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, _) = app
        .post(
            "/api/auth/signin",
            None,
            &json!({ "email": "meera@campus.edu", "password": "wrong-password" }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/auth/signin",
            None,
            &json!({ "email": "ghost@campus.edu", "password": "secret123" }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn forgot_password_does_not_reveal_unknown_emails() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.signup("Kiran", "kiran@campus.edu").await?;

    let (known_status, known) = app
        .post("/api/auth/forgot-password", None, &json!({ "email": "kiran@campus.edu" }))
        .await?;
    let (unknown_status, unknown) = app
        .post("/api/auth/forgot-password", None, &json!({ "email": "ghost@campus.edu" }))
        .await?;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known["message"], unknown["message"]);
    assert!(app.notifier.last_code_for("kiran@campus.edu").is_some());
    assert!(app.notifier.last_code_for("ghost@campus.edu").is_none());
    Ok(())
}

#[tokio::test]
async fn reset_code_changes_password_once() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.signup("Dev", "dev@campus.edu").await?;

    app.post("/api/auth/forgot-password", None, &json!({ "email": "dev@campus.edu" }))
        .await?;
    let code = app
        .notifier
        .last_code_for("dev@campus.edu")
        .expect("code should have been sent");
    assert_eq!(code.len(), 6);

    let wrong = if code == "000000" { "111111" } else { "000000" };
    let (status, _) = app
        .post(
            "/api/auth/reset-password",
            None,
            &json!({ "email": "dev@campus.edu", "otp": wrong, "newPassword": "fresh-pass" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/auth/reset-password",
            None,
            &json!({ "email": "dev@campus.edu", "otp": code, "newPassword": "fresh-pass" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    // the code is spent
    let (status, _) = app
        .post(
            "/api/auth/reset-password",
            None,
            &json!({ "email": "dev@campus.edu", "otp": code, "newPassword": "other-pass" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/auth/signin",
            None,
            &json!({ "email": "dev@campus.edu", "password": "fresh-pass" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

async fn issue_code(app: &TestApp, email: &str) -> Result<String> {
    app.post("/api/auth/forgot-password", None, &json!({ "email": email }))
        .await?;
    app.notifier
        .last_code_for(email)
        .ok_or_else(|| anyhow::anyhow!("no code sent to {}", email))
}

#[tokio::test]
async fn simultaneous_resets_with_one_code_succeed_once() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.signup("Tara", "tara@campus.edu").await?;
    let code = issue_code(&app, "tara@campus.edu").await?;

    let first = json!({ "email": "tara@campus.edu", "otp": code, "newPassword": "first-pass" });
    let second = json!({ "email": "tara@campus.edu", "otp": code, "newPassword": "second-pass" });
    let (a, b) = tokio::join!(
        app.post("/api/auth/reset-password", None, &first),
        app.post("/api/auth/reset-password", None, &second),
    );

    let mut statuses = [a?.0, b?.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
    Ok(())
}

#[tokio::test]
async fn reset_code_is_locked_out_after_repeated_wrong_guesses() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.signup("Omar", "omar@campus.edu").await?;
    let code = issue_code(&app, "omar@campus.edu").await?;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        let (status, _) = app
            .post(
                "/api/auth/reset-password",
                None,
                &json!({ "email": "omar@campus.edu", "otp": wrong, "newPassword": "guessing" }),
            )
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .post(
            "/api/auth/reset-password",
            None,
            &json!({ "email": "omar@campus.edu", "otp": code, "newPassword": "fresh-pass" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a new code works again
    let code = issue_code(&app, "omar@campus.edu").await?;
    let (status, _) = app
        .post(
            "/api/auth/reset-password",
            None,
            &json!({ "email": "omar@campus.edu", "otp": code, "newPassword": "fresh-pass" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
