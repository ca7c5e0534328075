use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use aula::config::Config;

/// Client id baked into the default config (must match config.rs)
const CLIENT_ID: &str = "aula-web";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single connection keeps the in-memory database alive and shared.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.storage.upload_path = std::env::temp_dir()
        .join(format!("aula-api-tests-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = aula::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    aula::api::router(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("X-Client-Id", CLIENT_ID)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_payload(email: &str) -> serde_json::Value {
    serde_json::json!({
        "firstName": "John",
        "lastName": "Doe",
        "email": email,
        "password": "Passw0rd!",
        "role": "Student",
        "isActive": true,
    })
}

async fn register_user(app: &Router, email: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            register_payload(email),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn login(app: &Router, username: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap()
}

async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let response = login(app, username, password).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

// ============================================================================
// Client-id gate
// ============================================================================

#[tokio::test]
async fn health_check_is_open() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health/check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn client_id_is_required_on_api_routes() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/countries")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "CLIENT_ID_REQUIRED");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/countries")
                .header("X-Client-Id", "wrong-client")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "INVALID_CLIENT_ID");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/countries")
                .header("X-Client-Id", CLIENT_ID)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn client_id_gate_applies_even_with_valid_bearer_token() {
    let app = spawn_app().await;
    register_user(&app, "gate@example.com").await;
    let token = login_token(&app, "gate@example.com", "Passw0rd!").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "CLIENT_ID_REQUIRED");
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_generates_username_from_names() {
    let app = spawn_app().await;

    let body = register_user(&app, "john@example.com").await;
    assert_eq!(body["data"]["username"], "john.doe");
    assert_eq!(body["data"]["roles"][0]["name"], "Student");
    assert!(body["data"].get("passwordHash").is_none());

    // Same names, different email: the base is taken, so a 4-digit suffix
    // is appended.
    let body = register_user(&app, "john2@example.com").await;
    let username = body["data"]["username"].as_str().unwrap();
    let re = regex::Regex::new(r"^john\.doe\d{4}$").unwrap();
    assert!(re.is_match(username), "unexpected username: {username}");
}

#[tokio::test]
async fn register_rejects_duplicate_email_with_conflict() {
    let app = spawn_app().await;
    register_user(&app, "dupe@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            register_payload("dupe@example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "EMAIL_OR_USERNAME_TAKEN");
}

#[tokio::test]
async fn register_rejects_weak_password_and_bad_role() {
    let app = spawn_app().await;

    let mut payload = register_payload("weak@example.com");
    payload["password"] = serde_json::json!("password");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "VALIDATION_ERROR");

    let mut payload = register_payload("admin@example.com");
    payload["role"] = serde_json::json!("Administrator");
    let response = app
        .oneshot(json_request("POST", "/api/auth/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_succeeds_with_email_or_username() {
    let app = spawn_app().await;
    register_user(&app, "jane@example.com").await;

    let by_email = login(&app, "jane@example.com", "Passw0rd!").await;
    assert_eq!(by_email.status(), StatusCode::OK);
    let body = body_json(by_email).await;
    assert_eq!(body["data"]["user"]["email"], "jane@example.com");
    assert!(
        body["data"]["accessToken"]
            .as_str()
            .unwrap()
            .split('.')
            .count()
            == 3
    );

    let by_username = login(&app, "john.doe", "Passw0rd!").await;
    assert_eq!(by_username.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_failure_does_not_reveal_which_part_was_wrong() {
    let app = spawn_app().await;
    register_user(&app, "known@example.com").await;

    let wrong_password = login(&app, "known@example.com", "Wrong-Pass1!").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body = body_json(wrong_password).await;

    let unknown_user = login(&app, "nobody@example.com", "Wrong-Pass1!").await;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user_body = body_json(unknown_user).await;

    assert_eq!(wrong_password_body["errorCode"], "INVALID_USERNAME_OR_PASSWORD");
    assert_eq!(
        wrong_password_body["errorCode"],
        unknown_user_body["errorCode"]
    );
    assert_eq!(
        wrong_password_body["message"],
        unknown_user_body["message"]
    );
}

#[tokio::test]
async fn login_rejects_inactive_user() {
    let app = spawn_app().await;

    let mut payload = register_payload("inactive@example.com");
    payload["isActive"] = serde_json::json!(false);
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = login(&app, "inactive@example.com", "Passw0rd!").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "USER_IS_NOT_ACTIVE");
}

// ============================================================================
// Access guard
// ============================================================================

#[tokio::test]
async fn protected_route_requires_valid_token_and_live_session() {
    let app = spawn_app().await;
    register_user(&app, "guard@example.com").await;

    // No token at all
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header("X-Client-Id", CLIENT_ID)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "MISSING_OR_INVALID_TOKEN");

    // Garbage token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header("X-Client-Id", CLIENT_ID)
                .header("Authorization", "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "INVALID_OR_EXPIRED_TOKEN");

    // Real token
    let token = login_token(&app, "guard@example.com", "Passw0rd!").await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header("X-Client-Id", CLIENT_ID)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "guard@example.com");
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = spawn_app().await;
    register_user(&app, "bye@example.com").await;
    let token = login_token(&app, "bye@example.com", "Passw0rd!").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("X-Client-Id", CLIENT_ID)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The token is still cryptographically valid, but its session is gone.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header("X-Client-Id", CLIENT_ID)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "INVALID_OR_EXPIRED_TOKEN");
}

// ============================================================================
// Role guard
// ============================================================================

#[tokio::test]
async fn student_cannot_look_users_up_by_email() {
    let app = spawn_app().await;
    register_user(&app, "student@example.com").await;
    let token = login_token(&app, "student@example.com", "Passw0rd!").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/users/student@example.com")
                .header("X-Client-Id", CLIENT_ID)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "UNAUTHORIZED");
}

#[tokio::test]
async fn teacher_can_look_users_up_by_email() {
    let app = spawn_app().await;

    let mut payload = register_payload("teacher@example.com");
    payload["role"] = serde_json::json!("Teacher");
    payload["firstName"] = serde_json::json!("Terry");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    register_user(&app, "pupil@example.com").await;

    let token = login_token(&app, "teacher@example.com", "Passw0rd!").await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/users/pupil@example.com")
                .header("X-Client-Id", CLIENT_ID)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "pupil@example.com");
}

// ============================================================================
// Password change
// ============================================================================

#[tokio::test]
async fn change_password_enforces_the_check_order() {
    let app = spawn_app().await;
    register_user(&app, "rotate@example.com").await;
    let token = login_token(&app, "rotate@example.com", "Passw0rd!").await;

    let put = |body: serde_json::Value, token: String| {
        let app = app.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/users/password")
                    .header("Content-Type", "application/json")
                    .header("X-Client-Id", CLIENT_ID)
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    // Wrong current password
    let response = put(
        serde_json::json!({
            "currentPassword": "Wrong-Pass1!",
            "newPassword": "Fresh-Passw0rd!",
            "confirmNewPassword": "Fresh-Passw0rd!",
        }),
        token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "INCORRECT_CURRENT_PASSWORD");

    // New password equal to the current one
    let response = put(
        serde_json::json!({
            "currentPassword": "Passw0rd!",
            "newPassword": "Passw0rd!",
            "confirmNewPassword": "Passw0rd!",
        }),
        token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "PASSWORD_SAME_AS_OLD");

    // Successful rotation
    let response = put(
        serde_json::json!({
            "currentPassword": "Passw0rd!",
            "newPassword": "Fresh-Passw0rd1!",
            "confirmNewPassword": "Fresh-Passw0rd1!",
        }),
        token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old credentials no longer work; new ones do.
    let response = login(&app, "rotate@example.com", "Passw0rd!").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let token = login_token(&app, "rotate@example.com", "Fresh-Passw0rd1!").await;

    // Reusing the password set one change ago is rejected by history.
    let response = put(
        serde_json::json!({
            "currentPassword": "Fresh-Passw0rd1!",
            "newPassword": "Fresh-Passw0rd1!",
            "confirmNewPassword": "Fresh-Passw0rd1!",
        }),
        token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put(
        serde_json::json!({
            "currentPassword": "Fresh-Passw0rd1!",
            "newPassword": "Another-Passw0rd2!",
            "confirmNewPassword": "Another-Passw0rd2!",
        }),
        token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put(
        serde_json::json!({
            "currentPassword": "Another-Passw0rd2!",
            "newPassword": "Fresh-Passw0rd1!",
            "confirmNewPassword": "Fresh-Passw0rd1!",
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "PASSWORD_USED_IN_LAST_5_PASSWORDS");
}

// ============================================================================
// Countries
// ============================================================================

#[tokio::test]
async fn country_lookups() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/countries")
                .header("X-Client-Id", CLIENT_ID)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().len() >= 20);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/countries/code/jp")
                .header("X-Client-Id", CLIENT_ID)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["codeIso3"], "JPN");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/countries/code-iso3/ZZZ")
                .header("X-Client-Id", CLIENT_ID)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "COUNTRY_NOT_FOUND");
}

// ============================================================================
// Multipart user creation
// ============================================================================

#[tokio::test]
async fn create_user_with_profile_picture_upload() {
    let app = spawn_app().await;
    register_user(&app, "creator@example.com").await;
    let token = login_token(&app, "creator@example.com", "Passw0rd!").await;

    let boundary = "----aula-test-boundary";
    let mut body = String::new();
    for (name, value) in [
        ("firstName", "New"),
        ("lastName", "Person"),
        ("email", "new.person@example.com"),
        ("password", "Fresh-Passw0rd1!"),
        ("role", "Student"),
        ("isActive", "true"),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"profilePicture\"; filename=\"Avatar Pic.PNG\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    ));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users")
                .header("X-Client-Id", CLIENT_ID)
                .header("Authorization", format!("Bearer {token}"))
                .header(
                    "Content-Type",
                    format!("{}; boundary={boundary}", mime::MULTIPART_FORM_DATA),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["email"], "new.person@example.com");
    assert_eq!(body["data"]["user"]["username"], "new.person");
    let url = body["data"]["profilePictureUrl"].as_str().unwrap();
    assert!(url.ends_with("/profile-pictures/avatar_pic.png"), "url: {url}");
}
