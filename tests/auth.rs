use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;
use taskdeck::auth::{AuthGate, TokenService};
use taskdeck::routes;

const TEST_JWT_SECRET: &str = "integration-test-secret";

async fn cleanup_user(pool: &PgPool, username: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await;
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    dotenv().ok(); // Load .env file
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");

    // Clean up potential leftovers from earlier runs
    cleanup_user(&pool, "auth_flow_user").await;
    cleanup_user(&pool, "auth_flow_user2").await;

    let tokens = web::Data::new(TokenService::new(TEST_JWT_SECRET, 3600));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(tokens.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::public)
            .service(
                web::scope("/api")
                    .wrap(AuthGate)
                    .configure(routes::protected),
            ),
    )
    .await;

    // Register a new user
    let register_payload = json!({
        "username": "auth_flow_user",
        "email": "auth_flow@example.com",
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::OK,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let register_response: taskdeck::auth::AuthResponse =
        serde_json::from_slice(&body_bytes).expect("Failed to parse registration response JSON");
    assert_eq!(register_response.username, "auth_flow_user");
    assert_eq!(register_response.email, "auth_flow@example.com");
    assert!(register_response.id > 0, "Registration should assign an id");
    assert!(!register_response.token.is_empty());

    // Same username with a different email must fail with a duplicate error
    let req_dup_username = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(&json!({
            "username": "auth_flow_user",
            "email": "other_email@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_dup = test::call_service(&app, req_dup_username).await;
    assert_eq!(resp_dup.status(), actix_web::http::StatusCode::BAD_REQUEST);
    let dup_body: serde_json::Value = test::read_body_json(resp_dup).await;
    assert_eq!(dup_body["error"], "Username is already taken");

    // Same email with a different username must also fail
    let req_dup_email = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(&json!({
            "username": "auth_flow_user2",
            "email": "auth_flow@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_dup = test::call_service(&app, req_dup_email).await;
    assert_eq!(resp_dup.status(), actix_web::http::StatusCode::BAD_REQUEST);
    let dup_body: serde_json::Value = test::read_body_json(resp_dup).await;
    assert_eq!(dup_body["error"], "Email is already in use");

    // Login with the registered user
    let req_login = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({
            "username": "auth_flow_user",
            "password": "Password123!"
        }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    let status_login = resp_login.status();
    let body_bytes_login = test::read_body(resp_login).await;

    assert_eq!(
        status_login,
        actix_web::http::StatusCode::OK,
        "Login failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes_login)
    );

    let login_response: taskdeck::auth::AuthResponse =
        serde_json::from_slice(&body_bytes_login).expect("Failed to parse login response JSON");

    assert!(!login_response.token.is_empty());
    assert_eq!(login_response.id, register_response.id);

    // The token's subject must decode to the username
    let verifier = TokenService::new(TEST_JWT_SECRET, 3600);
    let subject = verifier
        .extract_subject(&login_response.token)
        .expect("Issued token should carry a decodable subject");
    assert_eq!(subject, "auth_flow_user");
    assert!(verifier.validate(&login_response.token, "auth_flow_user"));
    assert!(!verifier.validate(&login_response.token, "somebody_else"));

    // Use the token to access a protected route
    let req_list = test::TestRequest::get()
        .uri("/api/tasks")
        .append_header(("Authorization", format!("Bearer {}", login_response.token)))
        .to_request();
    let resp_list = test::call_service(&app, req_list).await;
    assert_eq!(
        resp_list.status(),
        actix_web::http::StatusCode::OK,
        "Token issued at login should open the protected surface"
    );

    // Clean up created user
    cleanup_user(&pool, "auth_flow_user").await;
}

#[actix_rt::test]
async fn test_unique_violation_surfaces_as_duplicate() {
    dotenv().ok(); // Load .env file
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");

    cleanup_user(&pool, "race_loser_user").await;

    let hash = taskdeck::auth::hash_password("Password123!").expect("hash");
    taskdeck::models::User::insert(&pool, "race_loser_user", "race_loser@example.com", &hash)
        .await
        .expect("first insert");

    // A concurrent registration can pass the handler's exists checks and
    // still lose at the unique constraint; the store error must come back
    // as a duplicate, not a server error.
    let err = taskdeck::models::User::insert(
        &pool,
        "race_loser_user",
        "race_loser_other@example.com",
        &hash,
    )
    .await
    .expect_err("duplicate username must not insert");
    match err {
        taskdeck::error::AppError::Duplicate(msg) => {
            assert_eq!(msg, "Username is already taken");
        }
        other => panic!("Expected Duplicate, got {:?}", other),
    }

    let err = taskdeck::models::User::insert(
        &pool,
        "race_loser_user2",
        "race_loser@example.com",
        &hash,
    )
    .await
    .expect_err("duplicate email must not insert");
    match err {
        taskdeck::error::AppError::Duplicate(msg) => {
            assert_eq!(msg, "Email is already in use");
        }
        other => panic!("Expected Duplicate, got {:?}", other),
    }

    cleanup_user(&pool, "race_loser_user").await;
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    dotenv().ok(); // Load .env file
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");

    let tokens = web::Data::new(TokenService::new(TEST_JWT_SECRET, 3600));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(tokens.clone())
            .wrap(Logger::default())
            .configure(routes::public),
    )
    .await;

    let test_cases = vec![
        // Deserialization errors for missing fields
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            "missing username",
        ),
        (
            json!({ "username": "testuser", "password": "Password123!" }),
            "missing email",
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com" }),
            "missing password",
        ),
        // Validation errors for invalid formats/lengths
        (
            json!({ "username": "testuser", "email": "invalid-email", "password": "Password123!" }),
            "invalid email format",
        ),
        (
            json!({ "username": "u", "email": "test@example.com", "password": "Password123!" }),
            "username too short",
        ),
        (
            json!({ "username": "a".repeat(51), "email": "test@example.com", "password": "Password123!" }),
            "username too long",
        ),
        (
            json!({ "username": "user name!", "email": "test@example.com", "password": "Password123!" }),
            "username with invalid chars",
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com", "password": "123" }),
            "password too short",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            actix_web::http::StatusCode::BAD_REQUEST,
            "Test case failed: {}. Got {}. Body: {:?}",
            description,
            status,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_login_failures_are_uniform() {
    dotenv().ok(); // Load .env file
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");

    cleanup_user(&pool, "login_uniform_user").await;

    let tokens = web::Data::new(TokenService::new(TEST_JWT_SECRET, 3600));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(tokens.clone())
            .wrap(Logger::default())
            .configure(routes::public),
    )
    .await;

    // Register a user so the "wrong password" path has a real target
    let reg_req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(&json!({
            "username": "login_uniform_user",
            "email": "login_uniform@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let reg_resp = test::call_service(&app, reg_req).await;
    assert!(
        reg_resp.status().is_success(),
        "Setup: Failed to register test user"
    );

    // Wrong password for an existing user
    let req_wrong = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({
            "username": "login_uniform_user",
            "password": "WrongPassword123!"
        }))
        .to_request();
    let resp_wrong = test::call_service(&app, req_wrong).await;
    let status_wrong = resp_wrong.status();
    let body_wrong: serde_json::Value = test::read_body_json(resp_wrong).await;

    // Unknown user entirely
    let req_unknown = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({
            "username": "no_such_user_anywhere",
            "password": "Password123!"
        }))
        .to_request();
    let resp_unknown = test::call_service(&app, req_unknown).await;
    let status_unknown = resp_unknown.status();
    let body_unknown: serde_json::Value = test::read_body_json(resp_unknown).await;

    // Both must be 401 with an identical body, so nothing distinguishes
    // "no such user" from "wrong password".
    assert_eq!(status_wrong, actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(status_unknown, actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(body_wrong, body_unknown);
    assert_eq!(body_wrong["error"], "Invalid username or password");

    cleanup_user(&pool, "login_uniform_user").await;
}
