use crate::{
    auth::{hash_password, verify_password, AuthResponse, LoginRequest, RegisterRequest, TokenService},
    error::AppError,
    models::User,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Rejects duplicate usernames and emails before creating the account,
/// stores the password only as a bcrypt hash, and returns a token for the
/// new identity.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    log::info!("registration attempt for username={}", register_data.username);

    if User::username_exists(&pool, &register_data.username).await? {
        return Err(AppError::Duplicate("Username is already taken".into()));
    }

    if User::email_exists(&pool, &register_data.email).await? {
        return Err(AppError::Duplicate("Email is already in use".into()));
    }

    let password_hash = hash_password(&register_data.password)?;

    let user = User::insert(
        &pool,
        &register_data.username,
        &register_data.email,
        &password_hash,
    )
    .await?;

    let token = tokens.issue(&user.username)?;

    log::info!("user registered: {} (id={})", user.username, user.id);

    Ok(HttpResponse::Ok().json(AuthResponse {
        id: user.id,
        token,
        username: user.username,
        email: user.email,
    }))
}

/// Login user
///
/// Authenticates a user by username and password and returns a token.
/// "No such user" and "wrong password" are deliberately indistinguishable in
/// the response, to avoid username enumeration.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    log::info!("login attempt for username={}", login_data.username);

    let user = User::find_by_username(&pool, &login_data.username).await?;

    let user = match user {
        Some(user) => user,
        None => {
            log::warn!("login failed for username={}", login_data.username);
            return Err(AppError::Unauthorized("Invalid username or password".into()));
        }
    };

    if !verify_password(&login_data.password, &user.password_hash)? {
        log::warn!("login failed for username={}", login_data.username);
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    let token = tokens.issue(&user.username)?;

    log::info!("user logged in: {}", user.username);

    Ok(HttpResponse::Ok().json(AuthResponse {
        id: user.id,
        token,
        username: user.username,
        email: user.email,
    }))
}
