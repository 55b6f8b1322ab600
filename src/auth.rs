use bcrypt::{hash, verify};
use log::{info, warn};
use rusqlite::Connection;
use validator::{Validate, ValidationErrors};

use crate::errors::{AppError, AppResult};
use crate::models::{LoginRequest, LoginResponse, MessageResponse, SignupRequest};
use crate::repository::UserRepository;

/// First message attached to a failed field check.
fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string())
}

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(hash(password, cost)?)
}

/// Checks a password against the stored credential. Rows written before
/// hashing was introduced hold the password itself and are compared as-is.
pub fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    if stored.starts_with("$2") {
        return Ok(verify(password, stored)?);
    }
    warn!("comparing against an unhashed stored password");
    Ok(password == stored)
}

pub fn signup(conn: &Connection, req: &SignupRequest, cost: u32) -> AppResult<MessageResponse> {
    req.validate()
        .map_err(|errors| AppError::validation(validation_message(&errors)))?;
    let email = req.email.as_str();
    if req.password != req.confirm_password {
        return Err(AppError::validation("Passwords do not match"));
    }
    if UserRepository::find_by_email(conn, email)?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let hashed = hash_password(&req.password, cost)?;
    let id = UserRepository::create(conn, email, &hashed)?;
    info!("registered user {}", id);

    Ok(MessageResponse::new("User registered successfully"))
}

pub fn login(conn: &Connection, req: &LoginRequest) -> AppResult<LoginResponse> {
    let email = req.email.trim();
    let user = UserRepository::find_by_email(conn, email)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&req.password, &user.password)? {
        warn!("rejected login for user {}", user.id);
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    info!("user {} logged in", user.id);
    Ok(LoginResponse {
        message: "Login successful".to_string(),
        user_id: user.id,
        email: user.email,
    })
}
