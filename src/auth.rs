use std::sync::OnceLock;

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{error, info};
use mongodb::bson::doc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{ServiceError, StoreError};
use crate::models::User;
use crate::repos::{from_doc, to_doc, UserRepo};
use crate::store::DocumentStore;

const CREDENTIALS: &str = "credentials";
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Login secret record, keyed by the same id as the `users/{id}` profile
/// document. Stays private to this module; profile data lives on
/// [`User`].
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct Credential {
    #[serde(default)]
    id: String,
    email: String,
    password_hash: String,
}

#[derive(Deserialize)]
pub struct SignupInfo {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginInfo {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

// JWT Creation
pub fn create_jwt(user_id: &str, secret: &str) -> String {
    let expiration = Utc::now() + Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .unwrap()
}

// JWT Validation
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Account lifecycle: signup, login, password change, deletion.
///
/// Sign-out has no endpoint; the JWT is stateless and the client simply
/// drops it.
#[derive(Clone)]
pub struct AuthService<S: DocumentStore> {
    store: S,
    users: UserRepo<S>,
    jwt_secret: String,
}

impl<S: DocumentStore> AuthService<S> {
    pub fn new(store: S, jwt_secret: String) -> Self {
        AuthService {
            users: UserRepo::new(store.clone()),
            store,
            jwt_secret,
        }
    }

    /// Registers a new account: one credential record and one profile
    /// document sharing the same id. Returns the id.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::invalid("Name cannot be empty"));
        }
        if !email_regex().is_match(email) {
            return Err(ServiceError::invalid("Invalid email address"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ServiceError::invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.credential_by_email(email).await?.is_some() {
            return Err(ServiceError::invalid("Email is already registered"));
        }

        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|_| ServiceError::Internal("Error hashing password".to_string()))?;

        let id = Uuid::new_v4().to_string();
        let credential = Credential {
            id: id.clone(),
            email: email.to_string(),
            password_hash,
        };
        self.store.insert(CREDENTIALS, &id, to_doc(&credential)?).await?;

        let profile = User {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
        };
        self.users.create(profile).await?;

        info!("registered user {}", id);
        Ok(id)
    }

    /// Verifies the password and mints a 24h token. Returns the token
    /// and the user id.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, String), ServiceError> {
        let credential = match self.credential_by_email(email).await? {
            Some(c) => c,
            None => return Err(ServiceError::forbidden("User not found")),
        };
        if !verify(password, &credential.password_hash).unwrap_or(false) {
            return Err(ServiceError::forbidden("Invalid credentials"));
        }
        let token = create_jwt(&credential.id, &self.jwt_secret);
        Ok((token, credential.id))
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new: &str,
    ) -> Result<(), ServiceError> {
        if new.len() < MIN_PASSWORD_LEN {
            return Err(ServiceError::invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let doc = self
            .store
            .fetch(CREDENTIALS, user_id)
            .await?
            .ok_or_else(|| StoreError::not_found(CREDENTIALS, user_id))?;
        let mut credential: Credential = from_doc(doc)?;

        if !verify(current, &credential.password_hash).unwrap_or(false) {
            return Err(ServiceError::forbidden("Current password is incorrect"));
        }

        credential.password_hash = hash(new, DEFAULT_COST)
            .map_err(|_| ServiceError::Internal("Error hashing password".to_string()))?;
        self.store
            .replace(CREDENTIALS, user_id, to_doc(&credential)?)
            .await?;
        Ok(())
    }

    /// Removes the credential and the profile. Tasks, groups and
    /// notifications the user touched stay behind.
    pub async fn delete_account(&self, user_id: &str) -> Result<(), ServiceError> {
        self.store.delete(CREDENTIALS, user_id).await?;
        self.users.delete(user_id).await?;
        info!("deleted account {}", user_id);
        Ok(())
    }

    async fn credential_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let mut docs = self
            .store
            .find(CREDENTIALS, doc! { "email": email }, None)
            .await?;
        match docs.pop() {
            Some(doc) => Ok(Some(from_doc(doc)?)),
            None => Ok(None),
        }
    }
}

// Signup Endpoint
pub async fn signup(
    data: web::Data<AppState>,
    signup_info: web::Json<SignupInfo>,
) -> impl Responder {
    match data
        .auth
        .signup(&signup_info.name, &signup_info.email, &signup_info.password)
        .await
    {
        Ok(user_id) => HttpResponse::Ok()
            .json(serde_json::json!({ "status": "User created", "userId": user_id })),
        Err(e) => e.http_response(),
    }
}

// Login Endpoint
pub async fn login(data: web::Data<AppState>, login_info: web::Json<LoginInfo>) -> impl Responder {
    match data.auth.login(&login_info.email, &login_info.password).await {
        Ok((token, user_id)) => {
            HttpResponse::Ok().json(serde_json::json!({ "token": token, "userId": user_id }))
        }
        Err(e) => e.http_response(),
    }
}

// Change Password Endpoint
pub async fn change_password(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    let current_user = if let Some(id) = req.extensions().get::<String>() {
        id.clone()
    } else {
        error!("Unauthorized: No authenticated user found in change_password");
        return HttpResponse::Unauthorized().body("Unauthorized");
    };

    match data
        .auth
        .change_password(&current_user, &payload.current_password, &payload.new_password)
        .await
    {
        Ok(()) => HttpResponse::Ok().body("Password updated successfully"),
        Err(e) => e.http_response(),
    }
}

// Delete Account Endpoint
pub async fn delete_account(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let current_user = if let Some(id) = req.extensions().get::<String>() {
        id.clone()
    } else {
        error!("Unauthorized: No authenticated user found in delete_account");
        return HttpResponse::Unauthorized().body("Unauthorized");
    };

    match data.auth.delete_account(&current_user).await {
        Ok(()) => HttpResponse::Ok().body("Account deleted"),
        Err(e) => e.http_response(),
    }
}
