use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, post, web, FromRequest, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Login failed, check your credentials")]
    BadCredentials,
    #[error("You need to log in first")]
    MissingToken,
    #[error("The session token is malformed")]
    MalformedToken,
    #[error("The session token is not valid")]
    InvalidSignature,
    #[error("The session has expired, log in again")]
    Expired,
    #[error("The configured session lifetime is out of range")]
    InvalidLifetime,
}

/// The logged-in user, rebuilt from the bearer token on every request.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    username: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Issues and checks session tokens of the form `<username>.<expiry>.<hex hmac>`.
#[derive(Clone, Debug)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.config.session_secret)
            .unwrap_or_else(|_| unreachable!("hmac keys have no length limit"))
    }

    fn password_mac(&self, password: &str) -> HmacSha256 {
        let mut mac = self.mac();
        mac.update(b"password\n");
        mac.update(password.as_bytes());
        mac
    }

    fn token_mac(&self, username: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.mac();
        mac.update(format!("session\n{username}\n{expires}").as_bytes());
        mac
    }

    /// Checks the credentials and opens a session that lasts the configured TTL.
    pub fn login(&self, username: &str, password: &str) -> Result<(Session, String), AuthError> {
        let expected = self.password_mac(&self.config.password).finalize().into_bytes();
        let password_ok = self.password_mac(password).verify_slice(&expected).is_ok();
        if username != self.config.username || !password_ok {
            return Err(AuthError::BadCredentials);
        }
        let expires_at = Duration::try_hours(self.config.session_ttl_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or(AuthError::InvalidLifetime)?;
        let session = Session {
            username: username.to_string(),
            expires_at,
        };
        let token = self.issue(&session);
        Ok((session, token))
    }

    pub fn issue(&self, session: &Session) -> String {
        let expires = session.expires_at.timestamp();
        let signature = self
            .token_mac(&session.username, expires)
            .finalize()
            .into_bytes();
        format!("{}.{}.{}", session.username, expires, hex::encode(signature))
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        // Usernames may contain dots, so split from the right
        let mut parts = token.rsplitn(3, '.');
        let (Some(signature), Some(expires), Some(username)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedToken);
        };
        let signature = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;
        let expires: i64 = expires.parse().map_err(|_| AuthError::MalformedToken)?;

        self.token_mac(username, expires)
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let expires_at = Utc
            .timestamp_opt(expires, 0)
            .single()
            .ok_or(AuthError::MalformedToken)?;
        if expires_at <= Utc::now() {
            return Err(AuthError::Expired);
        }
        Ok(Session {
            username: username.to_string(),
            expires_at,
        })
    }
}

fn session_from_request(request: &HttpRequest) -> Result<Session, ApiError> {
    let authenticator = &request
        .app_data::<web::Data<AppState>>()
        .ok_or(AuthError::MissingToken)?
        .auth;
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?;
    let token = authorization
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedToken)?;
    authenticator.verify(token.trim()).map_err(|err| {
        warn!(error = %err, "rejected session token");
        ApiError::from(err)
    })
}

impl FromRequest for Session {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(request: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(session_from_request(request))
    }
}

#[derive(Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    json: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let credentials = json.into_inner();
    match state.auth.login(&credentials.username, &credentials.password) {
        Ok((session, token)) => {
            info!(user = %session.username(), "logged in");
            Ok(HttpResponse::Ok().json(LoginResponse {
                username: session.username().to_string(),
                token,
                expires_at: session.expires_at(),
            }))
        }
        Err(err) => {
            warn!(user = %credentials.username, "login refused");
            Err(err.into())
        }
    }
}
