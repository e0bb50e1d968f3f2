//! Client for the authentication service endpoints. This is the only place
//! that talks to `/auth/*`; it attaches the bearer credential per request and
//! must never log request bodies or token material.

use crate::{
    api,
    config::AppConfig,
    errors::AppError,
    session::{
        storage::Credential,
        types::{Identity, LoginRequest, RegisterRequest},
    },
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";

/// Credential and identity handed back by a successful login or register.
#[derive(Clone, Debug)]
pub struct AuthSuccess {
    pub credential: Credential,
    pub identity: Identity,
}

/// Outcome of resolving a persisted credential against `/auth/me`.
#[derive(Clone, Debug)]
pub enum WhoAmI {
    Success(Identity),
    /// The service explicitly refused the credential (HTTP 401).
    Rejected,
    /// Anything else: transport failure, timeout, 5xx, undecodable body.
    NetworkError(AppError),
}

/// Remote authentication collaborator consumed by the session store.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthSuccess, AppError>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthSuccess, AppError>;

    async fn who_am_i(&self, credential: &Credential) -> WhoAmI;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: String,
    user: Identity,
}

impl TryFrom<AuthResponse> for AuthSuccess {
    type Error = AppError;

    fn try_from(response: AuthResponse) -> Result<Self, Self::Error> {
        let credential = Credential::new(response.access_token).ok_or_else(|| {
            AppError::Parse("Auth service returned an empty access token.".to_string())
        })?;
        Ok(Self {
            credential,
            identity: response.user,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: Identity },
    Bare(Identity),
}

impl From<MeResponse> for Identity {
    fn from(response: MeResponse) -> Self {
        match response {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

/// `AuthService` over HTTP with reqwest.
#[derive(Clone, Debug)]
pub struct HttpAuthService {
    client: Client,
    base_url: Url,
}

impl HttpAuthService {
    /// Builds a client for the configured base URL and timeout.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be created.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: api::build_client(config.timeout)?,
            base_url: config.api_base_url.clone(),
        })
    }

    async fn post_auth<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthSuccess, AppError> {
        let url = api::build_url(&self.base_url, path)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| api::map_request_error(&err))?;

        let payload: AuthResponse = api::handle_json_response(response).await?;
        AuthSuccess::try_from(payload)
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    #[instrument(skip_all, fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<AuthSuccess, AppError> {
        self.post_auth(LOGIN_PATH, request).await
    }

    #[instrument(skip_all, fields(email = %request.email))]
    async fn register(&self, request: &RegisterRequest) -> Result<AuthSuccess, AppError> {
        self.post_auth(REGISTER_PATH, request).await
    }

    #[instrument(skip_all)]
    async fn who_am_i(&self, credential: &Credential) -> WhoAmI {
        let url = match api::build_url(&self.base_url, ME_PATH) {
            Ok(url) => url,
            Err(err) => return WhoAmI::NetworkError(err),
        };

        let response = match self
            .client
            .get(url)
            .bearer_auth(credential.secret().expose_secret())
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return WhoAmI::NetworkError(api::map_request_error(&err)),
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("auth service rejected the stored credential");
            return WhoAmI::Rejected;
        }

        match api::handle_json_response::<MeResponse>(response).await {
            Ok(me) => WhoAmI::Success(me.into()),
            Err(err) => WhoAmI::NetworkError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::Role;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json(role: &str) -> serde_json::Value {
        json!({
            "id": "u-1",
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": "grace@aula.dev",
            "role": role
        })
    }

    fn service_for(server: &MockServer) -> HttpAuthService {
        let config = AppConfig::new(&server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        HttpAuthService::new(&config).unwrap()
    }

    #[tokio::test]
    async fn login_posts_credentials_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({
                "email": "grace@aula.dev",
                "password": "cobol"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok-123",
                "user": user_json("instructor")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let success = service
            .login(&LoginRequest {
                email: "grace@aula.dev".to_string(),
                password: "cobol".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(success.credential.secret().expose_secret(), "tok-123");
        assert_eq!(success.identity.role, Role::Instructor);
    }

    #[tokio::test]
    async fn login_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let err = service_for(&server)
            .login(&LoginRequest {
                email: "grace@aula.dev".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::Http {
                status: 401,
                message: "Invalid credentials".to_string()
            }
        );
    }

    #[tokio::test]
    async fn empty_access_token_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "accessToken": "",
                "user": user_json("student")
            })))
            .mount(&server)
            .await;

        let err = service_for(&server)
            .register(&RegisterRequest {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: "grace@aula.dev".to_string(),
                password: "cobol".to_string(),
                role: Some(Role::Student),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn who_am_i_sends_bearer_and_accepts_wrapped_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("Authorization", "Bearer tok-123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"user": user_json("admin")})),
            )
            .mount(&server)
            .await;

        let credential = Credential::new("tok-123").unwrap();
        match service_for(&server).who_am_i(&credential).await {
            WhoAmI::Success(identity) => assert_eq!(identity.role, Role::Admin),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn who_am_i_accepts_bare_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("mentor")))
            .mount(&server)
            .await;

        let credential = Credential::new("tok").unwrap();
        assert!(matches!(
            service_for(&server).who_am_i(&credential).await,
            WhoAmI::Success(identity) if identity.role == Role::Mentor
        ));
    }

    #[tokio::test]
    async fn who_am_i_maps_401_to_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let credential = Credential::new("expired").unwrap();
        assert!(matches!(
            service_for(&server).who_am_i(&credential).await,
            WhoAmI::Rejected
        ));
    }

    #[tokio::test]
    async fn who_am_i_treats_other_statuses_as_network_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "nope"})))
            .mount(&server)
            .await;

        let credential = Credential::new("tok").unwrap();
        assert!(matches!(
            service_for(&server).who_am_i(&credential).await,
            WhoAmI::NetworkError(AppError::Http { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn who_am_i_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(user_json("student"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let credential = Credential::new("tok").unwrap();
        assert!(matches!(
            service_for(&server).who_am_i(&credential).await,
            WhoAmI::NetworkError(AppError::Timeout(_))
        ));
    }
}
