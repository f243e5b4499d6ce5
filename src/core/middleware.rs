use std::sync::Arc;

use http::Extensions;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};
use tokio::sync::OnceCell;
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

// ServiceAccountAuthenticator::builder(..).build() with the default hyper-rustls client.
type AuthType = Authenticator<HttpsConnector<HttpConnector>>;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const FIREBASE_SCOPE: &str = "https://www.googleapis.com/auth/firebase";
pub const IDENTITY_TOOLKIT_SCOPE: &str = "https://www.googleapis.com/auth/identitytoolkit";

/// Attaches a service-account bearer token to every outgoing request.
///
/// The authenticator is built lazily on first use and shared between clones.
#[derive(Clone)]
pub struct AuthMiddleware {
    pub(crate) key: ServiceAccountKey,
    scopes: Arc<Vec<String>>,
    authenticator: Arc<OnceCell<AuthType>>,
}

impl AuthMiddleware {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self::with_scopes(key, &[CLOUD_PLATFORM_SCOPE, FIREBASE_SCOPE])
    }

    pub fn with_scopes(key: ServiceAccountKey, scopes: &[&str]) -> Self {
        Self {
            key,
            scopes: Arc::new(scopes.iter().map(|s| s.to_string()).collect()),
            authenticator: Arc::new(OnceCell::new()),
        }
    }

    pub fn service_account_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn key_project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    /// Exchanges the service-account key for an access token.
    ///
    /// Calling this directly is how the bootstrapper proves the key is valid
    /// and authorized; the token itself is cached by the authenticator.
    pub async fn access_token(&self) -> Result<String, anyhow::Error> {
        let auth = self
            .authenticator
            .get_or_try_init(|| async {
                ServiceAccountAuthenticator::builder(self.key.clone())
                    .build()
                    .await
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
            })
            .await?;

        let token = auth.token(self.scopes.as_slice()).await?;

        Ok(token
            .token()
            .ok_or_else(|| anyhow::anyhow!("No token found"))?
            .to_string())
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let token = self.access_token().await.map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("Failed to get auth token: {}", e))
        })?;

        let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("Invalid auth token: {}", e))
        })?;
        req.headers_mut().insert(header::AUTHORIZATION, value);

        next.run(req, extensions).await
    }
}
