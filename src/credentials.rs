use std::fmt;

use serde::Deserialize;
use tokio::runtime::{Builder, Runtime};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::error::{Result, ToolError};

/// OAuth2 scope granting read and write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Secrets for both ends of an import. Never logged.
#[derive(Clone)]
pub struct Credentials {
    jira_token: String,
    google: GoogleCredential,
}

impl Credentials {
    /// Validates the JIRA personal access token and classifies the Google
    /// credential.
    pub fn resolve(jira_pat: Option<&str>, google_credentials: Option<&str>) -> Result<Self> {
        let jira_token = non_empty(jira_pat)
            .ok_or(ToolError::MissingCredential("JIRA personal access token"))?;
        let google_credentials = non_empty(google_credentials)
            .ok_or(ToolError::MissingCredential("Google credentials"))?;

        Ok(Self {
            jira_token: jira_token.to_string(),
            google: GoogleCredential::parse(google_credentials)?,
        })
    }

    pub fn jira_token(&self) -> &str {
        &self.jira_token
    }

    pub fn google(&self) -> &GoogleCredential {
        &self.google
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("jira_token", &"<redacted>")
            .field("google", &self.google)
            .finish()
    }
}

/// The credential handed to the spreadsheet API.
#[derive(Clone)]
pub enum GoogleCredential {
    /// An OAuth2 access token, used as is.
    AccessToken(String),
    /// A service-account key; access tokens are requested from its
    /// `token_uri` and refreshed when they expire.
    ServiceAccount(ServiceAccountKey),
}

#[derive(Deserialize)]
struct CredentialDocument {
    #[serde(default, alias = "token")]
    access_token: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl GoogleCredential {
    /// Accepts a service-account key file, a JSON document carrying an
    /// `access_token` (or `token`), or a bare access token.
    pub fn parse(credential: &str) -> Result<Self> {
        let credential = credential.trim();
        if !credential.starts_with('{') {
            return Ok(Self::AccessToken(credential.to_string()));
        }

        let document: CredentialDocument = serde_json::from_str(credential)
            .map_err(|err| ToolError::InvalidCredential(format!("credential JSON: {err}")))?;
        if document.kind.as_deref() == Some("service_account") {
            let key = yup_oauth2::parse_service_account_key(credential).map_err(|err| {
                ToolError::InvalidCredential(format!("service account key: {err}"))
            })?;
            return Ok(Self::ServiceAccount(key));
        }

        match document.access_token {
            Some(token) if !token.trim().is_empty() => {
                Ok(Self::AccessToken(token.trim().to_string()))
            }
            _ => Err(ToolError::InvalidCredential(match document.kind {
                Some(kind) => format!("unsupported '{kind}' credentials"),
                None => "credential JSON has no access_token".to_string(),
            })),
        }
    }

    /// Builds the token source used by the live Sheets client.
    pub fn token_provider(&self) -> Result<Box<dyn TokenProvider>> {
        self.token_provider_with(|key| Ok(Box::new(ServiceAccountTokens::new(key)?)))
    }

    /// Like [`token_provider`](Self::token_provider), with service-account keys
    /// handed to `authenticate` instead of the OAuth2 token endpoint.
    pub fn token_provider_with<F>(&self, authenticate: F) -> Result<Box<dyn TokenProvider>>
    where
        F: FnOnce(ServiceAccountKey) -> Result<Box<dyn TokenProvider>>,
    {
        match self {
            Self::AccessToken(token) => Ok(Box::new(StaticToken::new(token.clone()))),
            Self::ServiceAccount(key) => authenticate(key.clone()),
        }
    }
}

impl fmt::Debug for GoogleCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Self::ServiceAccount(key) => f
                .debug_struct("ServiceAccount")
                .field("client_email", &key.client_email)
                .finish_non_exhaustive(),
        }
    }
}

/// Supplies the bearer token for each spreadsheet API request.
pub trait TokenProvider {
    fn access_token(&mut self) -> Result<String>;
}

/// A token fixed for the lifetime of the run.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&mut self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Exchanges a service-account key for access tokens. Tokens are cached by
/// the authenticator and only requested again shortly before they expire.
pub struct ServiceAccountTokens {
    runtime: Runtime,
    authenticator: DefaultAuthenticator,
}

impl ServiceAccountTokens {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let authenticator = runtime
            .block_on(ServiceAccountAuthenticator::builder(key).build())
            .map_err(|err| ToolError::InvalidCredential(format!("service account key: {err}")))?;
        Ok(Self {
            runtime,
            authenticator,
        })
    }
}

impl TokenProvider for ServiceAccountTokens {
    fn access_token(&mut self) -> Result<String> {
        let token = self
            .runtime
            .block_on(self.authenticator.token(&[SHEETS_SCOPE]))?;
        token.token().map(str::to_string).ok_or_else(|| {
            ToolError::InvalidCredential("token response carried no access token".to_string())
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
