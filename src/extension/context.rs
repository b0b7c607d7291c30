//! Extension request context
//!
//! One `Context` lives for the duration of a single extension invocation. The
//! matcher that recognises the host's request fills it exactly once.

use crate::extension::types::{PageDetails, PasswordGenerationOptions, ProviderType};
use secrecy::SecretString;
use tracing::{debug, warn};
use url::Url;

/// Fields extracted from a matched attachment
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    pub url: Option<Url>,
    pub login_title: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub old_password: Option<SecretString>,
    pub notes: Option<String>,
    pub details: Option<PageDetails>,
    pub password_options: Option<PasswordGenerationOptions>,
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    provider_type: Option<ProviderType>,
    request: ProviderRequest,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider_type(&self) -> Option<ProviderType> {
        self.provider_type
    }

    /// True until a matcher has populated the context
    pub fn is_empty(&self) -> bool {
        self.provider_type.is_none()
    }

    /// Record the winning provider and its fields.
    ///
    /// Returns `false` and leaves the context untouched if a provider was
    /// already recorded for this invocation.
    pub fn populate(&mut self, provider_type: ProviderType, request: ProviderRequest) -> bool {
        if let Some(existing) = self.provider_type {
            warn!(
                "Ignoring {} request, context already holds {}",
                provider_type, existing
            );
            return false;
        }

        debug!(
            "Context populated: provider={}, url={:?}, title={:?}, has_username={}, has_password={}, has_old_password={}, has_notes={}, has_details={}, password_options={:?}",
            provider_type,
            request.url.as_ref().map(Url::as_str),
            request.login_title,
            request.username.is_some(),
            request.password.is_some(),
            request.old_password.is_some(),
            request.notes.is_some(),
            request.details.is_some(),
            request.password_options,
        );

        self.provider_type = Some(provider_type);
        self.request = request;
        true
    }

    /// Store the credentials the user confirmed on a downstream screen
    pub fn set_confirmed_credentials(&mut self, username: Option<String>, password: SecretString) {
        self.request.username = username;
        self.request.password = Some(password);
    }

    pub fn url(&self) -> Option<&Url> {
        self.request.url.as_ref()
    }

    pub fn login_title(&self) -> Option<&str> {
        self.request.login_title.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.request.username.as_deref()
    }

    pub fn password(&self) -> Option<&SecretString> {
        self.request.password.as_ref()
    }

    pub fn old_password(&self) -> Option<&SecretString> {
        self.request.old_password.as_ref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.request.notes.as_deref()
    }

    pub fn details(&self) -> Option<&PageDetails> {
        self.request.details.as_ref()
    }

    pub fn password_options(&self) -> Option<&PasswordGenerationOptions> {
        self.request.password_options.as_ref()
    }
}
