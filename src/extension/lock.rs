//! Lock Routing
//!
//! Once the main app's login is confirmed, the configured lock type decides
//! whether an unlock screen comes first. Every path ends at a destination picked
//! from the request's provider type.

use crate::extension::context::Context;
use crate::extension::types::{PasswordGenerationOptions, ProviderType};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Re-authentication mechanism configured in the main app
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    #[default]
    None,
    Fingerprint,
    Pin,
    Password,
}

/// Login fields handed to the new-login screen
#[derive(Debug, Clone, Default)]
pub struct LoginDraft {
    pub url: Option<Url>,
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub notes: Option<String>,
    pub password_options: Option<PasswordGenerationOptions>,
}

/// Screens the extension can present
#[derive(Debug, Clone)]
pub enum Destination {
    LoginList {
        provider_type: Option<ProviderType>,
        url: Option<Url>,
    },
    LoginAdd(LoginDraft),
    LockFingerprint,
    LockPin,
    LockPassword,
    Setup,
}

impl Destination {
    pub fn is_lock_screen(&self) -> bool {
        matches!(
            self,
            Destination::LockFingerprint | Destination::LockPin | Destination::LockPassword
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Destination::LoginList { .. } => "loginList",
            Destination::LoginAdd(_) => "newLogin",
            Destination::LockFingerprint => "lockFingerprint",
            Destination::LockPin => "lockPin",
            Destination::LockPassword => "lockPassword",
            Destination::Setup => "setup",
        }
    }
}

/// Outcome of the routing step when the extension appears
#[derive(Debug, Clone)]
pub enum Route {
    /// No active login in the main app; show the alert and end the request
    MustLogIn,
    Present(Destination),
}

/// Unlock screen for a lock type, or `None` when the vault is not locked
pub fn lock_destination(lock_type: LockType) -> Option<Destination> {
    match lock_type {
        LockType::Fingerprint => Some(Destination::LockFingerprint),
        LockType::Pin => Some(Destination::LockPin),
        LockType::Password => Some(Destination::LockPassword),
        LockType::None => None,
    }
}

/// Screen for the request once the vault is accessible
pub fn provider_destination(context: &Context) -> Destination {
    match context.provider_type() {
        Some(ProviderType::SaveLogin) => Destination::LoginAdd(LoginDraft {
            url: context.url().cloned(),
            title: context.login_title().map(str::to_string),
            username: context.username().map(str::to_string),
            password: context.password().cloned(),
            notes: context.notes().map(str::to_string),
            password_options: context.password_options().cloned(),
        }),
        Some(ProviderType::Setup) => Destination::Setup,
        provider_type => Destination::LoginList {
            provider_type,
            url: context.url().cloned(),
        },
    }
}

/// Pick the first screen after the login check
pub fn route(is_authenticated: bool, lock_type: LockType, context: &Context) -> Route {
    if !is_authenticated {
        return Route::MustLogIn;
    }
    Route::Present(lock_destination(lock_type).unwrap_or_else(|| provider_destination(context)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::context::ProviderRequest;

    fn context_for(provider_type: ProviderType) -> Context {
        let mut context = Context::new();
        context.populate(
            provider_type,
            ProviderRequest {
                url: Url::parse("https://example.com").ok(),
                login_title: Some("Example".to_string()),
                ..Default::default()
            },
        );
        context
    }

    #[test]
    fn test_unauthenticated_short_circuits() {
        let context = context_for(ProviderType::SaveLogin);
        assert!(matches!(
            route(false, LockType::Pin, &context),
            Route::MustLogIn
        ));
    }

    #[test]
    fn test_lock_types_present_unlock_screens() {
        let context = Context::new();
        assert!(matches!(
            route(true, LockType::Fingerprint, &context),
            Route::Present(Destination::LockFingerprint)
        ));
        assert!(matches!(
            route(true, LockType::Pin, &context),
            Route::Present(Destination::LockPin)
        ));
        assert!(matches!(
            route(true, LockType::Password, &context),
            Route::Present(Destination::LockPassword)
        ));
    }

    #[test]
    fn test_provider_type_selects_screen() {
        match route(true, LockType::None, &context_for(ProviderType::SaveLogin)) {
            Route::Present(Destination::LoginAdd(draft)) => {
                assert_eq!(draft.title.as_deref(), Some("Example"));
                assert_eq!(draft.url.unwrap().as_str(), "https://example.com/");
            }
            other => panic!("unexpected route {:?}", other),
        }

        assert!(matches!(
            provider_destination(&context_for(ProviderType::Setup)),
            Destination::Setup
        ));
        assert!(matches!(
            provider_destination(&context_for(ProviderType::ChangePassword)),
            Destination::LoginList {
                provider_type: Some(ProviderType::ChangePassword),
                ..
            }
        ));
    }

    #[test]
    fn test_empty_context_goes_to_login_list() {
        assert!(matches!(
            provider_destination(&Context::new()),
            Destination::LoginList {
                provider_type: None,
                url: None
            }
        ));
    }

    #[test]
    fn test_lock_type_serde_names() {
        assert_eq!(serde_json::to_string(&LockType::Pin).unwrap(), "\"pin\"");
        let parsed: LockType = serde_json::from_str("\"fingerprint\"").unwrap();
        assert_eq!(parsed, LockType::Fingerprint);
    }
}
