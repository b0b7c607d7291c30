//! Extension Session
//!
//! Drives one extension invocation: classify the input, gate on login and
//! lock state, then hand the filled credentials back to the host.

use crate::config::ExtensionConfig;
use crate::error::{ExtensionError, Result};
use crate::extension::attachment::{ExtensionHost, ExtensionItem, InputItem};
use crate::extension::completion::build_response;
use crate::extension::constants::events;
use crate::extension::context::Context;
use crate::extension::dispatcher::Dispatcher;
use crate::extension::lock::{self, Destination, Route};
use crate::extension::types::{Payload, ProviderType};
use crate::services::Services;
use secrecy::SecretString;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct ExtensionSession<H: ExtensionHost> {
    id: Uuid,
    config: ExtensionConfig,
    context: Context,
    services: Option<Services>,
    host: H,
}

impl<H: ExtensionHost> ExtensionSession<H> {
    pub fn new(config: ExtensionConfig, services: Services, host: H) -> Self {
        let id = Uuid::new_v4();
        debug!("Extension session {} started", id);
        Self {
            id,
            config,
            context: Context::new(),
            services: Some(services),
            host,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Services for this invocation; unavailable once the request completed
    pub fn services(&self) -> Result<&Services> {
        self.services.as_ref().ok_or(ExtensionError::SessionCompleted)
    }

    pub fn is_completed(&self) -> bool {
        self.services.is_none()
    }

    /// Classify the host's input items into the session context
    pub async fn load(&mut self, items: &[InputItem]) -> Result<Option<ProviderType>> {
        let services = self.services.as_ref().ok_or(ExtensionError::SessionCompleted)?;
        let dispatcher = Dispatcher::new(services.analytics.as_ref(), &self.config);
        Ok(dispatcher.dispatch(items, &mut self.context).await)
    }

    /// Choose the first screen once the extension is visible
    pub fn appear(&mut self) -> Result<Route> {
        let services = self.services()?;
        let is_authenticated = services.auth.is_authenticated();
        let lock_type = services.lock.lock_type(false);
        debug!("Lock type: {:?}", lock_type);

        let route = lock::route(is_authenticated, lock_type, &self.context);
        match &route {
            Route::MustLogIn => warn!("Not logged in to the main app"),
            Route::Present(destination) if destination.is_lock_screen() => {
                debug!("Vault locked, presenting {}", destination.name());
            }
            Route::Present(destination) => {
                record_activity(services);
                debug!("Continuing to {}", destination.name());
            }
        }
        Ok(route)
    }

    /// Called by an unlock screen after the user unlocked
    pub fn dismiss_lock_and_continue(&mut self) -> Result<Destination> {
        record_activity(self.services()?);
        let destination = lock::provider_destination(&self.context);
        debug!("Unlocked, continuing to {}", destination.name());
        Ok(destination)
    }

    /// Called by an unlock screen the user backed out of
    pub fn cancel_unlock(&mut self) -> Result<()> {
        info!("Unlock cancelled, closing extension");
        self.complete_request(None)
    }

    /// Dismiss the must-log-in alert, ending the request without a result
    pub fn acknowledge_must_log_in(&mut self) -> Result<()> {
        self.complete_request(None)
    }

    /// Return the credentials the user picked or confirmed to the host
    pub fn complete_username_password(
        &mut self,
        username: &str,
        password: SecretString,
    ) -> Result<()> {
        let payload = build_response(&self.context, username, &password)?;
        self.context
            .set_confirmed_credentials(Some(username.to_string()), password);
        self.complete_request(payload)
    }

    /// Finish the request without an interactive screen.
    ///
    /// There is no way to unlock here, so a lock screen closes the request
    /// with no result and leaves the last activity stamp alone.
    pub fn complete_unattended(
        &mut self,
        route: Route,
        credentials: Option<(String, SecretString)>,
    ) -> Result<()> {
        match route {
            Route::MustLogIn => {
                error!("{}", ExtensionError::MustLogIn);
                self.acknowledge_must_log_in()
            }
            Route::Present(destination) if destination.is_lock_screen() => {
                warn!("Vault is locked ({}), unlock it in the main app", destination.name());
                self.cancel_unlock()
            }
            Route::Present(Destination::Setup) => {
                info!("Extension setup complete");
                self.complete_request(None)
            }
            Route::Present(destination) => match credentials {
                Some((username, password)) => {
                    info!("Completing from {} screen", destination.name());
                    self.complete_username_password(&username, password)
                }
                None => {
                    warn!("No credentials provided, closing extension");
                    self.complete_request(None)
                }
            },
        }
    }

    /// End the request, releasing this invocation's services first.
    ///
    /// The host is always told the request finished, even when the settings
    /// store cannot be written.
    pub fn complete_request(&mut self, payload: Option<Payload>) -> Result<()> {
        let services = self.services.take().ok_or(ExtensionError::SessionCompleted)?;
        let label = self.context.provider_type().map(|p| p.type_identifier());

        if payload.is_some() {
            record_activity(&services);
            services
                .analytics
                .track_extension_event(events::AUTO_FILLED, label);
        } else {
            services.analytics.track_extension_event(events::CLOSED, label);
        }
        services.analytics.dispatch();
        drop(services);

        info!(
            "Completing extension session {} ({})",
            self.id,
            if payload.is_some() { "filled" } else { "closed" }
        );
        self.host
            .complete_request(vec![ExtensionItem::property_list(payload)])
    }
}

fn record_activity(services: &Services) {
    if let Err(e) = services.settings.touch_last_activity() {
        warn!("Failed to record last activity: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::attachment::StaticAttachment;
    use crate::extension::constants::type_ids;
    use crate::extension::lock::LockType;
    use crate::services::{AnalyticsService, AuthService, LockService, TracingAnalytics};
    use crate::settings::SettingsStore;
    use serde_json::json;
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingHost {
        completed: RefCell<Vec<Vec<ExtensionItem>>>,
    }

    impl ExtensionHost for RecordingHost {
        fn complete_request(&self, items: Vec<ExtensionItem>) -> Result<()> {
            self.completed.borrow_mut().push(items);
            Ok(())
        }
    }

    struct FixedAuth(bool);

    impl AuthService for FixedAuth {
        fn is_authenticated(&self) -> bool {
            self.0
        }
    }

    struct FixedLock(LockType);

    impl LockService for FixedLock {
        fn lock_type(&self, _force_lock: bool) -> LockType {
            self.0
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        settings: Arc<SettingsStore>,
        analytics: Arc<TracingAnalytics>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let settings = Arc::new(SettingsStore::open(dir.path()).unwrap());
            Self {
                dir,
                settings,
                analytics: Arc::new(TracingAnalytics::new(Uuid::new_v4())),
            }
        }

        fn session(&self, authenticated: bool, lock_type: LockType) -> ExtensionSession<RecordingHost> {
            let analytics: Arc<dyn AnalyticsService> = self.analytics.clone();
            let services = Services {
                settings: Arc::clone(&self.settings),
                auth: Box::new(FixedAuth(authenticated)),
                lock: Box::new(FixedLock(lock_type)),
                analytics,
            };
            ExtensionSession::new(ExtensionConfig::default(), services, RecordingHost::default())
        }
    }

    fn find_login_items() -> Vec<InputItem> {
        vec![InputItem::single(StaticAttachment::new(
            type_ids::FIND_LOGIN_ACTION,
            Some(json!({ "url_string": "https://example.com/" })),
        ))]
    }

    #[tokio::test]
    async fn test_find_login_round_trip() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::None);

        let provider = session.load(&find_login_items()).await.unwrap();
        assert_eq!(provider, Some(ProviderType::FindLogin));

        match session.appear().unwrap() {
            Route::Present(Destination::LoginList { url, .. }) => {
                assert_eq!(url.unwrap().as_str(), "https://example.com/");
            }
            other => panic!("unexpected route {:?}", other),
        }
        assert!(fixture.settings.last_activity().is_some());

        session
            .complete_username_password("alice", SecretString::from("pw"))
            .unwrap();

        let completed = session.host().completed.borrow();
        assert_eq!(completed.len(), 1);
        let payload = completed[0][0].payload().unwrap();
        assert_eq!(payload["username"], json!("alice"));

        let names: Vec<String> = fixture.analytics.events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["ProcessItemProvider", "AutoFilled"]);
    }

    #[tokio::test]
    async fn test_services_released_after_completion() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::None);
        session.complete_request(None).unwrap();

        assert!(session.is_completed());
        assert!(matches!(session.services(), Err(ExtensionError::SessionCompleted)));
        assert!(matches!(session.appear(), Err(ExtensionError::SessionCompleted)));
        assert!(matches!(
            session.load(&find_login_items()).await,
            Err(ExtensionError::SessionCompleted)
        ));
        assert!(matches!(
            session.complete_request(None),
            Err(ExtensionError::SessionCompleted)
        ));
        assert_eq!(session.host().completed.borrow().len(), 1);
    }

    #[test]
    fn test_must_log_in_closes_request() {
        let fixture = Fixture::new();
        let mut session = fixture.session(false, LockType::Pin);

        assert!(matches!(session.appear().unwrap(), Route::MustLogIn));
        session.acknowledge_must_log_in().unwrap();

        let completed = session.host().completed.borrow();
        assert!(completed[0][0].payload().is_none());
        assert_eq!(fixture.analytics.events()[0].name, "Closed");
        assert!(fixture.settings.last_activity().is_none());
    }

    #[tokio::test]
    async fn test_lock_screen_then_continue() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::Fingerprint);
        session
            .load(&[InputItem::single(StaticAttachment::new(
                type_ids::EXTENSION_SETUP,
                None,
            ))])
            .await
            .unwrap();

        assert!(matches!(
            session.appear().unwrap(),
            Route::Present(Destination::LockFingerprint)
        ));
        assert!(fixture.settings.last_activity().is_none());

        assert!(matches!(
            session.dismiss_lock_and_continue().unwrap(),
            Destination::Setup
        ));
        assert!(fixture.settings.last_activity().is_some());
    }

    #[tokio::test]
    async fn test_unwritable_settings_still_complete_request() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::None);
        session.load(&find_login_items()).await.unwrap();
        assert!(matches!(session.appear().unwrap(), Route::Present(_)));

        std::fs::remove_dir_all(fixture.dir.path()).unwrap();
        session
            .complete_username_password("alice", SecretString::from("pw"))
            .unwrap();

        assert!(session.is_completed());
        let completed = session.host().completed.borrow();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0][0].payload().unwrap()["username"], json!("alice"));
    }

    #[tokio::test]
    async fn test_unwritable_settings_still_route() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::None);
        session.load(&find_login_items()).await.unwrap();
        std::fs::remove_dir_all(fixture.dir.path()).unwrap();

        assert!(matches!(
            session.appear().unwrap(),
            Route::Present(Destination::LoginList {
                provider_type: Some(ProviderType::FindLogin),
                ..
            })
        ));
        assert!(session.dismiss_lock_and_continue().is_ok());
    }

    #[tokio::test]
    async fn test_locked_vault_closes_unattended_request() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::Pin);
        session.load(&find_login_items()).await.unwrap();

        let route = session.appear().unwrap();
        assert!(matches!(route, Route::Present(Destination::LockPin)));
        session
            .complete_unattended(route, Some(("alice".to_string(), SecretString::from("pw"))))
            .unwrap();

        let completed = session.host().completed.borrow();
        assert_eq!(completed.len(), 1);
        assert!(completed[0][0].payload().is_none());
        assert!(fixture.settings.last_activity().is_none());
        let names: Vec<String> = fixture.analytics.events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["ProcessItemProvider", "Closed"]);
    }

    #[tokio::test]
    async fn test_unlocked_vault_fills_unattended_request() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::None);
        session.load(&find_login_items()).await.unwrap();

        let route = session.appear().unwrap();
        session
            .complete_unattended(route, Some(("alice".to_string(), SecretString::from("pw"))))
            .unwrap();

        let completed = session.host().completed.borrow();
        assert_eq!(completed[0][0].payload().unwrap()["password"], json!("pw"));
    }

    #[test]
    fn test_cancel_unlock_closes_request() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true, LockType::Password);

        assert!(matches!(
            session.appear().unwrap(),
            Route::Present(Destination::LockPassword)
        ));
        session.cancel_unlock().unwrap();

        assert!(session.is_completed());
        assert!(session.host().completed.borrow()[0][0].payload().is_none());
        assert!(fixture.settings.last_activity().is_none());
    }
}
