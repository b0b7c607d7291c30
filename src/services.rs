//! Session Services
//!
//! The collaborators an extension session talks to. A `Services` value is built
//! once per invocation and owned by the session; completing the request drops
//! it, so nothing carries over into the next invocation.

use crate::error::Result;
use crate::extension::lock::LockType;
use crate::settings::{keys, SettingsStore};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Lock timeout used when the main app never stored one
const DEFAULT_LOCK_SECONDS: i64 = 15 * 60;
const LOCK_SECONDS_KEY: &str = "lockSeconds";

pub trait AuthService: Send + Sync {
    /// Whether the user is logged in to the main app
    fn is_authenticated(&self) -> bool;
}

pub trait LockService: Send + Sync {
    fn lock_type(&self, force_lock: bool) -> LockType;
}

pub trait AnalyticsService: Send + Sync {
    fn track_extension_event(&self, name: &str, label: Option<&str>);

    /// Flush queued events
    fn dispatch(&self);
}

/// Everything a session resolves for one invocation
pub struct Services {
    pub settings: Arc<SettingsStore>,
    pub auth: Box<dyn AuthService>,
    pub lock: Box<dyn LockService>,
    pub analytics: Arc<dyn AnalyticsService>,
}

impl Services {
    /// Build the default, settings-backed services
    pub fn from_settings(settings: Arc<SettingsStore>) -> Result<Self> {
        let app_id = settings.app_id()?;
        Ok(Self {
            auth: Box::new(SettingsAuthService::new(Arc::clone(&settings))),
            lock: Box::new(SettingsLockService::new(Arc::clone(&settings))),
            analytics: Arc::new(TracingAnalytics::new(app_id)),
            settings,
        })
    }
}

/// Reads the login flag the main app writes to the shared settings
pub struct SettingsAuthService {
    settings: Arc<SettingsStore>,
}

impl SettingsAuthService {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

impl AuthService for SettingsAuthService {
    fn is_authenticated(&self) -> bool {
        self.settings
            .get::<bool>(keys::IS_AUTHENTICATED)
            .unwrap_or(false)
    }
}

/// Applies the main app's lock type unless the last activity is recent enough
pub struct SettingsLockService {
    settings: Arc<SettingsStore>,
}

impl SettingsLockService {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

impl LockService for SettingsLockService {
    fn lock_type(&self, force_lock: bool) -> LockType {
        let configured = self
            .settings
            .get::<LockType>(keys::LOCK_TYPE)
            .unwrap_or_default();
        if configured == LockType::None || force_lock {
            return configured;
        }

        let lock_seconds = self
            .settings
            .get::<i64>(LOCK_SECONDS_KEY)
            .unwrap_or(DEFAULT_LOCK_SECONDS);
        if lock_seconds < 0 {
            debug!("Lock disabled by timeout setting");
            return LockType::None;
        }

        match self.settings.last_activity() {
            Some(last) if (Utc::now() - last).num_seconds() < lock_seconds => {
                debug!("Recent activity, skipping lock");
                LockType::None
            }
            _ => configured,
        }
    }
}

/// A tracked analytics event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub label: Option<String>,
}

/// Records extension events as log lines and keeps them for inspection
pub struct TracingAnalytics {
    app_id: Uuid,
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl TracingAnalytics {
    pub fn new(app_id: Uuid) -> Self {
        Self {
            app_id,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AnalyticsService for TracingAnalytics {
    fn track_extension_event(&self, name: &str, label: Option<&str>) {
        info!(app_id = %self.app_id, event = name, label = label.unwrap_or(""), "extension event");
        if let Ok(mut events) = self.events.lock() {
            events.push(AnalyticsEvent {
                name: name.to_string(),
                label: label.map(str::to_string),
            });
        }
    }

    fn dispatch(&self) {
        let count = self.events.lock().map(|e| e.len()).unwrap_or(0);
        debug!("Dispatching {} analytics events", count);
    }
}
