//! Input Dispatch
//!
//! Classifies the host's input items. Each attachment is tested against the
//! provider matchers in a fixed priority order; the first conforming matcher
//! loads the payload and fills the context. Loads happen one at a time.

use crate::config::ExtensionConfig;
use crate::extension::attachment::{Attachment, InputItem};
use crate::extension::constants::{events, keys};
use crate::extension::context::{Context, ProviderRequest};
use crate::extension::types::{deserialize_dictionary, deserialize_string, Payload, ProviderType};
use crate::services::AnalyticsService;
use secrecy::SecretString;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Matchers in the order they are tried against every attachment
pub const MATCHER_ORDER: [ProviderType; 7] = [
    ProviderType::WebPage,
    ProviderType::FindLogin,
    ProviderType::FillBrowser,
    ProviderType::FillWebView,
    ProviderType::SaveLogin,
    ProviderType::ChangePassword,
    ProviderType::Setup,
];

/// What happened when one matcher met one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The attachment does not carry the matcher's type
    NotConforming,
    /// The matcher declined the payload; later matchers may try this attachment
    Fallthrough,
    /// The attachment conformed but produced nothing usable
    Handled,
    /// The context was populated
    Matched,
}

enum Extraction {
    Request(ProviderRequest),
    Fallthrough,
}

pub struct Dispatcher<'a> {
    analytics: &'a dyn AnalyticsService,
    load_timeout: Duration,
    allow_web_url_fallback: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(analytics: &'a dyn AnalyticsService, config: &ExtensionConfig) -> Self {
        Self {
            analytics,
            load_timeout: config.load_timeout(),
            allow_web_url_fallback: config.allow_web_url_fallback,
        }
    }

    /// Populate `context` from the first recognised attachment.
    ///
    /// Returns the winning provider type, or `None` when nothing matched and
    /// the context is left empty.
    pub async fn dispatch(&self, items: &[InputItem], context: &mut Context) -> Option<ProviderType> {
        for (item_index, item) in items.iter().enumerate() {
            'attachments: for attachment in &item.attachments {
                for provider_type in MATCHER_ORDER {
                    match self.try_match(attachment.as_ref(), provider_type, context).await {
                        MatchOutcome::NotConforming | MatchOutcome::Fallthrough => continue,
                        MatchOutcome::Handled => {
                            debug!(
                                "Input item {} handled by {} without a usable payload",
                                item_index, provider_type
                            );
                            break 'attachments;
                        }
                        MatchOutcome::Matched => {
                            info!("Extension request classified as {}", provider_type);
                            return Some(provider_type);
                        }
                    }
                }
            }
        }

        debug!("No provider matched {} input items", items.len());
        None
    }

    /// Apply one matcher to one attachment
    pub async fn try_match(
        &self,
        attachment: &dyn Attachment,
        provider_type: ProviderType,
        context: &mut Context,
    ) -> MatchOutcome {
        let type_identifier = provider_type.type_identifier();
        if !attachment.has_item_conforming_to(type_identifier) {
            return MatchOutcome::NotConforming;
        }

        // Conformance alone identifies the setup request.
        if provider_type == ProviderType::Setup {
            return self.record(provider_type, ProviderRequest::default(), context);
        }

        let Some(dict) = self.load_payload(attachment, type_identifier).await else {
            return MatchOutcome::Handled;
        };

        match self.extract(provider_type, &dict) {
            Extraction::Request(request) => self.record(provider_type, request, context),
            Extraction::Fallthrough => MatchOutcome::Fallthrough,
        }
    }

    fn record(
        &self,
        provider_type: ProviderType,
        request: ProviderRequest,
        context: &mut Context,
    ) -> MatchOutcome {
        if !context.populate(provider_type, request) {
            return MatchOutcome::Handled;
        }
        self.analytics.track_extension_event(
            events::PROCESS_ITEM_PROVIDER,
            Some(provider_type.type_identifier()),
        );
        MatchOutcome::Matched
    }

    async fn load_payload(&self, attachment: &dyn Attachment, type_identifier: &str) -> Option<Payload> {
        let receiver = attachment.load_item(type_identifier);
        let result = match tokio::time::timeout(self.load_timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                warn!("Host dropped the load callback for {}", type_identifier);
                return None;
            }
            Err(_) => {
                warn!(
                    "Timed out after {:?} loading {}",
                    self.load_timeout, type_identifier
                );
                return None;
            }
        };

        match result {
            Ok(Some(Value::Object(dict))) => Some(dict),
            Ok(Some(other)) => {
                debug!("Payload for {} is not a dictionary: {}", type_identifier, other);
                None
            }
            Ok(None) => {
                debug!("Empty payload for {}", type_identifier);
                None
            }
            Err(e) => {
                debug!("Payload load failed: {}", e);
                None
            }
        }
    }

    fn extract(&self, provider_type: ProviderType, dict: &Payload) -> Extraction {
        match provider_type {
            ProviderType::WebPage => self.extract_web_page(dict),
            ProviderType::FindLogin => {
                log_version(dict);
                Extraction::Request(ProviderRequest {
                    url: url_value(dict, keys::URL_STRING),
                    ..Default::default()
                })
            }
            ProviderType::FillBrowser | ProviderType::FillWebView => {
                log_version(dict);
                Extraction::Request(ProviderRequest {
                    url: url_value(dict, keys::URL_STRING),
                    details: deserialize_dictionary(dict.get(keys::WEB_VIEW_PAGE_DETAILS)),
                    ..Default::default()
                })
            }
            ProviderType::SaveLogin => Extraction::Request(login_request(dict)),
            ProviderType::ChangePassword => Extraction::Request(ProviderRequest {
                old_password: secret_value(dict, keys::OLD_PASSWORD),
                ..login_request(dict)
            }),
            ProviderType::Setup => Extraction::Request(ProviderRequest::default()),
        }
    }

    fn extract_web_page(&self, dict: &Payload) -> Extraction {
        let Some(results) = dict
            .get(keys::JAVASCRIPT_PREPROCESSING_RESULTS)
            .and_then(Value::as_object)
        else {
            if self.allow_web_url_fallback {
                debug!("No preprocessing results, letting later matchers try");
                return Extraction::Fallthrough;
            }
            debug!("No preprocessing results in web page payload");
            return Extraction::Request(ProviderRequest::default());
        };

        Extraction::Request(ProviderRequest {
            url: url_value(results, keys::URL_STRING),
            details: deserialize_string(string_value(results, keys::WEB_VIEW_PAGE_DETAILS).as_deref()),
            ..Default::default()
        })
    }
}

/// Fields shared by the save-login and change-password requests
fn login_request(dict: &Payload) -> ProviderRequest {
    log_version(dict);
    if let Some(section) = string_value(dict, keys::SECTION_TITLE) {
        debug!("Ignoring section title {:?}", section);
    }
    if dict.contains_key(keys::FIELDS) {
        debug!("Ignoring custom fields in request");
    }

    ProviderRequest {
        url: url_value(dict, keys::URL_STRING),
        login_title: string_value(dict, keys::TITLE),
        username: string_value(dict, keys::USERNAME),
        password: secret_value(dict, keys::PASSWORD),
        notes: string_value(dict, keys::NOTES),
        password_options: deserialize_dictionary(dict.get(keys::PASSWORD_GENERATOR_OPTIONS)),
        ..Default::default()
    }
}

fn log_version(dict: &Payload) {
    if let Some(version) = dict.get(keys::VERSION_NUMBER).and_then(Value::as_f64) {
        debug!("Request protocol version {}", version);
    }
}

fn string_value(dict: &Payload, key: &str) -> Option<String> {
    dict.get(key).and_then(Value::as_str).map(str::to_string)
}

fn secret_value(dict: &Payload, key: &str) -> Option<SecretString> {
    string_value(dict, key).map(SecretString::from)
}

fn url_value(dict: &Payload, key: &str) -> Option<Url> {
    let raw = string_value(dict, key)?;
    match Url::parse(&raw) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!("Ignoring unparseable url {:?}: {}", raw, e);
            None
        }
    }
}
