//! Completion Payloads
//!
//! Shapes the response dictionary returned to the host. The layout depends on
//! which kind of request started the session.

use crate::error::Result;
use crate::extension::constants::keys;
use crate::extension::context::Context;
use crate::extension::fill_script::FillScript;
use crate::extension::types::{Payload, ProviderType};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

/// Build the response for confirmed credentials, or `None` when the session
/// never recognised a request
pub fn build_response(
    context: &Context,
    username: &str,
    password: &SecretString,
) -> Result<Option<Payload>> {
    let Some(provider_type) = context.provider_type() else {
        return Ok(None);
    };

    let payload = match provider_type {
        ProviderType::WebPage => {
            let script = fill_script_dictionary(context, username, password)?;
            dictionary([(keys::JAVASCRIPT_FINALIZE_ARGUMENT, Value::Object(script))])
        }
        ProviderType::FillBrowser | ProviderType::FillWebView => {
            fill_script_dictionary(context, username, password)?
        }
        ProviderType::FindLogin | ProviderType::SaveLogin => dictionary([
            (keys::USERNAME, Value::from(username)),
            (keys::PASSWORD, Value::from(password.expose_secret())),
        ]),
        // The confirmed password travels as the old password and the new one
        // stays blank.
        ProviderType::ChangePassword => dictionary([
            (keys::PASSWORD, Value::from("")),
            (keys::OLD_PASSWORD, Value::from(password.expose_secret())),
        ]),
        ProviderType::Setup => return Ok(None),
    };

    Ok(Some(payload))
}

fn fill_script_dictionary(
    context: &Context,
    username: &str,
    password: &SecretString,
) -> Result<Payload> {
    let script = FillScript::new(context.details(), username, password.expose_secret());
    let json = serde_json::to_string(&script)?;
    Ok(dictionary([(keys::WEB_VIEW_PAGE_FILL_SCRIPT, Value::String(json))]))
}

fn dictionary<const N: usize>(entries: [(&str, Value); N]) -> Payload {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
