//! Extension Data Types
//!
//! Provider types, page details collected by host apps, and password generator
//! options sent along with save/change requests.

use crate::extension::constants::type_ids;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// A property-list dictionary exchanged with the host
pub type Payload = Map<String, Value>;

/// The kind of request the host made, keyed by type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    /// Generic web page (Safari action extension)
    WebPage,
    FindLogin,
    FillBrowser,
    FillWebView,
    SaveLogin,
    ChangePassword,
    Setup,
}

impl ProviderType {
    pub fn type_identifier(&self) -> &'static str {
        match self {
            ProviderType::WebPage => type_ids::PROPERTY_LIST,
            ProviderType::FindLogin => type_ids::FIND_LOGIN_ACTION,
            ProviderType::FillBrowser => type_ids::FILL_BROWSER_ACTION,
            ProviderType::FillWebView => type_ids::FILL_WEBVIEW_ACTION,
            ProviderType::SaveLogin => type_ids::SAVE_LOGIN_ACTION,
            ProviderType::ChangePassword => type_ids::CHANGE_PASSWORD_ACTION,
            ProviderType::Setup => type_ids::EXTENSION_SETUP,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_identifier())
    }
}

/// Password generator constraints requested by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordGenerationOptions {
    #[serde(rename = "password_min_length")]
    pub min_length: u32,
    #[serde(rename = "password_max_length")]
    pub max_length: u32,
    #[serde(rename = "password_require_digits")]
    pub require_digits: bool,
    #[serde(rename = "password_require_symbols")]
    pub require_symbols: bool,
    #[serde(rename = "password_forbidden_characters")]
    pub forbidden_characters: String,
}

/// Form fields collected from a web page by the host's page script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageDetails {
    #[serde(rename = "documentUUID", skip_serializing_if = "Option::is_none")]
    pub document_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "documentUrl", skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(rename = "tabUrl", skip_serializing_if = "Option::is_none")]
    pub tab_url: Option<String>,
    /// Forms keyed by opid, in the order the page script collected them
    #[serde(with = "ordered_forms")]
    pub forms: Vec<(String, PageForm)>,
    pub fields: Vec<PageField>,
    #[serde(rename = "collectedTimestamp", skip_serializing_if = "Option::is_none")]
    pub collected_timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageForm {
    pub opid: String,
    #[serde(rename = "htmlName", skip_serializing_if = "Option::is_none")]
    pub html_name: Option<String>,
    #[serde(rename = "htmlID", skip_serializing_if = "Option::is_none")]
    pub html_id: Option<String>,
    #[serde(rename = "htmlAction", skip_serializing_if = "Option::is_none")]
    pub html_action: Option<String>,
    #[serde(rename = "htmlMethod", skip_serializing_if = "Option::is_none")]
    pub html_method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageField {
    pub opid: String,
    #[serde(rename = "elementNumber")]
    pub element_number: i64,
    pub visible: bool,
    pub viewable: bool,
    #[serde(rename = "htmlID", skip_serializing_if = "Option::is_none")]
    pub html_id: Option<String>,
    #[serde(rename = "htmlName", skip_serializing_if = "Option::is_none")]
    pub html_name: Option<String>,
    #[serde(rename = "htmlClass", skip_serializing_if = "Option::is_none")]
    pub html_class: Option<String>,
    #[serde(rename = "label-tag", skip_serializing_if = "Option::is_none")]
    pub label_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub disabled: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageField {
    pub fn is_type(&self, ty: &str) -> bool {
        self.field_type.as_deref() == Some(ty)
    }

    /// Text-like inputs that can hold a username
    pub fn is_text_like(&self) -> bool {
        matches!(self.field_type.as_deref(), Some("text" | "email" | "tel"))
    }
}

/// Serde adapter keeping a JSON object's entries in document order
mod ordered_forms {
    use super::PageForm;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub(super) fn serialize<S>(forms: &[(String, PageForm)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(forms.len()))?;
        for (opid, form) in forms {
            map.serialize_entry(opid, form)?;
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, PageForm)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FormsVisitor)
    }

    struct FormsVisitor;

    impl<'de> Visitor<'de> for FormsVisitor {
        type Value = Vec<(String, PageForm)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of forms keyed by opid")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut forms: Vec<(String, PageForm)> =
                Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((opid, form)) = access.next_entry::<String, PageForm>()? {
                // A repeated key replaces the earlier entry in place.
                match forms.iter_mut().find(|(k, _)| *k == opid) {
                    Some(entry) => entry.1 = form,
                    None => forms.push((opid, form)),
                }
            }
            Ok(forms)
        }
    }
}

/// Decode a JSON string payload, falling back to `None` when absent or malformed
pub fn deserialize_string<T: DeserializeOwned>(json: Option<&str>) -> Option<T> {
    let json = json?;
    match serde_json::from_str(json) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Ignoring malformed JSON payload: {}", e);
            None
        }
    }
}

/// Decode a nested dictionary by way of its JSON text
pub fn deserialize_dictionary<T: DeserializeOwned>(dict: Option<&Value>) -> Option<T> {
    let dict = dict?.as_object()?;
    match serde_json::to_string(dict) {
        Ok(json) => deserialize_string(Some(&json)),
        Err(e) => {
            debug!("Failed to serialize dictionary: {}", e);
            None
        }
    }
}
