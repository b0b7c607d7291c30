//! Host Attachments
//!
//! Input items arrive from the host with type-tagged attachments whose payloads
//! load asynchronously. The load callback is modelled as a oneshot channel: the
//! host sends exactly one result, or drops the sender if it never will.

use crate::error::{ExtensionError, Result};
use crate::extension::constants::type_ids;
use crate::extension::types::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

/// Result delivered to a load callback: a payload, nothing, or an error
pub type LoadResult = Result<Option<Value>>;

/// A host-provided payload handle
pub trait Attachment: Send + Sync {
    fn has_item_conforming_to(&self, type_identifier: &str) -> bool;

    /// Start loading the payload for `type_identifier`
    fn load_item(&self, type_identifier: &str) -> oneshot::Receiver<LoadResult>;
}

/// One unit of shared data from the host
#[derive(Default)]
pub struct InputItem {
    pub attachments: Vec<Box<dyn Attachment>>,
}

impl InputItem {
    pub fn new(attachments: Vec<Box<dyn Attachment>>) -> Self {
        Self { attachments }
    }

    pub fn single(attachment: impl Attachment + 'static) -> Self {
        Self {
            attachments: vec![Box::new(attachment)],
        }
    }
}

/// An attachment whose payload is already in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticAttachment {
    pub type_identifiers: Vec<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    /// Error reported to the load callback instead of the payload
    #[serde(default)]
    pub error: Option<String>,
}

impl StaticAttachment {
    pub fn new(type_identifier: &str, payload: Option<Value>) -> Self {
        Self {
            type_identifiers: vec![type_identifier.to_string()],
            payload,
            error: None,
        }
    }

    pub fn with_type(mut self, type_identifier: &str) -> Self {
        self.type_identifiers.push(type_identifier.to_string());
        self
    }
}

impl Attachment for StaticAttachment {
    fn has_item_conforming_to(&self, type_identifier: &str) -> bool {
        self.type_identifiers.iter().any(|t| t == type_identifier)
    }

    fn load_item(&self, type_identifier: &str) -> oneshot::Receiver<LoadResult> {
        let (tx, rx) = oneshot::channel();
        let result = match &self.error {
            Some(e) => Err(ExtensionError::PayloadLoadFailed(format!(
                "{}: {}",
                type_identifier, e
            ))),
            None => Ok(self.payload.clone()),
        };
        // The receiver is still held here, so the send cannot fail.
        let _ = tx.send(result);
        rx
    }
}

/// Request file layout accepted by the binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionRequest {
    pub input_items: Vec<StaticInputItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticInputItem {
    pub attachments: Vec<StaticAttachment>,
}

impl ExtensionRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExtensionError::InvalidRequest(e.to_string()))
    }

    pub fn into_input_items(self) -> Vec<InputItem> {
        self.input_items
            .into_iter()
            .map(|item| {
                InputItem::new(
                    item.attachments
                        .into_iter()
                        .map(|a| Box::new(a) as Box<dyn Attachment>)
                        .collect(),
                )
            })
            .collect()
    }
}

/// Attachment returned to the host when the request completes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultAttachment {
    pub type_identifier: String,
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionItem {
    pub attachments: Vec<ResultAttachment>,
}

impl ExtensionItem {
    /// Wrap a response dictionary as a property-list attachment
    pub fn property_list(payload: Option<Payload>) -> Self {
        Self {
            attachments: vec![ResultAttachment {
                type_identifier: type_ids::PROPERTY_LIST.to_string(),
                payload,
            }],
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.attachments.first().and_then(|a| a.payload.as_ref())
    }
}

/// The app that invoked the extension
pub trait ExtensionHost {
    /// Hand the returning items back and end the extension request
    fn complete_request(&self, items: Vec<ExtensionItem>) -> Result<()>;
}
