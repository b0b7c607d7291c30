//! Extension Module
//!
//! Everything between the host app handing over its input items and the
//! extension returning a filled response: classification, routing and
//! completion.

pub mod attachment;
pub mod completion;
pub mod constants;
pub mod context;
pub mod dispatcher;
pub mod fill_script;
pub mod lock;
pub mod session;
pub mod types;

pub use attachment::{Attachment, ExtensionHost, ExtensionItem, InputItem, StaticAttachment};
pub use context::Context;
pub use lock::{Destination, LockType, Route};
pub use session::ExtensionSession;
pub use types::{PageDetails, PasswordGenerationOptions, ProviderType};
