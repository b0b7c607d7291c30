//! App extension protocol constants
//!
//! These strings are shared with host apps and must match exactly.

/// Type identifiers an input attachment can conform to
pub mod type_ids {
    /// Generic web page, delivered with JavaScript preprocessing results
    pub const PROPERTY_LIST: &str = "com.apple.property-list";
    pub const FIND_LOGIN_ACTION: &str = "org.appextension.find-login-action";
    pub const SAVE_LOGIN_ACTION: &str = "org.appextension.save-login-action";
    pub const CHANGE_PASSWORD_ACTION: &str = "org.appextension.change-password-action";
    pub const FILL_WEBVIEW_ACTION: &str = "org.appextension.fill-webview-action";
    pub const FILL_BROWSER_ACTION: &str = "org.appextension.fill-browser-action";
    pub const EXTENSION_SETUP: &str = "com.8bit.bitwarden.extension-setup";
}

/// Dictionary keys used in request and response payloads
pub mod keys {
    pub const VERSION_NUMBER: &str = "version_number";
    pub const URL_STRING: &str = "url_string";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const OLD_PASSWORD: &str = "old_password";
    pub const NOTES: &str = "notes";
    pub const FIELDS: &str = "fields";
    pub const TITLE: &str = "login_title";
    pub const SECTION_TITLE: &str = "section_title";
    pub const PASSWORD_GENERATOR_OPTIONS: &str = "password_generator_options";
    pub const WEB_VIEW_PAGE_FILL_SCRIPT: &str = "fillScript";
    pub const WEB_VIEW_PAGE_DETAILS: &str = "pageDetails";

    pub const JAVASCRIPT_PREPROCESSING_RESULTS: &str =
        "NSExtensionJavaScriptPreprocessingResultsKey";
    pub const JAVASCRIPT_FINALIZE_ARGUMENT: &str = "NSExtensionJavaScriptFinalizeArgumentKey";
}

/// Analytics event names
pub mod events {
    pub const PROCESS_ITEM_PROVIDER: &str = "ProcessItemProvider";
    pub const AUTO_FILLED: &str = "AutoFilled";
    pub const CLOSED: &str = "Closed";
}
