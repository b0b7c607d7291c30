//! Fill Script
//!
//! Builds the instruction list a host page script runs to type a username and
//! password into the fields it collected earlier.

use crate::extension::types::{PageDetails, PageField};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Field names that strongly suggest a username input
const USERNAME_FIELD_NAMES: &[&str] = &[
    "username",
    "user name",
    "email",
    "email address",
    "e-mail",
    "e-mail address",
    "userid",
    "user id",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoSubmit {
    #[serde(rename = "focusOpid")]
    pub focus_opid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillScript {
    pub script: Vec<Vec<String>>,
    #[serde(rename = "autosubmit", skip_serializing_if = "Option::is_none")]
    pub auto_submit: Option<AutoSubmit>,
    #[serde(rename = "documentUUID", skip_serializing_if = "Option::is_none")]
    pub document_uuid: Option<String>,
    pub properties: Map<String, Value>,
    pub options: Value,
    pub metadata: Map<String, Value>,
}

impl FillScript {
    pub fn new(details: Option<&PageDetails>, username: &str, password: &str) -> Self {
        let mut fill = Self {
            script: Vec::new(),
            auto_submit: None,
            document_uuid: None,
            properties: Map::new(),
            options: json!({ "animate": false }),
            metadata: Map::new(),
        };

        let Some(details) = details else {
            return fill;
        };
        fill.document_uuid = details.document_uuid.clone();

        let fill_username = !username.trim().is_empty();
        let password_fields: Vec<&PageField> = details
            .fields
            .iter()
            .filter(|f| f.is_type("password") && f.viewable)
            .collect();

        let mut usernames: Vec<&PageField> = Vec::new();
        let mut passwords: Vec<&PageField> = Vec::new();

        for (form_id, _) in &details.forms {
            let in_form: Vec<&PageField> = password_fields
                .iter()
                .copied()
                .filter(|f| f.form.as_deref() == Some(form_id.as_str()))
                .collect();
            passwords.extend(in_form.iter().copied());

            if !fill_username {
                continue;
            }
            for pf in in_form {
                let username_field = find_username_field(details, pf, false, true)
                    .or_else(|| find_username_field(details, pf, true, true));
                if let Some(u) = username_field {
                    usernames.push(u);
                }
            }
        }

        if passwords.is_empty() {
            if let Some(&pf) = password_fields.first() {
                // No form holds a password field: take the first one on the page.
                passwords.push(pf);
                if fill_username && pf.element_number > 0 {
                    let username_field = find_username_field(details, pf, false, false)
                        .or_else(|| find_username_field(details, pf, true, false));
                    if let Some(u) = username_field {
                        usernames.push(u);
                    }
                }
            }
        }

        if password_fields.is_empty() {
            usernames.extend(
                details
                    .fields
                    .iter()
                    .filter(|f| f.viewable && f.is_text_like() && field_is_fuzzy_match(f)),
            );
        }

        for u in &usernames {
            fill.script.push(vec!["click_on_opid".to_string(), u.opid.clone()]);
            fill.script.push(vec![
                "fill_by_opid".to_string(),
                u.opid.clone(),
                username.to_string(),
            ]);
        }
        for p in &passwords {
            fill.script.push(vec!["click_on_opid".to_string(), p.opid.clone()]);
            fill.script.push(vec![
                "fill_by_opid".to_string(),
                p.opid.clone(),
                password.to_string(),
            ]);
        }

        fill.auto_submit = passwords.first().map(|p| AutoSubmit {
            focus_opid: p.opid.clone(),
        });

        fill
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

/// Last text-like field before the password field, or the first exact name match
fn find_username_field<'a>(
    details: &'a PageDetails,
    password_field: &PageField,
    can_be_hidden: bool,
    check_form: bool,
) -> Option<&'a PageField> {
    let mut found = None;
    for f in &details.fields {
        if f.element_number >= password_field.element_number {
            break;
        }
        if (!check_form || f.form == password_field.form)
            && (can_be_hidden || f.viewable)
            && f.is_text_like()
        {
            found = Some(f);
            if field_is_exact_match(f) {
                break;
            }
        }
    }
    found
}

fn field_labels(field: &PageField) -> impl Iterator<Item = String> + '_ {
    [
        field.html_id.as_deref(),
        field.html_name.as_deref(),
        field.label_tag.as_deref(),
        field.placeholder.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.trim().is_empty())
    .map(|s| s.to_lowercase())
}

fn field_is_exact_match(field: &PageField) -> bool {
    field_labels(field).any(|label| USERNAME_FIELD_NAMES.contains(&label.as_str()))
}

fn field_is_fuzzy_match(field: &PageField) -> bool {
    field_labels(field).any(|label| USERNAME_FIELD_NAMES.iter().any(|n| label.contains(n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::types::PageForm;

    fn field(opid: &str, n: i64, ty: &str, form: Option<&str>) -> PageField {
        PageField {
            opid: opid.to_string(),
            element_number: n,
            visible: true,
            viewable: true,
            field_type: Some(ty.to_string()),
            form: form.map(str::to_string),
            ..Default::default()
        }
    }

    fn form(opid: &str) -> (String, PageForm) {
        (
            opid.to_string(),
            PageForm {
                opid: opid.to_string(),
                ..Default::default()
            },
        )
    }

    fn login_page() -> PageDetails {
        let mut details = PageDetails {
            document_uuid: Some("doc".to_string()),
            ..Default::default()
        };
        details.forms.push(form("f0"));
        details.fields = vec![
            field("search", 0, "text", None),
            field("user", 1, "email", Some("f0")),
            field("pass", 2, "password", Some("f0")),
        ];
        details
    }

    #[test]
    fn test_no_details_gives_empty_script() {
        let script = FillScript::new(None, "u", "p");
        assert!(script.is_empty());
        assert!(script.auto_submit.is_none());
    }

    #[test]
    fn test_form_login_fills_username_then_password() {
        let details = login_page();
        let script = FillScript::new(Some(&details), "alice", "hunter2");

        assert_eq!(
            script.script,
            vec![
                vec!["click_on_opid".to_string(), "user".to_string()],
                vec!["fill_by_opid".to_string(), "user".to_string(), "alice".to_string()],
                vec!["click_on_opid".to_string(), "pass".to_string()],
                vec!["fill_by_opid".to_string(), "pass".to_string(), "hunter2".to_string()],
            ]
        );
        assert_eq!(script.auto_submit.unwrap().focus_opid, "pass");
        assert_eq!(script.document_uuid.as_deref(), Some("doc"));
    }

    #[test]
    fn test_forms_filled_in_page_order() {
        let mut details = PageDetails::default();
        details.forms = vec![form("__form__2"), form("__form__10")];
        details.fields = vec![
            field("pw-late", 1, "password", Some("__form__10")),
            field("pw-early", 0, "password", Some("__form__2")),
        ];

        let script = FillScript::new(Some(&details), "", "hunter2");
        let filled: Vec<&str> = script
            .script
            .iter()
            .filter(|step| step[0] == "fill_by_opid")
            .map(|step| step[1].as_str())
            .collect();
        assert_eq!(filled, vec!["pw-early", "pw-late"]);
        assert_eq!(script.auto_submit.unwrap().focus_opid, "pw-early");
    }

    #[test]
    fn test_blank_username_fills_password_only() {
        let details = login_page();
        let script = FillScript::new(Some(&details), "  ", "hunter2");
        assert_eq!(script.script.len(), 2);
        assert_eq!(script.script[0][1], "pass");
    }

    #[test]
    fn test_formless_password_uses_preceding_field() {
        let mut details = PageDetails::default();
        details.fields = vec![
            field("a", 0, "text", None),
            field("b", 1, "text", None),
            field("pw", 2, "password", None),
        ];
        let script = FillScript::new(Some(&details), "bob", "pw1");
        assert_eq!(script.script[0][1], "b");
        assert_eq!(script.script[2][1], "pw");
    }

    #[test]
    fn test_exact_username_name_stops_search() {
        let mut details = PageDetails::default();
        let mut named = field("named", 0, "text", None);
        named.html_name = Some("Username".to_string());
        details.fields = vec![named, field("other", 1, "text", None), field("pw", 2, "password", None)];

        let script = FillScript::new(Some(&details), "bob", "pw1");
        assert_eq!(script.script[0][1], "named");
    }

    #[test]
    fn test_username_only_page_uses_fuzzy_match() {
        let mut details = PageDetails::default();
        let mut email = field("email-input", 0, "email", None);
        email.placeholder = Some("Your Email Address".to_string());
        details.fields = vec![field("q", 1, "text", None), email];

        let script = FillScript::new(Some(&details), "carol", "pw");
        assert_eq!(script.script.len(), 2);
        assert_eq!(script.script[1], vec!["fill_by_opid", "email-input", "carol"]);
        assert!(script.auto_submit.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let script = FillScript::new(None, "u", "p");
        let value = serde_json::to_value(&script).unwrap();
        assert_eq!(value["options"]["animate"], serde_json::json!(false));
        assert!(value.get("autosubmit").is_none());
        assert!(value.get("documentUUID").is_none());
        assert!(value["script"].as_array().unwrap().is_empty());
    }
}
