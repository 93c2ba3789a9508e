//! Step input fields.

use serde::Serialize;

/// One option of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Input widget kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "choices", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Password,
    TextArea,
    Choice(Vec<Choice>),
}

/// A field rendered by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Pre-filled text shown to the operator. Never substituted on submit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub help: String,
}

impl FieldSpec {
    fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: true,
            default: None,
            initial: None,
            help: String::new(),
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn password(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Password)
    }

    pub fn text_area(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::TextArea)
    }

    pub fn choice(name: impl Into<String>, label: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self::new(name, label, FieldKind::Choice(choices))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Check a submitted value.
    ///
    /// Returns the value to store (`None` leaves the store untouched), or a
    /// message for the operator. Missing values fall back to the default.
    pub fn validate(&self, submitted: Option<&str>) -> Result<Option<String>, String> {
        let value = match submitted.filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => match (&self.default, self.required, submitted) {
                (Some(default), _, _) => default.clone(),
                (None, true, _) => return Err("This field is required.".to_string()),
                (None, false, Some(empty)) => return Ok(Some(empty.to_string())),
                (None, false, None) => return Ok(None),
            },
        };

        if let FieldKind::Choice(choices) = &self.kind {
            if !choices.iter().any(|c| c.value == value) {
                return Err(format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    value
                ));
            }
        }

        Ok(Some(value))
    }
}

/// `yes` / `no` choices.
pub fn yes_no(yes_label: &str, no_label: &str) -> Vec<Choice> {
    vec![Choice::new("yes", yes_label), Choice::new("no", no_label)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        let field = FieldSpec::text("hostname", "Hostname");
        assert_eq!(field.validate(Some("fw01")), Ok(Some("fw01".to_string())));
        assert!(field.validate(None).is_err());
        assert!(field.validate(Some("")).is_err());
    }

    #[test]
    fn test_default_fills_missing_value() {
        let field = FieldSpec::choice("include_panorama", "Include Panorama", yes_no("Yes", "No"))
            .with_default("no");
        assert_eq!(field.validate(None), Ok(Some("no".to_string())));
        assert_eq!(field.validate(Some("")), Ok(Some("no".to_string())));
        assert_eq!(field.validate(Some("yes")), Ok(Some("yes".to_string())));
    }

    #[test]
    fn test_unknown_choice() {
        let field = FieldSpec::choice("include_panorama", "Include Panorama", yes_no("Yes", "No"));
        let err = field.validate(Some("maybe")).unwrap_err();
        assert!(err.contains("maybe"));
    }

    #[test]
    fn test_optional_field() {
        let field = FieldSpec::text("auth_key", "Auth Code").optional();
        assert_eq!(field.validate(None), Ok(None));
        assert_eq!(field.validate(Some("")), Ok(Some(String::new())));
        assert_eq!(field.validate(Some("I123")), Ok(Some("I123".to_string())));
    }

    #[test]
    fn test_initial_is_not_a_default() {
        let field = FieldSpec::text_area("bootstrap_upload", "Bootstrap")
            .optional()
            .with_initial("<xml></xml>");
        assert_eq!(field.validate(Some("")), Ok(Some(String::new())));
        assert_eq!(field.validate(None), Ok(None));
    }

    #[test]
    fn test_serialize_choice_kind() {
        let field = FieldSpec::choice("x", "X", vec![Choice::new("a", "A")]).optional();
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["kind"]["type"], "choice");
        assert_eq!(json["kind"]["choices"][0]["value"], "a");
        assert_eq!(json["required"], false);
        assert!(json.get("default").is_none());
    }
}
