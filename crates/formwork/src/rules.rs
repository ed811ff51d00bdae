//! Per-field validation rules.
//!
//! A [`RuleSet`] is built declaratively and attached at registration:
//!
//! ```
//! use formwork::RuleSet;
//! use regex::Regex;
//!
//! let rules = RuleSet::new()
//!     .required("Email is required")
//!     .pattern(Regex::new(r"^\S+@\S+$").unwrap(), "Invalid email format")
//!     .custom("not_admin", |value| {
//!         match value.as_str() {
//!             Some("admin@example.com") => Err("Enter a different email address".into()),
//!             _ => Ok(()),
//!         }
//!     });
//! ```
//!
//! Rules run in declaration order (required, pattern, customs); the first
//! failure wins. An optional `disabled_when` gate is evaluated against the
//! live form snapshot before any rule runs; a disabled field is excluded from
//! validation entirely.

use regex::Regex;
use serde_json::Value;

use crate::error::{FieldError, ValidationKind};
use crate::value;

pub type CustomCheck = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;
pub type GatePredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

struct PatternRule {
    pattern: Regex,
    message: String,
}

struct CustomRule {
    name: String,
    check: CustomCheck,
}

/// Validation rules for one field.
#[derive(Default)]
pub struct RuleSet {
    required: Option<String>,
    pattern: Option<PatternRule>,
    custom: Vec<CustomRule>,
    disabled_when: Option<GatePredicate>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject absent, `null`, and empty-string values with `message`.
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    /// Reject non-empty string values not matching `pattern`. Emptiness is
    /// the required rule's concern; empty and non-string values pass.
    pub fn pattern(mut self, pattern: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some(PatternRule {
            pattern,
            message: message.into(),
        });
        self
    }

    /// Attach a named custom check. Checks run after required/pattern, in
    /// declaration order; `Err(message)` becomes the field's error.
    pub fn custom(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.custom.push(CustomRule {
            name: name.into(),
            check: Box::new(check),
        });
        self
    }

    /// Gate the whole rule set on the live form snapshot. While the predicate
    /// returns true the field is skipped by validation and its stale errors
    /// are dropped.
    pub fn disabled_when(
        mut self,
        gate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.disabled_when = Some(Box::new(gate));
        self
    }

    pub(crate) fn is_disabled(&self, snapshot: &Value) -> bool {
        self.disabled_when.as_ref().is_some_and(|gate| gate(snapshot))
    }

    /// Run the rules in declaration order; first failure wins.
    pub(crate) fn evaluate(&self, current: Option<&Value>) -> Option<FieldError> {
        let missing = current.map_or(true, value::is_empty);

        if let Some(message) = &self.required {
            if missing {
                return Some(FieldError::new(
                    ValidationKind::RequiredMissing,
                    message.clone(),
                ));
            }
        }

        if let Some(rule) = &self.pattern {
            if let Some(text) = current.and_then(Value::as_str) {
                if !text.is_empty() && !rule.pattern.is_match(text) {
                    return Some(FieldError::new(
                        ValidationKind::PatternMismatch,
                        rule.message.clone(),
                    ));
                }
            }
        }

        let probe = current.unwrap_or(&Value::Null);
        for rule in &self.custom {
            if let Err(message) = (rule.check)(probe) {
                tracing::trace!(rule = %rule.name, "custom rule rejected value");
                return Some(FieldError::new(ValidationKind::CustomRuleFailed, message));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationKind;
    use serde_json::json;

    #[test]
    fn declaration_order_first_failure_wins() {
        let rules = RuleSet::new()
            .required("required")
            .pattern(Regex::new("^a+$").unwrap(), "pattern")
            .custom("never", |_| Err("custom".into()));

        let empty = json!("");
        let bad = json!("bbb");
        let matching = json!("aaa");

        assert_eq!(
            rules.evaluate(Some(&empty)).map(|e| e.kind),
            Some(ValidationKind::RequiredMissing)
        );
        assert_eq!(
            rules.evaluate(Some(&bad)).map(|e| e.kind),
            Some(ValidationKind::PatternMismatch)
        );
        assert_eq!(
            rules.evaluate(Some(&matching)).map(|e| e.kind),
            Some(ValidationKind::CustomRuleFailed)
        );
    }

    #[test]
    fn pattern_skips_empty_optional_values() {
        let rules = RuleSet::new().pattern(Regex::new("^a+$").unwrap(), "pattern");
        assert_eq!(rules.evaluate(Some(&json!(""))), None);
        assert_eq!(rules.evaluate(None), None);
    }

    #[test]
    fn zero_is_not_missing() {
        let rules = RuleSet::new().required("required");
        assert_eq!(rules.evaluate(Some(&json!(0))), None);
        assert!(rules.evaluate(Some(&serde_json::Value::Null)).is_some());
    }
}
