//! The channel onboarding form: default snapshot and rule registration.
//!
//! This is the declarative heart of the demo. The typed [`ChannelForm`]
//! serializes into the controller's default snapshot; every rule, message,
//! and the twitter gate are registered here so the page components stay free
//! of validation logic.

use chrono::{Local, NaiveDate};
use formwork::{FormController, FormError, RuleSet};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path of the dynamic phone-number list.
pub const PH_NUMBERS: &str = "ph_numbers";

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$"
    )
    .expect("email pattern");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Social {
    pub twitter: String,
    pub facebook: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneEntry {
    pub number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelForm {
    pub username: String,
    pub email: String,
    pub channel: String,
    pub social: Social,
    /// Fixed slots: primary and secondary number.
    pub phone_numbers: [String; 2],
    /// Dynamic list; the controller keeps one entry at minimum.
    pub ph_numbers: Vec<PhoneEntry>,
    pub age: u32,
    pub dob: NaiveDate,
}

impl Default for ChannelForm {
    fn default() -> Self {
        Self {
            username: "Batman".into(),
            email: String::new(),
            channel: String::new(),
            social: Social {
                twitter: String::new(),
                facebook: String::new(),
            },
            phone_numbers: [String::new(), String::new()],
            ph_numbers: vec![PhoneEntry {
                number: String::new(),
            }],
            age: 0,
            dob: Local::now().date_naive(),
        }
    }
}

/// Fresh entry appended by the "add phone number" action.
pub fn empty_phone() -> Value {
    serde_json::json!({ "number": "" })
}

/// Controller seeded with the defaults and every rule the form carries.
pub fn channel_controller() -> Result<FormController, FormError> {
    let mut form = FormController::from_defaults(&ChannelForm::default())?;

    form.register("username", RuleSet::new().required("Username is required!"))?;
    form.register(
        "email",
        RuleSet::new()
            .required("Email is required")
            .pattern(EMAIL_PATTERN.clone(), "Invalid email format")
            .custom("not_admin", |value| match value.as_str() {
                Some("admin@example.com") => Err("Enter a different email address".into()),
                _ => Ok(()),
            })
            .custom("not_blacklisted", |value| {
                let blacklisted = value
                    .as_str()
                    .is_some_and(|text| text.ends_with("baddomain.com"));
                if blacklisted {
                    Err("This domain is not supported".into())
                } else {
                    Ok(())
                }
            }),
    )?;
    form.register("channel", RuleSet::new().required("Channel is required!"))?;
    // Twitter only matters once a channel name exists; while the gate holds,
    // the field is excluded from validation entirely.
    form.register(
        "social.twitter",
        RuleSet::new()
            .required("Enter twitter profile")
            .disabled_when(|snapshot| {
                snapshot
                    .get("channel")
                    .and_then(Value::as_str)
                    .map_or(true, str::is_empty)
            }),
    )?;
    form.register("social.facebook", RuleSet::new())?;
    form.register("phone_numbers.0", RuleSet::new())?;
    form.register("phone_numbers.1", RuleSet::new())?;
    form.register("age", RuleSet::new().required("Age is required!"))?;
    form.register("dob", RuleSet::new().required("Date of birth is required!"))?;

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork::ValidateTarget;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults_round_trip_through_the_controller() {
        let form = channel_controller().expect("controller");
        assert_eq!(form.get("username").expect("get"), json!("Batman"));
        assert_eq!(
            form.get("ph_numbers").expect("get"),
            json!([{ "number": "" }])
        );
        assert_eq!(form.get("age").expect("get"), json!(0));
    }

    #[test]
    fn fresh_form_is_incomplete_but_twitter_stays_quiet() {
        let mut form = channel_controller().expect("controller");
        let errors = form.validate(ValidateTarget::All).expect("validate").clone();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("channel"));
        assert!(!errors.contains_key("social.twitter"));
        assert!(!form.status().is_valid);
    }
}
