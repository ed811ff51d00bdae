//! Integration tests for the FormController:
//! - required/pattern/custom rule chains and their messages
//! - predicate-gated (disabled) validation
//! - dynamic list identity stability
//! - submit/reset protocol and status flags
//! - watch subscriptions

use std::sync::{Arc, Mutex};

use formwork::{
    FormController, FormEvent, FormError, RuleSet, SetOptions, ValidateTarget, ValidationKind,
};
use pretty_assertions::assert_eq;
use regex::Regex;
use serde_json::{Value, json};

const EMAIL_PATTERN: &str =
    r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$";

fn email_rules() -> RuleSet {
    RuleSet::new()
        .required("Email is required")
        .pattern(
            Regex::new(EMAIL_PATTERN).expect("email pattern"),
            "Invalid email format",
        )
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
        })
}

/// The channel-onboarding form the demo client renders.
fn channel_form() -> FormController {
    let mut form = FormController::new(json!({
        "username": "Batman",
        "email": "",
        "channel": "",
        "social": { "twitter": "", "facebook": "" },
        "phone_numbers": ["", ""],
        "ph_numbers": [{ "number": "" }],
        "age": 0,
        "dob": "2000-01-01",
    }));

    form.register("username", RuleSet::new().required("Username is required!"))
        .expect("register username");
    form.register("email", email_rules()).expect("register email");
    form.register("channel", RuleSet::new().required("Channel is required!"))
        .expect("register channel");
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
    )
    .expect("register twitter");
    form.register("social.facebook", RuleSet::new())
        .expect("register facebook");
    form.register("age", RuleSet::new().required("Age is required!"))
        .expect("register age");
    form.register("dob", RuleSet::new().required("Date of birth is required!"))
        .expect("register dob");
    form
}

fn fill_valid(form: &mut FormController) {
    let opts = SetOptions::all();
    form.set_value("email", json!("bruce@wayne.com"), opts)
        .expect("set email");
    form.set_value("channel", json!("gotham-tech"), opts)
        .expect("set channel");
    form.set_value("social.twitter", json!("@darkknight"), opts)
        .expect("set twitter");
}

#[test]
fn required_rules_report_missing_fields() {
    let mut form = channel_form();
    let errors = form.validate(ValidateTarget::All).expect("validate").clone();

    assert_eq!(
        errors.get("email").map(|e| e.kind),
        Some(ValidationKind::RequiredMissing)
    );
    assert_eq!(
        errors.get("channel").map(|e| e.message.as_str()),
        Some("Channel is required!")
    );
    // Defaults that are not empty pass required.
    assert!(!errors.contains_key("username"));
    assert!(!errors.contains_key("age"));
    assert!(!form.status().is_valid);
}

#[test]
fn gated_rule_follows_its_driving_field() {
    let mut form = channel_form();

    // channel is empty, so the twitter rule set is disabled even though the
    // twitter value is empty too.
    form.validate(ValidateTarget::All).expect("validate");
    assert!(!form.errors().contains_key("social.twitter"));

    form.set_value("channel", json!("gotham-tech"), SetOptions::all())
        .expect("set channel");
    form.validate(ValidateTarget::All).expect("validate");
    assert_eq!(
        form.errors().get("social.twitter").map(|e| e.kind),
        Some(ValidationKind::RequiredMissing)
    );

    // Emptying the driving field again suppresses the reported error
    // retroactively.
    form.set_value("channel", json!(""), SetOptions::all())
        .expect("clear channel");
    form.validate(ValidateTarget::All).expect("validate");
    assert!(!form.errors().contains_key("social.twitter"));
}

#[test]
fn list_identities_survive_removal() {
    let mut form = channel_form();

    let seeded = form.item_ids("ph_numbers").expect("ids");
    assert_eq!(seeded.len(), 1);

    let second = form.append("ph_numbers", json!({ "number": "111" })).expect("append");
    let third = form.append("ph_numbers", json!({ "number": "222" })).expect("append");

    form.remove("ph_numbers", 0).expect("remove head");
    assert_eq!(
        form.item_ids("ph_numbers").expect("ids"),
        vec![second, third],
        "remaining entries keep their identities and relative order"
    );
    assert_eq!(
        form.get("ph_numbers.0.number").expect("get"),
        json!("111"),
        "values shift down while identities stay put"
    );
}

#[test]
fn removal_never_empties_a_list() {
    let mut form = channel_form();
    let err = form.remove("ph_numbers", 0).expect_err("must refuse");
    assert!(matches!(err, FormError::MinimumLength(_)));

    let err = form.remove("ph_numbers", 3).expect_err("out of bounds");
    assert!(matches!(err, FormError::IndexOutOfBounds { .. }));
}

#[test]
fn successful_submit_restores_defaults_and_counts() {
    let mut form = channel_form();
    fill_valid(&mut form);
    let defaults = form.defaults().clone();

    let submitted: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = submitted.clone();
    let ok = form
        .submit(
            move |values| {
                *sink.lock().expect("lock") = Some(values.clone());
            },
            |_| panic!("valid form must not route to on_invalid"),
        )
        .expect("submit");

    assert!(ok);
    let payload = submitted.lock().expect("lock").clone().expect("payload");
    assert_eq!(payload["email"], json!("bruce@wayne.com"));
    assert_eq!(payload["social"]["twitter"], json!("@darkknight"));

    let status = form.status();
    assert_eq!(status.submit_count, 1);
    assert!(status.is_submitted);
    assert!(status.is_submit_successful);
    assert!(!status.is_submitting);
    assert_eq!(form.values(), &defaults, "values return to the snapshot");
    assert!(!status.is_dirty);
}

#[test]
fn failed_submit_routes_the_error_map() {
    let mut form = channel_form();

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let ok = form
        .submit(
            |_| panic!("invalid form must not route to on_valid"),
            move |errors| {
                *sink.lock().expect("lock") = errors.keys().cloned().collect();
            },
        )
        .expect("submit");

    assert!(!ok);
    assert_eq!(
        reported.lock().expect("lock").clone(),
        vec!["channel".to_string(), "email".to_string()]
    );
    let status = form.status();
    assert_eq!(status.submit_count, 1);
    assert!(status.is_submitted);
    assert!(!status.is_submit_successful);
    assert!(!status.is_submitting);
}

#[test]
fn reset_restores_defaults_but_keeps_submit_count() {
    let mut form = channel_form();
    let defaults = form.defaults().clone();

    form.set_value("username", json!("Robin"), SetOptions::all())
        .expect("set username");
    form.touch("email").expect("touch email");
    form.submit(|_| {}, |_| {}).expect("failing submit");
    assert_eq!(form.status().submit_count, 1);

    form.reset();
    assert_eq!(form.values(), &defaults);
    assert!(form.errors().is_empty());
    let meta = form.meta("username").expect("meta");
    assert!(!meta.dirty);
    assert!(!meta.touched);
    assert!(!form.meta("email").expect("meta").touched);

    let status = form.status();
    assert!(!status.is_dirty);
    assert!(!status.is_submitted);
    assert!(!status.is_submit_successful);
    assert_eq!(status.submit_count, 1, "reset never rolls the counter back");
}

#[test]
fn email_rule_chain_matches_observed_messages() {
    let mut form = channel_form();
    let opts = SetOptions::all();

    form.set_value("email", json!("bad"), opts).expect("set");
    let error = form.errors().get("email").expect("error").clone();
    assert_eq!(error.kind, ValidationKind::PatternMismatch);
    assert_eq!(error.message, "Invalid email format");

    form.set_value("email", json!("admin@example.com"), opts)
        .expect("set");
    let error = form.errors().get("email").expect("error").clone();
    assert_eq!(error.kind, ValidationKind::CustomRuleFailed);
    assert_eq!(error.message, "Enter a different email address");

    form.set_value("email", json!("a@baddomain.com"), opts)
        .expect("set");
    let error = form.errors().get("email").expect("error").clone();
    assert_eq!(error.kind, ValidationKind::CustomRuleFailed);
    assert_eq!(error.message, "This domain is not supported");

    form.set_value("email", json!("a@ok.com"), opts).expect("set");
    assert!(!form.errors().contains_key("email"));
}

#[test]
fn set_options_gate_meta_and_revalidation() {
    let mut form = channel_form();

    form.set_value("email", json!("bad"), SetOptions::default())
        .expect("set silently");
    assert!(
        form.errors().is_empty(),
        "no revalidation requested, no reported error"
    );
    let meta = form.meta("email").expect("meta");
    assert!(!meta.dirty);
    assert!(!meta.touched);

    form.validate(ValidateTarget::Path("email")).expect("validate path");
    assert_eq!(
        form.errors().get("email").map(|e| e.kind),
        Some(ValidationKind::PatternMismatch)
    );

    let err = form
        .validate(ValidateTarget::Path("social.myspace"))
        .expect_err("unknown field");
    assert!(matches!(err, FormError::Unregistered(_)));
}

#[test]
fn get_values_reads_multiple_paths() {
    let form = channel_form();
    assert_eq!(
        form.get_values(&["username", "email"]).expect("get"),
        vec![json!("Batman"), json!("")]
    );
    assert_eq!(
        form.get("social").expect("get"),
        json!({ "twitter": "", "facebook": "" })
    );
    assert_eq!(form.get("social.missing").expect("get"), Value::Null);
}

#[test]
fn watchers_observe_changes_until_unsubscribed() {
    let mut form = channel_form();
    let seen: Arc<Mutex<Vec<FormEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = form.watch(move |event| sink.lock().expect("lock").push(event.clone()));

    form.set_value("username", json!("Robin"), SetOptions::all())
        .expect("set");
    form.append("ph_numbers", json!({ "number": "333" })).expect("append");
    form.reset();

    {
        let events = seen.lock().expect("lock");
        assert!(events.contains(&FormEvent::ValueChanged {
            path: "username".into()
        }));
        assert!(events.contains(&FormEvent::ListChanged {
            path: "ph_numbers".into()
        }));
        assert!(events.contains(&FormEvent::StatusChanged));
        assert!(events.contains(&FormEvent::Reset));
    }

    assert!(form.unwatch(id));
    assert!(!form.unwatch(id), "second unsubscribe is a no-op");
    let before = seen.lock().expect("lock").len();
    form.set_value("username", json!("Alfred"), SetOptions::all())
        .expect("set");
    assert_eq!(seen.lock().expect("lock").len(), before);
}
