//! The form-state controller.
//!
//! [`FormController`] owns the default snapshot, the live value tree, the
//! field registry, derived flags, dynamic-list identities, and the watch
//! subscription list. All mutations happen through `&mut self` in response to
//! discrete events and run to completion; the only mutual exclusion is the
//! `is_submitting` flag guarding submit reentry.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::arena::{IdentityArena, ItemId};
use crate::error::{ErrorMap, FormError};
use crate::path::FieldPath;
use crate::rules::RuleSet;
use crate::status::{FieldMeta, FormStatus};
use crate::value;
use crate::watch::{FormEvent, WatchId, WatcherSet};

/// Handle returned by [`FormController::register`]; the rendering layer keeps
/// it to address the field in later calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    path: FieldPath,
}

impl FieldBinding {
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// The path in its string form, as accepted by the controller operations.
    pub fn name(&self) -> String {
        self.path.to_string()
    }
}

/// Flag updates applied by [`FormController::set_value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    pub mark_dirty: bool,
    pub mark_touched: bool,
    pub revalidate: bool,
}

impl SetOptions {
    /// Update dirty and touched and revalidate, the full change-event shape.
    pub fn all() -> Self {
        Self {
            mark_dirty: true,
            mark_touched: true,
            revalidate: true,
        }
    }
}

/// Scope of a [`FormController::validate`] pass.
#[derive(Debug, Clone, Copy)]
pub enum ValidateTarget<'a> {
    All,
    Path(&'a str),
}

struct FieldRegistration {
    path: FieldPath,
    rules: RuleSet,
}

pub struct FormController {
    defaults: Value,
    values: Value,
    /// Registration order; validation reports fields in this order.
    fields: Vec<FieldRegistration>,
    meta: BTreeMap<String, FieldMeta>,
    arenas: BTreeMap<String, IdentityArena>,
    errors: ErrorMap,
    status: FormStatus,
    watchers: WatcherSet,
}

impl FormController {
    /// Controller over a default snapshot; current values start as a copy.
    pub fn new(defaults: Value) -> Self {
        let values = defaults.clone();
        Self {
            defaults,
            values,
            fields: Vec::new(),
            meta: BTreeMap::new(),
            arenas: BTreeMap::new(),
            errors: ErrorMap::new(),
            status: FormStatus {
                is_valid: true,
                ..FormStatus::default()
            },
            watchers: WatcherSet::default(),
        }
    }

    /// Controller whose defaults come from a serializable snapshot type.
    pub fn from_defaults<T: Serialize>(defaults: &T) -> Result<Self, FormError> {
        Ok(Self::new(serde_json::to_value(defaults)?))
    }

    // --- Registration ----------------------------------------------------

    /// Bind `path` to `rules`. Re-registering a path replaces its rules.
    pub fn register(&mut self, path: &str, rules: RuleSet) -> Result<FieldBinding, FormError> {
        let parsed = FieldPath::parse(path)?;
        debug!(field = %parsed, "register field");
        match self.fields.iter().position(|f| f.path == parsed) {
            Some(slot) => self.fields[slot].rules = rules,
            None => self.fields.push(FieldRegistration {
                path: parsed.clone(),
                rules,
            }),
        }
        self.meta.entry(parsed.to_string()).or_default();
        self.refresh_status();
        Ok(FieldBinding { path: parsed })
    }

    /// Drop a binding along with its meta and reported error.
    pub fn unregister(&mut self, path: &str) -> Result<(), FormError> {
        let parsed = FieldPath::parse(path)?;
        let key = parsed.to_string();
        debug!(field = %key, "unregister field");
        self.fields.retain(|f| f.path != parsed);
        self.meta.remove(&key);
        self.errors.remove(&key);
        self.refresh_status();
        Ok(())
    }

    // --- Value mutation ---------------------------------------------------

    pub fn set_value(
        &mut self,
        path: &str,
        new: Value,
        options: SetOptions,
    ) -> Result<(), FormError> {
        let parsed = FieldPath::parse(path)?;
        trace!(field = %parsed, ?options, "set value");
        value::set(&mut self.values, &parsed, new);
        let key = parsed.to_string();
        let meta = self.meta.entry(key.clone()).or_default();
        if options.mark_touched {
            meta.touched = true;
        }
        if options.mark_dirty {
            meta.dirty =
                value::get(&self.values, &parsed) != value::get(&self.defaults, &parsed);
        }
        if options.revalidate {
            self.validate_one(&parsed);
        }
        self.watchers.notify(&FormEvent::ValueChanged { path: key });
        self.refresh_status();
        Ok(())
    }

    /// Blur delivery from the rendering layer.
    pub fn touch(&mut self, path: &str) -> Result<(), FormError> {
        let parsed = FieldPath::parse(path)?;
        self.meta.entry(parsed.to_string()).or_default().touched = true;
        Ok(())
    }

    // --- Dynamic lists ----------------------------------------------------

    /// Append `item` to the list at `list_path`, assigning a fresh stable id.
    pub fn append(&mut self, list_path: &str, item: Value) -> Result<ItemId, FormError> {
        let parsed = FieldPath::parse(list_path)?;
        let key = parsed.to_string();
        let items = value::array_mut(&mut self.values, &parsed)
            .ok_or_else(|| FormError::NotAList(key.clone()))?;
        let seed_len = items.len();
        items.push(item);
        let arena = self
            .arenas
            .entry(key.clone())
            .or_insert_with(|| IdentityArena::seeded(seed_len));
        let id = arena.append();
        debug!(list = %key, item = %id, "append list item");
        self.watchers.notify(&FormEvent::ListChanged { path: key });
        self.refresh_status();
        Ok(id)
    }

    /// Remove the entry at `index`. The remaining entries keep their ids and
    /// relative order. The last remaining entry of a list cannot be removed.
    pub fn remove(&mut self, list_path: &str, index: usize) -> Result<(), FormError> {
        let parsed = FieldPath::parse(list_path)?;
        let key = parsed.to_string();
        let items = value::array_mut(&mut self.values, &parsed)
            .ok_or_else(|| FormError::NotAList(key.clone()))?;
        let len = items.len();
        if index >= len {
            return Err(FormError::IndexOutOfBounds {
                path: key,
                index,
                len,
            });
        }
        if len == 1 {
            return Err(FormError::MinimumLength(key));
        }
        items.remove(index);
        let arena = self
            .arenas
            .entry(key.clone())
            .or_insert_with(|| IdentityArena::seeded(len));
        arena.remove(index);

        // Entries shifted down; bindings under the now out-of-range tail slot
        // are stale and get dropped. The renderer re-registers live rows.
        let tail = parsed.index(len - 1);
        let tail_key = tail.to_string();
        let tail_prefix = format!("{tail_key}.");
        self.fields.retain(|f| !f.path.starts_with(&tail));
        self.meta
            .retain(|k, _| k != &tail_key && !k.starts_with(&tail_prefix));
        self.errors
            .retain(|k, _| k != &tail_key && !k.starts_with(&tail_prefix));

        debug!(list = %key, index, "remove list item");
        self.watchers.notify(&FormEvent::ListChanged { path: key });
        self.refresh_status();
        Ok(())
    }

    /// Ordered stable identities of the list at `list_path`, for iteration.
    pub fn item_ids(&mut self, list_path: &str) -> Result<Vec<ItemId>, FormError> {
        let parsed = FieldPath::parse(list_path)?;
        let key = parsed.to_string();
        let len = value::get(&self.values, &parsed)
            .and_then(Value::as_array)
            .map(Vec::len)
            .ok_or_else(|| FormError::NotAList(key.clone()))?;
        let arena = self
            .arenas
            .entry(key)
            .or_insert_with(|| IdentityArena::seeded(len));
        Ok(arena.ids().to_vec())
    }

    // --- Validation -------------------------------------------------------

    /// Run rules for one field or the whole registry. Disabled fields are
    /// skipped and their stale errors dropped.
    pub fn validate(&mut self, target: ValidateTarget<'_>) -> Result<&ErrorMap, FormError> {
        match target {
            ValidateTarget::All => {
                self.errors.clear();
                for field in &self.fields {
                    if field.rules.is_disabled(&self.values) {
                        continue;
                    }
                    if let Some(error) =
                        field.rules.evaluate(value::get(&self.values, &field.path))
                    {
                        self.errors.insert(field.path.to_string(), error);
                    }
                }
                trace!(failures = self.errors.len(), "validated all fields");
            }
            ValidateTarget::Path(raw) => {
                let parsed = FieldPath::parse(raw)?;
                if !self.fields.iter().any(|f| f.path == parsed) {
                    return Err(FormError::Unregistered(parsed.to_string()));
                }
                self.validate_one(&parsed);
            }
        }
        self.refresh_status();
        Ok(&self.errors)
    }

    fn validate_one(&mut self, path: &FieldPath) {
        let Some(field) = self.fields.iter().find(|f| &f.path == path) else {
            return;
        };
        let key = path.to_string();
        if field.rules.is_disabled(&self.values) {
            self.errors.remove(&key);
            return;
        }
        match field.rules.evaluate(value::get(&self.values, path)) {
            Some(error) => {
                self.errors.insert(key, error);
            }
            None => {
                self.errors.remove(&key);
            }
        }
    }

    // --- Submit / reset ---------------------------------------------------

    /// Validate everything and route to the matching callback.
    ///
    /// On success the values are restored to the default snapshot while the
    /// submit flags stay observable; `submit_count` always increments. Errors
    /// only on reentry while a submit is in flight.
    pub fn submit<V, I>(&mut self, on_valid: V, on_invalid: I) -> Result<bool, FormError>
    where
        V: FnOnce(&Value),
        I: FnOnce(&ErrorMap),
    {
        if self.status.is_submitting {
            return Err(FormError::SubmitInProgress);
        }
        self.status.is_submitting = true;
        self.watchers.notify(&FormEvent::StatusChanged);

        self.validate(ValidateTarget::All)?;
        let successful = self.errors.is_empty();
        if successful {
            debug!(attempt = self.status.submit_count + 1, "submit accepted");
            on_valid(&self.values);
            self.status.is_submitted = true;
            self.status.is_submit_successful = true;
            self.status.submit_count += 1;
            self.restore_defaults();
        } else {
            debug!(
                attempt = self.status.submit_count + 1,
                failures = self.errors.len(),
                "submit rejected"
            );
            on_invalid(&self.errors);
            self.status.is_submitted = true;
            self.status.is_submit_successful = false;
            self.status.submit_count += 1;
        }
        self.status.is_submitting = false;
        self.watchers.notify(&FormEvent::Submitted { successful });
        self.refresh_status();
        Ok(successful)
    }

    /// Restore the default snapshot, clearing meta, errors, and submit flags.
    /// `submit_count` survives.
    pub fn reset(&mut self) {
        debug!("reset form");
        self.restore_defaults();
        self.status.is_submitted = false;
        self.status.is_submit_successful = false;
        self.watchers.notify(&FormEvent::Reset);
        self.refresh_status();
    }

    fn restore_defaults(&mut self) {
        self.values = self.defaults.clone();
        for meta in self.meta.values_mut() {
            *meta = FieldMeta::default();
        }
        self.errors.clear();
        self.arenas.clear();
    }

    // --- Reads ------------------------------------------------------------

    pub fn values(&self) -> &Value {
        &self.values
    }

    pub fn defaults(&self) -> &Value {
        &self.defaults
    }

    /// Current value at `path`; `null` for paths nothing has populated.
    pub fn get(&self, path: &str) -> Result<Value, FormError> {
        let parsed = FieldPath::parse(path)?;
        Ok(value::get(&self.values, &parsed)
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Current values for several paths at once.
    pub fn get_values(&self, paths: &[&str]) -> Result<Vec<Value>, FormError> {
        paths.iter().map(|path| self.get(path)).collect()
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn meta(&self, path: &str) -> Result<FieldMeta, FormError> {
        let parsed = FieldPath::parse(path)?;
        Ok(self
            .meta
            .get(&parsed.to_string())
            .copied()
            .unwrap_or_default())
    }

    // --- Watch subscriptions ----------------------------------------------

    pub fn watch(
        &mut self,
        callback: impl Fn(&FormEvent) + Send + Sync + 'static,
    ) -> WatchId {
        self.watchers.subscribe(Box::new(callback))
    }

    /// Returns false if the subscription was already gone.
    pub fn unwatch(&mut self, id: WatchId) -> bool {
        self.watchers.unsubscribe(id)
    }

    // --- Derived state ----------------------------------------------------

    fn compute_valid(&self) -> bool {
        self.fields.iter().all(|field| {
            field.rules.is_disabled(&self.values)
                || field
                    .rules
                    .evaluate(value::get(&self.values, &field.path))
                    .is_none()
        })
    }

    fn refresh_status(&mut self) {
        let next = FormStatus {
            is_dirty: self.values != self.defaults,
            is_valid: self.compute_valid(),
            ..self.status
        };
        if next != self.status {
            self.status = next;
            self.watchers.notify(&FormEvent::StatusChanged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn controller() -> FormController {
        FormController::new(json!({
            "username": "Batman",
            "ph_numbers": [{ "number": "" }],
        }))
    }

    #[test]
    fn fresh_controller_is_clean_and_valid() {
        let form = controller();
        let status = form.status();
        assert!(!status.is_dirty);
        assert!(status.is_valid);
        assert_eq!(status.submit_count, 0);
    }

    #[test]
    fn set_value_back_to_default_clears_dirty() {
        let mut form = controller();
        let opts = SetOptions {
            mark_dirty: true,
            ..SetOptions::default()
        };
        form.set_value("username", json!("Robin"), opts).expect("set");
        assert!(form.meta("username").expect("meta").dirty);
        assert!(form.status().is_dirty);

        form.set_value("username", json!("Batman"), opts).expect("set back");
        assert!(!form.meta("username").expect("meta").dirty);
        assert!(!form.status().is_dirty);
    }

    #[test]
    fn unregister_drops_rules_and_errors() {
        let mut form = controller();
        form.register("username", RuleSet::new().required("required"))
            .expect("register");
        form.set_value("username", json!(""), SetOptions::all())
            .expect("set");
        assert_eq!(form.errors().len(), 1);
        assert!(!form.status().is_valid);

        form.unregister("username").expect("unregister");
        assert!(form.errors().is_empty());
        assert!(form.status().is_valid);
    }

    #[test]
    fn remove_refuses_to_empty_a_list() {
        let mut form = controller();
        let err = form.remove("ph_numbers", 0).expect_err("must refuse");
        assert!(matches!(err, FormError::MinimumLength(_)));
    }

    #[test]
    fn submit_clears_the_in_flight_flag() {
        // The reentry guard is the is_submitting flag; a callback observing
        // the controller mid-submit would see it set. Here we check the
        // steady-state transitions around one attempt.
        let mut form = controller();
        let ok = form.submit(|_| {}, |_| {}).expect("submit");
        assert!(ok);
        assert!(!form.status().is_submitting);
        assert_eq!(form.status().submit_count, 1);
    }
}
