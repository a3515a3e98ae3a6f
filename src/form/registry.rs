use std::collections::BTreeMap;

use super::value::{FieldKey, FieldValue, FormValues};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldMeta {
    pub dirty: bool,
    pub touched: bool,
    pub validating: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct FieldSlot {
    pub(super) initial: FieldValue,
    pub(super) value: FieldValue,
    pub(super) meta: FieldMeta,
}

/// Field name to value/error storage for a single form.
///
/// The registry never validates. Callers decide when to run rules and write
/// the outcome back through [`FieldRegistry::set_error`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldRegistry {
    slots: BTreeMap<FieldKey, FieldSlot>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` with `initial` unless it is already present. Returns whether
    /// a new slot was created.
    pub fn register(&mut self, key: impl Into<FieldKey>, initial: FieldValue) -> bool {
        let key = key.into();
        if self.slots.contains_key(&key) {
            return false;
        }
        self.slots.insert(
            key,
            FieldSlot {
                initial: initial.clone(),
                value: initial,
                meta: FieldMeta::default(),
            },
        );
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    /// Writes a value, creating the slot with an `Empty` initial value when
    /// the field was never registered.
    pub fn set(&mut self, key: impl Into<FieldKey>, value: FieldValue) {
        let slot = self.slots.entry(key.into()).or_default();
        slot.meta.dirty = value != slot.initial;
        slot.value = value;
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.slots
            .get(key)
            .and_then(|slot| slot.meta.error.as_deref())
    }

    /// Writes the error of a registered field. Returns false, changing
    /// nothing, when `key` is unknown.
    pub fn set_error(&mut self, key: &str, message: Option<String>) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };
        slot.meta.validating = false;
        slot.meta.error = message;
        true
    }

    pub fn touch(&mut self, key: &str) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };
        slot.meta.touched = true;
        true
    }

    pub fn meta(&self, key: &str) -> Option<&FieldMeta> {
        self.slots.get(key).map(|slot| &slot.meta)
    }

    pub(super) fn meta_mut(&mut self, key: &str) -> Option<&mut FieldMeta> {
        self.slots.get_mut(key).map(|slot| &mut slot.meta)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.slots.keys()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.slots.values().any(|slot| slot.meta.dirty)
    }

    pub fn has_errors(&self) -> bool {
        self.slots.values().any(|slot| slot.meta.error.is_some())
    }

    pub fn first_error(&self) -> Option<(&FieldKey, &str)> {
        self.slots
            .iter()
            .find_map(|(key, slot)| slot.meta.error.as_deref().map(|error| (key, error)))
    }

    pub fn values(&self) -> FormValues {
        self.slots
            .iter()
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect()
    }

    pub fn errors(&self) -> BTreeMap<FieldKey, String> {
        self.slots
            .iter()
            .filter_map(|(key, slot)| slot.meta.error.clone().map(|error| (key.clone(), error)))
            .collect()
    }

    /// Restores every field to its initial value and clears flags and errors.
    pub fn reset(&mut self) {
        for slot in self.slots.values_mut() {
            slot.value = slot.initial.clone();
            slot.meta = FieldMeta::default();
        }
    }

    pub fn reset_field(&mut self, key: &str) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.value = slot.initial.clone();
            slot.meta = FieldMeta::default();
        }
    }

    pub fn clear_errors(&mut self) {
        for slot in self.slots.values_mut() {
            slot.meta.error = None;
            slot.meta.validating = false;
        }
    }

    /// Replaces current values with `values` for known fields, marking them
    /// dirty relative to their initial values. Unknown keys are registered.
    pub(super) fn load_values(&mut self, values: FormValues) {
        for (key, value) in values {
            self.set(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let mut registry = FieldRegistry::new();
        assert!(registry.register("username", "alice".into()));
        registry.set("username", "bob".into());
        assert!(!registry.register("username", "carol".into()));
        assert_eq!(registry.get("username"), Some(&FieldValue::from("bob")));
    }

    #[test]
    fn set_tracks_dirty_against_initial() {
        let mut registry = FieldRegistry::new();
        registry.register("size", "large".into());
        registry.set("size", "small".into());
        assert!(registry.meta("size").expect("meta").dirty);
        registry.set("size", "large".into());
        assert!(!registry.is_dirty());
    }

    #[test]
    fn set_creates_missing_slot() {
        let mut registry = FieldRegistry::new();
        registry.set("late", true.into());
        assert!(registry.contains("late"));
        assert_eq!(registry.get("late"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn errors_are_independent_of_values() {
        let mut registry = FieldRegistry::new();
        registry.register("email", "x".into());
        registry.set_error("email", Some("invalid".into()));
        assert_eq!(registry.error("email"), Some("invalid"));
        assert_eq!(registry.get("email"), Some(&FieldValue::from("x")));
        registry.set_error("email", None);
        assert_eq!(registry.error("email"), None);
        assert!(!registry.has_errors());
    }

    #[test]
    fn errors_and_touch_never_create_fields() {
        let mut registry = FieldRegistry::new();
        assert!(!registry.set_error("typo", Some("invalid".into())));
        assert!(!registry.touch("typo"));
        assert!(registry.is_empty());
        assert_eq!(registry.error("typo"), None);
    }

    #[test]
    fn reset_restores_initial_values() {
        let mut registry = FieldRegistry::new();
        registry.register("a", "1".into());
        registry.register("b", FieldValue::Empty);
        registry.set("a", "2".into());
        registry.set("b", "3".into());
        registry.set_error("a", Some("bad".into()));
        registry.touch("a");
        registry.reset();
        assert_eq!(registry.get("a"), Some(&FieldValue::from("1")));
        assert_eq!(registry.get("b"), Some(&FieldValue::Empty));
        assert_eq!(registry.meta("a"), Some(&FieldMeta::default()));
    }
}
