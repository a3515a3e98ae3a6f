use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use super::binding::BindingState;
use super::registry::{FieldMeta, FieldRegistry};
use super::validation::{self, EmptyPolicy, FieldRule, RuleEvaluation, ValidationResult};
use super::value::{FieldKey, FieldValue, FormValues};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ValidationTicket(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    #[default]
    OnChange,
    OnBlur,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
    pub rule_evaluation: RuleEvaluation,
    pub empty_policy: EmptyPolicy,
}

#[derive(Clone, Debug)]
pub struct FormSnapshot {
    pub values: FormValues,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub field_meta: BTreeMap<FieldKey, FieldMeta>,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("invalid binding state transition: {from:?} -> {to:?}")]
    InvalidBindingTransition { from: BindingState, to: BindingState },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid form definition: {0}")]
    InvalidDefinition(String),
    #[error("field `{field}` does not hold a {expected} value")]
    FieldType { field: FieldKey, expected: &'static str },
    #[error("failed to load draft: {0}")]
    DraftLoadFailed(String),
    #[error("failed to save draft: {0}")]
    DraftSaveFailed(String),
    #[error("failed to clear draft: {0}")]
    DraftClearFailed(String),
}

pub type FormResult<T> = Result<T, FormError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BindingId(pub u64);

pub(super) struct FormState {
    pub(super) id: FormId,
    pub(super) registry: FieldRegistry,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) tickets: BTreeMap<FieldKey, ValidationTicket>,
    pub(super) subscriptions: BTreeMap<FieldKey, BTreeSet<BindingId>>,
    pub(super) next_binding: u64,
}

/// Shared handle to one form's state and rules. Clones refer to the same
/// form; every binding of the form holds one.
#[derive(Clone)]
pub struct FormController {
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) rules: Arc<RwLock<BTreeMap<FieldKey, Vec<FieldRule>>>>,
    pub(super) field_descriptions: Arc<RwLock<BTreeMap<FieldKey, String>>>,
}

impl FormController {
    pub fn new(options: FormOptions) -> Self {
        Self::with_id(FormId::next(), options)
    }

    /// Creates a form with a caller-chosen id, so drafts saved by an earlier
    /// instance of the same page can be found again.
    pub fn with_id(id: FormId, options: FormOptions) -> Self {
        Self::from_registry(id, FieldRegistry::new(), options)
    }

    /// Creates a form pre-populated with `initial`, as loaded from a record.
    pub fn with_values(initial: FormValues, options: FormOptions) -> Self {
        let mut registry = FieldRegistry::new();
        for (key, value) in initial {
            registry.register(key, value);
        }
        Self::from_registry(FormId::next(), registry, options)
    }

    fn from_registry(id: FormId, registry: FieldRegistry, options: FormOptions) -> Self {
        Self {
            options,
            state: Arc::new(RwLock::new(FormState {
                id,
                registry,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                tickets: BTreeMap::new(),
                subscriptions: BTreeMap::new(),
                next_binding: 0,
            })),
            rules: Arc::new(RwLock::new(BTreeMap::new())),
            field_descriptions: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    /// Adds a field unless it already exists. Returns whether it was new.
    pub fn register(&self, key: impl Into<FieldKey>, initial: FieldValue) -> FormResult<bool> {
        let key = key.into();
        let created = write_lock(&self.state, "registering field")?
            .registry
            .register(key.clone(), initial);
        if created {
            tracing::debug!(field = %key, "registered form field");
        }
        Ok(created)
    }

    /// Appends a rule to `key`, registering the field with an empty value if
    /// it is not known yet so submit always sees it.
    pub fn register_rule(&self, key: impl Into<FieldKey>, rule: FieldRule) -> FormResult<()> {
        let key = key.into();
        self.register(key.clone(), FieldValue::Empty)?;
        let mut rules = write_lock(&self.rules, "registering field rule")?;
        rules.entry(key).or_default().push(rule);
        Ok(())
    }

    pub fn register_rules(
        &self,
        key: impl Into<FieldKey>,
        rules: impl IntoIterator<Item = FieldRule>,
    ) -> FormResult<()> {
        let key = key.into();
        for rule in rules {
            self.register_rule(key.clone(), rule)?;
        }
        Ok(())
    }

    pub fn register_field_description(
        &self,
        key: impl Into<FieldKey>,
        description: impl Into<String>,
    ) -> FormResult<()> {
        let mut descriptions =
            write_lock(&self.field_descriptions, "registering field description")?;
        descriptions.insert(key.into(), description.into());
        Ok(())
    }

    pub fn value(&self, key: &str) -> FormResult<Option<FieldValue>> {
        Ok(read_lock(&self.state, "reading field value")?
            .registry
            .get(key)
            .cloned())
    }

    /// Writes a value without running any rule.
    pub fn set_value(&self, key: impl Into<FieldKey>, value: FieldValue) -> FormResult<()> {
        write_lock(&self.state, "writing field value")?
            .registry
            .set(key, value);
        Ok(())
    }

    /// Writes a value as a user edit: the field's rules run afterwards when
    /// the form validates on change.
    pub fn change(&self, key: impl Into<FieldKey>, value: FieldValue) -> FormResult<()> {
        let key = key.into();
        self.set_value(key.clone(), value)?;
        if self.options.validate_mode == ValidationMode::OnChange {
            self.validate_field(key.as_str())?;
        }
        Ok(())
    }

    /// Marks a registered field as visited. Unregistered keys are ignored.
    pub fn touch(&self, key: &str) -> FormResult<()> {
        let known = write_lock(&self.state, "touching field")?
            .registry
            .touch(key);
        if known && self.options.validate_mode == ValidationMode::OnBlur {
            self.validate_field(key)?;
        }
        Ok(())
    }

    pub fn error(&self, key: &str) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading field error")?
            .registry
            .error(key)
            .map(str::to_owned))
    }

    /// Sets or clears an error directly, for checks layered on top of the
    /// declared rules (for example a uniqueness answer from the server).
    /// Unregistered keys are ignored.
    pub fn set_error(&self, key: &str, message: Option<String>) -> FormResult<()> {
        write_lock(&self.state, "writing field error")?
            .registry
            .set_error(key, message);
        Ok(())
    }

    /// Runs the rules of one field and stores the outcome in the error map.
    /// An unregistered key is valid and leaves the form untouched.
    pub fn validate_field(&self, key: &str) -> FormResult<ValidationResult> {
        let Some(value) = self.value(key)? else {
            tracing::trace!(field = key, "skipped validation of unregistered field");
            return Ok(ValidationResult::Valid);
        };
        let result = {
            let rules = read_lock(&self.rules, "reading field rules")?;
            let rules = rules.get(key).map(Vec::as_slice).unwrap_or_default();
            validation::validate(key, &value, rules, &self.options)
        };
        write_lock(&self.state, "writing field validation result")?
            .registry
            .set_error(key, result.message().map(str::to_owned));
        Ok(result)
    }

    /// Validates every registered field. Returns whether all passed.
    pub fn validate_form(&self) -> FormResult<bool> {
        let keys = self.field_keys()?;
        let mut valid = true;
        for key in keys {
            valid &= self.validate_field(key.as_str())?.is_valid();
        }
        Ok(valid)
    }

    pub fn field_keys(&self) -> FormResult<Vec<FieldKey>> {
        Ok(read_lock(&self.state, "reading field keys")?
            .registry
            .keys()
            .cloned()
            .collect())
    }

    pub fn values(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?
            .registry
            .values())
    }

    pub fn reset_to_initial(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        state.registry.reset();
        state.submit_state = SubmitState::Idle;
        state.tickets.clear();
        Ok(())
    }

    pub fn reset_field(&self, key: &str) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting field")?;
        state.registry.reset_field(key);
        state.tickets.remove(key);
        Ok(())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        write_lock(&self.state, "clearing all field errors")?
            .registry
            .clear_errors();
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        let field_meta = state
            .registry
            .keys()
            .filter_map(|key| {
                state
                    .registry
                    .meta(key.as_str())
                    .map(|meta| (key.clone(), meta.clone()))
            })
            .collect();
        Ok(FormSnapshot {
            values: state.registry.values(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            is_dirty: state.registry.is_dirty(),
            is_valid: !state.registry.has_errors(),
            field_meta,
        })
    }

    pub fn field_meta(&self, key: &str) -> FormResult<Option<FieldMeta>> {
        Ok(read_lock(&self.state, "reading field meta")?
            .registry
            .meta(key)
            .cloned())
    }

    pub fn field_description(&self, key: &str) -> FormResult<Option<String>> {
        Ok(
            read_lock(&self.field_descriptions, "reading field description")?
                .get(key)
                .cloned(),
        )
    }

    pub fn is_required(&self, key: &str) -> FormResult<bool> {
        Ok(read_lock(&self.rules, "reading required rules")?
            .get(key)
            .is_some_and(|rules| rules.iter().any(FieldRule::is_required)))
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state == SubmitState::Submitting)
    }

    /// Number of mounted bindings rendering `key`.
    pub fn subscriber_count(&self, key: &str) -> FormResult<usize> {
        Ok(read_lock(&self.state, "reading subscriptions")?
            .subscriptions
            .get(key)
            .map_or(0, BTreeSet::len))
    }

    pub(super) fn subscribe(&self, key: &FieldKey, initial: FieldValue) -> FormResult<BindingId> {
        let mut state = write_lock(&self.state, "subscribing binding")?;
        state.next_binding += 1;
        let id = BindingId(state.next_binding);
        state.registry.register(key.clone(), initial);
        state
            .subscriptions
            .entry(key.clone())
            .or_default()
            .insert(id);
        Ok(id)
    }

    pub(super) fn unsubscribe(&self, key: &FieldKey, id: BindingId) -> FormResult<()> {
        let mut state = write_lock(&self.state, "unsubscribing binding")?;
        if let Some(bindings) = state.subscriptions.get_mut(key) {
            bindings.remove(&id);
            if bindings.is_empty() {
                state.subscriptions.remove(key);
            }
        }
        Ok(())
    }

    pub(super) fn next_ticket(&self, key: &FieldKey) -> FormResult<ValidationTicket> {
        let mut state = write_lock(&self.state, "issuing validation ticket")?;
        let next = ValidationTicket(state.tickets.get(key).map_or(0, |ticket| ticket.0) + 1);
        state.tickets.insert(key.clone(), next);
        if let Some(meta) = state.registry.meta_mut(key.as_str()) {
            meta.validating = true;
        }
        Ok(next)
    }

    pub(super) fn is_latest_ticket(
        &self,
        key: &FieldKey,
        ticket: ValidationTicket,
    ) -> FormResult<bool> {
        Ok(read_lock(&self.state, "checking latest validation ticket")?
            .tickets
            .get(key)
            .copied()
            == Some(ticket))
    }
}

pub(super) fn transition_submit_state(state: &mut FormState, next: SubmitState) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Validating, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
