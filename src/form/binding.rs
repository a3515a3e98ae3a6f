use std::cell::Cell;
use std::time::Duration;

use futures_timer::Delay;

use super::controller::{BindingId, FormController, FormError, FormResult, ValidationMode};
use super::transform::{ControlKind, ControlValue};
use super::value::{FieldKey, FieldValue};
use crate::contracts::{Disableable, FieldLike};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BindingState {
    Unbound,
    Bound,
    Editing,
    Validated,
}

/// What a control needs to render one field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldView {
    pub key: FieldKey,
    pub kind: ControlKind,
    pub value: ControlValue,
    pub error: Option<String>,
    pub required: bool,
    pub description: Option<String>,
    pub touched: bool,
    /// The form is handing its values to a save callback.
    pub disabled: bool,
}

impl FieldView {
    pub fn apply<C: FieldLike>(&self, control: C) -> C {
        let mut control = control
            .value(self.value.clone())
            .required(self.required)
            .error(self.error.clone());
        if let Some(description) = &self.description {
            control = control.description(description.clone());
        }
        control
    }

    /// [`FieldView::apply`] for controls that can also be locked while the
    /// form is saving.
    pub fn apply_disableable<C: FieldLike + Disableable>(&self, control: C) -> C {
        self.apply(control).disabled(self.disabled)
    }
}

/// Live association between one field and one mounted control.
///
/// Every event runs to completion before returning. Dropping the binding
/// unmounts it; the field's value stays in the form.
pub struct FieldBinding {
    controller: FormController,
    key: FieldKey,
    kind: ControlKind,
    initial: FieldValue,
    id: Cell<Option<BindingId>>,
    state: Cell<BindingState>,
}

impl FormController {
    /// Creates an unmounted binding of `key` to a control of `kind`.
    pub fn binding(&self, key: impl Into<FieldKey>, kind: ControlKind) -> FieldBinding {
        FieldBinding {
            controller: self.clone(),
            key: key.into(),
            kind,
            initial: FieldValue::Empty,
            id: Cell::new(None),
            state: Cell::new(BindingState::Unbound),
        }
    }

    /// Renders the current value and error of `key` onto `control` without
    /// keeping a binding around.
    pub fn bind<C: FieldLike>(
        &self,
        key: impl Into<FieldKey>,
        kind: ControlKind,
        control: C,
    ) -> FormResult<C> {
        Ok(self.view_of(&key.into(), kind)?.apply(control))
    }

    pub fn field_error_for_display(&self, key: &str) -> FormResult<Option<String>> {
        self.error(key)
    }

    fn view_of(&self, key: &FieldKey, kind: ControlKind) -> FormResult<FieldView> {
        let value = self.value(key.as_str())?.unwrap_or_default();
        let meta = self.field_meta(key.as_str())?.unwrap_or_default();
        Ok(FieldView {
            key: key.clone(),
            kind,
            value: kind.to_control(&value),
            error: meta.error,
            required: self.is_required(key.as_str())?,
            description: self.field_description(key.as_str())?,
            touched: meta.touched,
            disabled: self.is_submitting()?,
        })
    }
}

impl FieldBinding {
    /// Value registered for the field on mount when the form does not have
    /// it yet. Ignored if the field already exists.
    pub fn with_initial(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial = value.into();
        self
    }

    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn state(&self) -> BindingState {
        self.state.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.state.get() != BindingState::Unbound
    }

    pub fn mount(&self) -> FormResult<FieldView> {
        if self.is_mounted() {
            return self.view();
        }
        let id = self
            .controller
            .subscribe(&self.key, self.initial.clone())?;
        self.id.set(Some(id));
        self.transition(BindingState::Bound)?;
        tracing::debug!(field = %self.key, binding = id.0, kind = ?self.kind, "binding mounted");
        self.view()
    }

    /// Handles one change event from the control: converts the payload,
    /// stores it and, when the form validates on change, runs the field's
    /// rules once.
    pub fn input(&self, value: impl Into<ControlValue>) -> FormResult<FieldView> {
        if !self.is_mounted() {
            tracing::warn!(field = %self.key, "input on unmounted binding ignored");
            return self.view();
        }
        self.transition(BindingState::Editing)?;
        let internal = self.write(value.into())?;
        if self.controller.options.validate_mode == ValidationMode::OnChange {
            let result = self.controller.validate_field(self.key.as_str())?;
            self.transition(BindingState::Validated)?;
            tracing::trace!(field = %self.key, value = ?internal, valid = result.is_valid(), "field edited");
        }
        self.transition(BindingState::Bound)?;
        self.view()
    }

    /// Stores the edit right away but validates only after `delay`, and only
    /// if no newer edit of the same field arrived meanwhile.
    pub async fn input_debounced(
        &self,
        value: impl Into<ControlValue>,
        delay: Duration,
    ) -> FormResult<FieldView> {
        if !self.is_mounted() {
            tracing::warn!(field = %self.key, "debounced input on unmounted binding ignored");
            return self.view();
        }
        self.transition(BindingState::Editing)?;
        self.write(value.into())?;
        if self.controller.options.validate_mode != ValidationMode::OnChange {
            self.transition(BindingState::Bound)?;
            return self.view();
        }

        let ticket = self.controller.next_ticket(&self.key)?;
        self.transition(BindingState::Bound)?;
        if !delay.is_zero() {
            Delay::new(delay).await;
        }
        if self.controller.is_latest_ticket(&self.key, ticket)? {
            self.controller.validate_field(self.key.as_str())?;
        } else {
            tracing::trace!(field = %self.key, ticket = ticket.0, "superseded edit skipped validation");
        }
        self.view()
    }

    pub fn blur(&self) -> FormResult<FieldView> {
        if self.is_mounted() {
            self.controller.touch(self.key.as_str())?;
        }
        self.view()
    }

    /// Stops rendering the field through this binding. The stored value and
    /// error are left as they are.
    pub fn unmount(&self) -> FormResult<()> {
        let Some(id) = self.id.take() else {
            return Ok(());
        };
        self.controller.unsubscribe(&self.key, id)?;
        self.state.set(BindingState::Unbound);
        tracing::debug!(field = %self.key, binding = id.0, "binding unmounted");
        Ok(())
    }

    pub fn view(&self) -> FormResult<FieldView> {
        self.controller.view_of(&self.key, self.kind)
    }

    pub fn render<C: FieldLike>(&self, control: C) -> FormResult<C> {
        Ok(self.view()?.apply(control))
    }

    pub fn render_disableable<C: FieldLike + Disableable>(&self, control: C) -> FormResult<C> {
        Ok(self.view()?.apply_disableable(control))
    }

    fn write(&self, value: ControlValue) -> FormResult<FieldValue> {
        let internal = self.kind.to_internal(&value);
        self.controller
            .set_value(self.key.clone(), internal.clone())?;
        Ok(internal)
    }

    fn transition(&self, next: BindingState) -> FormResult<()> {
        let current = self.state.get();
        let allowed = matches!(
            (current, next),
            (BindingState::Unbound, BindingState::Bound)
                | (BindingState::Bound, BindingState::Editing)
                | (BindingState::Editing, BindingState::Validated)
                | (BindingState::Editing, BindingState::Bound)
                | (BindingState::Validated, BindingState::Bound)
                | (_, BindingState::Unbound)
        );
        if !allowed {
            return Err(FormError::InvalidBindingTransition {
                from: current,
                to: next,
            });
        }
        self.state.set(next);
        Ok(())
    }
}

impl Drop for FieldBinding {
    fn drop(&mut self) {
        if let Err(error) = self.unmount() {
            tracing::warn!(field = %self.key, %error, "failed to unmount binding on drop");
        }
    }
}
