use std::future::Future;

use super::controller::{
    FormController, FormError, FormResult, SubmitState, transition_submit_state, write_lock,
};
use super::validation::FieldValidationError;
use super::value::FormValues;
use crate::feedback::LoadingScope;

/// Result of a submit attempt. Success needs every registered field to pass.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    Accepted { values: FormValues },
    Rejected { errors: Vec<FieldValidationError> },
}

impl SubmitOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { .. })
    }

    pub fn values(&self) -> Option<&FormValues> {
        match self {
            SubmitOutcome::Accepted { values } => Some(values),
            SubmitOutcome::Rejected { .. } => None,
        }
    }

    pub fn errors(&self) -> &[FieldValidationError] {
        match self {
            SubmitOutcome::Accepted { .. } => &[],
            SubmitOutcome::Rejected { errors } => errors,
        }
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors()
            .iter()
            .find(|error| error.field.as_str() == key)
            .map(|error| error.message.as_str())
    }
}

impl FormController {
    /// Validates every registered field, touched or not, and reports the
    /// aggregate outcome. Passing fields have their stale errors cleared.
    pub fn submit(&self) -> FormResult<SubmitOutcome> {
        self.begin_submit()?;
        let outcome = self.evaluate_submit()?;
        let next = if outcome.is_ok() {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        };
        self.finish_submit(next)?;
        Ok(outcome)
    }

    /// Like [`FormController::submit`], then hands accepted values to `save`.
    /// `save` never runs for a rejected form.
    pub fn submit_with<F, E>(&self, save: F) -> FormResult<Result<SubmitOutcome, E>>
    where
        F: FnOnce(&FormValues) -> Result<(), E>,
    {
        self.begin_submit()?;
        let outcome = self.evaluate_submit()?;
        let SubmitOutcome::Accepted { values } = &outcome else {
            self.finish_submit(SubmitState::Failed)?;
            return Ok(Ok(outcome));
        };

        transition_submit_state(
            &mut *write_lock(&self.state, "moving submit state to submitting")?,
            SubmitState::Submitting,
        )?;
        let saved = save(values);
        self.finish_submit(if saved.is_ok() {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        })?;
        Ok(saved.map(|()| outcome))
    }

    pub async fn submit_async<F, Fut, E>(&self, save: F) -> FormResult<Result<SubmitOutcome, E>>
    where
        F: FnOnce(FormValues) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.begin_submit()?;
        let outcome = self.evaluate_submit()?;
        let SubmitOutcome::Accepted { values } = &outcome else {
            self.finish_submit(SubmitState::Failed)?;
            return Ok(Ok(outcome));
        };

        transition_submit_state(
            &mut *write_lock(&self.state, "moving async submit state to submitting")?,
            SubmitState::Submitting,
        )?;
        let saved = save(values.clone()).await;
        self.finish_submit(if saved.is_ok() {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        })?;
        Ok(saved.map(|()| outcome))
    }

    /// Submits while `loading` reports activity.
    pub fn submit_in<F, E>(
        &self,
        loading: &LoadingScope,
        save: F,
    ) -> FormResult<Result<SubmitOutcome, E>>
    where
        F: FnOnce(&FormValues) -> Result<(), E>,
    {
        let _guard = loading.begin("submitting form");
        self.submit_with(save)
    }

    fn begin_submit(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "preparing submit")?;
        if state.submit_state == SubmitState::Submitting {
            return Err(FormError::AlreadySubmitting);
        }
        transition_submit_state(&mut state, SubmitState::Validating)?;
        state.submit_count = state.submit_count.saturating_add(1);
        Ok(())
    }

    fn finish_submit(&self, next: SubmitState) -> FormResult<()> {
        transition_submit_state(&mut *write_lock(&self.state, "completing submit")?, next)
    }

    fn evaluate_submit(&self) -> FormResult<SubmitOutcome> {
        let mut errors = Vec::new();
        for key in self.field_keys()? {
            if let Some(message) = self.validate_field(key.as_str())?.into_message() {
                errors.push(FieldValidationError {
                    field: key,
                    message,
                });
            }
        }

        if errors.is_empty() {
            let values = self.values()?;
            tracing::debug!(fields = values.len(), "form submit accepted");
            Ok(SubmitOutcome::Accepted { values })
        } else {
            tracing::debug!(failed = errors.len(), "form submit rejected");
            Ok(SubmitOutcome::Rejected { errors })
        }
    }
}
