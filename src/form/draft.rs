use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use super::controller::{FormController, FormError, FormId, FormResult, read_lock, write_lock};
use super::value::FormValues;

/// Storage for unsubmitted form values, keyed by form id.
pub trait FormDraftStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save(&self, form_id: FormId, values: &FormValues) -> Result<(), Self::Error>;
    fn load(&self, form_id: FormId) -> Result<Option<FormValues>, Self::Error>;
    fn clear(&self, form_id: FormId) -> Result<(), Self::Error>;
}

#[derive(Clone, Default)]
pub struct InMemoryDraftStore {
    state: Arc<RwLock<BTreeMap<FormId, FormValues>>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormDraftStore for InMemoryDraftStore {
    type Error = Infallible;

    fn save(&self, form_id: FormId, values: &FormValues) -> Result<(), Self::Error> {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.insert(form_id, values.clone());
        Ok(())
    }

    fn load(&self, form_id: FormId) -> Result<Option<FormValues>, Self::Error> {
        let state = match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(state.get(&form_id).cloned())
    }

    fn clear(&self, form_id: FormId) -> Result<(), Self::Error> {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.remove(&form_id);
        Ok(())
    }
}

impl FormController {
    pub fn save_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        let state = read_lock(&self.state, "saving draft")?;
        store
            .save(state.id, &state.registry.values())
            .map_err(|error| FormError::DraftSaveFailed(error.to_string()))
    }

    /// Restores a saved draft over the current values. Restored fields count
    /// as dirty and carry no errors until validated again.
    pub fn load_draft<S>(&self, store: &S) -> FormResult<bool>
    where
        S: FormDraftStore,
    {
        let form_id = self.form_id()?;
        let Some(draft) = store
            .load(form_id)
            .map_err(|error| FormError::DraftLoadFailed(error.to_string()))?
        else {
            return Ok(false);
        };

        let mut state = write_lock(&self.state, "loading draft into form")?;
        state.registry.load_values(draft);
        state.registry.clear_errors();
        state.submit_state = super::controller::SubmitState::Idle;
        state.submit_count = 0;
        state.tickets.clear();
        tracing::debug!(form = form_id.0, "restored form draft");
        Ok(true)
    }

    pub fn clear_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        let form_id = self.form_id()?;
        store
            .clear(form_id)
            .map_err(|error| FormError::DraftClearFailed(error.to_string()))
    }
}
