pub use crate::contracts::{ControlProps, Disableable, FieldLike};
pub use crate::feedback::{LoadingGuard, LoadingScope};
pub use crate::form::{
    ControlKind, ControlValue, FieldBinding, FieldKey, FieldRule, FieldValue, FieldView,
    FormController, FormDefinition, FormError, FormOptions, FormRecord, FormResult, FormValues,
    SubmitOutcome, ValidationMode,
};
