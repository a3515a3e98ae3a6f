mod binding;
mod controller;
mod definition;
mod draft;
mod record;
mod registry;
pub mod rich_text;
mod submit;
mod transform;
mod validation;
mod value;


pub use binding::{BindingState, FieldBinding, FieldView};
pub use controller::{
    BindingId, FormController, FormError, FormId, FormOptions, FormResult, FormSnapshot,
    SubmitState, ValidationMode, ValidationTicket,
};
pub use definition::{FieldDefinition, FormDefinition, RuleSpec};
pub use draft::{FormDraftStore, InMemoryDraftStore};
pub use formbind_derive::FormRecord;
pub use record::{FormRecord, FromFieldValue, ToFieldValue, read_field};
pub use registry::{FieldMeta, FieldRegistry};
pub use submit::SubmitOutcome;
pub use transform::{
    ControlKind, ControlValue, DATE_DISPLAY_FORMAT, DATE_TIME_DISPLAY_FORMAT, DateTimeTransform,
    DateTransform, MultilineTransform, NumberTransform, RichTextTransform, SwitchTransform,
    TextTransform, ValueTransform, parse_date, parse_date_time, parse_number,
};
pub use validation::{
    Bound, EmptyPolicy, FieldPredicate, FieldRule, FieldValidationError, Rule, RuleEvaluation,
    ValidationResult, validate,
};
pub use value::{FieldKey, FieldValue, FormValues};
