use serde::{Deserialize, Serialize};

use super::controller::{FormController, FormError, FormOptions, FormResult};
use super::transform::{ControlKind, ControlValue};
use super::validation::{Bound, FieldRule};
use super::value::{FieldKey, FieldValue, FormValues};

/// Page-level declaration of a form: its options and, per field, the control
/// used to edit it, an initial value and the rules it must satisfy.
///
/// ```json
/// {
///   "options": { "empty_policy": "trimmed" },
///   "fields": [
///     { "name": "name", "control": "text", "rules": [{ "kind": "required" }] },
///     { "name": "opens_on", "control": "date", "initial": "2024-05-01" }
///   ]
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub options: FormOptions,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: FieldKey,
    #[serde(default)]
    pub control: ControlKind,
    /// Initial value in the control's own terms; parsed with the control's
    /// transform, so `"2024-05-01"` becomes a date for a date control.
    #[serde(default)]
    pub initial: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    Required {
        #[serde(default)]
        message: Option<String>,
    },
    Pattern {
        pattern: String,
        #[serde(default)]
        message: Option<String>,
    },
    MinLength {
        min: usize,
        #[serde(default)]
        message: Option<String>,
    },
    MaxLength {
        max: usize,
        #[serde(default)]
        message: Option<String>,
    },
    Min {
        bound: Bound,
        #[serde(default)]
        message: Option<String>,
    },
    Max {
        bound: Bound,
        #[serde(default)]
        message: Option<String>,
    },
}

impl RuleSpec {
    pub fn to_rule(&self) -> FormResult<FieldRule> {
        let (rule, message) = match self {
            RuleSpec::Required { message } => (FieldRule::required(), message),
            RuleSpec::Pattern { pattern, message } => (FieldRule::pattern(pattern)?, message),
            RuleSpec::MinLength { min, message } => (FieldRule::min_length(*min), message),
            RuleSpec::MaxLength { max, message } => (FieldRule::max_length(*max), message),
            RuleSpec::Min { bound, message } => (FieldRule::min(*bound), message),
            RuleSpec::Max { bound, message } => (FieldRule::max(*bound), message),
        };
        Ok(match message {
            Some(message) => rule.with_message(message.clone()),
            None => rule,
        })
    }
}

impl FieldDefinition {
    pub fn initial_value(&self) -> FieldValue {
        let control = match &self.initial {
            serde_json::Value::String(text) => ControlValue::Text(text.clone()),
            serde_json::Value::Bool(value) => ControlValue::Toggle(*value),
            serde_json::Value::Number(number) => ControlValue::Text(number.to_string()),
            _ => self.control.blank(),
        };
        self.control.to_internal(&control)
    }
}

impl FormDefinition {
    pub fn from_json(source: &str) -> FormResult<Self> {
        serde_json::from_str(source).map_err(|error| FormError::InvalidDefinition(error.to_string()))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name.as_str() == name)
    }

    pub fn control_kind(&self, name: &str) -> Option<ControlKind> {
        self.field(name).map(|field| field.control)
    }

    /// Builds a controller with every declared field registered.
    pub fn build(&self) -> FormResult<FormController> {
        self.build_with(FormValues::new())
    }

    /// Builds a controller, taking initial values from `loaded` where present
    /// and from the definition otherwise.
    pub fn build_with(&self, loaded: FormValues) -> FormResult<FormController> {
        let mut duplicates = self.fields.iter().map(|field| &field.name).collect::<Vec<_>>();
        duplicates.sort();
        if let Some(pair) = duplicates.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(FormError::InvalidDefinition(format!(
                "field `{}` is declared twice",
                pair[0]
            )));
        }

        let controller = FormController::new(self.options);
        for (key, value) in loaded.iter() {
            controller.register(key.clone(), value.clone())?;
        }
        for field in &self.fields {
            controller.register(field.name.clone(), field.initial_value())?;
            for spec in &field.rules {
                controller.register_rule(field.name.clone(), spec.to_rule()?)?;
            }
            if let Some(description) = &field.description {
                controller.register_field_description(field.name.clone(), description.clone())?;
            }
        }
        tracing::debug!(fields = self.fields.len(), "built form from definition");
        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    const STORE_SETTINGS: &str = r#"{
        "options": { "validate_mode": "on_change", "empty_policy": "trimmed" },
        "fields": [
            { "name": "store_name", "rules": [{ "kind": "required", "message": "name is required" }] },
            { "name": "opens_on", "control": "date", "initial": "2024-05-01" },
            { "name": "delivery_fee", "control": "number", "initial": 2.5,
              "rules": [{ "kind": "max", "bound": { "number": "10" } }] },
            { "name": "accepting_orders", "control": "switch", "initial": true,
              "description": "Pause to stop new orders" }
        ]
    }"#;

    #[test]
    fn initial_values_go_through_control_transforms() {
        let definition = FormDefinition::from_json(STORE_SETTINGS).expect("definition parses");
        let form = definition.build().expect("form builds");

        assert_eq!(
            form.value("opens_on").expect("value"),
            Some(FieldValue::Date(
                NaiveDate::from_ymd_opt(2024, 5, 1).expect("date")
            ))
        );
        assert_eq!(
            form.value("delivery_fee").expect("value"),
            Some(FieldValue::Number(Decimal::new(25, 1)))
        );
        assert_eq!(
            form.value("accepting_orders").expect("value"),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(form.value("store_name").expect("value"), Some(FieldValue::Empty));
        assert_eq!(definition.control_kind("opens_on"), Some(ControlKind::Date));
        assert!(form.is_required("store_name").expect("required"));
        assert_eq!(
            form.field_description("accepting_orders").expect("description"),
            Some("Pause to stop new orders".to_string())
        );
    }

    #[test]
    fn loaded_values_win_over_declared_initials() {
        let definition = FormDefinition::from_json(STORE_SETTINGS).expect("definition parses");
        let loaded = FormValues::new().with("store_name", "Napoli Express");
        let form = definition.build_with(loaded).expect("form builds");
        assert_eq!(
            form.value("store_name").expect("value"),
            Some(FieldValue::from("Napoli Express"))
        );
    }

    #[test]
    fn declared_rules_are_enforced() {
        let form = FormDefinition::from_json(STORE_SETTINGS)
            .expect("definition parses")
            .build()
            .expect("form builds");
        let outcome = form.submit().expect("submit runs");
        assert_eq!(outcome.error_for("store_name"), Some("name is required"));
        assert_eq!(outcome.error_for("delivery_fee"), None);
    }

    #[test]
    fn malformed_definitions_are_rejected() {
        assert!(matches!(
            FormDefinition::from_json("{ \"fields\": 3 }"),
            Err(FormError::InvalidDefinition(_))
        ));

        let duplicate = r#"{ "fields": [ { "name": "a" }, { "name": "a" } ] }"#;
        let definition = FormDefinition::from_json(duplicate).expect("parses");
        assert!(matches!(
            definition.build(),
            Err(FormError::InvalidDefinition(_))
        ));

        let bad_pattern = r#"{ "fields": [ { "name": "a", "rules": [ { "kind": "pattern", "pattern": "(" } ] } ] }"#;
        let definition = FormDefinition::from_json(bad_pattern).expect("parses");
        assert!(matches!(
            definition.build(),
            Err(FormError::InvalidPattern { .. })
        ));
    }
}
