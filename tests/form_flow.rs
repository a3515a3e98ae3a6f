use formbind::prelude::*;
use formbind::form::{FieldDefinition, SubmitState};

const CHECKOUT: &str = r#"{
    "options": { "validate_mode": "on_blur", "rule_evaluation": "first_failure" },
    "fields": [
        { "name": "email", "rules": [
            { "kind": "required", "message": "{field} is required" },
            { "kind": "pattern", "pattern": "^[^@\\s]+@[^@\\s]+$", "message": "enter a valid email" }
        ] },
        { "name": "quantity", "control": "number", "initial": 1,
          "rules": [{ "kind": "min", "bound": { "number": "1" } }, { "kind": "max", "bound": { "number": "5" } }] },
        { "name": "gift_note", "control": "rich_text" }
    ]
}"#;

fn checkout() -> (FormDefinition, FormController) {
    let definition = FormDefinition::from_json(CHECKOUT).expect("definition parses");
    let form = definition.build().expect("form builds");
    (definition, form)
}

fn kind_of(definition: &FormDefinition, name: &str) -> ControlKind {
    definition
        .field(name)
        .map(|field: &FieldDefinition| field.control)
        .expect("declared field")
}

#[test]
fn checkout_form_reports_errors_after_blur_and_submits_once_fixed() {
    let (definition, form) = checkout();
    let email = form.binding("email", kind_of(&definition, "email"));
    let quantity = form.binding("quantity", kind_of(&definition, "quantity"));
    email.mount().expect("mount email");
    quantity.mount().expect("mount quantity");

    email.input("not-an-email").expect("type email");
    assert_eq!(email.view().expect("view").error, None);
    let view = email.blur().expect("blur email");
    assert_eq!(view.error.as_deref(), Some("enter a valid email"));

    quantity.input(9.0).expect("set quantity");
    let outcome = form.submit().expect("submit");
    assert_eq!(outcome.error_for("email"), Some("enter a valid email"));
    assert_eq!(outcome.error_for("quantity"), Some("must be at most 5"));
    assert_eq!(outcome.error_for("gift_note"), None);

    email.input("buyer@example.com").expect("fix email");
    quantity.input("2").expect("fix quantity");
    let outcome = form.submit().expect("submit");
    assert!(outcome.is_ok());
    let values = outcome.values().expect("accepted values");
    assert_eq!(
        values.to_json(),
        serde_json::json!({
            "email": "buyer@example.com",
            "gift_note": null,
            "quantity": 2
        })
    );
    assert_eq!(form.snapshot().expect("snapshot").submit_state, SubmitState::Succeeded);
}

#[test]
fn required_message_template_names_the_field() {
    let (_, form) = checkout();
    let outcome = form.submit().expect("submit");
    assert_eq!(outcome.error_for("email"), Some("email is required"));
}

#[test]
fn whitespace_only_rich_text_counts_as_empty() {
    let (definition, form) = checkout();
    let note = form.binding("gift_note", kind_of(&definition, "gift_note"));
    note.mount().expect("mount note");
    note.input("  \n\n  ").expect("type blank note");
    assert_eq!(form.value("gift_note").expect("value"), Some(FieldValue::Empty));

    let props = note
        .render(ControlProps::new(ControlKind::RichText).label("Gift note"))
        .expect("render");
    assert_eq!(props.value, ControlValue::Text(String::new()));
}

#[test]
fn custom_rules_run_alongside_declared_rules() {
    let (_, form) = checkout();
    form.register_rule(
        "email",
        FieldRule::custom("company addresses only", |value: &FieldValue| {
            value
                .as_text()
                .is_some_and(|text| text.ends_with("@example.com"))
        }),
    )
    .expect("register custom rule");
    form.change("email", "someone@elsewhere.org".into())
        .expect("change");
    assert_eq!(
        form.validate_field("email").expect("validate").message(),
        Some("company addresses only")
    );
}
