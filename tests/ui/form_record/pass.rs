use formbind::form::{FieldValue, FormController, FormOptions, FormRecord};

#[derive(Clone, Debug, PartialEq, formbind::form::FormRecord)]
struct DemoForm {
    email: String,
    subscribed: bool,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email(), "email");

    let record = DemoForm {
        email: "a@formbind.dev".to_string(),
        subscribed: false,
    };
    let controller = FormController::from_record(&record, FormOptions::default());
    controller
        .change(fields.subscribed(), FieldValue::Bool(true))
        .expect("change");
    let updated: DemoForm = controller
        .values()
        .expect("values")
        .to_record()
        .expect("record");
    assert!(updated.subscribed);
    assert_eq!(updated.email, record.email);
}
