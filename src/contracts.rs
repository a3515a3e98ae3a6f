use crate::form::{ControlKind, ControlValue};

/// Builder surface a presentational control exposes to the form layer.
pub trait FieldLike: Sized {
    fn value(self, value: ControlValue) -> Self;
    fn label(self, value: impl Into<String>) -> Self;
    fn description(self, value: impl Into<String>) -> Self;
    fn error(self, value: Option<String>) -> Self;
    fn required(self, value: bool) -> Self;
}

pub trait Disableable: Sized {
    fn disabled(self, value: bool) -> Self;
}

#[macro_export]
macro_rules! impl_field_like {
    ($type:ty) => {
        impl $crate::contracts::FieldLike for $type {
            fn value(self, value: $crate::form::ControlValue) -> Self {
                <$type>::value(self, value)
            }

            fn label(self, value: impl Into<String>) -> Self {
                <$type>::label(self, value)
            }

            fn description(self, value: impl Into<String>) -> Self {
                <$type>::description(self, value)
            }

            fn error(self, value: Option<String>) -> Self {
                <$type>::error(self, value)
            }

            fn required(self, value: bool) -> Self {
                <$type>::required(self, value)
            }
        }
    };
}

#[macro_export]
macro_rules! impl_disableable {
    ($type:ty) => {
        impl $crate::contracts::Disableable for $type {
            fn disabled(self, value: bool) -> Self {
                <$type>::disabled(self, value)
            }
        }
    };
}

/// Plain props record for a control. Hosts that render elsewhere (a web
/// view, a terminal) can bind into this and map it onto their own widgets.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlProps {
    pub kind: ControlKind,
    pub value: ControlValue,
    pub label: Option<String>,
    pub description: Option<String>,
    pub error: Option<String>,
    pub required: bool,
    pub disabled: bool,
}

impl ControlProps {
    pub fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            value: kind.blank(),
            label: None,
            description: None,
            error: None,
            required: false,
            disabled: false,
        }
    }

    pub fn value(mut self, value: ControlValue) -> Self {
        self.value = value;
        self
    }

    pub fn label(mut self, value: impl Into<String>) -> Self {
        self.label = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn error(mut self, value: Option<String>) -> Self {
        self.error = value;
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    pub fn disabled(mut self, value: bool) -> Self {
        self.disabled = value;
        self
    }
}

crate::impl_field_like!(ControlProps);
crate::impl_disableable!(ControlProps);
