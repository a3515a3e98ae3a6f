use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rich_text;
use super::value::FieldValue;

pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
];

const DATE_TIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Value as a presentational control holds it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlValue {
    Text(String),
    Toggle(bool),
    Float(f64),
}

impl ControlValue {
    pub fn blank() -> Self {
        ControlValue::Text(String::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ControlValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for ControlValue {
    fn from(value: &str) -> Self {
        ControlValue::Text(value.to_owned())
    }
}

impl From<String> for ControlValue {
    fn from(value: String) -> Self {
        ControlValue::Text(value)
    }
}

impl From<bool> for ControlValue {
    fn from(value: bool) -> Self {
        ControlValue::Toggle(value)
    }
}

impl From<f64> for ControlValue {
    fn from(value: f64) -> Self {
        ControlValue::Float(value)
    }
}

/// Conversion pair between a control's value and the form's internal value.
///
/// Both directions are total: input a transform cannot interpret becomes
/// [`FieldValue::Empty`], and values of a foreign variant render blank.
pub trait ValueTransform: Send + Sync {
    fn to_control(&self, value: &FieldValue) -> ControlValue;
    fn to_internal(&self, value: &ControlValue) -> FieldValue;
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    #[default]
    Text,
    Textarea,
    Switch,
    Date,
    DateTime,
    Number,
    RichText,
}

impl ControlKind {
    pub const ALL: [ControlKind; 7] = [
        ControlKind::Text,
        ControlKind::Textarea,
        ControlKind::Switch,
        ControlKind::Date,
        ControlKind::DateTime,
        ControlKind::Number,
        ControlKind::RichText,
    ];

    pub fn transform(self) -> &'static dyn ValueTransform {
        match self {
            ControlKind::Text => &TextTransform,
            ControlKind::Textarea => &MultilineTransform,
            ControlKind::Switch => &SwitchTransform,
            ControlKind::Date => &DateTransform,
            ControlKind::DateTime => &DateTimeTransform,
            ControlKind::Number => &NumberTransform,
            ControlKind::RichText => &RichTextTransform,
        }
    }

    pub fn to_control(self, value: &FieldValue) -> ControlValue {
        self.transform().to_control(value)
    }

    pub fn to_internal(self, value: &ControlValue) -> FieldValue {
        self.transform().to_internal(value)
    }

    /// Control rendering of the empty sentinel.
    pub fn blank(self) -> ControlValue {
        self.to_control(&FieldValue::Empty)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TextTransform;

impl ValueTransform for TextTransform {
    fn to_control(&self, value: &FieldValue) -> ControlValue {
        match value {
            FieldValue::Text(text) => ControlValue::Text(text.clone()),
            _ => ControlValue::blank(),
        }
    }

    fn to_internal(&self, value: &ControlValue) -> FieldValue {
        match value {
            ControlValue::Text(text) if !text.is_empty() => FieldValue::Text(text.clone()),
            _ => FieldValue::Empty,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MultilineTransform;

impl ValueTransform for MultilineTransform {
    fn to_control(&self, value: &FieldValue) -> ControlValue {
        TextTransform.to_control(value)
    }

    fn to_internal(&self, value: &ControlValue) -> FieldValue {
        match value {
            ControlValue::Text(text) if !text.is_empty() => {
                FieldValue::Text(rich_text::normalize_line_endings(text))
            }
            _ => FieldValue::Empty,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SwitchTransform;

impl ValueTransform for SwitchTransform {
    fn to_control(&self, value: &FieldValue) -> ControlValue {
        ControlValue::Toggle(value.as_bool().unwrap_or(false))
    }

    fn to_internal(&self, value: &ControlValue) -> FieldValue {
        match value {
            ControlValue::Toggle(checked) => FieldValue::Bool(*checked),
            _ => FieldValue::Empty,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DateTransform;

impl ValueTransform for DateTransform {
    fn to_control(&self, value: &FieldValue) -> ControlValue {
        match value {
            FieldValue::Date(date) => {
                ControlValue::Text(date.format(DATE_DISPLAY_FORMAT).to_string())
            }
            _ => ControlValue::blank(),
        }
    }

    fn to_internal(&self, value: &ControlValue) -> FieldValue {
        value
            .as_text()
            .and_then(parse_date)
            .map_or(FieldValue::Empty, FieldValue::Date)
    }
}

/// Date and time control. Sub-second precision is not displayed.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateTimeTransform;

impl ValueTransform for DateTimeTransform {
    fn to_control(&self, value: &FieldValue) -> ControlValue {
        match value {
            FieldValue::DateTime(at) => {
                ControlValue::Text(at.format(DATE_TIME_DISPLAY_FORMAT).to_string())
            }
            _ => ControlValue::blank(),
        }
    }

    fn to_internal(&self, value: &ControlValue) -> FieldValue {
        value
            .as_text()
            .and_then(parse_date_time)
            .map_or(FieldValue::Empty, FieldValue::DateTime)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NumberTransform;

impl ValueTransform for NumberTransform {
    fn to_control(&self, value: &FieldValue) -> ControlValue {
        match value {
            FieldValue::Number(number) => ControlValue::Text(number.to_string()),
            _ => ControlValue::blank(),
        }
    }

    fn to_internal(&self, value: &ControlValue) -> FieldValue {
        let parsed = match value {
            ControlValue::Text(text) => parse_number(text),
            ControlValue::Float(number) => decimal_from_f64(*number),
            ControlValue::Toggle(_) => None,
        };
        parsed.map_or(FieldValue::Empty, FieldValue::Number)
    }
}

/// Markdown-backed rich text editor.
#[derive(Clone, Copy, Debug, Default)]
pub struct RichTextTransform;

impl ValueTransform for RichTextTransform {
    fn to_control(&self, value: &FieldValue) -> ControlValue {
        TextTransform.to_control(value)
    }

    fn to_internal(&self, value: &ControlValue) -> FieldValue {
        match value {
            ControlValue::Text(text) if !rich_text::is_blank(text) => {
                FieldValue::Text(rich_text::normalize_line_endings(text))
            }
            _ => FieldValue::Empty,
        }
    }
}

/// Parses a calendar date in any accepted input format.
///
/// Text in the display format is taken at face value, so every date a date
/// control renders reads back unchanged. Other formats only accept years in
/// 1000..=9999, which keeps two-digit years from slipping through.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_DISPLAY_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_DISPLAY_FORMAT).to_string() == text)
        .or_else(|| {
            DATE_INPUT_FORMATS
                .iter()
                .filter_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .find(|date| (1000..=9999).contains(&date.year()))
        })
}

/// Date-time counterpart of [`parse_date`], with the same year handling.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(text, DATE_TIME_DISPLAY_FORMAT)
        .ok()
        .filter(|at| at.format(DATE_TIME_DISPLAY_FORMAT).to_string() == text)
        .or_else(|| {
            DATE_TIME_INPUT_FORMATS
                .iter()
                .filter_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .find(|at| (1000..=9999).contains(&at.year()))
        })
}

pub fn parse_number(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text).ok()
}

fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .map(|decimal| decimal.normalize())
}
