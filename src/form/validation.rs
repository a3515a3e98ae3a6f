use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::controller::{FormError, FormOptions, FormResult};
use super::transform::{
    DATE_DISPLAY_FORMAT, DATE_TIME_DISPLAY_FORMAT, parse_date, parse_date_time, parse_number,
};
use super::value::{FieldKey, FieldValue};

/// When a text value counts as missing for [`Rule::Required`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPolicy {
    /// Whitespace-only text is empty.
    #[default]
    Trimmed,
    /// Only the zero-length string is empty.
    Exact,
}

impl EmptyPolicy {
    pub fn is_empty(self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Empty => true,
            FieldValue::Text(text) => match self {
                EmptyPolicy::Trimmed => text.trim().is_empty(),
                EmptyPolicy::Exact => text.is_empty(),
            },
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEvaluation {
    /// Stop at the first failing rule and report its message.
    #[default]
    FirstFailure,
    /// Run every rule and join all failure messages.
    AllFailures,
}

/// Comparison bound for [`Rule::Min`] and [`Rule::Max`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Number(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Number(number) => Display::fmt(number, f),
            Bound::Date(date) => write!(f, "{}", date.format(DATE_DISPLAY_FORMAT)),
            Bound::DateTime(at) => write!(f, "{}", at.format(DATE_TIME_DISPLAY_FORMAT)),
        }
    }
}

impl From<Decimal> for Bound {
    fn from(value: Decimal) -> Self {
        Bound::Number(value)
    }
}

impl From<i32> for Bound {
    fn from(value: i32) -> Self {
        Bound::Number(Decimal::from(value))
    }
}

impl From<i64> for Bound {
    fn from(value: i64) -> Self {
        Bound::Number(Decimal::from(value))
    }
}

impl From<NaiveDate> for Bound {
    fn from(value: NaiveDate) -> Self {
        Bound::Date(value)
    }
}

impl From<NaiveDateTime> for Bound {
    fn from(value: NaiveDateTime) -> Self {
        Bound::DateTime(value)
    }
}

pub trait FieldPredicate: Send + Sync {
    fn check(&self, value: &FieldValue) -> bool;
}

impl<F> FieldPredicate for F
where
    F: Fn(&FieldValue) -> bool + Send + Sync,
{
    fn check(&self, value: &FieldValue) -> bool {
        (self)(value)
    }
}

#[derive(Clone)]
pub enum Rule {
    Required,
    Pattern(Regex),
    MinLength(usize),
    MaxLength(usize),
    Min(Bound),
    Max(Bound),
    Custom(Arc<dyn FieldPredicate>),
}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Required => f.write_str("Required"),
            Rule::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Rule::MinLength(min) => f.debug_tuple("MinLength").field(min).finish(),
            Rule::MaxLength(max) => f.debug_tuple("MaxLength").field(max).finish(),
            Rule::Min(bound) => f.debug_tuple("Min").field(bound).finish(),
            Rule::Max(bound) => f.debug_tuple("Max").field(bound).finish(),
            Rule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Rule {
    fn default_message(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Pattern(_) => "has an invalid format",
            Rule::MinLength(_) => "must be at least {min} characters",
            Rule::MaxLength(_) => "must be at most {max} characters",
            Rule::Min(_) => "must be at least {min}",
            Rule::Max(_) => "must be at most {max}",
            Rule::Custom(_) => "is invalid",
        }
    }

    fn passes(&self, value: &FieldValue, empty: EmptyPolicy) -> bool {
        if let Rule::Required = self {
            return !empty.is_empty(value);
        }
        // Optional fields: only required rules look at missing values.
        if empty.is_empty(value) {
            return true;
        }
        match self {
            Rule::Required => true,
            Rule::Pattern(regex) => regex.is_match(&display_text(value)),
            Rule::MinLength(min) => display_text(value).chars().count() >= *min,
            Rule::MaxLength(max) => display_text(value).chars().count() <= *max,
            Rule::Min(bound) => compare(value, bound).is_some_and(|order| order.is_ge()),
            Rule::Max(bound) => compare(value, bound).is_some_and(|order| order.is_le()),
            Rule::Custom(predicate) => predicate.check(value),
        }
    }
}

/// A rule plus the message shown when it fails. The template may reference
/// `{field}`, `{min}` and `{max}`.
#[derive(Clone, Debug)]
pub struct FieldRule {
    rule: Rule,
    message: Option<String>,
}

impl FieldRule {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            message: None,
        }
    }

    pub fn required() -> Self {
        Self::new(Rule::Required)
    }

    pub fn pattern(pattern: &str) -> FormResult<Self> {
        let regex = Regex::new(pattern).map_err(|error| FormError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: error.to_string(),
        })?;
        Ok(Self::new(Rule::Pattern(regex)))
    }

    pub fn min_length(min: usize) -> Self {
        Self::new(Rule::MinLength(min))
    }

    pub fn max_length(max: usize) -> Self {
        Self::new(Rule::MaxLength(max))
    }

    pub fn min(bound: impl Into<Bound>) -> Self {
        Self::new(Rule::Min(bound.into()))
    }

    pub fn max(bound: impl Into<Bound>) -> Self {
        Self::new(Rule::Max(bound.into()))
    }

    pub fn custom(message: impl Into<String>, predicate: impl FieldPredicate + 'static) -> Self {
        Self::new(Rule::Custom(Arc::new(predicate))).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn is_required(&self) -> bool {
        matches!(self.rule, Rule::Required)
    }

    fn render_message(&self, key: &str) -> String {
        let template = self
            .message
            .as_deref()
            .unwrap_or_else(|| self.rule.default_message());
        let mut message = template.replace("{field}", key);
        match &self.rule {
            Rule::MinLength(min) => message = message.replace("{min}", &min.to_string()),
            Rule::MaxLength(max) => message = message.replace("{max}", &max.to_string()),
            Rule::Min(bound) => message = message.replace("{min}", &bound.to_string()),
            Rule::Max(bound) => message = message.replace("{max}", &bound.to_string()),
            _ => {}
        }
        message
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationResult {
    Valid,
    Invalid { message: String },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid { message } => Some(message),
        }
    }

    pub fn into_message(self) -> Option<String> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid { message } => Some(message),
        }
    }
}

/// A field failed one of its rules.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldValidationError {
    pub field: FieldKey,
    pub message: String,
}

/// Runs `rules` against `value` in declaration order.
///
/// The stored value is never touched; callers write the outcome to the error
/// map themselves.
pub fn validate(
    key: &str,
    value: &FieldValue,
    rules: &[FieldRule],
    options: &FormOptions,
) -> ValidationResult {
    let mut messages = Vec::new();
    for rule in rules {
        if rule.rule.passes(value, options.empty_policy) {
            continue;
        }
        messages.push(rule.render_message(key));
        if options.rule_evaluation == RuleEvaluation::FirstFailure {
            break;
        }
    }
    tracing::trace!(field = key, failures = messages.len(), "evaluated field rules");

    if messages.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid {
            message: messages.join("; "),
        }
    }
}

fn display_text(value: &FieldValue) -> Cow<'_, str> {
    match value {
        FieldValue::Empty => Cow::Borrowed(""),
        FieldValue::Text(text) => Cow::Borrowed(text),
        FieldValue::Bool(value) => Cow::Owned(value.to_string()),
        FieldValue::Number(number) => Cow::Owned(number.to_string()),
        FieldValue::Date(date) => Cow::Owned(date.format(DATE_DISPLAY_FORMAT).to_string()),
        FieldValue::DateTime(at) => Cow::Owned(at.format(DATE_TIME_DISPLAY_FORMAT).to_string()),
    }
}

/// Orders `value` against `bound` on parsed values. Text is parsed with the
/// same parsers the controls use; anything unparseable is incomparable.
fn compare(value: &FieldValue, bound: &Bound) -> Option<std::cmp::Ordering> {
    match bound {
        Bound::Number(limit) => {
            let number = match value {
                FieldValue::Number(number) => Some(*number),
                FieldValue::Text(text) => parse_number(text),
                _ => None,
            }?;
            Some(number.cmp(limit))
        }
        Bound::Date(limit) => {
            let date = match value {
                FieldValue::Date(date) => Some(*date),
                FieldValue::DateTime(at) => Some(at.date()),
                FieldValue::Text(text) => parse_date(text),
                _ => None,
            }?;
            Some(date.cmp(limit))
        }
        Bound::DateTime(limit) => {
            let at = match value {
                FieldValue::DateTime(at) => Some(*at),
                FieldValue::Date(date) => Some(date.and_time(NaiveTime::MIN)),
                FieldValue::Text(text) => parse_date_time(text),
                _ => None,
            }?;
            Some(at.cmp(limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(empty_policy: EmptyPolicy) -> FormOptions {
        FormOptions {
            empty_policy,
            ..FormOptions::default()
        }
    }

    #[test]
    fn required_boundaries_follow_empty_policy() {
        let rules = [FieldRule::required()];
        let trimmed = options(EmptyPolicy::Trimmed);
        let exact = options(EmptyPolicy::Exact);

        assert!(!validate("name", &"".into(), &rules, &trimmed).is_valid());
        assert!(!validate("name", &FieldValue::Empty, &rules, &trimmed).is_valid());
        assert!(!validate("name", &" ".into(), &rules, &trimmed).is_valid());
        assert!(validate("name", &" ".into(), &rules, &exact).is_valid());
        assert!(!validate("name", &"".into(), &rules, &exact).is_valid());
    }

    #[test]
    fn first_failure_wins_by_default() {
        let rules = [
            FieldRule::min_length(3).with_message("too short"),
            FieldRule::pattern("^[a-z]+$")
                .expect("valid pattern")
                .with_message("lowercase only"),
        ];
        let result = validate("code", &"A".into(), &rules, &FormOptions::default());
        assert_eq!(result.message(), Some("too short"));

        let all = FormOptions {
            rule_evaluation: RuleEvaluation::AllFailures,
            ..FormOptions::default()
        };
        let result = validate("code", &"A".into(), &rules, &all);
        assert_eq!(result.message(), Some("too short; lowercase only"));
    }

    #[test]
    fn optional_rules_skip_empty_values() {
        let rules = [FieldRule::min_length(5), FieldRule::min(10)];
        assert!(validate("note", &FieldValue::Empty, &rules, &FormOptions::default()).is_valid());
    }

    #[test]
    fn dates_compare_as_dates_not_strings() {
        let limit = NaiveDate::from_ymd_opt(2024, 10, 1).expect("date");
        let rules = [FieldRule::min(limit)];
        // "2024-9-15" sorts after "2024-10-01" as a string.
        let result = validate("opens", &"2024-9-15".into(), &rules, &FormOptions::default());
        assert_eq!(result.message(), Some("must be at least 2024-10-01"));

        let later = NaiveDate::from_ymd_opt(2024, 11, 2).expect("date");
        assert!(validate("opens", &later.into(), &rules, &FormOptions::default()).is_valid());
    }

    #[test]
    fn numbers_compare_as_decimals() {
        let rules = [FieldRule::max(100).with_message("{field} must not exceed {max}")];
        assert!(validate("qty", &"99.5".into(), &rules, &FormOptions::default()).is_valid());
        assert_eq!(
            validate("qty", &"100.01".into(), &rules, &FormOptions::default()).message(),
            Some("qty must not exceed 100")
        );
        assert!(!validate("qty", &"lots".into(), &rules, &FormOptions::default()).is_valid());
    }

    #[test]
    fn custom_rules_use_their_message() {
        let rules = [FieldRule::custom("must be accepted", |value: &FieldValue| {
            value.as_bool() == Some(true)
        })];
        let result = validate("terms", &false.into(), &rules, &FormOptions::default());
        assert_eq!(result.message(), Some("must be accepted"));
    }

    #[test]
    fn validation_is_deterministic() {
        let rules = [FieldRule::required(), FieldRule::max_length(4)];
        let value = FieldValue::from("pepperoni");
        let first = validate("topping", &value, &rules, &FormOptions::default());
        let second = validate("topping", &value, &rules, &FormOptions::default());
        assert_eq!(first, second);
        assert_eq!(first.message(), Some("must be at most 4 characters"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let error = FieldRule::pattern("(").expect_err("unbalanced group");
        assert!(matches!(error, FormError::InvalidPattern { .. }));
    }
}
