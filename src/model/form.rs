//! Typed decoding of urlencoded admin form submissions.
//!
//! Browsers submit every field as a string. Each entity declares which of its
//! fields are ids, numbers, timestamps or lists by decoding through a
//! [`FormDecoder`]; coercion failures and `validator` rule failures end up in
//! the same [`FieldErrors`] map, keyed by the form field name.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

lazy_static! {
    static ref TIMESTAMP_RE: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").unwrap();
}

pub const REQUIRED: &str = "Required";
pub const INVALID_DATETIME: &str = "Invalid datetime";

/// Raw submitted pairs, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for FormValues {
    fn from(pairs: Vec<(String, String)>) -> Self {
        FormValues { pairs }
    }
}

#[cfg(test)]
impl FormValues {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        FormValues::from(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<Vec<_>>(),
        )
    }
}

impl FormValues {
    /// Last submitted value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn all<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.pairs
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Removes every pair named `name`, returning the last value.
    pub fn take(&mut self, name: &str) -> Option<String> {
        let mut taken = None;
        self.pairs.retain(|(key, value)| {
            if key == name {
                taken = Some(value.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    /// The submitted values as echoed back to a rejected form. Repeats of a
    /// list field (checkbox groups) are joined with commas; any other field
    /// echoes the last value, the one that was decoded.
    pub fn echo(&self, lists: &[&str]) -> BTreeMap<String, String> {
        let mut echoed: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in &self.pairs {
            if lists.contains(&key.as_str()) {
                if let Some(joined) = echoed.get_mut(key) {
                    joined.push(',');
                    joined.push_str(value);
                    continue;
                }
            }
            echoed.insert(key.clone(), value.clone());
        }
        echoed
    }
}

/// Field path (dot-joined for nested values) to a human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Records `message` for `path` unless the path already has an error.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (path, message) in other.0 {
            self.insert(path, message);
        }
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut flattened = FieldErrors::default();
        flatten(errors, None, &mut flattened);
        flattened
    }
}

fn flatten(errors: &ValidationErrors, prefix: Option<&str>, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(first) = list.first() {
                    out.insert(path, message_for(first));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, Some(&format!("{path}.{index}")), out);
                }
            }
        }
    }
}

fn message_for(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("Invalid {}", error.code),
    }
}

/// A creation payload that can be decoded from a form and validated.
pub trait FormSchema: Validate + Sized {
    /// Fields that may be submitted more than once.
    const LIST_FIELDS: &'static [&'static str] = &[];

    fn decode(form: &FormValues) -> Result<Self, FieldErrors>;
}

/// Coerces string form values into typed fields, collecting every failure.
///
/// Values returned for a field that failed to decode are placeholders; they
/// never escape because [`FormDecoder::finish`] rejects the whole schema.
pub struct FormDecoder<'a> {
    form: &'a FormValues,
    errors: FieldErrors,
}

impl<'a> FormDecoder<'a> {
    pub fn new(form: &'a FormValues) -> Self {
        FormDecoder {
            form,
            errors: FieldErrors::default(),
        }
    }

    pub fn text(&mut self, name: &str) -> String {
        match self.form.get(name) {
            Some(value) => value.to_string(),
            None => {
                self.errors.insert(name, REQUIRED);
                String::new()
            }
        }
    }

    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.form
            .get(name)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn id(&mut self, name: &str) -> i32 {
        let form = self.form;
        match form.get(name) {
            Some(raw) => self.integer(name, raw).unwrap_or_default(),
            None => {
                self.errors.insert(name, REQUIRED);
                0
            }
        }
    }

    pub fn optional_id(&mut self, name: &str) -> Option<i32> {
        let form = self.form;
        match form.get(name).filter(|raw| !raw.is_empty()) {
            Some(raw) => self.integer(name, raw),
            None => None,
        }
    }

    pub fn optional_number(&mut self, name: &str) -> Option<f64> {
        let raw = self.form.get(name).filter(|raw| !raw.is_empty())?;
        match raw.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => Some(number),
            _ => {
                self.errors
                    .insert(name, "Expected number, received string");
                None
            }
        }
    }

    /// Strict UTC timestamp with millisecond precision, e.g.
    /// `2023-02-18T10:30:00.000Z`.
    pub fn timestamp(&mut self, name: &str) -> DateTime<Utc> {
        let Some(raw) = self.form.get(name) else {
            self.errors.insert(name, REQUIRED);
            return DateTime::<Utc>::default();
        };
        match parse_timestamp(raw) {
            Some(instant) => instant,
            None => {
                self.errors.insert(name, INVALID_DATETIME);
                DateTime::<Utc>::default()
            }
        }
    }

    /// Values of the named fields, whether repeated or comma-joined.
    /// Blank items are dropped and duplicates removed, keeping first order.
    pub fn list(&self, names: &[&str]) -> Vec<String> {
        let mut items: Vec<String> = Vec::new();
        for name in names {
            for value in self.form.all(name) {
                for item in value.split(',').map(str::trim) {
                    if !item.is_empty() && !items.iter().any(|seen| seen == item) {
                        items.push(item.to_string());
                    }
                }
            }
        }
        items
    }

    /// A list of ids, each failure keyed `<key>.<index>`.
    pub fn ids(&mut self, names: &[&str], key: &str) -> Vec<i32> {
        let items = self.list(names);
        let mut ids = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(id) = self.integer(&format!("{key}.{index}"), item) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    pub fn reject(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(path, message);
    }

    /// Runs the declarative rules on the decoded schema. Coercion errors take
    /// precedence over rule errors on the same field.
    pub fn finish<S: Validate>(self, schema: S) -> Result<S, FieldErrors> {
        let mut errors = self.errors;
        if let Err(invalid) = schema.validate() {
            errors.merge(FieldErrors::from(&invalid));
        }
        if errors.is_empty() {
            Ok(schema)
        } else {
            Err(errors)
        }
    }

    /// For decoded values with no declarative rules.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }

    fn integer(&mut self, path: &str, raw: &str) -> Option<i32> {
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<i32>() {
            return Some(value);
        }
        // Whole numbers written as `1.0` or `1e2` are still ids.
        let message = match raw.parse::<f64>() {
            Ok(number) if !number.is_finite() => "Expected number, received string",
            Ok(number) if number.fract() != 0.0 => "Expected integer, received float",
            Ok(number) if (i32::MIN as f64..=i32::MAX as f64).contains(&number) => {
                return Some(number as i32);
            }
            Ok(_) => "Number must fit in 32 bits",
            Err(_) => "Expected number, received string",
        };
        self.errors.insert(path, message);
        None
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if !TIMESTAMP_RE.is_match(raw) {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Serializes timestamps in the same strict form the forms accept.
pub mod timestamp_format {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}
