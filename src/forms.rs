//! Submitted forms and their field validators.
//!
//! Each field runs an ordered list of [`Rule`]s. Every rule runs, except
//! that a failed [`Rule::Required`] ends that field's chain.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::entry::format_hours;
use crate::models::LearningEntry;
use crate::slug::slugify;
use crate::store::{Store, StoreError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));
static LEADING_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]").expect("digit pattern"));
static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?").expect("number pattern"));

pub enum Rule<'a> {
    Required,
    Email,
    MinLength(usize),
    EqualTo { other: &'a str, message: &'static str },
    Pattern { regex: &'static Regex, message: &'static str },
    Date(&'static str),
}

impl Rule<'_> {
    fn check(&self, value: &str) -> Result<(), String> {
        let ok = match self {
            Rule::Required => !value.trim().is_empty(),
            Rule::Email => EMAIL_RE.is_match(value),
            Rule::MinLength(min) => value.chars().count() >= *min,
            Rule::EqualTo { other, .. } => value == *other,
            Rule::Pattern { regex, .. } => regex.is_match(value),
            Rule::Date(format) => NaiveDate::parse_from_str(value, format).is_ok(),
        };
        if ok {
            return Ok(());
        }
        Err(match self {
            Rule::Required => "This field is required.".to_string(),
            Rule::Email => "Invalid email address.".to_string(),
            Rule::MinLength(min) => format!("Field must be at least {min} characters long."),
            Rule::EqualTo { message, .. } | Rule::Pattern { message, .. } => message.to_string(),
            Rule::Date(_) => "Not a valid date value.".to_string(),
        })
    }
}

/// Messages per field name. Empty means the form is valid.
#[derive(Debug, Default, Clone)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    /// Run `rules` against `value`, recording failures under `field`.
    /// Returns whether the field passed.
    pub fn check(&mut self, field: &'static str, value: &str, rules: &[Rule<'_>]) -> bool {
        let mut passed = true;
        for rule in rules {
            if let Err(message) = rule.check(value) {
                self.add(field, message);
                passed = false;
                if matches!(rule, Rule::Required) {
                    break;
                }
            }
        }
        passed
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl RegisterForm {
    /// Also asks the store whether the email is taken. The unique index on
    /// `users.email` still has the final word.
    pub async fn validate(&self, store: &Store) -> Result<FieldErrors, StoreError> {
        let mut errors = FieldErrors::default();
        let email = self.email.trim();

        if errors.check("email", email, &[Rule::Required, Rule::Email]) && store.email_exists(email).await? {
            errors.add("email", "User with that email already exists.");
        }
        errors.check(
            "password",
            &self.password,
            &[
                Rule::Required,
                Rule::MinLength(2),
                Rule::EqualTo {
                    other: &self.password2,
                    message: "Passwords must match",
                },
            ],
        );
        errors.check("password2", &self.password2, &[Rule::Required]);

        Ok(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check("email", self.email.trim(), &[Rule::Required, Rule::Email]);
        errors.check("password", &self.password, &[Rule::Required]);
        errors
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LearningForm {
    pub title: String,
    pub date: String,
    pub time_spent: String,
    pub learnt: String,
    #[serde(alias = "resourcesToRemember")]
    pub resources_to_remember: String,
    pub tags: String,
}

/// A validated [`LearningForm`], ready for the store.
#[derive(Debug, Clone)]
pub struct LearningData {
    pub title: String,
    pub date: NaiveDate,
    /// Hours.
    pub time_spent: f64,
    pub learnt: String,
    pub resources_to_remember: String,
    /// Already slugified.
    pub tags: String,
}

impl LearningForm {
    pub fn validate(&self) -> Result<LearningData, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("title", &self.title, &[Rule::Required]);
        errors.check("date", self.date.trim(), &[Rule::Required, Rule::Date(DATE_FORMAT)]);
        errors.check(
            "time_spent",
            self.time_spent.trim(),
            &[
                Rule::Required,
                Rule::Pattern {
                    regex: &LEADING_DIGIT_RE,
                    message: "Key in numbers only.",
                },
            ],
        );
        errors.check("learnt", &self.learnt, &[Rule::Required]);
        errors.check("resources_to_remember", &self.resources_to_remember, &[Rule::Required]);
        errors.check("tags", &self.tags, &[Rule::Required]);

        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok();
        let time_spent = parse_hours(&self.time_spent);
        if time_spent.is_none() && errors.messages("time_spent").is_empty() {
            errors.add("time_spent", "Key in numbers only.");
        }
        match (date, time_spent) {
            (Some(date), Some(time_spent)) if errors.is_empty() => Ok(LearningData {
                title: self.title.trim().to_string(),
                date,
                time_spent,
                learnt: self.learnt.trim().to_string(),
                resources_to_remember: self.resources_to_remember.trim().to_string(),
                tags: slugify(&self.tags),
            }),
            _ => Err(errors),
        }
    }
}

impl From<&LearningEntry> for LearningForm {
    fn from(entry: &LearningEntry) -> Self {
        Self {
            title: entry.title.clone(),
            date: entry.date.clone(),
            time_spent: format_hours(entry.time_spent),
            learnt: entry.learnt.clone(),
            resources_to_remember: entry.resources_to_remember.clone(),
            tags: entry.tags.clone(),
        }
    }
}

/// Leading number of a `time_spent` submission, so "1.5h" is 1.5 hours.
fn parse_hours(raw: &str) -> Option<f64> {
    LEADING_NUMBER_RE
        .find(raw.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|hours| hours.is_finite())
}
