//! Form input and its validation rules.
//!
//! Each form declares its rules in a plain `validate` method. Failures are
//! collected into a field → message map; the first failing rule per field
//! wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dessert_shop_core::{Email, IdError, ProductId};

use crate::services::auth::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Field name → message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure unless the field already has one.
    pub fn add(&mut self, field: &'static str, rule: &str) {
        self.0
            .entry(field)
            .or_insert_with(|| format!("invalid {}: {rule}", field.to_lowercase()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// `field: message` lines, for rendering above a form.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect()
    }

    /// # Errors
    ///
    /// Returns `self` if any rule failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Rules
// =============================================================================

fn required(errors: &mut ValidationErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, "required");
        return false;
    }
    true
}

fn length(errors: &mut ValidationErrors, field: &'static str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min {
        errors.add(field, "min");
    } else if len > max {
        errors.add(field, "max");
    }
}

fn email(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if Email::parse(value).is_err() {
        errors.add(field, "email");
    }
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "contact", &self.contact);
        required(&mut errors, "password", &self.password);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if required(&mut errors, "username", &self.username) {
            length(&mut errors, "username", &self.username, 4, 255);
        }
        if required(&mut errors, "email", &self.email) {
            email(&mut errors, "email", &self.email);
            length(&mut errors, "email", &self.email, 6, 255);
        }
        if required(&mut errors, "password", &self.password) {
            length(
                &mut errors,
                "password",
                &self.password,
                MIN_PASSWORD_LENGTH,
                MAX_PASSWORD_LENGTH,
            );
        }

        errors.into_result()
    }
}

/// A product id as it arrives: a JSON number or a form string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    /// # Errors
    ///
    /// Returns `IdError` for non-numeric or non-positive values.
    pub fn parse(&self) -> Result<ProductId, IdError> {
        match self {
            Self::Number(n) => ProductId::from_untrusted(*n),
            Self::Text(s) => ProductId::parse(s),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddItemForm {
    #[serde(rename = "productId", default)]
    pub product_id: Option<RawId>,
}

impl AddItemForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<ProductId, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match &self.product_id {
            None => errors.add("productId", "required"),
            Some(RawId::Text(s)) if s.trim().is_empty() => errors.add("productId", "required"),
            Some(raw) => match raw.parse() {
                Ok(id) => return Ok(id),
                Err(IdError::NotPositive) => errors.add("productId", "min"),
                Err(IdError::NotANumber) => errors.add("productId", "number"),
            },
        }
        Err(errors)
    }
}
