//! Keystroke validation and the form state it feeds.

use std::collections::BTreeMap;

use shared::{
    domain::{Field, FormFields},
    error::ValidationError,
};

use crate::catalog::Catalog;

/// Only the location field is held to its catalog; role and concern
/// catalogs are suggestions. An untouched (empty) location is accepted, but
/// whitespace alone matches no entry and is rejected.
pub fn validate(field: Field, raw: &str) -> Option<String> {
    match field {
        Field::City => {
            if raw.is_empty() || Catalog::for_field(field).contains(raw) {
                None
            } else {
                Some(ValidationError::not_in_catalog(field).message)
            }
        }
        Field::Profession | Field::Concern => None,
    }
}

pub fn validate_field(field: Field, raw: &str) -> Result<(), ValidationError> {
    match validate(field, raw) {
        Some(message) => Err(ValidationError::new(field, message)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    fields: FormFields,
    errors: BTreeMap<Field, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn value(&self, field: Field) -> &str {
        self.fields.get(field)
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Stores the new value and re-validates it in one step.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        self.fields.set(field, value);
        self.revalidate(field);
    }

    /// Checks the location against its current value; used as the submit gate.
    pub fn check_submittable(&mut self) -> Result<(), ValidationError> {
        self.revalidate(Field::City);
        match self.errors.get(&Field::City) {
            Some(message) => Err(ValidationError::new(Field::City, message.clone())),
            None => Ok(()),
        }
    }

    fn revalidate(&mut self, field: Field) {
        match validate(field, self.fields.get(field)) {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
