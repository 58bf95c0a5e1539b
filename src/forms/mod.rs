//! Generic form state
//!
//! Tracks values, per-field errors, touched fields and the submitting flag
//! for any form model, and orchestrates validation before submission.
//!
//! # Example
//!
//! ```rust,ignore
//! use parlor::forms::{FormState, LoginForm, LoginField, SubmitOutcome};
//!
//! let mut form = FormState::new(LoginForm::default());
//! form.handle_change(LoginField::Identifier, "ada");
//! form.handle_change(LoginField::Password, "hunter22");
//!
//! let outcome = form
//!     .handle_submit(|values| async move {
//!         auth.login(&values.identifier, &values.password).await
//!     })
//!     .await?;
//! ```

/// Concrete form models (login, register, profile, group creation).
pub mod models;
/// Field validators.
pub mod validators;

pub use models::{
    CreateGroupField, CreateGroupForm, LoginField, LoginForm, ProfileField, ProfileForm,
    RegisterField, RegisterForm,
};

use crate::types::Result;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

/// Validation errors keyed by field
pub type FieldErrors<F> = HashMap<F, String>;

/// A set of named fields with a validation rule
pub trait FormModel: Clone {
    /// Field identifier
    type Field: Copy + Eq + Hash + Debug + 'static;

    /// Every field of the form, in display order
    fn fields() -> &'static [Self::Field];

    /// Store a raw input value
    fn set(&mut self, field: Self::Field, value: String);

    /// Read back the raw input value
    fn get(&self, field: Self::Field) -> String;

    /// Validate the whole form
    fn validate(&self) -> FieldErrors<Self::Field>;
}

/// Result of a submit attempt that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// Validation failed; the submit handler was not called
    Invalid,
    /// The submit handler ran and returned a value
    Submitted(T),
}

/// Field/value/error/touched tracking for one form instance
#[derive(Debug, Clone)]
pub struct FormState<M: FormModel> {
    initial: M,
    values: M,
    errors: FieldErrors<M::Field>,
    touched: HashSet<M::Field>,
    is_submitting: bool,
}

impl<M: FormModel> FormState<M> {
    pub fn new(initial: M) -> Self {
        Self {
            values: initial.clone(),
            initial,
            errors: HashMap::new(),
            touched: HashSet::new(),
            is_submitting: false,
        }
    }

    pub fn values(&self) -> &M {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors<M::Field> {
        &self.errors
    }

    pub fn error(&self, field: M::Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Error to display: only shown once the field has been touched
    pub fn visible_error(&self, field: M::Field) -> Option<&str> {
        if self.is_touched(field) {
            self.error(field)
        } else {
            None
        }
    }

    pub fn is_touched(&self, field: M::Field) -> bool {
        self.touched.contains(&field)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_valid(&self) -> bool {
        self.values.validate().is_empty()
    }

    /// Update a field; re-validates when the field was already touched
    pub fn handle_change(&mut self, field: M::Field, value: impl Into<String>) {
        self.values.set(field, value.into());
        if self.is_touched(field) {
            self.errors = self.values.validate();
        }
    }

    /// Mark a field touched and validate
    pub fn handle_blur(&mut self, field: M::Field) {
        self.touched.insert(field);
        self.errors = self.values.validate();
    }

    /// Validate and, if clean, run `on_submit` with a copy of the values.
    ///
    /// Every field is marked touched first. `is_submitting` is set while the
    /// handler runs and cleared on every path; handler errors propagate.
    pub async fn handle_submit<F, Fut, T>(&mut self, on_submit: F) -> Result<SubmitOutcome<T>>
    where
        F: FnOnce(M) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.touched.extend(M::fields().iter().copied());
        self.errors = self.values.validate();

        if !self.errors.is_empty() {
            return Ok(SubmitOutcome::Invalid);
        }

        self.is_submitting = true;
        let result = on_submit(self.values.clone()).await;
        self.is_submitting = false;

        result.map(SubmitOutcome::Submitted)
    }

    /// Restore the initial values and forget errors and touched state
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors.clear();
        self.touched.clear();
        self.is_submitting = false;
    }
}
