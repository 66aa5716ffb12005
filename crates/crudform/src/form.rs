//! Headless registration form.
//!
//! A [`FormSession`] holds the current field values of the create/edit
//! screen, re-validates on every change, can auto-fill the address from a
//! postal lookup and, on submit, writes the record through a
//! [`RecordStore`].

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::postal::PostalLookup;
use crate::record::{AddressFields, Record, RecordId};
use crate::storage::{KeyValueStore, RecordStore};
use crate::validation::{Field, FormValues, Schema, ValidationReport};

/// Whether the form creates a new record or edits a stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// Submitting appends a record with a fresh id.
    New,
    /// Submitting replaces the record with this id.
    Edit(RecordId),
}

/// State of one create/edit form.
#[derive(Debug, Clone)]
pub struct FormSession {
    mode: FormMode,
    schema: Schema,
    values: FormValues,
    report: ValidationReport,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FormSession {
    /// An empty form for a new record.
    #[must_use]
    pub fn new() -> Self {
        Self::build(FormMode::New, FormValues::new())
    }

    /// A form pre-filled from a stored record.
    #[must_use]
    pub fn edit(record: &Record) -> Self {
        Self::build(FormMode::Edit(record.id.clone()), FormValues::from_record(record))
    }

    fn build(mode: FormMode, values: FormValues) -> Self {
        let schema = Schema::competitor();
        let report = schema.validate(&values);
        Self {
            mode,
            schema,
            values,
            report,
        }
    }

    /// Replace the validation schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.report = schema.validate(&self.values);
        self.schema = schema;
        self
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Whether submitting creates a new record.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.mode == FormMode::New
    }

    /// Label of the submit button.
    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::New => "Cadastrar",
            FormMode::Edit(_) => "Salvar Alterações",
        }
    }

    /// All current values.
    #[must_use]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Current value of `field`.
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        self.values.get(field)
    }

    /// Change one field and re-validate.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.values.set(field, value);
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.report = self.schema.validate(&self.values);
    }

    /// Latest validation outcome.
    #[must_use]
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Inline error for `field`, if any.
    #[must_use]
    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.report.error(field)
    }

    /// Whether every field currently passes.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.report.is_valid()
    }

    /// Fill the address fields from a lookup result.
    ///
    /// Returns `false` and leaves every field untouched when nothing was
    /// found.
    pub fn apply_lookup(&mut self, address: Option<AddressFields>) -> bool {
        let Some(address) = address else {
            return false;
        };
        self.values.set(Field::Rua, address.rua);
        self.values.set(Field::Bairro, address.bairro);
        self.values.set(Field::Cidade, address.cidade);
        self.values.set(Field::Uf, address.uf);
        self.revalidate();
        true
    }

    /// Look up the current CEP and fill the address fields.
    ///
    /// Returns `false` when the code was not found; the caller shows the
    /// alert.
    pub async fn lookup_address<L>(&mut self, lookup: &L) -> bool
    where
        L: PostalLookup + ?Sized,
    {
        let cep = self.values.get(Field::Cep).to_string();
        let address = lookup.lookup(&cep).await;
        self.apply_lookup(address)
    }

    /// Clear every value and go back to an empty form.
    pub fn reset(&mut self) {
        self.values = FormValues::new();
        self.revalidate();
    }

    /// Validate and persist the form.
    ///
    /// New forms append a record with a freshly generated id and are reset
    /// on success. Edit forms replace the stored record and keep their
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without writing anything if a field is
    /// invalid, [`Error::RecordNotFound`] if the edited record is gone, or
    /// any storage error.
    pub async fn submit<S: KeyValueStore>(&mut self, store: &RecordStore<S>) -> Result<Record> {
        self.revalidate();
        if !self.report.is_valid() {
            debug!(errors = %self.report, "Submit blocked by validation");
            return Err(Error::Validation(self.report.clone()));
        }

        match &self.mode {
            FormMode::New => {
                let mut record = Record::new("", "", "", "");
                self.values.apply_to(&mut record);
                let saved = store.create(record).await?;
                info!(id = %saved.id, "Registered new record");
                self.reset();
                Ok(saved)
            }
            FormMode::Edit(id) => {
                let mut record = Record::with_id(id.clone(), "", "", "", "");
                self.values.apply_to(&mut record);
                let saved = store.update(record).await?;
                info!(id = %saved.id, "Saved changes to record");
                Ok(saved)
            }
        }
    }
}
