//! Declarative validation for the registration form.
//!
//! A [`Schema`] lists, per field, an ordered set of [`Rule`]s. Validation
//! evaluates every field independently and reports the first failing rule's
//! message for each one.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::record::Record;

/// A form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Full name.
    Nome,
    /// Email.
    Email,
    /// Password.
    Senha,
    /// Password confirmation.
    ConfirmaSenha,
    /// Phone.
    Telefone,
    /// Postal code.
    Cep,
    /// Street.
    Rua,
    /// House number.
    Numero,
    /// Neighborhood.
    Bairro,
    /// City.
    Cidade,
    /// State.
    Uf,
}

impl Field {
    /// Every field, in form order.
    pub const ALL: [Self; 11] = [
        Self::Nome,
        Self::Email,
        Self::Senha,
        Self::ConfirmaSenha,
        Self::Telefone,
        Self::Cep,
        Self::Rua,
        Self::Numero,
        Self::Bairro,
        Self::Cidade,
        Self::Uf,
    ];

    /// The field name as stored and shown to the user.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nome => "nome",
            Self::Email => "email",
            Self::Senha => "senha",
            Self::ConfirmaSenha => "confirmaSenha",
            Self::Telefone => "telefone",
            Self::Cep => "cep",
            Self::Rua => "rua",
            Self::Numero => "numero",
            Self::Bairro => "bairro",
            Self::Cidade => "cidade",
            Self::Uf => "uf",
        }
    }

    /// Look a field up by its name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Current string value of every form field. Unset fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<Field, String>);

impl FormValues {
    /// All fields empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `field`, or `""` if unset.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        self.0.get(&field).map_or("", String::as_str)
    }

    /// Set the value of `field`.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    /// Builder-style [`FormValues::set`].
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Non-empty value of `field`, if any.
    #[must_use]
    pub fn optional(&self, field: Field) -> Option<String> {
        let value = self.get(field);
        if value.trim().is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Pre-fill from a stored record.
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        let mut values = Self::new()
            .with(Field::Nome, &record.nome)
            .with(Field::Email, &record.email)
            .with(Field::Senha, &record.senha)
            .with(Field::ConfirmaSenha, &record.confirma_senha);
        let optional = [
            (Field::Telefone, &record.telefone),
            (Field::Cep, &record.cep),
            (Field::Rua, &record.rua),
            (Field::Numero, &record.numero),
            (Field::Bairro, &record.bairro),
            (Field::Cidade, &record.cidade),
            (Field::Uf, &record.uf),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                values.set(field, value);
            }
        }
        values
    }

    /// Copy every value into `record`, keeping its id.
    pub fn apply_to(&self, record: &mut Record) {
        record.nome = self.get(Field::Nome).to_string();
        record.email = self.get(Field::Email).to_string();
        record.senha = self.get(Field::Senha).to_string();
        record.confirma_senha = self.get(Field::ConfirmaSenha).to_string();
        record.telefone = self.optional(Field::Telefone);
        record.cep = self.optional(Field::Cep);
        record.rua = self.optional(Field::Rua);
        record.numero = self.optional(Field::Numero);
        record.bairro = self.optional(Field::Bairro);
        record.cidade = self.optional(Field::Cidade);
        record.uf = self.optional(Field::Uf);
    }
}

/// One validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Value must not be empty or whitespace.
    Required {
        /// Message when the rule fails.
        message: String,
    },
    /// Value must have at least `min` characters.
    MinLength {
        /// Minimum character count.
        min: usize,
        /// Message when the rule fails.
        message: String,
    },
    /// Value must look like an email address. Empty values pass.
    Email {
        /// Compiled address shape.
        pattern: Regex,
        /// Message when the rule fails.
        message: String,
    },
    /// Value must equal the value of another field.
    EqualsField {
        /// Field to compare against.
        other: Field,
        /// Message when the rule fails.
        message: String,
    },
}

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

impl Rule {
    /// Required-field rule.
    pub fn required(message: impl Into<String>) -> Self {
        Self::Required {
            message: message.into(),
        }
    }

    /// Minimum length rule.
    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::MinLength {
            min,
            message: message.into(),
        }
    }

    /// Email shape rule.
    ///
    /// # Panics
    ///
    /// Panics if the built-in email pattern fails to compile.
    pub fn email(message: impl Into<String>) -> Self {
        Self::Email {
            pattern: Regex::new(EMAIL_PATTERN).expect("Invalid email pattern"),
            message: message.into(),
        }
    }

    /// Cross-field equality rule.
    pub fn equals_field(other: Field, message: impl Into<String>) -> Self {
        Self::EqualsField {
            other,
            message: message.into(),
        }
    }

    /// Check `value`; returns the failure message if the rule is broken.
    #[must_use]
    pub fn check<'a>(&'a self, value: &str, values: &FormValues) -> Option<&'a str> {
        let passed = match self {
            Self::Required { .. } => !value.trim().is_empty(),
            Self::MinLength { min, .. } => value.chars().count() >= *min,
            Self::Email { pattern, .. } => value.is_empty() || pattern.is_match(value),
            Self::EqualsField { other, .. } => value == values.get(*other),
        };
        if passed {
            None
        } else {
            Some(self.message())
        }
    }

    /// The message reported when this rule fails.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Required { message }
            | Self::MinLength { message, .. }
            | Self::Email { message, .. }
            | Self::EqualsField { message, .. } => message,
        }
    }
}

/// Outcome for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    /// All rules passed.
    Valid,
    /// The first failing rule's message.
    Invalid(String),
}

impl FieldStatus {
    /// Whether the field passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Per-field outcome of validating a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport(BTreeMap<Field, FieldStatus>);

impl ValidationReport {
    /// True iff every field is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.values().all(FieldStatus::is_valid)
    }

    /// Status of `field`. Fields without rules are valid.
    #[must_use]
    pub fn status(&self, field: Field) -> &FieldStatus {
        self.0.get(&field).unwrap_or(&FieldStatus::Valid)
    }

    /// Error message for `field`, if it failed.
    #[must_use]
    pub fn error(&self, field: Field) -> Option<&str> {
        match self.status(field) {
            FieldStatus::Valid => None,
            FieldStatus::Invalid(message) => Some(message),
        }
    }

    /// Failed fields and their messages, in form order.
    pub fn errors(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().filter_map(|(field, status)| match status {
            FieldStatus::Valid => None,
            FieldStatus::Invalid(message) => Some((*field, message.as_str())),
        })
    }

    fn insert(&mut self, field: Field, status: FieldStatus) {
        self.0.insert(field, status);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.errors() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        if first {
            f.write_str("no errors")?;
        }
        Ok(())
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let errors: BTreeMap<&str, &str> = self
            .errors()
            .map(|(field, message)| (field.as_str(), message))
            .collect();
        errors.serialize(serializer)
    }
}

/// A set of rules per field.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(Field, Vec<Rule>)>,
}

impl Schema {
    /// An empty schema; every form is valid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rules` for `field`, checked in the given order.
    #[must_use]
    pub fn field(mut self, field: Field, rules: Vec<Rule>) -> Self {
        self.fields.push((field, rules));
        self
    }

    /// The competitor registration schema.
    #[must_use]
    pub fn competitor() -> Self {
        Self::new()
            .field(
                Field::Nome,
                vec![
                    Rule::required("Nome é obrigatório"),
                    Rule::min_length(3, "Informe no mínimo 3 caracteres"),
                ],
            )
            .field(
                Field::Email,
                vec![
                    Rule::required("Email é obrigatório"),
                    Rule::min_length(6, "Informe no mínimo 6 caracteres"),
                    Rule::email("E-mail informado não é válido"),
                ],
            )
            .field(
                Field::Senha,
                vec![
                    Rule::required("Senha é obrigatório"),
                    Rule::min_length(6, "Informe no mínimo 6 caracteres"),
                ],
            )
            .field(
                Field::ConfirmaSenha,
                vec![
                    Rule::required("Confirmação de senha é obrigatório"),
                    Rule::equals_field(Field::Senha, "As senhas devem coincidir"),
                ],
            )
    }

    /// Validate one field against the current values.
    #[must_use]
    pub fn validate_field(&self, field: Field, values: &FormValues) -> FieldStatus {
        let value = values.get(field);
        self.fields
            .iter()
            .filter(|(f, _)| *f == field)
            .flat_map(|(_, rules)| rules)
            .find_map(|rule| rule.check(value, values))
            .map_or(FieldStatus::Valid, |message| {
                FieldStatus::Invalid(message.to_string())
            })
    }

    /// Validate every field with rules.
    #[must_use]
    pub fn validate(&self, values: &FormValues) -> ValidationReport {
        let mut report = ValidationReport::default();
        for (field, _) in &self.fields {
            report.insert(*field, self.validate_field(*field, values));
        }
        report
    }
}
