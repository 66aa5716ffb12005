//! Competitor record types for crudform.
//!
//! This module defines the record persisted in the collection and the
//! address fields that a postal code lookup can fill in.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a record.
///
/// New records get a UUID v4 string, but any string read back from storage
/// is kept as is. Records saved without an id read back with an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// A fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Mask shown in place of the password on a list card.
pub const PASSWORD_MASK: &str = "*****";

/// A registered competitor.
///
/// Field names follow the persisted JSON layout, so a collection written by
/// an older client reads back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Identifier, immutable after creation.
    #[serde(default, skip_serializing_if = "RecordId::is_empty")]
    pub id: RecordId,
    /// Full name.
    pub nome: String,
    /// Contact email.
    pub email: String,
    /// Password as typed in the form.
    pub senha: String,
    /// Password confirmation as typed in the form.
    pub confirma_senha: String,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    /// Postal code (CEP).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    /// Street.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rua: Option<String>,
    /// House number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    /// Neighborhood.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    /// State abbreviation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uf: Option<String>,
}

impl Record {
    /// Create a record with a freshly generated id and no optional fields.
    #[must_use]
    pub fn new(
        nome: impl Into<String>,
        email: impl Into<String>,
        senha: impl Into<String>,
        confirma_senha: impl Into<String>,
    ) -> Self {
        Self::with_id(RecordId::generate(), nome, email, senha, confirma_senha)
    }

    /// Create a record with a caller-provided id.
    #[must_use]
    pub fn with_id(
        id: RecordId,
        nome: impl Into<String>,
        email: impl Into<String>,
        senha: impl Into<String>,
        confirma_senha: impl Into<String>,
    ) -> Self {
        Self {
            id,
            nome: nome.into(),
            email: email.into(),
            senha: senha.into(),
            confirma_senha: confirma_senha.into(),
            telefone: None,
            cep: None,
            rua: None,
            numero: None,
            bairro: None,
            cidade: None,
            uf: None,
        }
    }

    /// The address part of this record, if any address field is set.
    #[must_use]
    pub fn address(&self) -> Option<AddressFields> {
        if self.rua.is_none() && self.bairro.is_none() && self.cidade.is_none() && self.uf.is_none()
        {
            return None;
        }
        Some(AddressFields {
            rua: self.rua.clone().unwrap_or_default(),
            bairro: self.bairro.clone().unwrap_or_default(),
            cidade: self.cidade.clone().unwrap_or_default(),
            uf: self.uf.clone().unwrap_or_default(),
        })
    }

    /// One-line list card: name, email and a masked password.
    #[must_use]
    pub fn card_line(&self) -> String {
        format!("{}  {}  {}  {PASSWORD_MASK}", self.id, self.nome, self.email)
    }

    /// Copy with both password fields replaced by the mask, for display.
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            senha: PASSWORD_MASK.to_string(),
            confirma_senha: PASSWORD_MASK.to_string(),
            ..self.clone()
        }
    }
}

/// Address fields resolved from a postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    /// Street.
    pub rua: String,
    /// Neighborhood.
    pub bairro: String,
    /// City.
    pub cidade: String,
    /// State abbreviation.
    pub uf: String,
}
