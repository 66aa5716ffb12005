//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::record::RecordId;
use crate::validation::Field;

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show records whose name starts with this (case-insensitive)
    pub query: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record id
    pub id: RecordId,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Optional contact and address fields shared by `add` and `edit`.
#[derive(Debug, Default, Args)]
pub struct DetailArgs {
    /// Phone number
    #[arg(long)]
    pub telefone: Option<String>,

    /// Postal code (CEP)
    #[arg(long)]
    pub cep: Option<String>,

    /// Street
    #[arg(long)]
    pub rua: Option<String>,

    /// House number
    #[arg(long)]
    pub numero: Option<String>,

    /// Neighborhood
    #[arg(long)]
    pub bairro: Option<String>,

    /// City
    #[arg(long)]
    pub cidade: Option<String>,

    /// State abbreviation
    #[arg(long)]
    pub uf: Option<String>,

    /// Fill street, neighborhood, city and state from the CEP
    #[arg(long)]
    pub lookup: bool,
}

impl DetailArgs {
    /// Fields given on the command line.
    #[must_use]
    pub fn overrides(&self) -> Vec<(Field, String)> {
        collect(&[
            (Field::Telefone, &self.telefone),
            (Field::Cep, &self.cep),
            (Field::Rua, &self.rua),
            (Field::Numero, &self.numero),
            (Field::Bairro, &self.bairro),
            (Field::Cidade, &self.cidade),
            (Field::Uf, &self.uf),
        ])
    }
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Full name
    #[arg(long)]
    pub nome: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Password
    #[arg(long)]
    pub senha: String,

    /// Password confirmation
    #[arg(long)]
    pub confirma_senha: String,

    #[command(flatten)]
    pub details: DetailArgs,
}

impl AddCommand {
    /// Every field given on the command line.
    #[must_use]
    pub fn overrides(&self) -> Vec<(Field, String)> {
        let mut fields = vec![
            (Field::Nome, self.nome.clone()),
            (Field::Email, self.email.clone()),
            (Field::Senha, self.senha.clone()),
            (Field::ConfirmaSenha, self.confirma_senha.clone()),
        ];
        fields.extend(self.details.overrides());
        fields
    }
}

/// Edit command arguments.
///
/// Fields left out keep their stored value.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Record id
    pub id: RecordId,

    /// Full name
    #[arg(long)]
    pub nome: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Password
    #[arg(long)]
    pub senha: Option<String>,

    /// Password confirmation
    #[arg(long)]
    pub confirma_senha: Option<String>,

    #[command(flatten)]
    pub details: DetailArgs,
}

impl EditCommand {
    /// Fields given on the command line.
    #[must_use]
    pub fn overrides(&self) -> Vec<(Field, String)> {
        let mut fields = collect(&[
            (Field::Nome, &self.nome),
            (Field::Email, &self.email),
            (Field::Senha, &self.senha),
            (Field::ConfirmaSenha, &self.confirma_senha),
        ]);
        fields.extend(self.details.overrides());
        fields
    }
}

fn collect(fields: &[(Field, &Option<String>)]) -> Vec<(Field, String)> {
    fields
        .iter()
        .filter_map(|(field, value)| value.as_ref().map(|v| (*field, v.clone())))
        .collect()
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Record id
    pub id: RecordId,
}

/// CEP lookup command arguments.
#[derive(Debug, Args)]
pub struct CepCommand {
    /// Postal code, with or without the dash
    pub code: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add() -> AddCommand {
        AddCommand {
            nome: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            senha: "123456".to_string(),
            confirma_senha: "123456".to_string(),
            details: DetailArgs::default(),
        }
    }

    #[test]
    fn test_add_overrides_required_fields() {
        let fields = add().overrides();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], (Field::Nome, "Ana".to_string()));
        assert_eq!(fields[3], (Field::ConfirmaSenha, "123456".to_string()));
    }

    #[test]
    fn test_add_overrides_include_details() {
        let mut cmd = add();
        cmd.details.cep = Some("01001-000".to_string());
        cmd.details.uf = Some("SP".to_string());

        let fields = cmd.overrides();
        assert!(fields.contains(&(Field::Cep, "01001-000".to_string())));
        assert!(fields.contains(&(Field::Uf, "SP".to_string())));
        assert_eq!(fields.len(), 6);
    }

    #[test]
    fn test_edit_overrides_only_given_fields() {
        let cmd = EditCommand {
            id: RecordId::from("abc"),
            nome: Some("Ana Maria".to_string()),
            email: None,
            senha: None,
            confirma_senha: None,
            details: DetailArgs {
                numero: Some("12".to_string()),
                ..DetailArgs::default()
            },
        };
        assert_eq!(
            cmd.overrides(),
            vec![
                (Field::Nome, "Ana Maria".to_string()),
                (Field::Numero, "12".to_string()),
            ]
        );
    }

    #[test]
    fn test_detail_args_default_is_empty() {
        let details = DetailArgs::default();
        assert!(details.overrides().is_empty());
        assert!(!details.lookup);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_cep_command_debug() {
        let cmd = CepCommand {
            code: "01001000".to_string(),
            json: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("01001000"));
    }
}
