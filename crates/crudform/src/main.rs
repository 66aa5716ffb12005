//! `crudform` - CLI for the competitor registry
//!
//! This binary lists, registers, edits and removes competitors, and resolves
//! postal codes to addresses.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;

use crudform::cli::{
    AddCommand, CepCommand, Cli, Command, ConfigCommand, EditCommand, ListCommand, ShowCommand,
};
use crudform::form::FormSession;
use crudform::postal::{PostalLookup, ViaCepClient};
use crudform::storage::{RecordStore, SqliteKeyValueStore};
use crudform::validation::Field;
use crudform::{filter_by_name, init_logging, Config, Error};

type Store = RecordStore<SqliteKeyValueStore>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config;
    let load = || Config::load_from(config_path.clone()).context("Failed to load configuration");

    match cli.command {
        Command::Config(cmd) => handle_config(config_path.clone(), cmd),
        Command::List(cmd) => handle_list(&open_store(&load()?)?, &cmd).await,
        Command::Show(cmd) => handle_show(&open_store(&load()?)?, &cmd).await,
        Command::Add(cmd) => {
            let config = load()?;
            handle_add(&config, &open_store(&config)?, &cmd).await
        }
        Command::Edit(cmd) => {
            let config = load()?;
            handle_edit(&config, &open_store(&config)?, &cmd).await
        }
        Command::Delete(cmd) => {
            let store = open_store(&load()?)?;
            if !store.delete(&cmd.id).await? {
                return Err(Error::RecordNotFound(cmd.id).into());
            }
            println!("Removed {}", cmd.id);
            Ok(())
        }
        Command::Cep(cmd) => handle_cep(&load()?, &cmd).await,
        Command::Stats(cmd) => {
            let config = load()?;
            handle_stats(&config, &open_store(&config)?, cmd.json).await
        }
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    let path = config.database_path();
    let kv = SqliteKeyValueStore::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(RecordStore::with_key(kv, config.storage.collection_key.clone()))
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<Error>().and_then(Error::validation_report) {
        Some(report) => {
            eprintln!("Please fix the following fields:");
            for (field, message) in report.errors() {
                eprintln!("  {field}: {message}");
            }
        }
        None => eprintln!("Error: {err:#}"),
    }
}

async fn handle_list(store: &Store, cmd: &ListCommand) -> anyhow::Result<()> {
    let records = store.load_all().await;
    let shown = filter_by_name(&records, cmd.query.as_deref().unwrap_or_default());

    if cmd.json {
        let masked: Vec<_> = shown.iter().map(|r| r.masked()).collect();
        println!("{}", serde_json::to_string_pretty(&masked)?);
    } else if shown.is_empty() {
        println!("No competitors found.");
    } else {
        for record in shown {
            println!("{}", record.card_line());
        }
    }
    Ok(())
}

async fn handle_show(store: &Store, cmd: &ShowCommand) -> anyhow::Result<()> {
    let Some(record) = store.get(&cmd.id).await else {
        return Err(Error::RecordNotFound(cmd.id.clone()).into());
    };
    let record = record.masked();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    println!("Id:        {}", record.id);
    println!("Nome:      {}", record.nome);
    println!("Email:     {}", record.email);
    println!("Senha:     {}", record.senha);
    println!("Telefone:  {}", optional(&record.telefone));
    println!("CEP:       {}", optional(&record.cep));
    println!("Rua:       {}", optional(&record.rua));
    println!("Número:    {}", optional(&record.numero));
    println!("Bairro:    {}", optional(&record.bairro));
    println!("Cidade:    {}", optional(&record.cidade));
    println!("UF:        {}", optional(&record.uf));
    Ok(())
}

async fn handle_add(config: &Config, store: &Store, cmd: &AddCommand) -> anyhow::Result<()> {
    let mut form = FormSession::new();
    let overrides = cmd.overrides();
    fill_form(config, &mut form, &overrides, cmd.details.lookup).await?;

    let saved = form.submit(store).await?;
    println!("{}: {}", form.submit_label(), saved.card_line());
    Ok(())
}

async fn handle_edit(config: &Config, store: &Store, cmd: &EditCommand) -> anyhow::Result<()> {
    let Some(record) = store.get(&cmd.id).await else {
        return Err(Error::RecordNotFound(cmd.id.clone()).into());
    };

    let mut form = FormSession::edit(&record);
    let overrides = cmd.overrides();
    fill_form(config, &mut form, &overrides, cmd.details.lookup).await?;

    let saved = form.submit(store).await?;
    println!("{}: {}", form.submit_label(), saved.card_line());
    Ok(())
}

/// Apply command-line values, then optionally auto-fill the address.
///
/// Explicit address flags win over the lookup result.
async fn fill_form(
    config: &Config,
    form: &mut FormSession,
    overrides: &[(Field, String)],
    lookup: bool,
) -> anyhow::Result<()> {
    for (field, value) in overrides {
        form.set_field(*field, value.clone());
    }
    if !lookup {
        return Ok(());
    }

    if !config.postal.enabled {
        eprintln!("CEP lookup is disabled in the configuration.");
        return Ok(());
    }
    let client = ViaCepClient::from_config(&config.postal)?;
    if form.lookup_address(&client).await {
        for (field, value) in overrides {
            form.set_field(*field, value.clone());
        }
    } else {
        eprintln!("CEP não encontrado: {}", form.value(Field::Cep));
    }
    Ok(())
}

async fn handle_cep(config: &Config, cmd: &CepCommand) -> anyhow::Result<()> {
    if !config.postal.enabled {
        bail!("CEP lookup is disabled in the configuration");
    }
    let client = ViaCepClient::from_config(&config.postal)?;
    let Some(address) = client.lookup(&cmd.code).await else {
        bail!("CEP não encontrado: {}", cmd.code);
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&address)?);
    } else {
        println!("Rua:     {}", address.rua);
        println!("Bairro:  {}", address.bairro);
        println!("Cidade:  {}", address.cidade);
        println!("UF:      {}", address.uf);
    }
    Ok(())
}

async fn handle_stats(config: &Config, store: &Store, json: bool) -> anyhow::Result<()> {
    let stats = store.stats().await?;

    if json {
        let mut value = serde_json::to_value(&stats)?;
        value["database_path"] = serde_json::json!(config.database_path());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("crudform stats");
        println!("--------------");
        println!("Database:       {}", config.database_path().display());
        println!("Backend:        {}", stats.backend);
        println!("Collection key: {}", stats.collection_key);
        println!("Records:        {}", stats.total_records);
        match stats.last_modified {
            Some(at) => println!("Last modified:  {}", at.to_rfc3339()),
            None => println!("Last modified:  never"),
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("Failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Collection key:     {}", config.storage.collection_key);
                println!();
                println!("[Postal]");
                println!("  Enabled:            {}", config.postal.enabled);
                println!("  Base URL:           {}", config.postal.base_url);
                println!("  Timeout (secs):     {}", config.postal.timeout_secs);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("Configuration error")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
