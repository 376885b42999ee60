//! Subcommand handlers.
//!
//! Every handler prints the rendered rows followed by the status line, or
//! the JSON envelope for catalog operations.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use coursekit_core::db::open_db;
use coursekit_core::{
    envelope_unit, AppConfig, CatalogService, EditOutcome, Envelope, HttpRemoteCollection,
    ItemSynchronizer, NotesWidget, ProductChanges, ProductFilter, ProductInput, RecordingSurface,
    SqliteSlotRepository,
};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Run the scripted catalog walkthrough and print every envelope
    Demo,
}

#[derive(Args, Debug)]
pub struct NotesArgs {
    #[command(subcommand)]
    command: NotesCommand,
}

#[derive(Subcommand, Debug)]
enum NotesCommand {
    /// Print stored notes with their index
    List,
    /// Append one note
    Add { text: String },
    /// Delete the note at INDEX (0-based)
    Delete { index: usize },
}

#[derive(Args, Debug)]
pub struct ItemsArgs {
    #[command(subcommand)]
    command: ItemsCommand,
}

#[derive(Subcommand, Debug)]
enum ItemsCommand {
    /// Print local items
    List,
    /// Add a local-only item
    Add {
        name: String,
        /// Price text; blank means 0
        #[arg(default_value = "")]
        price: String,
    },
    /// Edit name and/or price; omitted values keep the current ones
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
    },
    /// Delete locally, then remotely for synced items
    Delete { id: String },
    /// Replace the local list with the remote collection
    Pull,
    /// Create every unsynced item remotely
    Push,
    /// Empty the local list without touching the remote
    Clear,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the resolved configuration as TOML
    Show,
}

pub fn run_catalog(args: CatalogArgs) -> Result<()> {
    match args.command {
        CatalogCommand::Demo => run_catalog_demo(),
    }
}

fn run_catalog_demo() -> Result<()> {
    let mut catalog = CatalogService::with_demo_seed();

    println!("\nCreate new products:");
    print_envelope(catalog.create_product(
        &ProductInput::new("p003", "Milk", 5500.0, "food"),
        10,
    ));
    print_envelope(catalog.create_product(
        &ProductInput::new("p004", "Water", 3000.0, "beverages"),
        25,
    ));

    println!("\nStock updates:");
    print_envelope(catalog.adjust_stock("p003", 5));
    print_envelope(catalog.adjust_stock("p004", -10));

    println!("\nUpdate product:");
    print_envelope(catalog.update_product(
        "p002",
        &ProductChanges {
            price: Some(4500.0),
            category: Some("bakery".to_string()),
            ..ProductChanges::default()
        },
    ));

    println!("\nGet product p004:");
    print_envelope(catalog.get_product("p004"));

    println!("\nList only beverages:");
    print_envelope(Ok::<_, String>(catalog.list_products(&ProductFilter {
        only_active: false,
        category: Some("beverages".to_string()),
    })));

    println!("\nDelete p001:");
    println!("{}", envelope_unit(catalog.delete_product("p001")).to_json());

    println!("\nReports:");
    for line in catalog.report_lines() {
        println!("{line}");
    }
    Ok(())
}

pub fn run_notes(args: NotesArgs, config: &AppConfig) -> Result<()> {
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let repo = SqliteSlotRepository::try_new(&conn)?;
    let mut widget = NotesWidget::open(repo, RecordingSurface::new());

    let outcome = match args.command {
        NotesCommand::List => Ok(()),
        NotesCommand::Add { text } => widget.add_note(&text).map(|_| ()),
        NotesCommand::Delete { index } => widget.delete_note(index).map(|_| ()),
    };

    print_surface(widget.surface());
    outcome.map_err(Into::into)
}

pub fn run_items(args: ItemsArgs, config: &AppConfig) -> Result<()> {
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let repo = SqliteSlotRepository::try_new(&conn)?;
    let remote = HttpRemoteCollection::new(&config.api.base_url, &config.api.resource);
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());

    let outcome = match args.command {
        ItemsCommand::List => Ok(()),
        ItemsCommand::Add { name, price } => sync.add_item(&name, &price).map(|_| ()),
        ItemsCommand::Edit { id, name, price } => {
            // Unset flags behave like a prompt accepted with its prefilled value.
            let current = sync.items().iter().find(|item| item.id == id).cloned();
            let name = name.or_else(|| current.as_ref().map(|item| item.name.clone()));
            let price = price.or_else(|| current.as_ref().map(|item| item.price.to_string()));
            sync.edit_item(&id, name.as_deref(), price.as_deref())
                .map(|outcome| {
                    if outcome == EditOutcome::Cancelled {
                        println!("edit cancelled");
                    }
                })
        }
        ItemsCommand::Delete { id } => sync.delete_item(&id).map(|_| ()),
        ItemsCommand::Pull => sync.pull().map(|_| ()),
        ItemsCommand::Push => {
            let report = sync.push();
            println!("pushed {}/{}", report.pushed, report.pending);
            match report.failure {
                Some(failure) => {
                    println!("stopped at pending #{} ({})", failure.index, failure.local_id);
                    Err(failure.error)
                }
                None => Ok(()),
            }
        }
        ItemsCommand::Clear => sync.clear_local(),
    };

    print_surface(sync.surface());
    outcome.map_err(Into::into)
}

pub fn run_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.command {
        ConfigCommand::Show => print!("{}", config.to_toml_string()),
    }
    Ok(())
}

fn print_envelope<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) {
    println!("{}", Envelope::from(result).to_json());
}

fn print_surface(surface: &RecordingSurface) {
    for row in surface.rows() {
        println!("[{}] {}", row.key, row.text);
    }
    if let Some(status) = surface.status() {
        println!("{status}");
    }
}
