mod models;
mod rules;
mod view_model;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use property_validator::{ValidationOptions, ValidationResultArgs, ValidatorToml};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use crate::models::Item;
use crate::view_model::{ItemsPage, SubmitOutcome};

#[derive(Parser)]
#[command(name = "property-validator-demo")]
#[command(version, about = "Items page demo for property-validator", long_about = None)]
struct Cli {
    /// Validation options file (TOML, optionally under [validation])
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debounce delay in milliseconds; overrides the config file
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Don't write errors into the page's error fields
    #[arg(long, global = true)]
    no_autofill: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted editing session and print every validation event
    Script,

    /// Fill the form from arguments and press submit
    Submit {
        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value_t = 0)]
        postal_code: u32,

        #[arg(long, default_value = "")]
        street: String,

        #[arg(long, default_value = "")]
        city: String,

        #[arg(long, default_value = "")]
        country: String,

        /// Select a catalogue item by id
        #[arg(long)]
        item: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = load_options(&cli)?;

    match cli.command {
        Commands::Script => run_script(options).await,
        Commands::Submit {
            first_name,
            last_name,
            email,
            postal_code,
            street,
            city,
            country,
            item,
        } => {
            // Edits from the command line are applied at once, so skip the debounce
            let page = ItemsPage::initialize(ValidationOptions {
                delay: None,
                ..options
            })?;
            let vm = page.view_model();

            vm.set_first_name(first_name);
            vm.set_last_name(last_name);
            vm.set_email_address(email);

            let address = vm.physical_address();
            address.set_postal_code(postal_code);
            address.set_street_address(street);
            address.set_city(city);
            address.set_country_iso_code(country);

            vm.set_selected_item(item.and_then(|id| catalogue().into_iter().find(|i| i.id() == id)));

            print_outcome(&page.submit()?);
            Ok(())
        }
    }
}

fn load_options(cli: &Cli) -> Result<ValidationOptions> {
    let mut options = match &cli.config {
        Some(path) => ValidatorToml::from_file(path)
            .with_context(|| format!("Failed to load validation options from {}", path.display()))?
            .to_options(),
        None => ValidationOptions::default()
            .with_autofill(true)
            .with_delay(Duration::from_millis(700)),
    };

    if let Some(delay_ms) = cli.delay_ms {
        options.delay = (delay_ms > 0).then(|| Duration::from_millis(delay_ms));
    }
    if cli.no_autofill {
        options.autofill = false;
    }

    Ok(options)
}

fn catalogue() -> Vec<Arc<Item>> {
    vec![
        Item::new("1", "Lamp", "Desk lamp"),
        Item::new("2", "Chair", "Oak chair with a long story behind it"),
        Item::new("3", "", "Unnamed"),
    ]
}

async fn run_script(options: ValidationOptions) -> Result<()> {
    let settle = options.delay.unwrap_or_default() + Duration::from_millis(100);
    let page = ItemsPage::initialize(options)?;
    let vm = Arc::clone(page.view_model());

    let mut events = page.validation().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", "Typing a first name quickly (one event expected)".bold());
    vm.set_first_name("J");
    vm.set_first_name("Jo");
    vm.set_first_name("J");
    tokio::time::sleep(settle).await;

    println!("{}", "Entering a last name that is too long".bold());
    vm.set_last_name("Johnson");
    tokio::time::sleep(settle).await;

    println!("{}", "Entering a malformed email".bold());
    vm.set_email_address("jo@");
    tokio::time::sleep(settle).await;

    println!("{}", "Editing the nested address".bold());
    vm.physical_address().set_postal_code(12);
    tokio::time::sleep(settle).await;

    println!("{}", "Pressing submit".bold());
    print_outcome(&page.submit()?);

    println!("{}", "Fixing the form".bold());
    vm.set_first_name("Jo");
    vm.set_last_name("Smith");
    vm.set_email_address("jo@example.com");
    let address = vm.physical_address();
    address.set_postal_code(2611);
    address.set_street_address("Markt 1");
    address.set_city("Delft");
    address.set_country_iso_code("NL");
    vm.set_selected_item(catalogue().into_iter().next());
    tokio::time::sleep(settle).await;

    println!("{}", "Pressing submit again".bold());
    print_outcome(&page.submit()?);

    println!("{}", "Editing the selected item in place".bold());
    if let Some(item) = vm.selected_item() {
        item.set_text("");
        item.set_description("Desk lamp with a brass shade");
    }
    tokio::time::sleep(settle).await;

    page.validation().dispose();
    printer.abort();
    Ok(())
}

fn print_event(event: &ValidationResultArgs) {
    let property = event.property_name().unwrap_or("<all>");
    match event.first_error() {
        Some(error) => println!("  {} {}: {}", "✗".red(), property, error),
        None => println!("  {} {}", "✓".green(), property),
    }
}

fn print_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Accepted => println!("{}", "Submitted!".green().bold()),
        SubmitOutcome::Rejected { message, summary } => {
            println!("{} {}", "Rejected:".red().bold(), message);
            println!("Errors:\n{}", summary);
        }
    }
}
