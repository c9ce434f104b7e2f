//! Application startup example
//!
//! This example demonstrates a typical startup sequence:
//! - Reading connection settings from the environment (or a default)
//! - Applying a database configuration
//! - Creating the ID generator store
//! - Registering and running migrations
//! - Building the database handle and generating keys
//!
//! Run with: RUST_LOG=korm_bootstrap=debug cargo run --example startup

use korm_bootstrap::id_generator::IdGeneratorFactories;
use korm_bootstrap::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct InvoicingConfiguration;

impl DatabaseConfiguration for InvoicingConfiguration {
    fn on_model_creating(&self, model: &mut ModelBuilder) {
        model
            .entity("Invoice")
            .has_table_name("Invoices")
            .has_primary_key("Id")
            .use_id_generator();
        model.entity("Customer").has_table_name("Customers");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== KORM Bootstrap - Startup Example ===\n");

    let dir = std::env::temp_dir().join("korm_startup_demo");
    std::fs::create_dir_all(&dir)?;

    let settings = match ConnectionSettings::from_env() {
        Ok(settings) => settings,
        Err(_) => ConnectionSettings::parse(&format!(
            "Data Source={};KormAutoMigrate=true",
            dir.join("invoicing.db").display()
        ))?,
    };
    println!("1. Connection: {} ({})", settings.connection_string(), settings.provider());

    let mut services = ServiceCollection::new();
    let mut builder = services.add_korm(settings)?;

    println!("2. Creating ID store and running migrations...");
    builder
        .use_database_configuration::<InvoicingConfiguration>()
        .init_database_for_id_generator()?
        .add_korm_migrations_with(|options| {
            options.add_embedded_scripts_provider(
                EmbeddedScriptsProvider::new("invoicing")
                    .with_script(
                        "20240101001_CreateCustomers.sql",
                        "CREATE TABLE IF NOT EXISTS Customers (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL);",
                    )
                    .with_script(
                        "20240101002_CreateInvoices.sql",
                        "CREATE TABLE IF NOT EXISTS Invoices (
                            Id INTEGER PRIMARY KEY,
                            CustomerId INTEGER NOT NULL REFERENCES Customers (Id),
                            Total REAL NOT NULL
                        );",
                    ),
            );
        })
        .migrate()?;
    println!("   ✓ Database ready\n");

    let database = builder.build()?;
    println!("3. Model: Invoice -> {}", database.model().table_name("Invoice"));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let factory = IdGeneratorFactories::new().get_factory(&database)?;
        let mut generator = factory.get_generator("Invoices", 10)?;

        println!("4. Generating invoice ids...");
        for _ in 0..3 {
            let id = generator.next_id().await?;
            database
                .execute_with_params(
                    "INSERT INTO Invoices (Id, CustomerId, Total) VALUES (?, 1, ?)",
                    &[DatabaseValue::Long(id), DatabaseValue::Double(99.5)],
                )
                .await?;
            println!("   ✓ Invoice {}", id);
        }
        Ok::<(), DatabaseError>(())
    })?;

    println!("\n=== Example completed successfully ===");
    Ok(())
}
