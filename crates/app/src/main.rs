use std::{error::Error, path::PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{BillPayment, Engine, MoneyCents, NewBillCmd, NewRideCmd, UpdateBillCmd, UpdateRideCmd};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;
use settings::Database;

mod settings;

type AppResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "splitz")]
#[command(about = "Split bills and recurring rides among people")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, env = "SPLITZ_SETTINGS", default_value = "settings")]
    settings: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Bill(Bill),
    Ride(Ride),
}

#[derive(Args, Debug)]
struct Bill {
    #[command(subcommand)]
    command: BillCommand,
}

#[derive(Subcommand, Debug)]
enum BillCommand {
    /// Create a bill split evenly, except for custom payments.
    Create(BillCreateArgs),
    Show { id: i64 },
    List,
    /// Replace a bill with the JSON read from a file.
    Update(UpdateArgs),
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct BillCreateArgs {
    #[arg(long)]
    description: String,
    /// Total amount, e.g. `12.34`.
    #[arg(long, value_parser = parse_money)]
    total: MoneyCents,
    #[arg(long)]
    people: u32,
    /// `LABEL` or `LABEL=AMOUNT` for a custom value. Repeatable.
    #[arg(long = "payment", value_parser = parse_bill_payment)]
    payments: Vec<BillPayment>,
}

#[derive(Args, Debug)]
struct Ride {
    #[command(subcommand)]
    command: RideCommand,
}

#[derive(Subcommand, Debug)]
enum RideCommand {
    /// Create a ride with an empty attendance calendar.
    Create(RideCreateArgs),
    Show { id: i64 },
    List,
    /// Replace a ride with the JSON read from a file.
    Update(UpdateArgs),
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct RideCreateArgs {
    #[arg(long)]
    description: String,
    /// Cost of one occurrence, e.g. `2.50`.
    #[arg(long, value_parser = parse_money)]
    unit_cost: MoneyCents,
    #[arg(long, default_value_t = 1)]
    occurrences: u32,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
    #[arg(long)]
    weekends: bool,
    #[arg(long = "participant")]
    participants: Vec<String>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    #[arg(long)]
    file: PathBuf,
}

fn parse_money(raw: &str) -> Result<MoneyCents, String> {
    raw.parse().map_err(|err: engine::EngineError| err.to_string())
}

fn parse_bill_payment(raw: &str) -> Result<BillPayment, String> {
    match raw.split_once('=') {
        Some((label, amount)) => Ok(BillPayment::custom(label, parse_money(amount)?.cents())),
        None => Ok(BillPayment::new(raw)),
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> AppResult<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.settings)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "splitz={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = Engine::builder()
        .database(db)
        .unknown_ids(settings.engine.unknown_ids)
        .build()
        .await?;

    match cli.command {
        Command::Bill(Bill { command }) => run_bill(&engine, command).await,
        Command::Ride(Ride { command }) => run_ride(&engine, command).await,
    }
}

async fn run_bill(engine: &Engine, command: BillCommand) -> AppResult<()> {
    match command {
        BillCommand::Create(args) => {
            let cmd = args.payments.into_iter().fold(
                NewBillCmd::new(args.description, args.total.cents(), args.people),
                NewBillCmd::payment,
            );
            let bill = engine.new_bill(cmd).await?;
            tracing::debug!(
                bill_id = bill.id,
                total = %MoneyCents::new(bill.total_minor),
                "bill stored"
            );
            print_json(&bill)
        }
        BillCommand::Show { id } => print_json(&engine.bill(id).await?),
        BillCommand::List => print_json(&engine.bills().await?),
        BillCommand::Update(args) => {
            let cmd: UpdateBillCmd = read_json(&args.file)?;
            print_json(&engine.update_bill(cmd).await?)
        }
        BillCommand::Delete { id } => {
            engine.delete_bill(id).await?;
            println!("deleted bill {id}");
            Ok(())
        }
    }
}

async fn run_ride(engine: &Engine, command: RideCommand) -> AppResult<()> {
    match command {
        RideCommand::Create(args) => {
            let cmd = args.participants.into_iter().fold(
                NewRideCmd::new(
                    args.description,
                    args.unit_cost.cents(),
                    args.occurrences,
                    args.start,
                    args.end,
                )
                .include_weekends(args.weekends),
                NewRideCmd::participant,
            );
            let ride = engine.new_ride(cmd).await?;
            tracing::debug!(
                ride_id = ride.id,
                unit_cost = %MoneyCents::new(ride.unit_cost_minor),
                "ride stored"
            );
            print_json(&ride)
        }
        RideCommand::Show { id } => print_json(&engine.ride(id).await?),
        RideCommand::List => print_json(&engine.rides().await?),
        RideCommand::Update(args) => {
            let cmd: UpdateRideCmd = read_json(&args.file)?;
            print_json(&engine.update_ride(cmd).await?)
        }
        RideCommand::Delete { id } => {
            engine.delete_ride(id).await?;
            println!("deleted ride {id}");
            Ok(())
        }
    }
}

async fn parse_database(config: &Database) -> AppResult<sea_orm::DatabaseConnection> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!("database ready");
    Ok(database)
}
