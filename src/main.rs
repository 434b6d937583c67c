use clap::{Args, Parser, Subcommand};
use evsettle::application::import::{import_events, import_students};
use evsettle::application::roster::{RegistrationUpdate, RosterService};
use evsettle::application::settlement::{SettlementService, SettlementSettings};
use evsettle::config::GatewayConfig;
use evsettle::domain::claims::{Claims, Role};
use evsettle::domain::id::RecordId;
use evsettle::domain::ports::Stores;
use evsettle::domain::registration::PaymentStatus;
use evsettle::domain::signature::sign_payment;
use evsettle::infrastructure::in_memory::in_memory_stores;
use evsettle::infrastructure::notifier::LogNotifier;
use evsettle::infrastructure::razorpay::RazorpayGateway;
use evsettle::interfaces::reply::Reply;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde_json::json;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Events CSV to upsert before running the command
    #[arg(long)]
    events: Option<PathBuf>,

    /// Students CSV to upsert before running the command
    #[arg(long)]
    students: Option<PathBuf>,

    #[command(flatten)]
    gateway: GatewayConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Caller {
    /// Id of the acting user
    #[arg(long)]
    user: RecordId,

    /// Role claimed by the acting user
    #[arg(long, default_value = "admin")]
    role: Role,
}

impl Caller {
    fn claims(&self) -> Claims {
        Claims::new(self.user.clone(), self.role)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Register for a free event or open a payment order for a paid one
    Initiate {
        #[arg(long)]
        event: RecordId,
        #[arg(long)]
        student: RecordId,
    },
    /// Verify a checkout callback and finalize the registration
    Verify {
        #[arg(long)]
        order: String,
        #[arg(long)]
        payment: String,
        #[arg(long)]
        signature: String,
        #[arg(long)]
        event: RecordId,
        #[arg(long)]
        student: RecordId,
    },
    /// Compute the callback signature for an order/payment pair
    Sign {
        #[arg(long)]
        order: String,
        #[arg(long)]
        payment: String,
    },
    /// List an event's registrations, newest first
    Roster {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        event: RecordId,
    },
    /// Registration statistics for an event
    Stats {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        event: RecordId,
    },
    /// Mark registrations of an event as attended
    Attend {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        event: RecordId,
        registrations: Vec<RecordId>,
    },
    /// Change attendance, payment status or notes of a registration
    Update {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        registration: RecordId,
        #[arg(long)]
        attendance: Option<bool>,
        #[arg(long)]
        status: Option<PaymentStatus>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// A student's own registrations with event details, newest first
    Registrations {
        #[command(flatten)]
        caller: Caller,
        /// Defaults to the calling user
        #[arg(long)]
        student: Option<RecordId>,
    },
    /// Write an event's registrations as CSV to stdout
    Export {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        event: RecordId,
    },
}

fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                evsettle::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
            Ok(store.into_stores())
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

fn print_reply<T: Serialize>(reply: Reply<T>) -> Result<()> {
    println!("{}", serde_json::to_string(&reply).into_diagnostic()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let stores = open_stores(cli.db_path.as_deref())?;

    if let Some(path) = &cli.events {
        let file = File::open(path).into_diagnostic()?;
        import_events(&stores, file).await.into_diagnostic()?;
    }
    if let Some(path) = &cli.students {
        let file = File::open(path).into_diagnostic()?;
        import_students(&stores, file).await.into_diagnostic()?;
    }

    let gateway = RazorpayGateway::new(&cli.gateway).into_diagnostic()?;
    let settlement = SettlementService::new(
        stores.clone(),
        Box::new(gateway),
        Box::new(LogNotifier),
        SettlementSettings::from(&cli.gateway),
    );
    let roster = RosterService::new(stores);

    match cli.command {
        Command::Initiate { event, student } => {
            print_reply(settlement.initiate_order(&event, &student).await.into())
        }
        Command::Verify {
            order,
            payment,
            signature,
            event,
            student,
        } => {
            let result = settlement
                .verify_and_finalize(&order, &payment, &signature, &event, &student)
                .await
                .map(|registration| json!({ "registration": registration }));
            print_reply(result.into())
        }
        Command::Sign { order, payment } => {
            let signature = sign_payment(&cli.gateway.key_secret, &order, &payment);
            print_reply(Reply::ok(json!({ "signature": signature })))
        }
        Command::Roster { caller, event } => {
            let result = roster
                .event_registrations(&caller.claims(), &event)
                .await
                .map(|registrations| json!({ "registrations": registrations }));
            print_reply(result.into())
        }
        Command::Stats { caller, event } => {
            let result = roster
                .registration_stats(&caller.claims(), &event)
                .await
                .map(|stats| json!({ "stats": stats }));
            print_reply(result.into())
        }
        Command::Attend {
            caller,
            event,
            registrations,
        } => {
            let result = roster
                .mark_attendance(&caller.claims(), &event, &registrations)
                .await
                .map(|marked| json!({ "marked": marked }));
            print_reply(result.into())
        }
        Command::Update {
            caller,
            registration,
            attendance,
            status,
            notes,
        } => {
            let update = RegistrationUpdate {
                attendance,
                payment_status: status,
                notes,
            };
            let result = roster
                .update_registration(&caller.claims(), &registration, update)
                .await
                .map(|registration| json!({ "registration": registration }));
            print_reply(result.into())
        }
        Command::Registrations { caller, student } => {
            let student = student.unwrap_or_else(|| caller.user.clone());
            let result = roster
                .student_registrations(&caller.claims(), &student)
                .await
                .map(|registrations| json!({ "registrations": registrations }));
            print_reply(result.into())
        }
        Command::Export { caller, event } => {
            let stdout = io::stdout();
            let result = roster
                .export_registrations(&caller.claims(), &event, stdout.lock())
                .await;
            match result {
                Ok(_) => Ok(()),
                Err(e) => print_reply(Reply::<serde_json::Value>::failed(&e)),
            }
        }
    }
}
