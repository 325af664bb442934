//! Command-line front end for the optics clinic core.
//!
//! # Responsibility
//! - Boot every session through the license gate before touching records.
//! - Map subcommands onto `optica_core` service operations.
//! - Print results; never write storage except through the core.

use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use optica_core::backup::backup_file_name;
use optica_core::drafting::{
    draft_or_fallback, greeting_template, whatsapp_link, DraftRequest, MessageDrafter,
    OfflineDrafter, Tone,
};
use optica_core::service::dashboard::UNKNOWN_PATIENT_NAME;
use optica_core::{
    boot, init_logging_from_config, open_db, ClinicService, CoreConfig, KeyValueStore,
    LicenseState, Order, OrderStatus, Patient, SqliteKeyValueStore, Startup, ThemePreference,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "optica", about = "Patient and order records for an optics clinic")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show license state and dataset counts.
    Status,
    /// Submit the product key to unlock an expired trial.
    Unlock { secret: String },
    /// List patients, optionally filtered by name or phone.
    Patients { term: Option<String> },
    /// Register a patient.
    AddPatient {
        name: String,
        phone: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// List orders with their patient names.
    Orders,
    /// Create a pending order for a patient.
    AddOrder {
        patient_id: String,
        amount: f64,
        #[arg(long, default_value = "")]
        items: String,
    },
    /// Change an order's status.
    SetStatus { order_id: String, status: String },
    /// Delete a patient; its orders are kept.
    DeletePatient { id: String },
    /// Delete an order.
    DeleteOrder { id: String },
    /// Revenue and order figures.
    Dashboard,
    /// Write a backup file.
    Export { path: Option<PathBuf> },
    /// Restore a backup file, replacing all records.
    Import {
        path: PathBuf,
        /// Only validate and show what would be restored.
        #[arg(long)]
        dry_run: bool,
    },
    /// Draft a WhatsApp message for a patient.
    Draft {
        patient_id: String,
        context: String,
        #[arg(long, default_value = "friendly")]
        tone: String,
    },
    /// Show or set the theme preference.
    Theme { value: Option<String> },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = CoreConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    let conn = open_db(config.db_path())?;
    let kv = SqliteKeyValueStore::new(&conn);
    let startup = boot(kv, config.trial.clone(), Utc::now())?;

    match (cli.command, startup) {
        (Command::Unlock { secret }, Startup::Locked(mut lock)) => {
            lock.submit_secret(&secret, Utc::now())?;
            match lock.enter()? {
                Startup::Unlocked(_) => println!("License activated."),
                Startup::Locked(_) => println!("Still locked."),
            }
            Ok(())
        }
        (Command::Unlock { .. }, Startup::Unlocked(service)) => {
            println!("Nothing to unlock ({}).", service.license().state().as_str());
            Ok(())
        }
        (Command::Status, Startup::Locked(lock)) => {
            println!("optica {}", optica_core::core_version());
            println!("license: {}", lock.gate().state().as_str());
            println!("Trial expired. Run `optica unlock <product key>`.");
            Ok(())
        }
        (_, Startup::Locked(_)) => {
            Err("trial expired; run `optica unlock <product key>` first".into())
        }
        (command, Startup::Unlocked(mut service)) => dispatch(command, &mut service),
    }
}

fn dispatch<S: KeyValueStore>(command: Command, service: &mut ClinicService<S>) -> CliResult<()> {
    match command {
        Command::Status => {
            println!("optica {}", optica_core::core_version());
            let license = service.license();
            println!("license: {}", license.state().as_str());
            if license.state() == LicenseState::InTrial {
                if let Some(days) = license.trial_days_remaining() {
                    println!("trial days remaining: {days}");
                }
            }
            println!("patients: {}", service.store().patients().len());
            println!("orders: {}", service.store().orders().len());
            if service.rehydrate_report().has_storage_read_errors() {
                println!("warning: some stored records were unreadable and set aside");
            }
        }
        Command::Unlock { .. } => {}
        Command::Patients { term } => {
            for patient in service.search_patients(term.as_deref().unwrap_or_default()) {
                println!("{}\t{}\t{}", patient.id, patient.name, patient.phone);
            }
        }
        Command::AddPatient { name, phone, email } => {
            let mut patient = Patient::new(name, phone);
            patient.email = email;
            let id = patient.id.clone();
            service.add_patient(patient)?;
            println!("{id}");
        }
        Command::Orders => {
            for order in service.store().orders() {
                let patient = service
                    .patient_for_order(order)
                    .name_or(UNKNOWN_PATIENT_NAME);
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    order.id, patient, order.amount, order.status, order.items
                );
            }
        }
        Command::AddOrder {
            patient_id,
            amount,
            items,
        } => {
            let order = Order::new(patient_id, items, amount);
            let id = order.id.clone();
            service.create_order(order)?;
            println!("{id}");
        }
        Command::SetStatus { order_id, status } => {
            let status = OrderStatus::parse(&status)
                .ok_or_else(|| format!("unknown order status `{status}`"))?;
            report_outcome(service.update_order_status(&order_id, status)?.is_applied());
        }
        Command::DeletePatient { id } => {
            report_outcome(service.delete_patient(&id)?.is_applied());
        }
        Command::DeleteOrder { id } => {
            report_outcome(service.delete_order(&id)?.is_applied());
        }
        Command::Dashboard => {
            let summary = service.dashboard();
            println!("revenue: {}", summary.total_revenue);
            println!("patients: {}", summary.patient_count);
            println!("active orders: {}", summary.active_orders);
            println!("average ticket: {}", summary.average_ticket);
            for recent in &summary.recent_orders {
                println!(
                    "  {}\t{}\t{}\t{}",
                    recent.order_id, recent.patient_name, recent.amount, recent.status
                );
            }
        }
        Command::Export { path } => {
            let path =
                path.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
            std::fs::write(&path, service.export_backup_json(Utc::now())?)?;
            println!("{}", path.display());
        }
        Command::Import { path, dry_run } => {
            let raw = std::fs::read_to_string(&path)?;
            let summary = if dry_run {
                service.preview_import(&raw)?
            } else {
                service.import_backup(&raw)?
            };
            println!(
                "{} patients, {} orders (version {})",
                summary.patient_count, summary.order_count, summary.version
            );
        }
        Command::Draft {
            patient_id,
            context,
            tone,
        } => {
            let patient = service
                .store()
                .patient(&patient_id)
                .ok_or_else(|| format!("patient not found: {patient_id}"))?;
            let tone = Tone::parse(&tone).ok_or_else(|| format!("unknown tone `{tone}`"))?;
            let message = if context.trim().is_empty() {
                greeting_template(&patient.name)
            } else {
                let request = DraftRequest::new(patient.name.clone(), context, tone);
                draft_or_fallback(drafter().as_ref(), &request)
            };
            println!("{message}");
            println!("{}", whatsapp_link(&patient.phone, &message));
        }
        Command::Theme { value: None } => println!("{}", service.theme()?.as_str()),
        Command::Theme { value: Some(value) } => {
            let theme = ThemePreference::parse(&value)
                .ok_or_else(|| format!("unknown theme `{value}`"))?;
            service.set_theme(theme)?;
        }
    }
    Ok(())
}

fn report_outcome(applied: bool) {
    if applied {
        println!("ok");
    } else {
        println!("no matching record");
    }
}

#[cfg(feature = "remote-drafting")]
fn drafter() -> Box<dyn MessageDrafter> {
    match optica_core::drafting::remote::GeminiDrafter::from_env() {
        Ok(drafter) => Box::new(drafter),
        Err(err) => {
            log::warn!("event=drafter_init module=cli status=fallback error={err}");
            Box::new(OfflineDrafter)
        }
    }
}

#[cfg(not(feature = "remote-drafting"))]
fn drafter() -> Box<dyn MessageDrafter> {
    Box::new(OfflineDrafter)
}
