use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod db;
mod eligibility;
mod error;
mod models;
mod period;
mod renewal;
mod reminders;
mod report;
mod store;

use crate::models::RenewalStatus;
use crate::period::AcademicPeriod;
use crate::store::RecipientStore;

#[derive(Parser)]
#[command(name = "scholarship-renewal-tracker")]
#[command(about = "Scholarship renewal eligibility and reminder tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import award records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List awards expiring within the threshold
    Expiring {
        #[arg(long, default_value_t = crate::eligibility::DEFAULT_EXPIRY_WINDOW_DAYS)]
        days: i64,
        /// Reference date, defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Renew one award into a target period
    Renew {
        #[arg(long)]
        email: String,
        #[arg(long)]
        scholarship: String,
        #[arg(long)]
        year: String,
        #[arg(long)]
        semester: String,
        #[arg(long)]
        target_year: String,
        #[arg(long)]
        target_semester: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Renew every eligible award from a source period into a target period
    BulkRenew {
        #[arg(long)]
        year: String,
        #[arg(long)]
        semester: String,
        #[arg(long)]
        target_year: String,
        #[arg(long)]
        target_semester: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Emit per-item outcomes as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Move expiring awards from Not Applicable into the Pending renewal state
    OpenRenewals {
        #[arg(long, default_value_t = crate::eligibility::DEFAULT_EXPIRY_WINDOW_DAYS)]
        days: i64,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Send renewal reminders for awards expiring within the threshold
    Remind {
        #[arg(long, default_value_t = crate::eligibility::DEFAULT_EXPIRY_WINDOW_DAYS)]
        days: i64,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Generate a markdown renewal report for one period
    Report {
        #[arg(long)]
        year: String,
        #[arg(long)]
        semester: String,
        #[arg(long, default_value_t = crate::eligibility::DEFAULT_EXPIRY_WINDOW_DAYS)]
        days: i64,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn reference_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} award records from {}.", csv.display());
        }
        Commands::Expiring { days, as_of } => {
            let reference = reference_date(as_of);
            let store = db::PgStore::new(pool);
            let expiring = store.list_expiring(reference, days).await?;

            if expiring.is_empty() {
                println!("No awards expire within {days} day(s) of {reference}.");
                return Ok(());
            }

            println!("Awards expiring within {days} day(s) of {reference}:");
            for recipient in &expiring {
                let expiry = recipient
                    .expiration_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let requirements = if recipient.requirements_complete {
                    "complete"
                } else {
                    "incomplete"
                };
                println!(
                    "- {} ({}) {} {} expires {} [renewal: {}, requirements {}]",
                    recipient.student_name,
                    recipient.student_email,
                    recipient.scholarship_name,
                    recipient.period,
                    expiry,
                    recipient.renewal_status,
                    requirements
                );
            }
        }
        Commands::Renew {
            email,
            scholarship,
            year,
            semester,
            target_year,
            target_semester,
            as_of,
        } => {
            let reference = reference_date(as_of);
            let source_period = AcademicPeriod::parse(&year, &semester)?;
            let target_period = AcademicPeriod::parse(&target_year, &target_semester)?;
            let store = db::PgStore::new(pool);

            let source = store
                .find_award(&email, &scholarship, &source_period)
                .await?
                .with_context(|| {
                    format!("no award found for {email} / {scholarship} in {source_period}")
                })?;

            let decision =
                eligibility::evaluate_for_period(&store, &source, &target_period, reference)
                    .await?;
            if !decision.eligible {
                println!("Not eligible: {}.", decision.reason);
                return Ok(());
            }

            let renewed =
                renewal::apply_renewal(&store, &source, &target_period, reference).await?;
            println!(
                "Renewed {} for {} into {} (amount {:.2}, renewal status {}).",
                renewed.scholarship_name,
                renewed.student_name,
                renewed.period,
                renewed.amount,
                renewed.renewal_status
            );
        }
        Commands::BulkRenew {
            year,
            semester,
            target_year,
            target_semester,
            as_of,
            json,
        } => {
            let reference = reference_date(as_of);
            let source_period = AcademicPeriod::parse(&year, &semester)?;
            let target_period = AcademicPeriod::parse(&target_year, &target_semester)?;
            let store = db::PgStore::new(pool);

            let roster = store.list_for_period(&source_period).await?;
            let mut eligible = Vec::new();
            for recipient in roster {
                let decision = eligibility::evaluate(&recipient, reference);
                if decision.eligible {
                    eligible.push(recipient);
                } else {
                    println!(
                        "Skipping {} ({}): {}.",
                        recipient.student_email, recipient.scholarship_name, decision.reason
                    );
                }
            }

            let outcomes =
                renewal::bulk_apply(&store, &eligible, &target_period, reference).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in &outcomes {
                    match &outcome.kind {
                        renewal::OutcomeKind::Created { recipient_id } => println!(
                            "Created {} for {} ({recipient_id}).",
                            outcome.scholarship_name, outcome.student_email
                        ),
                        renewal::OutcomeKind::Duplicate { detail } => {
                            println!("Skipped duplicate: {detail}.")
                        }
                        renewal::OutcomeKind::Failed { detail } => {
                            println!("Failed: {detail}.")
                        }
                    }
                }
            }

            let created = outcomes.iter().filter(|o| o.created()).count();
            println!(
                "Bulk renewal into {target_period}: {created} created, {} skipped.",
                outcomes.len() - created
            );
        }
        Commands::OpenRenewals { days, as_of } => {
            let reference = reference_date(as_of);
            let store = db::PgStore::new(pool);
            let expiring = store.list_expiring(reference, days).await?;

            let mut opened = 0usize;
            for recipient in &expiring {
                if recipient.renewal_status != RenewalStatus::NotApplicable {
                    continue;
                }
                let next = recipient
                    .renewal_status
                    .transition(RenewalStatus::Pending)?;
                store.set_renewal_status(recipient.id, next).await?;
                opened += 1;
            }
            println!("Opened renewal for {opened} award(s) expiring within {days} day(s).");
        }
        Commands::Remind { days, as_of } => {
            let reference = reference_date(as_of);
            let store = db::PgStore::new(pool);
            let count = reminders::dispatch_reminders(
                &store,
                &reminders::ConsoleNotifier,
                days,
                reference,
            )
            .await?;
            println!("Dispatched {count} reminder(s).");
        }
        Commands::Report {
            year,
            semester,
            days,
            as_of,
            out,
        } => {
            let reference = reference_date(as_of);
            let period = AcademicPeriod::parse(&year, &semester)?;
            let store = db::PgStore::new(pool);

            let roster = store.list_for_period(&period).await?;
            let expiring = store.list_expiring(reference, days).await?;
            let open_requirements = store.list_open_requirements(&period).await?;
            let report = report::build_report(
                &period.to_string(),
                days,
                reference,
                &expiring,
                &roster,
                &open_requirements,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
