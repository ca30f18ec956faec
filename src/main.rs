use std::io;
use std::process::ExitCode;

use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use upi_desk::config::{Config, Preferences};
use upi_desk::csv::{read_transactions, write_settlements, write_transactions};
use upi_desk::otp::{OtpError, OtpSession, SeededCodes};
use upi_desk::sample::{SampleError, SampleTransactions, sample_settlements};
use upi_desk::summary::{self, TxSummary};
use upi_desk::{Amount, DeepLink, Direction, Filter, Query, SortField, Transaction, TxStatus, Vpa};

#[derive(Parser, Debug)]
#[command(name = "upi-desk", author, version, about = "UPI merchant dashboard tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter, sort and page a transactions csv; writes the page as csv
    Filter(FilterArgs),
    /// Print per-status counts and volume of a transactions csv
    Summary {
        /// Path to the transactions csv
        input: String,
    },
    /// Build a upi://pay link for a static or dynamic QR code
    Qr {
        /// Payee VPA (handle@bank)
        #[arg(long)]
        vpa: String,
        /// Payee display name
        #[arg(long)]
        name: String,
        /// Fixed amount in rupees; makes the QR dynamic
        #[arg(long)]
        amount: Option<String>,
        /// Transaction note
        #[arg(long)]
        note: Option<String>,
        /// Merchant reference
        #[arg(long)]
        reference: Option<String>,
    },
    /// Write sample transactions as csv
    Demo {
        #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(0..=100_000))]
        count: u32,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long, default_value = "store@okaxis")]
        payee: String,
    },
    /// Send a simulated OTP, then verify codes read from stdin, one per line
    Otp {
        /// Indian mobile number, optionally prefixed with +91
        #[arg(long)]
        phone: String,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Write the sample settlements of one sub-merchant as csv
    Settlements {
        #[arg(long)]
        merchant: u32,
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=3660))]
        days: u32,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Path to the transactions csv
    input: String,
    /// Case-insensitive text matched against id, payer, payee, RRN and remark
    #[arg(long, default_value = "")]
    query: String,
    /// Keep only these statuses (repeatable): SUCCESS, PENDING, FAILURE, DEEMED
    #[arg(long = "status")]
    statuses: Vec<TxStatus>,
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
    /// Sort descending
    #[arg(long)]
    desc: bool,
    /// 1-based page index
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Overrides UPI_DESK_PAGE_SIZE
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Date,
    Amount,
}

impl From<SortArg> for SortField {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => SortField::Date,
            SortArg::Amount => SortField::Amount,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), upi_desk::Error> {
    let config = Config::from_env()?;
    let mut prefs = Preferences::default();
    prefs.set_language(config.language.code())?;
    info!(page_size = config.page_size, language = %prefs.language(), "config loaded");

    match command {
        Command::Filter(args) => filter(args, &config).await,
        Command::Summary { input } => {
            let transactions = load(input).await?;
            print_summary(&transactions)
        }
        Command::Qr {
            vpa,
            name,
            amount,
            note,
            reference,
        } => {
            let vpa: Vpa = vpa.parse()?;
            let mut link = DeepLink::fixed(vpa, name)?;
            if let Some(amount) = amount {
                link = link.with_amount(amount.parse::<Amount>()?)?;
            }
            if let Some(reference) = reference {
                link = link.with_reference(reference);
            }
            if let Some(note) = note {
                link = link.with_note(note);
            }
            println!("{link}");
            Ok(())
        }
        Command::Demo {
            count,
            seed,
            payee,
        } => {
            let today = Utc::now().date_naive();
            let start = today - chrono::Duration::days(7);
            let rows: Vec<_> =
                SampleTransactions::new(count as usize, &payee, start, seed).collect();
            write_transactions(io::stdout().lock(), &rows)?;
            Ok(())
        }
        Command::Otp { phone, seed } => otp(&phone, seed, &config).await,
        Command::Settlements { merchant, days } => {
            let today = Utc::now().date_naive();
            let start = today.checked_sub_days(Days::new(u64::from(days))).ok_or(
                SampleError::DateOutOfRange {
                    start: today,
                    days: u64::from(days),
                },
            )?;
            let mut merchants = vec![1, 2, 3];
            if !merchants.contains(&merchant) {
                merchants.push(merchant);
            }
            let rows = sample_settlements(start, days, &merchants)?;
            let drilled = summary::drill_down(&rows, merchant);
            write_settlements(io::stdout().lock(), drilled)?;
            Ok(())
        }
    }
}

/// Read a transactions csv on a separate task and collect the valid rows;
/// bad rows are reported and skipped.
async fn load(path: String) -> Result<Vec<Transaction>, upi_desk::Error> {
    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let rows = read_transactions(path.clone())?;
    let (tx_sender, tx_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in rows {
            match result {
                Ok(tx) => {
                    if tx_sender.send(tx).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    Ok(ReceiverStream::new(tx_receiver).collect().await)
}

async fn filter(args: FilterArgs, config: &Config) -> Result<(), upi_desk::Error> {
    let mut filter = Filter::new().query(args.query).statuses(args.statuses);
    if let Some(from) = args.from {
        filter = filter.from(from);
    }
    if let Some(to) = args.to {
        filter = filter.to(to);
    }

    let mut query = Query::new(args.page_size.unwrap_or(config.page_size))?.with_filter(filter);
    if let Some(sort) = args.sort {
        let direction = if args.desc { Direction::Desc } else { Direction::Asc };
        query = query.sorted_by(sort.into(), direction);
    }

    let transactions = load(args.input).await?;
    let page = query.run(&transactions, args.page)?;
    info!(
        page = page.page,
        total_pages = page.total_pages,
        matched = page.total_items,
        "page selected"
    );
    if page.is_empty() {
        warn!("no matching transactions");
    }

    write_transactions(io::stdout().lock(), page.items)?;
    Ok(())
}

/// Prints the issued code (the simulated SMS), then checks stdin lines until
/// one matches or the session locks.
async fn otp(phone: &str, seed: u64, config: &Config) -> Result<(), upi_desk::Error> {
    let mut session = OtpSession::new(phone, config.latency, SeededCodes::new(seed))?;
    let code = session.send().await?;
    println!("sent {code} to {}", session.phone());

    // Not spawn_blocking: the runtime waits for blocking tasks on shutdown.
    let (line_sender, mut line_receiver) = tokio::sync::mpsc::channel(4);
    std::thread::spawn(move || {
        for line in io::stdin().lines() {
            if line_sender.blocking_send(line).is_err() {
                break;
            }
        }
    });

    while let Some(line) = line_receiver.recv().await {
        let line = line?;
        match session.verify(&line).await {
            Ok(()) => {
                println!("verified");
                return Ok(());
            }
            Err(OtpError::Mismatch { remaining }) => println!("incorrect, {remaining} left"),
            Err(e) => return Err(e.into()),
        }
    }
    Err(OtpError::Abandoned.into())
}

fn print_summary(transactions: &[Transaction]) -> Result<(), upi_desk::Error> {
    let summary = TxSummary::from_transactions(transactions)?;
    println!("status,count,amount");
    for status in TxStatus::ALL {
        let bucket = summary.bucket(*status);
        println!("{status},{},{}", bucket.count, bucket.amount);
    }
    println!("TOTAL,{},{}", summary.total.count, summary.total.amount);
    println!("success_rate,{:.2}", summary.success_rate() * 100.0);
    Ok(())
}
