use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::generator::KindPolicy;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{Clock, QuizConfig, QuizServices, corpus};

mod logging;
mod play;

const DEFAULT_DB_URL: &str = "sqlite:quiz.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuestionCount { raw: String },
    InvalidSeed { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuestionCount { raw } => {
                write!(f, "invalid --questions value: {raw} (expected a number above 0)")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <sqlite_url>] [--questions <n>] [--seed <u64>] [--choice-only]");
    eprintln!("  cargo run -p app -- seed  [--db <sqlite_url>] [--words <file.json>]");
    eprintln!("  cargo run -p app -- stats [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --questions 10");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_QUESTIONS, QUIZ_SEED, QUIZ_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Seed,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "seed" => Some(Self::Seed),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

/// Values picked up from the environment before flags override them.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Defaults {
    db_url: String,
    question_count: usize,
    seed: Option<u64>,
}

impl Defaults {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            db_url: normalize_sqlite_url(
                lookup("QUIZ_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into()),
            ),
            question_count: lookup("QUIZ_QUESTIONS")
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|count| *count > 0)
                .unwrap_or(10),
            seed: lookup("QUIZ_SEED").and_then(|value| value.parse::<u64>().ok()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    question_count: usize,
    seed: Option<u64>,
    choice_only: bool,
    words: Option<PathBuf>,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        defaults: Defaults,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: defaults.db_url,
            question_count: defaults.question_count,
            seed: defaults.seed,
            choice_only: false,
            words: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--questions" => {
                    let value = require_value(args, "--questions")?;
                    parsed.question_count = value
                        .parse::<usize>()
                        .ok()
                        .filter(|count| *count > 0)
                        .ok_or(ArgsError::InvalidQuestionCount { raw: value })?;
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let seed = value
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    parsed.seed = Some(seed);
                }
                "--choice-only" => parsed.choice_only = true,
                "--words" => {
                    parsed.words = Some(PathBuf::from(require_value(args, "--words")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn quiz_config(&self) -> QuizConfig {
        let policy = if self.choice_only {
            KindPolicy::ChoiceOnly
        } else {
            KindPolicy::AllKinds
        };
        QuizConfig::default()
            .with_question_count(self.question_count)
            .with_kind_policy(policy)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Seeding and stats only make sense against the real database, never the
/// in-memory fallback.
fn require_durable(services: &QuizServices, db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if services.is_durable() {
        return Ok(());
    }
    Err(format!("cannot open {db_url}").into())
}

/// Create the database file and its directory so `SQLite` can open it.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter(), Defaults::from_env()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    logging::init_tracing();

    if let Err(err) = prepare_sqlite_file(&parsed.db_url) {
        tracing::warn!(error = %err, url = %parsed.db_url, "could not prepare database file");
    }
    let services = QuizServices::open(
        &parsed.db_url,
        Clock::default(),
        parsed.quiz_config(),
        Arc::new(play::TerminalPlayer),
    )
    .await;

    match cmd {
        Command::Play => {
            let seeded = services.ensure_seeded().await?;
            if seeded > 0 {
                println!("Added {seeded} starter words.");
            }
            if !services.is_durable() {
                println!("Storage unavailable: progress will not be saved this time.");
            }
            let mut rng = match parsed.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            play::run_quiz(&services, &mut rng).await
        }
        Command::Seed => {
            require_durable(&services, &parsed.db_url)?;
            let words = match &parsed.words {
                Some(path) => corpus::load_words(path)?,
                None => corpus::builtin_words()?,
            };
            let added = services.seed(&words).await?;
            println!("Seeded {added} words into {}.", parsed.db_url);
            Ok(())
        }
        Command::Stats => {
            require_durable(&services, &parsed.db_url)?;
            play::print_stats(&services).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // Binary glue: report once and exit.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
