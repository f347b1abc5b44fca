use std::fmt;

use services::{AppServices, Clock, DailyConfig};
use svenska_core::model::{Catalog, CategoryId, DifficultyBand, UserId};
use svenska_core::rewards::PracticeMode;
use uuid::Uuid;

mod play;
mod telemetry;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Learner used when neither `--user` nor `SVENSKA_USER_ID` is given.
const DEFAULT_USER: Uuid = Uuid::from_u128(1);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidCategory { raw: String },
    InvalidDifficulty { raw: String },
    InvalidMode { raw: String },
    InvalidRounds { raw: String },
    MissingTarget { command: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid category: {raw}"),
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid difficulty: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidRounds { raw } => write!(f, "invalid --rounds value: {raw}"),
            ArgsError::MissingTarget { command } => write!(f, "{command} requires an argument"),
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
    eprintln!("  cargo run -p app -- today      [options]   # work through today's program");
    eprintln!("  cargo run -p app -- practice   [options] [--mode <mode>] [--category <id>] [--rounds <n>]");
    eprintln!("  cargo run -p app -- stats      [options]");
    eprintln!("  cargo run -p app -- difficulty <easy|easy-medium|medium|hard|any> [options]");
    eprintln!("  cargo run -p app -- toggle     <category> [options]");
    eprintln!("  cargo run -p app -- reset      [options]   # throw away today's program");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     default sqlite:svenska.sqlite3");
    eprintln!("  --user <uuid>         learner id");
    eprintln!("  --catalog <path>      catalog JSON (defaults to the builtin catalog)");
    eprintln!();
    eprintln!("Practice modes: practice, writing, flashcard, grammar");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SVENSKA_DB_URL, SVENSKA_USER_ID, SVENSKA_CATALOG, SVENSKA_LOG, SVENSKA_LOG_FORMAT");
    eprintln!("  SVENSKA_KEY_PREFIX, SVENSKA_WRITE_TIMEOUT_MS, SVENSKA_SIGNAL_MS");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Today,
    Practice {
        mode: PracticeMode,
        category: Option<CategoryId>,
        rounds: usize,
    },
    Stats,
    Difficulty(Option<DifficultyBand>),
    Toggle(CategoryId),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandName {
    Today,
    Practice,
    Stats,
    Difficulty,
    Toggle,
    Reset,
}

impl CommandName {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "today" => Some(Self::Today),
            "practice" => Some(Self::Practice),
            "stats" => Some(Self::Stats),
            "difficulty" => Some(Self::Difficulty),
            "toggle" => Some(Self::Toggle),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Practice => "practice",
            Self::Stats => "stats",
            Self::Difficulty => "difficulty",
            Self::Toggle => "toggle",
            Self::Reset => "reset",
        }
    }
}

struct Args {
    db_url: String,
    user_id: UserId,
    catalog_path: Option<String>,
    command: Command,
}

impl Args {
    fn parse(
        name: CommandName,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("SVENSKA_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://svenska.sqlite3".into(), normalize_sqlite_url);
        let mut user_id = match std::env::var("SVENSKA_USER_ID") {
            Ok(raw) => parse_user(raw)?,
            Err(_) => UserId::new(DEFAULT_USER),
        };
        let mut catalog_path = std::env::var("SVENSKA_CATALOG").ok();
        let mut mode = PracticeMode::Writing;
        let mut category = None;
        let mut rounds = 5_usize;
        let mut target = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user_id = parse_user(require_value(args, "--user")?)?,
                "--catalog" => catalog_path = Some(require_value(args, "--catalog")?),
                "--mode" if name == CommandName::Practice => {
                    mode = parse_mode(require_value(args, "--mode")?)?;
                }
                "--category" if name == CommandName::Practice => {
                    category = Some(parse_category(require_value(args, "--category")?)?);
                }
                "--rounds" if name == CommandName::Practice => {
                    let value = require_value(args, "--rounds")?;
                    rounds = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidRounds { raw: value })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                positional
                    if !positional.starts_with("--")
                        && target.is_none()
                        && matches!(name, CommandName::Difficulty | CommandName::Toggle) =>
                {
                    target = Some(arg);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match name {
            CommandName::Today => Command::Today,
            CommandName::Practice => Command::Practice {
                mode,
                category,
                rounds,
            },
            CommandName::Stats => Command::Stats,
            CommandName::Reset => Command::Reset,
            CommandName::Difficulty => {
                let raw = target.ok_or(ArgsError::MissingTarget {
                    command: name.as_str(),
                })?;
                Command::Difficulty(parse_difficulty(raw)?)
            }
            CommandName::Toggle => {
                let raw = target.ok_or(ArgsError::MissingTarget {
                    command: name.as_str(),
                })?;
                Command::Toggle(parse_category(raw)?)
            }
        };

        Ok(Self {
            db_url,
            user_id,
            catalog_path,
            command,
        })
    }
}

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidUserId { raw })
}

fn parse_category(raw: String) -> Result<CategoryId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidCategory { raw })
}

fn parse_difficulty(raw: String) -> Result<Option<DifficultyBand>, ArgsError> {
    match raw.as_str() {
        "any" | "all" => Ok(None),
        other => other
            .parse()
            .map(Some)
            .map_err(|_| ArgsError::InvalidDifficulty { raw }),
    }
}

fn parse_mode(raw: String) -> Result<PracticeMode, ArgsError> {
    match raw.as_str() {
        "practice" => Ok(PracticeMode::Practice),
        "writing" => Ok(PracticeMode::Writing),
        "flashcard" => Ok(PracticeMode::Flashcard),
        "grammar" => Ok(PracticeMode::Grammar),
        _ => Err(ArgsError::InvalidMode { raw }),
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

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

fn load_catalog(path: Option<&str>) -> Result<Catalog, Box<dyn std::error::Error>> {
    let catalog = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Catalog::from_json(&raw)?
        }
        None => Catalog::from_json(BUILTIN_CATALOG)?,
    };
    tracing::debug!(
        categories = catalog.categories().len(),
        phrases = catalog.phrase_count(),
        grammar = catalog.grammar().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: today's program when no subcommand is provided.
    let name = match argv.first().map(String::as_str) {
        None => CommandName::Today,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => CommandName::Today,
        Some(first) => CommandName::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(name, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = load_catalog(parsed.catalog_path.as_deref())?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::default_clock(),
        catalog,
        DailyConfig::from_env(),
    )
    .await?;

    match parsed.command {
        Command::Today => play::today(&services, parsed.user_id).await,
        Command::Practice {
            mode,
            category,
            rounds,
        } => play::practice(&services, parsed.user_id, mode, category.as_ref(), rounds).await,
        Command::Stats => play::stats(&services, parsed.user_id).await,
        Command::Difficulty(preference) => {
            play::set_difficulty(&services, parsed.user_id, preference).await
        }
        Command::Toggle(category) => play::toggle(&services, parsed.user_id, &category).await,
        Command::Reset => play::reset(&services, parsed.user_id).await,
    }
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
