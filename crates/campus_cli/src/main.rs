//! `campus` command-line entry point.
//!
//! # Responsibility
//! - Run student collection queries against a JSON collection file.
//! - Create or migrate a records database.
//! - Print results as JSON on stdout and errors on stderr.

use campus_core::db::migrations::current_user_version;
use campus_core::{
    init_logging, CoreConfig, IdPolicy, JsonFileStudentStore, PageRequest, Store, StudentService,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Academic records tools.
#[derive(Parser)]
#[command(name = "campus")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON config file; flags override its values
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(global = true, long)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(global = true, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query a student collection file
    Students(StudentsArgs),
    /// Manage a records database
    Db(DbArgs),
}

#[derive(Args)]
struct StudentsArgs {
    /// Collection file (JSON array of students)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Id assignment for appended students
    #[arg(long, value_enum, default_value_t = PolicyArg::HighWater)]
    id_policy: PolicyArg,

    #[command(subcommand)]
    command: StudentsCommand,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Length,
    HighWater,
}

impl From<PolicyArg> for IdPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Length => IdPolicy::CollectionLength,
            PolicyArg::HighWater => IdPolicy::HighWaterMark,
        }
    }
}

#[derive(Subcommand)]
enum StudentsCommand {
    /// Print every student
    List,
    /// Print one page with navigation links
    Page {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        limit: Option<String>,
    },
    /// Case-insensitive substring search on name
    Search {
        #[arg(long)]
        name: Option<String>,
    },
    /// Stable sort by grade
    Sort {
        /// asc|desc
        #[arg(long)]
        order: Option<String>,
    },
    /// Students taking a course
    Filter {
        #[arg(long)]
        course: Option<String>,
    },
    /// One student by id
    Get { id: i64 },
}

#[derive(Args)]
struct DbArgs {
    /// Records database file
    #[arg(short, long)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: DbCommand,
}

#[derive(Subcommand)]
enum DbCommand {
    /// Create or migrate the database and print its schema version
    Init,
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

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, dir)?;
    }

    match cli.command {
        Commands::Students(args) => run_students(&config, args),
        Commands::Db(args) => run_db(&config, args),
    }
}

fn run_students(config: &CoreConfig, args: StudentsArgs) -> Result<(), Box<dyn Error>> {
    let file = args.file.unwrap_or_else(|| config.students_file.clone());
    let store = JsonFileStudentStore::open(&file, args.id_policy.into())?;
    let service = StudentService::new(store);

    match args.command {
        StudentsCommand::List => print_json(&service.list_students()?),
        StudentsCommand::Page { page, limit } => {
            let request = PageRequest::from_params(page.as_deref(), limit.as_deref());
            print_json(&service.paginated(request)?)
        }
        StudentsCommand::Search { name } => print_json(&service.search_by_name(name.as_deref())?),
        StudentsCommand::Sort { order } => print_json(&service.sorted_by_grade(order.as_deref())?),
        StudentsCommand::Filter { course } => {
            print_json(&service.filtered_by_course(course.as_deref())?)
        }
        StudentsCommand::Get { id } => print_json(&service.get_student(id)?),
    }
}

fn run_db(config: &CoreConfig, args: DbArgs) -> Result<(), Box<dyn Error>> {
    let path = args.path.unwrap_or_else(|| config.db_path.clone());
    match args.command {
        DbCommand::Init => {
            let store = Store::open(&path, &config.store)?;
            let conn = store.acquire()?;
            let version = current_user_version(&conn)?;
            info!("event=db_init module=cli status=ok schema_version={version}");
            print_json(&serde_json::json!({
                "path": path.display().to_string(),
                "schemaVersion": version,
            }))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
