//! Command-line front-end for the garage stores.
//!
//! Stands in for the request layer: every subcommand goes through
//! `RecordService`, so validation, locking and not-found handling match what a
//! web handler would see.
//!
//! Exit codes: 0 = success, 1 = rejected input or missing record,
//! 2 = configuration error, 3 = storage error.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::error;

use garage_core::db::open_db;
use garage_core::{
    flush_logging, init_logging, Car, CarPatch, GarageConfig, JsonFileUserStore, RecordService,
    ServiceError, SqliteCarRepository, User, UserPatch,
};

/// Garage record store tools.
#[derive(Parser)]
#[command(name = "garage", version, about = "Manage garage cars and users")]
struct Cli {
    /// Directory holding the database, the users file and logs.
    #[arg(long, env = "GARAGE_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, env = "GARAGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Id allocation policy for new users: max or last.
    #[arg(long, env = "GARAGE_ID_POLICY")]
    id_policy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cars stored in the SQLite database.
    #[command(subcommand)]
    Cars(CarCommand),
    /// Users stored in the JSON document file.
    #[command(subcommand)]
    Users(UserCommand),
}

#[derive(Subcommand)]
enum CarCommand {
    List,
    Show { id: i64 },
    Add { make: String, model: String },
    Edit {
        id: i64,
        #[arg(long)]
        make: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum UserCommand {
    List,
    Show { id: i64 },
    Add(NewUserArgs),
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        city: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Args)]
struct NewUserArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    password: String,
    /// Defaults to `--password`.
    #[arg(long)]
    password_confirmation: Option<String>,
    #[arg(long, default_value = "")]
    city: String,
}

fn main() {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("Error: {msg}");
            process::exit(2);
        }
    };

    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("Error: {err}");
        process::exit(2);
    }

    let exit_code = match cli.command {
        Commands::Cars(command) => run_cars(&config, command),
        Commands::Users(command) => run_users(&config, command),
    };
    flush_logging();
    process::exit(exit_code);
}

fn build_config(cli: &Cli) -> Result<GarageConfig, String> {
    let data_dir = absolute(&cli.data_dir).map_err(|err| err.to_string())?;
    let mut config = GarageConfig::from_data_dir(data_dir).map_err(|err| err.to_string())?;
    if let Some(level) = cli.log_level.as_deref() {
        config = config.with_log_level(level).map_err(|err| err.to_string())?;
    }
    if let Some(policy) = cli.id_policy.as_deref() {
        config = config.with_id_policy(policy).map_err(|err| err.to_string())?;
    }
    Ok(config)
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn run_cars(config: &GarageConfig, command: CarCommand) -> i32 {
    let conn = match open_db(&config.database_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!(
                "Error: failed to open database '{}': {err}",
                config.database_path.display()
            );
            return 3;
        }
    };
    let service = RecordService::new(SqliteCarRepository::new(&conn), "car");

    let outcome = match command {
        CarCommand::List => service.list().map(|cars| cars.iter().for_each(print_car)),
        CarCommand::Show { id } => service.show(id).map(|car| print_car(&car)),
        CarCommand::Add { make, model } => service
            .submit(Car::new(make, model))
            .map(|car| print_car(&car)),
        CarCommand::Edit { id, make, model } => service
            .edit(id, &CarPatch { make, model })
            .map(|car| print_car(&car)),
        CarCommand::Delete { id } => service.remove(id).map(|removed| print_removed(id, removed)),
    };
    report(outcome)
}

fn run_users(config: &GarageConfig, command: UserCommand) -> i32 {
    let store = match JsonFileUserStore::open(&config.users_path, config.id_policy) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Error: {err}");
            return 3;
        }
    };
    let service = RecordService::new(store, "user");

    let outcome = match command {
        UserCommand::List => service
            .list()
            .map(|users| users.iter().for_each(print_user)),
        UserCommand::Show { id } => service.show(id).map(|user| print_user(&user)),
        UserCommand::Add(args) => {
            let mut user = User::new(args.name, args.email, args.password, args.city);
            if let Some(confirmation) = args.password_confirmation {
                user.password_confirmation = confirmation;
            }
            service.submit(user).map(|user| print_user(&user))
        }
        UserCommand::Edit {
            id,
            name,
            email,
            city,
        } => service
            .edit(id, &UserPatch { name, email, city })
            .map(|user| print_user(&user)),
        UserCommand::Delete { id } => service.remove(id).map(|removed| print_removed(id, removed)),
    };
    report(outcome)
}

fn report(outcome: Result<(), ServiceError>) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(ServiceError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
            1
        }
        Err(ServiceError::NotFound(id)) => {
            eprintln!("Error: record {id} not found");
            1
        }
        Err(ServiceError::Store(err)) => {
            error!("event=cli_command module=cli status=error error={}", err);
            eprintln!("Error: {err}");
            3
        }
    }
}

fn print_car(car: &Car) {
    println!(
        "{}\t{}\t{}",
        car.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
        car.make,
        car.model
    );
}

fn print_user(user: &User) {
    println!(
        "{}\t{}\t{}\t{}",
        user.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
        user.name,
        user.email,
        user.city
    );
}

fn print_removed(id: i64, removed: bool) {
    if removed {
        println!("deleted {id}");
    } else {
        println!("nothing to delete for {id}");
    }
}
