//! carreg CLI Client
//!
//! Command-line interface for interacting with a carreg server.

use std::process::ExitCode;
use std::time::Duration;

use carreg::{Client, RegistryError};
use clap::{Parser, Subcommand};

/// carreg CLI
#[derive(Parser, Debug)]
#[command(name = "carreg-cli")]
#[command(about = "CLI for the car registration server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9653")]
    server: String,

    /// Give up on the server after this many milliseconds
    #[arg(short, long, default_value = "10000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every registered plate
    List,

    /// Show seats, mileage and owner of a car
    Show {
        /// Licence plate
        plate: String,
    },

    /// List plates starting with a prefix
    Search {
        /// Start of the licence plate
        prefix: String,
    },

    /// Record a new odometer reading
    Mileage {
        /// Licence plate
        plate: String,

        /// New mileage (must exceed the current one)
        #[arg(allow_negative_numbers = true)]
        mileage: i64,
    },

    /// Transfer a car to a new owner
    Owner {
        /// Licence plate
        plate: String,

        /// New owner
        owner: String,
    },

    /// Register a new car
    Register {
        /// Licence plate
        plate: String,

        /// Number of seats (2, 4-9)
        seats: i64,

        /// Current mileage
        #[arg(allow_negative_numbers = true)]
        mileage: i64,

        /// Owner
        owner: String,
    },

    /// Stop the server (it saves its registry first)
    Shutdown,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let client = Client::new(&args.server).with_timeout(Duration::from_millis(args.timeout_ms));

    match run(&client, args.command) {
        Ok(code) => code,
        Err(RegistryError::Rejected(message)) => {
            println!("{}", message);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(client: &Client, command: Commands) -> carreg::Result<ExitCode> {
    match command {
        Commands::List => {
            for plate in client.cars_list()? {
                println!("{}", plate);
            }
        }
        Commands::Show { plate } => match client.car_details(&plate) {
            Ok(car) => {
                println!("Licence: {}", plate.to_uppercase());
                println!("Seats: {}", car.seats());
                println!("Mileage: {}", car.mileage());
                println!("Owner: {}", car.owner());
            }
            Err(RegistryError::Rejected(message)) => {
                println!("{}", message);
                suggest(client, &plate)?;
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e),
        },
        Commands::Search { prefix } => {
            let plates = client.licences_starting_with(&prefix)?;
            if plates.is_empty() {
                println!("No licence starts with {}", prefix.to_uppercase());
            }
            for (i, plate) in plates.iter().enumerate() {
                println!("({}) {}", i + 1, plate);
            }
        }
        Commands::Mileage { plate, mileage } => {
            client.change_mileage(&plate, mileage)?;
            println!("Mileage successfully changed");
        }
        Commands::Owner { plate, owner } => {
            client.change_owner(&plate, &owner)?;
            println!("Owner successfully changed");
        }
        Commands::Register {
            plate,
            seats,
            mileage,
            owner,
        } => {
            client.new_registration(&plate, seats, mileage, &owner)?;
            println!("Car {} successfully registered", plate.to_uppercase());
        }
        Commands::Shutdown => {
            client.shutdown()?;
            println!("Shutdown requested");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Offer plates sharing the first character of an unknown plate
fn suggest(client: &Client, plate: &str) -> carreg::Result<()> {
    let Some(first) = plate.chars().next() else {
        return Ok(());
    };
    let candidates = client.licences_starting_with(&first.to_string())?;
    if !candidates.is_empty() {
        println!("Registered licences starting with {}:", first.to_uppercase());
        for candidate in candidates {
            println!("  {}", candidate);
        }
    }
    Ok(())
}
