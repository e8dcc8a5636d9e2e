//! Command definitions
//!
//! Represents requests from clients: a command name plus positional arguments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Value;
use crate::error::RegistryError;

/// Commands understood by the registry server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetCarsList,
    GetCarDetails,
    GetLicenceStartingWith,
    ChangeMileage,
    ChangeOwner,
    NewRegistration,
    Shutdown,
}

impl Command {
    /// Every command, in table order
    pub const ALL: [Command; 7] = [
        Command::GetCarsList,
        Command::GetCarDetails,
        Command::GetLicenceStartingWith,
        Command::ChangeMileage,
        Command::ChangeOwner,
        Command::NewRegistration,
        Command::Shutdown,
    ];

    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::GetCarsList => "GET_CARS_LIST",
            Command::GetCarDetails => "GET_CAR_DETAILS",
            Command::GetLicenceStartingWith => "GET_LICENCE_STARTING_WITH",
            Command::ChangeMileage => "CHANGE_MILEAGE",
            Command::ChangeOwner => "CHANGE_OWNER",
            Command::NewRegistration => "NEW_REGISTRATION",
            Command::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| RegistryError::Protocol(format!("Unknown command: {}", s)))
    }
}

/// A request tuple `(command, arg1, arg2, ...)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Command name as sent on the wire
    pub command: String,

    /// Positional arguments
    pub args: Vec<Value>,
}

impl Request {
    /// Create a request from a raw command name
    pub fn new(command: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    fn of(command: Command, args: Vec<Value>) -> Self {
        Self::new(command.as_str(), args)
    }

    pub fn cars_list() -> Self {
        Self::of(Command::GetCarsList, Vec::new())
    }

    pub fn car_details(plate: &str) -> Self {
        Self::of(Command::GetCarDetails, vec![plate.into()])
    }

    pub fn licences_starting_with(prefix: &str) -> Self {
        Self::of(Command::GetLicenceStartingWith, vec![prefix.into()])
    }

    pub fn change_mileage(plate: &str, mileage: i64) -> Self {
        Self::of(Command::ChangeMileage, vec![plate.into(), mileage.into()])
    }

    pub fn change_owner(plate: &str, owner: &str) -> Self {
        Self::of(Command::ChangeOwner, vec![plate.into(), owner.into()])
    }

    pub fn new_registration(plate: &str, seats: i64, mileage: i64, owner: &str) -> Self {
        Self::of(
            Command::NewRegistration,
            vec![plate.into(), seats.into(), mileage.into(), owner.into()],
        )
    }

    pub fn shutdown() -> Self {
        Self::of(Command::Shutdown, Vec::new())
    }
}
