//! Dispatch Module
//!
//! Maps command names to handler functions over the [`Registry`].
//!
//! ## Responsibilities
//! - Hold the command table, built once in [`Dispatcher::new`]
//! - Validate argument count and types per command
//! - Turn domain errors into `(false, message)` responses
//! - Report `SHUTDOWN` as [`Outcome::Shutdown`] instead of a response

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{RegistryError, Result};
use crate::protocol::{Command, Request, Response, Value};
use crate::registry::Registry;

/// What the connection should do after a request was handled
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Write this response back to the peer
    Reply(Response),

    /// Close the connection without a response and stop the server
    Shutdown,
}

/// A command handler
pub type HandlerFn = fn(&Registry, &[Value]) -> Result<Outcome>;

/// Command table
///
/// The table is read-only after construction. Lookups take a short lock of
/// their own, independent of the registry lock, and handlers run after that
/// lock is released.
pub struct Dispatcher {
    handlers: Mutex<HashMap<&'static str, HandlerFn>>,
}

impl Dispatcher {
    /// Build the table for every known command
    pub fn new() -> Self {
        let handlers = Command::ALL
            .into_iter()
            .map(|command| (command.as_str(), handler_for(command)))
            .collect();
        Self {
            handlers: Mutex::new(handlers),
        }
    }

    fn lookup(&self, name: &str) -> Option<HandlerFn> {
        self.handlers.lock().get(name).copied()
    }

    /// Execute one request against the registry
    ///
    /// Never fails: every error becomes a failed response.
    pub fn dispatch(&self, registry: &Registry, request: &Request) -> Outcome {
        let Some(handler) = self.lookup(&request.command) else {
            tracing::warn!("Unknown command {:?}", request.command);
            return Outcome::Reply(Response::failure(format!(
                "Unknown command: {}",
                request.command
            )));
        };

        match handler(registry, &request.args) {
            Ok(outcome) => outcome,
            Err(e) => {
                if !e.is_domain() {
                    tracing::debug!("{} rejected: {}", request.command, e);
                }
                Outcome::Reply(Response::failure(e.to_string()))
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn handler_for(command: Command) -> HandlerFn {
    match command {
        Command::GetCarsList => get_cars_list,
        Command::GetCarDetails => get_car_details,
        Command::GetLicenceStartingWith => get_licence_starting_with,
        Command::ChangeMileage => change_mileage,
        Command::ChangeOwner => change_owner,
        Command::NewRegistration => new_registration,
        Command::Shutdown => shutdown,
    }
}

// =============================================================================
// Handlers
// =============================================================================

// Extra arguments are ignored.
fn get_cars_list(registry: &Registry, _args: &[Value]) -> Result<Outcome> {
    let plates = registry.list()?;
    Ok(Outcome::Reply(Response::ok(vec![plates.into()])))
}

fn get_car_details(registry: &Registry, args: &[Value]) -> Result<Outcome> {
    let command = Command::GetCarDetails;
    expect_arity(command, args, 1)?;
    let car = registry.get(text_arg(command, args, 0)?)?;

    Ok(Outcome::Reply(Response::ok(vec![
        car.seats().into(),
        car.mileage().into(),
        car.owner().into(),
    ])))
}

fn get_licence_starting_with(registry: &Registry, args: &[Value]) -> Result<Outcome> {
    let command = Command::GetLicenceStartingWith;
    expect_arity(command, args, 1)?;
    let plates = registry.prefix_search(text_arg(command, args, 0)?);
    Ok(Outcome::Reply(Response::ok(vec![plates.into()])))
}

fn change_mileage(registry: &Registry, args: &[Value]) -> Result<Outcome> {
    let command = Command::ChangeMileage;
    expect_arity(command, args, 2)?;
    registry.update_mileage(text_arg(command, args, 0)?, int_arg(command, args, 1)?)?;
    Ok(Outcome::Reply(Response::done()))
}

fn change_owner(registry: &Registry, args: &[Value]) -> Result<Outcome> {
    let command = Command::ChangeOwner;
    expect_arity(command, args, 2)?;
    registry.update_owner(text_arg(command, args, 0)?, text_arg(command, args, 1)?)?;
    Ok(Outcome::Reply(Response::done()))
}

fn new_registration(registry: &Registry, args: &[Value]) -> Result<Outcome> {
    let command = Command::NewRegistration;
    expect_arity(command, args, 4)?;
    registry.register(
        text_arg(command, args, 0)?,
        int_arg(command, args, 1)?,
        int_arg(command, args, 2)?,
        text_arg(command, args, 3)?,
    )?;
    Ok(Outcome::Reply(Response::done()))
}

fn shutdown(_registry: &Registry, _args: &[Value]) -> Result<Outcome> {
    tracing::info!("Shutdown requested");
    Ok(Outcome::Shutdown)
}

// =============================================================================
// Argument helpers
// =============================================================================

fn expect_arity(command: Command, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(RegistryError::Protocol(format!(
            "{} expects {} argument(s), got {}",
            command,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn text_arg(command: Command, args: &[Value], index: usize) -> Result<&str> {
    args[index].as_text().ok_or_else(|| {
        RegistryError::Protocol(format!(
            "{} argument {} must be text, got {}",
            command,
            index + 1,
            args[index].type_name()
        ))
    })
}

fn int_arg(command: Command, args: &[Value], index: usize) -> Result<i64> {
    args[index].as_int().ok_or_else(|| {
        RegistryError::Protocol(format!(
            "{} argument {} must be an integer, got {}",
            command,
            index + 1,
            args[index].type_name()
        ))
    })
}
