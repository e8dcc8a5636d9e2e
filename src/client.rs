//! Registry client
//!
//! Opens one connection per request, as the server expects, and turns
//! response tuples back into typed values.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::{RegistryError, Result};
use crate::protocol::{read_response, write_request, Request, Response, Value};
use crate::registry::{normalize_plate, CarRecord};

/// Blocking client for the registry server
#[derive(Debug, Clone)]
pub struct Client {
    addr: String,
    timeout: Option<Duration>,
}

impl Client {
    /// Create a client for `addr` (host:port)
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: None,
        }
    }

    /// Bound every read and write by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn connect(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect(&self.addr).map_err(|e| {
            RegistryError::Network(format!("{}: {}: is the server running?", self.addr, e))
        })?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        Ok(stream)
    }

    /// Send one request and wait for its response
    pub fn request(&self, request: &Request) -> Result<Response> {
        let stream = self.connect()?;
        let mut writer = BufWriter::new(stream.try_clone()?);
        let mut reader = BufReader::new(stream);

        write_request(&mut writer, request)?;
        read_response(&mut reader)
    }

    /// Send one request without waiting for a response
    pub fn send_only(&self, request: &Request) -> Result<()> {
        let mut stream = self.connect()?;
        write_request(&mut stream, request)
    }

    // =========================================================================
    // Typed commands
    // =========================================================================

    /// All registered plates, sorted
    pub fn cars_list(&self) -> Result<Vec<String>> {
        let results = accepted(self.request(&Request::cars_list())?)?;
        plates(&results)
    }

    /// Details of the car registered under `plate`
    pub fn car_details(&self, plate: &str) -> Result<CarRecord> {
        let request = Request::car_details(&normalize_plate(plate));
        let results = accepted(self.request(&request)?)?;

        match results.as_slice() {
            [Value::Int(seats), Value::Int(mileage), Value::Text(owner)] => {
                let seats = u8::try_from(*seats).map_err(|_| malformed("seats out of range"))?;
                let mileage =
                    u64::try_from(*mileage).map_err(|_| malformed("mileage out of range"))?;
                Ok(CarRecord::new(seats, mileage, owner.clone()))
            }
            _ => Err(malformed("expected (seats, mileage, owner)")),
        }
    }

    /// Plates starting with `prefix`, sorted
    pub fn licences_starting_with(&self, prefix: &str) -> Result<Vec<String>> {
        let request = Request::licences_starting_with(&normalize_plate(prefix));
        let results = accepted(self.request(&request)?)?;
        plates(&results)
    }

    pub fn change_mileage(&self, plate: &str, mileage: i64) -> Result<()> {
        let request = Request::change_mileage(&normalize_plate(plate), mileage);
        accepted(self.request(&request)?).map(drop)
    }

    pub fn change_owner(&self, plate: &str, owner: &str) -> Result<()> {
        let request = Request::change_owner(&normalize_plate(plate), owner);
        accepted(self.request(&request)?).map(drop)
    }

    pub fn new_registration(&self, plate: &str, seats: i64, mileage: i64, owner: &str) -> Result<()> {
        let request = Request::new_registration(&normalize_plate(plate), seats, mileage, owner);
        accepted(self.request(&request)?).map(drop)
    }

    /// Ask the server to persist its registry and stop
    pub fn shutdown(&self) -> Result<()> {
        self.send_only(&Request::shutdown())
    }
}

fn malformed(reason: &str) -> RegistryError {
    RegistryError::MalformedPayload(format!("unexpected response shape: {}", reason))
}

/// Results of a successful response, or its error message as `Rejected`
fn accepted(response: Response) -> Result<Vec<Value>> {
    if response.success {
        return Ok(response.results);
    }
    let message = response
        .error_message()
        .unwrap_or("request failed")
        .to_string();
    Err(RegistryError::Rejected(message))
}

fn plates(results: &[Value]) -> Result<Vec<String>> {
    let items = results
        .first()
        .and_then(Value::as_list)
        .ok_or_else(|| malformed("expected a list of plates"))?;

    items
        .iter()
        .map(|item| {
            item.as_text()
                .map(str::to_string)
                .ok_or_else(|| malformed("plate is not text"))
        })
        .collect()
}
