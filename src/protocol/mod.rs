//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format (V1)
//!
//! Every message, in both directions, is a fixed header followed by an
//! opaque payload:
//! ```text
//! ┌──────────────┬─────────────┬─────────────────────────────┐
//! │ Len (4, BE)  │ Version (1) │       Payload (Len bytes)   │
//! └──────────────┴─────────────┴─────────────────────────────┘
//! ```
//!
//! ### Payloads
//! - Request:  `(command name, [args...])`
//! - Response: `(success, [results...])`, on failure the single result is
//!   the error message
//!
//! Payloads are bincode-encoded and carry only [`Value`]s: text, integer,
//! boolean, null and lists of these.
//!
//! ### Commands
//! - GET_CARS_LIST
//! - GET_CAR_DETAILS            plate
//! - GET_LICENCE_STARTING_WITH  prefix
//! - CHANGE_MILEAGE             plate, mileage
//! - CHANGE_OWNER               plate, owner
//! - NEW_REGISTRATION           plate, seats, mileage, owner
//! - SHUTDOWN                   (no response)

mod command;
mod response;
mod value;
mod frame;
mod codec;

pub use command::{Command, Request};
pub use response::Response;
pub use value::Value;
pub use frame::{
    encode_frame, read_frame, read_header, read_payload, write_frame, FrameHeader, HEADER_SIZE,
    PROTOCOL_VERSION,
};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_response,
    write_request, write_response,
};
