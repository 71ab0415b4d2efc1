//! AT wire protocol
//!
//! Recognizes the tokens a modem sends (control words, structured `+TAG:`
//! replies, unsolicited notifications, free text) and decodes them into
//! [`Response`] values.

pub mod cursor;
pub mod hex;
pub mod parser;
pub mod payload;
pub mod registry;
pub mod response;
mod tag;

pub use parser::{parse, ParseOutcome};
pub use response::Response;
pub use tag::Tag;
