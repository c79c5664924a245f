//! A library for composing email messages and handing them to an SMTP transport.
//!
//! The library builds the message in memory, serializes it as a MIME
//! document and supplies a SASL PLAIN authenticator. The user of the library
//! supplies a `Transport` that opens the connection and runs the SMTP
//! dialogue (the `mailout-smtp` crate provides one).
//!
//! # Examples
//! ```
//! use mailout::Message;
//!
//! let mut message = Message::new("Hi", "hello");
//! message.from = "Ship <ship@sea.com>".to_owned();
//! message.to.push("fish@sea.com".to_owned());
//! message.attach_bytes("notes.txt", "AB");
//!
//! let text = message.to_string();
//! assert!(text.starts_with("From: Ship <ship@sea.com>\nTo: fish@sea.com\n"));
//! assert!(text.contains("\nQUI=\n"));
//! ```

// Use write! for \n
#![allow(clippy::write_with_newline)]
#![forbid(unsafe_code)]
#![forbid(missing_docs)]

pub mod address;
mod auth;
mod err;
mod message;
pub mod mime;
mod send;

pub use crate::auth::{unencrypted_auth, Authenticator, PlainAuth, ServerInfo};
pub use crate::err::{Error, Result};
pub use crate::message::{Attachment, BodyType, Message};
pub use crate::send::{send, send_unencrypted, Transport};
