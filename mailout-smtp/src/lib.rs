//! An SMTP transport for mailout
//!
//! `SmtpTransport` opens a plain TCP connection for each message, runs the
//! SMTP dialogue using the lettre client and authenticates with whatever
//! `Authenticator` the caller supplies.
//! # Examples
//! ```no_run
//! use mailout::{send_unencrypted, Message};
//! use mailout_smtp::SmtpTransport;
//!
//! let mut message = Message::new("Hi", "hello");
//! message.from = "ship@sea.com".to_owned();
//! message.to.push("fish@sea.com".to_owned());
//!
//! let mut transport = SmtpTransport::new();
//! transport.with_hello_name("ship.sea.com".to_owned());
//! send_unencrypted(&mut transport, "127.0.0.1:25", "ship", "anchor", &message).unwrap();
//! ```

#![forbid(unsafe_code)]

mod session;

use crate::session::Session;
use lettre::transport::smtp::extension::ClientId;
use log::{error, info};
pub use mailout::{Authenticator, Transport};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// `SmtpTransport` delivers messages to an SMTP server
pub struct SmtpTransport {
    hello_name: ClientId,
    timeout: Option<Duration>,
}

impl SmtpTransport {
    /// Create a transport that greets servers with the local hostname
    pub fn new() -> Self {
        Self {
            hello_name: ClientId::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Set the name sent in the EHLO command
    pub fn with_hello_name(&mut self, name: String) -> &mut Self {
        self.hello_name = ClientId::Domain(name);
        self
    }

    /// Set the timeout for connecting and for each server reply.
    /// `None` waits forever.
    pub fn with_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SmtpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SmtpTransport {
    fn send(
        &mut self,
        addr: &str,
        auth: Option<&mut dyn Authenticator>,
        from: &str,
        to: &[String],
        message: &[u8],
    ) -> mailout::Result<()> {
        let mut session = Session::connect(addr, &self.hello_name, self.timeout)?;
        let res = match auth {
            Some(auth) => session.authenticate(auth),
            None => Ok(()),
        }
        .and_then(|_| session.send(from, to, message));
        match res {
            Ok(()) => {
                info!("Sent {} bytes to {} recipients via {}", message.len(), to.len(), addr);
                session.quit()
            }
            Err(err) => {
                error!("Sending via {} failed: {}", addr, err);
                session.abort();
                Err(err)
            }
        }
    }
}
