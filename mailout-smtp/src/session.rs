use lettre::address::{Address, Envelope};
use lettre::transport::smtp::authentication::Mechanism;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::Response;
use log::{debug, trace};
use mailout::{Authenticator, Error, Result, ServerInfo};
use std::time::Duration;

// Mechanisms that lettre recognises in an EHLO reply
const MECHANISMS: [Mechanism; 3] = [Mechanism::Plain, Mechanism::Login, Mechanism::Xoauth2];

/// A single client connection to an SMTP server
pub(crate) struct Session {
    conn: SmtpConnection,
}

impl Session {
    // Connect, read the greeting and send EHLO
    pub(crate) fn connect(addr: &str, hello: &ClientId, timeout: Option<Duration>) -> Result<Self> {
        debug!("Connecting to {}", addr);
        let conn = SmtpConnection::connect(addr, timeout, hello, None, None)
            .map_err(Error::transport)?;
        Ok(Self { conn })
    }

    // What the EHLO reply told us about the server
    pub(crate) fn server_info(&self) -> ServerInfo {
        let info = self.conn.server_info();
        let auth = MECHANISMS
            .iter()
            .filter(|m| info.supports_auth_mechanism(**m))
            .map(|m| m.to_string())
            .collect();
        ServerInfo {
            name: info.name().to_owned(),
            tls: self.conn.is_encrypted(),
            auth,
        }
    }

    // Run the AUTH dialogue, letting the authenticator answer each challenge
    pub(crate) fn authenticate(&mut self, auth: &mut dyn Authenticator) -> Result<()> {
        let server = self.server_info();
        if server.auth.is_empty() {
            return Err(Error::transport(format!(
                "{} does not support AUTH",
                server.name
            )));
        }
        let (mechanism, initial) = auth.start(&server)?;
        let cmd = if initial.is_empty() {
            format!("AUTH {}\r\n", mechanism)
        } else {
            format!("AUTH {} {}\r\n", mechanism, base64::encode(&initial))
        };
        trace!("> AUTH {} ****", mechanism);
        let mut response = self.command(cmd)?;
        while response.has_code(334) {
            let challenge = decode_challenge(&response)?;
            match auth.next(&challenge, true) {
                Ok(reply) => {
                    let reply = reply.unwrap_or_default();
                    trace!("> ****");
                    response = self.command(format!("{}\r\n", base64::encode(&reply)))?;
                }
                Err(err) => {
                    // Cancel the exchange, the server reply is of no interest
                    let _ = self.conn.command("*\r\n");
                    return Err(err);
                }
            }
        }
        let text = response.first_line().unwrap_or_default();
        auth.next(text.as_bytes(), false)?;
        debug!("Authenticated with {} using {}", server.name, mechanism);
        Ok(())
    }

    // MAIL, RCPT and DATA
    pub(crate) fn send(&mut self, from: &str, to: &[String], message: &[u8]) -> Result<()> {
        let envelope = envelope(from, to)?;
        // lettre dot-stuffs lines that follow a CRLF
        let data = to_crlf(message);
        let response = self
            .conn
            .send(&envelope, &data)
            .map_err(Error::transport)?;
        trace!("< {}", response.first_line().unwrap_or_default());
        Ok(())
    }

    pub(crate) fn quit(mut self) -> Result<()> {
        self.conn.quit().map(|_| ()).map_err(Error::transport)
    }

    // Close the connection after an error
    pub(crate) fn abort(mut self) {
        self.conn.abort();
    }

    fn command(&mut self, cmd: String) -> Result<Response> {
        let response = self.conn.command(cmd).map_err(Error::transport)?;
        trace!("< {}", response.first_line().unwrap_or_default());
        Ok(response)
    }
}

// SMTP DATA lines must end in CRLF, bare LF is rejected by many servers
fn to_crlf(message: &[u8]) -> Vec<u8> {
    let lone = message
        .iter()
        .enumerate()
        .filter(|&(i, b)| *b == b'\n' && (i == 0 || message[i - 1] != b'\r'))
        .count();
    let mut data = Vec::with_capacity(message.len() + lone);
    let mut prev = 0u8;
    for &b in message {
        if b == b'\n' && prev != b'\r' {
            data.push(b'\r');
        }
        data.push(b);
        prev = b;
    }
    data
}

fn decode_challenge(response: &Response) -> Result<Vec<u8>> {
    let encoded = response.first_word().unwrap_or_default();
    base64::decode(encoded.trim()).map_err(Error::transport)
}

fn envelope(from: &str, to: &[String]) -> Result<Envelope> {
    let from = from.parse::<Address>().map_err(Error::transport)?;
    let to = to
        .iter()
        .map(|t| t.parse::<Address>().map_err(Error::transport))
        .collect::<Result<Vec<_>>>()?;
    Envelope::new(Some(from), to).map_err(Error::transport)
}
