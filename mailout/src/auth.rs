use crate::err::{Error, Result};
use log::debug;
use std::fmt;

/// Information about the SMTP server the transport is talking to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// Name the server announced in its greeting
    pub name: String,
    /// True if the connection is protected by TLS
    pub tls: bool,
    /// Authentication mechanisms advertised by the server
    pub auth: Vec<String>,
}

/// An `Authenticator` runs the client side of a SASL exchange.
///
/// The transport calls `start` once the server is known and sends the
/// returned mechanism and initial response. Each further server challenge is
/// passed to `next` with `more` set; when the server accepts, `next` is called
/// once more with `more` cleared.
pub trait Authenticator {
    /// Begin authentication, returning the mechanism name and the initial response
    fn start(&mut self, server: &ServerInfo) -> Result<(String, Vec<u8>)>;

    /// Answer a server challenge
    fn next(&mut self, challenge: &[u8], more: bool) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Done,
}

/// The SASL PLAIN mechanism (RFC 4616).
///
/// Unlike most PLAIN clients this does not insist on a TLS connection, so
/// credentials are sent in the clear when the transport is not encrypted.
pub struct PlainAuth {
    username: String,
    password: String,
    state: State,
}

/// Create a PLAIN authenticator that works over unencrypted connections
pub fn unencrypted_auth<U, P>(username: U, password: P) -> PlainAuth
where
    U: Into<String>,
    P: Into<String>,
{
    PlainAuth {
        username: username.into(),
        password: password.into(),
        state: State::Start,
    }
}

impl PlainAuth {
    /// True once the initial response has been produced
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }
}

impl Authenticator for PlainAuth {
    fn start(&mut self, server: &ServerInfo) -> Result<(String, Vec<u8>)> {
        debug!("PLAIN authentication with {} (tls={})", server.name, server.tls);
        let mut response = Vec::with_capacity(self.username.len() + self.password.len() + 2);
        response.push(0u8);
        response.extend_from_slice(self.username.as_bytes());
        response.push(0u8);
        response.extend_from_slice(self.password.as_bytes());
        self.state = State::Done;
        Ok(("PLAIN".to_owned(), response))
    }

    fn next(&mut self, _challenge: &[u8], more: bool) -> Result<Option<Vec<u8>>> {
        if more {
            // Everything was sent in the initial response
            return Err(Error::Protocol("unexpected server challenge"));
        }
        Ok(None)
    }
}

impl fmt::Debug for PlainAuth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PlainAuth")
            .field("username", &self.username)
            .field("password", &"********")
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    fn server() -> ServerInfo {
        ServerInfo {
            name: "mx.sea.com".to_owned(),
            tls: false,
            auth: vec!["PLAIN".to_owned()],
        }
    }

    #[test]
    fn initial_response() {
        let mut auth = unencrypted_auth("test", "1234");
        assert!(!auth.is_done());
        let (mechanism, response) = auth.start(&server()).unwrap();
        assert_eq!(mechanism, "PLAIN");
        assert_eq!(response, b"\0test\x001234".to_vec());
        assert!(auth.is_done());
    }

    #[test]
    fn matches_server_decoding() {
        // Same credentials as an AUTH PLAIN line a server would receive
        let mut auth = unencrypted_auth("test", "1234");
        let (_, response) = auth.start(&server()).unwrap();
        assert_eq!(base64::encode(&response), "AHRlc3QAMTIzNA==");
    }

    #[test]
    fn no_more_data() {
        let mut auth = unencrypted_auth("test", "1234");
        auth.start(&server()).unwrap();
        assert_matches!(auth.next(b"", false), Ok(None));
        assert_matches!(auth.next(b"anything", false), Ok(None));
    }

    #[test]
    fn unexpected_challenge() {
        let mut auth = unencrypted_auth("test", "1234");
        auth.start(&server()).unwrap();
        let challenges: [&[u8]; 4] = [b"", b"334 ", b"\0\0", b"VXNlcm5hbWU6"];
        for challenge in &challenges {
            assert_matches!(
                auth.next(challenge, true),
                Err(Error::Protocol("unexpected server challenge"))
            );
        }
    }

    #[test]
    fn password_hidden() {
        let auth = unencrypted_auth("test", "secret");
        let text = format!("{:?}", auth);
        assert!(text.contains("test"));
        assert!(!text.contains("secret"));
    }
}
