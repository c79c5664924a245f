use crate::address;
use crate::auth::{unencrypted_auth, Authenticator};
use crate::err::Result;
use crate::message::Message;
use log::{debug, warn};

/// A `Transport` delivers serialized messages to an SMTP server.
///
/// The transport owns the connection, the SMTP dialogue and any retries.
/// Errors it returns are passed back to the caller of `send` unchanged.
pub trait Transport {
    /// Deliver `message` to every address in `to`, with `from` as the
    /// envelope sender. `addr` is the server as `host:port`.
    fn send(
        &mut self,
        addr: &str,
        auth: Option<&mut dyn Authenticator>,
        from: &str,
        to: &[String],
        message: &[u8],
    ) -> Result<()>;
}

/// Send a message through the given transport.
///
/// The From field is parsed before anything is handed to the transport, so
/// a malformed sender fails without any network traffic.
pub fn send<T>(
    transport: &mut T,
    addr: &str,
    auth: Option<&mut dyn Authenticator>,
    message: &Message,
) -> Result<()>
where
    T: Transport + ?Sized,
{
    let from = address::parse(&message.from)?;
    let recipients = message.recipient_list();
    if message.boundary_collision() {
        warn!("Message content contains the multipart boundary");
    }
    let bytes = message.to_bytes();
    debug!(
        "Sending {} bytes from {} to {} recipients via {}",
        bytes.len(),
        from.address,
        recipients.len(),
        addr
    );
    transport.send(addr, auth, &from.address, &recipients, &bytes)
}

/// Send a message using PLAIN authentication without requiring TLS
pub fn send_unencrypted<T>(
    transport: &mut T,
    addr: &str,
    username: &str,
    password: &str,
    message: &Message,
) -> Result<()>
where
    T: Transport + ?Sized,
{
    let mut plain = unencrypted_auth(username, password);
    let auth: &mut dyn Authenticator = &mut plain;
    send(transport, addr, Some(auth), message)
}
