use std::io;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while building or sending a message
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An attachment file could not be read
    #[error("{0} - cannot read attachment")]
    Io(String, #[source] io::Error),
    /// The sender address is not a valid RFC 5322 mailbox
    #[error("{0} - bad address")]
    AddressFormat(String),
    /// The server sent something the authenticator did not expect
    #[error("{0}")]
    Protocol(&'static str),
    /// The mail transport failed
    #[error("transport failure - {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an error raised by a mail transport
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(error.into())
    }
}
