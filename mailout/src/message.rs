use crate::err::{Error, Result};
use crate::mime::{self, BOUNDARY};
use log::debug;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// A file bundled into a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    filename: String,
    data: Vec<u8>,
    inline: bool,
}

impl Attachment {
    /// The name shown in the Content-Disposition header
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The raw, unencoded content
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True if the attachment is embedded as an inline `message/rfc822` part
    pub fn is_inline(&self) -> bool {
        self.inline
    }
}

/// The MIME type of a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// text/plain
    Plain,
    /// text/html
    Html,
}

impl BodyType {
    /// The MIME type as written in the Content-Type header
    pub fn mime_type(self) -> &'static str {
        match self {
            BodyType::Plain => "text/plain",
            BodyType::Html => "text/html",
        }
    }
}

/// An outbound email message under construction.
///
/// Envelope and header fields are public and can be assigned directly.
/// Nothing is validated until the message is sent.
///
/// # Examples
/// ```
/// use mailout::Message;
///
/// let mut message = Message::new("Hi", "hello");
/// message.from = "ship@sea.com".to_owned();
/// message.to.push("fish@sea.com".to_owned());
/// message.bcc.push("whale@sea.com".to_owned());
///
/// assert_eq!(message.recipient_list(), vec!["fish@sea.com", "whale@sea.com"]);
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    /// The sender mailbox
    pub from: String,
    /// Recipients shown in the To header
    pub to: Vec<String>,
    /// Recipients shown in the Cc header
    pub cc: Vec<String>,
    /// Blind copy recipients, never written to the headers
    pub bcc: Vec<String>,
    /// The subject header
    pub subject: String,
    body: String,
    body_type: BodyType,
    // Unique by filename, kept in insertion order
    attachments: Vec<Attachment>,
}

impl Message {
    /// Create a message with a text/plain body
    pub fn new<S, B>(subject: S, body: B) -> Self
    where
        S: Into<String>,
        B: Into<String>,
    {
        Self::with_body_type(subject.into(), body.into(), BodyType::Plain)
    }

    /// Create a message with a text/html body
    pub fn new_html<S, B>(subject: S, body: B) -> Self
    where
        S: Into<String>,
        B: Into<String>,
    {
        Self::with_body_type(subject.into(), body.into(), BodyType::Html)
    }

    fn with_body_type(subject: String, body: String, body_type: BodyType) -> Self {
        Self {
            from: String::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject,
            body,
            body_type,
            attachments: Vec::new(),
        }
    }

    /// The body text
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The body type chosen when the message was created
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Attach the file at the given path as a base64 encoded
    /// `application/octet-stream` part.
    ///
    /// The attachment is named after the last component of the path and
    /// replaces any attachment with the same name.
    pub fn attach<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.attach_file(path.as_ref(), false)
    }

    /// Embed the file at the given path, usually a complete email, as an
    /// inline `message/rfc822` part.
    pub fn inline<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.attach_file(path.as_ref(), true)
    }

    /// Attach data that is already in memory
    pub fn attach_bytes<S, D>(&mut self, filename: S, data: D)
    where
        S: Into<String>,
        D: Into<Vec<u8>>,
    {
        self.add(filename.into(), data.into(), false);
    }

    /// Embed data that is already in memory as an inline part
    pub fn inline_bytes<S, D>(&mut self, filename: S, data: D)
    where
        S: Into<String>,
        D: Into<Vec<u8>>,
    {
        self.add(filename.into(), data.into(), true);
    }

    fn attach_file(&mut self, path: &Path, inline: bool) -> Result<()> {
        let display = || path.display().to_string();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .ok_or_else(|| {
                let err = io::Error::new(io::ErrorKind::InvalidInput, "path has no file name");
                Error::Io(display(), err)
            })?;
        let data = fs::read(path).map_err(|e| Error::Io(display(), e))?;
        self.add(filename, data, inline);
        Ok(())
    }

    fn add(&mut self, filename: String, data: Vec<u8>, inline: bool) {
        debug!(
            "Attaching {} ({} bytes, inline={})",
            filename,
            data.len(),
            inline
        );
        let attachment = Attachment {
            filename,
            data,
            inline,
        };
        match self
            .attachments
            .iter_mut()
            .find(|a| a.filename == attachment.filename)
        {
            Some(existing) => *existing = attachment,
            None => self.attachments.push(attachment),
        }
    }

    /// Iterate over the attachments in the order they were first added
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter()
    }

    /// Find an attachment by filename
    pub fn attachment(&self, filename: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.filename == filename)
    }

    /// The SMTP envelope recipients: to, then cc, then bcc.
    /// Order and duplicates are kept.
    pub fn recipient_list(&self) -> Vec<String> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .cloned()
            .collect()
    }

    /// Serialize the message into the bytes handed to the mail transport
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size_hint());
        mime::write_message(self, &mut buf).expect("writing to a Vec cannot fail");
        buf
    }

    /// True if the body or an attachment contains the multipart boundary.
    ///
    /// A message like this would not be split into the right parts by a
    /// receiving MIME parser.
    pub fn boundary_collision(&self) -> bool {
        let boundary = BOUNDARY.as_bytes();
        let contains = |data: &[u8]| data.windows(boundary.len()).any(|w| w == boundary);
        contains(self.body.as_bytes()) || self.attachments.iter().any(|a| contains(&a.data))
    }

    fn size_hint(&self) -> usize {
        let attachments: usize = self
            .attachments
            .iter()
            .map(|a| a.data.len() * 4 / 3 + 200)
            .sum();
        self.body.len() + attachments + 256
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;
    use std::io::Write;

    fn names(message: &Message) -> Vec<&str> {
        message.attachments().map(|a| a.filename()).collect()
    }

    #[test]
    fn constructors() {
        let message = Message::new("Subject", "Body");
        assert_eq!(message.body_type(), BodyType::Plain);
        assert_eq!(message.subject, "Subject");
        assert_eq!(message.body(), "Body");
        assert!(message.to.is_empty() && message.cc.is_empty() && message.bcc.is_empty());
        assert_eq!(message.attachments().count(), 0);

        let message = Message::new_html("Subject", "<p>Body</p>");
        assert_eq!(message.body_type(), BodyType::Html);
        assert_eq!(message.body_type().mime_type(), "text/html");
    }

    #[test]
    fn recipient_order() {
        let mut message = Message::new("", "");
        message.to = vec!["a@sea.com".into(), "b@sea.com".into()];
        message.cc = vec!["c@sea.com".into(), "a@sea.com".into()];
        message.bcc = vec!["d@sea.com".into()];
        let recipients = message.recipient_list();
        assert_eq!(
            recipients,
            vec!["a@sea.com", "b@sea.com", "c@sea.com", "a@sea.com", "d@sea.com"]
        );
        assert_eq!(
            recipients.len(),
            message.to.len() + message.cc.len() + message.bcc.len()
        );
    }

    #[test]
    fn replace_keeps_position() {
        let mut message = Message::new("", "");
        message.attach_bytes("one.txt", "1");
        message.attach_bytes("two.txt", "2");
        message.inline_bytes("one.txt", "uno");
        assert_eq!(names(&message), vec!["one.txt", "two.txt"]);
        let one = message.attachment("one.txt").unwrap();
        assert_eq!(one.data(), b"uno");
        assert!(one.is_inline());
    }

    #[test]
    fn attach_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        drop(file);

        let mut message = Message::new("", "");
        message.attach(&path).unwrap();
        let attachment = message.attachment("report.pdf").unwrap();
        assert_eq!(attachment.data(), b"%PDF-1.4");
        assert!(!attachment.is_inline());

        message.inline(&path).unwrap();
        assert_eq!(message.attachments().count(), 1);
        assert!(message.attachment("report.pdf").unwrap().is_inline());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let mut message = Message::new("", "");
        assert_matches!(message.attach(&path), Err(Error::Io(_, _)));
        assert_matches!(message.inline(&path), Err(Error::Io(_, _)));
        assert_eq!(message.attachments().count(), 0);
    }

    #[test]
    fn bytes_match_writer() {
        let mut message = Message::new("Hi", "hello");
        message.attach_bytes("f.txt", "AB");
        let mut out = Vec::new();
        mime::write_message(&message, &mut out).unwrap();
        assert_eq!(message.to_bytes(), out);
    }

    #[test]
    fn boundary_collision() {
        let mut message = Message::new("", "plain body");
        assert!(!message.boundary_collision());
        message.attach_bytes("evil.txt", format!("--{}--", BOUNDARY));
        assert!(message.boundary_collision());

        let message = Message::new("", format!("before {} after", BOUNDARY));
        assert!(message.boundary_collision());
    }
}
