//! Serialization of a `Message` into RFC 5322 / RFC 2046 text.
//!
//! Lines are terminated with a bare `\n`. Messages with attachments are sent
//! as `multipart/mixed` using the fixed `BOUNDARY`.

use crate::message::{Attachment, Message};
use std::io;
use std::io::Write;

/// The boundary token separating the parts of every multipart message
pub const BOUNDARY: &str = "f46d043c813270fc6b04c2d223da";

/// Write the serialized message to the given writer
pub fn write_message<W: Write>(message: &Message, out: &mut W) -> io::Result<()> {
    write_header(message, out)?;
    let multipart = message.attachments().next().is_some();
    if multipart {
        write!(
            out,
            "Content-Type: multipart/mixed; boundary={}\n\n--{}\n",
            BOUNDARY, BOUNDARY
        )?;
    }
    write!(
        out,
        "Content-Type: {}; charset=utf-8\n",
        message.body_type().mime_type()
    )?;
    out.write_all(message.body().as_bytes())?;
    if multipart {
        for attachment in message.attachments() {
            write!(out, "\n\n--{}\n", BOUNDARY)?;
            write_attachment(attachment, out)?;
            write!(out, "\n--{}", BOUNDARY)?;
        }
        out.write_all(b"--")?;
    }
    Ok(())
}

// Bcc is never written
fn write_header<W: Write>(message: &Message, out: &mut W) -> io::Result<()> {
    write!(out, "From: {}\n", message.from)?;
    write!(out, "To: {}\n", message.to.join(","))?;
    if !message.cc.is_empty() {
        write!(out, "Cc: {}\n", message.cc.join(","))?;
    }
    write!(out, "Subject: {}\n", message.subject)?;
    write!(out, "MIME-Version: 1.0\n")
}

fn write_attachment<W: Write>(attachment: &Attachment, out: &mut W) -> io::Result<()> {
    if attachment.is_inline() {
        write!(out, "Content-Type: message/rfc822\n")?;
        write!(
            out,
            "Content-Disposition: inline; filename=\"{}\"\n\n",
            attachment.filename()
        )?;
        out.write_all(attachment.data())
    } else {
        write!(out, "Content-Type: application/octet-stream\n")?;
        write!(out, "Content-Transfer-Encoding: base64\n")?;
        write!(
            out,
            "Content-Disposition: attachment; filename=\"{}\"\n\n",
            attachment.filename()
        )?;
        out.write_all(base64::encode(attachment.data()).as_bytes())
    }
}
