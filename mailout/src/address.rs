//! Parsing of RFC 5322 mailbox addresses.

use crate::err::{Error, Result};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{anychar, char},
    combinator::{all_consuming, map, opt, recognize},
    multi::{fold_many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair},
    IResult,
};
use std::fmt;

/// A mailbox parsed from an address header such as `"Name" <user@example.com>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// The display name, if one was given
    pub name: Option<String>,
    /// The bare `local@domain` address
    pub address: String,
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{}\" <{}>", escaped, self.address)
            }
            None => write!(f, "{}", self.address),
        }
    }
}

/// Parse a single RFC 5322 mailbox.
///
/// Both `user@example.com` and `Some Name <user@example.com>` are accepted.
/// Comments and obsolete syntax are not.
/// ```
/// let mailbox = mailout::address::parse("Ship <ship@sea.com>").unwrap();
/// assert_eq!(mailbox.address, "ship@sea.com");
/// assert_eq!(mailbox.name.as_deref(), Some("Ship"));
/// ```
pub fn parse(text: &str) -> Result<Mailbox> {
    all_consuming(delimited(fws, mailbox, fws))(text)
        .map(|r| r.1)
        .map_err(|_| Error::AddressFormat(text.to_owned()))
}

// mailbox = name-addr / addr-spec
fn mailbox(buf: &str) -> IResult<&str, Mailbox> {
    let bare = map(addr_spec, |address| Mailbox {
        name: None,
        address,
    });
    alt((name_addr, bare))(buf)
}

// name-addr = [display-name] angle-addr
fn name_addr(buf: &str) -> IResult<&str, Mailbox> {
    let parser = pair(opt(display_name), angle_addr);
    map(parser, |(name, address)| Mailbox { name, address })(buf)
}

// angle-addr = [FWS] "<" addr-spec ">" [FWS]
fn angle_addr(buf: &str) -> IResult<&str, String> {
    delimited(pair(fws, char('<')), addr_spec, pair(char('>'), fws))(buf)
}

// display-name = 1*word
fn display_name(buf: &str) -> IResult<&str, String> {
    map(many1(delimited(fws, word, fws)), |words| words.join(" "))(buf)
}

// word = atom / quoted-string
fn word(buf: &str) -> IResult<&str, String> {
    alt((map(atom, str::to_owned), quoted_string))(buf)
}

// addr-spec = local-part "@" domain
fn addr_spec(buf: &str) -> IResult<&str, String> {
    let parser = separated_pair(local_part, char('@'), domain);
    map(parser, |(local, domain)| format!("{}@{}", local, domain))(buf)
}

// local-part = dot-atom / quoted-string
fn local_part(buf: &str) -> IResult<&str, &str> {
    alt((dot_atom, recognize(quoted_string)))(buf)
}

// domain = dot-atom / domain-literal
fn domain(buf: &str) -> IResult<&str, &str> {
    alt((dot_atom, domain_literal))(buf)
}

// domain-literal = "[" *dtext "]"
fn domain_literal(buf: &str) -> IResult<&str, &str> {
    recognize(delimited(char('['), take_while(is_dtext), char(']')))(buf)
}

// dot-atom = atom *("." atom)
fn dot_atom(buf: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), atom))(buf)
}

fn atom(buf: &str) -> IResult<&str, &str> {
    take_while1(is_atext)(buf)
}

// Returns the unescaped contents of the quoted string
fn quoted_string(buf: &str) -> IResult<&str, String> {
    let qtext = map(take_while1(is_qtext), str::to_owned);
    let quoted_pair = map(preceded(char('\\'), anychar), String::from);
    let contents = fold_many0(alt((qtext, quoted_pair)), String::new, |mut acc, s| {
        acc.push_str(&s);
        acc
    });
    delimited(char('"'), contents, char('"'))(buf)
}

fn fws(buf: &str) -> IResult<&str, &str> {
    take_while(|c: char| c == ' ' || c == '\t')(buf)
}

//---- Character classes --------------------------------------------------------

// Non-ascii characters are allowed as in RFC 6532
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || !c.is_ascii()
}

fn is_qtext(c: char) -> bool {
    c != '"' && c != '\\' && c != '\r' && c != '\n'
}

fn is_dtext(c: char) -> bool {
    c != '[' && c != ']' && c != '\\' && !c.is_whitespace()
}

//---- Tests --------------------------------------------------------------------
