use anyhow::{anyhow, Context, Error};
use getopts::{Matches, Options};
use log::info;
use mailout::Message;
use mailout_smtp::SmtpTransport;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::env;
use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;
use std::process;
use time::format_description;
use time::OffsetDateTime;

const DEFAULT_ADDRESS: &str = "127.0.0.1:25";

// Command line option names
const OPT_HELP: &str = "help";
const OPT_SERVER: &str = "server";
const OPT_HELLO: &str = "hello";
const OPT_USER: &str = "user";
const OPT_PASSWORD: &str = "password";
const OPT_FROM: &str = "from";
const OPT_TO: &str = "to";
const OPT_CC: &str = "cc";
const OPT_BCC: &str = "bcc";
const OPT_SUBJECT: &str = "subject";
const OPT_BODY: &str = "body";
const OPT_BODY_FILE: &str = "body-file";
const OPT_HTML: &str = "html";
const OPT_ATTACH: &str = "attach";
const OPT_INLINE: &str = "inline";
const OPT_LOG: &str = "log";
const OPT_DRY_RUN: &str = "dry-run";

fn setup_logger(log_dir: Option<&str>) -> Result<(), Error> {
    let log_level = LevelFilter::Info;
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(log_dir) = log_dir {
        let format = format_description::parse("[year][month][day][hour][minute][second]")?;
        let datetime = OffsetDateTime::now_utc().format(&format)?;
        let filename = format!("send-{}.log", datetime);
        let filepath = Path::new(log_dir).join(&filename);
        let file = File::create(&filepath)
            .with_context(|| format!("Cannot create log file {}", filepath.display()))?;
        let config = ConfigBuilder::new()
            .set_time_level(LevelFilter::Error)
            .set_location_level(LevelFilter::Off)
            .build();
        loggers.push(WriteLogger::new(LevelFilter::Trace, config, file));
    }
    CombinedLogger::init(loggers).map_err(|err| anyhow!("Cannot initialize logger: {}", err))
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optflag("h", OPT_HELP, "print this help menu");
    opts.optopt("s", OPT_SERVER, "the SMTP server to send to", "HOST:PORT");
    opts.optopt("", OPT_HELLO, "the name to send in EHLO", "NAME");
    opts.optopt("u", OPT_USER, "user name for PLAIN authentication", "USER");
    opts.optopt("p", OPT_PASSWORD, "password for PLAIN authentication", "PASSWORD");
    opts.optopt("f", OPT_FROM, "the sender", "ADDRESS");
    opts.optmulti("t", OPT_TO, "a recipient", "ADDRESS");
    opts.optmulti("", OPT_CC, "a copy recipient", "ADDRESS");
    opts.optmulti("", OPT_BCC, "a blind copy recipient", "ADDRESS");
    opts.optopt("j", OPT_SUBJECT, "the subject", "SUBJECT");
    opts.optopt("b", OPT_BODY, "the message body", "TEXT");
    opts.optopt("", OPT_BODY_FILE, "read the message body from a file", "FILE");
    opts.optflag("", OPT_HTML, "the body is html");
    opts.optmulti("a", OPT_ATTACH, "attach a file", "FILE");
    opts.optmulti("", OPT_INLINE, "embed an email file inline", "FILE");
    opts.optopt("l", OPT_LOG, "the directory to write logs to", "LOG_DIR");
    opts.optflag("", OPT_DRY_RUN, "print the message instead of sending it");
    opts
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

fn build_message(matches: &Matches) -> Result<Message, Error> {
    let subject = matches.opt_str(OPT_SUBJECT).unwrap_or_default();
    let body = match (matches.opt_str(OPT_BODY), matches.opt_str(OPT_BODY_FILE)) {
        (Some(_), Some(_)) => return Err(anyhow!("Use only one of --body and --body-file")),
        (Some(body), None) => body,
        (None, Some(path)) => {
            fs::read_to_string(&path).with_context(|| format!("Cannot read body from {}", path))?
        }
        (None, None) => String::new(),
    };
    let mut message = if matches.opt_present(OPT_HTML) {
        Message::new_html(subject, body)
    } else {
        Message::new(subject, body)
    };
    message.from = matches.opt_str(OPT_FROM).unwrap_or_default();
    message.to = matches.opt_strs(OPT_TO);
    message.cc = matches.opt_strs(OPT_CC);
    message.bcc = matches.opt_strs(OPT_BCC);
    for path in matches.opt_strs(OPT_ATTACH) {
        message.attach(&path)?;
    }
    for path in matches.opt_strs(OPT_INLINE) {
        message.inline(&path)?;
    }
    Ok(message)
}

fn send(matches: &Matches, message: &Message) -> Result<(), Error> {
    let addr = matches
        .opt_str(OPT_SERVER)
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());
    let mut transport = SmtpTransport::new();
    if let Some(name) = matches.opt_str(OPT_HELLO) {
        transport.with_hello_name(name);
    }
    match (matches.opt_str(OPT_USER), matches.opt_str(OPT_PASSWORD)) {
        (Some(user), Some(password)) => {
            mailout::send_unencrypted(&mut transport, &addr, &user, &password, message)?
        }
        (None, None) => mailout::send(&mut transport, &addr, None, message)?,
        (_, _) => return Err(anyhow!("--user and --password must be given together")),
    }
    info!("Message sent via {}", addr);
    Ok(())
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = env::args().collect();
    let opts = options();
    let matches = opts
        .parse(&args[1..])
        .map_err(|err| anyhow!("Error parsing command line: {}", err))?;
    if matches.opt_present(OPT_HELP) {
        print_usage(&args[0], &opts);
        return Ok(());
    }
    setup_logger(matches.opt_str(OPT_LOG).as_deref())?;
    let message = build_message(&matches)?;
    if matches.opt_present(OPT_DRY_RUN) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        mailout::mime::write_message(&message, &mut out)?;
        writeln!(out)?;
        return Ok(());
    }
    send(&matches, &message)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    fn parse(args: &[&str]) -> Matches {
        options().parse(args).unwrap()
    }

    #[test]
    fn message_from_options() {
        let matches = parse(&[
            "-f",
            "ship@sea.com",
            "-t",
            "fish@sea.com",
            "--to",
            "crab@sea.com",
            "--bcc",
            "whale@sea.com",
            "-j",
            "Hi",
            "-b",
            "hello",
        ]);
        let message = build_message(&matches).unwrap();
        assert_eq!(message.from, "ship@sea.com");
        assert_eq!(message.to, vec!["fish@sea.com", "crab@sea.com"]);
        assert!(message.cc.is_empty());
        assert_eq!(message.bcc, vec!["whale@sea.com"]);
        assert_eq!(message.subject, "Hi");
        assert_eq!(message.body(), "hello");
        assert_eq!(message.body_type(), mailout::BodyType::Plain);
    }

    #[test]
    fn html_body() {
        let message = build_message(&parse(&["--html", "-b", "<p>hi</p>"])).unwrap();
        assert_eq!(message.body_type(), mailout::BodyType::Html);
    }

    #[test]
    fn conflicting_body() {
        let matches = parse(&["-b", "hello", "--body-file", "body.txt"]);
        assert!(build_message(&matches).is_err());
    }

    #[test]
    fn missing_attachment() {
        let matches = parse(&["-a", "/this/file/does/not/exist.txt"]);
        let err = build_message(&matches).unwrap_err();
        assert_matches!(err.downcast_ref::<mailout::Error>(), Some(mailout::Error::Io(_, _)));
    }

    #[test]
    fn user_without_password() {
        let matches = parse(&["-f", "ship@sea.com", "-u", "ship"]);
        let message = build_message(&matches).unwrap();
        assert!(send(&matches, &message).is_err());
    }
}
