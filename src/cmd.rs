//! Argument parsing for the `dcftp` binary.

use getopts::Options;

use crate::protocol::DEFAULT_CONTROL_PORT;

#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Server { port: u16 },
    Client { host: String, port: u16 },
    Help(String),
}

pub fn parse_args(argv: Vec<String>) -> Result<Invocation, String> {
    let program = argv.first().map(String::as_str).unwrap_or("dcftp");
    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help menu");

    let rest = argv.get(1..).unwrap_or(&[]);
    let matches = opts.parse(rest).map_err(|e| e.to_string())?;
    if matches.opt_present("h") {
        return Ok(Invocation::Help(usage(program, &opts)));
    }

    let mut free = matches.free.iter();
    match free.next().map(String::as_str) {
        Some("server") => {
            let port = parse_port(free.next(), DEFAULT_CONTROL_PORT)?;
            Ok(Invocation::Server { port })
        }
        Some("client") => {
            let host = free.next().ok_or_else(|| usage(program, &opts))?.clone();
            let port = parse_port(free.next(), DEFAULT_CONTROL_PORT)?;
            Ok(Invocation::Client { host, port })
        }
        _ => Err(usage(program, &opts)),
    }
}

fn parse_port(arg: Option<&String>, default: u16) -> Result<u16, String> {
    match arg {
        Some(text) => text
            .parse::<u16>()
            .map_err(|_| format!("invalid port: {}", text)),
        None => Ok(default),
    }
}

fn usage(program: &str, opts: &Options) -> String {
    let brief = format!(
        "Usage: {} server [port]\n       {} client <host> [port]",
        program, program
    );
    opts.usage(&brief)
}
