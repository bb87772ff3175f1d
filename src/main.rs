/************************************************************
 ***********The Dual Channel File Transfer Protocol**********
 ***********************************************************
 *******one port to ask for a file, a fresh one to move it***
 ***********************************************************/

use std::env;
use std::io::{self, BufRead, Write};
use std::process::exit;

use log::error;

use dcftp::cmd::{parse_args, Invocation};
use dcftp::files::{sanitize_name, write_payload};
use dcftp::protocol::{client_get, client_send, run_server, Command, NOT_FOUND_SENTINEL};

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let invocation = match parse_args(argv) {
        Ok(invocation) => invocation,
        Err(m) => {
            eprintln!("{}", m);
            exit(1);
        }
    };

    match invocation {
        Invocation::Help(text) => println!("{}", text),
        Invocation::Server { port } => {
            if let Err(e) = run_server(port) {
                error!("server failed: {}", e);
                eprintln!("server failed: {}", e);
                exit(1);
            }
        }
        Invocation::Client { host, port } => run_client(&host, port),
    }
}

fn run_client(host: &str, port: u16) {
    let command = prompt_command();
    let filename = prompt("Filename (e.g. 'file.txt'): ");
    let filename = sanitize_name(&filename).to_string();

    let outcome = match command {
        Command::Get => client_get(host, port, &filename).and_then(|payload| {
            if payload == NOT_FOUND_SENTINEL {
                println!("File not found on server");
            } else {
                write_payload(&filename, &payload)?;
                println!("File contents: {}", String::from_utf8_lossy(&payload));
            }
            Ok(())
        }),
        Command::Send => client_send(host, port, &filename).map(|()| {
            println!("File sent successfully.");
        }),
    };

    if let Err(e) = outcome {
        eprintln!("{}", e);
        exit(1);
    }
    println!("Closing the connection");
}

fn prompt_command() -> Command {
    loop {
        let line = prompt("Command (Enter 'GET' or 'SEND'): ");
        match line.trim_end() {
            "GET" => return Command::Get,
            "SEND" => return Command::Send,
            _ => println!("Try again..."),
        }
    }
}

fn prompt(text: &str) -> String {
    print!("{}", text);
    io::stdout().flush().ok();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => {
            eprintln!("stdin closed");
            exit(1);
        }
        Ok(_) => line,
    }
}
