//! End-to-end transfer scenarios against a live server.
//!
//! The server is single-session, so every scenario that needs it runs
//! sequentially inside one test body. Filenames travel as absolute
//! paths into a temp directory; they fit comfortably in one frame.

use std::net::TcpStream;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use dcftp::error::TransferError;
use dcftp::frame::{frame_text, read_exact_frame, write_frame};
use dcftp::protocol::{client_get, client_send, run_server, Command, NOT_FOUND_SENTINEL};

const CONTROL_PORT: u16 = 19005;
const DATA_BASE: u16 = 19006;

fn wait_for_file(path: &Path) -> Vec<u8> {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if let Ok(content) = std::fs::read(path) {
            return content;
        }
        assert!(Instant::now() < deadline, "server never wrote {:?}", path);
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn server_runs_many_sessions_back_to_back() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();

    thread::spawn(|| {
        run_server(CONTROL_PORT).unwrap();
    });

    // session 1: GET round trip. client_get retries its connect, which
    // also rides over server startup.
    let served = dir.path().join("a.txt");
    std::fs::write(&served, "hello").unwrap();
    let payload = client_get("127.0.0.1", CONTROL_PORT, served.to_str().unwrap()).unwrap();
    assert_eq!(payload, b"hello");

    // session 2: SEND, driven frame by frame so the test observes the
    // announced data port and the server-side write directly.
    let incoming = dir.path().join("b.txt");
    let mut control = TcpStream::connect(("127.0.0.1", CONTROL_PORT)).unwrap();
    write_frame(&mut control, Command::Send.as_frame()).unwrap();

    let data_port: u16 = frame_text(&read_exact_frame(&mut control).unwrap())
        .parse()
        .unwrap();
    // first free port at or above the base; session 1's port may still
    // be in TIME_WAIT
    assert!((DATA_BASE..DATA_BASE + 100).contains(&data_port));

    write_frame(&mut control, incoming.to_str().unwrap().as_bytes()).unwrap();
    let mut data = TcpStream::connect(("127.0.0.1", data_port)).unwrap();
    write_frame(&mut data, b"fresh content").unwrap();
    drop(data);
    drop(control);
    assert_eq!(wait_for_file(&incoming), b"fresh content");

    // session 3: an unknown command kills only that session
    let mut control = TcpStream::connect(("127.0.0.1", CONTROL_PORT)).unwrap();
    write_frame(&mut control, b"PUT\n").unwrap();
    drop(control);

    // session 4: GET of a missing file completes and carries the
    // sentinel instead of hanging or tearing the connection
    let missing = dir.path().join("nope.txt");
    let payload = client_get("127.0.0.1", CONTROL_PORT, missing.to_str().unwrap()).unwrap();
    assert_eq!(payload, NOT_FOUND_SENTINEL);

    // session 5: the full client SEND path
    let outgoing = dir.path().join("c.txt");
    std::fs::write(&outgoing, "round and round").unwrap();
    client_send("127.0.0.1", CONTROL_PORT, outgoing.to_str().unwrap()).unwrap();
    let payload = client_get("127.0.0.1", CONTROL_PORT, outgoing.to_str().unwrap()).unwrap();
    assert_eq!(payload, b"round and round");
}

#[test]
fn send_of_a_missing_local_file_never_touches_the_network() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("ghost.txt");

    // nothing listens on this port: any network attempt would surface
    // as a connect failure, not FileNotFound
    match client_send("127.0.0.1", 20999, missing.to_str().unwrap()) {
        Err(TransferError::FileNotFound(name)) => {
            assert_eq!(name, missing.to_str().unwrap())
        }
        other => panic!("expected FileNotFound, got {:?}", other),
    }
}
