// src/mirror.rs  —  Best-effort decoded-key echo to a remote host
//
// Purely informational: a companion display on another machine shows which
// key was pressed. The echo must never hold up or fail a bus command, so
// every notification runs on its own throwaway thread and every error is
// swallowed at debug level.

use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use crate::input::Key;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct MirrorNotifier {
    addr: String,
}

impl MirrorNotifier {
    pub fn new(addr: &str) -> Self {
        Self { addr: addr.to_string() }
    }

    /// Fire and forget: one line `<key-bits>\n`.
    pub fn notify(&self, key: Key) {
        let addr = self.addr.clone();
        thread::spawn(move || {
            if let Err(e) = echo(&addr, key) {
                log::debug!("[mirror] echo to {addr} failed: {e}");
            }
        });
    }
}

fn echo(addr: &str, key: Key) -> std::io::Result<()> {
    let target = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address"))?;
    let mut stream = TcpStream::connect_timeout(&target, CONNECT_TIMEOUT)?;
    stream.set_write_timeout(Some(CONNECT_TIMEOUT))?;
    stream.write_all(format!("{}\n", key.bits()).as_bytes())
}
