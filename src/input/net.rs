// src/input/net.rs  —  Line-oriented network key input
//
// A companion app (phone, chartplotter script) connects over TCP and sends
// one line per keypress:
//
//      <code>,<anything, ignored>
//
// Codes:  S standby   A auto   p +1   P +10   m -1   M -10
//
// Connections are served one at a time; the protocol has no read timeout,
// so a stalled peer stalls only this thread, never the press loop. Each
// parsed key overwrites the shared slot; last value wins until the decoder
// consumes it at its next assembly point.

use std::io::{BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::thread;

use anyhow::{Context, Result};

use super::{AuxSlot, Key};

/// Bind `addr` and start the accept loop on its own thread.
pub fn spawn_listener(addr: &str, slot: AuxSlot) -> Result<thread::JoinHandle<()>> {
    let listener = TcpListener::bind(addr)
        .with_context(|| format!("Binding network key input to {addr}"))?;
    log::info!("[net] listening on {addr}");
    Ok(thread::spawn(move || accept_loop(listener, slot)))
}

fn accept_loop(listener: TcpListener, slot: AuxSlot) {
    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                match stream.peer_addr() {
                    Ok(peer) => log::info!("[net] connection from {peer}"),
                    Err(_)   => log::info!("[net] connection"),
                }
                serve(stream, &slot);
            }
            Err(e) => log::warn!("[net] accept failed: {e}"),
        }
    }
}

fn serve(stream: TcpStream, slot: &AuxSlot) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::info!("[net] connection closed: {e}");
                return;
            }
        };
        match parse_line(&line) {
            Some(key) => {
                log::debug!("[net] key {}", key.bits());
                slot.post(key);
            }
            // unknown codes are skipped, the connection stays open
            None => log::debug!("[net] ignored line {line:?}"),
        }
    }
    log::info!("[net] connection closed");
}

/// First comma-separated field selects the key role; the rest of the line
/// is ignored. Unrecognized codes yield `None`.
pub fn parse_line(line: &str) -> Option<Key> {
    let code = line.split(',').next()?.trim();
    match code {
        "S" => Some(Key::STANDBY),
        "A" => Some(Key::AUTO),
        "p" => Some(Key::PLUS_1),
        "P" => Some(Key::PLUS_10),
        "m" => Some(Key::MINUS_1),
        "M" => Some(Key::MINUS_10),
        _   => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_their_roles() {
        assert_eq!(parse_line("S,1628522093"), Some(Key::STANDBY));
        assert_eq!(parse_line("A,whatever,else"), Some(Key::AUTO));
        assert_eq!(parse_line("p"), Some(Key::PLUS_1));
        assert_eq!(parse_line("P,"), Some(Key::PLUS_10));
        assert_eq!(parse_line("m,x"), Some(Key::MINUS_1));
        assert_eq!(parse_line("M,0"), Some(Key::MINUS_10));
    }

    #[test]
    fn case_distinguishes_one_from_ten() {
        assert_ne!(parse_line("p"), parse_line("P"));
        assert_ne!(parse_line("m"), parse_line("M"));
    }

    #[test]
    fn stray_whitespace_is_tolerated() {
        // carriage return from a telnet-style client
        assert_eq!(parse_line("S\r"), Some(Key::STANDBY));
        assert_eq!(parse_line("  A , 7"), Some(Key::AUTO));
    }

    #[test]
    fn malformed_lines_are_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("X,1"), None);
        assert_eq!(parse_line("SA"), None);
        assert_eq!(parse_line("s,lowercase standby is not a code"), None);
        assert_eq!(parse_line(",A"), None);
    }

    #[test]
    fn listener_feeds_the_slot() {
        use std::io::Write;

        let slot = AuxSlot::default();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let slot_srv = slot.clone();
        thread::spawn(move || accept_loop(listener, slot_srv));

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"garbage\nM,123\n").unwrap();
        drop(client);

        // the accept thread needs a moment to drain the connection
        for _ in 0..50 {
            if !slot.peek().is_empty() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(slot.take(), Key::MINUS_10);
    }
}
