//! # rcon
//!
//! Blocking client for the Minecraft remote console protocol.
//!
//! One [`Client`] owns one authenticated TCP connection. Exchanges are
//! serialized behind a mutex, so a client can be shared by reference
//! across threads while each command still gets its own reply.
//!
//! ## Example
//!
//! ```no_run
//! use craftform_rcon::Client;
//! use std::time::Duration;
//!
//! let client = Client::connect("localhost:25575", "secret", Duration::from_secs(10))?;
//! let reply = client.send_command("list")?;
//! println!("{reply}");
//! # Ok::<(), craftform_rcon::Error>(())
//! ```

pub mod error;
pub mod packet;

pub use error::{Error, Result};
pub use packet::Packet;

use packet::{COMMAND, LOGIN, RESPONSE_VALUE};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Port vanilla servers listen on when `rcon.port` is unset
pub const DEFAULT_PORT: u16 = 25575;

/// Largest command payload a vanilla server accepts
pub const MAX_COMMAND_LEN: usize = 1446;

/// Authenticated RCON connection
pub struct Client {
    connection: Mutex<Connection>,
    peer: SocketAddr,
}

struct Connection {
    stream: TcpStream,
    next_id: i32,
}

impl Client {
    /// Connect and authenticate.
    ///
    /// `address` is `host:port` or a bare host, in which case
    /// [`DEFAULT_PORT`] is used. `timeout` bounds the connect and every
    /// later socket read and write.
    pub fn connect(address: &str, password: &str, timeout: Duration) -> Result<Self> {
        let (host, port) = split_address(address)?;
        let candidates: Vec<SocketAddr> = (host.as_str(), port).to_socket_addrs()?.collect();
        if candidates.is_empty() {
            return Err(Error::InvalidAddress(address.to_string()));
        }

        let mut last_error = None;
        let mut connected = None;
        for candidate in candidates {
            log::debug!("connecting to {candidate}");
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    connected = Some((stream, candidate));
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }
        let Some((stream, peer)) = connected else {
            return Err(last_error.map_or_else(
                || Error::InvalidAddress(address.to_string()),
                Error::Io,
            ));
        };

        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        let mut connection = Connection { stream, next_id: 1 };
        connection.authenticate(password)?;
        log::info!("authenticated with RCON server at {peer}");

        Ok(Self {
            connection: Mutex::new(connection),
            peer,
        })
    }

    /// Address the client is connected to
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Run one command and return the server's reply text
    pub fn send_command(&self, command: &str) -> Result<String> {
        if command.len() > MAX_COMMAND_LEN {
            return Err(Error::CommandTooLong {
                len: command.len(),
                max: MAX_COMMAND_LEN,
            });
        }
        self.lock().exchange(command)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-exchange leaves at worst a stale reply, which the
        // request id check discards
        match self.connection.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Connection {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        id
    }

    fn authenticate(&mut self, password: &str) -> Result<()> {
        let id = self.allocate_id();
        Packet::new(id, LOGIN, password).write_to(&mut self.stream)?;

        loop {
            let packet = Packet::read_from(&mut self.stream)?;
            if packet.request_id == -1 {
                return Err(Error::AuthenticationFailed);
            }
            // Some servers send an empty value packet ahead of the auth response
            if packet.kind == RESPONSE_VALUE && packet.payload.is_empty() {
                continue;
            }
            if packet.request_id == id && packet.kind == COMMAND {
                return Ok(());
            }
            return Err(Error::Protocol(format!(
                "unexpected packet during login (id {}, type {})",
                packet.request_id, packet.kind
            )));
        }
    }

    fn exchange(&mut self, command: &str) -> Result<String> {
        let id = self.allocate_id();
        log::trace!("rcon [{id}] > {command}");
        Packet::new(id, COMMAND, command).write_to(&mut self.stream)?;

        loop {
            let packet = Packet::read_from(&mut self.stream)?;
            if packet.request_id == id {
                log::trace!("rcon [{id}] < {}", packet.payload);
                return Ok(packet.payload);
            }
            if (0..id).contains(&packet.request_id) {
                log::debug!("discarding stale reply for request {}", packet.request_id);
                continue;
            }
            return Err(Error::Protocol(format!(
                "reply for request {} while waiting for {id}",
                packet.request_id
            )));
        }
    }
}

/// Split `host[:port]`, accepting bracketed and bare IPv6 literals
fn split_address(address: &str) -> Result<(String, u16)> {
    let invalid = || Error::InvalidAddress(address.to_string());
    let address = address.trim();
    if address.is_empty() {
        return Err(invalid());
    }

    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        let port = match tail {
            "" => DEFAULT_PORT,
            _ => tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .ok_or_else(invalid)?,
        };
        return Ok((host.to_string(), port));
    }

    match address.rsplit_once(':') {
        // More than one colon: a bare IPv6 literal without a port
        Some((host, _)) if host.contains(':') => Ok((address.to_string(), DEFAULT_PORT)),
        Some((host, port)) => {
            let port = port.parse().map_err(|_| invalid())?;
            if host.is_empty() {
                return Err(invalid());
            }
            Ok((host.to_string(), port))
        }
        None => Ok((address.to_string(), DEFAULT_PORT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    const PASSWORD: &str = "hunter2";

    /// Accept one connection and answer it with `script` after a normal login
    fn fake_server<F>(script: F) -> (String, JoinHandle<()>)
    where
        F: FnOnce(&mut TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let login = Packet::read_from(&mut stream).unwrap();
            assert_eq!(login.kind, LOGIN);
            let reply_id = if login.payload == PASSWORD {
                login.request_id
            } else {
                -1
            };
            Packet::new(reply_id, COMMAND, "")
                .write_to(&mut stream)
                .unwrap();
            if reply_id != -1 {
                script(&mut stream);
            }
        });
        (address, handle)
    }

    fn echo(stream: &mut TcpStream, count: usize) {
        for _ in 0..count {
            let request = Packet::read_from(stream).unwrap();
            let reply = format!("ran: {}", request.payload);
            Packet::new(request.request_id, RESPONSE_VALUE, reply)
                .write_to(stream)
                .unwrap();
        }
    }

    #[test]
    fn test_command_round_trip() {
        let (address, server) = fake_server(|stream| echo(stream, 2));
        let client = Client::connect(&address, PASSWORD, Duration::from_secs(5)).unwrap();

        assert_eq!(client.send_command("list").unwrap(), "ran: list");
        assert_eq!(
            client.send_command("setblock 1 2 3 minecraft:stone replace").unwrap(),
            "ran: setblock 1 2 3 minecraft:stone replace"
        );
        server.join().unwrap();
    }

    #[test]
    fn test_wrong_password() {
        let (address, server) = fake_server(|_| {});
        let result = Client::connect(&address, "wrong", Duration::from_secs(5));
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
        server.join().unwrap();
    }

    #[test]
    fn test_stale_replies_are_discarded() {
        let (address, server) = fake_server(|stream| {
            let request = Packet::read_from(stream).unwrap();
            Packet::new(request.request_id - 1, RESPONSE_VALUE, "late")
                .write_to(stream)
                .unwrap();
            Packet::new(request.request_id, RESPONSE_VALUE, "fresh")
                .write_to(stream)
                .unwrap();
        });
        let client = Client::connect(&address, PASSWORD, Duration::from_secs(5)).unwrap();

        assert_eq!(client.send_command("time query day").unwrap(), "fresh");
        server.join().unwrap();
    }

    #[test]
    fn test_command_too_long_is_not_sent() {
        let (address, server) = fake_server(|_| {});
        let client = Client::connect(&address, PASSWORD, Duration::from_secs(5)).unwrap();

        let command = "x".repeat(MAX_COMMAND_LEN + 1);
        match client.send_command(&command) {
            Err(Error::CommandTooLong { len, max }) => {
                assert_eq!(len, MAX_COMMAND_LEN + 1);
                assert_eq!(max, MAX_COMMAND_LEN);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_split_address() {
        assert_eq!(
            split_address("localhost").unwrap(),
            ("localhost".to_string(), DEFAULT_PORT)
        );
        assert_eq!(
            split_address("mc.example.com:25580").unwrap(),
            ("mc.example.com".to_string(), 25580)
        );
        assert_eq!(
            split_address("[::1]:25576").unwrap(),
            ("::1".to_string(), 25576)
        );
        assert_eq!(split_address("::1").unwrap(), ("::1".to_string(), DEFAULT_PORT));

        assert!(matches!(
            split_address("localhost:notaport"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(split_address(" "), Err(Error::InvalidAddress(_))));
        assert!(matches!(split_address(":25575"), Err(Error::InvalidAddress(_))));
    }
}
