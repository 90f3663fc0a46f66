// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The TCP connection server.
//!
//! One engine per gateway process: connections are served one at a time,
//! strictly request/response, with no interleaving. A broken transport
//! is unrecoverable — the protocol has no request identifiers to resync
//! on — so transport failures terminate the server, while a clean EOF
//! just ends the connection and the loop accepts the next one.

use std::io;
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use jg_wire::{framing, RequestKind, Response, WireError};

use crate::dispatch::Dispatcher;

/// How often the accept loop polls for a pending connection.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Server timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// How long to wait for the next connection before exiting the
    /// accept loop. Expiry is a normal exit, not an error.
    pub accept_timeout: Duration,
    /// Per-connection read timeout. Expiry ends the session.
    pub read_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            accept_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Run the server until a SHUTDOWN request, an accept timeout, or a
/// transport failure.
pub fn run(
    listener: TcpListener,
    dispatcher: &mut Dispatcher,
    options: ServerOptions,
) -> io::Result<()> {
    listener.set_nonblocking(true)?;
    tracing::info!(
        "listening on {} (accept timeout {:?})",
        listener.local_addr()?,
        options.accept_timeout
    );

    let mut waiting_since = Instant::now();
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                tracing::info!("connection from {}", peer);
                let shutdown = handle_connection(stream, dispatcher, options)?;
                if shutdown {
                    tracing::info!("shutdown requested; stopping");
                    return Ok(());
                }
                waiting_since = Instant::now();
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if waiting_since.elapsed() >= options.accept_timeout {
                    tracing::info!("no connection within accept timeout; stopping");
                    return Ok(());
                }
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Serve one connection to completion. Returns true when the engine
/// requested shutdown.
fn handle_connection(
    stream: TcpStream,
    dispatcher: &mut Dispatcher,
    options: ServerOptions,
) -> io::Result<bool> {
    // The listener is non-blocking; the accepted stream must not be.
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(options.read_timeout))?;
    let mut stream = stream;

    loop {
        match framing::read_request(&mut stream) {
            Ok(Some(request)) => {
                let response = dispatcher.handle(&request);
                framing::write_response(&mut stream, &response)
                    .map_err(into_io_error)?;
                if request.kind() == Some(RequestKind::Shutdown) {
                    return Ok(true);
                }
            }
            Ok(None) => {
                tracing::info!("connection closed by peer");
                return Ok(false);
            }
            Err(WireError::Io(e)) => {
                tracing::error!("transport failure reading request: {}", e);
                return Err(e);
            }
            Err(e) => {
                // Unparseable request. Tell the peer once, then treat
                // the stream as unusable: with no framing resync there
                // is no safe way to continue.
                tracing::error!("unable to parse request: {}", e);
                let _ = framing::write_response(
                    &mut stream,
                    &Response::error("Unable to parse the request."),
                );
                return Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string()));
            }
        }
    }
}

fn into_io_error(e: WireError) -> io::Error {
    match e {
        WireError::Io(io) => io,
        other => io::Error::other(other.to_string()),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
