//! Newline-delimited JSON envelopes over TCP.
//!
//! `TcpChannel::open` returns at once. A background I/O thread connects and
//! writes queued requests; a reader thread decodes inbound lines. Both report
//! back to the UI thread over crossbeam channels, so the client never blocks
//! on the network.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;

use crate::channel::{Delivery, PushChannel};
use crate::envelope::{decode_line, encode_line, request_update, ServerEvent};
use crate::error::StreamError;

/// Push channel backed by a TCP connection.
pub struct TcpChannel {
    peer: String,
    request_line: String,
    outgoing: Sender<String>,
    incoming: Receiver<Delivery>,
    closed: bool,
}

impl TcpChannel {
    /// Start connecting to `addr` in the background.
    ///
    /// Connection failures are reported as a `ConnectionLost` delivery, not as
    /// an error here.
    pub fn open(addr: impl Into<String>) -> Result<Self, StreamError> {
        let peer = addr.into();
        let request_line = encode_line(&request_update())?;
        let (out_tx, out_rx) = crossbeam_channel::unbounded::<String>();
        let (in_tx, in_rx) = crossbeam_channel::unbounded::<Delivery>();

        let thread_peer = peer.clone();
        let spawned = thread::Builder::new()
            .name("worldsim-io".into())
            .spawn(move || io_loop(&thread_peer, out_rx, in_tx));
        if let Err(e) = spawned {
            // Both channel ends moved into the closure are dropped, so the
            // channel reads as closed from here on.
            tracing::error!("failed to spawn I/O thread: {e}");
        }

        Ok(Self {
            peer,
            request_line,
            outgoing: out_tx,
            incoming: in_rx,
            closed: false,
        })
    }

    /// Address this channel connects to.
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl PushChannel for TcpChannel {
    fn emit_request(&mut self) -> Result<(), StreamError> {
        self.outgoing
            .send(self.request_line.clone())
            .map_err(|_| StreamError::ConnectionLost(format!("link to {} is closed", self.peer)))
    }

    fn try_next(&mut self) -> Option<Delivery> {
        if self.closed {
            return None;
        }
        match self.incoming.try_recv() {
            Ok(Err(lost @ StreamError::ConnectionLost(_))) => {
                // Reader and writer may both notice the same outage.
                self.closed = true;
                Some(Err(lost))
            }
            Ok(delivery) => Some(delivery),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                Some(Err(StreamError::ConnectionLost(format!(
                    "link to {} is closed",
                    self.peer
                ))))
            }
        }
    }
}

fn io_loop(peer: &str, outgoing: Receiver<String>, incoming: Sender<Delivery>) {
    let stream = match TcpStream::connect(peer) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = incoming.send(Err(StreamError::ConnectionLost(format!(
                "connect to {peer}: {e}"
            ))));
            return;
        }
    };
    tracing::info!(%peer, "connected to snapshot source");
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("set_nodelay failed: {e}");
    }

    let reader = match stream.try_clone() {
        Ok(reader) => reader,
        Err(e) => {
            let _ = incoming.send(Err(StreamError::ConnectionLost(format!(
                "clone stream: {e}"
            ))));
            return;
        }
    };
    let reader_tx = incoming.clone();
    if let Err(e) = thread::Builder::new()
        .name("worldsim-reader".into())
        .spawn(move || read_loop(reader, reader_tx))
    {
        let _ = incoming.send(Err(StreamError::ConnectionLost(format!(
            "spawn reader: {e}"
        ))));
        return;
    }

    write_loop(stream, outgoing, incoming);
}

/// Write queued lines until the client drops its channel or a write fails.
fn write_loop(mut stream: TcpStream, outgoing: Receiver<String>, incoming: Sender<Delivery>) {
    for line in outgoing.iter() {
        if let Err(e) = stream.write_all(line.as_bytes()) {
            let _ = incoming.send(Err(StreamError::ConnectionLost(format!("write: {e}"))));
            break;
        }
    }
    // Unblocks the reader thread.
    let _ = stream.shutdown(Shutdown::Both);
    tracing::debug!("writer stopped");
}

fn read_loop(stream: TcpStream, incoming: Sender<Delivery>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                let _ = incoming.send(Err(StreamError::ConnectionLost(format!("read: {e}"))));
                return;
            }
        }

        let delivery = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match decode_line(line) {
                Ok(ServerEvent::Update(frame)) => Ok(frame),
                Ok(ServerEvent::Other(name)) => {
                    tracing::debug!(event = %name, "ignoring event");
                    continue;
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(StreamError::InvalidFrame(format!("line is not UTF-8: {e}"))),
        };
        if incoming.send(delivery).is_err() {
            return;
        }
    }
    let _ = incoming.send(Err(StreamError::ConnectionLost(
        "source closed the connection".into(),
    )));
}
