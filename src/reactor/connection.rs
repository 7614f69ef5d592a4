//! One registered connection and the table that owns them

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::connection_error::ConnectionError;
use crate::constants::reactor::OUTGOING_QUEUE_CAPACITY;
use crate::session::Session;
use crate::transport::{SocketTransport, Transport};
use crate::types::{ClientAddress, ConnectionId, OutputBacklogLimit, ReadBufferSize};

/// What a reader task reports to the dispatch loop
#[derive(Debug)]
pub(super) enum ReactorEvent {
    /// Bytes arrived on a connection
    Data { id: ConnectionId, bytes: Vec<u8> },
    /// The peer closed the connection, or reading from it failed
    Closed {
        id: ConnectionId,
        error: Option<std::io::Error>,
    },
}

/// A session, its transport and the tasks moving bytes for it
///
/// The session and transport live here, on the dispatch loop. Only raw
/// bytes cross into the reader and writer tasks.
pub(super) struct Connection<S> {
    pub(super) peer: ClientAddress,
    pub(super) transport: SocketTransport,
    pub(super) session: S,
    outgoing: mpsc::Sender<Vec<u8>>,
    /// Queued bytes the writer has not written yet, shared with the transport
    in_flight: Arc<AtomicUsize>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl<S: Session> Connection<S> {
    /// Split the stream and start its reader and writer tasks
    pub(super) fn spawn(
        id: ConnectionId,
        peer: ClientAddress,
        stream: TcpStream,
        session: S,
        read_buffer_size: ReadBufferSize,
        output_limit: OutputBacklogLimit,
        events: mpsc::Sender<ReactorEvent>,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (outgoing, outgoing_rx) = mpsc::channel(OUTGOING_QUEUE_CAPACITY);
        let transport = SocketTransport::new(format!("{id} {peer}")).with_output_limit(output_limit);
        let in_flight = transport.in_flight();

        let reader = tokio::spawn(read_loop(id, read_half, read_buffer_size, events));
        let writer = tokio::spawn(write_loop(id, write_half, outgoing_rx, Arc::clone(&in_flight)));

        Self {
            peer,
            transport,
            session,
            outgoing,
            in_flight,
            reader,
            writer,
        }
    }

    /// Hand everything the session sent to the writer task
    ///
    /// Fails when the writer queue is full, which only happens while the
    /// peer is not reading.
    pub(super) fn flush(&mut self) -> Result<(), ConnectionError> {
        let pending = self.transport.take_outgoing();
        if pending.is_empty() {
            return Ok(());
        }
        let len = pending.len();
        trace!(transport = self.transport.name(), bytes = len, "Queueing output");

        // Counted before sending so the writer never subtracts first
        self.in_flight.fetch_add(len, Ordering::AcqRel);
        match self.outgoing.try_send(pending) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let unsent = self.in_flight.fetch_sub(len, Ordering::AcqRel);
                Err(ConnectionError::OutputBacklog {
                    peer: self.peer,
                    unsent,
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.in_flight.fetch_sub(len, Ordering::AcqRel);
                debug!(transport = self.transport.name(), "Writer already stopped, dropping output");
                Ok(())
            }
        }
    }

    /// Tear the connection down, returning the writer task so the caller
    /// can wait for queued output to drain
    pub(super) fn release(mut self) -> JoinHandle<()> {
        if let Err(e) = self.flush() {
            e.log("Dropping final output");
        }
        self.session.connection_lost();
        self.transport.close();
        self.reader.abort();
        // Dropping the sender ends the writer once its queue is empty
        drop(self.outgoing);
        self.writer
    }

    /// Tear the connection down without sending anything still unsent
    pub(super) fn abort(mut self) {
        let discarded = self.transport.take_outgoing().len() + self.in_flight.load(Ordering::Acquire);
        debug!(transport = self.transport.name(), bytes = discarded, "Discarding unsent output");
        self.session.connection_lost();
        self.transport.close();
        self.reader.abort();
        self.writer.abort();
    }
}

async fn read_loop(
    id: ConnectionId,
    mut reader: OwnedReadHalf,
    buffer_size: ReadBufferSize,
    events: mpsc::Sender<ReactorEvent>,
) {
    let mut buffer = vec![0u8; buffer_size.get()];
    loop {
        let event = match reader.read(&mut buffer).await {
            Ok(0) => ReactorEvent::Closed { id, error: None },
            Ok(n) => ReactorEvent::Data {
                id,
                bytes: buffer[..n].to_vec(),
            },
            Err(e) => ReactorEvent::Closed { id, error: Some(e) },
        };
        let closed = matches!(event, ReactorEvent::Closed { .. });
        if events.send(event).await.is_err() || closed {
            break;
        }
    }
}

async fn write_loop(
    id: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut outgoing: mpsc::Receiver<Vec<u8>>,
    in_flight: Arc<AtomicUsize>,
) {
    while let Some(chunk) = outgoing.recv().await {
        if let Err(e) = writer.write_all(&chunk).await {
            ConnectionError::from(e).log(&format!("Write to {id} failed"));
            return;
        }
        in_flight.fetch_sub(chunk.len(), Ordering::AcqRel);
    }
    let _ = writer.shutdown().await;
}

/// Every live connection, keyed by a handle that is never reused
pub(super) struct ConnectionTable<S> {
    connections: HashMap<ConnectionId, Connection<S>>,
    next_id: u64,
}

impl<S> ConnectionTable<S> {
    pub(super) fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 0,
        }
    }

    pub(super) fn allocate_id(&mut self) -> ConnectionId {
        let id = ConnectionId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    pub(super) fn insert(&mut self, id: ConnectionId, connection: Connection<S>) {
        self.connections.insert(id, connection);
    }

    pub(super) fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection<S>> {
        self.connections.get_mut(&id)
    }

    pub(super) fn remove(&mut self, id: ConnectionId) -> Option<Connection<S>> {
        self.connections.remove(&id)
    }

    pub(super) fn ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub(super) fn len(&self) -> usize {
        self.connections.len()
    }
}
