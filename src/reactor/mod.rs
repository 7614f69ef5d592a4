//! Connection reactor
//!
//! One dispatch loop owns the listening socket, every session and every
//! transport. Per-connection reader tasks forward received bytes to the
//! loop over a channel and per-connection writer tasks send whatever the
//! sessions queued, so sessions themselves never wait on a socket. Each
//! delivery runs the target session to completion before the loop looks at
//! the next event.

mod connection;

use std::future::Future;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use connection::{Connection, ConnectionTable, ReactorEvent};

use crate::connection_error::ConnectionError;
use crate::constants::reactor::{EVENT_CHANNEL_CAPACITY, WRITER_DRAIN_TIMEOUT};
use crate::protocol::ProtocolError;
use crate::session::{Session, SessionFactory};
use crate::transport::{SocketTransport, Transport};
use crate::types::{ClientAddress, ConnectionId, OutputBacklogLimit, Port, ReadBufferSize};

pub struct Reactor<F: SessionFactory> {
    factory: F,
    read_buffer_size: ReadBufferSize,
    output_limit: OutputBacklogLimit,
    connections: ConnectionTable<F::Session>,
    /// Writer tasks of released connections that may still be flushing
    draining: Vec<JoinHandle<()>>,
}

impl<F: SessionFactory> Reactor<F> {
    pub fn new(factory: F, read_buffer_size: ReadBufferSize) -> Self {
        Self {
            factory,
            read_buffer_size,
            output_limit: OutputBacklogLimit::DEFAULT,
            connections: ConnectionTable::new(),
            draining: Vec::new(),
        }
    }

    /// Unsent output at which accepted connections report a backlog
    #[must_use]
    pub fn with_output_limit(mut self, limit: OutputBacklogLimit) -> Self {
        self.output_limit = limit;
        self
    }

    /// Bind a listening socket for [`serve`](Self::serve)
    pub async fn bind(host: &str, port: Port) -> Result<TcpListener, ConnectionError> {
        TcpListener::bind((host, port.get()))
            .await
            .map_err(|source| ConnectionError::Bind {
                address: format!("{}:{}", host, port),
                source,
            })
    }

    /// Number of registered connections
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Serve connections from `listener` until `shutdown` completes
    ///
    /// On shutdown every session is released (receiving connection-lost)
    /// before the listener is dropped.
    pub async fn serve(
        &mut self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::pin!(shutdown);

        if let Ok(addr) = listener.local_addr() {
            info!("Reactor listening on {}", addr);
        }

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, releasing {} connections", self.connections.len());
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.accept(stream, ClientAddress::from(addr), &events_tx),
                    Err(e) => ConnectionError::Accept(e).log("Continuing after accept failure"),
                },
                Some(event) = events_rx.recv() => self.dispatch(event),
            }
        }

        self.shutdown().await;
        drop(listener);
        Ok(())
    }

    fn accept(
        &mut self,
        stream: TcpStream,
        peer: ClientAddress,
        events: &mpsc::Sender<ReactorEvent>,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, "Failed to set TCP_NODELAY: {}", e);
        }

        let session = match self.factory.create(peer) {
            Ok(session) => session,
            Err(source) => {
                ConnectionError::SessionCreation { peer, source }.log("Abandoning connection");
                return;
            }
        };

        let id = self.connections.allocate_id();
        info!(conn = %id, %peer, "Accepted connection");
        let connection = Connection::spawn(
            id,
            peer,
            stream,
            session,
            self.read_buffer_size,
            self.output_limit,
            events.clone(),
        );
        self.connections.insert(id, connection);
        self.with_connection(id, |connection| {
            connection
                .session
                .connection_established(&mut connection.transport);
            Ok(())
        });
    }

    fn dispatch(&mut self, event: ReactorEvent) {
        match event {
            ReactorEvent::Data { id, bytes } => self.with_connection(id, |connection| {
                connection.transport.deliver(&bytes);
                connection.session.data_received(&mut connection.transport)
            }),
            ReactorEvent::Closed { id, error } => {
                match error {
                    Some(e) => ConnectionError::from(e).log(&format!("Connection {id} failed")),
                    None => debug!(conn = %id, "Peer closed connection"),
                }
                self.release(id);
            }
        }
    }

    /// Run one session hook, flush its output and release the connection
    /// if the session closed it or broke protocol
    ///
    /// A peer that stopped reading is dropped instead: its unsent output is
    /// discarded rather than waited on.
    fn with_connection(
        &mut self,
        id: ConnectionId,
        hook: impl FnOnce(&mut Connection<F::Session>) -> Result<(), ProtocolError>,
    ) {
        let Some(connection) = self.connections.get_mut(id) else {
            debug!(conn = %id, "Ignoring event for released connection");
            return;
        };

        let result = hook(connection);
        let backlogged = matches!(result, Err(ProtocolError::OutputBacklog { .. }));
        let flushed = if backlogged {
            Ok(())
        } else {
            connection.flush()
        };

        let failed = match result {
            Ok(()) => false,
            Err(source) => {
                ConnectionError::Protocol {
                    peer: connection.peer,
                    source,
                }
                .log(&format!("Closing {id}"));
                true
            }
        };
        let closed = connection.transport.is_closed();

        match flushed {
            Err(e) => {
                e.log(&format!("Dropping {id}"));
                self.abort(id);
            }
            Ok(()) if backlogged => self.abort(id),
            Ok(()) if failed || closed => self.release(id),
            Ok(()) => {}
        }
    }

    /// Drop one connection without sending its unsent output
    fn abort(&mut self, id: ConnectionId) {
        let Some(connection) = self.connections.remove(id) else {
            return;
        };
        info!(conn = %id, peer = %connection.peer, "Connection dropped");
        connection.abort();
    }

    /// Release one connection: its session gets connection-lost, its
    /// transport is closed and its socket tasks stop. Releasing an unknown
    /// or already released id does nothing.
    pub fn release(&mut self, id: ConnectionId) {
        let Some(connection) = self.connections.remove(id) else {
            return;
        };
        info!(conn = %id, peer = %connection.peer, "Connection released");
        let writer = connection.release();
        self.draining.retain(|task| !task.is_finished());
        self.draining.push(writer);
    }

    /// Release every connection without waiting for output to drain
    pub fn release_all(&mut self) {
        for id in self.connections.ids() {
            self.release(id);
        }
    }

    /// Release every connection, then give writers a moment to send what
    /// was already queued
    pub async fn shutdown(&mut self) {
        self.release_all();
        let writers = std::mem::take(&mut self.draining);
        let drained = tokio::time::timeout(WRITER_DRAIN_TIMEOUT, async {
            for writer in writers {
                let _ = writer.await;
            }
        })
        .await;
        if drained.is_err() {
            warn!("Timed out flushing output of released connections");
        }
    }

    /// Connect to `host:port` and drive a single session until it closes
    /// the transport or the peer disconnects
    ///
    /// Hooks run exactly as for accepted connections: connection-established,
    /// data-received per read, connection-lost at the end. The finished
    /// session is returned to the caller.
    pub async fn initiate(&mut self, host: &str, port: Port) -> Result<F::Session, ConnectionError> {
        let stream = TcpStream::connect((host, port.get()))
            .await
            .map_err(|source| ConnectionError::TcpConnect {
                host: host.to_string(),
                port: port.get(),
                source,
            })?;
        let peer = ClientAddress::from(stream.peer_addr()?);
        let mut session = self
            .factory
            .create(peer)
            .map_err(|source| ConnectionError::SessionCreation { peer, source })?;
        debug!(%peer, "Connected");

        let mut transport = SocketTransport::new(format!("initiated {peer}"));
        let (mut reader, mut writer) = stream.into_split();
        let mut buffer = vec![0u8; self.read_buffer_size.get()];

        session.connection_established(&mut transport);
        let outcome = async {
            write_pending(&mut transport, &mut writer).await?;
            while !transport.is_closed() {
                let n = reader.read(&mut buffer).await?;
                if n == 0 {
                    debug!(%peer, "Peer closed connection");
                    break;
                }
                transport.deliver(&buffer[..n]);
                let result = session.data_received(&mut transport);
                write_pending(&mut transport, &mut writer).await?;
                result.map_err(|source| ConnectionError::Protocol { peer, source })?;
            }
            Ok::<(), ConnectionError>(())
        }
        .await;

        session.connection_lost();
        let _ = writer.shutdown().await;

        match outcome {
            Ok(()) => Ok(session),
            Err(e) if e.is_client_disconnect() => {
                debug!(%peer, "Peer disconnected: {}", e);
                Ok(session)
            }
            Err(e) => Err(e),
        }
    }
}

impl<F: SessionFactory> Drop for Reactor<F> {
    fn drop(&mut self) {
        self.release_all();
    }
}

async fn write_pending(
    transport: &mut SocketTransport,
    writer: &mut OwnedWriteHalf,
) -> std::io::Result<()> {
    let pending = transport.take_outgoing();
    if !pending.is_empty() {
        writer.write_all(&pending).await?;
    }
    Ok(())
}
