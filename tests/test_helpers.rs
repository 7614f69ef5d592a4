//! Test helpers for integration tests
//!
//! Spawns a real server on an ephemeral port and speaks the wire protocol
//! to it over plain TCP streams.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Result, bail};
use fusenet::protocol::{Encoder, Frame, FrameDecoder, Identifier, Request, Response};
use fusenet::reactor::Reactor;
use fusenet::session::ServerSessionFactory;
use fusenet::storage::{MemoryDatabase, SharedDatabase, shared};
use fusenet::transport::SocketTransport;
use fusenet::types::{MaxStringLength, OutputBacklogLimit, Port, ReadBufferSize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// How long a test waits for any single answer
pub const ANSWER_TIMEOUT: Duration = Duration::from_secs(5);

/// A server running in the background of a test
pub struct TestServer {
    pub addr: SocketAddr,
    pub database: SharedDatabase,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestServer {
    /// Serve `database` on 127.0.0.1 with an ephemeral port
    pub async fn start(database: SharedDatabase) -> Result<Self> {
        Self::start_with(database, MaxStringLength::DEFAULT).await
    }

    /// Serve a fresh in-memory database
    pub async fn start_memory() -> Result<Self> {
        Self::start(shared(MemoryDatabase::new())).await
    }

    pub async fn start_with(database: SharedDatabase, max_string_length: MaxStringLength) -> Result<Self> {
        Self::spawn(database, max_string_length, OutputBacklogLimit::DEFAULT).await
    }

    /// Serve `database`, dropping clients whose unread answers exceed `limit`
    pub async fn start_with_output_limit(database: SharedDatabase, limit: OutputBacklogLimit) -> Result<Self> {
        Self::spawn(database, MaxStringLength::DEFAULT, limit).await
    }

    async fn spawn(
        database: SharedDatabase,
        max_string_length: MaxStringLength,
        output_limit: OutputBacklogLimit,
    ) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel();

        let factory = ServerSessionFactory::new(database.clone(), max_string_length);
        let handle = tokio::spawn(async move {
            let mut reactor =
                Reactor::new(factory, ReadBufferSize::DEFAULT).with_output_limit(output_limit);
            reactor
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await
        });

        Ok(Self {
            addr,
            database,
            shutdown: Some(tx),
            handle,
        })
    }

    pub fn port(&self) -> Port {
        Port::new(self.addr.port()).expect("ephemeral port is non-zero")
    }

    pub async fn connect(&self) -> Result<TcpStream> {
        Ok(TcpStream::connect(self.addr).await?)
    }

    /// Stop the reactor and wait for it to finish
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        timeout(ANSWER_TIMEOUT, &mut self.handle).await???;
        Ok(())
    }
}

/// Wire bytes of one request
pub fn encode_request(request: &Request) -> Vec<u8> {
    let mut transport = SocketTransport::new("test");
    request.encode(&mut Encoder::new(&mut transport));
    transport.take_outgoing()
}

/// Read frames until `ANS_END` and parse them as one answer
pub async fn read_response(stream: &mut TcpStream) -> Result<Response> {
    let mut decoder = FrameDecoder::default();
    let mut frames = Vec::new();
    let end = Frame::Identifier(Identifier::AnsEnd.as_byte());
    let mut byte = [0u8; 1];

    // One byte at a time so nothing after ANS_END is consumed
    while frames.last() != Some(&end) {
        let n = timeout(ANSWER_TIMEOUT, stream.read(&mut byte)).await??;
        if n == 0 {
            bail!("connection closed after {} frames", frames.len());
        }
        decoder.decode(&byte, &mut frames)?;
    }

    Ok(Response::decode(&frames)?)
}

/// Send `request` and wait for its answer
pub async fn round_trip(stream: &mut TcpStream, request: &Request) -> Result<Response> {
    stream.write_all(&encode_request(request)).await?;
    read_response(stream).await
}

/// True once the server has closed `stream`
pub async fn is_closed_by_peer(stream: &mut TcpStream) -> Result<bool> {
    let mut buf = [0u8; 64];
    match timeout(ANSWER_TIMEOUT, stream.read(&mut buf)).await? {
        Ok(0) => Ok(true),
        Ok(_) => Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => Ok(true),
        Err(e) => Err(e.into()),
    }
}
