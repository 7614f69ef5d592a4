//! Byte transport abstraction
//!
//! A [`Transport`] is the byte-oriented duplex channel a session talks
//! through. Sessions never touch sockets: the reactor moves bytes between
//! the socket and a [`SocketTransport`] and tears the connection down
//! itself, so sending on or receiving from a closed transport is a no-op
//! rather than an error.

use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::types::OutputBacklogLimit;

/// Duplex byte channel for one connection
pub trait Transport: Send {
    /// Queue one byte for the peer. No-op once closed.
    fn send(&mut self, byte: u8);

    /// Queue several bytes for the peer. No-op once closed.
    fn send_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.send(byte);
        }
    }

    /// Next received byte, or `None` when nothing is buffered or the
    /// transport is closed
    fn receive(&mut self) -> Option<u8>;

    fn is_closed(&self) -> bool;

    /// Close the transport. Idempotent.
    fn close(&mut self);

    /// Bytes sent by the session that have not reached the peer yet
    fn output_backlog(&self) -> usize {
        0
    }

    /// True while more output is waiting for the peer than the transport
    /// allows. A session should not start another answer until it clears.
    fn is_backlogged(&self) -> bool {
        false
    }
}

/// Buffered transport bridging a socket and a session
///
/// The reactor fills the inbound buffer with [`deliver`](Self::deliver) and
/// drains what the session sent with [`take_outgoing`](Self::take_outgoing).
#[derive(Debug)]
pub struct SocketTransport {
    name: String,
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    closed: bool,
    output_limit: Option<OutputBacklogLimit>,
    /// Bytes taken from `outbound` that the socket has not accepted yet
    in_flight: Arc<AtomicUsize>,
}

impl SocketTransport {
    /// Create an open transport; `name` identifies it in logs
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inbound: VecDeque::new(),
            outbound: Vec::new(),
            closed: false,
            output_limit: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report a backlog once unsent output exceeds `limit`
    #[must_use]
    pub fn with_output_limit(mut self, limit: OutputBacklogLimit) -> Self {
        self.output_limit = Some(limit);
        self
    }

    /// Counter of bytes handed to a socket writer but not yet written
    ///
    /// Whoever moves [`take_outgoing`](Self::take_outgoing) output onto the
    /// socket adds the chunk length before queueing it and subtracts it once
    /// written.
    #[must_use]
    pub fn in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.in_flight)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append bytes read from the socket. Ignored once closed.
    pub fn deliver(&mut self, bytes: &[u8]) {
        if !self.closed {
            self.inbound.extend(bytes);
        }
    }

    /// Take every byte the session has sent since the last call
    pub fn take_outgoing(&mut self) -> Vec<u8> {
        mem::take(&mut self.outbound)
    }

    #[must_use]
    pub fn has_outgoing(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Number of received bytes not yet consumed by the session
    #[must_use]
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for SocketTransport {
    fn send(&mut self, byte: u8) {
        if !self.closed {
            self.outbound.push(byte);
        }
    }

    fn send_all(&mut self, bytes: &[u8]) {
        if !self.closed {
            self.outbound.extend_from_slice(bytes);
        }
    }

    fn receive(&mut self) -> Option<u8> {
        if self.closed {
            None
        } else {
            self.inbound.pop_front()
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the transport, discarding unread input.
    ///
    /// Bytes already sent stay queued so the reactor can still flush a
    /// final answer.
    fn close(&mut self) {
        self.closed = true;
        self.inbound.clear();
    }

    /// Output buffered here plus output still in flight
    fn output_backlog(&self) -> usize {
        self.outbound.len() + self.in_flight.load(Ordering::Acquire)
    }

    fn is_backlogged(&self) -> bool {
        self.output_limit
            .is_some_and(|limit| self.output_backlog() > limit.get())
    }
}
