//! Client side of the protocol
//!
//! The client session sends one request at a time and waits for its answer.
//! Answer frames are collected until `ANS_END`, parsed as a whole and handed
//! to a [`ClientHandler`] callback, whose return value is the next request.
//! When the handler has nothing more to ask, the session closes the
//! transport.

use std::mem;

use anyhow::bail;
use tracing::{debug, warn};

use super::{Session, SessionFactory, drain};
use crate::protocol::{Encoder, Frame, FrameDecoder, Identifier, Operation, ProtocolError, Request, Response};
use crate::storage::{ArticleContent, ArticleSummary, Newsgroup, StatusCode};
use crate::transport::Transport;
use crate::types::{ClientAddress, MaxStringLength};

/// Receives the outcome of each request
///
/// Every callback returns the next request to send, or `None` to finish.
pub trait ClientHandler: Send {
    /// First request once the connection is up
    fn connection_established(&mut self) -> Option<Request>;

    fn newsgroups_listed(&mut self, status: StatusCode, newsgroups: Vec<Newsgroup>) -> Option<Request>;

    fn newsgroup_created(&mut self, status: StatusCode) -> Option<Request>;

    fn newsgroup_deleted(&mut self, status: StatusCode) -> Option<Request>;

    /// `articles` is empty unless `status` is `Success`
    fn articles_listed(&mut self, status: StatusCode, articles: Vec<ArticleSummary>) -> Option<Request>;

    fn article_created(&mut self, status: StatusCode) -> Option<Request>;

    fn article_deleted(&mut self, status: StatusCode) -> Option<Request>;

    /// `article` is present only when `status` is `Success`
    fn article_fetched(&mut self, status: StatusCode, article: Option<ArticleContent>) -> Option<Request>;

    fn connection_lost(&mut self) {}
}

pub struct ClientSession<H> {
    peer: ClientAddress,
    handler: H,
    decoder: FrameDecoder,
    pending: Option<Operation>,
    frames: Vec<Frame>,
}

impl<H: ClientHandler> ClientSession<H> {
    pub fn new(peer: ClientAddress, handler: H, max_string_length: MaxStringLength) -> Self {
        Self {
            peer,
            handler,
            decoder: FrameDecoder::new(max_string_length),
            pending: None,
            frames: Vec::new(),
        }
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    #[must_use]
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Operation whose answer is outstanding, if any
    #[must_use]
    pub fn awaiting(&self) -> Option<Operation> {
        self.pending
    }

    /// Send a request; only one may be outstanding at a time
    pub fn send_request(
        &mut self,
        request: Request,
        transport: &mut dyn Transport,
    ) -> Result<(), ProtocolError> {
        if let Some(pending) = self.pending {
            return Err(ProtocolError::RequestInFlight(pending));
        }
        let operation = request.operation();
        debug!(peer = %self.peer, %operation, "Sending request");
        request.encode(&mut Encoder::new(transport));
        self.pending = Some(operation);
        Ok(())
    }

    /// Process newly received bytes
    pub fn feed(&mut self, bytes: &[u8], transport: &mut dyn Transport) -> Result<(), ProtocolError> {
        let mut frames = Vec::new();
        let decoded = self.decoder.decode(bytes, &mut frames);
        for frame in frames {
            self.handle_frame(frame, transport)?;
        }
        decoded
    }

    fn handle_frame(&mut self, frame: Frame, transport: &mut dyn Transport) -> Result<(), ProtocolError> {
        let Some(expected) = self.pending else {
            return Err(ProtocolError::Unsolicited(frame.to_string()));
        };

        let is_end = frame == Frame::Identifier(Identifier::AnsEnd.as_byte());
        self.frames.push(frame);
        if !is_end {
            return Ok(());
        }

        let frames = mem::take(&mut self.frames);
        let response = Response::decode(&frames)?;
        if response.operation() != expected {
            return Err(ProtocolError::MismatchedAnswer {
                expected,
                actual: response.operation(),
            });
        }
        self.pending = None;

        match self.dispatch(response) {
            Some(next) => self.send_request(next, transport),
            None => {
                debug!(peer = %self.peer, "Client finished, closing connection");
                transport.close();
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, response: Response) -> Option<Request> {
        let status = response.status();
        match response {
            Response::ListNewsgroups(groups) => self.handler.newsgroups_listed(status, groups),
            Response::CreateNewsgroup(_) => self.handler.newsgroup_created(status),
            Response::DeleteNewsgroup(_) => self.handler.newsgroup_deleted(status),
            Response::ListArticles(outcome) => {
                self.handler.articles_listed(status, outcome.unwrap_or_default())
            }
            Response::CreateArticle(_) => self.handler.article_created(status),
            Response::DeleteArticle(_) => self.handler.article_deleted(status),
            Response::GetArticle(outcome) => self.handler.article_fetched(status, outcome.ok()),
        }
    }
}

impl<H: ClientHandler> Session for ClientSession<H> {
    fn connection_established(&mut self, transport: &mut dyn Transport) {
        debug!(peer = %self.peer, "Client session started");
        match self.handler.connection_established() {
            Some(request) => {
                if let Err(e) = self.send_request(request, transport) {
                    warn!(peer = %self.peer, error = %e, "Could not send first request");
                    transport.close();
                }
            }
            None => transport.close(),
        }
    }

    fn data_received(&mut self, transport: &mut dyn Transport) -> Result<(), ProtocolError> {
        let bytes = drain(transport);
        self.feed(&bytes, transport)
    }

    fn connection_lost(&mut self) {
        if let Some(operation) = self.pending.take() {
            warn!(peer = %self.peer, %operation, "Connection lost before the answer arrived");
        }
        self.frames.clear();
        self.decoder.reset();
        self.handler.connection_lost();
    }
}

/// Hands its single handler to the one session it creates
pub struct ClientSessionFactory<H> {
    handler: Option<H>,
    max_string_length: MaxStringLength,
}

impl<H> ClientSessionFactory<H> {
    pub fn new(handler: H, max_string_length: MaxStringLength) -> Self {
        Self {
            handler: Some(handler),
            max_string_length,
        }
    }
}

impl<H: ClientHandler> SessionFactory for ClientSessionFactory<H> {
    type Session = ClientSession<H>;

    fn create(&mut self, peer: ClientAddress) -> anyhow::Result<ClientSession<H>> {
        let Some(handler) = self.handler.take() else {
            bail!("client session factory already created its session");
        };
        Ok(ClientSession::new(peer, handler, self.max_string_length))
    }
}
