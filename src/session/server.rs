//! Server side of the protocol
//!
//! Request lifecycle:
//!
//! ```text
//! Idle --command--> Decoding { operation, parameters } --END--> execute --> respond --> Idle
//! ```
//!
//! Executing and responding happen inside a single call and never wait on
//! I/O, so they need no state of their own. A request is only handed to
//! storage once its end marker has arrived.

use std::mem;

use tracing::{debug, error, warn};

use super::{Session, SessionFactory, drain};
use crate::protocol::{
    Encoder, Frame, FrameCursor, FrameDecoder, Identifier, Operation, ProtocolError,
    RawIdentifier, Request, Response,
};
use crate::storage::{self, Article, Database, SharedDatabase, StatusCode, StorageError};
use crate::transport::Transport;
use crate::types::{ClientAddress, MaxStringLength};

/// Where the session is in the current request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerState {
    /// No request in flight; only a command identifier starts one
    #[default]
    Idle,
    /// Collecting the fixed parameter list of `operation`
    Decoding {
        operation: Operation,
        parameters: Vec<Frame>,
    },
}

/// Answers requests from one client against the shared database
pub struct ServerSession {
    peer: ClientAddress,
    database: SharedDatabase,
    decoder: FrameDecoder,
    state: ServerState,
}

impl ServerSession {
    pub fn new(
        peer: ClientAddress,
        database: SharedDatabase,
        max_string_length: MaxStringLength,
    ) -> Self {
        Self {
            peer,
            database,
            decoder: FrameDecoder::new(max_string_length),
            state: ServerState::Idle,
        }
    }

    #[must_use]
    pub fn peer(&self) -> ClientAddress {
        self.peer
    }

    #[must_use]
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Process newly received bytes, queueing any complete responses
    pub fn feed(&mut self, bytes: &[u8], transport: &mut dyn Transport) -> Result<(), ProtocolError> {
        let mut frames = Vec::new();
        let decoded = self.decoder.decode(bytes, &mut frames);
        for frame in frames {
            self.handle_frame(frame, transport)?;
        }
        decoded
    }

    fn handle_frame(&mut self, frame: Frame, transport: &mut dyn Transport) -> Result<(), ProtocolError> {
        let ServerState::Decoding {
            operation,
            parameters,
        } = &mut self.state
        else {
            self.start_request(frame);
            return Ok(());
        };

        let operation = *operation;
        let expected = operation.parameters();
        match frame {
            Frame::Identifier(byte) if parameters.len() < expected.len() => {
                if byte == Identifier::ComEnd.as_byte() {
                    Err(ProtocolError::MissingParameters {
                        operation,
                        expected: expected.len(),
                        received: parameters.len(),
                    })
                } else {
                    Err(ProtocolError::ParameterMismatch {
                        operation,
                        position: parameters.len(),
                        expected: expected[parameters.len()],
                        actual: Frame::Identifier(byte).to_string(),
                    })
                }
            }
            Frame::Identifier(byte) if byte == Identifier::ComEnd.as_byte() => {
                let parameters = mem::take(parameters);
                self.state = ServerState::Idle;
                self.complete_request(operation, &parameters, transport)
            }
            Frame::Identifier(byte) => Err(ProtocolError::UnexpectedIdentifier {
                expected: Identifier::ComEnd,
                actual: RawIdentifier(byte),
            }),
            parameter => {
                let position = parameters.len();
                let Some(&kind) = expected.get(position) else {
                    return Err(ProtocolError::TooManyParameters {
                        operation,
                        expected: expected.len(),
                    });
                };
                if parameter.parameter_kind() != Some(kind) {
                    return Err(ProtocolError::ParameterMismatch {
                        operation,
                        position,
                        expected: kind,
                        actual: parameter.to_string(),
                    });
                }
                parameters.push(parameter);
                Ok(())
            }
        }
    }

    /// Handle a frame while idle: a command opens a request, anything else
    /// is reported and dropped
    fn start_request(&mut self, frame: Frame) {
        match frame {
            Frame::Identifier(byte) => {
                match Identifier::try_from(byte).ok().and_then(Operation::from_command) {
                    Some(operation) => {
                        debug!(peer = %self.peer, %operation, "Decoding request");
                        self.state = ServerState::Decoding {
                            operation,
                            parameters: Vec::with_capacity(operation.parameters().len()),
                        };
                    }
                    None => warn!(
                        peer = %self.peer,
                        identifier = %RawIdentifier(byte),
                        "Discarding identifier received outside a request"
                    ),
                }
            }
            other => warn!(
                peer = %self.peer,
                frame = %other,
                "Discarding parameter received outside a request"
            ),
        }
    }

    fn complete_request(
        &mut self,
        operation: Operation,
        parameters: &[Frame],
        transport: &mut dyn Transport,
    ) -> Result<(), ProtocolError> {
        let request = Request::from_parameters(operation, &mut FrameCursor::new(parameters))?;
        if transport.is_backlogged() {
            return Err(ProtocolError::OutputBacklog {
                operation,
                unsent: transport.output_backlog(),
            });
        }
        let response = self.execute(request);
        debug!(
            peer = %self.peer,
            %operation,
            status = ?response.status(),
            "Answering request"
        );
        response.encode(&mut Encoder::new(transport));
        Ok(())
    }

    fn execute(&self, request: Request) -> Response {
        match storage::lock(&self.database) {
            Ok(mut database) => execute_on(&mut *database, request, self.peer),
            Err(e) => {
                error!(peer = %self.peer, error = %e, "Storage unavailable");
                failure_response(request.operation(), e.status())
            }
        }
    }
}

/// Response for an operation that could not reach storage at all
fn failure_response(operation: Operation, status: StatusCode) -> Response {
    match operation {
        Operation::ListNewsgroups => Response::ListNewsgroups(Vec::new()),
        Operation::CreateNewsgroup => Response::CreateNewsgroup(Err(status)),
        Operation::DeleteNewsgroup => Response::DeleteNewsgroup(Err(status)),
        Operation::ListArticles => Response::ListArticles(Err(status)),
        Operation::CreateArticle => Response::CreateArticle(Err(status)),
        Operation::DeleteArticle => Response::DeleteArticle(Err(status)),
        Operation::GetArticle => Response::GetArticle(Err(status)),
    }
}

fn execute_on(database: &mut dyn Database, request: Request, peer: ClientAddress) -> Response {
    let report = |e: StorageError| {
        match e.status() {
            StatusCode::Failure => warn!(%peer, error = %e, "Storage operation failed"),
            _ => debug!(%peer, error = %e, "Storage operation rejected"),
        }
        e.status()
    };

    match request {
        Request::ListNewsgroups => {
            // The answer has no failure form, so a failed listing reads as empty
            let groups = database.get_newsgroup_list().unwrap_or_else(|e| {
                warn!(%peer, error = %e, "Listing newsgroups failed");
                Vec::new()
            });
            Response::ListNewsgroups(groups)
        }
        Request::CreateNewsgroup { name } => {
            Response::CreateNewsgroup(database.create_newsgroup(&name).map(drop).map_err(report))
        }
        Request::DeleteNewsgroup { group } => {
            Response::DeleteNewsgroup(database.delete_newsgroup(group).map_err(report))
        }
        Request::ListArticles { group } => Response::ListArticles(
            database
                .list_articles(group)
                .map(|articles| articles.iter().map(Article::summary).collect())
                .map_err(report),
        ),
        Request::CreateArticle { group, content } => Response::CreateArticle(
            database
                .create_article(group, content)
                .map(drop)
                .map_err(report),
        ),
        Request::DeleteArticle { group, article } => {
            Response::DeleteArticle(database.delete_article(group, article).map_err(report))
        }
        Request::GetArticle { group, article } => Response::GetArticle(
            database
                .get_article(group, article)
                .map(Article::into_content)
                .map_err(report),
        ),
    }
}

impl Session for ServerSession {
    fn connection_established(&mut self, _transport: &mut dyn Transport) {
        debug!(peer = %self.peer, "Server session started");
    }

    fn data_received(&mut self, transport: &mut dyn Transport) -> Result<(), ProtocolError> {
        let bytes = drain(transport);
        self.feed(&bytes, transport)
    }

    fn connection_lost(&mut self) {
        if let ServerState::Decoding { operation, .. } = &self.state {
            debug!(peer = %self.peer, %operation, "Discarding partially received request");
        }
        self.state = ServerState::Idle;
        self.decoder.reset();
    }
}

/// Builds one [`ServerSession`] per accepted connection
#[derive(Clone)]
pub struct ServerSessionFactory {
    database: SharedDatabase,
    max_string_length: MaxStringLength,
}

impl ServerSessionFactory {
    pub fn new(database: SharedDatabase, max_string_length: MaxStringLength) -> Self {
        Self {
            database,
            max_string_length,
        }
    }
}

impl SessionFactory for ServerSessionFactory {
    type Session = ServerSession;

    fn create(&mut self, peer: ClientAddress) -> anyhow::Result<ServerSession> {
        Ok(ServerSession::new(
            peer,
            self.database.clone(),
            self.max_string_length,
        ))
    }
}
