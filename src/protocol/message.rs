//! Typed requests and responses
//!
//! Byte order of every response:
//!
//! | Operation | Frames |
//! |---|---|
//! | list newsgroups | `ANS_LIST_NG, NUM(n), {NUM(id), STR(name)}*n, ANS_END` |
//! | create/delete newsgroup, create/delete article | `ANS_<op>, ANS_ACK, ANS_END` or `ANS_<op>, ANS_NAK, ERR_*, ANS_END` |
//! | list articles | `ANS_LIST_ART, ANS_ACK, NUM(n), {NUM(id), STR(title)}*n, ANS_END` or the NAK form |
//! | get article | `ANS_GET_ART, ANS_ACK, STR(title), STR(author), STR(text), ANS_END` or the NAK form |

use super::codec::{Encoder, FrameCursor};
use super::error::ProtocolError;
use super::frame::Frame;
use super::identifiers::{Identifier, Operation, RawIdentifier};
use crate::storage::{ArticleContent, ArticleSummary, Newsgroup, StatusCode};
use crate::types::{ArticleId, NewsgroupId};

/// Error identifier sent after `ANS_NAK` for a failed operation
///
/// Generic failures get their own `ERR_INTERNAL_FAILURE` code instead of
/// borrowing a not-found code.
#[must_use]
pub const fn error_identifier(status: StatusCode) -> Identifier {
    match status {
        StatusCode::AlreadyExists => Identifier::ErrNgAlreadyExists,
        StatusCode::NewsgroupNotFound => Identifier::ErrNgDoesNotExist,
        StatusCode::ArticleNotFound => Identifier::ErrArtDoesNotExist,
        StatusCode::Failure | StatusCode::Success => Identifier::ErrInternalFailure,
    }
}

/// Status carried by an error identifier; unknown bytes read as `Failure`
#[must_use]
pub fn status_from_error(byte: u8) -> StatusCode {
    match Identifier::try_from(byte) {
        Ok(Identifier::ErrNgAlreadyExists) => StatusCode::AlreadyExists,
        Ok(Identifier::ErrNgDoesNotExist) => StatusCode::NewsgroupNotFound,
        Ok(Identifier::ErrArtDoesNotExist) => StatusCode::ArticleNotFound,
        _ => StatusCode::Failure,
    }
}

/// A client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListNewsgroups,
    CreateNewsgroup {
        name: String,
    },
    DeleteNewsgroup {
        group: NewsgroupId,
    },
    ListArticles {
        group: NewsgroupId,
    },
    CreateArticle {
        group: NewsgroupId,
        content: ArticleContent,
    },
    DeleteArticle {
        group: NewsgroupId,
        article: ArticleId,
    },
    GetArticle {
        group: NewsgroupId,
        article: ArticleId,
    },
}

impl Request {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::ListNewsgroups => Operation::ListNewsgroups,
            Self::CreateNewsgroup { .. } => Operation::CreateNewsgroup,
            Self::DeleteNewsgroup { .. } => Operation::DeleteNewsgroup,
            Self::ListArticles { .. } => Operation::ListArticles,
            Self::CreateArticle { .. } => Operation::CreateArticle,
            Self::DeleteArticle { .. } => Operation::DeleteArticle,
            Self::GetArticle { .. } => Operation::GetArticle,
        }
    }

    /// Write the complete command sequence, end marker included
    pub fn encode(&self, encoder: &mut Encoder<'_>) {
        encoder.send_command(self.operation().command());
        match self {
            Self::ListNewsgroups => {}
            Self::CreateNewsgroup { name } => encoder.send_string(name),
            Self::DeleteNewsgroup { group } | Self::ListArticles { group } => {
                encoder.send_number(group.get());
            }
            Self::CreateArticle { group, content } => {
                encoder.send_number(group.get());
                encoder.send_string(&content.title);
                encoder.send_string(&content.author);
                encoder.send_string(&content.text);
            }
            Self::DeleteArticle { group, article } | Self::GetArticle { group, article } => {
                encoder.send_number(group.get());
                encoder.send_number(article.get());
            }
        }
        encoder.send_command(Identifier::ComEnd);
    }

    /// Build a request from its parameter frames (command and end marker
    /// excluded)
    pub fn from_parameters(
        operation: Operation,
        cursor: &mut FrameCursor<'_>,
    ) -> Result<Self, ProtocolError> {
        let request = match operation {
            Operation::ListNewsgroups => Self::ListNewsgroups,
            Operation::CreateNewsgroup => Self::CreateNewsgroup {
                name: cursor.receive_string()?,
            },
            Operation::DeleteNewsgroup => Self::DeleteNewsgroup {
                group: NewsgroupId::new(cursor.receive_number()?),
            },
            Operation::ListArticles => Self::ListArticles {
                group: NewsgroupId::new(cursor.receive_number()?),
            },
            Operation::CreateArticle => {
                let group = NewsgroupId::new(cursor.receive_number()?);
                let title = cursor.receive_string()?;
                let author = cursor.receive_string()?;
                let text = cursor.receive_string()?;
                Self::CreateArticle {
                    group,
                    content: ArticleContent {
                        title,
                        author,
                        text,
                    },
                }
            }
            Operation::DeleteArticle => Self::DeleteArticle {
                group: NewsgroupId::new(cursor.receive_number()?),
                article: ArticleId::new(cursor.receive_number()?),
            },
            Operation::GetArticle => Self::GetArticle {
                group: NewsgroupId::new(cursor.receive_number()?),
                article: ArticleId::new(cursor.receive_number()?),
            },
        };
        cursor.finish()?;
        Ok(request)
    }

    /// Parse a complete command sequence
    pub fn decode(frames: &[Frame]) -> Result<Self, ProtocolError> {
        let (last, body) = frames
            .split_last()
            .ok_or(ProtocolError::Truncated("a command identifier"))?;
        let mut cursor = FrameCursor::new(body);
        let command = cursor.receive_command()?;
        let operation = Identifier::try_from(command)
            .ok()
            .and_then(Operation::from_command)
            .ok_or_else(|| ProtocolError::UnexpectedFrame {
                expected: "a command identifier",
                actual: Frame::Identifier(command).to_string(),
            })?;
        let request = Self::from_parameters(operation, &mut cursor)?;

        match last {
            Frame::Identifier(byte) if *byte == Identifier::ComEnd.as_byte() => Ok(request),
            Frame::Identifier(byte) => Err(ProtocolError::UnexpectedIdentifier {
                expected: Identifier::ComEnd,
                actual: RawIdentifier(*byte),
            }),
            other => Err(ProtocolError::UnexpectedFrame {
                expected: "COM_END",
                actual: other.to_string(),
            }),
        }
    }
}

/// A server response; failures carry the status reported by storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    ListNewsgroups(Vec<Newsgroup>),
    CreateNewsgroup(Result<(), StatusCode>),
    DeleteNewsgroup(Result<(), StatusCode>),
    ListArticles(Result<Vec<ArticleSummary>, StatusCode>),
    CreateArticle(Result<(), StatusCode>),
    DeleteArticle(Result<(), StatusCode>),
    GetArticle(Result<ArticleContent, StatusCode>),
}

fn status_of<T>(outcome: &Result<T, StatusCode>) -> StatusCode {
    match outcome {
        Ok(_) => StatusCode::Success,
        Err(status) => *status,
    }
}

fn encode_outcome<T>(
    encoder: &mut Encoder<'_>,
    outcome: &Result<T, StatusCode>,
    body: impl FnOnce(&mut Encoder<'_>, &T),
) {
    match outcome {
        Ok(value) => {
            encoder.send_command(Identifier::AnsAck);
            body(encoder, value);
        }
        Err(status) => {
            encoder.send_command(Identifier::AnsNak);
            encoder.send_command(error_identifier(*status));
        }
    }
}

fn decode_outcome<'a, T>(
    cursor: &mut FrameCursor<'a>,
    body: impl FnOnce(&mut FrameCursor<'a>) -> Result<T, ProtocolError>,
) -> Result<Result<T, StatusCode>, ProtocolError> {
    let marker = cursor.receive_command()?;
    if marker == Identifier::AnsAck.as_byte() {
        body(cursor).map(Ok)
    } else if marker == Identifier::AnsNak.as_byte() {
        Ok(Err(status_from_error(cursor.receive_command()?)))
    } else {
        Err(ProtocolError::UnexpectedIdentifier {
            expected: Identifier::AnsAck,
            actual: RawIdentifier(marker),
        })
    }
}

fn no_payload(_: &mut FrameCursor<'_>) -> Result<(), ProtocolError> {
    Ok(())
}

impl Response {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::ListNewsgroups(_) => Operation::ListNewsgroups,
            Self::CreateNewsgroup(_) => Operation::CreateNewsgroup,
            Self::DeleteNewsgroup(_) => Operation::DeleteNewsgroup,
            Self::ListArticles(_) => Operation::ListArticles,
            Self::CreateArticle(_) => Operation::CreateArticle,
            Self::DeleteArticle(_) => Operation::DeleteArticle,
            Self::GetArticle(_) => Operation::GetArticle,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ListNewsgroups(_) => StatusCode::Success,
            Self::CreateNewsgroup(outcome)
            | Self::DeleteNewsgroup(outcome)
            | Self::CreateArticle(outcome)
            | Self::DeleteArticle(outcome) => status_of(outcome),
            Self::ListArticles(outcome) => status_of(outcome),
            Self::GetArticle(outcome) => status_of(outcome),
        }
    }

    /// Write the complete answer sequence, end marker included
    pub fn encode(&self, encoder: &mut Encoder<'_>) {
        encoder.send_command(self.operation().answer());
        match self {
            Self::ListNewsgroups(groups) => {
                encoder.send_count(groups.len());
                for group in groups {
                    encoder.send_number(group.id.get());
                    encoder.send_string(&group.name);
                }
            }
            Self::CreateNewsgroup(outcome)
            | Self::DeleteNewsgroup(outcome)
            | Self::CreateArticle(outcome)
            | Self::DeleteArticle(outcome) => encode_outcome(encoder, outcome, |_, _| {}),
            Self::ListArticles(outcome) => encode_outcome(encoder, outcome, |encoder, articles| {
                encoder.send_count(articles.len());
                for article in articles {
                    encoder.send_number(article.id.get());
                    encoder.send_string(&article.title);
                }
            }),
            Self::GetArticle(outcome) => encode_outcome(encoder, outcome, |encoder, content| {
                encoder.send_string(&content.title);
                encoder.send_string(&content.author);
                encoder.send_string(&content.text);
            }),
        }
        encoder.send_command(Identifier::AnsEnd);
    }

    /// Parse a complete answer sequence
    pub fn decode(frames: &[Frame]) -> Result<Self, ProtocolError> {
        let mut cursor = FrameCursor::new(frames);
        let answer = cursor.receive_command()?;
        let operation = Identifier::try_from(answer)
            .ok()
            .and_then(Operation::from_answer)
            .ok_or_else(|| ProtocolError::UnexpectedFrame {
                expected: "an answer identifier",
                actual: Frame::Identifier(answer).to_string(),
            })?;

        let response = match operation {
            Operation::ListNewsgroups => {
                let count = cursor.receive_count()?;
                let mut groups = Vec::new();
                for _ in 0..count {
                    let id = NewsgroupId::new(cursor.receive_number()?);
                    groups.push(Newsgroup::new(id, cursor.receive_string()?));
                }
                Self::ListNewsgroups(groups)
            }
            Operation::CreateNewsgroup => {
                Self::CreateNewsgroup(decode_outcome(&mut cursor, no_payload)?)
            }
            Operation::DeleteNewsgroup => {
                Self::DeleteNewsgroup(decode_outcome(&mut cursor, no_payload)?)
            }
            Operation::CreateArticle => {
                Self::CreateArticle(decode_outcome(&mut cursor, no_payload)?)
            }
            Operation::DeleteArticle => {
                Self::DeleteArticle(decode_outcome(&mut cursor, no_payload)?)
            }
            Operation::ListArticles => Self::ListArticles(decode_outcome(&mut cursor, |cursor| {
                let count = cursor.receive_count()?;
                let mut articles = Vec::new();
                for _ in 0..count {
                    let id = ArticleId::new(cursor.receive_number()?);
                    articles.push(ArticleSummary {
                        id,
                        title: cursor.receive_string()?,
                    });
                }
                Ok(articles)
            })?),
            Operation::GetArticle => Self::GetArticle(decode_outcome(&mut cursor, |cursor| {
                Ok(ArticleContent {
                    title: cursor.receive_string()?,
                    author: cursor.receive_string()?,
                    text: cursor.receive_string()?,
                })
            })?),
        };

        cursor.expect_command(Identifier::AnsEnd)?;
        cursor.finish()?;
        Ok(response)
    }
}
