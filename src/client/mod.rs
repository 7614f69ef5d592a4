//! One-shot client used by `fusenet client`
//!
//! Sends a single request, records the answer and closes the connection.

use std::fmt;

use anyhow::{Context, Result, anyhow};

use crate::protocol::{Operation, Request};
use crate::reactor::Reactor;
use crate::session::{ClientHandler, ClientSessionFactory};
use crate::storage::{ArticleContent, ArticleSummary, Newsgroup, StatusCode};
use crate::types::{MaxStringLength, Port, ReadBufferSize};

/// What the server answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOutcome {
    Newsgroups(Vec<Newsgroup>),
    Articles(Vec<ArticleSummary>),
    Article(ArticleContent),
    /// A mutation succeeded
    Done(Operation),
    Failed {
        operation: Operation,
        status: StatusCode,
    },
}

impl ClientOutcome {
    fn from_status(operation: Operation, status: StatusCode) -> Self {
        if status.is_success() {
            Self::Done(operation)
        } else {
            Self::Failed { operation, status }
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Failed { status, .. } => *status,
            _ => StatusCode::Success,
        }
    }
}

impl fmt::Display for ClientOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Newsgroups(groups) if groups.is_empty() => write!(f, "No newsgroups"),
            Self::Newsgroups(groups) => {
                for (i, group) in groups.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{:>6}  {}", group.id.get(), group.name)?;
                }
                Ok(())
            }
            Self::Articles(articles) if articles.is_empty() => write!(f, "No articles"),
            Self::Articles(articles) => {
                for (i, article) in articles.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{:>6}  {}", article.id.get(), article.title)?;
                }
                Ok(())
            }
            Self::Article(article) => write!(
                f,
                "Title:  {}\nAuthor: {}\n\n{}",
                article.title, article.author, article.text
            ),
            Self::Done(operation) => write!(f, "{}: {}", operation, StatusCode::Success),
            Self::Failed { operation, status } => write!(f, "{}: {}", operation, status),
        }
    }
}

/// Handler that sends one request and stops after its answer
#[derive(Debug)]
pub struct OneShotClient {
    request: Option<Request>,
    outcome: Option<ClientOutcome>,
}

impl OneShotClient {
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            request: Some(request),
            outcome: None,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&ClientOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn into_outcome(self) -> Option<ClientOutcome> {
        self.outcome
    }

    fn finish(&mut self, outcome: ClientOutcome) -> Option<Request> {
        self.outcome = Some(outcome);
        None
    }
}

impl ClientHandler for OneShotClient {
    fn connection_established(&mut self) -> Option<Request> {
        self.request.take()
    }

    fn newsgroups_listed(&mut self, _status: StatusCode, newsgroups: Vec<Newsgroup>) -> Option<Request> {
        self.finish(ClientOutcome::Newsgroups(newsgroups))
    }

    fn newsgroup_created(&mut self, status: StatusCode) -> Option<Request> {
        self.finish(ClientOutcome::from_status(Operation::CreateNewsgroup, status))
    }

    fn newsgroup_deleted(&mut self, status: StatusCode) -> Option<Request> {
        self.finish(ClientOutcome::from_status(Operation::DeleteNewsgroup, status))
    }

    fn articles_listed(&mut self, status: StatusCode, articles: Vec<ArticleSummary>) -> Option<Request> {
        let outcome = if status.is_success() {
            ClientOutcome::Articles(articles)
        } else {
            ClientOutcome::from_status(Operation::ListArticles, status)
        };
        self.finish(outcome)
    }

    fn article_created(&mut self, status: StatusCode) -> Option<Request> {
        self.finish(ClientOutcome::from_status(Operation::CreateArticle, status))
    }

    fn article_deleted(&mut self, status: StatusCode) -> Option<Request> {
        self.finish(ClientOutcome::from_status(Operation::DeleteArticle, status))
    }

    fn article_fetched(&mut self, status: StatusCode, article: Option<ArticleContent>) -> Option<Request> {
        let outcome = match article {
            Some(article) if status.is_success() => ClientOutcome::Article(article),
            _ => ClientOutcome::Failed {
                operation: Operation::GetArticle,
                status: if status.is_success() {
                    StatusCode::Failure
                } else {
                    status
                },
            },
        };
        self.finish(outcome)
    }
}

/// Connect to `host:port`, perform `request` and return the server's answer
pub async fn run(
    host: &str,
    port: Port,
    request: Request,
    max_string_length: MaxStringLength,
) -> Result<ClientOutcome> {
    let operation = request.operation();
    let factory = ClientSessionFactory::new(OneShotClient::new(request), max_string_length);
    let mut reactor = Reactor::new(factory, ReadBufferSize::DEFAULT);

    let session = reactor
        .initiate(host, port)
        .await
        .with_context(|| format!("Failed to {} on {}:{}", operation, host, port))?;

    session
        .into_handler()
        .into_outcome()
        .ok_or_else(|| anyhow!("Connection closed before the server answered the {} request", operation))
}
