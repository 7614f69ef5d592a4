//! Command-line argument parsing
//!
//! `fusenet server` runs the bulletin board; `fusenet client` connects to
//! one, performs a single operation and prints its outcome.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, StorageBackend};
use crate::constants;
use crate::protocol::Request;
use crate::storage::ArticleContent;
use crate::types::{ArticleId, HostName, NewsgroupId, Port, StorageRoot};

#[derive(Parser, Debug, Clone)]
#[command(name = "fusenet", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Serve newsgroups to any number of clients
    Server(ServerArgs),
    /// Perform one operation against a running server
    Client(ClientArgs),
}

/// Server arguments; each one overrides the config file
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Configuration file path (missing file means defaults)
    #[arg(short, long, default_value = constants::config::DEFAULT_PATH, env = "FUSENET_CONFIG")]
    pub config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "FUSENET_PORT")]
    pub port: Option<Port>,

    /// Host to bind to
    #[arg(long, env = "FUSENET_HOST")]
    pub host: Option<HostName>,

    /// Storage backend
    #[arg(short, long, value_enum, env = "FUSENET_STORAGE_BACKEND")]
    pub backend: Option<StorageBackend>,

    /// Root directory of the filesystem backend
    #[arg(short, long, env = "FUSENET_STORAGE_ROOT")]
    pub root: Option<StorageRoot>,
}

impl ServerArgs {
    /// Overlay the arguments that were given onto `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
        if let Some(root) = &self.root {
            config.storage.root = root.clone();
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Server host
    #[arg(long, default_value = constants::network::DEFAULT_CLIENT_HOST)]
    pub host: HostName,

    /// Server port
    #[arg(short, long, default_value_t = Port::DEFAULT)]
    pub port: Port,

    #[command(subcommand)]
    pub operation: Operation,
}

/// One request to send
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// List all newsgroups
    ListGroups,
    /// Create a newsgroup
    CreateGroup { name: String },
    /// Delete a newsgroup and its articles
    DeleteGroup { group: i32 },
    /// List the articles of a newsgroup
    ListArticles { group: i32 },
    /// Post an article to a newsgroup
    CreateArticle {
        group: i32,
        title: String,
        author: String,
        text: String,
    },
    /// Delete an article
    DeleteArticle { group: i32, article: i32 },
    /// Print an article
    GetArticle { group: i32, article: i32 },
}

impl Operation {
    #[must_use]
    pub fn into_request(self) -> Request {
        match self {
            Self::ListGroups => Request::ListNewsgroups,
            Self::CreateGroup { name } => Request::CreateNewsgroup { name },
            Self::DeleteGroup { group } => Request::DeleteNewsgroup {
                group: NewsgroupId::new(group),
            },
            Self::ListArticles { group } => Request::ListArticles {
                group: NewsgroupId::new(group),
            },
            Self::CreateArticle {
                group,
                title,
                author,
                text,
            } => Request::CreateArticle {
                group: NewsgroupId::new(group),
                content: ArticleContent::new(title, author, text),
            },
            Self::DeleteArticle { group, article } => Request::DeleteArticle {
                group: NewsgroupId::new(group),
                article: ArticleId::new(article),
            },
            Self::GetArticle { group, article } => Request::GetArticle {
                group: NewsgroupId::new(group),
                article: ArticleId::new(article),
            },
        }
    }
}
