//! Records stored by the engine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ArticleId, NewsgroupId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Newsgroup {
    pub id: NewsgroupId,
    pub name: String,
}

impl Newsgroup {
    pub fn new(id: NewsgroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Title, author and body of an article, without an id
///
/// This is what a client submits when creating an article and what it
/// receives back when fetching one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleContent {
    pub title: String,
    pub author: String,
    pub text: String,
}

impl ArticleContent {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            text: text.into(),
        }
    }
}

/// A stored article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub author: String,
    pub text: String,
}

impl Article {
    #[must_use]
    pub fn from_content(id: ArticleId, content: ArticleContent) -> Self {
        let ArticleContent {
            title,
            author,
            text,
        } = content;
        Self {
            id,
            title,
            author,
            text,
        }
    }

    #[must_use]
    pub fn into_content(self) -> ArticleContent {
        ArticleContent {
            title: self.title,
            author: self.author,
            text: self.text,
        }
    }

    /// Id and title only, as sent in article listings
    #[must_use]
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

/// One row of an article listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: ArticleId,
    pub title: String,
}

/// Outcome of a storage operation as seen by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    Failure,
    AlreadyExists,
    NewsgroupNotFound,
    ArticleNotFound,
}

impl StatusCode {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Human-readable description shown to users
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "Operation successful",
            Self::Failure => "Operation failed",
            Self::AlreadyExists => "Operation failed, item already exists",
            Self::NewsgroupNotFound => "Operation failed, no such newsgroup",
            Self::ArticleNotFound => "Operation failed, no such article",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_content_round_trip() {
        let content = ArticleContent::new("1984", "George Orwell", "Big brother ...");
        let article = Article::from_content(ArticleId::new(3), content.clone());
        assert_eq!(article.id, ArticleId::new(3));
        assert_eq!(article.title, "1984");
        assert_eq!(article.summary().title, "1984");
        assert_eq!(article.into_content(), content);
    }

    #[test]
    fn test_status_messages() {
        assert!(StatusCode::Success.is_success());
        assert!(!StatusCode::Failure.is_success());
        assert_eq!(
            StatusCode::NewsgroupNotFound.to_string(),
            "Operation failed, no such newsgroup"
        );
        assert_eq!(
            StatusCode::AlreadyExists.to_string(),
            "Operation failed, item already exists"
        );
    }
}
