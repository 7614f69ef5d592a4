//! In-process storage backend

use std::collections::BTreeMap;

use super::{Article, ArticleContent, Database, Newsgroup, StorageError, StorageResult};
use crate::types::{ArticleId, NewsgroupId};

#[derive(Debug)]
struct Group {
    name: String,
    articles: BTreeMap<ArticleId, ArticleContent>,
    next_article: ArticleId,
}

/// Newsgroups and articles kept in ordered maps
///
/// Each map is paired with a counter that only moves forward, so an id
/// handed out once is never handed out again, even after deletion.
#[derive(Debug)]
pub struct MemoryDatabase {
    groups: BTreeMap<NewsgroupId, Group>,
    next_group: NewsgroupId,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
            next_group: NewsgroupId::new(0),
        }
    }

    fn group(&self, id: NewsgroupId) -> StorageResult<&Group> {
        self.groups
            .get(&id)
            .ok_or(StorageError::NewsgroupNotFound(id))
    }

    fn group_mut(&mut self, id: NewsgroupId) -> StorageResult<&mut Group> {
        self.groups
            .get_mut(&id)
            .ok_or(StorageError::NewsgroupNotFound(id))
    }
}

impl Database for MemoryDatabase {
    fn get_newsgroup_list(&mut self) -> StorageResult<Vec<Newsgroup>> {
        Ok(self
            .groups
            .iter()
            .map(|(id, group)| Newsgroup::new(*id, group.name.clone()))
            .collect())
    }

    fn create_newsgroup(&mut self, name: &str) -> StorageResult<NewsgroupId> {
        if self.groups.values().any(|group| group.name == name) {
            return Err(StorageError::AlreadyExists);
        }
        if self.next_group.get() == i32::MAX {
            return Err(StorageError::Failure(
                "newsgroup id space exhausted".to_string(),
            ));
        }

        let id = self.next_group;
        self.next_group = id.next();
        self.groups.insert(
            id,
            Group {
                name: name.to_string(),
                articles: BTreeMap::new(),
                next_article: ArticleId::new(0),
            },
        );
        Ok(id)
    }

    fn delete_newsgroup(&mut self, group: NewsgroupId) -> StorageResult<()> {
        self.groups
            .remove(&group)
            .map(|_| ())
            .ok_or(StorageError::NewsgroupNotFound(group))
    }

    fn list_articles(&mut self, group: NewsgroupId) -> StorageResult<Vec<Article>> {
        let group = self.group(group)?;
        Ok(group
            .articles
            .iter()
            .map(|(id, content)| Article::from_content(*id, content.clone()))
            .collect())
    }

    fn create_article(
        &mut self,
        group: NewsgroupId,
        content: ArticleContent,
    ) -> StorageResult<ArticleId> {
        let group = self.group_mut(group)?;
        if group.next_article.get() == i32::MAX {
            return Err(StorageError::Failure(
                "article id space exhausted".to_string(),
            ));
        }

        let id = group.next_article;
        group.next_article = id.next();
        group.articles.insert(id, content);
        Ok(id)
    }

    fn delete_article(&mut self, group: NewsgroupId, article: ArticleId) -> StorageResult<()> {
        self.group_mut(group)?
            .articles
            .remove(&article)
            .map(|_| ())
            .ok_or(StorageError::ArticleNotFound { group, article })
    }

    fn get_article(&mut self, group: NewsgroupId, article: ArticleId) -> StorageResult<Article> {
        self.group(group)?
            .articles
            .get(&article)
            .map(|content| Article::from_content(article, content.clone()))
            .ok_or(StorageError::ArticleNotFound { group, article })
    }

    fn clear(&mut self) -> StorageResult<()> {
        *self = Self::new();
        Ok(())
    }
}
