//! Black-box contract shared by every storage backend
//!
//! Each test body runs once against the in-memory backend and once against
//! a filesystem backend rooted in a fresh temporary directory.

use anyhow::Result;
use fusenet::storage::{ArticleContent, Database, FilesystemDatabase, MemoryDatabase, StatusCode};
use fusenet::types::{ArticleId, FileMode, NewsgroupId};
use tempfile::TempDir;

/// A backend plus whatever must outlive it
struct Fixture {
    db: Box<dyn Database>,
    _dir: Option<TempDir>,
}

fn memory() -> Result<Fixture> {
    Ok(Fixture {
        db: Box::new(MemoryDatabase::new()),
        _dir: None,
    })
}

fn filesystem() -> Result<Fixture> {
    let dir = tempfile::tempdir()?;
    let mut db = FilesystemDatabase::open(dir.path().join("db"), FileMode::DIRECTORY, FileMode::FILE)?;
    db.clear()?;
    Ok(Fixture {
        db: Box::new(db),
        _dir: Some(dir),
    })
}

fn orwell() -> ArticleContent {
    ArticleContent::new("1984", "George Orwell", "Big brother ...")
}

/// Fixture with one newsgroup named "foo"
fn with_group(fixture: Result<Fixture>) -> Result<(Fixture, NewsgroupId)> {
    let mut fixture = fixture?;
    fixture.db.create_newsgroup("foo")?;
    let groups = fixture.db.get_newsgroup_list()?;
    assert_eq!(groups.len(), 1);
    let id = groups[0].id;
    Ok((fixture, id))
}

fn status<T>(result: fusenet::storage::StorageResult<T>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::Success,
        Err(e) => e.status(),
    }
}

fn create_single(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    f.db.create_newsgroup("foo")?;
    assert_eq!(f.db.get_newsgroup_list()?.len(), 1);
    Ok(())
}

fn create_double(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    f.db.create_newsgroup("foo")?;
    assert_eq!(status(f.db.create_newsgroup("foo")), StatusCode::AlreadyExists);

    let groups = f.db.get_newsgroup_list()?;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "foo");

    f.db.create_newsgroup("bar")?;
    assert_eq!(f.db.get_newsgroup_list()?.len(), 2);
    Ok(())
}

fn create_is_case_sensitive(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    f.db.create_newsgroup("foo")?;
    f.db.create_newsgroup("Foo")?;
    assert_eq!(f.db.get_newsgroup_list()?.len(), 2);
    Ok(())
}

fn create_empty_name(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    f.db.create_newsgroup("")?;
    let groups = f.db.get_newsgroup_list()?;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "");
    Ok(())
}

fn list_empty(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    assert!(f.db.get_newsgroup_list()?.is_empty());
    Ok(())
}

fn list_sorted_by_id(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    let ids: Vec<_> = ["c", "a", "b"]
        .into_iter()
        .map(|name| f.db.create_newsgroup(name))
        .collect::<Result<_, _>>()?;

    let listed: Vec<_> = f.db.get_newsgroup_list()?.into_iter().map(|g| g.id).collect();
    assert_eq!(listed, ids);
    assert!(listed.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

fn delete_missing_group(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    assert_eq!(status(f.db.delete_newsgroup(NewsgroupId::new(0))), StatusCode::NewsgroupNotFound);
    assert_eq!(status(f.db.delete_newsgroup(NewsgroupId::new(-1))), StatusCode::NewsgroupNotFound);

    f.db.create_newsgroup("foo")?;
    assert_eq!(status(f.db.delete_newsgroup(NewsgroupId::new(-1))), StatusCode::NewsgroupNotFound);
    Ok(())
}

fn delete_group_with_articles(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    f.db.create_article(group, orwell())?;
    f.db.delete_newsgroup(group)?;

    assert!(f.db.get_newsgroup_list()?.is_empty());
    assert_eq!(status(f.db.list_articles(group)), StatusCode::NewsgroupNotFound);
    assert_eq!(status(f.db.delete_newsgroup(group)), StatusCode::NewsgroupNotFound);
    Ok(())
}

fn newsgroup_ids_never_reused(fixture: Result<Fixture>) -> Result<()> {
    let mut f = fixture?;
    let first = f.db.create_newsgroup("a")?;
    let second = f.db.create_newsgroup("b")?;
    f.db.delete_newsgroup(second)?;
    let third = f.db.create_newsgroup("b")?;

    assert!(third > second);
    assert_ne!(third, first);
    Ok(())
}

fn create_article_wrong_group(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    let missing = NewsgroupId::new(group.get() + 1);
    assert_eq!(status(f.db.create_article(missing, orwell())), StatusCode::NewsgroupNotFound);
    assert!(f.db.list_articles(group)?.is_empty());
    assert_eq!(f.db.get_newsgroup_list()?.len(), 1);
    Ok(())
}

fn create_article_right_group(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    assert!(f.db.list_articles(group)?.is_empty());
    f.db.create_article(group, orwell())?;
    assert_eq!(f.db.list_articles(group)?.len(), 1);
    Ok(())
}

fn article_id_increments_after_delete(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    f.db.create_article(group, orwell())?;
    let first = f.db.list_articles(group)?[0].id;

    f.db.delete_article(group, first)?;
    assert!(f.db.list_articles(group)?.is_empty());

    f.db.create_article(group, orwell())?;
    let articles = f.db.list_articles(group)?;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id, first.next());
    Ok(())
}

fn list_articles_missing_group(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    let missing = NewsgroupId::new(group.get() + 1);
    assert_eq!(status(f.db.list_articles(missing)), StatusCode::NewsgroupNotFound);
    assert!(f.db.list_articles(group)?.is_empty());
    Ok(())
}

fn delete_article_cases(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    let missing = NewsgroupId::new(group.get() + 1);
    assert_eq!(
        status(f.db.delete_article(missing, ArticleId::new(0))),
        StatusCode::NewsgroupNotFound
    );
    assert_eq!(
        status(f.db.delete_article(group, ArticleId::new(0))),
        StatusCode::ArticleNotFound
    );

    let id = f.db.create_article(group, orwell())?;
    f.db.delete_article(group, id)?;
    assert_eq!(status(f.db.delete_article(group, id)), StatusCode::ArticleNotFound);
    Ok(())
}

fn get_article_cases(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    let missing = NewsgroupId::new(group.get() + 1);
    assert_eq!(
        status(f.db.get_article(missing, ArticleId::new(0))),
        StatusCode::NewsgroupNotFound
    );
    assert_eq!(
        status(f.db.get_article(group, ArticleId::new(0))),
        StatusCode::ArticleNotFound
    );

    f.db.create_article(group, orwell())?;
    let id = f.db.list_articles(group)?[0].id;
    let article = f.db.get_article(group, id)?;
    assert_eq!(article.id, id);
    assert_eq!(article.title, "1984");
    assert_eq!(article.author, "George Orwell");
    assert_eq!(article.text, "Big brother ...");
    Ok(())
}

fn article_content_is_exact(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    let content = ArticleContent::new(
        "line one\nline two\\",
        "",
        "body\nwith\r\nnewlines\n\n\u{e5}\u{e4}\u{f6}\n",
    );
    let id = f.db.create_article(group, content.clone())?;
    assert_eq!(f.db.get_article(group, id)?.into_content(), content);
    Ok(())
}

fn articles_are_per_group(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, foo) = with_group(fixture)?;
    let bar = f.db.create_newsgroup("bar")?;
    f.db.create_article(foo, orwell())?;
    f.db.create_article(foo, orwell())?;
    f.db.create_article(bar, ArticleContent::new("t", "a", "x"))?;

    assert_eq!(f.db.list_articles(foo)?.len(), 2);
    let listed = f.db.list_articles(bar)?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "t");
    Ok(())
}

fn clear_empties_store(fixture: Result<Fixture>) -> Result<()> {
    let (mut f, group) = with_group(fixture)?;
    f.db.create_article(group, orwell())?;
    f.db.clear()?;
    assert!(f.db.get_newsgroup_list()?.is_empty());
    assert_eq!(status(f.db.get_article(group, ArticleId::new(0))), StatusCode::NewsgroupNotFound);
    Ok(())
}

macro_rules! contract {
    ($($name:ident),* $(,)?) => {
        mod memory_backend {
            $(
                #[test]
                fn $name() -> anyhow::Result<()> {
                    super::$name(super::memory())
                }
            )*
        }

        mod filesystem_backend {
            $(
                #[test]
                fn $name() -> anyhow::Result<()> {
                    super::$name(super::filesystem())
                }
            )*
        }
    };
}

contract!(
    create_single,
    create_double,
    create_is_case_sensitive,
    create_empty_name,
    list_empty,
    list_sorted_by_id,
    delete_missing_group,
    delete_group_with_articles,
    newsgroup_ids_never_reused,
    create_article_wrong_group,
    create_article_right_group,
    article_id_increments_after_delete,
    list_articles_missing_group,
    delete_article_cases,
    get_article_cases,
    article_content_is_exact,
    articles_are_per_group,
    clear_empties_store,
);
