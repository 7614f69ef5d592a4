//! On-disk storage backend
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<newsgroup-id>/meta           newsgroup name, raw
//! <root>/<newsgroup-id>/<article-id>   title line, author line, byte count line, body
//! <root>/.next                         next newsgroup id
//! <root>/<newsgroup-id>/.next          next article id
//! ```
//!
//! Id allocation takes the larger of (largest numeric entry + 1) and the
//! `.next` high-water mark, then bumps the mark. Deleting the newest entry
//! therefore never frees its id for reuse.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Article, ArticleContent, Database, Newsgroup, StorageError, StorageResult};
use crate::constants::storage::{META_FILE, NEXT_ID_FILE};
use crate::types::{ArticleId, FileMode, NewsgroupId};

#[derive(Debug)]
pub struct FilesystemDatabase {
    root: PathBuf,
    dir_mode: FileMode,
    file_mode: FileMode,
}

impl FilesystemDatabase {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(
        root: impl Into<PathBuf>,
        dir_mode: FileMode,
        file_mode: FileMode,
    ) -> StorageResult<Self> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(StorageError::Failure(format!(
                "{} exists and is not a directory",
                root.display()
            )));
        }

        let db = Self {
            root,
            dir_mode,
            file_mode,
        };
        db.dir_builder().recursive(true).create(&db.root)?;
        debug!(root = %db.root.display(), "Opened filesystem storage");
        Ok(db)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_builder(&self) -> DirBuilder {
        let mut builder = DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.dir_mode.get());
        }
        builder
    }

    fn file_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.file_mode.get());
        }
        options
    }

    /// Write a file that must not exist yet
    fn write_new_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = self.file_options().create_new(true).open(path)?;
        file.write_all(contents)
    }

    fn overwrite_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = self
            .file_options()
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(contents)
    }

    fn group_path(&self, group: NewsgroupId) -> PathBuf {
        self.root.join(group.to_string())
    }

    /// Directory of an existing newsgroup
    fn group_dir(&self, group: NewsgroupId) -> StorageResult<PathBuf> {
        let path = self.group_path(group);
        if path.is_dir() {
            Ok(path)
        } else {
            Err(StorageError::NewsgroupNotFound(group))
        }
    }

    /// File of an existing article
    fn article_file(&self, group: NewsgroupId, article: ArticleId) -> StorageResult<PathBuf> {
        let path = self.group_dir(group)?.join(article.to_string());
        if path.is_file() {
            Ok(path)
        } else {
            Err(StorageError::ArticleNotFound { group, article })
        }
    }

    /// Name of the newsgroup stored in `dir`, or `None` if its meta file
    /// is missing
    fn read_newsgroup_name(dir: &Path) -> StorageResult<Option<String>> {
        match fs::read_to_string(dir.join(META_FILE)) {
            Ok(name) => Ok(Some(name)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reserve the next id for an entry of `dir`
    fn allocate_id(&self, dir: &Path) -> StorageResult<i32> {
        let marker = dir.join(NEXT_ID_FILE);
        let recorded = match fs::read_to_string(&marker) {
            Ok(text) => text.trim().parse::<i32>().map_err(|_| {
                StorageError::Failure(format!("corrupt id marker {}", marker.display()))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let after_largest = match numeric_entries(dir)?.last() {
            Some((largest, _)) => largest.saturating_add(1),
            None => 0,
        };

        let id = recorded.max(after_largest);
        if id == i32::MAX {
            return Err(StorageError::Failure(format!(
                "id space exhausted in {}",
                dir.display()
            )));
        }
        self.overwrite_file(&marker, (id + 1).to_string().as_bytes())?;
        Ok(id)
    }
}

/// Entries of `dir` whose names are non-negative decimal ids, sorted by id
fn numeric_entries(dir: &Path) -> StorageResult<Vec<(i32, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(id) = entry.file_name().to_str().and_then(parse_id) {
            entries.push((id, entry.path()));
        }
    }
    entries.sort_unstable_by_key(|(id, _)| *id);
    Ok(entries)
}

/// Parse a canonical decimal id ("7", not "07" or "+7")
fn parse_id(name: &str) -> Option<i32> {
    let id: i32 = name.parse().ok()?;
    (id >= 0 && id.to_string() == name).then_some(id)
}

fn escape_line(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_line(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('\\') => unescaped.push('\\'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

fn encode_article(content: &ArticleContent) -> Vec<u8> {
    let mut bytes = format!(
        "{}\n{}\n{}\n",
        escape_line(&content.title),
        escape_line(&content.author),
        content.text.len()
    )
    .into_bytes();
    bytes.extend_from_slice(content.text.as_bytes());
    bytes
}

fn split_line(input: &[u8]) -> Option<(&[u8], &[u8])> {
    let end = input.iter().position(|&b| b == b'\n')?;
    Some((&input[..end], &input[end + 1..]))
}

fn decode_article(id: ArticleId, bytes: &[u8]) -> StorageResult<Article> {
    let corrupt = |what: &str| StorageError::Failure(format!("corrupt article file {id}: {what}"));
    let utf8 = |raw: &[u8]| {
        String::from_utf8(raw.to_vec()).map_err(|_| corrupt("not valid UTF-8"))
    };

    let (title, rest) = split_line(bytes).ok_or_else(|| corrupt("missing title line"))?;
    let (author, rest) = split_line(rest).ok_or_else(|| corrupt("missing author line"))?;
    let (length, body) = split_line(rest).ok_or_else(|| corrupt("missing byte count line"))?;
    let length: usize = std::str::from_utf8(length)
        .ok()
        .and_then(|text| text.trim().parse().ok())
        .ok_or_else(|| corrupt("invalid byte count"))?;
    let body = body.get(..length).ok_or_else(|| corrupt("truncated body"))?;

    Ok(Article {
        id,
        title: unescape_line(&utf8(title)?),
        author: unescape_line(&utf8(author)?),
        text: utf8(body)?,
    })
}

impl Database for FilesystemDatabase {
    fn get_newsgroup_list(&mut self) -> StorageResult<Vec<Newsgroup>> {
        let mut groups = Vec::new();
        for (id, path) in numeric_entries(&self.root)? {
            if !path.is_dir() {
                continue;
            }
            match Self::read_newsgroup_name(&path)? {
                Some(name) => groups.push(Newsgroup::new(NewsgroupId::new(id), name)),
                None => warn!(dir = %path.display(), "Skipping newsgroup directory without meta file"),
            }
        }
        Ok(groups)
    }

    fn create_newsgroup(&mut self, name: &str) -> StorageResult<NewsgroupId> {
        if self.get_newsgroup_list()?.iter().any(|group| group.name == name) {
            return Err(StorageError::AlreadyExists);
        }

        let id = NewsgroupId::new(self.allocate_id(&self.root)?);
        let dir = self.group_path(id);
        self.dir_builder().create(&dir)?;
        if let Err(e) = self.write_new_file(&dir.join(META_FILE), name.as_bytes()) {
            // Best effort: a directory without meta only clutters the root
            let _ = fs::remove_dir_all(&dir);
            return Err(e.into());
        }
        debug!(%id, name, "Created newsgroup directory");
        Ok(id)
    }

    fn delete_newsgroup(&mut self, group: NewsgroupId) -> StorageResult<()> {
        let dir = self.group_dir(group)?;
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    fn list_articles(&mut self, group: NewsgroupId) -> StorageResult<Vec<Article>> {
        let dir = self.group_dir(group)?;
        numeric_entries(&dir)?
            .into_iter()
            .filter(|(_, path)| path.is_file())
            .map(|(id, path)| decode_article(ArticleId::new(id), &fs::read(path)?))
            .collect()
    }

    fn create_article(
        &mut self,
        group: NewsgroupId,
        content: ArticleContent,
    ) -> StorageResult<ArticleId> {
        let dir = self.group_dir(group)?;
        let id = ArticleId::new(self.allocate_id(&dir)?);
        self.write_new_file(&dir.join(id.to_string()), &encode_article(&content))?;
        Ok(id)
    }

    fn delete_article(&mut self, group: NewsgroupId, article: ArticleId) -> StorageResult<()> {
        let path = self.article_file(group, article)?;
        fs::remove_file(path)?;
        Ok(())
    }

    fn get_article(&mut self, group: NewsgroupId, article: ArticleId) -> StorageResult<Article> {
        let path = self.article_file(group, article)?;
        decode_article(article, &fs::read(path)?)
    }

    /// Remove every newsgroup and reset id allocation. Entries the store
    /// did not create are left alone.
    fn clear(&mut self) -> StorageResult<()> {
        for (_, path) in numeric_entries(&self.root)? {
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        match fs::remove_file(self.root.join(NEXT_ID_FILE)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
