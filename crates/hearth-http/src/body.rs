use crate::{Error, Result};
use std::{
    cell::Cell,
    fs,
    io::Read,
    path::{Path, PathBuf},
};

/// A received request body, chosen at read time by
/// [`crate::HttpConfig::store_file_upload_in_file_at_size`].
#[derive(Debug)]
pub enum ReceivedBody {
    /// no body was sent
    Empty,
    /// the whole body, read into memory
    InMemory(Vec<u8>),
    /// the body was spooled to a temp file because it exceeded the
    /// in-memory threshold
    File(SpooledBody),
}

/// A request body spooled to a temp file.
///
/// The file is removed when this is dropped — i.e. when the connection
/// that produced it finishes cleaning up its request — unless the handler
/// calls [`SpooledBody::mark_moved`] first, e.g. after renaming it into
/// permanent storage.
#[derive(Debug)]
pub struct SpooledBody {
    path: PathBuf,
    len: u64,
    moved: Cell<bool>,
}

impl SpooledBody {
    pub(crate) fn new(path: PathBuf, len: u64) -> Self {
        Self {
            path,
            len,
            moved: Cell::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    /// mark this body as relocated by the handler, so connection cleanup
    /// does not delete the spool file.
    pub fn mark_moved(&self) {
        self.moved.set(true);
    }

    pub fn is_moved(&self) -> bool {
        self.moved.get()
    }
}

impl Drop for SpooledBody {
    fn drop(&mut self) {
        if !self.moved.get() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl ReceivedBody {
    pub fn len(&self) -> u64 {
        match self {
            ReceivedBody::Empty => 0,
            ReceivedBody::InMemory(bytes) => bytes.len() as u64,
            ReceivedBody::File(spooled) => spooled.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// materialize the body as owned bytes, reading the spool file if
    /// needed. the spool file, if any, is removed once this returns.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            ReceivedBody::Empty => Ok(Vec::new()),
            ReceivedBody::InMemory(bytes) => Ok(bytes),
            ReceivedBody::File(spooled) => {
                let mut file = fs::File::open(spooled.path()).map_err(Error::Io)?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf).map_err(Error::Io)?;
                Ok(buf)
            }
        }
    }

    /// the path of the spool file, if this body was spooled to disk
    pub fn path(&self) -> Option<&Path> {
        match self {
            ReceivedBody::File(spooled) => Some(spooled.path()),
            _ => None,
        }
    }

    /// mark a spooled body as relocated, so connection cleanup does not
    /// delete it. a no-op for a body that was never spooled to disk.
    pub fn mark_moved(&self) {
        if let ReceivedBody::File(spooled) = self {
            spooled.mark_moved();
        }
    }
}

/// Lazily-produced response content. The connection writer pulls from this
/// to decide framing without buffering the
/// whole body up front unless it chooses to.
pub enum Content {
    /// no body
    Empty,
    /// a complete in-memory buffer; length is always known
    Bytes(Vec<u8>),
    /// a file on disk, streamed directly; length is the file size
    File { path: PathBuf, len: u64 },
    /// an unbounded sequence of string chunks, streamed as produced; length
    /// is never known up front
    Lazy(Box<dyn Iterator<Item = String> + Send>),
}

impl Content {
    /// the length of this content, if knowable without consuming it
    pub fn known_len(&self) -> Option<u64> {
        match self {
            Content::Empty => Some(0),
            Content::Bytes(b) => Some(b.len() as u64),
            Content::File { len, .. } => Some(*len),
            Content::Lazy(_) => None,
        }
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::Empty => f.write_str("Content::Empty"),
            Content::Bytes(b) => write!(f, "Content::Bytes({} bytes)", b.len()),
            Content::File { path, len } => write!(f, "Content::File({path:?}, {len} bytes)"),
            Content::Lazy(_) => f.write_str("Content::Lazy(..)"),
        }
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Bytes(s.into_bytes())
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Bytes(s.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_len() {
        let body = ReceivedBody::InMemory(vec![1, 2, 3]);
        assert_eq!(body.len(), 3);
        assert_eq!(body.into_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_has_zero_len() {
        assert!(ReceivedBody::Empty.is_empty());
    }

    #[test]
    fn known_len_is_none_for_lazy_content() {
        let content = Content::Lazy(Box::new(std::iter::once(String::from("chunk"))));
        assert_eq!(content.known_len(), None);
        assert_eq!(Content::Empty.known_len(), Some(0));
    }

    #[test]
    fn spooled_body_is_removed_once_dropped() {
        let path = std::env::temp_dir().join(format!("hearth-body-test-{}", fastrand::u64(..)));
        fs::write(&path, b"spooled").unwrap();
        {
            let body = ReceivedBody::File(SpooledBody::new(path.clone(), 7));
            assert_eq!(body.len(), 7);
            drop(body);
        }
        assert!(!path.exists());
    }

    #[test]
    fn spooled_body_survives_drop_once_marked_moved() {
        let path = std::env::temp_dir().join(format!("hearth-body-test-{}", fastrand::u64(..)));
        fs::write(&path, b"spooled").unwrap();
        {
            let body = ReceivedBody::File(SpooledBody::new(path.clone(), 7));
            body.mark_moved();
            drop(body);
        }
        assert!(path.exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn into_bytes_reads_and_removes_spool_file() {
        let path = std::env::temp_dir().join(format!("hearth-body-test-{}", fastrand::u64(..)));
        fs::write(&path, b"spooled").unwrap();
        let body = ReceivedBody::File(SpooledBody::new(path.clone(), 7));
        assert_eq!(body.into_bytes().unwrap(), b"spooled");
        assert!(!path.exists());
    }
}
