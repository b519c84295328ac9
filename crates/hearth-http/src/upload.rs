use std::{
    cell::Cell,
    fs, io,
    path::{Path, PathBuf},
};

/// Where an uploaded file's bytes live.
#[derive(Debug, Clone)]
pub enum UploadStorage {
    InMemory(Vec<u8>),
    TempFile(PathBuf),
}

/// A single `multipart/form-data` file part.
///
/// Temp files are removed when the owning [`crate::Request`] is dropped,
/// unless the handler calls [`UploadDescriptor::mark_moved`] — e.g. after
/// renaming the file into permanent storage.
#[derive(Debug)]
pub struct UploadDescriptor {
    field_name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    storage: UploadStorage,
    moved: Cell<bool>,
}

impl UploadDescriptor {
    pub(crate) fn new(
        field_name: String,
        file_name: Option<String>,
        content_type: Option<String>,
        storage: UploadStorage,
    ) -> Self {
        Self {
            field_name,
            file_name,
            content_type,
            storage,
            moved: Cell::new(false),
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> io::Result<u64> {
        match &self.storage {
            UploadStorage::InMemory(bytes) => Ok(bytes.len() as u64),
            UploadStorage::TempFile(path) => Ok(fs::metadata(path)?.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.storage, UploadStorage::InMemory(b) if b.is_empty())
    }

    /// the spool file path, if this upload was stored on disk
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            UploadStorage::TempFile(path) => Some(path),
            UploadStorage::InMemory(_) => None,
        }
    }

    /// read this upload's bytes, loading the spool file if necessary
    pub fn bytes(&self) -> io::Result<Vec<u8>> {
        match &self.storage {
            UploadStorage::InMemory(bytes) => Ok(bytes.clone()),
            UploadStorage::TempFile(path) => fs::read(path),
        }
    }

    /// mark this upload as relocated by the handler, so connection cleanup
    /// does not delete the spool file
    pub fn mark_moved(&self) {
        self.moved.set(true);
    }

    pub fn is_moved(&self) -> bool {
        self.moved.get()
    }
}

impl Drop for UploadDescriptor {
    fn drop(&mut self) {
        if !self.moved.get() {
            if let UploadStorage::TempFile(path) = &self.storage {
                let _ = fs::remove_file(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let upload = UploadDescriptor::new(
            "avatar".into(),
            Some("cat.png".into()),
            Some("image/png".into()),
            UploadStorage::InMemory(vec![1, 2, 3]),
        );
        assert_eq!(upload.bytes().unwrap(), vec![1, 2, 3]);
        assert_eq!(upload.len().unwrap(), 3);
        assert!(!upload.is_moved());
    }

    #[test]
    fn spooled_file_is_removed_on_drop_unless_moved() {
        let path = std::env::temp_dir().join(format!("hearth-upload-test-{}", fastrand::u64(..)));
        fs::write(&path, b"spooled").unwrap();
        {
            let upload = UploadDescriptor::new(
                "file".into(),
                None,
                None,
                UploadStorage::TempFile(path.clone()),
            );
            drop(upload);
        }
        assert!(!path.exists());
    }

    #[test]
    fn moved_spooled_file_survives_drop() {
        let path = std::env::temp_dir().join(format!("hearth-upload-test-{}", fastrand::u64(..)));
        fs::write(&path, b"spooled").unwrap();
        {
            let upload = UploadDescriptor::new(
                "file".into(),
                None,
                None,
                UploadStorage::TempFile(path.clone()),
            );
            upload.mark_moved();
        }
        assert!(path.exists());
        let _ = fs::remove_file(&path);
    }
}
