//! Sharded, gzipped store of patent XML keyed by patent number.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use regex::Regex;
use thiserror::Error;

/// Authority, then two digit pairs taken from the end of the serial.
static SHARD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w\w)-\w*(\w\w)(\w\w)-").unwrap()
});

/// Directory used for numbers that do not match the shard pattern.
const FALLBACK_SHARD: &str = "foo";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no stored XML for {0}")]
    NotFound(String),

    #[error("blob I/O for {patent}: {source}")]
    Io {
        patent: String,
        #[source]
        source: std::io::Error,
    },
}

/// XML artifact storage.
///
/// Implementations are shared between annotation workers and must be safe
/// to call from blocking threads.
pub trait BlobStore: Send + Sync {
    fn exists(&self, patent_number: &str) -> bool;

    /// Decompressed XML bytes of a patent.
    fn read(&self, patent_number: &str) -> Result<Vec<u8>, StorageError>;

    /// Store XML bytes, gzipped.
    fn write(&self, patent_number: &str, xml: &[u8]) -> Result<(), StorageError>;
}

/// Blob store on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a patent's artifact.
    ///
    /// `{root}/{authority}/{last pair}/{second-last pair}/{number}.xml.gz`,
    /// or `{root}/foo/{number}.xml.gz` when the number has no serial digits
    /// to shard on.
    pub fn path_for(&self, patent_number: &str) -> PathBuf {
        let file_name = format!("{}.xml.gz", patent_number);
        match SHARD_PATTERN.captures(patent_number) {
            Some(caps) => self
                .root
                .join(&caps[1])
                .join(&caps[3])
                .join(&caps[2])
                .join(file_name),
            None => self.root.join(FALLBACK_SHARD).join(file_name),
        }
    }
}

impl BlobStore for LocalBlobStore {
    fn exists(&self, patent_number: &str) -> bool {
        self.path_for(patent_number).is_file()
    }

    fn read(&self, patent_number: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(patent_number);
        let file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(patent_number.to_string()),
            _ => io_error(patent_number, e),
        })?;

        let mut xml = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut xml)
            .map_err(|e| io_error(patent_number, e))?;
        Ok(xml)
    }

    fn write(&self, patent_number: &str, xml: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(patent_number);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(patent_number, e))?;
        }

        // Readers never see a partial artifact
        let partial = path.with_extension("gz.part");
        let result = (|| {
            let mut encoder = GzEncoder::new(File::create(&partial)?, Compression::default());
            encoder.write_all(xml)?;
            encoder.finish()?.sync_all()?;
            fs::rename(&partial, &path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return Err(io_error(patent_number, e));
        }
        Ok(())
    }
}

fn io_error(patent_number: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        patent: patent_number.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_path_shards_on_last_two_digit_pairs() {
        let store = LocalBlobStore::new("/blobs");
        assert_eq!(
            store.path_for("US-1234567-A1"),
            PathBuf::from("/blobs/US/67/45/US-1234567-A1.xml.gz")
        );
        assert_eq!(
            store.path_for("EP-2000123-B1"),
            PathBuf::from("/blobs/EP/23/01/EP-2000123-B1.xml.gz")
        );
    }

    #[test]
    fn test_short_numbers_use_fallback_directory() {
        let store = LocalBlobStore::new("/blobs");
        assert_eq!(
            store.path_for("EP-1-A1"),
            PathBuf::from("/blobs/foo/EP-1-A1.xml.gz")
        );
        assert_eq!(
            store.path_for("garbage"),
            PathBuf::from("/blobs/foo/garbage.xml.gz")
        );
    }

    #[test]
    fn test_write_then_read_is_gzipped_on_disk() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let xml = b"<patent-document ucid=\"US-1234567-A1\"/>";

        assert!(!store.exists("US-1234567-A1"));
        store.write("US-1234567-A1", xml).unwrap();
        assert!(store.exists("US-1234567-A1"));

        let raw = fs::read(store.path_for("US-1234567-A1")).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        assert_eq!(store.read("US-1234567-A1").unwrap(), xml);
        assert!(!store.path_for("US-1234567-A1").with_extension("gz.part").exists());
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        assert!(matches!(
            store.read("US-1234567-A1"),
            Err(StorageError::NotFound(_))
        ));
    }
}
