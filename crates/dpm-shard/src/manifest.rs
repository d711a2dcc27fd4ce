//! Run manifest with file digests.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ShardError};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// File name relative to the output directory.
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Description of one build: options, counts and output digests.
///
/// Carries no timestamps so two runs over the same input produce the same
/// manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub tool_version: String,
    pub options: serde_json::Value,
    pub counts: serde_json::Value,
    pub files: Vec<ManifestFile>,
}

/// SHA-256 of a file as lowercase hex, with its size.
pub fn compute_file_digest(path: &Path) -> Result<(u64, String)> {
    let io_error = |source| ShardError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut bytes = 0u64;

    loop {
        let read = reader.read(&mut buffer).map_err(io_error)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        bytes += read as u64;
    }

    Ok((bytes, hex::encode(hasher.finalize())))
}

impl Manifest {
    pub fn new(options: serde_json::Value, counts: serde_json::Value) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            options,
            counts,
            files: Vec::new(),
        }
    }

    /// Digest `path` and record it under its name relative to `base`.
    pub fn add_file(&mut self, base: &Path, path: &Path) -> Result<()> {
        let (bytes, sha256) = compute_file_digest(path)?;
        let name = path.strip_prefix(base).unwrap_or(path);
        self.files.push(ManifestFile {
            path: name.to_string_lossy().replace('\\', "/"),
            bytes,
            sha256,
        });
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| ShardError::Io {
            operation: "create",
            path: path.to_path_buf(),
            source,
        })?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| ShardError::Io {
            operation: "open",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Names of recorded files whose current digest differs.
    pub fn verify(&self, base: &Path) -> Result<Vec<String>> {
        let mut changed = Vec::new();
        for file in &self.files {
            let (_, sha256) = compute_file_digest(&base.join(&file.path))?;
            if sha256 != file.sha256 {
                changed.push(file.path.clone());
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_of_known_content() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"Hello, World!").expect("write");

        let (bytes, digest) = compute_file_digest(&path).expect("digest");
        assert_eq!(bytes, 13);
        assert_eq!(
            digest,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn manifest_round_trips_and_detects_changes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let data = dir.path().join("test.shard");
        std::fs::write(&data, b"line\n").expect("write");

        let mut manifest = Manifest::new(
            serde_json::json!({"max_records": 50}),
            serde_json::json!({"samples": 1}),
        );
        manifest.add_file(dir.path(), &data).expect("add");
        let manifest_path = dir.path().join(MANIFEST_FILE);
        manifest.write(&manifest_path).expect("write manifest");

        let loaded = Manifest::read(&manifest_path).expect("read manifest");
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.files[0].path, "test.shard");
        assert!(loaded.verify(dir.path()).expect("verify").is_empty());

        std::fs::write(&data, b"other\n").expect("rewrite");
        assert_eq!(
            loaded.verify(dir.path()).expect("verify"),
            vec!["test.shard".to_string()]
        );
    }
}
