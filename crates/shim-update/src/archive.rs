// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::UpdateResult;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Payload directories an extracted update may carry.
pub const PAYLOAD_DIRECTORIES: [&str; 2] = ["app", "os"];

/// Replace the contents of `destination` with the archive's entries.
///
/// # Returns
/// Number of entries in the archive
pub fn extract_archive(archive: &Path, destination: &Path) -> UpdateResult<usize> {
    if destination.exists() {
        fs::remove_dir_all(destination)?;
    }
    fs::create_dir_all(destination)?;
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
    zip.extract(destination)?;
    Ok(zip.len())
}

/// True when at least one payload directory exists and is not empty.
pub fn has_payload(root: &Path) -> bool {
    PAYLOAD_DIRECTORIES.iter().any(|name| {
        fs::read_dir(root.join(name))
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    })
}

/// Lowercase hex SHA-256 of a file.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut File::open(path)?, &mut hasher)?;
    Ok(to_hex(&hasher.finalize()))
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_replaces_previous_tree() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("u.zip");
        let destination = dir.path().join("update");
        fs::create_dir_all(destination.join("stale")).unwrap();
        write_zip(&archive, &[("os/kernel.bin", b"kernel")]);

        assert_eq!(extract_archive(&archive, &destination).unwrap(), 1);
        assert!(!destination.join("stale").exists());
        assert_eq!(fs::read(destination.join("os/kernel.bin")).unwrap(), b"kernel");
        assert!(has_payload(&destination));
    }

    #[test]
    fn test_payload_detection() {
        let dir = TempDir::new().unwrap();
        assert!(!has_payload(dir.path()));
        fs::create_dir_all(dir.path().join("app")).unwrap();
        assert!(!has_payload(dir.path()));
        fs::write(dir.path().join("app/main.bin"), b"x").unwrap();
        assert!(has_payload(dir.path()));
    }

    #[test]
    fn test_sha256_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
