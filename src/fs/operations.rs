use std::{ffi::OsString, io::ErrorKind, path::Path};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

/// Reads a json document while holding a shared lock on it. A missing file reads as `None`, and
/// so does a file that doesn't parse, since a half written file is possible after a crash.
pub async fn read_locked_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{path:?} doesn't exist yet");
            return Ok(None);
        }
        Err(e) => Err(e)?,
    };
    file.lock_shared()?;
    let mut content = String::new();
    let read = file.read_to_string(&mut content).await;
    file.unlock_async().await?;
    read?;

    Ok(parse_document(path, &content))
}

/// Reads, modifies and writes back a json document under an exclusive lock, creating it when
/// it's missing.
pub async fn update_locked_json<T, R>(path: &Path, update: impl FnOnce(&mut T) -> R) -> Result<R>
where
    T: Default + Serialize + DeserializeOwned,
{
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = rewrite_document(&mut file, path, update).await;
    file.unlock_async().await?;
    result
}

async fn rewrite_document<T, R>(
    file: &mut File,
    path: &Path,
    update: impl FnOnce(&mut T) -> R,
) -> Result<R>
where
    T: Default + Serialize + DeserializeOwned,
{
    let mut content = String::new();
    file.read_to_string(&mut content).await?;
    let mut document = match parse_document(path, &content) {
        Some(document) => document,
        None => {
            if !content.trim().is_empty() {
                keep_corrupted_copy(path, &content).await?;
            }
            T::default()
        }
    };

    let result = update(&mut document);

    let buffer = serde_json::to_vec_pretty(&document)?;
    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(&buffer).await?;
    file.flush().await?;
    Ok(result)
}

/// Saves an unreadable document next to the original as `<name>.corrupt` before it gets
/// replaced.
async fn keep_corrupted_copy(path: &Path, content: &str) -> Result<()> {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".corrupt");
    let backup = path.with_file_name(name);
    warn!("Keeping a copy of corrupted {path:?} in {backup:?}");
    tokio::fs::write(&backup, content).await?;
    Ok(())
}

fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Option<T> {
    if content.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(content) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring corrupted document {path:?}: {e}");
            None
        }
    }
}
