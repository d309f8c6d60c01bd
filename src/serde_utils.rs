use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

async fn read_to_string(path: &Path, what: &'static str) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            Error::NotFound {
                what,
                path: path.to_owned(),
            }
        } else {
            Error::Io(err)
        }
    })
}

pub async fn read_deserialize<T>(
    path: impl AsRef<Path>,
    what: &'static str,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();

    let content = read_to_string(path, what).await?;

    serde_yaml::from_str(&content).map_err(|err| Error::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

pub async fn read_json<T>(path: impl AsRef<Path>, what: &'static str) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();

    let content = read_to_string(path, what).await?;

    serde_json::from_str(&content).map_err(|err| Error::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

pub async fn read_text(path: impl AsRef<Path>, what: &'static str) -> Result<String> {
    read_to_string(path.as_ref(), what).await
}

/// Writes into a sibling temp file and renames it over `path`, readers see
/// either the old or the new content.
pub async fn write_atomic(
    path: impl AsRef<Path>,
    content: impl AsRef<[u8]>,
) -> Result<()> {
    let path = path.as_ref();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let (file, temp_path) = tempfile::Builder::new()
        .prefix(".registry-sync")
        .suffix(".tmp")
        .tempfile_in(dir)?
        .into_parts();

    let mut file = tokio::fs::File::from_std(file);
    file.write_all(content.as_ref()).await?;
    file.sync_all().await?;
    drop(file);

    temp_path.persist(path).map_err(|err| Error::Io(err.error))?;

    Ok(())
}
