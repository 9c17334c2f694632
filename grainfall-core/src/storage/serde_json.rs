use super::concepts::StorageError;
use super::concepts::{FileBasedStorage, StorageInterfaceOpen};
use serde::{Deserialize, Serialize};

/// Save elements as json files with [serde_json].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JsonStorageInterface {
    /// Storage path.
    pub path: std::path::PathBuf,
}

impl FileBasedStorage for JsonStorageInterface {
    const EXTENSION: &'static str = "json";

    fn get_path(&self) -> &std::path::Path {
        &self.path
    }

    fn to_writer_pretty<V, W>(&self, writer: W, value: &V) -> Result<(), StorageError>
    where
        V: Serialize,
        W: std::io::Write,
    {
        Ok(serde_json::to_writer_pretty(writer, value)?)
    }

    fn from_str<V>(&self, input: &str) -> Result<V, StorageError>
    where
        V: for<'a> Deserialize<'a>,
    {
        Ok(serde_json::from_str(input)?)
    }
}

impl StorageInterfaceOpen for JsonStorageInterface {
    fn open_or_create(location: &std::path::Path) -> Result<Self, StorageError>
    where
        Self: Sized,
    {
        if !location.is_dir() {
            std::fs::create_dir_all(location)?;
        }
        Ok(JsonStorageInterface {
            path: location.into(),
        })
    }
}
