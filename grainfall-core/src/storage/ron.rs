use super::concepts::StorageError;
use super::concepts::{FileBasedStorage, StorageInterfaceOpen};
use serde::{Deserialize, Serialize};

/// Save elements as ron files with [ron].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RonStorageInterface {
    path: std::path::PathBuf,
}

impl FileBasedStorage for RonStorageInterface {
    const EXTENSION: &'static str = "ron";

    fn get_path(&self) -> &std::path::Path {
        &self.path
    }

    fn to_writer_pretty<V, W>(&self, writer: W, value: &V) -> Result<(), StorageError>
    where
        V: Serialize,
        W: std::io::Write,
    {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(usize::MAX)
            .struct_names(true)
            .separate_tuple_members(false)
            .compact_arrays(true)
            .indentor("  ".to_owned());
        let options = ron::Options::default();
        Ok(options.to_io_writer_pretty(writer, value, config)?)
    }

    fn from_str<V>(&self, input: &str) -> Result<V, StorageError>
    where
        V: for<'a> Deserialize<'a>,
    {
        Ok(ron::de::from_str(input)?)
    }
}

impl StorageInterfaceOpen for RonStorageInterface {
    fn open_or_create(location: &std::path::Path) -> Result<Self, StorageError>
    where
        Self: Sized,
    {
        if !location.is_dir() {
            std::fs::create_dir_all(location)?;
        }
        Ok(RonStorageInterface {
            path: location.into(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use grainfall_concepts::Board;

    #[test]
    fn store_load_board() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let storage = RonStorageInterface::open_or_create(dir.path())?;
        let mut board = Board::new(3, 5)?;
        board.add_grains(1, 4, 3)?;
        storage.store_element("partitioned", &board)?;
        assert_eq!(storage.load_element::<Board>("partitioned")?, Some(board));
        Ok(())
    }

    #[test]
    fn corrupted_file_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let storage = RonStorageInterface::open_or_create(dir.path())?;
        std::fs::write(storage.get_element_path("serial"), "Board(cells: [")?;
        let result = storage.load_element::<Board>("serial");
        assert!(matches!(result, Err(StorageError::RonSpannedError(_))));
        Ok(())
    }
}
