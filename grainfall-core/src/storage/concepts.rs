use std::error::Error;
use std::fmt::Display;

use grainfall_concepts::Board;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::ron::RonStorageInterface;
use super::serde_json::JsonStorageInterface;

/// Error related to storing and reading elements
#[derive(Debug)]
pub enum StorageError {
    /// Error related to File Io operations.
    IoError(std::io::Error),
    /// Occurs during parsing of json structs.
    SerdeJsonError(serde_json::Error),
    /// Occurs while writing ron files.
    RonError(ron::Error),
    /// Occurs during parsing of ron files. Contains the position of the problem.
    RonSpannedError(ron::error::SpannedError),
    /// Storage was used without being initialized or an element could not be found.
    InitError(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerdeJsonError(err)
    }
}

impl From<ron::Error> for StorageError {
    fn from(err: ron::Error) -> Self {
        StorageError::RonError(err)
    }
}

impl From<ron::error::SpannedError> for StorageError {
    fn from(err: ron::error::SpannedError) -> Self {
        StorageError::RonSpannedError(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StorageError::SerdeJsonError(message) => write!(f, "{}", message),
            StorageError::RonError(message) => write!(f, "{}", message),
            StorageError::RonSpannedError(message) => write!(f, "{}", message),
            StorageError::IoError(message) => write!(f, "{}", message),
            StorageError::InitError(message) => write!(f, "{}", message),
        }
    }
}

impl Error for StorageError {}

/// Define how to store results.
///
/// We currently support saving results as json files via [serde_json] or as ron files via
/// [ron].
#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Eq, Serialize)]
pub enum StorageOption {
    /// Save results as [json](https://www.json.org/json-en.html) file.
    SerdeJson,
    /// Save results as [ron](https://github.com/ron-rs/ron) file.
    Ron,
}

impl StorageOption {
    /// Which storage option should be used by default.
    pub fn default_priority() -> Vec<Self> {
        vec![StorageOption::SerdeJson]
    }
}

impl core::str::FromStr for StorageOption {
    type Err = grainfall_concepts::SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "serde-json" | "serdejson" => Ok(StorageOption::SerdeJson),
            "ron" => Ok(StorageOption::Ron),
            _ => Err(grainfall_concepts::SetupError(format!(
                "unknown storage option \"{}\", expected one of json, ron",
                s
            ))),
        }
    }
}

/// Used to construct a [StorageManager]
///
/// This builder contains multiple options which can be used to configure the location and type in
/// which results are stored.
///
/// ```
/// use grainfall_core::storage::{StorageBuilder, StorageOption};
///
/// let storage_builder = StorageBuilder::new()
///     .priority([StorageOption::Ron, StorageOption::SerdeJson, StorageOption::Ron])
///     .location("./");
/// assert_eq!(
///     storage_builder.get_priority(),
///     vec![StorageOption::Ron, StorageOption::SerdeJson]
/// );
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageBuilder<const INIT: bool = false> {
    location: std::path::PathBuf,
    priority: Vec<StorageOption>,
    suffix: std::path::PathBuf,
    #[cfg(feature = "timestamp")]
    add_date: bool,
    #[cfg(feature = "timestamp")]
    date: std::path::PathBuf,
}

impl<const INIT: bool> StorageBuilder<INIT> {
    /// Define the priority of [StorageOption]. See [StorageOption::default_priority].
    ///
    /// Options which occur multiple times are only kept at their first position.
    pub fn priority(self, priority: impl IntoIterator<Item = StorageOption>) -> Self {
        Self {
            priority: priority.into_iter().unique().collect(),
            ..self
        }
    }

    /// Get the current priority
    pub fn get_priority(&self) -> Vec<StorageOption> {
        self.priority.clone()
    }

    /// Define a suffix which will be appended to the save path
    pub fn suffix(self, suffix: impl Into<std::path::PathBuf>) -> Self {
        Self {
            suffix: suffix.into(),
            ..self
        }
    }

    /// Store results by their current date inside the specified folder path
    #[cfg(feature = "timestamp")]
    pub fn add_date(self, add_date: bool) -> Self {
        Self { add_date, ..self }
    }
}

impl Default for StorageBuilder<false> {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBuilder<false> {
    /// Constructs a new [StorageBuilder] with default settings.
    pub fn new() -> Self {
        Self {
            location: "./out".into(),
            priority: StorageOption::default_priority(),
            suffix: "".into(),
            #[cfg(feature = "timestamp")]
            add_date: true,
            #[cfg(feature = "timestamp")]
            date: "".into(),
        }
    }

    /// Initializes the [StorageBuilder] thus filling information about time.
    pub fn init(self) -> StorageBuilder<true> {
        #[cfg(feature = "timestamp")]
        let date: std::path::PathBuf = if self.add_date {
            format!("{}", chrono::Local::now().format("%Y-%m-%d-T%H-%M-%S")).into()
        } else {
            "".into()
        };
        #[cfg(not(feature = "timestamp"))]
        let date: std::path::PathBuf = "".into();
        self.init_with_date(&date)
    }

    /// Specify the time at which the results should be saved
    pub fn init_with_date(self, date: &std::path::Path) -> StorageBuilder<true> {
        #[cfg(not(feature = "timestamp"))]
        let _ = date;
        StorageBuilder::<true> {
            location: self.location,
            priority: self.priority,
            suffix: self.suffix,
            #[cfg(feature = "timestamp")]
            add_date: self.add_date,
            #[cfg(feature = "timestamp")]
            date: date.into(),
        }
    }

    /// Define a folder where to store results
    ///
    /// Note that this functionality is only available as long as the [StorageBuilder] has not been
    /// initialized.
    pub fn location<P>(self, location: P) -> Self
    where
        std::path::PathBuf: From<P>,
    {
        Self {
            location: location.into(),
            ..self
        }
    }
}

impl StorageBuilder<true> {
    /// Get the fully constructed path after the Builder has been initialized with the
    /// [StorageBuilder::init] function.
    pub fn get_full_path(&self) -> std::path::PathBuf {
        let mut full_path = self.location.clone();
        #[cfg(feature = "timestamp")]
        if self.add_date {
            full_path.extend(&self.date);
        }
        full_path.extend(&self.suffix);
        full_path
    }
}

/// Open or create a new storage at the given location
pub trait StorageInterfaceOpen {
    /// Initializes the storage in the folder `location` which is created if needed.
    fn open_or_create(location: &std::path::Path) -> Result<Self, StorageError>
    where
        Self: Sized;
}

/// Stores every element in its own file named after its label
pub trait FileBasedStorage {
    /// File extension without the leading dot
    const EXTENSION: &'static str;

    /// Folder which contains all files of this storage
    fn get_path(&self) -> &std::path::Path;

    /// Writes a human-readable representation of the value.
    fn to_writer_pretty<V, W>(&self, writer: W, value: &V) -> Result<(), StorageError>
    where
        V: Serialize,
        W: std::io::Write;

    /// Parses the contents of a file.
    fn from_str<V>(&self, input: &str) -> Result<V, StorageError>
    where
        V: for<'a> Deserialize<'a>;

    /// Path of the file which stores the element with the given label
    fn get_element_path(&self, label: &str) -> std::path::PathBuf {
        self.get_path().join(label).with_extension(Self::EXTENSION)
    }

    /// Creates or overwrites the file for `label`.
    fn store_element<V>(&self, label: &str, value: &V) -> Result<(), StorageError>
    where
        V: Serialize,
    {
        let file = std::fs::File::create(self.get_element_path(label))?;
        let writer = std::io::BufWriter::new(file);
        self.to_writer_pretty(writer, value)
    }

    /// Returns [None] if no element was stored under this label.
    fn load_element<V>(&self, label: &str) -> Result<Option<V>, StorageError>
    where
        V: for<'a> Deserialize<'a>,
    {
        let path = self.get_element_path(label);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(self.from_str(&contents)?))
    }

    /// All labels which have been stored so far in alphabetical order
    fn get_all_labels(&self) -> Result<Vec<String>, StorageError> {
        let mut labels = Vec::new();
        for entry in std::fs::read_dir(self.get_path())? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(Self::EXTENSION) {
                continue;
            }
            if let Some(label) = path.file_stem().and_then(|stem| stem.to_str()) {
                labels.push(label.to_owned());
            }
        }
        labels.sort();
        Ok(labels)
    }
}

const METADATA_LABEL: &str = "metadata";

/// Stores labelled boards and metadata of a run in every format of the priority list
///
/// Elements are loaded from the first format of the priority list.
///
/// ```
/// use grainfall_concepts::Board;
/// use grainfall_core::storage::*;
/// # let dir = tempfile::tempdir()?;
/// let builder = StorageBuilder::new()
///     .location(dir.path())
///     .priority([StorageOption::Ron])
///     .init();
/// let manager = StorageManager::open_or_create(builder)?;
///
/// let board = Board::from_rows(vec![vec![1, 2], vec![3, 0]])?;
/// manager.store_board("serial", &board)?;
/// assert_eq!(manager.load_board("serial")?, Some(board));
/// assert_eq!(manager.load_board("partitioned")?, None);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct StorageManager {
    builder: StorageBuilder<true>,
    json_storage: Option<JsonStorageInterface>,
    ron_storage: Option<RonStorageInterface>,
}

macro_rules! exec_for_storage_option(
    ($self:ident, $option:expr, $function:ident, $($args:tt)*) => {
        match $option {
            StorageOption::SerdeJson => match &$self.json_storage {
                Some(storage) => storage.$function($($args)*),
                None => Err(StorageError::InitError(
                    "json storage was not initialized but called".into(),
                )),
            },
            StorageOption::Ron => match &$self.ron_storage {
                Some(storage) => storage.$function($($args)*),
                None => Err(StorageError::InitError(
                    "ron storage was not initialized but called".into(),
                )),
            },
        }
    };
);

impl StorageManager {
    /// Constructs the [StorageManager] from the settings given by the [StorageBuilder].
    ///
    /// Every format receives its own subfolder of [StorageBuilder::get_full_path].
    pub fn open_or_create(storage_builder: StorageBuilder<true>) -> Result<Self, StorageError> {
        let location = storage_builder.get_full_path();

        let mut json_storage = None;
        let mut ron_storage = None;
        for storage_variant in storage_builder.priority.iter() {
            match storage_variant {
                StorageOption::SerdeJson => {
                    json_storage = Some(JsonStorageInterface::open_or_create(
                        &location.join("json"),
                    )?);
                }
                StorageOption::Ron => {
                    ron_storage = Some(RonStorageInterface::open_or_create(&location.join("ron"))?);
                }
            }
        }
        Ok(StorageManager {
            builder: storage_builder,
            json_storage,
            ron_storage,
        })
    }

    /// Extracts all information given by the [StorageBuilder] when constructing
    pub fn extract_builder(&self) -> StorageBuilder<true> {
        self.builder.clone()
    }

    fn first_option(&self) -> Result<StorageOption, StorageError> {
        self.builder
            .priority
            .first()
            .copied()
            .ok_or(StorageError::InitError(
                "no storage option was specified".into(),
            ))
    }

    /// Stores any serializable value under the given label in every format.
    pub fn store_element<V>(&self, label: &str, value: &V) -> Result<(), StorageError>
    where
        V: Serialize,
    {
        for option in self.builder.priority.iter() {
            exec_for_storage_option!(self, option, store_element, label, value)?;
        }
        Ok(())
    }

    /// Loads a value from the format with the highest priority.
    pub fn load_element<V>(&self, label: &str) -> Result<Option<V>, StorageError>
    where
        V: for<'a> Deserialize<'a>,
    {
        let option = self.first_option()?;
        exec_for_storage_option!(self, option, load_element, label)
    }

    /// Stores a snapshot of a board such as `initial`, `serial` or `partitioned`.
    pub fn store_board(&self, label: &str, board: &Board) -> Result<(), StorageError> {
        self.store_element(label, board)
    }

    /// Loads a board which was stored with [StorageManager::store_board].
    pub fn load_board(&self, label: &str) -> Result<Option<Board>, StorageError> {
        self.load_element(label)
    }

    /// Stores information describing the whole run.
    pub fn store_metadata<M>(&self, metadata: &M) -> Result<(), StorageError>
    where
        M: Serialize,
    {
        self.store_element(METADATA_LABEL, metadata)
    }

    /// Loads the information stored by [StorageManager::store_metadata].
    pub fn load_metadata<M>(&self) -> Result<Option<M>, StorageError>
    where
        M: for<'a> Deserialize<'a>,
    {
        self.load_element(METADATA_LABEL)
    }

    /// Labels of all stored boards, excluding the metadata
    pub fn get_all_labels(&self) -> Result<Vec<String>, StorageError> {
        let option = self.first_option()?;
        let labels: Vec<String> = exec_for_storage_option!(self, option, get_all_labels,)?;
        Ok(labels
            .into_iter()
            .filter(|label| label != METADATA_LABEL)
            .collect())
    }
}
