use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Result, StorageError};
use crate::model::task::Task;
use crate::repository::traits::TaskRepository;

pub const DEFAULT_FILE_NAME: &str = "tasks.json";
pub const DEFAULT_DIR_NAME: &str = ".todo";

/// Stores the whole task list as one pretty-printed JSON array.
///
/// Every call holds the instance's lock for its full duration, so concurrent
/// callers never observe or produce a half-written file.
#[derive(Debug)]
pub struct FileTaskRepository {
    file_path: PathBuf,
    lock: Mutex<()>,
}

impl FileTaskRepository {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Uses `<base_dir>/tasks.json`, defaulting to `~/.todo`. Creates the
    /// directory but not the file.
    pub fn in_data_dir(base_dir: Option<PathBuf>) -> Result<Self> {
        let dir = match base_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        fs::create_dir_all(&dir)?;
        Ok(Self::new(dir.join(DEFAULT_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn read_tasks(&self) -> Result<Vec<Task>> {
        let file = match File::open(&self.file_path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.file_path.display(), "task file missing, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        let reader = BufReader::new(file);
        let tasks: Vec<Task> = serde_json::from_reader(reader)?;
        debug!(path = %self.file_path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    fn write_tasks(&self, tasks: &[Task]) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, tasks)?;
        writer.flush()?;
        debug!(path = %self.file_path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }
}

impl TaskRepository for FileTaskRepository {
    fn get_all(&self) -> Result<Vec<Task>> {
        let _guard = self.lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        self.read_tasks()
    }

    fn save_all(&self, tasks: &[Task]) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        self.write_tasks(tasks)
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        StorageError::Io(std::io::Error::new(
            ErrorKind::NotFound,
            "could not determine home directory",
        ))
    })?;
    Ok(home_dir.join(DEFAULT_DIR_NAME))
}
