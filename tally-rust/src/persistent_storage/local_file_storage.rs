use super::DurableStorage;
use crate::{log_d, log_w, TallyErr};
use file_guard::Lock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

const TAG: &str = stringify!(LocalFileStorage);

/// Keeps every key in one JSON object file. Each operation takes an exclusive lock on the
/// file, so separate processes sharing the path see whole-file writes only.
pub struct LocalFileStorage {
    file_path: String,
}

impl LocalFileStorage {
    #[must_use]
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
        }
    }

    #[must_use]
    pub fn in_directory(output_directory: &str, name: &str) -> Self {
        let file_path = Path::new(output_directory)
            .join(format!("{name}_storage.json"))
            .to_string_lossy()
            .to_string();
        Self::new(&file_path)
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    fn read_values(&self) -> Result<HashMap<String, String>, TallyErr> {
        if !Path::new(&self.file_path).exists() {
            return Ok(HashMap::new());
        }

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.file_path)
            .map_err(|e| TallyErr::FileError(e.to_string()))?;

        let mut lock = file_guard::lock(&mut file, Lock::Shared, 0, 1)
            .map_err(|e| TallyErr::FileError(e.to_string()))?;

        let mut contents = String::new();
        (*lock)
            .read_to_string(&mut contents)
            .map_err(|e| TallyErr::FileError(e.to_string()))?;

        Ok(parse_contents(&self.file_path, &contents))
    }

    fn mutate_values<F>(&self, mutation: F) -> Result<(), TallyErr>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.file_path)
            .map_err(|e| TallyErr::FileError(e.to_string()))?;

        let mut lock = file_guard::lock(&mut file, Lock::Exclusive, 0, 1)
            .map_err(|e| TallyErr::FileError(e.to_string()))?;

        let mut contents = String::new();
        (*lock)
            .read_to_string(&mut contents)
            .map_err(|e| TallyErr::FileError(e.to_string()))?;

        let mut values = parse_contents(&self.file_path, &contents);
        mutation(&mut values);

        let serialized = serde_json::to_vec(&values)
            .map_err(|e| TallyErr::SerializationError(e.to_string()))?;

        rewrite(&mut lock, &serialized)
    }
}

fn rewrite(file: &mut File, bytes: &[u8]) -> Result<(), TallyErr> {
    file.set_len(0)
        .map_err(|e| TallyErr::FileError(e.to_string()))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| TallyErr::FileError(e.to_string()))?;
    file.write_all(bytes)
        .map_err(|e| TallyErr::FileError(e.to_string()))?;
    file.flush().map_err(|e| TallyErr::FileError(e.to_string()))
}

fn parse_contents(file_path: &str, contents: &str) -> HashMap<String, String> {
    if contents.trim().is_empty() {
        return HashMap::new();
    }

    match serde_json::from_str(contents) {
        Ok(values) => values,
        Err(e) => {
            log_w!(TAG, "Ignoring corrupt storage file {}: {}", file_path, e);
            HashMap::new()
        }
    }
}

impl DurableStorage for LocalFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TallyErr> {
        let mut values = self.read_values()?;
        Ok(values.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TallyErr> {
        log_d!(TAG, "Writing {} to {}", key, self.file_path);
        self.mutate_values(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), TallyErr> {
        self.mutate_values(|values| {
            values.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, TallyErr> {
        Ok(self.read_values()?.into_keys().collect())
    }
}
