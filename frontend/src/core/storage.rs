use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage file corruption: {0}")]
    Corruption(String),
}

/// Why a stored value could not be turned back into state.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Value under '{key}' is not valid JSON: {source}")]
    Parse {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Value under '{0}' is not a JSON object")]
    NotAnObject(&'static str),
}

/// Synchronous string key-value storage scoped to one origin, in the manner
/// of a browser's `localStorage`.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

/// Reads `key` and parses it as a JSON object. Missing and empty values are
/// both `Ok(None)`.
pub fn read_object<S: KeyValueStorage + ?Sized>(
    storage: &S,
    key: &'static str,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, LoadError> {
    let raw = match storage.get_item(key)? {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    match serde_json::from_str(&raw) {
        Ok(serde_json::Value::Object(fields)) => Ok(Some(fields)),
        Ok(_) => Err(LoadError::NotAnObject(key)),
        Err(source) => Err(LoadError::Parse { key, source }),
    }
}

#[cfg(test)]
pub use memory::MemoryStorage;
