use std::path::PathBuf;

use crate::crypto::KdfCost;
use crate::storage::StorageError;

/// Overrides the platform data directory when set.
pub const DATA_DIR_ENV: &str = "LUNARA_DATA_DIR";
const APP_DIR: &str = "lunara";
const DATA_FILE: &str = "data.lunara";

/// Where the encrypted vault lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
    /// Cost used when sealing; opening reads the cost from the file.
    pub kdf: KdfCost,
}

impl VaultConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_name: DATA_FILE.to_string(),
            kdf: KdfCost::default(),
        }
    }

    pub fn with_kdf(mut self, kdf: KdfCost) -> Self {
        self.kdf = kdf;
        self
    }

    /// `$LUNARA_DATA_DIR`, falling back to the platform local data dir.
    pub fn from_env() -> Result<Self, StorageError> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        let dir = dirs::data_local_dir()
            .ok_or(StorageError::NoDataDir)?
            .join(APP_DIR);
        Ok(Self::new(dir))
    }

    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_file_joins_dir_and_name() {
        let config = VaultConfig::new("/tmp/lunara-test");
        assert_eq!(config.data_file(), PathBuf::from("/tmp/lunara-test/data.lunara"));
    }
}
