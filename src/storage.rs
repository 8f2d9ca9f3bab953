use std::fs;
use std::io::Write;

use crate::config::VaultConfig;
use crate::crypto;
use crate::models::AppData;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
    #[error("no vault at {0}")]
    Missing(String),
}

/// Encrypted single-file document store holding one user's [`AppData`].
#[derive(Debug, Clone)]
pub struct Vault {
    config: VaultConfig,
}

impl Vault {
    pub fn new(config: VaultConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Whether a vault file exists (i.e., setup has run before).
    pub fn exists(&self) -> bool {
        self.config.data_file().exists()
    }

    /// Encrypt and write `data`, replacing any previous vault atomically.
    pub fn save(&self, passphrase: &str, data: &AppData) -> Result<(), StorageError> {
        let json = serde_json::to_vec(data)?;
        let sealed = crypto::seal(passphrase, &json, self.config.kdf)?;

        fs::create_dir_all(&self.config.data_dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.config.data_dir)?;
        tmp.write_all(&sealed)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.config.data_file())
            .map_err(|e| StorageError::Io(e.error))?;

        tracing::debug!(bytes = sealed.len(), logs = data.logs.len(), "vault saved");
        Ok(())
    }

    pub fn load(&self, passphrase: &str) -> Result<AppData, StorageError> {
        let path = self.config.data_file();
        if !path.exists() {
            return Err(StorageError::Missing(path.display().to_string()));
        }
        let sealed = fs::read(&path)?;
        let json = crypto::open(passphrase, &sealed)?;
        let data: AppData = serde_json::from_slice(&json)?;
        Ok(data)
    }

    /// Delete all data permanently.
    pub fn wipe(&self) -> Result<(), StorageError> {
        let path = self.config.data_file();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfCost;
    use crate::models::DailyLog;
    use chrono::NaiveDate;

    fn vault_in(dir: &tempfile::TempDir) -> Vault {
        Vault::new(VaultConfig::new(dir.path().join("nested")).with_kdf(KdfCost::minimal()))
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        assert!(!vault.exists());

        let mut data = AppData::default();
        data.logs
            .upsert(DailyLog::period(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None))
            .unwrap();
        data.settings.show_fertility = true;
        vault.save("secret", &data).unwrap();
        assert!(vault.exists());

        let loaded = vault.load("secret").unwrap();
        assert_eq!(loaded.logs, data.logs);
        assert!(loaded.settings.show_fertility);
    }

    #[test]
    fn wrong_passphrase_is_a_crypto_error() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        vault.save("secret", &AppData::default()).unwrap();
        assert!(matches!(vault.load("nope"), Err(StorageError::Crypto(_))));
    }

    #[test]
    fn load_missing_and_wipe() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        assert!(matches!(vault.load("x"), Err(StorageError::Missing(_))));

        vault.save("x", &AppData::default()).unwrap();
        vault.wipe().unwrap();
        assert!(!vault.exists());
        vault.wipe().unwrap();
    }
}
