use std::sync::{Mutex, MutexGuard};

use chrono::{Datelike, Duration, NaiveDate};
use zeroize::Zeroize;

use crate::crypto::CryptoError;
use crate::error::{Error, Result};
use crate::models::{AppData, AppSettings, CycleSnapshot, DailyLog, MonthData};
use crate::prediction;
use crate::segmenter::segment_cycles;
use crate::snapshot::recompute;
use crate::storage::{StorageError, Vault};

/// One user's session: the vault plus the decrypted data while unlocked.
///
/// Every mutation is written back to the vault immediately, and derived
/// views are recomputed from the current log snapshot on each request.
pub struct Tracker {
    vault: Vault,
    passphrase: Mutex<Option<String>>,
    data: Mutex<Option<AppData>>,
}

fn guard<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock().map_err(|_| Error::Poisoned)
}

impl Tracker {
    pub fn new(vault: Vault) -> Self {
        Self {
            vault,
            passphrase: Mutex::new(None),
            data: Mutex::new(None),
        }
    }

    pub fn is_setup(&self) -> bool {
        self.vault.exists()
    }

    pub fn is_unlocked(&self) -> bool {
        guard(&self.data).map(|d| d.is_some()).unwrap_or(false)
    }

    /// Create an empty vault and unlock it.
    pub fn setup(&self, passphrase: String) -> Result<()> {
        if self.vault.exists() {
            return Err(Error::AlreadySetup);
        }
        let data = AppData::default();
        self.vault.save(&passphrase, &data)?;

        *guard(&self.passphrase)? = Some(passphrase);
        *guard(&self.data)? = Some(data);
        tracing::info!(path = %self.vault.config().data_file().display(), "vault created");
        Ok(())
    }

    /// Returns `false` for a wrong passphrase; other failures are errors.
    pub fn unlock(&self, passphrase: String) -> Result<bool> {
        let data = match self.vault.load(&passphrase) {
            Ok(data) => data,
            Err(StorageError::Crypto(CryptoError::Decryption)) => {
                tracing::warn!("unlock failed: wrong passphrase");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(logs = data.logs.len(), "vault unlocked");
        *guard(&self.passphrase)? = Some(passphrase);
        *guard(&self.data)? = Some(data);
        Ok(true)
    }

    /// Lock the session: zeroize passphrase and drop data from memory.
    pub fn lock(&self) {
        if let Ok(mut pass) = self.passphrase.lock() {
            if let Some(ref mut p) = *pass {
                p.zeroize();
            }
            *pass = None;
        }
        if let Ok(mut data) = self.data.lock() {
            *data = None;
        }
    }

    fn read<T>(&self, f: impl FnOnce(&AppData) -> T) -> Result<T> {
        let data = guard(&self.data)?;
        let data = data.as_ref().ok_or(Error::Locked)?;
        Ok(f(data))
    }

    /// Apply `f` to a copy of the unlocked data, persist it, then swap it in.
    /// On any error the in-memory state is left as it was.
    fn write<T>(&self, f: impl FnOnce(&mut AppData) -> Result<T>) -> Result<T> {
        let pass = guard(&self.passphrase)?;
        let mut data = guard(&self.data)?;
        let (Some(pass), Some(current)) = (pass.as_ref(), data.as_mut()) else {
            return Err(Error::Locked);
        };
        let mut updated = current.clone();
        let out = f(&mut updated)?;
        self.vault.save(pass, &updated)?;
        *current = updated;
        Ok(out)
    }

    /// Insert or replace the log for `log.date`.
    pub fn log_day(&self, log: DailyLog) -> Result<()> {
        self.write(|data| Ok(data.logs.upsert(log)?))
    }

    pub fn remove_day(&self, date: NaiveDate) -> Result<bool> {
        self.write(|data| Ok(data.logs.remove(date)))
    }

    pub fn logs(&self) -> Result<Vec<DailyLog>> {
        self.read(|data| data.logs.logs().to_vec())
    }

    pub fn snapshot(&self) -> Result<CycleSnapshot> {
        self.snapshot_at(chrono::Local::now().date_naive())
    }

    pub fn snapshot_at(&self, today: NaiveDate) -> Result<CycleSnapshot> {
        self.read(|data| recompute(data.logs.logs(), today, data.settings.show_fertility))
    }

    pub fn get_month(&self, year: i32, month: u32) -> Result<MonthData> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidDate(format!("{year}-{month}")))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| Error::InvalidDate(format!("{year}-{month}")))?;
        let last_day = next_month - Duration::days(1);

        self.read(|data| {
            let cycles = segment_cycles(data.logs.logs());
            let fertility = if data.settings.show_fertility {
                prediction::fertility_window(&cycles)
            } else {
                None
            };
            MonthData {
                year: first_day.year(),
                month: first_day.month(),
                logs: data.logs.range(first_day, last_day).to_vec(),
                prediction: prediction::predict(&cycles),
                fertility,
                current_cycle: cycles.first().cloned(),
                stats: prediction::cycle_stats(&cycles),
            }
        })
    }

    pub fn settings(&self) -> Result<AppSettings> {
        self.read(|data| data.settings.clone())
    }

    pub fn toggle_fertility(&self, enabled: bool) -> Result<()> {
        self.write(|data| {
            data.settings.show_fertility = enabled;
            Ok(())
        })
    }

    pub fn update_settings(&self, auto_lock_minutes: u32) -> Result<()> {
        self.write(|data| {
            data.settings.auto_lock_minutes = auto_lock_minutes.clamp(1, 60);
            Ok(())
        })
    }

    /// Plaintext JSON export of everything in the vault.
    pub fn export_data(&self) -> Result<String> {
        let json = self.read(|data| serde_json::to_string_pretty(data))??;
        Ok(json)
    }

    pub fn wipe_all_data(&self) -> Result<()> {
        self.lock();
        self.vault.wipe()?;
        tracing::info!("all data wiped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;
    use crate::crypto::KdfCost;
    use crate::models::{CyclePhase, FlowLevel};
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tracker() -> (TempDir, Tracker) {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::new(Vault::new(
            VaultConfig::new(dir.path()).with_kdf(KdfCost::minimal()),
        ));
        (dir, tracker)
    }

    fn log_period(tracker: &Tracker, start: &str, days: i64) {
        for i in 0..days {
            tracker
                .log_day(DailyLog::period(d(start) + Duration::days(i), Some(FlowLevel::Medium)))
                .unwrap();
        }
    }

    #[test]
    fn locked_tracker_refuses_access() {
        let (_dir, tracker) = tracker();
        assert!(!tracker.is_setup());
        assert!(matches!(tracker.logs(), Err(Error::Locked)));
        assert!(matches!(
            tracker.log_day(DailyLog::new(d("2024-01-01"))),
            Err(Error::Locked)
        ));
    }

    #[test]
    fn setup_log_and_snapshot() {
        let (_dir, tracker) = tracker();
        tracker.setup("pass".into()).unwrap();
        assert!(tracker.is_unlocked());

        // Out-of-order entry still yields an ascending store.
        log_period(&tracker, "2024-01-29", 5);
        log_period(&tracker, "2024-01-01", 5);

        let snapshot = tracker.snapshot_at(d("2024-02-17")).unwrap();
        assert_eq!(snapshot.cycles.len(), 2);
        assert_eq!(snapshot.cycles[1].cycle_length, Some(28));
        assert_eq!(snapshot.current_phase, CyclePhase::Luteal);
        assert!(snapshot.fertility.is_none());

        tracker.toggle_fertility(true).unwrap();
        assert!(tracker.snapshot_at(d("2024-02-17")).unwrap().fertility.is_some());
    }

    #[test]
    fn data_survives_lock_and_unlock() {
        let (_dir, tracker) = tracker();
        tracker.setup("pass".into()).unwrap();
        log_period(&tracker, "2024-01-01", 3);
        tracker.update_settings(120).unwrap();

        tracker.lock();
        assert!(!tracker.is_unlocked());
        assert!(!tracker.unlock("wrong".into()).unwrap());
        assert!(tracker.unlock("pass".into()).unwrap());

        assert_eq!(tracker.logs().unwrap().len(), 3);
        assert_eq!(tracker.settings().unwrap().auto_lock_minutes, 60);
    }

    #[test]
    fn failed_save_keeps_memory_in_sync_with_disk() {
        let (dir, tracker) = tracker();
        tracker.setup("pass".into()).unwrap();
        log_period(&tracker, "2024-01-01", 1);

        // A directory where the vault file should be makes the next save fail.
        let data_file = dir.path().join("data.lunara");
        std::fs::remove_file(&data_file).unwrap();
        std::fs::create_dir(&data_file).unwrap();

        let result = tracker.log_day(DailyLog::period(d("2024-01-02"), None));
        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(tracker.logs().unwrap().len(), 1);

        assert!(tracker.toggle_fertility(true).is_err());
        assert!(!tracker.settings().unwrap().show_fertility);
    }

    #[test]
    fn setup_twice_is_rejected() {
        let (_dir, tracker) = tracker();
        tracker.setup("pass".into()).unwrap();
        assert!(matches!(tracker.setup("other".into()), Err(Error::AlreadySetup)));
    }

    #[test]
    fn invalid_log_is_not_persisted() {
        let (_dir, tracker) = tracker();
        tracker.setup("pass".into()).unwrap();
        let result = tracker.log_day(DailyLog::new(d("2024-01-01")).with_mood(0));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(tracker.logs().unwrap().is_empty());
    }

    #[test]
    fn month_view_filters_logs() {
        let (_dir, tracker) = tracker();
        tracker.setup("pass".into()).unwrap();
        log_period(&tracker, "2024-01-30", 4);

        let feb = tracker.get_month(2024, 2).unwrap();
        assert_eq!(feb.logs.len(), 2);
        assert_eq!(feb.current_cycle.unwrap().start_date, d("2024-01-30"));
        assert!(matches!(tracker.get_month(2024, 13), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn remove_export_and_wipe() {
        let (_dir, tracker) = tracker();
        tracker.setup("pass".into()).unwrap();
        log_period(&tracker, "2024-01-01", 2);

        assert!(tracker.remove_day(d("2024-01-02")).unwrap());
        let export = tracker.export_data().unwrap();
        assert!(export.contains("2024-01-01"));
        assert!(!export.contains("2024-01-02"));

        tracker.wipe_all_data().unwrap();
        assert!(!tracker.is_setup());
        assert!(!tracker.is_unlocked());
    }
}
