use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::verification::store::{CodeVault, VaultError, VerificationRecord};
use crate::workflows::verification::{MailboxVerifier, VerificationPolicy};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

#[derive(Default)]
pub(super) struct MemoryVault {
    records: Mutex<HashMap<String, VerificationRecord>>,
}

impl MemoryVault {
    pub(super) fn record(&self, email: &str) -> Option<VerificationRecord> {
        self.records
            .lock()
            .expect("vault mutex poisoned")
            .get(email)
            .cloned()
    }
}

impl CodeVault for MemoryVault {
    fn upsert(&self, record: VerificationRecord) -> Result<(), VaultError> {
        self.records
            .lock()
            .expect("vault mutex poisoned")
            .insert(record.email.clone(), record);
        Ok(())
    }

    fn fetch(&self, email: &str) -> Result<Option<VerificationRecord>, VaultError> {
        Ok(self
            .records
            .lock()
            .expect("vault mutex poisoned")
            .get(email)
            .cloned())
    }

    fn increment_attempts(&self, email: &str) -> Result<u8, VaultError> {
        let mut guard = self.records.lock().expect("vault mutex poisoned");
        match guard.get_mut(email) {
            Some(record) => {
                record.attempts += 1;
                Ok(record.attempts)
            }
            None => Err(VaultError::Missing(email.to_string())),
        }
    }

    fn remove(&self, email: &str) -> Result<(), VaultError> {
        self.records
            .lock()
            .expect("vault mutex poisoned")
            .remove(email);
        Ok(())
    }
}

pub(super) struct UnavailableVault;

impl CodeVault for UnavailableVault {
    fn upsert(&self, _record: VerificationRecord) -> Result<(), VaultError> {
        Err(VaultError::Unavailable("vault offline".to_string()))
    }

    fn fetch(&self, _email: &str) -> Result<Option<VerificationRecord>, VaultError> {
        Err(VaultError::Unavailable("vault offline".to_string()))
    }

    fn increment_attempts(&self, _email: &str) -> Result<u8, VaultError> {
        Err(VaultError::Unavailable("vault offline".to_string()))
    }

    fn remove(&self, _email: &str) -> Result<(), VaultError> {
        Err(VaultError::Unavailable("vault offline".to_string()))
    }
}

pub(super) fn verifier() -> (MailboxVerifier<MemoryVault>, Arc<MemoryVault>) {
    let vault = Arc::new(MemoryVault::default());
    let verifier = MailboxVerifier::new(vault.clone(), VerificationPolicy::default());
    (verifier, vault)
}
