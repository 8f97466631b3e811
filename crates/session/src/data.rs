//! Typed accessors over a [`SessionStore`].
//!
//! Each wizard key has a getter and a setter that encode the value as JSON.
//! A value that is present but cannot be decoded is treated as absent: the
//! stages then redirect exactly as if the key had never been written.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tc_core::billing::DurationSelectionMap;
use tc_core::selection::SubjectSelectionMap;
use tc_core::types::ProgramId;

use crate::keys::{self, StudentProfile};
use crate::store::{SessionStore, StoreError};

/// Cheaply cloneable handle giving typed access to one session's store.
#[derive(Clone)]
pub struct SessionData {
    store: Arc<dyn SessionStore>,
}

impl SessionData {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The underlying raw store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    // ---- selectedTraining ----

    pub fn selected_training(&self) -> Result<Option<Vec<ProgramId>>, StoreError> {
        self.read_json(keys::SELECTED_TRAINING)
    }

    pub fn set_selected_training(&self, programs: &[ProgramId]) -> Result<(), StoreError> {
        self.write_json(keys::SELECTED_TRAINING, programs)
    }

    // ---- studentdata ----

    pub fn student_profile(&self) -> Result<Option<StudentProfile>, StoreError> {
        self.read_json(keys::STUDENT_DATA)
    }

    pub fn set_student_profile(&self, profile: &StudentProfile) -> Result<(), StoreError> {
        self.write_json(keys::STUDENT_DATA, profile)
    }

    // ---- trainingSubjects ----

    pub fn training_subjects(&self) -> Result<Option<SubjectSelectionMap>, StoreError> {
        self.read_json(keys::TRAINING_SUBJECTS)
    }

    pub fn set_training_subjects(&self, subjects: &SubjectSelectionMap) -> Result<(), StoreError> {
        self.write_json(keys::TRAINING_SUBJECTS, subjects)
    }

    // ---- trainingDurations ----

    pub fn training_durations(&self) -> Result<Option<DurationSelectionMap>, StoreError> {
        self.read_json(keys::TRAINING_DURATIONS)
    }

    pub fn set_training_durations(
        &self,
        durations: &DurationSelectionMap,
    ) -> Result<(), StoreError> {
        self.write_json(keys::TRAINING_DURATIONS, durations)
    }

    // ---- private helpers ----

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Malformed session value, treating as absent");
                Ok(None)
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, encoded)?;
        tracing::debug!(key, "Session value written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use tc_core::billing::{BillingDuration, DurationPricing};
    use tc_core::program::Subject;

    fn session() -> SessionData {
        SessionData::new(Arc::new(MemorySessionStore::new()))
    }

    #[test]
    fn absent_keys_read_as_none() {
        let data = session();
        assert!(data.selected_training().unwrap().is_none());
        assert!(data.student_profile().unwrap().is_none());
        assert!(data.training_subjects().unwrap().is_none());
        assert!(data.training_durations().unwrap().is_none());
    }

    #[test]
    fn selected_training_is_a_json_array() {
        let data = session();
        data.set_selected_training(&[3, 1]).unwrap();
        assert_eq!(
            data.store().get(keys::SELECTED_TRAINING).unwrap().as_deref(),
            Some("[3,1]")
        );
        assert_eq!(data.selected_training().unwrap(), Some(vec![3, 1]));
    }

    #[test]
    fn malformed_value_reads_as_none() {
        let data = session();
        data.store()
            .set(keys::SELECTED_TRAINING, "not json".to_string())
            .unwrap();
        assert!(data.selected_training().unwrap().is_none());

        data.store()
            .set(keys::TRAINING_DURATIONS, r#"{"1":{"duration":"weekly","price":1}}"#.to_string())
            .unwrap();
        assert!(data.training_durations().unwrap().is_none());
    }

    #[test]
    fn subjects_are_stored_under_program_keys() {
        let data = session();
        let mut map = SubjectSelectionMap::empty_for([1]);
        map.toggle(1, Subject::new(2, "Chemistry"), 4);
        data.set_training_subjects(&map).unwrap();

        let raw = data.store().get(keys::TRAINING_SUBJECTS).unwrap().unwrap();
        assert_eq!(raw, r#"{"1":[{"id":2,"name":"Chemistry"}]}"#);
        assert_eq!(data.training_subjects().unwrap(), Some(map));
    }

    #[test]
    fn durations_read_back() {
        let data = session();
        let mut map = DurationSelectionMap::new();
        map.set(4, DurationPricing::default().choice(BillingDuration::Monthly));
        data.set_training_durations(&map).unwrap();
        assert_eq!(data.training_durations().unwrap(), Some(map));
    }

    #[test]
    fn clones_share_the_store() {
        let data = session();
        let other = data.clone();
        data.set_student_profile(&StudentProfile::new("arts")).unwrap();
        assert_eq!(
            other.student_profile().unwrap().unwrap().department(),
            Some("arts")
        );
    }
}
