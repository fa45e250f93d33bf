//! Which records are allowed to replace what we hold.

use tracing::{debug, info, warn};

use crate::common::{storage_key, Record};
use crate::error::ValidationError;
use crate::server::RecordStore;
use crate::{Context, Error, Result};

#[derive(Debug)]
/// Outcome of [RecordStore::admit].
pub enum Admission {
    Accept,
    Reject(Rejection),
}

#[derive(Debug)]
pub enum Rejection {
    /// The existing record won conflict resolution.
    StaleRecord,
    /// The candidate, or the comparison against the existing record, failed validation.
    ValidationFailed(ValidationError),
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::StaleRecord => Error::StaleRecord,
            Rejection::ValidationFailed(error) => Error::ValidationFailed(error),
        }
    }
}

impl RecordStore {
    /// Like [RecordStore::lookup], but records that fail validation are also absent.
    ///
    /// Invalid records are left in place, they get overwritten by the next accepted put.
    pub fn validated_lookup(&self, ctx: &Context, key: &[u8]) -> Result<Option<Record>> {
        let record = match self.lookup(ctx, key)? {
            Some(record) => record,
            None => return Ok(None),
        };

        if let Err(error) = self.validator.validate(&record.key, &record.value) {
            debug!(parent: ctx.span(), dskey = ?storage_key(key), ?error, "Stored record failed validation, ignoring it");
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Decide whether `candidate` may be stored under `key`.
    ///
    /// Any remotely declared receipt time is stripped from `candidate` first. Reading
    /// the existing record and the later write are not atomic: two concurrent puts
    /// for the same key can both be accepted, and the last write wins.
    pub fn admit(&self, ctx: &Context, key: &[u8], candidate: &mut Record) -> Result<Admission> {
        if candidate.key != key {
            return Err(Error::RequestMalformed("put key doesn't match record key"));
        }

        candidate.clean();

        if let Err(error) = self.validator.validate(key, &candidate.value) {
            warn!(parent: ctx.span(), ?error, "Invalid incoming record");
            return Ok(Admission::Reject(Rejection::ValidationFailed(error)));
        }

        let existing = match self.validated_lookup(ctx, key)? {
            Some(existing) => existing,
            None => return Ok(Admission::Accept),
        };

        let values: [&[u8]; 2] = [&candidate.value, &existing.value];

        match self.validator.select(key, &values) {
            Ok(0) => Ok(Admission::Accept),
            Ok(index) => {
                info!(parent: ctx.span(), index, "Incoming record lost against the stored record");
                Ok(Admission::Reject(Rejection::StaleRecord))
            }
            Err(error) => {
                warn!(parent: ctx.span(), ?error, "Invalid incoming record");
                Ok(Admission::Reject(Rejection::ValidationFailed(error)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::collaborators::{MemoryDatastore, Validator};
    use crate::time::SystemTimeSource;

    #[derive(Debug)]
    /// Values are a single byte version; higher wins, zero is invalid.
    struct Versioned;

    impl Validator for Versioned {
        fn validate(&self, _key: &[u8], value: &[u8]) -> Result<(), ValidationError> {
            match value.first() {
                Some(0) | None => Err(ValidationError::MalformedValue("version 0".into())),
                _ => Ok(()),
            }
        }

        fn select(&self, _key: &[u8], values: &[&[u8]]) -> Result<usize, ValidationError> {
            values
                .iter()
                .enumerate()
                .max_by_key(|(index, value)| (value.first().copied(), std::cmp::Reverse(*index)))
                .map(|(index, _)| index)
                .ok_or(ValidationError::NoCandidates)
        }
    }

    fn store() -> RecordStore {
        RecordStore::new(
            Arc::new(MemoryDatastore::default()),
            Arc::new(Versioned),
            Arc::new(SystemTimeSource),
            Duration::from_secs(3600),
        )
    }

    fn put(store: &RecordStore, ctx: &Context, value: u8) {
        let mut record = Record::new(&b"/v/k"[..], vec![value]);
        record.stamp_received(Utc::now());
        store.store(ctx, &record).unwrap();
    }

    #[test]
    fn accept_without_existing() {
        let ctx = Context::new();
        let store = store();
        let mut candidate = Record::new(&b"/v/k"[..], vec![1]);

        assert!(matches!(
            store.admit(&ctx, b"/v/k", &mut candidate).unwrap(),
            Admission::Accept
        ));
    }

    #[test]
    fn strips_remote_receipt_time() {
        let ctx = Context::new();
        let store = store();
        let mut candidate = Record::new(&b"/v/k"[..], vec![1]);
        candidate.time_received = Some("2999-01-01T00:00:00Z".into());

        store.admit(&ctx, b"/v/k", &mut candidate).unwrap();

        assert_eq!(candidate.time_received, None);
    }

    #[test]
    fn key_mismatch() {
        let ctx = Context::new();
        let store = store();
        let mut candidate = Record::new(&b"/v/other"[..], vec![1]);

        assert!(matches!(
            store.admit(&ctx, b"/v/k", &mut candidate),
            Err(Error::RequestMalformed(_))
        ));
    }

    #[test]
    fn invalid_candidate() {
        let ctx = Context::new();
        let store = store();
        let mut candidate = Record::new(&b"/v/k"[..], vec![0]);

        assert!(matches!(
            store.admit(&ctx, b"/v/k", &mut candidate).unwrap(),
            Admission::Reject(Rejection::ValidationFailed(_))
        ));
    }

    #[test]
    fn newer_wins() {
        let ctx = Context::new();
        let store = store();
        put(&store, &ctx, 2);

        let mut newer = Record::new(&b"/v/k"[..], vec![3]);
        let mut older = Record::new(&b"/v/k"[..], vec![1]);

        assert!(matches!(
            store.admit(&ctx, b"/v/k", &mut newer).unwrap(),
            Admission::Accept
        ));
        assert!(matches!(
            store.admit(&ctx, b"/v/k", &mut older).unwrap(),
            Admission::Reject(Rejection::StaleRecord)
        ));
    }

    #[test]
    fn invalid_existing_is_ignored() {
        let ctx = Context::new();
        let store = store();
        put(&store, &ctx, 0);

        assert_eq!(store.validated_lookup(&ctx, b"/v/k").unwrap(), None);
        assert!(store.lookup(&ctx, b"/v/k").unwrap().is_some());

        let mut candidate = Record::new(&b"/v/k"[..], vec![1]);
        assert!(matches!(
            store.admit(&ctx, b"/v/k", &mut candidate).unwrap(),
            Admission::Accept
        ));
    }
}
