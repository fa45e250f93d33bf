//! Records in the local datastore: freshness on read, purge of stale or corrupt entries.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::collaborators::{Datastore, Validator};
use crate::common::{storage_key, Record};
use crate::error::StorageError;
use crate::time::TimeSource;
use crate::{Context, Result};

#[derive(Debug, Clone)]
/// Record envelope semantics on top of a [Datastore].
pub struct RecordStore {
    pub(crate) datastore: Arc<dyn Datastore>,
    pub(crate) validator: Arc<dyn Validator>,
    pub(crate) time: Arc<dyn TimeSource>,
    pub(crate) max_record_age: Duration,
}

impl RecordStore {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        validator: Arc<dyn Validator>,
        time: Arc<dyn TimeSource>,
        max_record_age: Duration,
    ) -> Self {
        Self {
            datastore,
            validator,
            time,
            max_record_age,
        }
    }

    /// Return the record stored for `key`, if there is a fresh one.
    ///
    /// Records with a missing or unparseable receipt time, or older than the
    /// maximum record age, are deleted and reported as absent. The record value is
    /// not validated here, requesters are expected to do that themselves.
    pub fn lookup(&self, ctx: &Context, key: &[u8]) -> Result<Option<Record>> {
        let dskey = storage_key(key);

        let record = match self.read(ctx, &dskey)? {
            Some(record) => record,
            None => return Ok(None),
        };

        if !self.is_fresh(&record) {
            self.purge(ctx, &dskey);
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Write `record` under its own key.
    pub fn store(&self, ctx: &Context, record: &Record) -> Result<()> {
        let dskey = storage_key(&record.key);
        let bytes = record.to_bytes()?;

        self.datastore.put(ctx, &dskey, Bytes::from(bytes))?;
        debug!(parent: ctx.span(), ?dskey, "Stored record");

        Ok(())
    }

    /// Whether anything is stored for `key`.
    ///
    /// Storage errors other than cancellation count as "no".
    pub fn has(&self, ctx: &Context, key: &[u8]) -> Result<bool> {
        match self.datastore.has(ctx, &storage_key(key)) {
            Ok(has) => Ok(has),
            Err(StorageError::NotFound) => Ok(false),
            Err(StorageError::Cancelled) => Err(crate::Error::Cancelled),
            Err(error) => {
                debug!(parent: ctx.span(), ?error, "Unexpected datastore error");
                Ok(false)
            }
        }
    }

    /// Get and decode. Corrupt bytes are purged and reported as absent.
    pub(crate) fn read(&self, ctx: &Context, dskey: &str) -> Result<Option<Record>> {
        let bytes = match self.datastore.get(ctx, dskey) {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound) => return Ok(None),
            Err(error) => {
                if !matches!(error, StorageError::Cancelled) {
                    error!(parent: ctx.span(), ?dskey, ?error, "Failed to read record from datastore");
                }
                return Err(error.into());
            }
        };

        match Record::from_bytes(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(error) => {
                warn!(parent: ctx.span(), ?dskey, ?error, "Bad record data stored in datastore");
                self.purge(ctx, dskey);
                Ok(None)
            }
        }
    }

    fn is_fresh(&self, record: &Record) -> bool {
        let received_at = match record.received_at() {
            Some(received_at) => received_at,
            None => {
                debug!(time_received = ?record.time_received, "Missing or invalid record receipt time");
                return false;
            }
        };

        let age = self.time.now().signed_duration_since(received_at);

        match age.to_std() {
            Ok(age) if age > self.max_record_age => {
                debug!(?age, "Old record found, tossing");
                false
            }
            // Negative ages come from clock adjustments, the record is as new as it gets.
            _ => true,
        }
    }

    /// Best effort delete, failures are only logged.
    fn purge(&self, ctx: &Context, dskey: &str) {
        if let Err(error) = self.datastore.delete(ctx, dskey) {
            error!(parent: ctx.span(), ?dskey, ?error, "Failed to delete bad record from datastore");
        }
    }
}
