//! SecurityGroup reconciler
//!
//! Drives a security group in the DCS management service towards the state
//! declared by a SecurityGroup resource. Each pass re-reads the record and
//! derives what to do from it:
//!
//! - record gone: nothing to do
//! - no deletion requested, finalizer missing: add the finalizer first
//! - no deletion requested, no `status.id`: create the security group
//! - no deletion requested, `status.id` set: compare and update if needed
//! - deletion requested, finalizer present: delete remotely, then release
//!   the finalizer
//!
//! Every adapter failure is written to the `Synced` condition before the
//! error is returned, so the cause is visible on the resource.

use std::str::FromStr;
use std::sync::Arc;

use kube::ResourceExt;
use tracing::{error, info, instrument, warn};

use super::finalizer::{add_finalizer, has_finalizer, remove_finalizer, SECURITY_GROUP_FINALIZER};
use crate::adapters::SecurityGroupApi;
use crate::crd::{set_conditions, Condition, SecurityGroup, SecurityGroupStatus};
use crate::error::{Error, Result};
use crate::metrics;
use crate::store::{ObjectKey, SecurityGroupStore};

/// When the `Ready=False/SpecChanging` condition is recorded on an already
/// provisioned security group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpecChangingPolicy {
    /// Before the remote state is read, whether or not an update follows.
    /// A pass that finds nothing to change leaves `Ready=False/SpecChanging`.
    #[default]
    Optimistic,
    /// Only once the remote state is known to differ from the spec.
    OnDiff,
}

impl FromStr for SpecChangingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "optimistic" => Ok(SpecChangingPolicy::Optimistic),
            "on-diff" => Ok(SpecChangingPolicy::OnDiff),
            other => Err(Error::config(format!(
                "Invalid spec changing policy '{}': must be one of: optimistic, on-diff",
                other
            ))),
        }
    }
}

/// Reconciler tuning
#[derive(Clone, Debug, Default)]
pub struct ReconcilerOptions {
    pub spec_changing: SpecChangingPolicy,
}

/// A record under reconciliation together with the status last persisted
struct Record {
    sg: SecurityGroup,
    status: SecurityGroupStatus,
    persisted: SecurityGroupStatus,
}

impl Record {
    fn new(mut sg: SecurityGroup) -> Self {
        let status = sg.status.take().unwrap_or_default();
        Self {
            sg,
            persisted: status.clone(),
            status,
        }
    }

    fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        set_conditions(&mut self.status.conditions, conditions);
    }

    fn is_dirty(&self) -> bool {
        !self.status.equal(&self.persisted)
    }

    /// The full record as it should be written
    fn to_resource(&self) -> SecurityGroup {
        let mut sg = self.sg.clone();
        sg.status = Some(self.status.clone());
        sg
    }

    fn key(&self) -> ObjectKey {
        ObjectKey::of(&self.sg)
    }
}

/// Reconciles SecurityGroup records against the management service
pub struct Reconciler {
    store: Arc<dyn SecurityGroupStore>,
    api: Arc<dyn SecurityGroupApi>,
    options: ReconcilerOptions,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn SecurityGroupStore>,
        api: Arc<dyn SecurityGroupApi>,
        options: ReconcilerOptions,
    ) -> Self {
        Self { store, api, options }
    }

    /// Run one reconciliation pass for `key`.
    ///
    /// `Ok(())` means there is nothing left to do until the record changes;
    /// an error means the pass should be retried.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<()> {
        let Some(sg) = self.store.get(key).await? else {
            info!(key = %key, "SecurityGroup not found, nothing to reconcile");
            return Ok(());
        };

        if sg.metadata.deletion_timestamp.is_none() {
            let sg = self.ensure_finalizer(sg).await?;
            self.apply(Record::new(sg)).await
        } else {
            self.finalize(Record::new(sg)).await
        }
    }

    /// Make sure the finalizer is on the record before anything is created
    async fn ensure_finalizer(&self, mut sg: SecurityGroup) -> Result<SecurityGroup> {
        if has_finalizer(sg.finalizers(), SECURITY_GROUP_FINALIZER) {
            return Ok(sg);
        }

        info!(name = %sg.name_any(), "Adding finalizer to SecurityGroup");
        add_finalizer(sg.finalizers_mut(), SECURITY_GROUP_FINALIZER);
        self.store.replace(&sg).await
    }

    /// Create or converge the security group
    async fn apply(&self, record: Record) -> Result<()> {
        if record.status.id.is_empty() {
            self.create(record).await
        } else {
            self.converge(record).await
        }
    }

    async fn create(&self, mut record: Record) -> Result<()> {
        let spec = &record.sg.spec;
        let (tenant, desired) = (spec.tenant(), spec.desired());

        info!(name = %record.sg.name_any(), security_group = %desired.name, "Creating security group");

        record.set_conditions([Condition::creating()]);
        self.persist_status(&mut record).await?;

        let created = match self.api.create(&tenant, &desired).await {
            Ok(created) => created,
            Err(e) => return Err(self.record_failure(&mut record, e).await),
        };

        info!(
            name = %record.sg.name_any(),
            id = %created.id,
            "Security group created"
        );

        record.status.id = created.id;
        record.set_conditions([
            Condition::available().with_message(created.message),
            Condition::reconcile_success(),
        ]);
        self.persist_created(&mut record).await
    }

    async fn converge(&self, mut record: Record) -> Result<()> {
        let spec = &record.sg.spec;
        let (tenant, desired) = (spec.tenant(), spec.desired());
        let id = record.status.id.clone();
        let policy = self.options.spec_changing;

        if policy == SpecChangingPolicy::Optimistic {
            record.set_conditions([Condition::spec_changing()]);
        }

        let remote = match self.api.read_by_id(&tenant, &id).await {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                warn!(name = %record.sg.name_any(), id = %id, "Security group missing from DCS");
                record.set_conditions([Condition::unavailable()]);
                let err = Error::adapter(format!("security group {} not found", id));
                return Err(self.record_failure(&mut record, err).await);
            }
            Err(e) => return Err(self.record_failure(&mut record, e).await),
        };

        if remote.matches(&desired) {
            info!(name = %record.sg.name_any(), id = %id, "Security group is up to date");
            return self.persist_status(&mut record).await;
        }

        info!(
            name = %record.sg.name_any(),
            id = %id,
            security_group = %desired.name,
            "Updating security group"
        );

        if policy == SpecChangingPolicy::OnDiff {
            record.set_conditions([Condition::spec_changing()]);
        }
        self.persist_status(&mut record).await?;

        let message = match self.api.update_by_id(&tenant, &id, &desired).await {
            Ok(message) => message,
            Err(e) => return Err(self.record_failure(&mut record, e).await),
        };

        record.set_conditions([
            Condition::available().with_message(message),
            Condition::reconcile_success(),
        ]);
        self.persist_status(&mut record).await
    }

    /// Tear down the security group, then release the finalizer
    async fn finalize(&self, mut record: Record) -> Result<()> {
        if !has_finalizer(record.sg.finalizers(), SECURITY_GROUP_FINALIZER) {
            info!(name = %record.sg.name_any(), "SecurityGroup already finalized");
            return Ok(());
        }

        self.cleanup(&mut record).await?;

        info!(name = %record.sg.name_any(), "Removing finalizer from SecurityGroup");
        remove_finalizer(record.sg.finalizers_mut(), SECURITY_GROUP_FINALIZER);
        self.store.replace(&record.to_resource()).await?;

        metrics::CLEANUPS.with_label_values(&["SecurityGroup"]).inc();
        Ok(())
    }

    async fn cleanup(&self, record: &mut Record) -> Result<()> {
        let id = record.status.id.clone();
        if id.is_empty() {
            info!(name = %record.sg.name_any(), "No security group was created, nothing to delete");
            return Ok(());
        }

        let tenant = record.sg.spec.tenant();

        record.set_conditions([Condition::deleting()]);
        self.persist_status(record).await?;

        match self.api.read_by_id(&tenant, &id).await {
            Ok(None) => {
                info!(name = %record.sg.name_any(), id = %id, "Security group already deleted");
                return Ok(());
            }
            Ok(Some(_)) => {}
            Err(e) => return Err(self.record_failure(record, e).await),
        }

        info!(name = %record.sg.name_any(), id = %id, "Deleting security group");
        match self.api.delete_by_id(&tenant, &id).await {
            Ok(message) => {
                info!(name = %record.sg.name_any(), id = %id, response = %message, "Security group deleted");
                Ok(())
            }
            Err(e) => Err(self.record_failure(record, e).await),
        }
    }

    /// Write the status if it differs from what was last persisted
    async fn persist_status(&self, record: &mut Record) -> Result<()> {
        if !record.is_dirty() {
            return Ok(());
        }

        let stored = self.store.replace_status(&record.to_resource()).await?;
        *record = Record::new(stored);
        Ok(())
    }

    /// Persist the status carrying a freshly assigned id.
    ///
    /// A conflicting write is retried once against the latest record so the
    /// id is not lost, which would lead to a second create.
    async fn persist_created(&self, record: &mut Record) -> Result<()> {
        match self.persist_status(record).await {
            Err(e) if e.is_conflict() => {
                let key = record.key();
                warn!(key = %key, id = %record.status.id, "Status conflict after create, retrying");

                let latest = self.store.get(&key).await?.ok_or_else(|| {
                    Error::store(format!(
                        "{} was removed before security group {} could be recorded",
                        key,
                        record.status.id
                    ))
                })?;

                let mut retry = Record::new(latest);
                retry.status = record.status.clone();
                self.persist_status(&mut retry).await?;
                *record = retry;
                Ok(())
            }
            other => other,
        }
    }

    /// Record `err` as `Synced=False/ReconcileError` and hand it back
    async fn record_failure(&self, record: &mut Record, err: Error) -> Error {
        warn!(name = %record.sg.name_any(), error = %err, "Reconciliation against DCS failed");

        record.set_conditions([Condition::reconcile_error(&err)]);
        match self.persist_status(record).await {
            Ok(()) => err,
            Err(persist_err) => {
                error!(
                    name = %record.sg.name_any(),
                    error = %err,
                    persist_error = %persist_err,
                    "Failed to record reconciliation error in status"
                );
                persist_err
            }
        }
    }
}
