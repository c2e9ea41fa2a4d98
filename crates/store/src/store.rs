//! Generic per-entity store.
//!
//! [`EntityStore`] turns the backend primitives into the operations every
//! entity shares: paged listings by lifecycle state, point lookup, create,
//! update and the trash / restore / delete lifecycle. Entity-specific queries
//! are inherent impls on `EntityStore<X>` in [`crate::entities`].

use std::sync::Arc;

use tracing::{debug, info, instrument};

use ecommerce_core::{
    BulkTransition, DeletePolicy, LifecycleState, Page, PageRequest, Transition,
};

use crate::db::{
    Filter, MemoryBackend, Patch, RecordBackend, RepositoryError, TransitionOutcome, Visibility,
    Window,
};
use crate::record::{Entity, Record};

/// Repository for one entity, backed by any [`RecordBackend`].
pub struct EntityStore<E: Entity> {
    backend: Arc<dyn RecordBackend<E>>,
    policy: DeletePolicy,
}

impl<E: Entity> Clone for EntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            policy: self.policy,
        }
    }
}

impl<E: Entity> std::fmt::Debug for EntityStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("entity", &E::NAME)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> EntityStore<E> {
    /// Create a store over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend<E>>, policy: DeletePolicy) -> Self {
        Self { backend, policy }
    }

    /// Store over a fresh, empty in-memory table.
    #[must_use]
    pub fn in_memory(policy: DeletePolicy) -> Self {
        Self::new(Arc::new(MemoryBackend::<E>::new()), policy)
    }

    /// Permanent delete policy applied by this store.
    #[must_use]
    pub const fn policy(&self) -> DeletePolicy {
        self.policy
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Page through all records, Active and Trashed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn find_all(&self, request: &PageRequest) -> Result<Page<Record<E>>, RepositoryError> {
        self.page(Filter::new(Visibility::All), request).await
    }

    /// Page through Active records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn find_active(
        &self,
        request: &PageRequest,
    ) -> Result<Page<Record<E>>, RepositoryError> {
        self.page(Filter::new(Visibility::Active), request).await
    }

    /// Page through Trashed records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn find_trashed(
        &self,
        request: &PageRequest,
    ) -> Result<Page<Record<E>>, RepositoryError> {
        self.page(Filter::new(Visibility::Trashed), request).await
    }

    /// Number of records in `state`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn count(&self, state: LifecycleState) -> Result<u64, RepositoryError> {
        let (_, total) = self
            .backend
            .scan(
                &Filter::new(state.into()),
                Some(Window {
                    offset: 0,
                    limit: 0,
                }),
            )
            .await?;
        Ok(total)
    }

    /// One page of records matching `filter` plus the request's search term.
    pub(crate) async fn page(
        &self,
        filter: Filter,
        request: &PageRequest,
    ) -> Result<Page<Record<E>>, RepositoryError> {
        let filter = filter.search(request.search());
        let (items, total) = self
            .backend
            .scan(&filter, Some(Window::from(request)))
            .await?;
        Ok(Page::new(items, total, request))
    }

    /// Every record matching `filter`, in creation order.
    pub(crate) async fn list(&self, filter: &Filter) -> Result<Vec<Record<E>>, RepositoryError> {
        let (items, _) = self.backend.scan(filter, None).await?;
        Ok(items)
    }

    /// Oldest record matching `filter`.
    pub(crate) async fn first(&self, filter: &Filter) -> Result<Option<Record<E>>, RepositoryError> {
        let (items, _) = self
            .backend
            .scan(filter, Some(Window { offset: 0, limit: 1 }))
            .await?;
        Ok(items.into_iter().next())
    }

    pub(crate) fn backend(&self) -> &dyn RecordBackend<E> {
        self.backend.as_ref()
    }

    // =========================================================================
    // Single records
    // =========================================================================

    /// Look up a record in any lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn find_by_id(&self, id: E::Id) -> Result<Record<E>, RepositoryError> {
        self.backend
            .fetch(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(E::NAME, id))
    }

    /// Store a new Active record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a unique field is taken or a
    /// referenced record is missing, `RepositoryError::Validation` if a field
    /// is out of range.
    #[instrument(skip(self, fields), fields(entity = E::NAME))]
    pub async fn create(&self, fields: E) -> Result<Record<E>, RepositoryError> {
        let record = self.backend.insert(fields).await?;
        debug!(id = %record.id, "created");
        Ok(record)
    }

    /// Replace the business fields of an Active or Trashed record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist, plus
    /// the same errors as [`EntityStore::create`].
    #[instrument(skip(self, fields), fields(entity = E::NAME))]
    pub async fn update(&self, id: E::Id, fields: E) -> Result<Record<E>, RepositoryError> {
        self.modify(id, Box::new(move |current: &mut E| *current = fields))
            .await
    }

    /// Atomically apply `patch` to a record's fields.
    pub(crate) async fn modify(
        &self,
        id: E::Id,
        patch: Patch<E>,
    ) -> Result<Record<E>, RepositoryError> {
        self.backend
            .modify(id, patch)
            .await?
            .ok_or_else(|| RepositoryError::not_found(E::NAME, id))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Move an Active record to the trash. Trashing a Trashed record is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn trash(&self, id: E::Id) -> Result<Record<E>, RepositoryError> {
        self.transition(id, Transition::Trash).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("{} {id} vanished while trashing", E::NAME))
        })
    }

    /// Bring a Trashed record back to Active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist or is
    /// not in the trash.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn restore(&self, id: E::Id) -> Result<Record<E>, RepositoryError> {
        self.transition(id, Transition::Restore).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("{} {id} vanished while restoring", E::NAME))
        })
    }

    /// Remove a record for good.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist, or is
    /// Active while the store only deletes Trashed records.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn delete_permanent(&self, id: E::Id) -> Result<(), RepositoryError> {
        match self.transition(id, Transition::DeletePermanent).await? {
            None => Ok(()),
            Some(_) => Err(RepositoryError::DataCorruption(format!(
                "{} {id} survived permanent delete",
                E::NAME
            ))),
        }
    }

    /// Restore every Trashed record in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails; nothing is restored then.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn restore_all(&self) -> Result<u64, RepositoryError> {
        let restored = self
            .backend
            .bulk_transition(BulkTransition::RestoreAll)
            .await?;
        info!(restored, "restored all trashed records");
        Ok(restored)
    }

    /// Permanently delete every Trashed record in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails, or
    /// `RepositoryError::Conflict` if another table still references a
    /// Trashed record; nothing is deleted then.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn delete_all_permanent(&self) -> Result<u64, RepositoryError> {
        let deleted = self
            .backend
            .bulk_transition(BulkTransition::DeleteAllPermanent)
            .await?;
        info!(deleted, "permanently deleted all trashed records");
        Ok(deleted)
    }

    /// Run a transition, mapping absent or rejected records to `NotFound`.
    /// `None` means the record was removed.
    async fn transition(
        &self,
        id: E::Id,
        transition: Transition,
    ) -> Result<Option<Record<E>>, RepositoryError> {
        match self.backend.transition(id, transition, self.policy).await? {
            TransitionOutcome::Kept(record) => Ok(Some(record)),
            TransitionOutcome::Removed => Ok(None),
            TransitionOutcome::Missing => {
                debug!(%id, ?transition, "record not found");
                Err(RepositoryError::not_found(E::NAME, id))
            }
            TransitionOutcome::Rejected(rejected) => {
                debug!(%id, %rejected, "transition rejected");
                Err(RepositoryError::not_found(E::NAME, id))
            }
        }
    }
}
