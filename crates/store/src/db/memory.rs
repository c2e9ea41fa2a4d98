//! In-process backend.
//!
//! Each table sits behind one [`RwLock`]. Mutations take the write lock,
//! decide, and apply without awaiting in between, so every operation is
//! atomic and a dropped future never leaves a half-applied change.
//!
//! Uniqueness follows [`Entity::unique_keys`]. Foreign keys and cascades are
//! not modelled: removing a parent leaves its children in place.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use ecommerce_core::{BulkTransition, DeletePolicy, Effect, RecordId, Transition};

use super::RepositoryError;
use super::backend::{Filter, Patch, RecordBackend, TransitionOutcome, Window};
use crate::record::{Entity, Record};

struct Table<E: Entity> {
    rows: BTreeMap<E::Id, Record<E>>,
    next_id: i32,
}

impl<E: Entity> Table<E> {
    fn matches(record: &Record<E>, filter: &Filter) -> bool {
        if !filter.visibility.admits(record.state()) {
            return false;
        }
        let keys_match = filter.keys.iter().all(|(key, value)| {
            record
                .fields
                .key(*key)
                .is_some_and(|stored| stored.matches(value))
        });
        if !keys_match {
            return false;
        }
        if filter.search.is_empty() {
            return true;
        }
        let needle = filter.search.to_lowercase();
        record
            .fields
            .search_values(record.id)
            .iter()
            .any(|value| value.to_lowercase().contains(&needle))
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Record<E>> + 'a {
        self.rows
            .values()
            .filter(move |record| Self::matches(record, filter))
    }

    /// Reject `fields` if another record already holds one of its unique keys.
    fn check_unique(&self, fields: &E, except: Option<E::Id>) -> Result<(), RepositoryError> {
        let keys = fields.unique_keys();
        if keys.is_empty() {
            return Ok(());
        }
        for record in self.rows.values() {
            if Some(record.id) == except {
                continue;
            }
            let taken = record.fields.unique_keys();
            if let Some((constraint, _)) = keys.iter().find(|key| taken.contains(key)) {
                return Err(RepositoryError::Conflict(format!(
                    "{} already exists ({constraint})",
                    E::NAME
                )));
            }
        }
        Ok(())
    }
}

/// Backend keeping `E` records in process memory.
pub struct MemoryBackend<E: Entity> {
    table: RwLock<Table<E>>,
}

impl<E: Entity> MemoryBackend<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of stored records in any lifecycle state.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<E: Entity> Default for MemoryBackend<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid<E: Entity>(fields: &E) -> Result<(), RepositoryError> {
    fields
        .validate()
        .map_err(|reason| RepositoryError::Validation(format!("{}: {reason}", E::NAME)))
}

#[async_trait]
impl<E: Entity> RecordBackend<E> for MemoryBackend<E> {
    async fn fetch(&self, id: E::Id) -> Result<Option<Record<E>>, RepositoryError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn scan(
        &self,
        filter: &Filter,
        window: Option<Window>,
    ) -> Result<(Vec<Record<E>>, u64), RepositoryError> {
        let table = self.table.read().await;
        let mut matched: Vec<&Record<E>> = table.matching(filter).collect();
        matched.sort_by_key(|record| (record.created_at, record.id));

        let total = matched.len() as u64;
        let records = match window {
            Some(window) => matched
                .into_iter()
                .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            None => matched.into_iter().cloned().collect(),
        };
        Ok((records, total))
    }

    async fn insert(&self, fields: E) -> Result<Record<E>, RepositoryError> {
        invalid(&fields)?;
        let mut table = self.table.write().await;
        table.check_unique(&fields, None)?;

        let id = E::Id::from_raw(table.next_id);
        table.next_id = table
            .next_id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::Conflict(format!("{} id space exhausted", E::NAME)))?;

        let now = Utc::now();
        let record = Record {
            id,
            fields,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn modify(
        &self,
        id: E::Id,
        patch: Patch<E>,
    ) -> Result<Option<Record<E>>, RepositoryError> {
        let mut table = self.table.write().await;
        let Some(current) = table.rows.get(&id) else {
            return Ok(None);
        };

        let mut fields = current.fields.clone();
        patch(&mut fields);
        invalid(&fields)?;
        table.check_unique(&fields, Some(id))?;

        let Some(record) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        record.fields = fields;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn transition(
        &self,
        id: E::Id,
        transition: Transition,
        policy: DeletePolicy,
    ) -> Result<TransitionOutcome<E>, RepositoryError> {
        let mut table = self.table.write().await;
        let Some(state) = table.rows.get(&id).map(Record::state) else {
            return Ok(TransitionOutcome::Missing);
        };

        let effect = match state.apply(transition, policy) {
            Ok(effect) => effect,
            Err(rejected) => return Ok(TransitionOutcome::Rejected(rejected)),
        };
        if effect == Effect::Remove {
            table.rows.remove(&id);
            return Ok(TransitionOutcome::Removed);
        }

        let Some(record) = table.rows.get_mut(&id) else {
            return Ok(TransitionOutcome::Missing);
        };
        let now = Utc::now();
        match effect {
            Effect::MarkTrashed => {
                record.deleted_at = Some(now);
                record.updated_at = now;
            }
            Effect::ClearTrashed => {
                record.deleted_at = None;
                record.updated_at = now;
            }
            Effect::Unchanged | Effect::Remove => {}
        }
        Ok(TransitionOutcome::Kept(record.clone()))
    }

    async fn bulk_transition(&self, bulk: BulkTransition) -> Result<u64, RepositoryError> {
        let mut table = self.table.write().await;
        let source = bulk.source();
        let selected: Vec<E::Id> = table
            .rows
            .values()
            .filter(|record| record.state() == source)
            .map(|record| record.id)
            .collect();

        let now = Utc::now();
        for id in &selected {
            match bulk.effect() {
                Effect::Remove => {
                    table.rows.remove(id);
                }
                _ => {
                    if let Some(record) = table.rows.get_mut(id) {
                        record.deleted_at = None;
                        record.updated_at = now;
                    }
                }
            }
        }
        Ok(selected.len() as u64)
    }

    async fn delete_many(
        &self,
        ids: &[E::Id],
        policy: DeletePolicy,
    ) -> Result<u64, RepositoryError> {
        let wanted: BTreeSet<E::Id> = ids.iter().copied().collect();
        let mut table = self.table.write().await;

        for id in &wanted {
            let deletable = table.rows.get(id).is_some_and(|record| {
                record
                    .state()
                    .apply(Transition::DeletePermanent, policy)
                    .is_ok()
            });
            if !deletable {
                return Err(RepositoryError::not_found(E::NAME, id));
            }
        }
        for id in &wanted {
            table.rows.remove(id);
        }
        Ok(wanted.len() as u64)
    }

    async fn sum_line_totals(&self, filter: &Filter) -> Result<Decimal, RepositoryError> {
        let table = self.table.read().await;
        Ok(table
            .matching(filter)
            .filter_map(|record| record.fields.line_total())
            .sum())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{Key, Visibility};
    use crate::entities::{Role, Slider};
    use ecommerce_core::SliderId;

    fn slider(name: &str) -> Slider {
        Slider {
            name: name.to_owned(),
            image: format!("{name}.png"),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let backend = MemoryBackend::<Slider>::new();
        let a = backend.insert(slider("a")).await.unwrap();
        let b = backend.insert(slider("b")).await.unwrap();
        assert_eq!(a.id, SliderId::new(1));
        assert_eq!(b.id, SliderId::new(2));
        assert_eq!(a.created_at, a.updated_at);
        assert!(a.deleted_at.is_none());
        assert_eq!(backend.len().await, 2);
    }

    #[tokio::test]
    async fn test_scan_counts_before_window() {
        let backend = MemoryBackend::<Slider>::new();
        for name in ["banner-1", "banner-2", "hero", "banner-3"] {
            backend.insert(slider(name)).await.unwrap();
        }
        let filter = Filter::new(Visibility::All).search("BANNER");
        let (items, total) = backend
            .scan(&filter, Some(Window { offset: 1, limit: 1 }))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "banner-2");
    }

    #[tokio::test]
    async fn test_search_is_literal() {
        let backend = MemoryBackend::<Slider>::new();
        backend.insert(slider("50% off")).await.unwrap();
        backend.insert(slider("500 off")).await.unwrap();
        let (items, total) = backend
            .scan(&Filter::default().search("0%"), None)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "50% off");
    }

    #[tokio::test]
    async fn test_unique_keys_conflict() {
        let backend = MemoryBackend::<Role>::new();
        backend.insert(Role::new("Admin")).await.unwrap();
        let err = backend.insert(Role::new("admin")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_modify_keeps_own_unique_key() {
        let backend = MemoryBackend::<Role>::new();
        let role = backend.insert(Role::new("Admin")).await.unwrap();
        let updated = backend
            .modify(role.id, Box::new(|r: &mut Role| r.name = "ADMIN".to_owned()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "ADMIN");
        assert!(updated.updated_at >= role.updated_at);
    }

    #[tokio::test]
    async fn test_key_filter() {
        let backend = MemoryBackend::<Role>::new();
        backend.insert(Role::new("Admin")).await.unwrap();
        backend.insert(Role::new("Merchant")).await.unwrap();
        let filter = Filter::default().key(Key::Name, "merchant");
        let (items, _) = backend.scan(&filter, None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Merchant");
    }

    #[tokio::test]
    async fn test_delete_many_is_all_or_nothing() {
        let backend = MemoryBackend::<Slider>::new();
        let a = backend.insert(slider("a")).await.unwrap();
        let err = backend
            .delete_many(&[a.id, SliderId::new(99)], DeletePolicy::AnyState)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(backend.len().await, 1);

        let deleted = backend
            .delete_many(&[a.id, a.id], DeletePolicy::AnyState)
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_many_respects_policy() {
        let backend = MemoryBackend::<Slider>::new();
        let a = backend.insert(slider("a")).await.unwrap();
        let err = backend
            .delete_many(&[a.id], DeletePolicy::TrashedOnly)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(backend.len().await, 1);
    }
}
