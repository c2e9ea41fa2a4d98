//! `PostgreSQL` backend.
//!
//! Statements are assembled with [`QueryBuilder`] from the entity's table and
//! column hooks; every value is bound, never interpolated. Lifecycle
//! transitions lock the row with `SELECT ... FOR UPDATE` so concurrent
//! writers to the same record serialize.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use ecommerce_core::{
    BulkTransition, DeletePolicy, Effect, LifecycleState, RecordId, Transition,
};

use super::RepositoryError;
use super::backend::{Filter, Patch, RecordBackend, TransitionOutcome, Value, Visibility, Window};
use crate::record::{Entity, Record, select_list};

/// Backend storing `E` in its `PostgreSQL` table.
pub struct PgBackend<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PgBackend<E> {
    /// Create a backend sharing `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for PgBackend<E> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

// =============================================================================
// SQL helpers
// =============================================================================

/// Escape `LIKE` metacharacters so the term matches literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Int(v) => qb.push_bind(*v),
        Value::Text(v) => qb.push_bind(v.clone()),
        Value::OptText(v) => qb.push_bind(v.clone()),
        Value::Decimal(v) => qb.push_bind(*v),
    };
}

fn push_filter<E: Entity>(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    qb.push(" WHERE ");
    qb.push(match filter.visibility {
        Visibility::All => "TRUE",
        Visibility::Active => "deleted_at IS NULL",
        Visibility::Trashed => "deleted_at IS NOT NULL",
    });

    for (key, value) in &filter.keys {
        qb.push(" AND ");
        if matches!(value, Value::Text(_)) {
            qb.push(format_args!("LOWER({}) = LOWER(", key.column()));
            push_value(qb, value);
            qb.push(")");
        } else {
            qb.push(format_args!("{} = ", key.column()));
            push_value(qb, value);
        }
    }

    if !filter.search.is_empty() && !E::SEARCH_COLUMNS.is_empty() {
        let pattern = like_pattern(&filter.search);
        qb.push(" AND (");
        let mut first = true;
        for column in E::SEARCH_COLUMNS {
            if !first {
                qb.push(" OR ");
            }
            first = false;
            qb.push(format_args!("{column} ILIKE "));
            qb.push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn decode_all<E: Entity>(rows: &[PgRow]) -> Result<Vec<Record<E>>, RepositoryError> {
    rows.iter().map(Record::from_pg_row).collect()
}

// =============================================================================
// Backend
// =============================================================================

#[async_trait]
impl<E: Entity> RecordBackend<E> for PgBackend<E> {
    async fn fetch(&self, id: E::Id) -> Result<Option<Record<E>>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            select_list::<E>(),
            E::TABLE
        ));
        qb.push_bind(id.raw());

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(Record::from_pg_row).transpose()
    }

    async fn scan(
        &self,
        filter: &Filter,
        window: Option<Window>,
    ) -> Result<(Vec<Record<E>>, u64), RepositoryError> {
        let mut select = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            select_list::<E>(),
            E::TABLE
        ));
        push_filter::<E>(&mut select, filter);
        select.push(" ORDER BY created_at ASC, id ASC");

        let Some(window) = window else {
            let rows = select.build().fetch_all(&self.pool).await?;
            let records = decode_all(&rows)?;
            let total = records.len() as u64;
            return Ok((records, total));
        };

        select.push(" LIMIT ");
        select.push_bind(to_i64(window.limit));
        select.push(" OFFSET ");
        select.push_bind(to_i64(window.offset));

        let mut count = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
        push_filter::<E>(&mut count, filter);

        // Count and slice must see the same snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;
        let rows = select.build().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let total = u64::try_from(total).map_err(RepositoryError::decode)?;
        Ok((decode_all(&rows)?, total))
    }

    async fn insert(&self, fields: E) -> Result<Record<E>, RepositoryError> {
        fields
            .validate()
            .map_err(|reason| RepositoryError::Validation(format!("{}: {reason}", E::NAME)))?;

        let mut qb = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            E::TABLE,
            E::COLUMNS.join(", ")
        ));
        let mut values = qb.separated(", ");
        for value in fields.values() {
            match value {
                Value::Int(v) => values.push_bind(v),
                Value::Text(v) => values.push_bind(v),
                Value::OptText(v) => values.push_bind(v),
                Value::Decimal(v) => values.push_bind(v),
            };
        }
        qb.push(format_args!(") RETURNING {}", select_list::<E>()));

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, E::NAME))?;
        Record::from_pg_row(&row)
    }

    async fn modify(
        &self,
        id: E::Id,
        patch: Patch<E>,
    ) -> Result<Option<Record<E>>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut lock = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            select_list::<E>(),
            E::TABLE
        ));
        lock.push_bind(id.raw());
        lock.push(" FOR UPDATE");
        let Some(row) = lock.build().fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };
        let mut fields = Record::<E>::from_pg_row(&row)?.into_fields();
        patch(&mut fields);
        fields
            .validate()
            .map_err(|reason| RepositoryError::Validation(format!("{}: {reason}", E::NAME)))?;

        let mut update = QueryBuilder::new(format!("UPDATE {} SET ", E::TABLE));
        for (column, value) in E::COLUMNS.iter().zip(fields.values()) {
            update.push(format_args!("{column} = "));
            push_value(&mut update, &value);
            update.push(", ");
        }
        update.push("updated_at = now() WHERE id = ");
        update.push_bind(id.raw());
        update.push(format_args!(" RETURNING {}", select_list::<E>()));

        let row = update
            .build()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, E::NAME))?;
        let record = Record::from_pg_row(&row)?;
        tx.commit().await?;
        Ok(Some(record))
    }

    async fn transition(
        &self,
        id: E::Id,
        transition: Transition,
        policy: DeletePolicy,
    ) -> Result<TransitionOutcome<E>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut lock = QueryBuilder::new(format!(
            "SELECT deleted_at FROM {} WHERE id = ",
            E::TABLE
        ));
        lock.push_bind(id.raw());
        lock.push(" FOR UPDATE");
        let Some(row) = lock.build().fetch_optional(&mut *tx).await? else {
            return Ok(TransitionOutcome::Missing);
        };
        let deleted_at: Option<chrono::DateTime<chrono::Utc>> =
            row.try_get("deleted_at").map_err(RepositoryError::decode)?;

        let effect = match LifecycleState::from_deleted_at(deleted_at.as_ref())
            .apply(transition, policy)
        {
            Ok(effect) => effect,
            Err(rejected) => return Ok(TransitionOutcome::Rejected(rejected)),
        };

        let mut qb = match effect {
            Effect::MarkTrashed => QueryBuilder::new(format!(
                "UPDATE {} SET deleted_at = now(), updated_at = now() WHERE id = ",
                E::TABLE
            )),
            Effect::ClearTrashed => QueryBuilder::new(format!(
                "UPDATE {} SET deleted_at = NULL, updated_at = now() WHERE id = ",
                E::TABLE
            )),
            Effect::Remove => QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", E::TABLE)),
            Effect::Unchanged => QueryBuilder::new(format!(
                "SELECT {} FROM {} WHERE id = ",
                select_list::<E>(),
                E::TABLE
            )),
        };
        qb.push_bind(id.raw());

        let outcome = if effect == Effect::Remove {
            qb.build()
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::from_write(e, E::NAME))?;
            TransitionOutcome::Removed
        } else {
            if effect != Effect::Unchanged {
                qb.push(format_args!(" RETURNING {}", select_list::<E>()));
            }
            let row = qb.build().fetch_one(&mut *tx).await?;
            TransitionOutcome::Kept(Record::from_pg_row(&row)?)
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn bulk_transition(&self, bulk: BulkTransition) -> Result<u64, RepositoryError> {
        let sql = match bulk.effect() {
            Effect::Remove => format!("DELETE FROM {} WHERE deleted_at IS NOT NULL", E::TABLE),
            _ => format!(
                "UPDATE {} SET deleted_at = NULL, updated_at = now() WHERE deleted_at IS NOT NULL",
                E::TABLE
            ),
        };

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, E::NAME))?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn delete_many(
        &self,
        ids: &[E::Id],
        policy: DeletePolicy,
    ) -> Result<u64, RepositoryError> {
        let wanted: BTreeSet<i32> = ids.iter().map(|id| id.raw()).collect();
        if wanted.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ANY(", E::TABLE));
        qb.push_bind(wanted.iter().copied().collect::<Vec<i32>>());
        qb.push(")");
        if policy == DeletePolicy::TrashedOnly {
            qb.push(" AND deleted_at IS NOT NULL");
        }
        qb.push(" RETURNING id");

        let mut tx = self.pool.begin().await?;
        let deleted: BTreeSet<i32> = qb
            .build_query_scalar::<i32>()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, E::NAME))?
            .into_iter()
            .collect();

        // Dropping the transaction rolls every deletion back.
        if let Some(missing) = wanted.difference(&deleted).next() {
            return Err(RepositoryError::not_found(E::NAME, missing));
        }
        tx.commit().await?;
        Ok(deleted.len() as u64)
    }

    async fn sum_line_totals(&self, filter: &Filter) -> Result<Decimal, RepositoryError> {
        let Some(expr) = E::LINE_TOTAL_SQL else {
            return Ok(Decimal::ZERO);
        };
        let mut qb = QueryBuilder::new(format!(
            "SELECT COALESCE(SUM({expr}), 0) FROM {}",
            E::TABLE
        ));
        push_filter::<E>(&mut qb, filter);

        Ok(qb.build_query_scalar::<Decimal>().fetch_one(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Key;
    use crate::entities::{Product, Role};

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("shoe"), "%shoe%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn test_filter_sql_binds_search_per_column() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        let filter = Filter::new(Visibility::Active)
            .search("mug")
            .key(Key::MerchantId, 7);
        push_filter::<Product>(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM products WHERE deleted_at IS NULL AND merchant_id = $1 \
             AND (name ILIKE $2 OR brand ILIKE $3 OR slug_product ILIKE $4)"
        );
    }

    #[test]
    fn test_filter_sql_compares_text_keys_case_insensitively() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM roles");
        let filter = Filter::new(Visibility::Trashed).key(Key::Name, "Admin");
        push_filter::<Role>(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT id FROM roles WHERE deleted_at IS NOT NULL AND LOWER(name) = LOWER($1)"
        );
    }

    #[test]
    fn test_empty_search_adds_no_predicate() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM products");
        push_filter::<Product>(&mut qb, &Filter::default());
        assert_eq!(qb.sql(), "SELECT id FROM products WHERE TRUE");
    }
}
