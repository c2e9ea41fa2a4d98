//! Trash maintenance and statistics.
//!
//! # Usage
//!
//! ```bash
//! ecom-cli trash restore-all product
//! ecom-cli trash purge cart --yes
//! ecom-cli stats
//! ```

use tracing::info;

use ecommerce_store::{EntityKind, EntityStats, Repositories, RepositoryError};

/// Restore every trashed record of `kind`.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the restore fails.
pub async fn restore_all(kind: EntityKind) -> Result<(), Box<dyn std::error::Error>> {
    let repos = super::connect().await?;
    let restored = repos.restore_all(kind).await?;
    info!(entity = %kind, restored, "Trash restored");
    Ok(())
}

/// Permanently delete every trashed record of `kind`.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the purge fails; in
/// that case nothing is deleted.
pub async fn purge(kind: EntityKind) -> Result<(), Box<dyn std::error::Error>> {
    let repos = super::connect().await?;
    let deleted = repos.delete_all_permanent(kind).await?;
    info!(entity = %kind, deleted, "Trash purged");
    Ok(())
}

/// Log record counts for `kind`, or for every entity.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn stats(kind: Option<EntityKind>) -> Result<(), Box<dyn std::error::Error>> {
    let repos = super::connect().await?;
    let stats = collect(&repos, kind).await?;

    info!("Entity Statistics");
    info!("=================");
    for entry in stats {
        info!(
            "  {:<18} active: {:>8}  trashed: {:>8}",
            entry.kind, entry.active, entry.trashed
        );
    }
    Ok(())
}

/// Stats for `kind`, or for every entity in declaration order.
async fn collect(
    repos: &Repositories,
    kind: Option<EntityKind>,
) -> Result<Vec<EntityStats>, RepositoryError> {
    let kinds = kind.map_or_else(|| EntityKind::ALL.to_vec(), |kind| vec![kind]);
    let mut stats = Vec::with_capacity(kinds.len());
    for kind in kinds {
        stats.push(repos.stats(kind).await?);
    }
    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecommerce_core::DeletePolicy;
    use ecommerce_store::entities::Role;

    use super::*;

    #[tokio::test]
    async fn test_collect_all_kinds() {
        let repos = Repositories::in_memory(DeletePolicy::AnyState);
        let role = repos.roles().create(Role::new("admin")).await.unwrap();
        repos.roles().trash(role.id).await.unwrap();

        let all = collect(&repos, None).await.unwrap();
        assert_eq!(all.len(), EntityKind::ALL.len());

        let roles = collect(&repos, Some(EntityKind::Role)).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!((roles[0].active, roles[0].trashed), (0, 1));
    }
}
