//! Seed reference data from a YAML file.
//!
//! Reference data is what a fresh install needs before anyone signs up:
//! roles, catalog categories and homepage sliders. Seeding is idempotent;
//! records that already exist (by role name, category slug or slider name)
//! are skipped.
//!
//! ```yaml
//! roles:
//!   - name: admin
//!   - name: merchant
//! categories:
//!   - name: Shoes
//!     description: Footwear for every season
//!     slug_category: shoes
//! sliders:
//!   - name: Summer sale
//!     image: /images/summer.jpg
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use ecommerce_core::PageRequest;
use ecommerce_store::entities::{Category, Role, Slider};
use ecommerce_store::{Repositories, RepositoryError};

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedFile {
    pub roles: Vec<Role>,
    pub categories: Vec<Category>,
    pub sliders: Vec<Slider>,
}

/// Problems found in a seed file before touching the database.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("{section}[{index}]: {field} must not be empty")]
    EmptyField {
        section: &'static str,
        index: usize,
        field: &'static str,
    },
    #[error("{section}: duplicate {field} {value:?}")]
    Duplicate {
        section: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Counts of seeded and skipped records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

impl SeedFile {
    /// Check required fields and in-file duplicates.
    #[must_use]
    pub fn validate(&self) -> Vec<SeedError> {
        let mut errors = Vec::new();
        check_section(
            "roles",
            "name",
            self.roles.iter().map(|r| r.name.to_lowercase()),
            &mut errors,
        );
        check_section(
            "categories",
            "slug_category",
            self.categories.iter().map(|c| c.slug_category.clone()),
            &mut errors,
        );
        check_section(
            "sliders",
            "name",
            self.sliders.iter().map(|s| s.name.clone()),
            &mut errors,
        );
        errors
    }
}

fn check_section(
    section: &'static str,
    field: &'static str,
    values: impl Iterator<Item = String>,
    errors: &mut Vec<SeedError>,
) {
    let mut seen = HashSet::new();
    for (index, value) in values.enumerate() {
        if value.trim().is_empty() {
            errors.push(SeedError::EmptyField {
                section,
                index,
                field,
            });
        } else if !seen.insert(value.clone()) {
            errors.push(SeedError::Duplicate {
                section,
                field,
                value,
            });
        }
    }
}

/// Seed reference data from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or the database rejects a record.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %path.display(), "Loading seed file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let repos = super::connect().await?;
    let report = seed_all(&repos, seed).await?;

    info!("Seeding complete!");
    info!("  Records inserted: {}", report.inserted);
    info!("  Records skipped (already exist): {}", report.skipped);
    Ok(())
}

/// Insert every record of `seed` that does not exist yet.
///
/// # Errors
///
/// Returns the first repository error other than a uniqueness conflict.
pub async fn seed_all(
    repos: &Repositories,
    seed: SeedFile,
) -> Result<SeedReport, RepositoryError> {
    let mut report = SeedReport::default();

    for role in seed.roles {
        if repos.roles().find_by_name(&role.name).await?.is_some() {
            report.skipped += 1;
            continue;
        }
        record(repos.roles().create(role).await, &mut report)?;
    }

    for category in seed.categories {
        record(repos.categories().create(category).await, &mut report)?;
    }

    for slider in seed.sliders {
        let existing = repos
            .sliders()
            .find_all(&PageRequest::new(slider.name.as_str(), 1, 100))
            .await?;
        if existing.items.iter().any(|s| s.name == slider.name) {
            report.skipped += 1;
            continue;
        }
        record(repos.sliders().create(slider).await, &mut report)?;
    }

    Ok(report)
}

/// Count an insert, treating a uniqueness conflict as already seeded.
fn record<T>(
    result: Result<T, RepositoryError>,
    report: &mut SeedReport,
) -> Result<(), RepositoryError> {
    match result {
        Ok(_) => report.inserted += 1,
        Err(RepositoryError::Conflict(_)) => report.skipped += 1,
        Err(err) => return Err(err),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecommerce_core::DeletePolicy;

    use super::*;

    const SEED: &str = r"
roles:
  - name: admin
  - name: merchant
categories:
  - name: Shoes
    description: Footwear
    slug_category: shoes
    image_category: null
sliders:
  - name: Summer sale
    image: /images/summer.jpg
";

    #[test]
    fn test_parse_seed_file() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.roles.len(), 2);
        assert_eq!(seed.categories[0].slug_category, "shoes");
        assert!(seed.validate().is_empty());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed: SeedFile = serde_yaml::from_str("roles:\n  - name: admin\n").unwrap();
        assert!(seed.categories.is_empty());
        assert!(seed.sliders.is_empty());
    }

    #[test]
    fn test_validate_reports_duplicates_and_blanks() {
        let seed = SeedFile {
            roles: vec![Role::new("Admin"), Role::new("admin"), Role::new(" ")],
            ..SeedFile::default()
        };
        let errors = seed.validate();
        assert_eq!(
            errors,
            vec![
                SeedError::Duplicate {
                    section: "roles",
                    field: "name",
                    value: "admin".to_owned(),
                },
                SeedError::EmptyField {
                    section: "roles",
                    index: 2,
                    field: "name",
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_seeding_twice_skips_existing() {
        let repos = Repositories::in_memory(DeletePolicy::AnyState);

        let first = seed_all(&repos, serde_yaml::from_str(SEED).unwrap()).await.unwrap();
        assert_eq!(first, SeedReport { inserted: 4, skipped: 0 });

        let second = seed_all(&repos, serde_yaml::from_str(SEED).unwrap()).await.unwrap();
        assert_eq!(second, SeedReport { inserted: 0, skipped: 4 });
    }
}
