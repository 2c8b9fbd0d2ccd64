//! Startup seeding from a TOML file
//!
//! ```toml
//! [[categories]]
//! name = "Coins"
//!
//! [[items]]
//! name = "Morgan Dollar"
//! category = "coins"
//! country = "USA"
//! condition = "VF"
//! issue_date = "1921-01-01"
//!
//! [[polls]]
//! question = "Favorite metal?"
//! options = ["Silver", "Gold"]
//! ```
//!
//! Categories and items are keyed by slug and polls by question; entries
//! that already exist are skipped, so applying a file twice is harmless.

use catalog_common::db::ItemCondition;
use catalog_common::{slugify, Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};

use crate::db::catalog::{self, NewItem};
use crate::db::polls;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub items: Vec<SeedItem>,
    #[serde(default)]
    pub polls: Vec<SeedPoll>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub name: String,
    pub slug: Option<String>,
    /// Category slug
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub country: String,
    pub condition: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPoll {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Counts of rows created by one `apply_seed` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub items: usize,
    pub polls: usize,
}

pub fn parse_seed(content: &str) -> Result<SeedFile> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid seed file: {}", e)))
}

pub fn load_seed_file(path: &Path) -> Result<SeedFile> {
    let content = std::fs::read_to_string(path)?;
    parse_seed(&content)
}

/// Create whatever the seed describes that does not exist yet
pub async fn apply_seed(pool: &SqlitePool, seed: &SeedFile) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for category in &seed.categories {
        let slug = slug_for(&category.name, category.slug.as_deref());
        if catalog::category_by_slug(pool, &slug).await?.is_some() {
            debug!("Seed: category '{}' exists", slug);
            continue;
        }
        catalog::create_category(
            pool,
            &category.name,
            Some(&slug),
            category.description.as_deref(),
        )
        .await?;
        report.categories += 1;
    }

    for item in &seed.items {
        let slug = slug_for(&item.name, item.slug.as_deref());
        if catalog::item_by_slug(pool, &slug).await?.is_some() {
            debug!("Seed: item '{}' exists", slug);
            continue;
        }
        let category = catalog::category_by_slug(pool, &item.category)
            .await?
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Seed item '{}' refers to unknown category '{}'",
                    item.name, item.category
                ))
            })?;

        catalog::create_item(
            pool,
            &NewItem {
                name: item.name.clone(),
                slug: Some(slug),
                description: item.description.clone(),
                issue_date: item.issue_date,
                country: item.country.clone(),
                condition: ItemCondition::from_code(&item.condition)?,
                category_id: category.id,
                image: item.image.clone(),
            },
        )
        .await?;
        report.items += 1;
    }

    for poll in &seed.polls {
        if polls::find_poll_by_question(pool, poll.question.trim()).await?.is_some() {
            debug!("Seed: poll '{}' exists", poll.question);
            continue;
        }
        let options: Vec<&str> = poll.options.iter().map(String::as_str).collect();
        polls::create_poll(pool, &poll.question, &options, poll.active).await?;
        report.polls += 1;
    }

    info!(
        "Seed applied: {} categories, {} items, {} polls created",
        report.categories, report.items, report.polls
    );
    Ok(report)
}

fn slug_for(name: &str, slug: Option<&str>) -> String {
    match slug {
        Some(s) if !s.trim().is_empty() => slugify(s),
        _ => slugify(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::db::init_memory_database;

    const SEED: &str = r#"
[[categories]]
name = "Coins"

[[categories]]
name = "Postage Stamps"
slug = "stamps"
description = "Gummed and perforated"

[[items]]
name = "Morgan Dollar"
category = "coins"
country = "USA"
condition = "VF"
issue_date = "1921-01-01"

[[items]]
name = "Penny Black"
category = "stamps"
country = "UK"
condition = "F"

[[polls]]
question = "Favorite metal?"
options = ["Silver", "Gold"]

[[polls]]
question = "Retired poll"
options = ["Yes"]
active = false
"#;

    #[test]
    fn test_parse_seed() {
        let seed = parse_seed(SEED).unwrap();
        assert_eq!(seed.categories.len(), 2);
        assert_eq!(seed.items[0].issue_date, NaiveDate::from_ymd_opt(1921, 1, 1));
        assert!(seed.polls[0].active);
        assert!(!seed.polls[1].active);
    }

    #[test]
    fn test_parse_errors_are_config_errors() {
        assert!(matches!(parse_seed("[[items]]\nname ="), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        let seed = parse_seed(SEED).unwrap();

        let first = apply_seed(&pool, &seed).await.unwrap();
        assert_eq!(first, SeedReport { categories: 2, items: 2, polls: 2 });

        let second = apply_seed(&pool, &seed).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let stamps = catalog::category_by_slug(&pool, "stamps").await.unwrap().unwrap();
        assert_eq!(stamps.name, "Postage Stamps");
        assert_eq!(catalog::items_in_category(&pool, stamps.id).await.unwrap().len(), 1);

        let active = polls::latest_active_poll(&pool).await.unwrap().unwrap();
        assert_eq!(active.question, "Favorite metal?");
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let pool = init_memory_database().await.unwrap();
        let seed = parse_seed(
            r#"
[[items]]
name = "Stray"
category = "nowhere"
condition = "G"
"#,
        )
        .unwrap();

        assert!(matches!(apply_seed(&pool, &seed).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unknown_condition_rejected() {
        let pool = init_memory_database().await.unwrap();
        let seed = parse_seed(
            r#"
[[categories]]
name = "Coins"

[[items]]
name = "Shiny"
category = "coins"
condition = "MINT"
"#,
        )
        .unwrap();

        assert!(matches!(apply_seed(&pool, &seed).await, Err(Error::InvalidInput(_))));
    }
}
