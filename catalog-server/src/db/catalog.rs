//! Categories and collectible items

use catalog_common::db::{Category, CategorySummary, Item, ItemCondition};
use catalog_common::{slugify, time, Error, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

use crate::pagination::{calculate_pagination, Pagination};

const ITEM_COLUMNS: &str = "id, name, slug, description, issue_date, country, condition, \
                            category_id, image, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    /// Derived from `name` when absent
    pub slug: Option<String>,
    pub description: String,
    pub issue_date: Option<NaiveDate>,
    pub country: String,
    pub condition: ItemCondition,
    pub category_id: i64,
    pub image: Option<String>,
}

/// A page of items plus its position
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: i64,
    pub pagination: Pagination,
}

fn resolve_slug(name: &str, slug: Option<&str>) -> Result<String> {
    let slug = match slug {
        Some(s) if !s.trim().is_empty() => slugify(s),
        _ => slugify(name),
    };
    if slug.is_empty() {
        return Err(Error::InvalidInput(format!("Cannot derive a slug from '{}'", name)));
    }
    Ok(slug)
}

fn conflict_on_duplicate(err: sqlx::Error, what: &str, slug: &str) -> Error {
    let err = Error::from(err);
    if err.is_unique_violation() {
        Error::Conflict(format!("{} with slug '{}' already exists", what, slug))
    } else {
        err
    }
}

pub async fn create_category(
    pool: &SqlitePool,
    name: &str,
    slug: Option<&str>,
    description: Option<&str>,
) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Category name is required".to_string()));
    }
    let slug = resolve_slug(name, slug)?;

    let category = sqlx::query_as(
        r#"
        INSERT INTO categories (name, slug, description)
        VALUES (?, ?, ?)
        RETURNING id, name, slug, description
        "#,
    )
    .bind(name)
    .bind(&slug)
    .bind(description)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_duplicate(e, "Category", &slug))?;

    info!("Created category '{}'", slug);
    Ok(category)
}

pub async fn create_item(pool: &SqlitePool, new: &NewItem) -> Result<Item> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Item name is required".to_string()));
    }
    let slug = resolve_slug(name, new.slug.as_deref())?;

    if category_by_id(pool, new.category_id).await?.is_none() {
        return Err(Error::NotFound(format!("Category {}", new.category_id)));
    }

    let now = time::now();
    let item = sqlx::query_as(&format!(
        r#"
        INSERT INTO items (name, slug, description, issue_date, country, condition,
                           category_id, image, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(&slug)
    .bind(&new.description)
    .bind(new.issue_date)
    .bind(&new.country)
    .bind(new.condition.code())
    .bind(new.category_id)
    .bind(&new.image)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_duplicate(e, "Item", &slug))?;

    info!("Created item '{}'", slug);
    Ok(item)
}

/// All categories with item counts, by name
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<CategorySummary>> {
    let categories = sqlx::query_as(
        r#"
        SELECT c.id, c.name, c.slug, c.description, COUNT(i.id) AS item_count
        FROM categories c
        LEFT JOIN items i ON i.category_id = c.id
        GROUP BY c.id
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

/// Categories with the most items first
pub async fn top_categories(pool: &SqlitePool, limit: i64) -> Result<Vec<CategorySummary>> {
    let categories = sqlx::query_as(
        r#"
        SELECT c.id, c.name, c.slug, c.description, COUNT(i.id) AS item_count
        FROM categories c
        LEFT JOIN items i ON i.category_id = c.id
        GROUP BY c.id
        ORDER BY item_count DESC, c.name
        LIMIT ?
        "#,
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let category =
        sqlx::query_as("SELECT id, name, slug, description FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(pool)
            .await?;

    Ok(category)
}

pub async fn category_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let category = sqlx::query_as("SELECT id, name, slug, description FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

/// Items filed under a category, newest first
pub async fn items_in_category(pool: &SqlitePool, category_id: i64) -> Result<Vec<Item>> {
    let items = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE category_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(category_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn item_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Item>> {
    let item = sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE slug = ?"))
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(item)
}

/// One page of all items, newest first; out-of-range pages are clamped
pub async fn latest_items(pool: &SqlitePool, page: i64, page_size: i64) -> Result<ItemPage> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;

    let pagination = calculate_pagination(total, page_size, page);

    let items = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM items ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(pagination.page_size)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    Ok(ItemPage {
        items,
        total,
        pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::db::init_memory_database;

    fn new_item(name: &str, category_id: i64) -> NewItem {
        NewItem {
            name: name.to_string(),
            slug: None,
            description: "A fine specimen".to_string(),
            issue_date: NaiveDate::from_ymd_opt(1921, 1, 1),
            country: "USA".to_string(),
            condition: ItemCondition::VeryFine,
            category_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_category_derives_slug() {
        let pool = init_memory_database().await.unwrap();
        let category = create_category(&pool, "World Coins", None, None).await.unwrap();
        assert_eq!(category.slug, "world-coins");

        let found = category_by_slug(&pool, "world-coins").await.unwrap().unwrap();
        assert_eq!(found.id, category.id);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let pool = init_memory_database().await.unwrap();
        create_category(&pool, "Stamps", None, None).await.unwrap();

        let result = create_category(&pool, "stamps!", None, None).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unsluggable_name_rejected() {
        let pool = init_memory_database().await.unwrap();
        let result = create_category(&pool, "!!!", None, None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_item_and_lookup() {
        let pool = init_memory_database().await.unwrap();
        let category = create_category(&pool, "Coins", None, None).await.unwrap();

        let item = create_item(&pool, &new_item("Peace Dollar", category.id)).await.unwrap();
        assert_eq!(item.slug, "peace-dollar");
        assert_eq!(item.condition, "VF");
        assert_eq!(item.issue_date, NaiveDate::from_ymd_opt(1921, 1, 1));

        let found = item_by_slug(&pool, "peace-dollar").await.unwrap().unwrap();
        assert_eq!(found.id, item.id);
        assert!(item_by_slug(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_item_unknown_category() {
        let pool = init_memory_database().await.unwrap();
        let result = create_item(&pool, &new_item("Orphan", 77)).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_category_counts_and_top() {
        let pool = init_memory_database().await.unwrap();
        let coins = create_category(&pool, "Coins", None, None).await.unwrap();
        let stamps = create_category(&pool, "Stamps", None, None).await.unwrap();
        create_category(&pool, "Banknotes", None, None).await.unwrap();

        for name in ["A", "B", "C"] {
            create_item(&pool, &new_item(&format!("Coin {}", name), coins.id)).await.unwrap();
        }
        create_item(&pool, &new_item("Stamp A", stamps.id)).await.unwrap();

        let all = list_categories(&pool).await.unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Banknotes", "Coins", "Stamps"]);
        assert_eq!(all[0].item_count, 0);

        let top = top_categories(&pool, 2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].slug, "coins");
        assert_eq!(top[0].item_count, 3);
        assert_eq!(top[1].slug, "stamps");

        assert_eq!(items_in_category(&pool, coins.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_latest_items_pages() {
        let pool = init_memory_database().await.unwrap();
        let category = create_category(&pool, "Coins", None, None).await.unwrap();
        for n in 0..5 {
            create_item(&pool, &new_item(&format!("Coin {}", n), category.id)).await.unwrap();
        }

        let first = latest_items(&pool, 1, 2).await.unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.pagination.total_pages, 3);
        // Newest first
        assert_eq!(first.items[0].slug, "coin-4");

        let clamped = latest_items(&pool, 50, 2).await.unwrap();
        assert_eq!(clamped.pagination.page, 3);
        assert_eq!(clamped.items.len(), 1);
        assert_eq!(clamped.items[0].slug, "coin-0");
    }
}
