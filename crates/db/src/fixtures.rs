use sqlx::Row;

use glimmer_core::domain::interaction::EventKind;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

struct ParentSeed {
    id: i64,
    name: &'static str,
}

struct CategorySeed {
    id: i64,
    name: &'static str,
    parent_id: i64,
}

struct ProductSeed {
    id: i64,
    category_id: i64,
    name: &'static str,
    short_description: &'static str,
    description: &'static str,
    metal: &'static str,
}

struct EventSeed {
    session: &'static str,
    user_id: Option<i64>,
    product_id: i64,
    kind: EventKind,
}

const PARENTS: &[ParentSeed] =
    &[ParentSeed { id: 1, name: "Bridal" }, ParentSeed { id: 2, name: "Everyday" }];

const CATEGORIES: &[CategorySeed] = &[
    CategorySeed { id: 10, name: "Necklaces", parent_id: 1 },
    CategorySeed { id: 11, name: "Earrings", parent_id: 1 },
    CategorySeed { id: 12, name: "Bangles", parent_id: 2 },
    CategorySeed { id: 13, name: "Rings", parent_id: 2 },
    CategorySeed { id: 14, name: "Anklets", parent_id: 2 },
];

const PRODUCTS: &[ProductSeed] = &[
    ProductSeed {
        id: 1,
        category_id: 10,
        name: "Kundan Rani Haar",
        short_description: "Layered bridal kundan necklace",
        description: "Three layers of kundan work with polki drops and emerald beads",
        metal: "Yellow Gold",
    },
    ProductSeed {
        id: 2,
        category_id: 10,
        name: "Temple Lakshmi Haram",
        short_description: "Long temple necklace",
        description: "Hand carved lakshmi coins with ruby accents in antique finish",
        metal: "Yellow Gold",
    },
    ProductSeed {
        id: 3,
        category_id: 10,
        name: "Polki Choker",
        short_description: "Bridal polki choker",
        description: "Uncut polki diamonds set close to the neck with pearl fringe",
        metal: "Rose Gold",
    },
    ProductSeed {
        id: 4,
        category_id: 11,
        name: "Chandbali Jhumka",
        short_description: "Crescent kundan earrings",
        description: "Chandbali crescent with kundan stones and pearl drops",
        metal: "Yellow Gold",
    },
    ProductSeed {
        id: 5,
        category_id: 11,
        name: "Pearl Drop Jhumka",
        short_description: "Temple jhumka with pearls",
        description: "Bell shaped temple jhumka finished with freshwater pearl drops",
        metal: "Yellow Gold",
    },
    ProductSeed {
        id: 6,
        category_id: 11,
        name: "Diamond Studs",
        short_description: "Everyday solitaire studs",
        description: "Round brilliant diamond studs in a four prong setting",
        metal: "White Gold",
    },
    ProductSeed {
        id: 7,
        category_id: 12,
        name: "Antique Gold Kada",
        short_description: "Broad antique bangle",
        description: "Broad kada with antique temple motifs and screw closure",
        metal: "Yellow Gold",
    },
    ProductSeed {
        id: 8,
        category_id: 12,
        name: "Kundan Bangle Pair",
        short_description: "Bridal kundan bangles",
        description: "Pair of bangles lined with kundan stones and red enamel",
        metal: "Yellow Gold",
    },
    ProductSeed {
        id: 9,
        category_id: 13,
        name: "Solitaire Ring",
        short_description: "Classic diamond solitaire",
        description: "Single round diamond solitaire on a slim band",
        metal: "Platinum",
    },
    ProductSeed {
        id: 10,
        category_id: 13,
        name: "Ruby Cocktail Ring",
        short_description: "Statement ruby ring",
        description: "Oval ruby surrounded by a halo of small diamonds",
        metal: "Rose Gold",
    },
    ProductSeed {
        id: 11,
        category_id: 14,
        name: "Oxidised Silver Payal",
        short_description: "Oxidised anklet pair",
        description: "Oxidised silver payal with ghungroo bells",
        metal: "Silver",
    },
    ProductSeed {
        id: 12,
        category_id: 14,
        name: "Beaded Silver Anklet",
        short_description: "Light everyday anklet",
        description: "Fine silver chain anklet with tiny beads",
        metal: "Silver",
    },
];

const EVENTS: &[EventSeed] = &[
    EventSeed { session: "demo-bride-1", user_id: Some(101), product_id: 1, kind: EventKind::View },
    EventSeed { session: "demo-bride-1", user_id: Some(101), product_id: 4, kind: EventKind::Wishlist },
    EventSeed { session: "demo-bride-1", user_id: Some(101), product_id: 1, kind: EventKind::Order },
    EventSeed { session: "demo-bride-1", user_id: Some(101), product_id: 4, kind: EventKind::Order },
    EventSeed { session: "demo-bride-1", user_id: Some(101), product_id: 8, kind: EventKind::Order },
    EventSeed { session: "demo-bride-2", user_id: Some(102), product_id: 3, kind: EventKind::View },
    EventSeed { session: "demo-bride-2", user_id: Some(102), product_id: 3, kind: EventKind::Cart },
    EventSeed { session: "demo-bride-2", user_id: Some(102), product_id: 3, kind: EventKind::Order },
    EventSeed { session: "demo-bride-2", user_id: Some(102), product_id: 5, kind: EventKind::Order },
    EventSeed { session: "demo-bride-2", user_id: Some(102), product_id: 4, kind: EventKind::Order },
    EventSeed { session: "demo-guest-1", user_id: None, product_id: 2, kind: EventKind::View },
    EventSeed { session: "demo-guest-1", user_id: None, product_id: 7, kind: EventKind::View },
    EventSeed { session: "demo-guest-1", user_id: None, product_id: 7, kind: EventKind::Cart },
    EventSeed { session: "demo-guest-2", user_id: None, product_id: 9, kind: EventKind::View },
    EventSeed { session: "demo-guest-2", user_id: None, product_id: 6, kind: EventKind::Wishlist },
    EventSeed { session: "demo-guest-2", user_id: None, product_id: 6, kind: EventKind::Order },
    EventSeed { session: "demo-guest-2", user_id: None, product_id: 9, kind: EventKind::Order },
    EventSeed { session: "demo-guest-3", user_id: None, product_id: 11, kind: EventKind::View },
    EventSeed { session: "demo-guest-3", user_id: None, product_id: 12, kind: EventKind::View },
];

/// Fixed timestamp for every demo event so reloading stays byte-identical.
const DEMO_EVENT_TIMESTAMP: &str = "2026-01-15T10:00:00+00:00";

/// Deterministic demo jewelry catalog with a small interaction log.
///
/// Loading is idempotent: catalog rows are upserted and the demo sessions'
/// events are replaced, so repeated loads leave the same data behind.
pub struct DemoCatalog;

impl DemoCatalog {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        for parent in PARENTS {
            sqlx::query(
                "INSERT INTO parent_category (id, name, position) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, position = excluded.position",
            )
            .bind(parent.id)
            .bind(parent.name)
            .bind(parent.id)
            .execute(&mut *tx)
            .await?;
        }

        for category in CATEGORIES {
            sqlx::query(
                "INSERT INTO product_category (id, name) VALUES (?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            )
            .bind(category.id)
            .bind(category.name)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "INSERT INTO parent_category_assignment (parent_id, category_id) VALUES (?, ?)
                 ON CONFLICT(category_id) DO UPDATE SET parent_id = excluded.parent_id",
            )
            .bind(category.parent_id)
            .bind(category.id)
            .execute(&mut *tx)
            .await?;
        }

        for product in PRODUCTS {
            sqlx::query(
                "INSERT INTO product (id, category_id, name, short_description, description, metal)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     category_id = excluded.category_id,
                     name = excluded.name,
                     short_description = excluded.short_description,
                     description = excluded.description,
                     metal = excluded.metal",
            )
            .bind(product.id)
            .bind(product.category_id)
            .bind(product.name)
            .bind(product.short_description)
            .bind(product.description)
            .bind(product.metal)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM user_product_interaction WHERE session_key LIKE 'demo-%'")
            .execute(&mut *tx)
            .await?;
        for event in EVENTS {
            sqlx::query(
                "INSERT INTO user_product_interaction
                     (user_id, session_key, product_id, event, weight, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(event.user_id)
            .bind(event.session)
            .bind(event.product_id)
            .bind(event.kind.as_str())
            .bind(event.kind.default_weight())
            .bind(DEMO_EVENT_TIMESTAMP)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            parent_categories: PARENTS.len(),
            categories: CATEGORIES.len(),
            products: PRODUCTS.len(),
            events: EVENTS.len(),
        })
    }

    /// Checks that every demo row is present.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let products = count(pool, "SELECT COUNT(*) AS count FROM product WHERE id BETWEEN 1 AND 12")
            .await?;
        checks.push(("demo-products", products == PRODUCTS.len() as i64));

        let assignments = count(
            pool,
            "SELECT COUNT(*) AS count FROM parent_category_assignment WHERE category_id BETWEEN 10 AND 14",
        )
        .await?;
        checks.push(("demo-category-parents", assignments == CATEGORIES.len() as i64));

        let events = count(
            pool,
            "SELECT COUNT(*) AS count FROM user_product_interaction WHERE session_key LIKE 'demo-%'",
        )
        .await?;
        checks.push(("demo-interactions", events == EVENTS.len() as i64));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { checks, all_present })
    }
}

async fn count(pool: &DbPool, sql: &str) -> Result<i64, RepositoryError> {
    let row = sqlx::query(sql).fetch_one(pool).await?;
    row.try_get::<i64, _>("count").map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub parent_categories: usize,
    pub categories: usize,
    pub products: usize,
    pub events: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub checks: Vec<(&'static str, bool)>,
    pub all_present: bool,
}
