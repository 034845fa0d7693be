#![allow(async_fn_in_trait)]

//! Card registry repository.
//!
//! All card persistence goes through the [`CardRegistry`] trait. Each method
//! normalizes the UID it is given (storage rules for `add`, search rules for
//! everything else; see `gatehub_core::uid`) and runs as one transaction
//! against the backing store. Callers get no multi-call atomicity: a
//! check-then-add race is resolved by the `UNIQUE(card_type, uid)` constraint,
//! with the losing writer seeing the duplicate signal.

use crate::error::{RegistryError, RegistryResult};
use crate::models::CardRecord;
use chrono::Utc;
use gatehub_core::{RawUid, normalize_for_search, normalize_for_storage};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Repository trait for card and media operations.
///
/// Uses native async trait methods; mock implementations back the hub and
/// bridge tests without a database.
pub trait CardRegistry: Send + Sync {
    /// True iff a card with this type and UID (search-normalized) exists.
    async fn check(&self, card_type: &str, uid: &RawUid) -> RegistryResult<bool>;

    /// Insert a card (storage-normalized UID). Returns `false` without error
    /// when the pair already exists.
    async fn add(&self, card_type: &str, uid: &RawUid) -> RegistryResult<bool>;

    /// Delete a card and any attached media row. Returns whether a card row
    /// was actually deleted.
    async fn remove(&self, card_type: &str, uid: &RawUid) -> RegistryResult<bool>;

    /// All cards joined with optional media, newest first.
    async fn list(&self) -> RegistryResult<Vec<CardRecord>>;

    /// Persist image bytes for an existing card and replace any prior
    /// attachment. Fails with [`RegistryError::CardNotFound`] otherwise.
    async fn save_image(
        &self,
        card_type: &str,
        uid: &RawUid,
        image: &[u8],
        filename: &str,
    ) -> RegistryResult<String>;

    /// Full card detail including image attachment, if the card exists.
    async fn get_with_image(
        &self,
        card_type: &str,
        uid: &RawUid,
    ) -> RegistryResult<Option<CardRecord>>;
}

/// SQLite implementation of [`CardRegistry`].
///
/// Image bytes live as files under `media_dir`; only their filenames go in
/// the database.
#[derive(Debug, Clone)]
pub struct SqliteCardRegistry {
    pool: SqlitePool,
    media_dir: PathBuf,
}

impl SqliteCardRegistry {
    /// Create a registry over an existing pool, storing images in `media_dir`.
    pub fn new(pool: SqlitePool, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            media_dir: media_dir.into(),
        }
    }

    /// Directory where uploaded images are written.
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Collision-resistant image filename: `{type}_{uid}_{unixtime}{ext}`.
    fn image_filename(card_type: &str, uid: &str, original: &str) -> String {
        let ext = Path::new(original)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        format!("{}_{}_{}{}", card_type, uid, Utc::now().timestamp(), ext)
    }
}

impl CardRegistry for SqliteCardRegistry {
    async fn check(&self, card_type: &str, uid: &RawUid) -> RegistryResult<bool> {
        let uid = normalize_for_search(uid);

        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM cards WHERE card_type = ? AND uid = ?")
                .bind(card_type)
                .bind(&uid)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0 > 0)
    }

    async fn add(&self, card_type: &str, uid: &RawUid) -> RegistryResult<bool> {
        let uid = normalize_for_storage(uid);

        // The unique constraint is authoritative: concurrent adds of the same
        // identity leave one row, and the loser sees rows_affected == 0.
        let result = sqlx::query(
            r#"
            INSERT INTO cards (card_type, uid, date_added)
            VALUES (?, ?, ?)
            ON CONFLICT (card_type, uid) DO NOTHING
            "#,
        )
        .bind(card_type)
        .bind(&uid)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            info!(card_type, uid = %uid, "Card added to registry");
        } else {
            warn!(card_type, uid = %uid, "Card already registered");
        }

        Ok(inserted)
    }

    async fn remove(&self, card_type: &str, uid: &RawUid) -> RegistryResult<bool> {
        let uid = normalize_for_search(uid);

        // Media first: the foreign key references the card row.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM media WHERE card_type = ? AND uid = ?")
            .bind(card_type)
            .bind(&uid)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM cards WHERE card_type = ? AND uid = ?")
            .bind(card_type)
            .bind(&uid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(card_type, uid = %uid, "Card removed from registry");
        } else {
            warn!(card_type, uid = %uid, "Card not found for removal");
        }

        Ok(deleted)
    }

    async fn list(&self) -> RegistryResult<Vec<CardRecord>> {
        let cards = sqlx::query_as::<_, CardRecord>(
            r#"
            SELECT c.card_type, c.uid, c.date_added,
                   m.image_filename, m.date_uploaded,
                   m.image_filename IS NOT NULL AS has_image
            FROM cards c
            LEFT JOIN media m ON c.card_type = m.card_type AND c.uid = m.uid
            ORDER BY c.date_added DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    async fn save_image(
        &self,
        card_type: &str,
        uid: &RawUid,
        image: &[u8],
        filename: &str,
    ) -> RegistryResult<String> {
        let uid = normalize_for_search(uid);

        if !self.check(card_type, &RawUid::Text(uid.clone())).await? {
            return Err(RegistryError::CardNotFound {
                card_type: card_type.to_string(),
                uid,
            });
        }

        let safe_filename = Self::image_filename(card_type, &uid, filename);
        tokio::fs::create_dir_all(&self.media_dir).await?;
        tokio::fs::write(self.media_dir.join(&safe_filename), image).await?;

        // Replace-then-insert inside one transaction: a card never has more
        // than one media row.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM media WHERE card_type = ? AND uid = ?")
            .bind(card_type)
            .bind(&uid)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO media (card_type, uid, image_filename, date_uploaded)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(card_type)
        .bind(&uid)
        .bind(&safe_filename)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(card_type, uid = %uid, filename = %safe_filename, "Card image saved");
        Ok(safe_filename)
    }

    async fn get_with_image(
        &self,
        card_type: &str,
        uid: &RawUid,
    ) -> RegistryResult<Option<CardRecord>> {
        let uid = normalize_for_search(uid);

        let record = sqlx::query_as::<_, CardRecord>(
            r#"
            SELECT c.card_type, c.uid, c.date_added,
                   m.image_filename, m.date_uploaded,
                   m.image_filename IS NOT NULL AS has_image
            FROM cards c
            LEFT JOIN media m ON c.card_type = m.card_type AND c.uid = m.uid
            WHERE c.card_type = ? AND c.uid = ?
            "#,
        )
        .bind(card_type)
        .bind(&uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use tempfile::TempDir;

    async fn setup() -> (Database, SqliteCardRegistry, TempDir) {
        let db = Database::in_memory().await.unwrap();
        let media = TempDir::new().unwrap();
        let registry = SqliteCardRegistry::new(db.pool().clone(), media.path());
        (db, registry, media)
    }

    #[tokio::test]
    async fn add_is_idempotent_safe() {
        let (_db, registry, _media) = setup().await;

        assert!(registry.add("KEY", &"09250C05".into()).await.unwrap());
        assert!(!registry.add("KEY", &"09250C05".into()).await.unwrap());

        let cards = registry.list().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].uid, "09250C05");
    }

    #[tokio::test]
    async fn concurrent_adds_of_one_identity_leave_one_row() {
        let (_db, registry, _media) = setup().await;
        let other = registry.clone();

        let uid_a = "AABB".into();
        let uid_b = "aa:bb".into();
        let (a, b) = tokio::join!(
            registry.add("KEY", &uid_a),
            other.add("KEY", &uid_b)
        );

        // Exactly one writer wins; the loser gets the duplicate signal.
        assert_eq!(u8::from(a.unwrap()) + u8::from(b.unwrap()), 1);
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn equivalent_spellings_resolve_to_one_identity() {
        let (_db, registry, _media) = setup().await;

        registry
            .add("KEY", &RawUid::Bytes(vec![0xAA, 0xBB, 0xCC, 0xDD]))
            .await
            .unwrap();

        assert!(registry.check("KEY", &"AA:BB:CC:DD".into()).await.unwrap());
        assert!(registry.check("KEY", &"aabbccdd".into()).await.unwrap());
        assert!(
            registry
                .check("KEY", &"aa bb cc dd".into())
                .await
                .unwrap()
        );
        assert!(!registry.check("WORKER", &"AABBCCDD".into()).await.unwrap());
    }

    #[tokio::test]
    async fn same_uid_under_two_types_is_two_cards() {
        let (_db, registry, _media) = setup().await;

        assert!(registry.add("KEY", &"AABB".into()).await.unwrap());
        assert!(registry.add("WORKER", &"AABB".into()).await.unwrap());

        assert_eq!(registry.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn remove_reports_whether_card_existed() {
        let (_db, registry, _media) = setup().await;

        registry.add("KEY", &"AABB".into()).await.unwrap();
        assert!(registry.remove("KEY", &"aa:bb".into()).await.unwrap());
        assert!(!registry.remove("KEY", &"AABB".into()).await.unwrap());
    }

    #[tokio::test]
    async fn save_image_requires_existing_card() {
        let (_db, registry, _media) = setup().await;

        let result = registry
            .save_image("KEY", &"AABB".into(), b"png-bytes", "photo.png")
            .await;

        assert!(matches!(result, Err(RegistryError::CardNotFound { .. })));

        let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media")
            .fetch_one(registry.pool_for_tests())
            .await
            .unwrap();
        assert_eq!(rows.0, 0);
    }

    #[tokio::test]
    async fn save_image_replaces_prior_attachment() {
        let (_db, registry, media) = setup().await;

        registry.add("KEY", &"AABB".into()).await.unwrap();
        let first = registry
            .save_image("KEY", &"AABB".into(), b"one", "a.png")
            .await
            .unwrap();
        let second = registry
            .save_image("KEY", &"AABB".into(), b"two", "b.jpg")
            .await
            .unwrap();

        assert!(first.starts_with("KEY_AABB_"));
        assert!(first.ends_with(".png"));
        assert!(second.ends_with(".jpg"));

        // Exactly one media row survives, pointing at the replacement.
        let record = registry
            .get_with_image("KEY", &"AABB".into())
            .await
            .unwrap()
            .unwrap();
        assert!(record.has_image);
        assert_eq!(record.image_filename.as_deref(), Some(second.as_str()));

        assert!(media.path().join(&second).exists());
    }

    #[tokio::test]
    async fn remove_cascades_to_media() {
        let (_db, registry, _media) = setup().await;

        registry.add("KEY", &"AABB".into()).await.unwrap();
        registry
            .save_image("KEY", &"AABB".into(), b"img", "photo.png")
            .await
            .unwrap();

        assert!(registry.remove("KEY", &"AABB".into()).await.unwrap());

        let media_rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media")
            .fetch_one(registry.pool_for_tests())
            .await
            .unwrap();
        let card_rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cards")
            .fetch_one(registry.pool_for_tests())
            .await
            .unwrap();
        assert_eq!(media_rows.0, 0);
        assert_eq!(card_rows.0, 0);
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_flags_images() {
        let (_db, registry, _media) = setup().await;

        registry.add("KEY", &"0001".into()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        registry.add("WORKER", &"0002".into()).await.unwrap();
        registry
            .save_image("WORKER", &"0002".into(), b"img", "w.png")
            .await
            .unwrap();

        let cards = registry.list().await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].uid, "0002");
        assert!(cards[0].has_image);
        assert!(!cards[1].has_image);
    }

    #[tokio::test]
    async fn get_with_image_returns_none_for_unknown_card() {
        let (_db, registry, _media) = setup().await;
        let record = registry.get_with_image("KEY", &"AABB".into()).await.unwrap();
        assert!(record.is_none());
    }

    impl SqliteCardRegistry {
        fn pool_for_tests(&self) -> &SqlitePool {
            &self.pool
        }
    }
}
