//! Repository for the `ab_assignments` table.
//!
//! Rows are append-only. Reads always filter on `expires_at > now`, and
//! creation goes through [`AbAssignmentRepo::find_or_create`], which holds
//! a transaction-scoped advisory lock on the assignment key so concurrent
//! first visits for the same key converge on one row.

use bundlewise_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::ab_assignment::{AbAssignment, AssignmentKey};

/// Column list for `ab_assignments` queries.
const COLUMNS: &str =
    "id, shop, session_id, product_id, variant_group_id, expires_at, created_at";

/// Provides sticky assignment lookups and atomic find-or-create.
pub struct AbAssignmentRepo;

impl AbAssignmentRepo {
    /// The non-expired assignment for a key, if any.
    pub async fn find_active(
        pool: &PgPool,
        key: &AssignmentKey,
        now: Timestamp,
    ) -> Result<Option<AbAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ab_assignments \
             WHERE shop = $1 AND session_id = $2 AND product_id = $3 AND expires_at > $4 \
             ORDER BY expires_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, AbAssignment>(&query)
            .bind(&key.shop)
            .bind(&key.session_id)
            .bind(&key.product_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Return the non-expired assignment for `key`, creating one with the
    /// given variant if none exists.
    ///
    /// The second element is `true` when this call inserted the row. A
    /// caller that loses a race gets the winner's row back.
    pub async fn find_or_create(
        pool: &PgPool,
        key: &AssignmentKey,
        variant_group_id: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<(AbAssignment, bool), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(key.lock_key())
            .execute(&mut *tx)
            .await?;

        let select = format!(
            "SELECT {COLUMNS} FROM ab_assignments \
             WHERE shop = $1 AND session_id = $2 AND product_id = $3 AND expires_at > $4 \
             ORDER BY expires_at DESC \
             LIMIT 1"
        );
        let existing = sqlx::query_as::<_, AbAssignment>(&select)
            .bind(&key.shop)
            .bind(&key.session_id)
            .bind(&key.product_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(row) = existing {
            tx.commit().await?;
            return Ok((row, false));
        }

        let insert = format!(
            "INSERT INTO ab_assignments \
                (shop, session_id, product_id, variant_group_id, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AbAssignment>(&insert)
            .bind(&key.shop)
            .bind(&key.session_id)
            .bind(&key.product_id)
            .bind(variant_group_id)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((row, true))
    }
}
