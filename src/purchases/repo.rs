use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::purchases::repo_types::{DateRange, NewPurchase, Purchase, PurchaseRow};

#[async_trait]
pub trait PurchaseRepo: Send + Sync {
    async fn create_purchase(&self, new: NewPurchase) -> Result<Purchase, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Purchase>, StoreError>;
    /// Purchases within `range`, oldest first.
    async fn list_by_user_and_date(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Purchase>, StoreError>;
    /// Overwrites every mutable column. Returns `None` if the row is gone.
    async fn update_purchase(&self, purchase: &Purchase) -> Result<Option<Purchase>, StoreError>;
    async fn delete_purchase(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Purchase>, StoreError> {
        self.list_by_user_and_date(user_id, DateRange::default())
            .await
    }
}

#[derive(Clone)]
pub struct PgPurchaseRepo {
    db: PgPool,
}

impl PgPurchaseRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PurchaseRepo for PgPurchaseRepo {
    async fn create_purchase(&self, new: NewPurchase) -> Result<Purchase, StoreError> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            INSERT INTO purchase (name, description, cost, date, user_id, label_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, cost, date, user_id, label_id
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.cost)
        .bind(new.date)
        .bind(new.user_id)
        .bind(new.label_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Purchase>, StoreError> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, name, description, cost, date, user_id, label_id
            FROM purchase
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Purchase::from))
    }

    async fn list_by_user_and_date(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Purchase>, StoreError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, name, description, cost, date, user_id, label_id
            FROM purchase
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Purchase::from).collect())
    }

    async fn update_purchase(&self, purchase: &Purchase) -> Result<Option<Purchase>, StoreError> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            UPDATE purchase
            SET name = $1, description = $2, cost = $3, date = $4, label_id = $5
            WHERE id = $6
            RETURNING id, name, description, cost, date, user_id, label_id
            "#,
        )
        .bind(&purchase.name)
        .bind(&purchase.description)
        .bind(purchase.cost)
        .bind(purchase.date)
        .bind(purchase.label_id)
        .bind(purchase.id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Purchase::from))
    }

    async fn delete_purchase(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM purchase WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
