use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::labels::repo_types::{Label, LabelRow};

/// Lookups over the labels shared by every user.
#[async_trait]
pub trait LabelRepo: Send + Sync {
    async fn default_labels(&self) -> Result<Vec<Label>, StoreError>;
    async fn default_label_by_name(&self, name: &str) -> Result<Option<Label>, StoreError>;
}

/// Default labels are the ones owned by the account named `owner`.
#[derive(Clone)]
pub struct PgLabelRepo {
    db: PgPool,
    owner: String,
}

impl PgLabelRepo {
    pub fn new(db: PgPool, owner: impl Into<String>) -> Self {
        Self {
            db,
            owner: owner.into(),
        }
    }
}

#[async_trait]
impl LabelRepo for PgLabelRepo {
    async fn default_labels(&self) -> Result<Vec<Label>, StoreError> {
        let rows = sqlx::query_as::<_, LabelRow>(
            r#"
            SELECT l.id, l.name, l.description, l.user_id
            FROM label l
            JOIN user_account u ON u.id = l.user_id
            WHERE u.username = $1
            ORDER BY l.name
            "#,
        )
        .bind(&self.owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Label::from).collect())
    }

    async fn default_label_by_name(&self, name: &str) -> Result<Option<Label>, StoreError> {
        let row = sqlx::query_as::<_, LabelRow>(
            r#"
            SELECT l.id, l.name, l.description, l.user_id
            FROM label l
            JOIN user_account u ON u.id = l.user_id
            WHERE u.username = $1 AND l.name = $2
            "#,
        )
        .bind(&self.owner)
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Label::from))
    }
}
