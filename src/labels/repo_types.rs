use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct LabelRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub user_id: Uuid,
}

/// Named expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub user_id: Uuid,
}

impl From<LabelRow> for Label {
    fn from(r: LabelRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            user_id: r.user_id,
        }
    }
}
