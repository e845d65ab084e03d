use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct PurchaseRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cost: Decimal,
    pub date: Date,
    pub user_id: Uuid,
    pub label_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub date: Date,
    pub user_id: Uuid,
    pub label_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub name: String,
    pub description: Option<String>,
    pub cost: Decimal,
    pub date: Date,
    pub user_id: Uuid,
    pub label_id: Uuid,
}

/// Inclusive date bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl From<PurchaseRow> for Purchase {
    fn from(r: PurchaseRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            cost: r.cost,
            date: r.date,
            user_id: r.user_id,
            label_id: r.label_id,
        }
    }
}
