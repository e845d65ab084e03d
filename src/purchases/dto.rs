use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /purchase`. `cost` accepts a JSON number or a decimal string.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePurchaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost: Option<Value>,
    pub date: Option<String>,
    pub label: Option<String>,
}

/// Body of `PUT /purchase/:id`; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePurchaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost: Option<Value>,
    pub date: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}
