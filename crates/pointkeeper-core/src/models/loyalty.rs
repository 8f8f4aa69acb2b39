use serde::{Deserialize, Serialize};

use crate::utils::format::format_date;

/// Body of `POST /loyalty/earn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarnPointsRequest {
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `POST /redeem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedeemPointsRequest {
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Generic envelope returned by the earn and redeem endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    /// Stand-in for a successful response that carried no usable body.
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: String::new(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceResponse {
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub balance: i64,
    #[serde(rename = "loyaltyAccountId", default)]
    pub loyalty_account_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Earn,
    Redeem,
}

impl TransactionType {
    /// Sign shown in front of the amount in history listings.
    pub fn sign(&self) -> char {
        match self {
            TransactionType::Earn => '+',
            TransactionType::Redeem => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub points: i64,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Transaction {
    pub fn created_at_display(&self) -> String {
        format_date(&self.created_at)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}
