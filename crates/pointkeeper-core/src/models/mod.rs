//! Data models for the loyalty API.
//!
//! - `Identity`, `LoginCredentials`, `LoginResponse`: authentication
//! - `Transaction`, `BalanceResponse`, `HistoryResponse`, `ApiResponse`: ledger reads and writes
//! - `Activity`, `Reward`, `Tier`: the fixed catalog shown by the client

pub mod catalog;
pub mod identity;
pub mod loyalty;

pub use catalog::{
    points_to_next_reward, Activity, Reward, Tier, ACTIVITIES, NEXT_REWARD_THRESHOLD, REWARDS,
};
pub use identity::{Identity, LoginCredentials, LoginResponse, LoginUser};
pub use loyalty::{
    ApiResponse, BalanceResponse, EarnPointsRequest, HistoryResponse, RedeemPointsRequest,
    Transaction, TransactionType,
};
