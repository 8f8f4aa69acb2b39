//! Earn and redeem forms with the client-side checks that run before any
//! request is sent.

use anyhow::Result;
use thiserror::Error;

use crate::api::{normalize_error, ApiClient};
use crate::models::{Activity, ApiResponse, EarnPointsRequest, RedeemPointsRequest, Reward};

/// Largest amount a single custom earn submission may claim.
pub const MAX_EARN_POINTS: i64 = 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter at least 1 point")]
    PointsTooLow,

    #[error("You can earn at most {max} points at once")]
    PointsTooHigh { max: i64 },

    #[error("Insufficient points balance")]
    InsufficientBalance,

    #[error("Please enter a description")]
    MissingDescription,
}

/// Parse the points field the way a numeric input does: leading digits
/// count, no digits is zero, and values past `i64::MAX` saturate.
pub fn parse_points(input: &str) -> i64 {
    let digits: String = input
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    // Only overflow can fail here
    digits.parse().unwrap_or(i64::MAX)
}

fn description(input: &str) -> Result<String, FormError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingDescription)
    } else {
        Ok(trimmed.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EarnForm {
    pub points_input: String,
    pub description: String,
}

impl EarnForm {
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            points_input: activity.points.to_string(),
            description: activity.name.to_string(),
        }
    }

    pub fn points(&self) -> i64 {
        parse_points(&self.points_input)
    }

    pub fn validate(&self) -> Result<EarnPointsRequest, FormError> {
        let points = self.points();
        if points < 1 {
            return Err(FormError::PointsTooLow);
        }
        if points > MAX_EARN_POINTS {
            return Err(FormError::PointsTooHigh { max: MAX_EARN_POINTS });
        }
        Ok(EarnPointsRequest {
            points,
            description: Some(description(&self.description)?),
        })
    }

    /// Validate, then post to the earn endpoint.
    pub async fn submit(&self, api: &ApiClient) -> Result<ApiResponse> {
        let request = self.validate()?;
        api.earn_points(&request).await
    }

    pub fn success_message(points: i64) -> String {
        format!("Successfully earned {} points!", points)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedeemForm {
    pub points_input: String,
    pub description: String,
}

impl RedeemForm {
    pub fn from_reward(reward: &Reward) -> Self {
        Self {
            points_input: reward.points.to_string(),
            description: reward.name.to_string(),
        }
    }

    pub fn points(&self) -> i64 {
        parse_points(&self.points_input)
    }

    /// Whether the submit action should be offered at all.
    pub fn can_submit(&self, balance: i64) -> bool {
        self.points() <= balance
    }

    /// Balance is checked first so an over-limit request is always reported
    /// as such, whatever else is wrong with the form.
    pub fn validate(&self, balance: i64) -> Result<RedeemPointsRequest, FormError> {
        let points = self.points();
        if points > balance {
            return Err(FormError::InsufficientBalance);
        }
        if points < 1 {
            return Err(FormError::PointsTooLow);
        }
        Ok(RedeemPointsRequest {
            points,
            description: Some(description(&self.description)?),
        })
    }

    /// Validate against the last known balance, then post to the redeem endpoint.
    pub async fn submit(&self, api: &ApiClient, balance: i64) -> Result<ApiResponse> {
        let request = self.validate(balance)?;
        api.redeem_points(&request).await
    }

    pub fn success_message(points: i64) -> String {
        format!("Successfully redeemed {} points!", points)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Message to show for a failed submission: validation errors verbatim,
/// everything else through [`normalize_error`].
pub fn error_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<FormError>() {
        Some(form_error) => form_error.to_string(),
        None => normalize_error(error).message().to_string(),
    }
}
