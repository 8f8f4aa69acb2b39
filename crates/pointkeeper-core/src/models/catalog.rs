//! Fixed catalog of earning activities and rewards offered by the client,
//! plus the membership tier thresholds shown on the dashboard.

/// A one-click earning activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub name: &'static str,
    pub points: i64,
}

/// A redeemable reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub name: &'static str,
    pub points: i64,
    pub description: &'static str,
}

pub const ACTIVITIES: [Activity; 6] = [
    Activity { name: "Daily Check-in", points: 10 },
    Activity { name: "Complete Survey", points: 25 },
    Activity { name: "Refer a Friend", points: 100 },
    Activity { name: "Social Media Share", points: 15 },
    Activity { name: "Product Review", points: 50 },
    Activity { name: "Newsletter Signup", points: 20 },
];

const GIFT_CARD: &str = "Digital gift card for popular stores";

pub const REWARDS: [Reward; 6] = [
    Reward { name: "$5 Gift Card", points: 500, description: GIFT_CARD },
    Reward { name: "$10 Gift Card", points: 1000, description: GIFT_CARD },
    Reward { name: "$25 Gift Card", points: 2500, description: GIFT_CARD },
    Reward { name: "Free Coffee", points: 100, description: "Complimentary coffee at partner locations" },
    Reward { name: "Free Lunch", points: 250, description: "Complimentary meal at partner restaurants" },
    Reward { name: "Premium Membership", points: 1500, description: "1-month premium membership upgrade" },
];

/// Balance at which the dashboard reports the next reward as achieved.
pub const NEXT_REWARD_THRESHOLD: i64 = 1000;

const GOLD_THRESHOLD: i64 = 1000;
const SILVER_THRESHOLD: i64 = 500;

impl Reward {
    pub fn is_affordable(&self, balance: i64) -> bool {
        balance >= self.points
    }

    /// Points still missing before this reward can be redeemed.
    pub fn shortfall(&self, balance: i64) -> Option<i64> {
        (!self.is_affordable(balance)).then(|| self.points - balance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn for_balance(balance: i64) -> Self {
        if balance >= GOLD_THRESHOLD {
            Tier::Gold
        } else if balance >= SILVER_THRESHOLD {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
        }
    }
}

/// Points remaining until the next reward, or `None` once it is reached.
pub fn points_to_next_reward(balance: i64) -> Option<i64> {
    let remaining = NEXT_REWARD_THRESHOLD - balance;
    (remaining > 0).then_some(remaining)
}
