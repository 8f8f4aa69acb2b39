//! Client-side filtering and totals over the transaction history.

use crate::models::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Earn,
    Redeem,
}

impl HistoryFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Earn => transaction.kind == TransactionType::Earn,
            HistoryFilter::Redeem => transaction.kind == TransactionType::Redeem,
        }
    }

    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|t| self.matches(t)).collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            HistoryFilter::All => "All",
            HistoryFilter::Earn => "Earned",
            HistoryFilter::Redeem => "Redeemed",
        }
    }

    /// Button label with the number of matching transactions, e.g. `Earned (3)`.
    pub fn label(&self, summary: &HistorySummary) -> String {
        let count = match self {
            HistoryFilter::All => summary.total_count,
            HistoryFilter::Earn => summary.earn_count,
            HistoryFilter::Redeem => summary.redeem_count,
        };
        format!("{} ({})", self.name(), count)
    }

    pub fn next(&self) -> Self {
        match self {
            HistoryFilter::All => HistoryFilter::Earn,
            HistoryFilter::Earn => HistoryFilter::Redeem,
            HistoryFilter::Redeem => HistoryFilter::All,
        }
    }

    pub const ALL: [HistoryFilter; 3] = [HistoryFilter::All, HistoryFilter::Earn, HistoryFilter::Redeem];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    pub total_earned: i64,
    pub total_redeemed: i64,
    pub total_count: usize,
    pub earn_count: usize,
    pub redeem_count: usize,
}

impl HistorySummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions.iter().fold(
            Self {
                total_count: transactions.len(),
                ..Self::default()
            },
            |mut summary, t| {
                match t.kind {
                    TransactionType::Earn => {
                        summary.total_earned += t.points;
                        summary.earn_count += 1;
                    }
                    TransactionType::Redeem => {
                        summary.total_redeemed += t.points;
                        summary.redeem_count += 1;
                    }
                }
                summary
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str, kind: TransactionType, points: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind,
            points,
            description: format!("tx {id}"),
            created_at: "2025-03-01T10:00:00Z".to_string(),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("1", TransactionType::Earn, 10),
            tx("2", TransactionType::Redeem, 5),
            tx("3", TransactionType::Earn, 25),
            tx("4", TransactionType::Earn, 100),
            tx("5", TransactionType::Redeem, 50),
        ]
    }

    #[test]
    fn test_summary_two_transactions() {
        let transactions = vec![tx("1", TransactionType::Earn, 10), tx("2", TransactionType::Redeem, 5)];
        let summary = HistorySummary::from_transactions(&transactions);
        assert_eq!(summary.total_earned, 10);
        assert_eq!(summary.total_redeemed, 5);
        assert_eq!(summary.total_count, 2);
    }

    #[test]
    fn test_filter_counts_match_labels() {
        let transactions = sample();
        let summary = HistorySummary::from_transactions(&transactions);

        for filter in HistoryFilter::ALL {
            let filtered = filter.apply(&transactions);
            assert!(filtered.iter().all(|t| filter.matches(t)));
            assert_eq!(filter.label(&summary), format!("{} ({})", filter.name(), filtered.len()));
        }

        let earned = HistoryFilter::Earn.apply(&transactions);
        assert_eq!(earned.len(), 3);
        assert!(earned.iter().all(|t| t.kind == TransactionType::Earn));
        assert_eq!(HistoryFilter::Earn.label(&summary), "Earned (3)");
        assert_eq!(HistoryFilter::Redeem.label(&summary), "Redeemed (2)");
        assert_eq!(HistoryFilter::All.label(&summary), "All (5)");
    }

    #[test]
    fn test_filter_preserves_order() {
        let transactions = sample();
        let ids: Vec<&str> = HistoryFilter::Earn
            .apply(&transactions)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[test]
    fn test_empty_history() {
        let summary = HistorySummary::from_transactions(&[]);
        assert_eq!(summary, HistorySummary::default());
        assert!(HistoryFilter::Redeem.apply(&[]).is_empty());
    }

    #[test]
    fn test_filter_cycle() {
        assert_eq!(HistoryFilter::All.next(), HistoryFilter::Earn);
        assert_eq!(HistoryFilter::Earn.next(), HistoryFilter::Redeem);
        assert_eq!(HistoryFilter::Redeem.next(), HistoryFilter::All);
    }
}
