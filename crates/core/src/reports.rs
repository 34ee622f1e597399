use serde::Serialize;

use crate::types::{Newspaper, Subscriber};

/// Derived subscription statistics for one subscriber.
///
/// Pure view over registry state; computing it mutates nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriberStats {
    /// Number of subscriptions, duplicates included.
    pub subscriptions: usize,
    /// Sum of the monthly prices of every subscription.
    pub monthly_cost: f64,
    /// Twelve months of the above.
    pub annual_cost: f64,
    /// Received issues grouped by owning paper, ordered by first receipt.
    pub issues_per_paper: Vec<PaperDeliveries>,
}

/// Count of issues a subscriber received from one newspaper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperDeliveries {
    pub paper_id: u32,
    pub name: String,
    pub received: usize,
}

impl SubscriberStats {
    /// Builds the statistics for `subscriber` against the registry's papers.
    ///
    /// Subscriptions pointing at papers that have since been removed still
    /// count as subscriptions but contribute no cost.
    pub fn collect(subscriber: &Subscriber, newspapers: &[Newspaper]) -> Self {
        let monthly_cost: f64 = subscriber
            .subscribed_newspapers()
            .iter()
            .filter_map(|paper_id| {
                newspapers
                    .iter()
                    .find(|paper| paper.paper_id == *paper_id)
                    .map(|paper| paper.price)
            })
            .sum();

        let mut issues_per_paper: Vec<PaperDeliveries> = Vec::new();
        for key in subscriber.received_issues() {
            match issues_per_paper
                .iter_mut()
                .find(|entry| entry.paper_id == key.paper_id)
            {
                Some(entry) => entry.received += 1,
                None => {
                    let name = newspapers
                        .iter()
                        .find(|paper| paper.paper_id == key.paper_id)
                        .map(|paper| paper.name.clone())
                        .unwrap_or_default();
                    issues_per_paper.push(PaperDeliveries {
                        paper_id: key.paper_id,
                        name,
                        received: 1,
                    });
                }
            }
        }

        Self {
            subscriptions: subscriber.subscribed_newspapers().len(),
            monthly_cost,
            annual_cost: 12.0 * monthly_cost,
            issues_per_paper,
        }
    }
}

/// Result of a catch-up delivery run.
///
/// A run both reports and delivers: every name listed under `Delivered` was
/// sent to the subscriber during this call, so a repeat run comes back as
/// `NoMissingIssues`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CatchUpOutcome {
    Delivered { issues: Vec<String> },
    NoMissingIssues,
}

impl CatchUpOutcome {
    pub fn delivered_count(&self) -> usize {
        match self {
            Self::Delivered { issues } => issues.len(),
            Self::NoMissingIssues => 0,
        }
    }
}
