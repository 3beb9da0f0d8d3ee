//! Opportunity pipeline views: stage filter, Kanban grouping and metrics.

use serde::Serialize;

use crate::opportunity::{Opportunity, Stage};

pub fn filter_by_stage(items: &[Opportunity], stage: Stage) -> Vec<&Opportunity> {
    items.iter().filter(|opp| opp.stage == stage).collect()
}

/// Groups opportunities into board columns, one per stage in board order.
///
/// Empty stages are kept so the board always has every column.
pub fn group_by_stage(items: &[Opportunity]) -> Vec<(Stage, Vec<&Opportunity>)> {
    Stage::ALL
        .iter()
        .map(|&stage| (stage, filter_by_stage(items, stage)))
        .collect()
}

/// Headline numbers for the pipeline page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PipelineMetrics {
    pub total_value: f64,
    pub weighted_value: f64,
    pub active_count: usize,
    pub won_count: usize,
    pub lost_count: usize,
    /// Won deals over all opportunities, in percent.
    pub win_rate: f64,
    /// Mean value over all opportunities.
    pub avg_deal_size: f64,
}

impl PipelineMetrics {
    pub fn compute(items: &[Opportunity]) -> Self {
        let mut metrics = Self::default();
        for opp in items {
            metrics.total_value += opp.value;
            match opp.stage {
                Stage::ClosedWon => metrics.won_count += 1,
                Stage::ClosedLost => metrics.lost_count += 1,
                _ => {
                    metrics.active_count += 1;
                    metrics.weighted_value += opp.weighted_value();
                }
            }
        }
        if !items.is_empty() {
            let total = items.len() as f64;
            metrics.win_rate = metrics.won_count as f64 * 100.0 / total;
            metrics.avg_deal_size = metrics.total_value / total;
        }
        metrics
    }
}

/// Per-stage row of the breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub count: usize,
    pub value: f64,
    /// Share of the total pipeline value held by this stage, in percent.
    pub percentage: f64,
}

/// Count, value and share for every stage in board order.
pub fn stage_breakdown(items: &[Opportunity]) -> Vec<StageSummary> {
    let total_value: f64 = items.iter().map(|opp| opp.value).sum();
    Stage::ALL
        .iter()
        .map(|&stage| {
            let in_stage = filter_by_stage(items, stage);
            let value: f64 = in_stage.iter().map(|opp| opp.value).sum();
            let percentage = if total_value > 0.0 {
                value * 100.0 / total_value
            } else {
                0.0
            };
            StageSummary {
                stage,
                count: in_stage.len(),
                value,
                percentage,
            }
        })
        .collect()
}

/// Won deals over closed (won or lost) deals, in percent. 0 when nothing
/// is closed. Unlike `PipelineMetrics::win_rate`, open deals do not count.
pub fn conversion_rate(items: &[Opportunity]) -> f64 {
    let won = items.iter().filter(|opp| opp.stage == Stage::ClosedWon).count();
    let closed = items.iter().filter(|opp| opp.stage.is_closed()).count();
    if closed == 0 {
        return 0.0;
    }
    won as f64 / closed as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opp(id: &str, stage: &str, value: f64, probability: u32) -> Opportunity {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": id,
            "stage": stage,
            "value": value,
            "probability": probability,
        }))
        .unwrap()
    }

    fn sample() -> Vec<Opportunity> {
        vec![
            opp("a", "prospect", 1000.0, 10),
            opp("b", "negotiation", 4000.0, 50),
            opp("c", "closed_won", 3000.0, 100),
            opp("d", "closed_won", 1000.0, 100),
            opp("e", "closed_lost", 1000.0, 0),
        ]
    }

    #[test]
    fn test_pipeline_metrics() {
        let metrics = PipelineMetrics::compute(&sample());
        assert_eq!(metrics.total_value, 10000.0);
        assert_eq!(metrics.weighted_value, 2100.0);
        assert_eq!(metrics.active_count, 2);
        assert_eq!(metrics.won_count, 2);
        assert_eq!(metrics.lost_count, 1);
        assert_eq!(metrics.win_rate, 40.0);
        assert!((conversion_rate(&sample()) - 66.666).abs() < 0.01);
        assert_eq!(metrics.avg_deal_size, 2000.0);
    }

    #[test]
    fn test_empty_pipeline_has_zero_rates() {
        let metrics = PipelineMetrics::compute(&[]);
        assert_eq!(metrics, PipelineMetrics::default());
        assert_eq!(conversion_rate(&[]), 0.0);
    }

    #[test]
    fn test_stage_breakdown_covers_every_stage() {
        let breakdown = stage_breakdown(&sample());
        assert_eq!(breakdown.len(), Stage::ALL.len());

        let won = breakdown.iter().find(|row| row.stage == Stage::ClosedWon).unwrap();
        assert_eq!(won.count, 2);
        assert_eq!(won.value, 4000.0);
        assert_eq!(won.percentage, 40.0);

        let proposal = breakdown.iter().find(|row| row.stage == Stage::Proposal).unwrap();
        assert_eq!(proposal.count, 0);
        assert_eq!(proposal.percentage, 0.0);
    }

    #[test]
    fn test_stage_percentage_is_share_of_value() {
        let items = vec![
            opp("a", "prospect", 1000.0, 10),
            opp("b", "closed_won", 9000.0, 100),
        ];
        let breakdown = stage_breakdown(&items);

        let won = breakdown.iter().find(|row| row.stage == Stage::ClosedWon).unwrap();
        assert_eq!(won.count, 1);
        assert_eq!(won.percentage, 90.0);
        let prospect = breakdown.iter().find(|row| row.stage == Stage::Prospect).unwrap();
        assert_eq!(prospect.percentage, 10.0);
    }

    #[test]
    fn test_zero_value_pipeline_has_zero_shares() {
        let items = vec![opp("a", "prospect", 0.0, 10)];
        assert!(stage_breakdown(&items).iter().all(|row| row.percentage == 0.0));
    }

    #[test]
    fn test_group_by_stage_keeps_board_order() {
        let items = sample();
        let columns = group_by_stage(&items);
        let stages: Vec<_> = columns.iter().map(|(stage, _)| *stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(columns[0].1.len(), 1);
        assert_eq!(columns[4].1.len(), 2);
    }
}
