use crate::models::{Campaign, CampaignMetrics, MetricReport, Record};

/// Reduces a dataset to its KPIs. Every metric is an order-independent
/// reduction over `records`, so an empty slice is a valid input.
pub fn aggregate(records: &[Record]) -> MetricReport {
    let summarize = |campaign: Campaign| {
        let (sent, opened, clicked) = records.iter().map(|r| r.emails(campaign)).fold(
            (0u64, 0u64, 0u64),
            |(sent, opened, clicked), counters| {
                (
                    sent.saturating_add(counters.sent),
                    opened.saturating_add(counters.opened),
                    clicked.saturating_add(counters.clicked),
                )
            },
        );

        CampaignMetrics {
            sent,
            open_rate: rate(opened, sent),
            click_rate: rate(clicked, sent),
        }
    };

    MetricReport {
        record_count: records.len(),
        c1a: summarize(Campaign::C1a),
        c2: summarize(Campaign::C2),
        c3: summarize(Campaign::C3),
        outbound: total(records.iter().map(|r| r.outbound)),
        opportunities: total(records.iter().map(|r| r.opportunities)),
        goals: total(records.iter().map(|r| r.goals)),
        goals_c2c: total(records.iter().map(|r| r.goals_c2c)),
        goals_c2c_proposal: total(records.iter().map(|r| r.goals_c2c_proposal)),
        global_conversion_rate: mean(records.iter().filter_map(|r| r.proposal_conversion)),
    }
}

/// Sum that clamps at `u64::MAX` instead of overflowing.
fn total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// `numerator / denominator * 100`, or 0 when nothing was sent.
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64 * 100.0
    } else {
        0.0
    }
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (total, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(total, count), value| (total + value, count + 1));

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailCounters;
    use crate::period::{filter, PeriodFilter};
    use proptest::prelude::*;

    fn c1a_record(year_month: &str, sent: u64, opened: u64) -> Record {
        Record {
            year_month: year_month.to_string(),
            c1a: EmailCounters {
                sent,
                opened,
                clicked: 0,
            },
            ..Record::default()
        }
    }

    fn mixed() -> Vec<Record> {
        vec![
            Record {
                year_month: "2024-01".into(),
                c1a: EmailCounters {
                    sent: 100,
                    opened: 40,
                    clicked: 10,
                },
                c2: EmailCounters {
                    sent: 0,
                    opened: 0,
                    clicked: 0,
                },
                c3: EmailCounters {
                    sent: 20,
                    opened: 5,
                    clicked: 1,
                },
                outbound: 7,
                opportunities: 2,
                goals: 9,
                goals_c2c: 4,
                goals_c2c_proposal: 1,
                proposal_conversion: Some(10.0),
            },
            Record {
                year_month: "2024-02".into(),
                c1a: EmailCounters {
                    sent: 60,
                    opened: 20,
                    clicked: 6,
                },
                c2: EmailCounters {
                    sent: 0,
                    opened: 0,
                    clicked: 0,
                },
                c3: EmailCounters {
                    sent: 30,
                    opened: 15,
                    clicked: 4,
                },
                outbound: 3,
                opportunities: 1,
                goals: 6,
                goals_c2c: 2,
                goals_c2c_proposal: 3,
                proposal_conversion: None,
            },
            Record {
                year_month: "2024-02".into(),
                proposal_conversion: Some(30.0),
                ..Record::default()
            },
        ]
    }

    #[test]
    fn open_rate_matches_filtered_and_unfiltered_scenario() {
        let records = vec![
            c1a_record("2024-01", 100, 25),
            c1a_record("2024-02", 50, 10),
        ];

        let january = filter(&records, &PeriodFilter::Period("2024-01".into()));
        assert_eq!(january.len(), 1);
        let report = aggregate(&january);
        assert!((report.c1a.open_rate - 25.0).abs() < 1e-9);

        let report = aggregate(&records);
        assert_eq!(report.c1a.sent, 150);
        assert_eq!(format!("{:.2}", report.c1a.open_rate), "23.33");
    }

    #[test]
    fn zero_sent_gives_zero_rate() {
        let report = aggregate(&[c1a_record("2024-01", 0, 0)]);
        assert_eq!(report.c1a.open_rate, 0.0);
        assert_eq!(report.c1a.click_rate, 0.0);
        assert!(!report.c1a.open_rate.is_nan());
    }

    #[test]
    fn rates_follow_sum_over_sum() {
        let records = mixed();
        let report = aggregate(&records);

        assert_eq!(report.c1a.sent, 160);
        assert!((report.c1a.open_rate - 100.0 * 60.0 / 160.0).abs() < 1e-9);
        assert!((report.c1a.click_rate - 100.0 * 16.0 / 160.0).abs() < 1e-9);
        assert_eq!(report.c2.open_rate, 0.0);
        assert!((report.c3.open_rate - 100.0 * 20.0 / 50.0).abs() < 1e-9);
        assert!((report.c3.click_rate - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sums_cover_every_record() {
        let report = aggregate(&mixed());
        assert_eq!(report.record_count, 3);
        assert_eq!(report.outbound, 10);
        assert_eq!(report.opportunities, 3);
        assert_eq!(report.goals, 15);
        assert_eq!(report.goals_c2c, 6);
        assert_eq!(report.goals_c2c_proposal, 4);
    }

    #[test]
    fn conversion_mean_skips_missing_ratios() {
        let report = aggregate(&mixed());
        assert_eq!(report.global_conversion_rate, Some(20.0));
    }

    #[test]
    fn empty_dataset_is_all_zero_with_no_conversion_data() {
        let report = aggregate(&[]);
        assert_eq!(report, MetricReport::default());
        assert_eq!(report.global_conversion_rate, None);
        for campaign in Campaign::ALL {
            let metrics = report.campaign(campaign);
            assert_eq!(metrics.sent, 0);
            assert_eq!(metrics.open_rate, 0.0);
            assert_eq!(metrics.click_rate, 0.0);
        }
    }

    #[test]
    fn all_period_filter_does_not_change_the_report() {
        let records = mixed();
        let filtered = filter(&records, &PeriodFilter::All);
        assert_eq!(aggregate(&filtered), aggregate(&records));
    }

    #[test]
    fn aggregation_is_repeatable() {
        let records = mixed();
        let first = aggregate(&records);
        let second = aggregate(&records);
        assert_eq!(first, second);
        assert_eq!(first.c1a.open_rate.to_bits(), second.c1a.open_rate.to_bits());
    }

    #[test]
    fn rate_guards_zero_denominator() {
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(1, 4), 25.0);
    }

    #[test]
    fn huge_counters_saturate_instead_of_overflowing() {
        let big = Record {
            c1a: EmailCounters {
                sent: u64::MAX,
                opened: u64::MAX,
                clicked: 0,
            },
            goals: u64::MAX,
            ..Record::default()
        };
        let small = Record {
            c1a: EmailCounters {
                sent: 1,
                opened: 1,
                clicked: 0,
            },
            goals: 1,
            ..Record::default()
        };

        let report = aggregate(&[big, small]);
        assert_eq!(report.c1a.sent, u64::MAX);
        assert_eq!(report.goals, u64::MAX);
        assert!((report.c1a.open_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![1.0, 2.0, 3.0]), Some(2.0));
    }

    fn arb_record() -> impl Strategy<Value = Record> {
        let counters = (0u64..1_000, 0u64..1_000, 0u64..1_000).prop_map(|(sent, opened, clicked)| {
            EmailCounters {
                sent,
                opened,
                clicked,
            }
        });
        (
            prop::sample::select(vec!["2024-01", "2024-02", "2024-03"]),
            counters.clone(),
            counters.clone(),
            counters,
            (0u64..1_000, 0u64..1_000, 0u64..1_000),
            prop::option::of(0.0f64..100.0),
        )
            .prop_map(|(year_month, c1a, c2, c3, (outbound, opportunities, goals), conversion)| {
                Record {
                    year_month: year_month.to_string(),
                    c1a,
                    c2,
                    c3,
                    outbound,
                    opportunities,
                    goals,
                    goals_c2c: goals / 2,
                    goals_c2c_proposal: goals / 3,
                    proposal_conversion: conversion,
                }
            })
    }

    proptest! {
        #[test]
        fn open_rate_is_zero_guarded_sum_ratio(records in prop::collection::vec(arb_record(), 0..20)) {
            let report = aggregate(&records);
            for campaign in Campaign::ALL {
                let sent: u64 = records.iter().map(|r| r.emails(campaign).sent).sum();
                let opened: u64 = records.iter().map(|r| r.emails(campaign).opened).sum();
                let metrics = report.campaign(campaign);
                if sent == 0 {
                    prop_assert_eq!(metrics.open_rate, 0.0);
                } else {
                    let expected = 100.0 * opened as f64 / sent as f64;
                    prop_assert!((metrics.open_rate - expected).abs() <= 1e-9 * expected.max(1.0));
                }
                prop_assert!(metrics.open_rate.is_finite());
            }
        }

        #[test]
        fn all_period_leaves_metrics_unchanged(records in prop::collection::vec(arb_record(), 0..20)) {
            let filtered = filter(&records, &PeriodFilter::All);
            prop_assert_eq!(aggregate(&filtered), aggregate(&records));
        }

        #[test]
        fn period_filter_only_narrows(
            records in prop::collection::vec(arb_record(), 0..20),
            key in prop::sample::select(vec!["2024-01", "2024-02", "2024-03", "2025-01"]),
        ) {
            let filtered = filter(&records, &PeriodFilter::Period(key.to_string()));
            prop_assert!(filtered.len() <= records.len());
            prop_assert!(filtered.iter().all(|r| r.year_month == key));
        }
    }
}
