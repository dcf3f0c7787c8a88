use slotwatch_core::{Link, ProbeResult, RunReport};
use pretty_assertions::assert_eq;

#[test]
fn zero_slot_results_are_discarded() {
    let mut report = RunReport::new();
    assert!(!report.record(Link::new("http://a.example/full"), 0));
    assert!(report.record(Link::new("http://a.example/open"), 5));

    assert_eq!(report.len(), 1);
    assert_eq!(
        report.results(),
        &[ProbeResult {
            url: Link::new("http://a.example/open"),
            remaining_slots: 5,
        }]
    );
}

#[test]
fn results_keep_probe_order_and_sum() {
    let mut report = RunReport::new();
    report.record(Link::new("http://b.example"), 2);
    report.record(Link::new("http://a.example"), 3);

    assert_eq!(report.total_slots(), 5);
    let urls: Vec<String> = report
        .into_results()
        .into_iter()
        .map(|r| r.url.into_string())
        .collect();
    assert_eq!(urls, vec!["http://b.example", "http://a.example"]);
}

#[test]
fn new_report_is_empty() {
    let report = RunReport::new();
    assert!(report.is_empty());
    assert_eq!(report.total_slots(), 0);
}
