use chrono::{FixedOffset, TimeZone};
use slotwatch_core::{compose_alert, escape_html, Link, ProbeResult};

fn result(url: &str, slots: u32) -> ProbeResult {
    ProbeResult {
        url: Link::new(url),
        remaining_slots: slots,
    }
}

#[test]
fn subject_and_body_count_the_activities() {
    let checked_at = FixedOffset::east_opt(8 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
        .unwrap();
    let results = [result("https://a.example/1", 7), result("https://a.example/2", 1)];

    let alert = compose_alert(&results, &checked_at);

    assert_eq!(alert.subject, "【紧急】发现 2 个可用活动！");
    assert!(alert.html_body.contains("发现 2 个活动有名额"));
    assert!(alert
        .html_body
        .contains(r#"<a href="https://a.example/1">https://a.example/1</a>"#));
    assert!(alert.html_body.contains(">7</span> 个"));
    assert!(alert.html_body.contains(">1</span> 个"));
    assert!(alert.html_body.contains("2026-03-01 09:30:00 +08:00"));
}

#[test]
fn urls_are_escaped_in_the_body() {
    let checked_at = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .unwrap();
    let alert = compose_alert(&[result("https://a.example/?a=1&b=2", 3)], &checked_at);

    assert!(alert.html_body.contains("https://a.example/?a=1&amp;b=2"));
    assert!(!alert.html_body.contains("a=1&b=2"));
}

#[test]
fn escape_html_replaces_markup_characters() {
    assert_eq!(
        escape_html(r#"<a href="x">'&'</a>"#),
        "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
    );
    assert_eq!(escape_html("已报人数"), "已报人数");
}

#[test]
fn body_has_one_block_per_activity_in_order() {
    let checked_at = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .unwrap();
    let results = [
        result("https://a.example/1", 2),
        result("https://a.example/2", 4),
        result("https://a.example/3", 6),
    ];

    let alert = compose_alert(&results, &checked_at);
    let lines: Vec<&str> = alert.html_body.lines().collect();

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("<h1>"));
    for (line, expected) in lines[2..5].iter().zip(["/1", "/2", "/3"]) {
        assert!(line.starts_with("<div"), "{line}");
        assert!(line.contains(&format!("https://a.example{expected}")));
    }
    assert!(lines[5].contains("检查时间：2026-01-01 00:00:00 +00:00"));
}
