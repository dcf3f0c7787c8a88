use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::report::ProbeResult;

/// A ready-to-send consolidated alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub html_body: String,
}

/// Build the HTML alert listing every activity with open slots.
pub fn compose_alert<Tz>(results: &[ProbeResult], checked_at: &DateTime<Tz>) -> AlertMessage
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let count = results.len();
    let subject = format!("【紧急】发现 {count} 个可用活动！");

    let mut body = format!(
        "<h1>🎉 发现 {count} 个活动有名额！</h1>\n<p>以下活动检测到空缺，请尽快操作：</p>\n"
    );
    for result in results {
        body.push_str(&activity_block(result));
    }
    body.push_str(&format!(
        "<p style=\"color:gray; font-size:12px;\">检查时间：{}</p>\n",
        checked_at.format("%Y-%m-%d %H:%M:%S %:z")
    ));

    AlertMessage {
        subject,
        html_body: body,
    }
}

fn activity_block(result: &ProbeResult) -> String {
    let url = escape_html(result.url.as_str());
    format!(
        concat!(
            r#"<div style="border:1px solid #ddd; padding:10px; margin-bottom:10px; border-radius:5px;">"#,
            r#"<p><b>活动链接：</b><a href="{url}">{url}</a></p>"#,
            r#"<p>剩余名额：<span style="color:red; font-weight:bold;">{slots}</span> 个</p>"#,
            "</div>\n"
        ),
        url = url,
        slots = result.remaining_slots,
    )
}

/// Escape text for use in HTML element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
