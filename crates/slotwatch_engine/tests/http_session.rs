use std::time::Duration;

use pretty_assertions::assert_eq;
use slotwatch_core::Link;
use slotwatch_engine::{
    discover_links, DiscoveryFailure, DiscoverySettings, FailureKind, HttpSession, HttpSettings,
    PageSession, ProbeOutcome, ProbeSettings, Prober, SkipReason, WaitCondition,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn serve_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            body.as_bytes().to_vec(),
            "text/html; charset=utf-8",
        ))
        .mount(server)
        .await;
}

fn session() -> HttpSession {
    HttpSession::new(HttpSettings::default()).expect("client")
}

fn activity_page(counter: &str) -> String {
    format!(
        "<html><body><h1>周末读书会</h1><div class=\"stats\">已报人数：{counter}</div></body></html>"
    )
}

async fn probe_page(body: &str) -> ProbeOutcome {
    let server = MockServer::start().await;
    serve_html(&server, "/activity", body).await;
    let url = Link::new(format!("{}/activity", server.uri()));
    let mut session = session();
    Prober::new(ProbeSettings::default())
        .probe(&mut session, &url)
        .await
}

#[tokio::test]
async fn open_activity_reports_remaining_slots() {
    let outcome = probe_page(&activity_page("3/10")).await;
    assert_eq!(outcome, ProbeOutcome::Open { remaining: 7 });
    assert_eq!(outcome.remaining_slots(), 7);
}

#[tokio::test]
async fn full_activity_reports_zero() {
    let outcome = probe_page(&activity_page("10/10")).await;
    assert_eq!(
        outcome,
        ProbeOutcome::Skipped(SkipReason::Full {
            registered: 10,
            maximum: 10
        })
    );
    assert_eq!(outcome.remaining_slots(), 0);
}

#[tokio::test]
async fn page_without_marker_is_skipped() {
    let outcome = probe_page("<html><body><p>Just a blog post</p></body></html>").await;
    assert_eq!(outcome, ProbeOutcome::Skipped(SkipReason::MarkerMissing));
    assert_eq!(outcome.remaining_slots(), 0);
}

#[tokio::test]
async fn malformed_counter_is_skipped() {
    let outcome = probe_page(&activity_page("three/10")).await;
    assert_eq!(outcome, ProbeOutcome::Skipped(SkipReason::SignalMissing));
    assert_eq!(outcome.remaining_slots(), 0);
}

#[tokio::test]
async fn stray_bytes_do_not_hide_open_slots() {
    let server = MockServer::start().await;
    let mut body = activity_page("3/10").into_bytes();
    body.push(0xFF);
    Mock::given(method("GET"))
        .and(path("/activity"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(&server)
        .await;
    let url = Link::new(format!("{}/activity", server.uri()));
    let mut session = session();

    let outcome = Prober::default().probe(&mut session, &url).await;

    assert_eq!(outcome, ProbeOutcome::Open { remaining: 7 });
}

#[tokio::test]
async fn marker_inside_script_is_not_rendered_text() {
    let outcome = probe_page(
        r#"<html><head><script>var label = "已报人数：3/10";</script></head>
        <body><p>报名已结束</p><style>.x::after { content: "已报人数"; }</style></body></html>"#,
    )
    .await;
    assert_eq!(outcome, ProbeOutcome::Skipped(SkipReason::MarkerMissing));
}

#[tokio::test]
async fn missing_page_is_a_navigation_skip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let url = Link::new(format!("{}/gone", server.uri()));
    let mut session = session();

    let outcome = Prober::default().probe(&mut session, &url).await;

    match outcome {
        ProbeOutcome::Skipped(SkipReason::Navigation(err)) => {
            assert_eq!(err.kind, FailureKind::HttpStatus(404));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn malformed_url_is_a_navigation_skip() {
    let mut session = session();
    let outcome = Prober::default()
        .probe(&mut session, &Link::new("http://%%%/bad"))
        .await;
    assert!(matches!(
        outcome,
        ProbeOutcome::Skipped(SkipReason::Navigation(_))
    ));
}

#[tokio::test]
async fn listing_links_are_discovered_from_the_container() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/p",
        r#"<html><body>
            <nav><a href="https://ignored.example/nav">nav</a> https://ignored.example/text</nav>
            <div id="textDisplay">活动: https://a.example/1, https://a.example/2
            再看 https://a.example/1</div>
        </body></html>"#,
    )
    .await;
    let settings = DiscoverySettings {
        source_url: format!("{}/p", server.uri()),
        settle: Duration::ZERO,
        ..DiscoverySettings::default()
    };
    let mut session = session();

    let links = discover_links(&mut session, &settings).await.unwrap();

    let urls: Vec<&str> = links.iter().map(Link::as_str).collect();
    assert_eq!(urls, vec!["https://a.example/1", "https://a.example/2"]);
}

#[tokio::test]
async fn listing_without_container_is_not_rendered() {
    let server = MockServer::start().await;
    serve_html(&server, "/p", "<html><body>loading…</body></html>").await;
    let settings = DiscoverySettings {
        source_url: format!("{}/p", server.uri()),
        settle: Duration::ZERO,
        ..DiscoverySettings::default()
    };
    let mut session = session();

    let err = discover_links(&mut session, &settings).await.unwrap_err();
    assert!(matches!(err, DiscoveryFailure::NotRendered(_)));
}

#[tokio::test]
async fn session_reads_text_and_content() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/doc",
        r#"<html><body><div id="box">hello <b>world</b></div></body></html>"#,
    )
    .await;
    let mut session = session();

    session
        .navigate(&format!("{}/doc", server.uri()), TIMEOUT)
        .await
        .unwrap();
    session
        .wait_for(&WaitCondition::Selector("#box".to_string()), TIMEOUT)
        .await
        .unwrap();
    session
        .wait_for(&WaitCondition::Text("hello world".to_string()), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(session.inner_text("#box").await.unwrap(), "hello world");
    assert_eq!(session.inner_text("body").await.unwrap(), "hello world");
    assert!(session.content().await.unwrap().contains("<b>world</b>"));
    assert_eq!(
        session.current_url(),
        Some(format!("{}/doc", server.uri()).as_str())
    );

    let err = session
        .wait_for(&WaitCondition::Selector("#missing".to_string()), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::ConditionNotMet);

    let err = session.inner_text("[[").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidSelector);
}

#[tokio::test]
async fn reading_before_navigation_fails() {
    let mut session = session();
    let err = session.content().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::NoPage);
}

#[tokio::test]
async fn slow_page_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;
    let mut session = session();

    let err = session
        .navigate(&format!("{}/slow", server.uri()), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.is_timeout());
}

#[tokio::test]
async fn oversized_page_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;
    let mut session = HttpSession::new(HttpSettings {
        max_bytes: 10,
        ..HttpSettings::default()
    })
    .unwrap();

    let err = session
        .navigate(&format!("{}/large", server.uri()), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn non_html_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 4], "image/png"))
        .mount(&server)
        .await;
    let mut session = session();

    let err = session
        .navigate(&format!("{}/img", server.uri()), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "image/png".to_string()
        }
    );
}
