//! End-to-end tests against a live Chromium.
//!
//! Ignored by default; run with `cargo test -- --ignored` on a machine with
//! Chrome or Chromium installed.

use pagedriver::{
    Driver, DriverConfig, DriverError, ElementSelector, WaitState, WaitUntil,
};

fn data_url(body: &str) -> String {
    format!("data:text/html,{}", body.replace('#', "%23"))
}

async fn test_driver() -> Driver {
    let config = DriverConfig {
        // Interception has nothing to intercept on data: URLs.
        block_resources: false,
        ..Default::default()
    };
    Driver::create(config).await.expect("driver should launch")
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn get_page_returns_markup_and_closed_driver_fails_fast() {
    let mut driver = test_driver().await;

    let url = data_url("<html><head><title>probe</title></head><body>ok</body></html>");
    let markup = driver
        .get_page(&url, None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");
    assert!(markup.contains("<title>probe</title>"));

    driver.close().await;
    assert!(driver.is_closed());

    let again = driver.get_page(&url, None, 0, WaitUntil::Load, None).await;
    assert!(matches!(again, Err(DriverError::Closed)));

    let search_box = ElementSelector::new("search-box", "#q");
    assert!(!driver.exists(&search_box, None).await);
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn close_is_idempotent() {
    let mut driver = test_driver().await;
    driver.close().await;
    driver.close().await;
    assert!(driver.is_closed());
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn exists_and_fill_round_trip() {
    let mut driver = test_driver().await;

    let url = data_url(r#"<html><body><input id="q"></body></html>"#);
    driver
        .get_page(&url, None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");

    let search_box = ElementSelector::new("search-box", "#q");
    let missing = ElementSelector::new("missing", "#nope");
    assert!(driver.exists(&search_box, None).await);
    assert!(!driver.exists(&missing, None).await);

    driver
        .fill(&search_box, "hello", None, None, None)
        .await
        .expect("fill should succeed");
    let value = driver
        .evaluate("document.querySelector('#q').value")
        .await
        .expect("evaluate should succeed");
    assert_eq!(value.as_str(), Some("hello"));

    driver.close().await;
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn xpath_selectors_resolve_in_the_live_page() {
    let mut driver = test_driver().await;

    let url = data_url(r#"<html><body><input id="q" name="query"></body></html>"#);
    driver
        .get_page(&url, None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");

    let by_xpath = ElementSelector::new("query-input", "//input[@name='query']");
    assert!(driver.exists(&by_xpath, None).await);

    driver.close().await;
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn wait_for_selector_observes_hidden_state() {
    let mut driver = test_driver().await;

    let url = data_url(
        r#"<html><body>
            <div id="banner" style="display:none">late</div>
            <div id="shown">now</div>
        </body></html>"#,
    );
    driver
        .get_page(&url, None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");

    let shown = ElementSelector::new("shown", "#shown");
    let banner = ElementSelector::new("banner", "#banner");

    driver
        .wait_for_selector(&shown, WaitState::Visible, None, Some(2_000))
        .await
        .expect("visible element should be observed");
    driver
        .wait_for_selector(&banner, WaitState::Hidden, None, Some(2_000))
        .await
        .expect("hidden element should be observed");
    driver
        .wait_for_selector(&banner, WaitState::Attached, None, Some(2_000))
        .await
        .expect("attached element should be observed");

    let timeout = driver
        .wait_for_selector(&banner, WaitState::Visible, None, Some(500))
        .await;
    assert!(matches!(timeout, Err(DriverError::WaitTimeout(_))));

    driver.close().await;
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn select_option_sets_the_value() {
    let mut driver = test_driver().await;

    let url = data_url(
        r#"<html><body>
            <select id="country">
                <option value="US">United States</option>
                <option value="DE">Germany</option>
            </select>
        </body></html>"#,
    );
    driver
        .get_page(&url, None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");

    let country = ElementSelector::new("country-select", "#country");
    driver
        .select_option(&country, "DE", None, Some(0))
        .await
        .expect("select should succeed");
    let value = driver
        .evaluate("document.querySelector('#country').value")
        .await
        .expect("evaluate should succeed");
    assert_eq!(value.as_str(), Some("DE"));

    let absent = driver.select_option(&country, "FR", None, Some(0)).await;
    assert!(matches!(absent, Err(DriverError::ElementNotFound(_))));

    driver.close().await;
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn document_queries_the_captured_markup_offline() {
    let mut driver = test_driver().await;

    let url = data_url(
        r#"<html><head><title>offline</title></head>
           <body><ul><li class="row">a</li><li class="row">b</li></ul></body></html>"#,
    );
    driver
        .get_page(&url, None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");

    let doc = driver.document().await.expect("snapshot should parse");
    driver.close().await;

    // Offline queries keep working after the engine is gone.
    let rows = ElementSelector::new("rows", "li.row");
    assert_eq!(doc.count(&rows).unwrap(), 2);
    assert_eq!(doc.title(), Some("offline".to_string()));
}

#[tokio::test]
#[ignore = "requires a local Chromium and network access"]
async fn persistent_profile_preserves_cookies_across_sessions() {
    let profile = tempfile::tempdir().expect("tempdir");

    let config = DriverConfig {
        persistent_context_dir: Some(profile.path().to_path_buf()),
        ..Default::default()
    };
    let mut first = Driver::create(config.clone()).await.expect("first launch");
    first
        .get_page("https://example.com/", None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");
    first
        .evaluate("document.cookie = 'probe=1; max-age=600'")
        .await
        .expect("cookie set");
    first.close().await;

    let mut second = Driver::create(config).await.expect("second launch");
    second
        .get_page("https://example.com/", None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");
    let cookie = second
        .evaluate("document.cookie")
        .await
        .expect("cookie read");
    second.close().await;
    assert!(cookie.as_str().unwrap_or_default().contains("probe=1"));

    let mut ephemeral = Driver::create(DriverConfig::default())
        .await
        .expect("ephemeral launch");
    ephemeral
        .get_page("https://example.com/", None, 0, WaitUntil::Load, None)
        .await
        .expect("navigation should succeed");
    let cookie = ephemeral
        .evaluate("document.cookie")
        .await
        .expect("cookie read");
    ephemeral.close().await;
    assert!(!cookie.as_str().unwrap_or_default().contains("probe=1"));
}
