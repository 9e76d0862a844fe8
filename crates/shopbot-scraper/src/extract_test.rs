use super::*;

const PRODUCT_PAGE: &str = r#"
<html>
  <head>
    <title>  Blue Painter's Tape, 2 in x 60 yd  </title>
    <meta property="og:title" content="OG Tape Title">
    <meta property="og:image" content="/images/tape-2in.jpg">
    <script type="application/ld+json">
      {
        "@context": "https://schema.org",
        "@type": "Product",
        "name": "Blue Painter's Tape",
        "offers": { "@type": "Offer", "price": "4.99", "priceCurrency": "usd" }
      }
    </script>
    <style>.price { color: red; }</style>
  </head>
  <body>
    <nav>Home &gt; Paint &gt; Tape</nav>
    <h1>Blue Painter's Tape</h1>
    <script>window.dataLayer = [];</script>
    <p class="price">$4.99</p>
    <p>Clean   removal
       for up to 14 days.</p>
    <noscript>Enable JavaScript</noscript>
  </body>
</html>
"#;

#[test]
fn extracts_title_image_text_and_price_hint() {
    let page = extract_page("https://shop.example.com/p/tape", PRODUCT_PAGE, 4000);

    assert_eq!(page.url, "https://shop.example.com/p/tape");
    assert_eq!(page.title, "Blue Painter's Tape, 2 in x 60 yd");
    assert_eq!(page.image_url, "https://shop.example.com/images/tape-2in.jpg");
    assert_eq!(
        page.price_hint,
        Some(PriceHint {
            amount: 4.99,
            currency: Some("USD".to_string())
        })
    );
}

#[test]
fn visible_text_skips_scripts_styles_and_head() {
    let page = extract_page("https://shop.example.com/p/tape", PRODUCT_PAGE, 4000);

    assert!(page.text_content.contains("$4.99"));
    assert!(page.text_content.contains("Clean removal for up to 14 days."));
    assert!(!page.text_content.contains("dataLayer"));
    assert!(!page.text_content.contains("color: red"));
    assert!(!page.text_content.contains("Enable JavaScript"));
    assert!(!page.text_content.contains("60 yd"), "head <title> leaked into body text");
}

#[test]
fn text_is_capped_in_characters() {
    let body = "é".repeat(50);
    let html = format!("<html><body><p>{body}</p></body></html>");
    let page = extract_page("https://shop.example.com/", &html, 10);
    assert_eq!(page.text_content.chars().count(), 10);
}

#[test]
fn title_falls_back_to_og_title_then_h1() {
    let og = r#"<html><head><meta property="og:title" content="OG Name"></head><body><h1>H1</h1></body></html>"#;
    assert_eq!(extract_page("https://a.example/", og, 100).title, "OG Name");

    let h1 = "<html><body><h1> Heading  Name </h1></body></html>";
    assert_eq!(extract_page("https://a.example/", h1, 100).title, "Heading Name");
}

#[test]
fn missing_title_uses_sentinel() {
    let page = extract_page("https://a.example/", "<html><body><p>x</p></body></html>", 100);
    assert_eq!(page.title, ScrapedPage::UNTITLED);
}

#[test]
fn image_falls_back_to_first_img_tag() {
    let html = r#"<html><body><img src="data:image/gif;base64,R0lG"><img src="/a/b.png"></body></html>"#;
    let page = extract_page("https://a.example/x/y", html, 100);
    assert_eq!(page.image_url, "https://a.example/a/b.png");
}

#[test]
fn no_image_yields_empty_string() {
    let page = extract_page("https://a.example/", "<html><body>text</body></html>", 100);
    assert!(page.image_url.is_empty());
}

#[test]
fn price_hint_found_inside_graph_and_offer_arrays() {
    let html = r#"
      <html><head><script type="application/ld+json">
        {"@graph": [
          {"@type": "WebPage"},
          {"@type": ["Product"], "offers": [{"price": 12.5, "priceCurrency": "EUR"}]}
        ]}
      </script></head><body></body></html>
    "#;
    let page = extract_page("https://a.example/", html, 100);
    assert_eq!(
        page.price_hint,
        Some(PriceHint {
            amount: 12.5,
            currency: Some("EUR".to_string())
        })
    );
}

#[test]
fn aggregate_offer_uses_low_price() {
    let html = r#"
      <html><head><script type="application/ld+json">
        {"@type": "Product", "offers": {"@type": "AggregateOffer", "lowPrice": "1,299.00"}}
      </script></head></html>
    "#;
    let hint = extract_page("https://a.example/", html, 100).price_hint.unwrap();
    assert!((hint.amount - 1299.0).abs() < f64::EPSILON);
    assert!(hint.currency.is_none());
}

#[test]
fn malformed_json_ld_is_ignored() {
    let html = r#"<html><head><script type="application/ld+json">{not json</script></head></html>"#;
    assert!(extract_page("https://a.example/", html, 100).price_hint.is_none());
}

#[test]
fn truncate_chars_keeps_short_text_intact() {
    assert_eq!(truncate_chars("abc", 10), "abc");
    assert_eq!(truncate_chars("abcdef", 3), "abc");
}
