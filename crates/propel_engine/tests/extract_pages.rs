use propel_core::{ExtractionFailureReason, RelayMessage, MIN_CONTENT_CHARS};
use propel_engine::{outcome_message, Extractor, PageSnapshot, PrioritizedExtractor};
use pretty_assertions::assert_eq;

const URL: &str = "https://blog.example.com/post";

fn paragraph(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract(html: &str) -> Result<propel_core::ExtractionResult, propel_core::ExtractionFailure> {
    PrioritizedExtractor::default().extract(&PageSnapshot::new(URL, html))
}

#[test]
fn article_is_chosen_over_surrounding_body() {
    let article = paragraph(80);
    assert!(article.len() >= 500);
    let html = format!(
        "<html><body><nav>Home About Contact Subscribe</nav>\
         <article><p>{article}</p></article>\
         <footer>Copyright footer links</footer></body></html>"
    );

    let result = extract(&html).expect("article extracted");
    assert_eq!(result.url, URL);
    assert_eq!(result.text, article);
    assert!(!result.text.contains("Home"));
    assert!(!result.text.contains("Copyright"));
}

#[test]
fn main_outranks_article() {
    let main_text = paragraph(40);
    let html = format!(
        "<body><article>{}</article><main>{main_text}</main></body>",
        paragraph(60)
    );
    assert_eq!(extract(&html).unwrap().text, main_text);
}

#[test]
fn conventional_container_ids_are_recognised() {
    let text = paragraph(40);
    let html = format!("<body><div id=\"sidebar\">Ads here</div><div id=\"content\">{text}</div></body>");
    assert_eq!(extract(&html).unwrap().text, text);

    let html = format!("<body><div class=\"entry-content\">{text}</div><p>tail</p></body>");
    assert_eq!(extract(&html).unwrap().text, text);
}

#[test]
fn body_is_used_when_no_container_matches() {
    let text = paragraph(40);
    let html = format!("<html><head><title>T</title></head><body><div><p>{text}</p></div><script>track()</script></body></html>");
    assert_eq!(extract(&html).unwrap().text, text);
}

#[test]
fn tiny_body_fails_as_too_short() {
    let failure = extract("<html><body>hi</body></html>").unwrap_err();
    assert_eq!(failure.url, URL);
    assert_eq!(
        failure.reason,
        ExtractionFailureReason::ContentTooShort { chars: 2 }
    );
    assert!(failure.reason.to_string().starts_with("content too short"));
}

#[test]
fn matched_but_short_container_does_not_fall_through() {
    // The article matches first even though the body has plenty of text.
    let html = format!(
        "<body><article>short</article><div>{}</div></body>",
        paragraph(80)
    );
    let failure = extract(&html).unwrap_err();
    assert_eq!(
        failure.reason,
        ExtractionFailureReason::ContentTooShort { chars: 5 }
    );
}

#[test]
fn threshold_is_inclusive_after_normalization() {
    let exact = "a".repeat(MIN_CONTENT_CHARS);
    let html = format!("<body><main>\n   {exact}   \n</main></body>");
    assert_eq!(extract(&html).unwrap().text, exact);

    let short = "a".repeat(MIN_CONTENT_CHARS - 1);
    let html = format!("<body><main>   {short}\n\n</main></body>");
    assert!(extract(&html).is_err());
}

#[test]
fn extraction_is_idempotent() {
    let html = format!("<body><main><h1>Title</h1>\n\n<p>{}</p></main></body>", paragraph(50));
    let first = extract(&html).unwrap();
    let second = extract(&html).unwrap();
    assert_eq!(first, second);
}

#[test]
fn outcome_messages_follow_extension_protocol() {
    let ok = outcome_message(5, extract(&format!("<main>{}</main>", paragraph(40))));
    assert!(matches!(ok, RelayMessage::ProcessPageContent { cycle: 5, .. }));

    let failed = outcome_message(6, extract("<body>hi</body>"));
    match failed {
        RelayMessage::ContentExtractionFailure { cycle, url, message } => {
            assert_eq!(cycle, 6);
            assert_eq!(url, URL);
            assert!(message.starts_with("content too short"));
        }
        other => panic!("unexpected message {other:?}"),
    }
}
