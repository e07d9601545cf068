use ego_tree::iter::Edge;
use propel_core::{
    normalize_whitespace, CycleId, ExtractionFailure, ExtractionFailureReason, ExtractionResult,
    RelayMessage, MIN_CONTENT_CHARS,
};
use propel_logging::propel_debug;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::PageSnapshot;

/// Content containers tried in order before falling back to the page body.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "main",
    r#"[role="main"]"#,
    "article",
    ".main-content",
    ".post-body",
    ".entry-content",
    "#content",
];

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that visually separate their text from neighbours.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// One way of locating the primary content of a parsed page.
///
/// Returns the raw visible text of the element it settled on, or `None` when the page
/// has no such element.
pub trait ContentStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn select(&self, doc: &Html) -> Option<String>;
}

/// First element matching a CSS selector.
#[derive(Debug)]
pub struct SelectorStrategy {
    css: String,
    selector: Selector,
}

impl SelectorStrategy {
    pub fn new(css: &str) -> Result<Self, String> {
        let selector = Selector::parse(css).map_err(|err| err.to_string())?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }
}

impl ContentStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.css
    }

    fn select(&self, doc: &Html) -> Option<String> {
        doc.select(&self.selector).next().map(visible_text)
    }
}

/// The whole `<body>`, or the document root when there is no body element.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyFallback;

impl ContentStrategy for BodyFallback {
    fn name(&self) -> &str {
        "body"
    }

    fn select(&self, doc: &Html) -> Option<String> {
        let body = Selector::parse("body").ok();
        let node = body
            .as_ref()
            .and_then(|sel| doc.select(sel).next())
            .unwrap_or_else(|| doc.root_element());
        Some(visible_text(node))
    }
}

/// Text nodes under `element` in document order, skipping hidden elements and treating
/// block boundaries as whitespace.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut hidden_depth = 0usize;
    for edge in element.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(el) => {
                    if hidden_depth > 0 || HIDDEN_ELEMENTS.contains(&el.name()) {
                        hidden_depth += 1;
                    } else if BLOCK_ELEMENTS.contains(&el.name()) {
                        out.push(' ');
                    }
                }
                Node::Text(text) if hidden_depth == 0 => out.push_str(text),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(el) = node.value() {
                    if hidden_depth > 0 {
                        hidden_depth -= 1;
                    } else if BLOCK_ELEMENTS.contains(&el.name()) {
                        out.push(' ');
                    }
                }
            }
        }
    }
    out
}

pub trait Extractor: Send + Sync {
    fn extract(&self, page: &PageSnapshot) -> Result<ExtractionResult, ExtractionFailure>;
}

/// Applies content strategies in priority order and keeps the first that finds an element.
pub struct PrioritizedExtractor {
    strategies: Vec<Box<dyn ContentStrategy>>,
    min_chars: usize,
}

impl Default for PrioritizedExtractor {
    fn default() -> Self {
        let mut strategies: Vec<Box<dyn ContentStrategy>> = DEFAULT_CONTENT_SELECTORS
            .iter()
            .filter_map(|css| SelectorStrategy::new(css).ok())
            .map(|s| Box::new(s) as Box<dyn ContentStrategy>)
            .collect();
        strategies.push(Box::new(BodyFallback));
        Self::new(strategies)
    }
}

impl PrioritizedExtractor {
    pub fn new(strategies: Vec<Box<dyn ContentStrategy>>) -> Self {
        Self {
            strategies,
            min_chars: MIN_CONTENT_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl Extractor for PrioritizedExtractor {
    fn extract(&self, page: &PageSnapshot) -> Result<ExtractionResult, ExtractionFailure> {
        let doc = Html::parse_document(&page.html);
        let failure = |reason: ExtractionFailureReason| ExtractionFailure {
            url: page.url.clone(),
            reason,
        };

        let (strategy, raw) = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.select(&doc).map(|text| (strategy.name(), text)))
            .ok_or_else(|| failure(ExtractionFailureReason::NoContent))?;

        let text = normalize_whitespace(&raw);
        let chars = text.chars().count();
        propel_debug!("strategy {} produced {} characters", strategy, chars);
        if chars < self.min_chars {
            return Err(failure(ExtractionFailureReason::ContentTooShort { chars }));
        }
        Ok(ExtractionResult {
            url: page.url.clone(),
            text,
        })
    }
}

/// The single message the extractor sends back to the coordinator for a cycle.
pub fn outcome_message(
    cycle: CycleId,
    outcome: Result<ExtractionResult, ExtractionFailure>,
) -> RelayMessage {
    match outcome {
        Ok(result) => RelayMessage::ProcessPageContent {
            cycle,
            url: result.url,
            text_content: result.text,
        },
        Err(failure) => RelayMessage::ContentExtractionFailure {
            cycle,
            url: failure.url,
            message: failure.reason.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_body(html: &str) -> String {
        let doc = Html::parse_document(html);
        BodyFallback.select(&doc).unwrap()
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let text = parse_body(
            "<body><p>keep</p><script>var x = 1;</script><style>p{}</style>\
             <noscript><b>nojs</b></noscript><p>this</p></body>",
        );
        assert_eq!(normalize_whitespace(&text), "keep this");
    }

    #[test]
    fn block_boundaries_separate_words_inline_does_not() {
        let text = parse_body("<body><p>one</p><p>two</p><span>th</span><b>ree</b></body>");
        assert_eq!(normalize_whitespace(&text), "one two three");
    }

    #[test]
    fn invalid_selector_is_rejected() {
        assert!(SelectorStrategy::new("[[").is_err());
    }

    #[test]
    fn threshold_can_be_lowered() {
        let page = PageSnapshot::new("https://example.com/", "<body><main>short note</main></body>");
        let strict = PrioritizedExtractor::default();
        assert!(matches!(
            strict.extract(&page),
            Err(ExtractionFailure {
                reason: ExtractionFailureReason::ContentTooShort { chars: 10 },
                ..
            })
        ));
        let lenient = PrioritizedExtractor::default().with_min_chars(10);
        assert_eq!(lenient.extract(&page).unwrap().text, "short note");
    }

    #[test]
    fn default_order_ends_with_body() {
        let extractor = PrioritizedExtractor::default();
        let names = extractor.strategy_names();
        assert_eq!(names.first(), Some(&"main"));
        assert_eq!(names.last(), Some(&"body"));
        assert_eq!(names.len(), DEFAULT_CONTENT_SELECTORS.len() + 1);
    }
}
