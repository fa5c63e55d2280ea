//! HTML text extraction.

use scraper::{ElementRef, Html};

/// Elements whose text is navigation, layout or code rather than content.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "header", "footer", "nav", "iframe"];

/// Extract visible text from an HTML document.
///
/// Subtrees rooted at [`STRIPPED_ELEMENTS`] are skipped entirely. Remaining
/// text nodes are joined with line breaks and the result is trimmed.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut pieces = Vec::new();
    collect_text(document.root_element(), &mut pieces);
    pieces.join("\n").trim().to_string()
}

fn collect_text(element: ElementRef<'_>, pieces: &mut Vec<String>) {
    if STRIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, pieces);
        } else if let Some(text) = child.value().as_text() {
            let text: &str = text;
            if !text.trim().is_empty() {
                pieces.push(text.to_string());
            }
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_boilerplate_elements() {
        let html = r#"
            <html>
              <head><style>body { color: red; }</style><script>var token = 1;</script></head>
              <body>
                <header>University Portal</header>
                <nav><a href="/">Home</a></nav>
                <h1>CSC 201 Final Exam</h1>
                <p>Question 1: Define a linked list.</p>
                <iframe>embedded ad</iframe>
                <footer>Copyright 2024</footer>
              </body>
            </html>"#;

        let text = extract_text(html);

        assert!(text.contains("CSC 201 Final Exam"));
        assert!(text.contains("Question 1: Define a linked list."));
        for excluded in ["color: red", "var token", "University Portal", "Home", "embedded ad", "Copyright"] {
            assert!(!text.contains(excluded), "leaked: {excluded}");
        }
    }

    #[test]
    fn test_joins_text_nodes_with_newlines() {
        let text = extract_text("<body><p>First</p><p>Second</p></body>");
        assert_eq!(text, "First\nSecond");
    }

    #[test]
    fn test_nested_stripped_content_is_removed() {
        let text = extract_text("<div><nav><ul><li><b>Deep link</b></li></ul></nav>Kept</div>");
        assert_eq!(text, "Kept");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
