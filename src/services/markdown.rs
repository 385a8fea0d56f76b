//! Markdown rendering
//!
//! Converts content bodies from Markdown to HTML for storage alongside the
//! source text.

use pulldown_cmark::{html, Options, Parser};

/// Render a Markdown string to HTML
pub fn render_markdown(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(input, options);

    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let html = render_markdown("# Headline\n\nSome **bold** text.");
        assert!(html.contains("<h1>Headline</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_render_table() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_render_empty_input() {
        assert_eq!(render_markdown(""), "");
    }
}
