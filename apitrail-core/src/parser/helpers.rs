//! Helper functions for tree-sitter AST navigation and literal cleanup.

use tree_sitter::Node;

/// Get the text content of a node.
pub fn get_node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    if start < source.len() && end <= source.len() && start < end {
        &source[start..end]
    } else {
        ""
    }
}

/// Find the first child of a specific type.
pub fn find_child_by_type<'a>(node: &Node<'a>, type_name: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == type_name);
    found
}

/// Named children, skipping comments.
pub fn named_children<'a>(node: &Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Get line number (1-indexed) from a node.
pub fn get_start_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Line (1-indexed) of the first syntax error below `node`, if any.
pub fn first_error_line(node: &Node) -> Option<u32> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(get_start_line(node));
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .iter()
        .find_map(first_error_line)
        .or_else(|| Some(get_start_line(node)))
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Value of a Python string literal: prefix letters and quotes removed.
pub fn string_literal_value(text: &str) -> &str {
    let prefix_len = text
        .chars()
        .take_while(|c| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F'))
        .count()
        .min(2);
    let body = &text[prefix_len..];

    for quote in ["\"\"\"", "'''"] {
        if body.len() >= 6 && body.starts_with(quote) && body.ends_with(quote) {
            return &body[3..body.len() - 3];
        }
    }
    for quote in ["\"", "'"] {
        if body.len() >= 2 && body.starts_with(quote) && body.ends_with(quote) {
            return &body[1..body.len() - 1];
        }
    }
    body
}

/// Clean a docstring the way Python's `inspect.cleandoc` does.
///
/// The first line is stripped, the common indentation of the remaining lines
/// is removed and leading/trailing blank lines are dropped.
pub fn clean_docstring(raw: &str) -> Option<String> {
    let expanded = raw.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return None;
    }

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim().to_string());
    for line in lines.iter().skip(1) {
        // Margin is counted in chars; blank lines may hold multi-byte spaces.
        let trimmed = match line.char_indices().nth(margin) {
            Some((idx, _)) => &line[idx..],
            None => "",
        };
        cleaned.push(trimmed.trim_end().to_string());
    }

    while cleaned.first().map_or(false, |l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().map_or(false, |l| l.is_empty()) {
        cleaned.pop();
    }

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Dict[str,\n    int]"), "Dict[str, int]");
        assert_eq!(collapse_whitespace("  x  "), "x");
    }

    #[test]
    fn test_string_literal_value() {
        assert_eq!(string_literal_value("\"\"\"Hello world\"\"\""), "Hello world");
        assert_eq!(string_literal_value("'''Hello'''"), "Hello");
        assert_eq!(string_literal_value("\"test\""), "test");
        assert_eq!(string_literal_value("r'raw\\d'"), "raw\\d");
        assert_eq!(string_literal_value("rb\"bytes\""), "bytes");
        assert_eq!(string_literal_value("\"\""), "");
    }

    #[test]
    fn test_clean_docstring_single_line() {
        assert_eq!(
            clean_docstring("A simple function."),
            Some("A simple function.".to_string())
        );
        assert_eq!(clean_docstring("   "), None);
    }

    #[test]
    fn test_clean_docstring_dedents() {
        let raw = "\n    This is a new function.\n\n    .. deprecated:: 1.5\n        Use other instead.\n    ";
        assert_eq!(
            clean_docstring(raw),
            Some(
                "This is a new function.\n\n.. deprecated:: 1.5\n    Use other instead."
                    .to_string()
            )
        );
    }

    #[test]
    fn test_clean_docstring_unicode_blank_line() {
        let raw = "Doc.\n    x\n  \u{3000}\u{a0}\n    y\n    ";
        assert_eq!(clean_docstring(raw), Some("Doc.\nx\n\ny".to_string()));

        let raw = "Doc.\n  \u{3000}\n    x\n";
        assert_eq!(clean_docstring(raw), Some("Doc.\n\nx".to_string()));
    }
}
