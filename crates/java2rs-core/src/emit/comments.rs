// Re-emission of source comments between translated siblings
use crate::ast::{CommentStyle, NodeId, NodeKind, SyntaxTree};

/// Rust spelling of one comment: doc comments become `///` lines, others are kept
pub fn comment_lines(text: &str, style: CommentStyle) -> Vec<String> {
    match style {
        CommentStyle::Line | CommentStyle::Block => text.lines().map(|l| l.trim().to_string()).collect(),
        CommentStyle::Doc => {
            let inner = text
                .trim_start_matches("/**")
                .trim_end_matches("*/");
            let lines: Vec<String> = inner
                .lines()
                .map(|l| l.trim().trim_start_matches('*').trim_end().to_string())
                .collect();
            let start = lines.iter().position(|l| !l.trim().is_empty());
            let end = lines.iter().rposition(|l| !l.trim().is_empty());
            match (start, end) {
                (Some(start), Some(end)) => lines[start..=end]
                    .iter()
                    .map(|l| {
                        let l = l.strip_prefix(' ').unwrap_or(l);
                        if l.is_empty() {
                            "///".to_string()
                        } else {
                            format!("/// {l}")
                        }
                    })
                    .collect(),
                _ => Vec::new(),
            }
        }
    }
}

fn lines_of(tree: &SyntaxTree, comment: NodeId) -> Vec<String> {
    match tree.kind(comment) {
        NodeKind::Comment { text, style } => comment_lines(text, *style),
        _ => Vec::new(),
    }
}

/// Comments of `node`'s parent that sit between the previous sibling and `node`
pub fn leading_comments(tree: &SyntaxTree, node: NodeId) -> Vec<String> {
    let Some(parent) = tree.parent(node) else {
        return Vec::new();
    };
    let mut pending = Vec::new();
    for child in tree.children(parent) {
        if *child == node {
            return pending.iter().flat_map(|c| lines_of(tree, *c)).collect();
        }
        if matches!(tree.kind(*child), NodeKind::Comment { .. }) {
            pending.push(*child);
        } else {
            pending.clear();
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn doc_comments_become_triple_slash() {
        let lines = comment_lines("/**\n * Adds two numbers.\n *\n * @param a first\n */", CommentStyle::Doc);
        assert_eq!(lines, vec!["/// Adds two numbers.", "///", "/// @param a first"]);
    }

    #[test]
    fn single_line_doc_comment() {
        assert_eq!(comment_lines("/** Short. */", CommentStyle::Doc), vec!["/// Short."]);
    }

    #[test]
    fn line_and_block_comments_are_kept() {
        assert_eq!(comment_lines("// note", CommentStyle::Line), vec!["// note"]);
        assert_eq!(comment_lines("/* a\n   b */", CommentStyle::Block), vec!["/* a", "b */"]);
    }
}
