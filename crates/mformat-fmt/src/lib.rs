// mformat formatter -- rewrites the parsed tree and serialises it.
//
// The formatter never touches the parsed tree it is given: it clones the
// whole arena and mutates the clone through five stages -- strip original
// whitespace, separate statements with newlines, drop superfluous
// semicolons, indent, insert spacing -- then serialises and post-processes
// the text. All inserted tokens are synthetic (no source position).

use mformat_common::settings::Settings;
use mformat_common::token::{Op, Token, TokenKind};
use mformat_parser::{BlockKind, NodeId, NodeKind, ParseError, SyntaxTree};

/// Format source text with the given settings.
///
/// Tokenizes, parses, and rewrites. The only failure mode is a parse
/// error; tokenization anomalies travel through the pipeline as unknown
/// tokens and come out verbatim.
pub fn format_source(source: &str, settings: &Settings) -> Result<String, ParseError> {
    let tokens = mformat_lexer::Lexer::tokenize(source);
    let tree = mformat_parser::parse(&tokens, settings)?;
    Ok(format_tree(&tree, settings))
}

/// Format an already parsed tree. The input tree is left untouched.
pub fn format_tree(tree: &SyntaxTree, settings: &Settings) -> String {
    let mut tree = tree.clone();
    let root = tree.root();

    remove_whitespace(&mut tree, root);
    insert_newlines(&mut tree);
    remove_superfluous_semicolons(&mut tree);
    indent(&mut tree, settings);
    insert_whitespace(&mut tree, root, settings);

    let mut code = strip_trailing_spaces(&tree.text(root));
    if settings.newline_at_end_of_file && !code.is_empty() && !code.ends_with('\n') {
        code.push('\n');
    }
    code
}

// ── Stage 1: strip original whitespace ─────────────────────────────────

/// Delete every whitespace and line-continuation leaf. Right-to-left so
/// the child indices stay valid while removing; continuations take their
/// trailing newline with them, which is what joins continued lines.
fn remove_whitespace(tree: &mut SyntaxTree, node: NodeId) {
    let children: Vec<NodeId> = tree.children(node).to_vec();
    for (index, &child) in children.iter().enumerate().rev() {
        let is_stripped = matches!(
            tree.token(child).map(|t| t.kind),
            Some(TokenKind::Whitespace | TokenKind::LineContinuationComment)
        );
        if is_stripped {
            tree.remove_child(node, index);
        }
    }
    for child in tree.children(node).to_vec() {
        remove_whitespace(tree, child);
    }
}

// ── Stage 2: newlines between statements ───────────────────────────────

/// Append a synthetic newline to every statement that runs into the next
/// one without any newline token in between. Statements that consist of a
/// lone newline are left alone so blank lines do not double up.
///
/// "In between" is decided in document order: a newline separates two
/// statements when its root-relative path sorts strictly between theirs.
fn insert_newlines(tree: &mut SyntaxTree) {
    let root = tree.root();
    let statements: Vec<NodeId> = tree
        .preorder(root)
        .into_iter()
        .filter(|&id| tree.kind(id) == NodeKind::Statement)
        .collect();
    let newline_paths: Vec<Vec<usize>> = tree
        .preorder(root)
        .into_iter()
        .filter(|&id| tree.token(id).is_some_and(|t| t.kind == TokenKind::Newline))
        .map(|id| tree.path(id))
        .collect();

    for pair in statements.windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        let earlier_path = tree.path(earlier);
        let later_path = tree.path(later);
        let separated = newline_paths
            .iter()
            .any(|p| *p > earlier_path && *p < later_path);
        if !separated && tree.text(later) != "\n" {
            let leaf = tree.alloc_token(Token::synthetic("\n", TokenKind::Newline));
            tree.append_child(earlier, leaf);
        }
    }
}

// ── Stage 3: superfluous semicolons ────────────────────────────────────

/// Drop every semicolon inside the header statements of each non-function
/// block -- the opening clause and any branch clauses (`elseif`, `else`,
/// `case`, `otherwise`, `catch`) -- and inside its terminating `end`
/// statement. Semicolons there only suppress output that never existed.
fn remove_superfluous_semicolons(tree: &mut SyntaxTree) {
    let root = tree.root();
    let blocks: Vec<NodeId> = tree
        .preorder(root)
        .into_iter()
        .filter(|&id| {
            matches!(tree.kind(id), NodeKind::Block(kind) if kind != BlockKind::Function)
        })
        .collect();

    for block in blocks {
        for child in tree.children(block).to_vec() {
            match tree.kind(child) {
                NodeKind::Clause(_) | NodeKind::Statement => remove_semicolons(tree, child),
                _ => {}
            }
        }
    }
}

fn remove_semicolons(tree: &mut SyntaxTree, node: NodeId) {
    let mut removals: Vec<(NodeId, usize)> = Vec::new();
    for id in tree.preorder(node) {
        for (index, &child) in tree.children(id).iter().enumerate() {
            if tree.token(child).is_some_and(|t| t.kind == TokenKind::Semicolon) {
                removals.push((id, index));
            }
        }
    }
    for &(parent, index) in removals.iter().rev() {
        tree.remove_child(parent, index);
    }
}

// ── Stage 4: indentation ───────────────────────────────────────────────

/// Prefix every statement with its indentation, normally at child position
/// zero; a statement that begins with an inserted newline keeps the
/// newline first.
fn indent(tree: &mut SyntaxTree, settings: &Settings) {
    let root = tree.root();
    for id in tree.preorder(root) {
        if tree.kind(id) != NodeKind::Statement {
            continue;
        }
        let Some(depth) = tree.block_depth(id) else {
            continue;
        };
        let width = depth * settings.indent;
        if width == 0 {
            continue;
        }
        let starts_with_newline = tree
            .children(id)
            .first()
            .and_then(|&c| tree.token(c))
            .is_some_and(|t| t.kind == TokenKind::Newline);
        let index = usize::from(starts_with_newline);
        let leaf = tree.alloc_token(Token::synthetic(" ".repeat(width), TokenKind::Whitespace));
        tree.insert_child(id, index, leaf);
    }
}

// ── Stage 5: separating whitespace ─────────────────────────────────────

/// Spaces around binary operators, after list commas, and behind keywords
/// and semicolons.
fn insert_whitespace(tree: &mut SyntaxTree, node: NodeId, settings: &Settings) {
    match tree.kind(node) {
        NodeKind::Operator(op) => {
            let children = tree.children(node).to_vec();
            // A prefix application has no left operand: either the empty
            // placeholder, or a trivia bucket whose tokens stage 1 removed.
            let mut spaced = tree.kind(children[0]) != NodeKind::Empty
                && !tree.text(children[0]).is_empty();
            if spaced && op == Op::Colon && settings.omit_space_around_colon {
                spaced = !operands_fit(
                    tree,
                    node,
                    settings.omit_space_around_colon_max_length,
                    TokenKind::Operator(Op::Colon),
                );
            }
            if spaced {
                let after = tree.alloc_token(Token::synthetic(" ", TokenKind::Whitespace));
                tree.insert_child(node, 2, after);
                let before = tree.alloc_token(Token::synthetic(" ", TokenKind::Whitespace));
                tree.insert_child(node, 1, before);
            }
        }
        NodeKind::CommaSeparatedList => {
            if settings.omit_space_after_comma
                && operands_fit(
                    tree,
                    node,
                    settings.omit_space_after_comma_max_length,
                    TokenKind::Comma,
                )
            {
                // Short lists stay compact, children included.
                return;
            }
            let children: Vec<NodeId> = tree.children(node).to_vec();
            for (index, &child) in children.iter().enumerate().rev() {
                if tree.token(child).is_some_and(|t| t.kind == TokenKind::Comma) {
                    let space = tree.alloc_token(Token::synthetic(" ", TokenKind::Whitespace));
                    tree.insert_child(node, index + 1, space);
                }
            }
        }
        NodeKind::Token => {
            if matches!(
                tree.token(node).map(|t| t.kind),
                Some(TokenKind::Keyword(_) | TokenKind::Semicolon)
            ) {
                let space = tree.alloc_token(Token::synthetic(" ", TokenKind::Whitespace));
                tree.append_child(node, space);
            }
        }
        _ => {}
    }

    for child in tree.children(node).to_vec() {
        insert_whitespace(tree, child, settings);
    }
}

/// Whether every child except the excluded separator/operator tokens
/// serialises to at most `limit` bytes.
fn operands_fit(tree: &SyntaxTree, node: NodeId, limit: usize, excluded: TokenKind) -> bool {
    tree.children(node).iter().all(|&child| {
        tree.token(child).map(|t| t.kind) == Some(excluded)
            || tree.text(child).len() <= limit
    })
}

// ── Serialisation post-processing ──────────────────────────────────────

/// Remove runs of trailing spaces from every line, keeping the newlines.
fn strip_trailing_spaces(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.split_inclusive('\n') {
        match line.strip_suffix('\n') {
            Some(body) => {
                out.push_str(body.trim_end_matches(' '));
                out.push('\n');
            }
            None => out.push_str(line.trim_end_matches(' ')),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(source: &str) -> String {
        format_source(source, &Settings::default()).expect("source formats")
    }

    #[test]
    fn strips_trailing_spaces_including_blank_lines() {
        assert_eq!(strip_trailing_spaces("a  \nb\n"), "a\nb\n");
        assert_eq!(strip_trailing_spaces("  \n"), "\n");
        assert_eq!(strip_trailing_spaces("a   "), "a");
        // Tabs are not touched; only space runs are.
        assert_eq!(strip_trailing_spaces("a\t\n"), "a\t\n");
    }

    #[test]
    fn operator_spacing() {
        assert_eq!(format("x=a+(b*(c+d))+e;"), "x = a + (b * (c + d)) + e;\n");
        assert_eq!(
            format("x  =  a  +  (  b  *  (  c  +  d  )  )  +  e  ;"),
            "x = a + (b * (c + d)) + e;\n"
        );
    }

    #[test]
    fn unary_operators_stay_attached() {
        assert_eq!(format("x=-y;"), "x = -y;\n");
        // Original spacing before the sign must not change the result.
        assert_eq!(format("x = -y;"), "x = -y;\n");
        assert_eq!(format("x = ~a;"), "x = ~a;\n");
    }

    #[test]
    fn colon_spaces_elided_for_short_operands() {
        assert_eq!(format("x = 1:10;"), "x = 1:10;\n");
        assert_eq!(format("x = 1:2:10;"), "x = 1:2:10;\n");
        assert_eq!(
            format("x = first:second;"),
            "x = first : second;\n" // `second` exceeds the default threshold
        );
    }

    #[test]
    fn comma_spaces_elided_for_short_items() {
        assert_eq!(format("f(a,b);"), "f(a,b);\n");
        assert_eq!(format("f(aa,b);"), "f(aa, b);\n");
    }

    #[test]
    fn keywords_get_a_separating_space() {
        assert_eq!(format("if a;b;end;"), "if a\n  b;\nend\n");
        assert_eq!(format("for i = 1:10;disp(i);end;"), "for i = 1:10\n  disp(i);\nend\n");
    }

    #[test]
    fn statements_move_to_their_own_lines() {
        assert_eq!(format("a = 1; b = 2;"), "a = 1;\nb = 2;\n");
        assert_eq!(format("a, b"), "a,\nb\n");
    }

    #[test]
    fn blank_lines_are_preserved_not_doubled() {
        assert_eq!(format("a;\n\nb;\n"), "a;\n\nb;\n");
        assert_eq!(format("a;\nb;\n"), "a;\nb;\n");
    }

    #[test]
    fn continuations_join_lines() {
        assert_eq!(format("a = b + ...\n    c;"), "a = b + c;\n");
    }

    #[test]
    fn matrix_rows_split_at_semicolons() {
        // Semicolons end statements at any depth; the reassembled matrix
        // spans two lines, and only the comma list on the second row is
        // re-spaced.
        assert_eq!(format("x = [1, 2; 3, 4];"), "x = [1,2;\n3, 4];\n");
    }

    #[test]
    fn trailing_comments_move_to_their_own_line() {
        assert_eq!(format("x = 1; % done\n"), "x = 1;\n% done\n");
    }

    #[test]
    fn empty_and_trivia_only_inputs() {
        assert_eq!(format(""), "");
        assert_eq!(format("% note\n"), "% note\n");
        assert_eq!(format("%{\nblock\n%}\n"), "%{\nblock\n%}\n");
        assert_eq!(format("\n"), "\n");
    }

    #[test]
    fn string_literals_pass_through_verbatim() {
        assert_eq!(format("s = 'it''s  here';"), "s = 'it''s  here';\n");
    }

    #[test]
    fn final_newline_is_optional() {
        let settings = Settings {
            newline_at_end_of_file: false,
            ..Settings::default()
        };
        assert_eq!(format_source("a;", &settings).unwrap(), "a;");
        assert_eq!(format_source("a;\n", &settings).unwrap(), "a;\n");
    }

    #[test]
    fn parse_errors_propagate() {
        assert!(format_source("hold on;", &Settings::default()).is_err());
    }
}
