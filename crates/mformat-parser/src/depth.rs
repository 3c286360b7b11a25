//! Indentation-depth assignment.
//!
//! After the block tree is built, a pre-order walk annotates every
//! statement with the indentation depth the formatter should give it.
//! Non-function blocks indent their bodies by one level; function bodies
//! indent according to whether the function is the file's *main* function
//! (the first one), a *local* sibling, or a *nested* function, each with
//! its own setting. Whether functions close with `end` at all is decided
//! once, from the first function block, and applied globally.

use mformat_common::settings::Settings;
use mformat_common::token::Keyword;

use crate::tree::{BlockKind, NodeId, NodeKind, SyntaxTree};

#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    Main,
    Local,
    Nested,
}

struct WalkState {
    main_started: bool,
    functions_have_end: bool,
}

pub(crate) fn assign_block_depths(tree: &mut SyntaxTree, settings: &Settings) {
    let mut state = WalkState {
        main_started: false,
        functions_have_end: first_function_has_end(tree),
    };
    walk(tree, tree.root(), 0, 0, &mut state, settings);
}

/// Whether the first function block in document order carries an `end`
/// terminator statement. Files without functions default to `false`; files
/// mixing both conventions keep the first function's answer.
fn first_function_has_end(tree: &SyntaxTree) -> bool {
    tree.preorder(tree.root())
        .into_iter()
        .find(|&id| tree.kind(id) == NodeKind::Block(BlockKind::Function))
        .map(|id| {
            tree.children(id)
                .iter()
                .any(|&child| tree.kind(child) == NodeKind::Statement)
        })
        .unwrap_or(false)
}

fn walk(
    tree: &mut SyntaxTree,
    node: NodeId,
    depth: usize,
    function_depth: usize,
    state: &mut WalkState,
    settings: &Settings,
) {
    match tree.kind(node) {
        NodeKind::Statement => {
            tree.set_block_depth(node, depth);
        }
        NodeKind::Block(block_kind) => {
            let (base, indent_body, child_function_depth) =
                if block_kind == BlockKind::Function {
                    let flavour = classify_function(state, function_depth);
                    let indent = match flavour {
                        FunctionKind::Main => settings.indent_main_function,
                        FunctionKind::Local => settings.indent_local_function,
                        FunctionKind::Nested => settings.indent_nested_function,
                    };
                    // A local function restarts indentation at column zero.
                    let base = if flavour == FunctionKind::Local { 0 } else { depth };
                    // Without `end`s, functions nest structurally but not
                    // semantically; only the outermost level counts then.
                    let next = if state.functions_have_end || function_depth == 0 {
                        function_depth + 1
                    } else {
                        function_depth
                    };
                    (base, indent, next)
                } else {
                    (depth, true, function_depth)
                };
            let inner = base + usize::from(indent_body);

            let children: Vec<NodeId> = tree.children(node).to_vec();
            let mut previous_clause: Option<Keyword> = None;
            for child in children {
                match tree.kind(child) {
                    // The terminating `end` statement sits at the outer depth.
                    NodeKind::Statement => {
                        tree.set_block_depth(child, base);
                        previous_clause = None;
                    }
                    NodeKind::Clause(keyword) => {
                        let case_clause =
                            matches!(keyword, Keyword::Case | Keyword::Otherwise);
                        let clause_depth = if case_clause && settings.indent_case_otherwise {
                            inner
                        } else {
                            base
                        };
                        walk(tree, child, clause_depth, child_function_depth, state, settings);
                        previous_clause = Some(keyword);
                    }
                    NodeKind::StatementSequence => {
                        let after_case = matches!(
                            previous_clause,
                            Some(Keyword::Case | Keyword::Otherwise)
                        );
                        let body_depth = if after_case && settings.indent_case_otherwise {
                            inner + 1
                        } else {
                            inner
                        };
                        walk(tree, child, body_depth, child_function_depth, state, settings);
                        previous_clause = None;
                    }
                    _ => {
                        walk(tree, child, inner, child_function_depth, state, settings);
                        previous_clause = None;
                    }
                }
            }
        }
        _ => {
            let children: Vec<NodeId> = tree.children(node).to_vec();
            for child in children {
                walk(tree, child, depth, function_depth, state, settings);
            }
        }
    }
}

/// The first function of a file is main; inside a function (when functions
/// have `end`s) further functions are nested; everything else is local.
fn classify_function(state: &mut WalkState, function_depth: usize) -> FunctionKind {
    if !state.main_started {
        state.main_started = true;
        FunctionKind::Main
    } else if state.functions_have_end && function_depth >= 1 {
        FunctionKind::Nested
    } else {
        FunctionKind::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mformat_lexer::Lexer;

    /// Parse and return `(statement text, block depth)` pairs, skipping
    /// blank statements.
    fn depths(source: &str, settings: &Settings) -> Vec<(String, usize)> {
        let tokens = Lexer::tokenize(source);
        let tree = crate::parse(&tokens, settings).expect("parses");
        tree.preorder(tree.root())
            .into_iter()
            .filter(|&id| tree.kind(id) == NodeKind::Statement)
            .map(|id| {
                let text = tree.text(id).trim().to_string();
                (text, tree.block_depth(id).expect("depth assigned"))
            })
            .filter(|(text, _)| !text.is_empty())
            .collect()
    }

    #[test]
    fn nested_blocks_indent_one_level_each() {
        let got = depths("if a;b; if c; d; end;end;", &Settings::default());
        assert_eq!(
            got,
            vec![
                ("if a;".into(), 0),
                ("b;".into(), 1),
                ("if c;".into(), 1),
                ("d;".into(), 2),
                ("end;".into(), 1),
                ("end;".into(), 0),
            ]
        );
    }

    #[test]
    fn case_clauses_indent_when_configured() {
        let source = "switch x\ncase 1\na;\notherwise\nb;\nend\n";
        let got = depths(source, &Settings::default());
        assert_eq!(
            got,
            vec![
                ("switch x".into(), 0),
                ("case 1".into(), 1),
                ("a;".into(), 2),
                ("otherwise".into(), 1),
                ("b;".into(), 2),
                ("end".into(), 0),
            ]
        );

        let flat = Settings {
            indent_case_otherwise: false,
            ..Settings::default()
        };
        let got = depths(source, &flat);
        assert_eq!(
            got,
            vec![
                ("switch x".into(), 0),
                ("case 1".into(), 0),
                ("a;".into(), 1),
                ("otherwise".into(), 0),
                ("b;".into(), 1),
                ("end".into(), 0),
            ]
        );
    }

    #[test]
    fn main_nested_and_local_functions() {
        let source = "function main\na;\nfunction nested\nb;\nend\nend\nfunction local\nc;\nend\n";
        let got = depths(source, &Settings::default());
        assert_eq!(
            got,
            vec![
                ("function main".into(), 0),
                ("a;".into(), 0),
                ("function nested".into(), 0),
                ("b;".into(), 1),
                ("end".into(), 0),
                ("end".into(), 0),
                ("function local".into(), 0),
                ("c;".into(), 0),
                ("end".into(), 0),
            ]
        );
    }

    #[test]
    fn endless_functions_are_main_then_local() {
        let source = "function main\na;\nfunction local\nb;\n";
        let got = depths(source, &Settings::default());
        assert_eq!(
            got,
            vec![
                ("function main".into(), 0),
                ("a;".into(), 0),
                ("function local".into(), 0),
                ("b;".into(), 0),
            ]
        );
    }

    #[test]
    fn local_function_resets_inherited_depth() {
        // With an indented main body and no `end`s, the local function
        // block structurally nests inside main but restarts at column zero.
        let source = "function main\na;\nfunction local\nb;\n";
        let settings = Settings {
            indent_main_function: true,
            ..Settings::default()
        };
        let got = depths(source, &settings);
        assert_eq!(
            got,
            vec![
                ("function main".into(), 0),
                ("a;".into(), 1),
                ("function local".into(), 0),
                ("b;".into(), 0),
            ]
        );
    }

    #[test]
    fn control_blocks_inside_functions_keep_their_ends() {
        // An `if ... end` inside an end-less main function must not flip
        // the functions-have-end answer.
        let source = "function main\nif a\nb;\nend\nfunction local\nc;\n";
        let got = depths(source, &Settings::default());
        assert_eq!(
            got,
            vec![
                ("function main".into(), 0),
                ("if a".into(), 0),
                ("b;".into(), 1),
                ("end".into(), 0),
                ("function local".into(), 0),
                ("c;".into(), 0),
            ]
        );
    }
}
