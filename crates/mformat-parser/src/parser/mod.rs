//! Statement splitting and block-tree construction.

pub(crate) mod expressions;

use mformat_common::token::{Keyword, Token, TokenKind};

use crate::error::ParseError;
use crate::tree::{BlockKind, NodeId, NodeKind, SyntaxTree};

/// Split the token stream into raw statements.
///
/// A statement ends after a semicolon, after a comma outside any grouping,
/// or after a newline whose preceding token is not a line-continuation
/// comment. The terminator stays the last token of its statement; tokens
/// left over at end of input form a final statement of their own.
pub(crate) fn split_into_statements(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut previous: Option<&Token> = None;

    for token in tokens {
        current.push(token.clone());

        let boundary = match token.kind {
            TokenKind::Semicolon => true,
            TokenKind::Comma => token.group_depth == 0,
            TokenKind::Newline => {
                previous.is_some_and(|p| p.kind != TokenKind::LineContinuationComment)
            }
            _ => false,
        };
        if boundary {
            statements.push(std::mem::take(&mut current));
        }
        previous = Some(token);
    }

    if !current.is_empty() {
        statements.push(current);
    }
    statements
}

/// Fold the raw statements into the block tree.
///
/// The first non-whitespace token of each statement decides its role: a
/// block-opening keyword starts a new block with the statement as header
/// clause, a branch keyword reopens the nearest enclosing block, `end`
/// terminates it, and anything else is an ordinary statement at the cursor.
pub(crate) fn build_blocks(
    tree: &mut SyntaxTree,
    statements: Vec<Vec<Token>>,
) -> Result<(), ParseError> {
    let mut cursor = tree.root();

    for statement in statements {
        let head = statement
            .iter()
            .find(|t| t.kind != TokenKind::Whitespace)
            .map(|t| (t.kind, t.start_pos));
        let stmt_node = expressions::parse_statement(tree, &statement)?;

        let Some((TokenKind::Keyword(keyword), pos)) = head else {
            tree.append_child(cursor, stmt_node);
            continue;
        };

        match keyword {
            Keyword::Classdef
            | Keyword::For
            | Keyword::Function
            | Keyword::If
            | Keyword::Parfor
            | Keyword::Switch
            | Keyword::Try
            | Keyword::While => {
                let kind = BlockKind::from_keyword(keyword)
                    .expect("block-opening keywords map to block kinds");
                let block = tree.alloc(NodeKind::Block(kind));
                tree.append_child(cursor, block);
                let clause = tree.alloc(NodeKind::Clause(keyword));
                tree.append_child(block, clause);
                tree.append_child(clause, stmt_node);
                let body = tree.alloc(NodeKind::StatementSequence);
                tree.append_child(block, body);
                cursor = body;
            }
            Keyword::Case
            | Keyword::Catch
            | Keyword::Else
            | Keyword::Elseif
            | Keyword::Otherwise => {
                let block = enclosing_block(tree, cursor).ok_or_else(|| {
                    ParseError::new(
                        format!("`{}` outside of any block", keyword.as_str()),
                        pos,
                    )
                })?;
                let clause = tree.alloc(NodeKind::Clause(keyword));
                tree.append_child(block, clause);
                tree.append_child(clause, stmt_node);
                let body = tree.alloc(NodeKind::StatementSequence);
                tree.append_child(block, body);
                cursor = body;
            }
            Keyword::End => {
                let block = enclosing_block(tree, cursor).ok_or_else(|| {
                    ParseError::new("`end` outside of any block", pos)
                })?;
                tree.append_child(block, stmt_node);
                cursor = tree.parent(block).expect("blocks always have a parent");
            }
            _ => {
                tree.append_child(cursor, stmt_node);
            }
        }
    }

    Ok(())
}

/// Walk from `node` up to the nearest enclosing block, if any.
fn enclosing_block(tree: &SyntaxTree, mut node: NodeId) -> Option<NodeId> {
    loop {
        if matches!(tree.kind(node), NodeKind::Block(_)) {
            return Some(node);
        }
        node = tree.parent(node)?;
    }
}
