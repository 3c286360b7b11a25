//! Statement bodies and the precedence-partition expression parser.
//!
//! A statement fragment is parsed by repeatedly partitioning the token
//! slice: split at the first assignment anywhere in the slice, else at the
//! top-level commas, else at the loosest-binding top-level operator from the
//! precedence table, and otherwise classify the slice by its last relevant
//! top-level tokens (struct reference, call, subscript, grouping). Powers
//! and transposes carry no precedence entry and are left to that postfix
//! dispatch; a slice it cannot explain is a fatal parse error.

use mformat_common::token::{Delimiter, Op, Token, TokenKind};

use crate::error::ParseError;
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Parse one raw statement into a `Statement` node.
///
/// The statement's children are a leading trivia bucket (whitespace,
/// comments, and statement-initial keywords), the parsed body, and a
/// trailing trivia bucket (terminators included). Every input token lands
/// in exactly one of the three, so the statement serialises back to its
/// source text verbatim.
pub(crate) fn parse_statement(
    tree: &mut SyntaxTree,
    tokens: &[Token],
) -> Result<NodeId, ParseError> {
    let stmt = tree.alloc(NodeKind::Statement);
    let before = tree.alloc(NodeKind::IrrelevantTokens);
    let body = tree.alloc(NodeKind::StatementBody);
    let after = tree.alloc(NodeKind::IrrelevantTokens);
    tree.append_child(stmt, before);
    tree.append_child(stmt, body);
    tree.append_child(stmt, after);

    let start = tokens
        .iter()
        .position(|t| t.is_relevant() && !matches!(t.kind, TokenKind::Keyword(_)));
    let Some(start) = start else {
        append_tokens(tree, before, tokens);
        return Ok(stmt);
    };

    let end = tokens
        .iter()
        .rposition(|t| t.is_relevant() && t.kind != TokenKind::Semicolon)
        .map_or(tokens.len(), |i| i + 1);
    debug_assert!(start <= end);

    append_tokens(tree, before, &tokens[..start]);
    append_tokens(tree, after, &tokens[end..]);
    let fragment = parse_fragment(tree, &tokens[start..end])?;
    tree.append_child(body, fragment);
    Ok(stmt)
}

/// Parse an expression fragment. See the module docs for the partition
/// order. The top level of the slice is defined by the group depth of its
/// first token.
pub(crate) fn parse_fragment(
    tree: &mut SyntaxTree,
    tokens: &[Token],
) -> Result<NodeId, ParseError> {
    if tokens.is_empty() {
        return Ok(tree.alloc(NodeKind::Empty));
    }
    let depth = tokens[0].group_depth;

    // 1. Assignment: split at the first `=`, wherever it sits.
    if let Some(i) = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Operator(Op::Assign))
    {
        return operator_node(tree, tokens, i, Op::Assign);
    }

    // 2. Top-level comma list.
    if tokens
        .iter()
        .any(|t| t.kind == TokenKind::Comma && t.group_depth == depth)
    {
        return comma_list(tree, tokens, depth);
    }

    // 3. Loosest-binding top-level operator; ties go to the last occurrence.
    let selected = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.group_depth == depth)
        .filter_map(|(i, t)| match t.kind {
            TokenKind::Operator(op) => op.precedence().map(|prec| (i, op, prec)),
            _ => None,
        })
        .max_by_key(|&(_, _, prec)| prec);
    if let Some((i, op, _)) = selected {
        return operator_node(tree, tokens, i, op);
    }

    // 4. Classify by the relevant top-level tokens.
    let relevant: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.group_depth == depth && t.is_relevant())
        .map(|(i, _)| i)
        .collect();

    match relevant.len() {
        0 => {
            let bucket = tree.alloc(NodeKind::IrrelevantTokens);
            append_tokens(tree, bucket, tokens);
            Ok(bucket)
        }
        1 => {
            let node = tree.alloc(NodeKind::RelevantToken);
            let index = relevant[0];
            let before = tree.alloc(NodeKind::IrrelevantTokens);
            append_tokens(tree, before, &tokens[..index]);
            tree.append_child(node, before);
            let leaf = tree.alloc_token(tokens[index].clone());
            tree.append_child(node, leaf);
            let after = tree.alloc(NodeKind::IrrelevantTokens);
            append_tokens(tree, after, &tokens[index + 1..]);
            tree.append_child(node, after);
            Ok(node)
        }
        _ => postfix_dispatch(tree, tokens, &relevant),
    }
}

/// Dispatch on the last two relevant top-level tokens.
fn postfix_dispatch(
    tree: &mut SyntaxTree,
    tokens: &[Token],
    relevant: &[usize],
) -> Result<NodeId, ParseError> {
    let last = relevant[relevant.len() - 1];
    let second_to_last = relevant[relevant.len() - 2];

    if tokens[last].kind == TokenKind::Identifier
        && tokens[second_to_last].kind == TokenKind::Period
    {
        return reference_node(
            tree,
            tokens,
            second_to_last,
            last,
            NodeKind::StructReference,
            NodeKind::ReferencedStruct,
            NodeKind::StructReferenceArguments,
        );
    }

    let TokenKind::Close(group) = tokens[last].kind else {
        return Err(unexpected(&tokens[last]));
    };

    if group.with_identifier {
        let (node_kind, referenced_kind, arguments_kind) = match group.delimiter {
            Delimiter::Parenthesis => (
                NodeKind::FunctionCall,
                NodeKind::CalledFunction,
                NodeKind::FunctionArguments,
            ),
            Delimiter::Brace => (
                NodeKind::CellReference,
                NodeKind::ReferencedCell,
                NodeKind::CellReferenceArguments,
            ),
            // The lexer never marks brackets as calls.
            Delimiter::Bracket => return Err(unexpected(&tokens[last])),
        };
        debug_assert!(matches!(tokens[second_to_last].kind, TokenKind::Open(_)));
        reference_node(
            tree,
            tokens,
            second_to_last,
            last,
            node_kind,
            referenced_kind,
            arguments_kind,
        )
    } else {
        if relevant.len() != 2 {
            return Err(unexpected(&tokens[last]));
        }
        let node_kind = match group.delimiter {
            Delimiter::Parenthesis => NodeKind::ParenthesisGroup,
            Delimiter::Bracket => NodeKind::BracketGroup,
            Delimiter::Brace => NodeKind::BraceGroup,
        };
        let node = tree.alloc(node_kind);
        let before = tree.alloc(NodeKind::IrrelevantTokens);
        append_tokens(tree, before, &tokens[..second_to_last]);
        tree.append_child(node, before);
        let opener = tree.alloc_token(tokens[second_to_last].clone());
        tree.append_child(node, opener);
        let contents = tree.alloc(NodeKind::GroupContents);
        let inner = parse_fragment(tree, &tokens[second_to_last + 1..last])?;
        tree.append_child(contents, inner);
        tree.append_child(node, contents);
        let closer = tree.alloc_token(tokens[last].clone());
        tree.append_child(node, closer);
        let after = tree.alloc(NodeKind::IrrelevantTokens);
        append_tokens(tree, after, &tokens[last + 1..]);
        tree.append_child(node, after);
        Ok(node)
    }
}

/// Shared shape of struct references, calls, and cell subscripts:
/// referenced part, connector token, arguments, final token, trailing
/// trivia.
fn reference_node(
    tree: &mut SyntaxTree,
    tokens: &[Token],
    connector: usize,
    last: usize,
    node_kind: NodeKind,
    referenced_kind: NodeKind,
    arguments_kind: NodeKind,
) -> Result<NodeId, ParseError> {
    let node = tree.alloc(node_kind);
    let referenced = tree.alloc(referenced_kind);
    let target = parse_fragment(tree, &tokens[..connector])?;
    tree.append_child(referenced, target);
    tree.append_child(node, referenced);
    let connector_leaf = tree.alloc_token(tokens[connector].clone());
    tree.append_child(node, connector_leaf);
    let arguments = tree.alloc(arguments_kind);
    let contents = parse_fragment(tree, &tokens[connector + 1..last])?;
    tree.append_child(arguments, contents);
    tree.append_child(node, arguments);
    let last_leaf = tree.alloc_token(tokens[last].clone());
    tree.append_child(node, last_leaf);
    let trailing = tree.alloc(NodeKind::IrrelevantTokens);
    append_tokens(tree, trailing, &tokens[last + 1..]);
    tree.append_child(node, trailing);
    Ok(node)
}

/// Binary/prefix operator node: left operand, operator token, right
/// operand. A prefix application simply gets an `Empty` left operand.
fn operator_node(
    tree: &mut SyntaxTree,
    tokens: &[Token],
    index: usize,
    op: Op,
) -> Result<NodeId, ParseError> {
    let node = tree.alloc(NodeKind::Operator(op));
    let left = parse_fragment(tree, &tokens[..index])?;
    tree.append_child(node, left);
    let leaf = tree.alloc_token(tokens[index].clone());
    tree.append_child(node, leaf);
    let right = parse_fragment(tree, &tokens[index + 1..])?;
    tree.append_child(node, right);
    Ok(node)
}

/// Fragments alternating with their separating top-level commas. A comma as
/// the very last token gets no trailing fragment.
fn comma_list(
    tree: &mut SyntaxTree,
    tokens: &[Token],
    depth: usize,
) -> Result<NodeId, ParseError> {
    let node = tree.alloc(NodeKind::CommaSeparatedList);
    let mut segment_start = 0;

    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Comma && token.group_depth == depth {
            let fragment = parse_fragment(tree, &tokens[segment_start..i])?;
            tree.append_child(node, fragment);
            let comma = tree.alloc_token(token.clone());
            tree.append_child(node, comma);
            segment_start = i + 1;
        }
    }
    if segment_start < tokens.len() {
        let fragment = parse_fragment(tree, &tokens[segment_start..])?;
        tree.append_child(node, fragment);
    }
    Ok(node)
}

fn append_tokens(tree: &mut SyntaxTree, parent: NodeId, tokens: &[Token]) {
    for token in tokens {
        let leaf = tree.alloc_token(token.clone());
        tree.append_child(parent, leaf);
    }
}

fn unexpected(token: &Token) -> ParseError {
    ParseError::new(
        format!(
            "unexpected last relevant top-level token `{}`",
            token.text
        ),
        token.start_pos,
    )
}
