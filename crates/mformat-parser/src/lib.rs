// mformat parser -- builds the syntax tree the formatter rewrites.

mod depth;
pub mod error;
mod parser;
pub mod tree;

pub use error::ParseError;
pub use tree::{BlockKind, NodeId, NodeKind, SyntaxTree};

use mformat_common::settings::Settings;
use mformat_common::token::Token;

/// Parse a token stream into a syntax tree.
///
/// Runs the three parser phases: split the stream into raw statements,
/// fold them into the block tree, and parse each statement body into its
/// expression structure; a final pass assigns every statement its
/// indentation depth (which is why the settings are needed here).
///
/// The returned tree serialises back to the input byte for byte:
/// `tree.text(tree.root())` equals the concatenated token texts.
pub fn parse(tokens: &[Token], settings: &Settings) -> Result<SyntaxTree, ParseError> {
    let statements = parser::split_into_statements(tokens);
    let mut tree = SyntaxTree::new();
    parser::build_blocks(&mut tree, statements)?;
    depth::assign_block_depths(&mut tree, settings);
    Ok(tree)
}
