//! Owned syntax tree for the mformat pipeline.
//!
//! Nodes live in an index arena: a `SyntaxTree` holds a flat `Vec` of node
//! data, and a [`NodeId`] is an index into it. Parents are back-links by
//! index, children are ordered id vectors, and cloning the arena clones the
//! whole tree wholesale -- which is exactly what the formatter does before
//! mutating anything.
//!
//! The serialisation identity is the heart of the design: [`SyntaxTree::text`]
//! concatenates a node's own token text with its children's text in order,
//! and immediately after parsing this reproduces the source byte for byte.

use mformat_common::token::{Keyword, Op, Token};

/// Index of a node in its [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The compound constructs introduced by a block keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    For,
    While,
    Switch,
    Try,
    Parfor,
    Function,
    Classdef,
}

impl BlockKind {
    /// The block kind a statement-initial keyword opens, if any.
    pub fn from_keyword(keyword: Keyword) -> Option<BlockKind> {
        match keyword {
            Keyword::If => Some(BlockKind::If),
            Keyword::For => Some(BlockKind::For),
            Keyword::While => Some(BlockKind::While),
            Keyword::Switch => Some(BlockKind::Switch),
            Keyword::Try => Some(BlockKind::Try),
            Keyword::Parfor => Some(BlockKind::Parfor),
            Keyword::Function => Some(BlockKind::Function),
            Keyword::Classdef => Some(BlockKind::Classdef),
            _ => None,
        }
    }
}

/// The shape of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Ordered run of statements: the tree root and every block body.
    StatementSequence,
    /// One statement; carries its indentation depth once the parser's
    /// depth pass has run.
    Statement,
    /// Bucket of tokens with no structural role at this position.
    IrrelevantTokens,
    /// Wrapper around a statement's parsed expression.
    StatementBody,
    /// Placeholder for an absent operand or contents.
    Empty,
    /// A single relevant token with its surrounding trivia.
    RelevantToken,
    /// Fragments alternating with top-level commas.
    CommaSeparatedList,
    /// Binary (or prefix, with an `Empty` left operand) operator
    /// application: left operand, operator token, right operand.
    Operator(Op),
    /// `callee(arguments)`.
    FunctionCall,
    CalledFunction,
    FunctionArguments,
    /// `cell{arguments}`.
    CellReference,
    ReferencedCell,
    CellReferenceArguments,
    /// `value.field`.
    StructReference,
    ReferencedStruct,
    StructReferenceArguments,
    /// `( ... )` grouping with no preceding identifier.
    ParenthesisGroup,
    /// `[ ... ]` array literal.
    BracketGroup,
    /// `{ ... }` cell literal.
    BraceGroup,
    GroupContents,
    /// A block construct; children are the header clause, alternating
    /// statement sequences and branch clauses, and -- when the source had
    /// one -- a terminating `end` statement.
    Block(BlockKind),
    /// Header or branch keyword sub-node of a block, holding the clause's
    /// statement.
    Clause(Keyword),
    /// Leaf owning a token.
    Token,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    token: Option<Token>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    block_depth: Option<usize>,
}

/// Arena-backed syntax tree. See the module docs.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    /// Create a tree holding a single empty root statement sequence.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.alloc(NodeKind::StatementSequence);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a new detached node of the given kind.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            token: None,
            parent: None,
            children: Vec::new(),
            block_depth: None,
        });
        id
    }

    /// Allocate a new detached leaf owning `token`.
    pub fn alloc_token(&mut self, token: Token) -> NodeId {
        let id = self.alloc(NodeKind::Token);
        self.nodes[id.index()].token = Some(token);
        id
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        self.nodes[id.index()].token.as_ref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn block_depth(&self, id: NodeId) -> Option<usize> {
        self.nodes[id.index()].block_depth
    }

    pub fn set_block_depth(&mut self, id: NodeId, depth: usize) {
        self.nodes[id.index()].block_depth = Some(depth);
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Insert `child` at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(index, child);
    }

    /// Detach and return the child at `index`. The node itself stays in the
    /// arena but is no longer reachable from the root.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> NodeId {
        let child = self.nodes[parent.index()].children.remove(index);
        self.nodes[child.index()].parent = None;
        child
    }

    /// Serialise the subtree: the node's own token text followed by each
    /// child's text in order.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        if let Some(token) = self.token(id) {
            out.push_str(&token.text);
        }
        for &child in self.children(id) {
            self.write_text(child, out);
        }
    }

    /// Root-relative path of child indices. Paths compare lexicographically
    /// in document (pre-order) order, which is how the formatter decides
    /// whether a token lies between two statements.
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self.children(parent)
                .iter()
                .position(|&c| c == current)
                .expect("child links stay consistent");
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    /// All nodes of the subtree in document (pre-order) order.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_preorder(id, &mut out);
        out
    }

    fn collect_preorder(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in self.children(id) {
            self.collect_preorder(child, out);
        }
    }

    /// Indented structural rendering of the subtree, for tests and debugging.
    pub fn dump(&self, id: NodeId) -> String {
        let mut lines = Vec::new();
        self.write_dump(id, 0, &mut lines);
        lines.join("\n")
    }

    fn write_dump(&self, id: NodeId, level: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(level);
        let label = match self.token(id) {
            Some(token) => format!("{}{:?} {:?}", indent, token.kind, token.text),
            None => format!("{}{:?}", indent, self.kind(id)),
        };
        lines.push(label);
        for &child in self.children(id) {
            self.write_dump(child, level + 1, lines);
        }
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}
