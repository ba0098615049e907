use compact_str::CompactString;

use super::{InfixOperator, InfixShortCircuitOperator, PrefixOperator};
use crate::interpreter::LoxValue;
use crate::string::Ident;

#[derive(Debug, Clone)]
pub enum ExpressionAtomKind {
    Number(f64),
    Bool(bool),
    Nil,
    Identifier(Ident),
    StringLiteral(CompactString),
}

#[derive(Debug, Clone)]
pub struct ExpressionAtom {
    pub kind: ExpressionAtomKind,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionNodeRef(pub u32);

/// One node of an expression arena. Operands are refs into the same arena and every node keeps
/// the line of the token that produced it.
#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Atom(ExpressionAtom),
    Group {
        inner: ExpressionNodeRef,
    },
    Prefix {
        operator: PrefixOperator,
        rhs: ExpressionNodeRef,
        line: u32,
    },
    Infix {
        operator: InfixOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
        line: u32,
    },
    InfixAssignment {
        lhs: Ident,
        rhs: ExpressionNodeRef,
    },
    InfixShortCircuit {
        operator: InfixShortCircuitOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
        line: u32,
    },
    Call {
        callee: ExpressionNodeRef,
        arguments: Vec<ExpressionNodeRef>,
        /// Line of the closing parenthesis.
        line: u32,
    },
    Read {
        line: u32,
    },
    Rand {
        line: u32,
    },
    Floor {
        argument: ExpressionNodeRef,
        line: u32,
    },
    Substring {
        subject: ExpressionNodeRef,
        start: ExpressionNodeRef,
        end: ExpressionNodeRef,
        line: u32,
    },
    /// An already evaluated value placed back into a tree.
    Dynamic {
        value: LoxValue,
        line: u32,
    },
}

impl ExpressionNode {
    pub fn get_l_value(&self) -> Option<Ident> {
        match self {
            ExpressionNode::Atom(ExpressionAtom {
                kind: ExpressionAtomKind::Identifier(ident),
                ..
            }) => Some(ident.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IncompleteExpression {
    nodes: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct Expression {
    nodes: Vec<ExpressionNode>,
    root: ExpressionNodeRef,
}

impl IncompleteExpression {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: ExpressionNode) -> ExpressionNodeRef {
        self.nodes.push(node);
        ExpressionNodeRef(self.nodes.len() as u32 - 1)
    }

    pub fn get_node(&self, index: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(index.0 as usize)
    }

    pub fn finish(self, root: ExpressionNodeRef) -> Option<Expression> {
        Expression::new(self, root)
    }
}

impl Expression {
    pub fn new(tree: IncompleteExpression, root: ExpressionNodeRef) -> Option<Self> {
        if !(0..tree.nodes.len()).contains(&(root.0 as usize)) {
            None
        } else {
            Some(Self {
                nodes: tree.nodes,
                root,
            })
        }
    }

    /// A single node tree.
    pub fn from_node(node: ExpressionNode) -> Self {
        Self {
            nodes: vec![node],
            root: ExpressionNodeRef(0),
        }
    }

    pub fn get_root_ref(&self) -> ExpressionNodeRef {
        self.root
    }

    pub fn get_root(&self) -> &ExpressionNode {
        self.get_node(self.get_root_ref())
            .expect("The root exists within the tree.")
    }

    pub fn get_node(&self, node: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(node.0 as usize)
    }

    pub fn get_line(&self, node: ExpressionNodeRef) -> Option<u32> {
        let node = self.get_node(node)?;
        match node {
            ExpressionNode::Atom(ExpressionAtom { line, .. })
            | ExpressionNode::Prefix { line, .. }
            | ExpressionNode::Infix { line, .. }
            | ExpressionNode::InfixShortCircuit { line, .. }
            | ExpressionNode::Call { line, .. }
            | ExpressionNode::Read { line }
            | ExpressionNode::Rand { line }
            | ExpressionNode::Floor { line, .. }
            | ExpressionNode::Substring { line, .. }
            | ExpressionNode::Dynamic { line, .. } => Some(*line),
            ExpressionNode::InfixAssignment { lhs, .. } => Some(lhs.line),
            ExpressionNode::Group { inner } => self.get_line(*inner),
        }
    }
}
