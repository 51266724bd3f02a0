//! Minimal statement/expression model shared with the external frontend
//!
//! The bridge does not own a lexer or parser; it only needs enough AST to
//! synthesize member forwarder fragments (`return $bridge(member, this, ...)`)
//! and to accept statement sequences handed over by a frontend collaborator.
//! Expressions carry a process-unique id so scope-resolution tables can key
//! bindings without relying on node addresses.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::host::member::MemberDef;

/// Process-unique identity of an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u64);

impl ExprId {
    /// Allocate a fresh expression id
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        ExprId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Scope-resolution table: expression id to lexical depth
pub type Bindings = FxHashMap<ExprId, usize>;

/// Literal operand of an expression
#[derive(Debug, Clone)]
pub enum Literal {
    /// The nil literal
    Nil,
    /// Boolean literal
    Bool(bool),
    /// Numeric literal (the script's single numeric representation)
    Number(f64),
    /// Text literal
    Str(String),
    /// Host member descriptor embedded by the bridge synthesizer
    Member(Arc<MemberDef>),
}

/// Expression node
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal operand
    Literal {
        /// Node identity
        id: ExprId,
        /// Literal payload
        value: Literal,
    },
    /// A named variable reference
    Variable {
        /// Node identity
        id: ExprId,
        /// Referenced name
        name: String,
    },
    /// The receiver reference `this`
    This {
        /// Node identity
        id: ExprId,
    },
    /// A call expression
    Call {
        /// Node identity
        id: ExprId,
        /// Callee expression
        callee: Box<Expr>,
        /// Argument expressions in order
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Node identity of this expression
    pub fn id(&self) -> ExprId {
        match self {
            Expr::Literal { id, .. }
            | Expr::Variable { id, .. }
            | Expr::This { id }
            | Expr::Call { id, .. } => *id,
        }
    }

    /// Build a literal expression with a fresh id
    pub fn literal(value: Literal) -> Expr {
        Expr::Literal { id: ExprId::next(), value }
    }

    /// Build a variable reference with a fresh id
    pub fn variable(name: impl Into<String>) -> Expr {
        Expr::Variable { id: ExprId::next(), name: name.into() }
    }

    /// Build a `this` reference with a fresh id
    pub fn this() -> Expr {
        Expr::This { id: ExprId::next() }
    }

    /// Build a call expression with a fresh id
    pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call { id: ExprId::next(), callee: Box::new(callee), args }
    }
}

/// Statement node
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Evaluate an expression for its effect
    Expression(Expr),
    /// Return from the enclosing function
    Return(Option<Expr>),
    /// Declare a function in the current scope
    Function(Arc<FunctionDecl>),
}

/// A function declaration, either frontend-produced or bridge-synthesized
#[derive(Debug)]
pub struct FunctionDecl {
    /// Function name
    pub name: String,
    /// Parameter names in order
    pub params: Vec<String>,
    /// Body statements
    pub body: Vec<Stmt>,
    /// Constructors return their receiver regardless of the body result
    pub is_initializer: bool,
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}
