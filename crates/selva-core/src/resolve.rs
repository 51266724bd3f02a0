//! Static scope resolution over the minimal AST
//!
//! Produces the binding table (expression id to lexical depth) a declared
//! function needs at call time. The bridge synthesizer runs this on every
//! generated fragment so the fragment behaves exactly as if a script author
//! had written it before the global resolution pass; the table travels with
//! the function instead of being merged into shared interpreter state.

use rustc_hash::FxHashSet;

use crate::ast::{Bindings, Expr, ExprId, FunctionDecl, Stmt};

#[derive(Default)]
struct ScopeResolver {
    scopes: Vec<FxHashSet<String>>,
    bindings: Bindings,
}

impl ScopeResolver {
    fn function(&mut self, decl: &FunctionDecl) {
        let mut scope = FxHashSet::default();
        for param in &decl.params {
            scope.insert(param.clone());
        }
        scope.insert("this".to_string());
        self.scopes.push(scope);
        self.block(&decl.body);
        self.scopes.pop();
    }

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => self.expr(expr),
            Stmt::Return(Some(expr)) => self.expr(expr),
            Stmt::Return(None) => {}
            Stmt::Function(decl) => {
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(decl.name.clone());
                }
                self.function(decl);
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Variable { id, name } => self.local(*id, name),
            Expr::This { id } => self.local(*id, "this"),
            Expr::Call { callee, args, .. } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
        }
    }

    fn local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains(name) {
                self.bindings.insert(id, depth);
                return;
            }
        }
        // Unresolved names fall through to the global environment.
    }
}

/// Resolve one function declaration to its binding table
pub fn resolve_function(decl: &FunctionDecl) -> Bindings {
    let mut resolver = ScopeResolver::default();
    resolver.function(decl);
    resolver.bindings
}

/// Resolve a top-level statement sequence
pub fn resolve_stmts(stmts: &[Stmt]) -> Bindings {
    let mut resolver = ScopeResolver::default();
    resolver.block(stmts);
    resolver.bindings
}
