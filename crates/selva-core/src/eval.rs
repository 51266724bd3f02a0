//! Call evaluator seam
//!
//! The full scripting language is an external collaborator; this evaluator
//! covers exactly what the bridge needs to be executable: native callables,
//! declared functions over the minimal AST (which includes every synthesized
//! member forwarder), and class calls that route through `init`. Declared
//! functions execute in a fresh child of the global environment, mirroring
//! how the synthesizer hands out closures with an empty captured scope.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ast::{Bindings, Expr, Literal, Stmt};
use crate::error::{RuntimeError, RuntimeResult};
use crate::resolve;
use crate::value::{Function, FunctionKind, Instance, Value};

/// A lexical environment frame
pub struct Environment {
    values: Mutex<FxHashMap<String, Value>>,
    parent: Option<Arc<Environment>>,
}

impl Environment {
    /// Create a root (global) environment
    pub fn root() -> Arc<Environment> {
        Arc::new(Environment { values: Mutex::new(FxHashMap::default()), parent: None })
    }

    /// Create a child frame
    pub fn child(parent: &Arc<Environment>) -> Arc<Environment> {
        Arc::new(Environment {
            values: Mutex::new(FxHashMap::default()),
            parent: Some(parent.clone()),
        })
    }

    /// Define or overwrite a name in this frame
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.values.lock().insert(name.into(), value);
    }

    /// Read a name from this frame only
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.lock().get(name).cloned()
    }

    /// Read a name at a fixed ancestor depth
    pub fn get_at(self: &Arc<Environment>, depth: usize, name: &str) -> Option<Value> {
        let mut env = self.clone();
        for _ in 0..depth {
            env = env.parent.clone()?;
        }
        let value = env.values.lock().get(name).cloned();
        value
    }
}

enum Flow {
    Normal,
    Return(Value),
}

/// Tree-walking call evaluator
pub struct Interpreter {
    globals: Arc<Environment>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an evaluator with an empty global environment
    pub fn new() -> Interpreter {
        Interpreter { globals: Environment::root() }
    }

    /// The global environment
    pub fn globals(&self) -> &Arc<Environment> {
        &self.globals
    }

    /// Define a global binding
    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.globals.define(name, value);
    }

    /// Read a global binding
    pub fn lookup_global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Invoke a callable value with an optional receiver
    pub fn call(&self, callee: &Value, this: Option<Value>, args: Vec<Value>) -> RuntimeResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, this, args),
            Value::Class(class) => {
                let instance = Value::Instance(Instance::new(class.clone()));
                if let Some(init) = class.find_method("init") {
                    self.call_function(&init, Some(instance), args)
                } else if !args.is_empty() {
                    Err(RuntimeError::Arity { expected: 0, got: args.len() })
                } else {
                    Ok(instance)
                }
            }
            other => Err(RuntimeError::NotCallable(other.type_name().to_string())),
        }
    }

    fn call_function(
        &self,
        function: &Arc<Function>,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        match &function.kind {
            FunctionKind::Native { arity, variadic, f } => {
                let ok = if *variadic { args.len() >= *arity } else { args.len() == *arity };
                if !ok {
                    return Err(RuntimeError::Arity { expected: *arity, got: args.len() });
                }
                f(args)
            }
            FunctionKind::Declared { decl, bindings } => {
                if args.len() != decl.params.len() {
                    return Err(RuntimeError::Arity { expected: decl.params.len(), got: args.len() });
                }
                let env = Environment::child(&self.globals);
                for (param, arg) in decl.params.iter().zip(args) {
                    env.define(param.clone(), arg);
                }
                if let Some(receiver) = &this {
                    env.define("this", receiver.clone());
                }
                let flow = self.exec_block(&decl.body, &env, bindings)?;
                let result = match flow {
                    Flow::Return(value) => value,
                    Flow::Normal => Value::Nil,
                };
                if decl.is_initializer {
                    if let Some(receiver) = this {
                        return Ok(receiver);
                    }
                }
                Ok(result)
            }
        }
    }

    fn exec_block(
        &self,
        stmts: &[Stmt],
        env: &Arc<Environment>,
        bindings: &Bindings,
    ) -> RuntimeResult<Flow> {
        for stmt in stmts {
            match stmt {
                Stmt::Expression(expr) => {
                    self.eval_expr(expr, env, bindings)?;
                }
                Stmt::Return(expr) => {
                    let value = match expr {
                        Some(expr) => self.eval_expr(expr, env, bindings)?,
                        None => Value::Nil,
                    };
                    return Ok(Flow::Return(value));
                }
                Stmt::Function(decl) => {
                    let function = Function::declared(decl.clone(), resolve::resolve_function(decl));
                    env.define(decl.name.clone(), Value::Function(function));
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_expr(
        &self,
        expr: &Expr,
        env: &Arc<Environment>,
        bindings: &Bindings,
    ) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Nil => Value::Nil,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::str(s),
                Literal::Member(member) => Value::Member(member.clone()),
            }),
            Expr::Variable { id, name } => self.lookup(env, bindings, *id, name),
            Expr::This { id } => self.lookup(env, bindings, *id, "this"),
            Expr::Call { callee, args, .. } => {
                let callee = self.eval_expr(callee, env, bindings)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg, env, bindings)?);
                }
                self.call(&callee, None, arg_values)
            }
        }
    }

    fn lookup(
        &self,
        env: &Arc<Environment>,
        bindings: &Bindings,
        id: crate::ast::ExprId,
        name: &str,
    ) -> RuntimeResult<Value> {
        let found = match bindings.get(&id) {
            Some(&depth) => env.get_at(depth, name),
            None => self.globals.get(name),
        };
        found.ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionDecl;
    use crate::value::{Class, ClassOrigin};

    #[test]
    fn native_calls_check_arity() {
        let interp = Interpreter::new();
        let f = Function::native("one", 1, |mut args| Ok(args.remove(0)));
        let err = interp.call(&Value::Function(f), None, vec![]).unwrap_err();
        assert!(matches!(err, RuntimeError::Arity { expected: 1, got: 0 }));
    }

    #[test]
    fn declared_function_reads_parameters_and_globals() {
        let interp = Interpreter::new();
        interp.define_global("twice", Value::Function(Function::native("twice", 1, |args| {
            match args[0] {
                Value::Number(n) => Ok(Value::Number(n * 2.0)),
                _ => Err(RuntimeError::NotCallable("bad arg".to_string())),
            }
        })));

        let body = vec![Stmt::Return(Some(Expr::call(
            Expr::variable("twice"),
            vec![Expr::variable("x")],
        )))];
        let decl = Arc::new(FunctionDecl {
            name: "double".to_string(),
            params: vec!["x".to_string()],
            body,
            is_initializer: false,
        });
        let bindings = resolve::resolve_function(&decl);
        let f = Function::declared(decl, bindings);

        let result = interp.call(&Value::Function(f), None, vec![Value::Number(21.0)]).unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[test]
    fn class_call_without_init_rejects_arguments() {
        let interp = Interpreter::new();
        let class = Arc::new(Class {
            name: "Bag".to_string(),
            parent: None,
            methods: FxHashMap::default(),
            origin: ClassOrigin::Script,
        });
        let ok = interp.call(&Value::Class(class.clone()), None, vec![]).unwrap();
        assert!(matches!(ok, Value::Instance(_)));
        let err = interp.call(&Value::Class(class), None, vec![Value::Nil]).unwrap_err();
        assert!(matches!(err, RuntimeError::Arity { .. }));
    }
}
