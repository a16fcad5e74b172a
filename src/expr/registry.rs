// SPDX-License-Identifier: MIT

//! Function, operator and constant tables consulted by the compiler
//!
//! A `Registry` is built once (usually through [`Registry::builtin`]) and is
//! read-only while expressions are compiled against it. Compiled
//! expressions hold `Arc`s to the signatures they call, so they stay valid
//! even if the registry is dropped afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::builtins;
use super::evaluator::EvalError;

/// Value produced by a native callable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Output {
    Number(f64),
    Bool(bool),
}

impl Output {
    /// Booleans become `1.0` / `0.0`
    pub fn to_number(self) -> f64 {
        match self {
            Output::Number(n) => n,
            Output::Bool(true) => 1.0,
            Output::Bool(false) => 0.0,
        }
    }
}

impl From<f64> for Output {
    fn from(value: f64) -> Self {
        Output::Number(value)
    }
}

impl From<bool> for Output {
    fn from(value: bool) -> Self {
        Output::Bool(value)
    }
}

/// Arguments handed to a native callable.
///
/// `fixed` always holds exactly `arity` values. `rest` holds the trailing
/// variadic group and is empty for non-variadic functions.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    pub fixed: &'a [f64],
    pub rest: &'a [f64],
}

impl Args<'_> {
    pub fn get(&self, index: usize) -> f64 {
        self.fixed[index]
    }

    /// Fixed and variadic arguments, in call order
    pub fn all(&self) -> impl Iterator<Item = f64> + '_ {
        self.fixed.iter().chain(self.rest.iter()).copied()
    }
}

pub type NativeFn = Arc<dyn Fn(Args<'_>) -> Result<Output, EvalError> + Send + Sync>;

/// A callable known to the compiler
#[derive(Clone)]
pub struct FunctionSignature {
    name: String,
    arity: usize,
    variadic: bool,
    call: NativeFn,
}

impl FunctionSignature {
    /// Function taking exactly `arity` arguments
    pub fn new<F>(name: impl Into<String>, arity: usize, call: F) -> Self
    where
        F: Fn(Args<'_>) -> Result<Output, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            variadic: false,
            call: Arc::new(call),
        }
    }

    /// Function taking `arity` fixed arguments followed by any number of extra ones
    pub fn variadic<F>(name: impl Into<String>, arity: usize, call: F) -> Self
    where
        F: Fn(Args<'_>) -> Result<Output, EvalError> + Send + Sync + 'static,
    {
        Self {
            variadic: true,
            ..Self::new(name, arity, call)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Whether a call with `count` arguments is valid
    pub fn accepts(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.arity
        } else {
            count == self.arity
        }
    }

    /// "2" or "at least 1"
    pub fn arity_description(&self) -> String {
        if self.variadic {
            format!("at least {}", self.arity)
        } else {
            self.arity.to_string()
        }
    }

    pub fn invoke(&self, args: Args<'_>) -> Result<Output, EvalError> {
        (self.call)(args)
    }
}

impl fmt::Debug for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSignature")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

// Callables are not comparable; two signatures are equal when they describe
// the same name and shape.
impl PartialEq for FunctionSignature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity && self.variadic == other.variadic
    }
}

/// An operator bound to the function that implements it
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorSignature {
    symbol: String,
    precedence: u8,
    function: Arc<FunctionSignature>,
}

impl OperatorSignature {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Lower binds tighter
    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    pub fn function(&self) -> &Arc<FunctionSignature> {
        &self.function
    }

    pub fn is_prefix(&self) -> bool {
        self.function.arity() == 1
    }
}

/// Errors raised while registering operators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("operator '{symbol}' must take 1 or 2 operands, not {arity}")]
    InvalidOperatorArity { symbol: String, arity: usize },

    #[error("operator '{0}' may not be empty or contain letters, digits, whitespace or any of `$(),._`")]
    InvalidOperatorSymbol(String),

    #[error("operator '{0}' may not be variadic")]
    VariadicOperator(String),
}

/// Named functions, infix/prefix operators and named constants
#[derive(Debug, Clone, Default)]
pub struct Registry {
    functions: HashMap<String, Arc<FunctionSignature>>,
    operators: HashMap<String, Arc<OperatorSignature>>,
    constants: HashMap<String, f64>,
}

impl Registry {
    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the standard functions, operators and constants
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        builtins::install(&mut registry);
        registry
    }

    /// Register a function, returning the one it replaced
    pub fn register_function(
        &mut self,
        signature: FunctionSignature,
    ) -> Option<Arc<FunctionSignature>> {
        self.functions
            .insert(signature.name().to_string(), Arc::new(signature))
    }

    /// Register an operator. Lower `precedence` binds tighter.
    pub fn register_operator(
        &mut self,
        symbol: &str,
        precedence: u8,
        function: FunctionSignature,
    ) -> Result<(), RegistryError> {
        if symbol.is_empty() || !symbol.chars().all(is_operator_char) {
            return Err(RegistryError::InvalidOperatorSymbol(symbol.to_string()));
        }
        if function.is_variadic() {
            return Err(RegistryError::VariadicOperator(symbol.to_string()));
        }
        if !matches!(function.arity(), 1 | 2) {
            return Err(RegistryError::InvalidOperatorArity {
                symbol: symbol.to_string(),
                arity: function.arity(),
            });
        }
        self.insert_operator(symbol, precedence, function);
        Ok(())
    }

    pub(crate) fn insert_operator(&mut self, symbol: &str, precedence: u8, function: FunctionSignature) {
        self.operators.insert(
            symbol.to_string(),
            Arc::new(OperatorSignature {
                symbol: symbol.to_string(),
                precedence,
                function: Arc::new(function),
            }),
        );
    }

    pub fn register_constant(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.constants.insert(name.into(), value)
    }

    pub fn lookup_function(&self, name: &str) -> Option<Arc<FunctionSignature>> {
        self.functions.get(name).cloned()
    }

    pub fn lookup_operator(&self, symbol: &str) -> Option<Arc<OperatorSignature>> {
        self.operators.get(symbol).cloned()
    }

    /// Every operator whose symbol starts with `prefix`
    pub fn lookup_operator_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a OperatorSignature> + 'a {
        self.operators
            .iter()
            .filter(move |(symbol, _)| symbol.starts_with(prefix))
            .map(|(_, op)| op.as_ref())
    }

    pub fn has_operator_prefix(&self, prefix: &str) -> bool {
        self.lookup_operator_prefix(prefix).next().is_some()
    }

    pub fn lookup_constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }
}

fn is_operator_char(c: char) -> bool {
    !(c.is_alphanumeric() || c.is_whitespace() || matches!(c, '$' | '(' | ')' | ',' | '.' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add() -> FunctionSignature {
        FunctionSignature::new("add", 2, |a| Ok((a.get(0) + a.get(1)).into()))
    }

    #[test]
    fn test_register_and_lookup_function() {
        let mut registry = Registry::empty();
        assert!(registry.register_function(add()).is_none());

        let found = registry.lookup_function("add").unwrap();
        assert_eq!(found.name(), "add");
        assert_eq!(found.arity(), 2);
        assert!(!found.is_variadic());
        assert!(registry.lookup_function("sub").is_none());
    }

    #[test]
    fn test_register_function_replaces_existing() {
        let mut registry = Registry::empty();
        registry.register_function(add());
        let previous = registry.register_function(FunctionSignature::new("add", 3, |_| Ok(0.0.into())));

        assert_eq!(previous.map(|p| p.arity()), Some(2));
        assert_eq!(registry.lookup_function("add").unwrap().arity(), 3);
    }

    #[test]
    fn test_accepts() {
        let fixed = add();
        assert!(fixed.accepts(2));
        assert!(!fixed.accepts(1));
        assert!(!fixed.accepts(3));

        let variadic = FunctionSignature::variadic("sum", 1, |a| Ok(a.all().sum::<f64>().into()));
        assert!(!variadic.accepts(0));
        assert!(variadic.accepts(1));
        assert!(variadic.accepts(7));
        assert_eq!(variadic.arity_description(), "at least 1");
        assert_eq!(fixed.arity_description(), "2");
    }

    #[test]
    fn test_operator_prefix_lookup() {
        let registry = Registry::builtin();

        let mut lt: Vec<&str> = registry.lookup_operator_prefix("<").map(|o| o.symbol()).collect();
        lt.sort_unstable();
        assert_eq!(lt, vec!["<", "<="]);

        assert!(registry.has_operator_prefix("&"));
        assert!(registry.lookup_operator("&").is_none());
        assert!(!registry.has_operator_prefix("^"));
    }

    #[test]
    fn test_register_operator_validation() {
        let mut registry = Registry::empty();

        assert_eq!(
            registry.register_operator("plus", 2, add()),
            Err(RegistryError::InvalidOperatorSymbol("plus".to_string()))
        );
        assert_eq!(
            registry.register_operator("", 2, add()),
            Err(RegistryError::InvalidOperatorSymbol(String::new()))
        );
        assert_eq!(
            registry.register_operator("+++", 2, FunctionSignature::new("f", 3, |_| Ok(0.0.into()))),
            Err(RegistryError::InvalidOperatorArity {
                symbol: "+++".to_string(),
                arity: 3
            })
        );
        assert!(registry.register_operator("<>", 4, add()).is_ok());

        let op = registry.lookup_operator("<>").unwrap();
        assert_eq!(op.precedence(), 4);
        assert!(!op.is_prefix());
    }

    #[test]
    fn test_constants() {
        let mut registry = Registry::empty();
        registry.register_constant("max_dashes", 2.0);
        assert_eq!(registry.lookup_constant("max_dashes"), Some(2.0));
        assert_eq!(registry.lookup_constant("min_dashes"), None);
    }

    #[test]
    fn test_output_to_number() {
        assert_eq!(Output::Bool(true).to_number(), 1.0);
        assert_eq!(Output::Bool(false).to_number(), 0.0);
        assert_eq!(Output::Number(-2.5).to_number(), -2.5);
    }
}
