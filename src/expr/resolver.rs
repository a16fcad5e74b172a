// SPDX-License-Identifier: MIT

//! Grouping and precedence resolution
//!
//! Tokens are consumed left to right and appended to a flat postfix
//! instruction vector. Every parenthesis or argument list opens a frame;
//! binary operators wait on their frame's operator stack until an operator
//! that binds no tighter, a `,`, a `)` or the end of input flushes them.
//! Operators never cross a frame boundary. Prefix operators are emitted
//! right after the operand they apply to.
//!
//! Unknown names and bad argument counts are collected and reported
//! together; syntax errors stop compilation at once.

use std::sync::Arc;

use super::diagnostics::{Diagnostic, Diagnostics, SyntaxError, SyntaxErrorKind};
use super::instruction::{Expression, Instruction};
use super::lexer::{Lexer, Spanned, SymbolKind, Token};
use super::registry::{FunctionSignature, OperatorSignature, Registry};
use crate::store::VariableStore;

/// Compile `source` against `registry`.
///
/// Every `$variable$` the source mentions is declared in `store` (with the
/// value `0`) if it is not there yet, even when compilation then fails.
/// A sigil symbol naming a registered constant reads the constant instead.
pub fn compile(
    source: &str,
    registry: &Registry,
    store: &mut VariableStore,
) -> Result<Expression, Diagnostics> {
    let mut resolver = Resolver::new(source, registry, store);
    if let Err(error) = resolver.run() {
        log::debug!("syntax error in `{}`: {}", source, error);
        return Err(Diagnostics::syntax(source, error));
    }

    if !resolver.problems.is_empty() {
        log::debug!(
            "`{}` has {} semantic problem(s)",
            source,
            resolver.problems.len()
        );
        return Err(Diagnostics::semantic(source, resolver.problems));
    }

    log::debug!(
        "compiled `{}` into {} instruction(s)",
        source,
        resolver.output.len()
    );
    Ok(Expression::new(source, resolver.output))
}

/// A function call whose argument list is open
struct PendingCall {
    name: String,
    index: usize,
    signature: Option<Arc<FunctionSignature>>,
    /// Number of `,` seen so far
    commas: usize,
}

enum FrameKind {
    Root,
    Group,
    Call(PendingCall),
}

/// One open grouping
struct Frame {
    kind: FrameKind,
    /// Character index of the opening `(`
    index: usize,
    /// First output instruction belonging to this grouping
    start: usize,
    operators: Vec<Arc<OperatorSignature>>,
    prefixes: Vec<Arc<OperatorSignature>>,
    expect_operand: bool,
}

impl Frame {
    fn new(kind: FrameKind, index: usize, start: usize) -> Self {
        Self {
            kind,
            index,
            start,
            operators: Vec::new(),
            prefixes: Vec::new(),
            expect_operand: true,
        }
    }

    fn require_operand(&self, index: usize) -> Result<(), SyntaxError> {
        if self.expect_operand {
            Ok(())
        } else {
            Err(SyntaxError::new(index, SyntaxErrorKind::UnexpectedOperand))
        }
    }

    /// Nothing at all has been written inside this grouping yet
    fn is_empty(&self, output_len: usize) -> bool {
        output_len == self.start
            && self.prefixes.is_empty()
            && self.operators.is_empty()
            && !matches!(&self.kind, FrameKind::Call(call) if call.commas > 0)
    }
}

struct Resolver<'a> {
    source: &'a str,
    registry: &'a Registry,
    store: &'a mut VariableStore,
    lexer: Lexer<'a>,
    output: Vec<Instruction>,
    frames: Vec<Frame>,
    problems: Vec<Diagnostic>,
    /// Function name seen, waiting for its `(`
    pending_call: Option<PendingCall>,
}

impl<'a> Resolver<'a> {
    fn new(source: &'a str, registry: &'a Registry, store: &'a mut VariableStore) -> Self {
        Self {
            source,
            registry,
            store,
            lexer: Lexer::new(source, registry),
            output: Vec::new(),
            frames: vec![Frame::new(FrameKind::Root, 0, 0)],
            problems: Vec::new(),
            pending_call: None,
        }
    }

    fn frame(&mut self) -> &mut Frame {
        // The root frame is only popped at the end of input
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        loop {
            let expect_operand = self.pending_call.is_some() || self.frame().expect_operand;
            let Spanned { index, token } = self.lexer.next_token(expect_operand)?;

            if self.pending_call.is_some() && token != Token::LParen {
                // The lexer only classifies a name as a call when `(` follows
                return Err(SyntaxError::new(index, SyntaxErrorKind::UnexpectedOperand));
            }

            match token {
                Token::Literal(value) => {
                    self.frame().require_operand(index)?;
                    self.output.push(Instruction::Const(value));
                    self.finish_operand();
                }
                Token::Symbol { name, kind } => self.symbol(index, name, kind)?,
                Token::Operator(symbol) => self.operator(index, &symbol)?,
                Token::LParen => self.open(index)?,
                Token::Comma => self.comma(index)?,
                Token::RParen => self.close(index)?,
                Token::End => return self.end(index),
            }
        }
    }

    fn symbol(&mut self, index: usize, name: String, kind: SymbolKind) -> Result<(), SyntaxError> {
        self.frame().require_operand(index)?;

        match kind {
            SymbolKind::Variable => {
                // A registered constant wins over a same-named variable
                if let Some(value) = self.registry.lookup_constant(&name) {
                    self.output.push(Instruction::Const(value));
                    self.finish_operand();
                    return Ok(());
                }
                if self.store.declare(&name) {
                    log::debug!("declared variable '{}' while compiling `{}`", name, self.source);
                }
                self.output.push(Instruction::GetVar(name));
                self.finish_operand();
            }
            SymbolKind::Constant => {
                let value = match self.registry.lookup_constant(&name) {
                    Some(value) => value,
                    None => {
                        self.problems.push(Diagnostic::UnknownConstant { name, index });
                        // Placeholder keeps the operand shape intact
                        0.0
                    }
                };
                self.output.push(Instruction::Const(value));
                self.finish_operand();
            }
            SymbolKind::Function => {
                let signature = self.registry.lookup_function(&name);
                if signature.is_none() {
                    self.problems.push(Diagnostic::UnknownFunction {
                        name: name.clone(),
                        index,
                    });
                }
                self.pending_call = Some(PendingCall {
                    name,
                    index,
                    signature,
                    commas: 0,
                });
            }
        }
        Ok(())
    }

    fn operator(&mut self, index: usize, symbol: &str) -> Result<(), SyntaxError> {
        let Some(op) = self.registry.lookup_operator(symbol) else {
            return Err(SyntaxError::new(index, SyntaxErrorKind::UnknownOperator));
        };

        let frame = self.frame();
        if frame.expect_operand {
            if !op.is_prefix() {
                return Err(SyntaxError::new(index, SyntaxErrorKind::MissingOperand));
            }
            frame.prefixes.push(op);
            return Ok(());
        }
        if op.is_prefix() {
            return Err(SyntaxError::new(index, SyntaxErrorKind::MisplacedOperator));
        }

        // Anything queued that binds at least as tightly goes first
        while let Some(top) = self.frame().operators.pop() {
            if top.precedence() > op.precedence() {
                self.frame().operators.push(top);
                break;
            }
            self.output.push(Instruction::Call(Arc::clone(top.function()), 2));
        }

        let frame = self.frame();
        frame.operators.push(op);
        frame.expect_operand = true;
        Ok(())
    }

    fn open(&mut self, index: usize) -> Result<(), SyntaxError> {
        let kind = match self.pending_call.take() {
            Some(call) => FrameKind::Call(call),
            None => {
                self.frame().require_operand(index)?;
                FrameKind::Group
            }
        };
        let start = self.output.len();
        self.frames.push(Frame::new(kind, index, start));
        Ok(())
    }

    fn comma(&mut self, index: usize) -> Result<(), SyntaxError> {
        let frame = self.frame();
        if !matches!(frame.kind, FrameKind::Call(_)) {
            return Err(SyntaxError::new(index, SyntaxErrorKind::MisplacedComma));
        }
        if frame.expect_operand {
            return Err(SyntaxError::new(index, SyntaxErrorKind::MissingOperand));
        }

        self.flush_operators();
        let frame = self.frame();
        if let FrameKind::Call(call) = &mut frame.kind {
            call.commas += 1;
        }
        frame.expect_operand = true;
        Ok(())
    }

    fn close(&mut self, index: usize) -> Result<(), SyntaxError> {
        let output_len = self.output.len();
        let frame = self.frame();
        match frame.kind {
            FrameKind::Root => {
                return Err(SyntaxError::new(index, SyntaxErrorKind::UnmatchedClose));
            }
            FrameKind::Group if frame.is_empty(output_len) => {
                return Err(SyntaxError::new(frame.index, SyntaxErrorKind::EmptyGroup));
            }
            _ => {}
        }

        let empty = frame.is_empty(output_len);
        if frame.expect_operand && !empty {
            return Err(SyntaxError::new(index, SyntaxErrorKind::MissingOperand));
        }

        self.flush_operators();
        let Some(frame) = self.frames.pop() else {
            return Err(SyntaxError::new(index, SyntaxErrorKind::UnmatchedClose));
        };
        log::trace!(
            "closed grouping at {} spanning instructions {}..{}",
            frame.index,
            frame.start,
            self.output.len()
        );

        if let FrameKind::Call(call) = frame.kind {
            let count = if empty { 0 } else { call.commas + 1 };
            self.finish_call(call, count);
        }
        self.finish_operand();
        Ok(())
    }

    fn finish_call(&mut self, call: PendingCall, count: usize) {
        // Unknown functions were reported when the name was seen
        let Some(signature) = call.signature else {
            return;
        };
        if signature.accepts(count) {
            self.output.push(Instruction::Call(signature, count));
        } else {
            self.problems.push(Diagnostic::ArityMismatch {
                name: call.name,
                index: call.index,
                got: count,
                signature,
            });
        }
    }

    fn end(&mut self, index: usize) -> Result<(), SyntaxError> {
        if self.frames.len() > 1 {
            let innermost = self.frame().index;
            return Err(SyntaxError::new(innermost, SyntaxErrorKind::UnmatchedOpen));
        }

        let output_len = self.output.len();
        let frame = self.frame();
        if frame.expect_operand {
            let kind = if frame.is_empty(output_len) {
                SyntaxErrorKind::EmptyExpression
            } else {
                SyntaxErrorKind::MissingOperand
            };
            return Err(SyntaxError::new(index, kind));
        }

        self.flush_operators();
        Ok(())
    }

    /// An operand is complete in the current frame: apply its prefixes
    fn finish_operand(&mut self) {
        let frame = self.frame();
        let prefixes: Vec<_> = frame.prefixes.drain(..).rev().collect();
        frame.expect_operand = false;

        for op in prefixes {
            self.output.push(Instruction::Call(Arc::clone(op.function()), 1));
        }
    }

    /// Emit every queued binary operator of the current frame, tightest first
    fn flush_operators(&mut self) {
        while let Some(op) = self.frame().operators.pop() {
            self.output.push(Instruction::Call(Arc::clone(op.function()), 2));
        }
    }
}
