// ABOUTME: Shunting-yard resolution of flat operator lists into application trees

use crate::ast::Expr;
use crate::parser::{Assoc, ParseOptions, Priority};

/// An infix operator as collected by the expression parser, before
/// precedence resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// A plain operator token, resolved by name at application time.
    Infix(String),
    /// A backtick-quoted expression used in operator position.
    Quoted(Expr),
}

/// The flat `initial, op0, e1, op1, e2, …` stream.
#[derive(Debug, Clone, PartialEq)]
pub struct OpList {
    pub initial: Expr,
    pub chunks: Vec<(OpKind, Expr)>,
}

fn priority_of(op: &OpKind, options: &ParseOptions) -> Priority {
    match op {
        OpKind::Infix(name) => options
            .priorities
            .get(name)
            .copied()
            .unwrap_or(options.default_priority),
        OpKind::Quoted(_) => options.backtick_priority,
    }
}

fn reduce(operands: &mut Vec<Expr>, op: OpKind) {
    let right = operands.pop().expect("operand stack holds a right operand");
    let left = operands.pop().expect("operand stack holds a left operand");
    let fun = match op {
        OpKind::Infix(name) => Expr::Name(name),
        OpKind::Quoted(expr) => expr,
    };
    operands.push(Expr::app(Expr::app(fun, left), right));
}

/// Resolves the operator list into a binary application tree under the
/// priorities in `options`. The stacks hold one more operand than
/// operators throughout, so exactly one operand remains at the end.
pub fn resolve(list: OpList, options: &ParseOptions) -> Expr {
    let mut operands = vec![list.initial];
    let mut operators: Vec<OpKind> = Vec::new();

    for (op, operand) in list.chunks {
        let current = priority_of(&op, options);
        while let Some(top) = operators.last() {
            let above = priority_of(top, options);
            let top_beats = current.strength < above.strength
                || (current.strength == above.strength && current.assoc == Assoc::Left);
            if !top_beats {
                break;
            }
            let popped = operators.pop().expect("just observed a top operator");
            reduce(&mut operands, popped);
        }
        operators.push(op);
        operands.push(operand);
    }

    while let Some(op) = operators.pop() {
        reduce(&mut operands, op);
    }
    operands.pop().expect("one operand remains by construction")
}
