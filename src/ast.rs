// ABOUTME: Expression and pattern trees, capture analysis, and unparsing

use crate::lexer::is_op_char;
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Dec(Decimal),
    Str(String),
    Symbol(String),
    /// Ordered key/value sequence; duplicate keys overwrite at runtime.
    Table(Vec<(String, Expr)>),
    App {
        fun: Box<Expr>,
        arg: Box<Expr>,
    },
    Cond {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Lam(Rc<Lambda>),
}

/// A lambda parameter: a plain name, or a duck-typed destructuring
/// table binding each extracted key against a sub-pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Single(String),
    Table(Vec<(String, Pattern)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub param: Pattern,
    pub body: Expr,
    /// Free names of `body` minus the names bound by `param`, in
    /// first-occurrence order. Read by the reflective pretty-printer.
    pub captured: Vec<String>,
}

impl Expr {
    pub fn app(fun: Expr, arg: Expr) -> Expr {
        Expr::App {
            fun: Box::new(fun),
            arg: Box::new(arg),
        }
    }

    pub fn name(text: &str) -> Expr {
        Expr::Name(text.to_string())
    }

    pub fn lam(param: Pattern, body: Expr) -> Expr {
        Expr::Lam(Rc::new(Lambda::new(param, body)))
    }
}

impl Lambda {
    pub fn new(param: Pattern, body: Expr) -> Lambda {
        let mut free = Vec::new();
        free_names(&body, &mut free);
        let bound = param.bound_names();
        free.retain(|name| !bound.contains(name));
        Lambda {
            param,
            body,
            captured: free,
        }
    }
}

impl Pattern {
    /// Names this pattern introduces. Table keys are extraction keys,
    /// not bindings; only the leaf patterns bind.
    pub fn bound_names(&self) -> Vec<String> {
        match self {
            Pattern::Single(name) => vec![name.clone()],
            Pattern::Table(entries) => entries
                .iter()
                .flat_map(|(_, sub)| sub.bound_names())
                .collect(),
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}

/// Free names of `expr` in first-occurrence order. Nested lambdas are
/// opaque: their already-computed capture list stands in for their body.
fn free_names(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Name(name) => push_unique(out, name),
        Expr::Dec(_) | Expr::Str(_) | Expr::Symbol(_) => {}
        Expr::Table(entries) => {
            for (_, value) in entries {
                free_names(value, out);
            }
        }
        Expr::App { fun, arg } => {
            free_names(fun, out);
            free_names(arg, out);
        }
        Expr::Cond {
            test,
            then,
            otherwise,
        } => {
            free_names(test, out);
            free_names(then, out);
            free_names(otherwise, out);
        }
        Expr::Lam(lambda) => {
            for name in &lambda.captured {
                push_unique(out, name);
            }
        }
    }
}

/// True for names made purely of operator characters, which need
/// parentheses to appear outside infix position.
pub fn is_op_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_op_char)
}

pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Re-synthesise surface syntax for an expression.
///
/// Purely syntactic: nested lambda chains collapse to `a b c. body`,
/// the synthetic `_. _ op e` shape prints as the left section
/// `(op e)`, and operator applications print as parenthesised infix.
pub fn unparse(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) if is_op_name(name) => format!("({})", name),
        Expr::Name(name) => name.clone(),
        Expr::Dec(d) => d.to_string(),
        Expr::Str(s) => format!("\"{}\"", escape_string(s)),
        Expr::Symbol(s) => format!(":{}", s),
        Expr::Table(entries) => unparse_table(entries),
        Expr::App { fun, arg } => {
            if let Some((op, left, right)) = as_infix(expr) {
                return format!("({} {} {})", operand(left), op, operand(right));
            }
            format!("{} {}", fun_position(fun), atom(arg))
        }
        Expr::Cond {
            test,
            then,
            otherwise,
        } => format!(
            "if {} then {} else {}",
            unparse(test),
            unparse(then),
            unparse(otherwise)
        ),
        Expr::Lam(lambda) => {
            if let Some(rendered) = as_section(lambda) {
                return rendered;
            }
            let mut params = vec![unparse_pattern(&lambda.param)];
            let mut body = &lambda.body;
            while let Expr::Lam(inner) = body {
                if as_section(inner).is_some() {
                    break;
                }
                params.push(unparse_pattern(&inner.param));
                body = &inner.body;
            }
            format!("{}. {}", params.join(" "), unparse(body))
        }
    }
}

fn unparse_table(entries: &[(String, Expr)]) -> String {
    let mut out = String::from("{");
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}: {}", key, unparse(value));
    }
    out.push('}');
    out
}

pub fn unparse_pattern(pattern: &Pattern) -> String {
    match pattern {
        Pattern::Single(name) => name.clone(),
        Pattern::Table(entries) => {
            let mut out = String::from("{");
            for (i, (key, sub)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match sub {
                    Pattern::Single(name) if name == key => {
                        let _ = write!(out, "{}", key);
                    }
                    _ => {
                        let _ = write!(out, "{}: {}", key, unparse_pattern(sub));
                    }
                }
            }
            out.push('}');
            out
        }
    }
}

/// `App(App(Name(op), l), r)` with an operator-charset name.
fn as_infix(expr: &Expr) -> Option<(&str, &Expr, &Expr)> {
    if let Expr::App { fun, arg: right } = expr {
        if let Expr::App { fun: op, arg: left } = fun.as_ref() {
            if let Expr::Name(name) = op.as_ref() {
                if is_op_name(name) {
                    return Some((name, left, right));
                }
            }
        }
    }
    None
}

/// The synthetic left-section shape `_. _ op e` (or `_. _ `f` e`).
fn as_section(lambda: &Lambda) -> Option<String> {
    if lambda.param != Pattern::Single("_".to_string()) {
        return None;
    }
    if let Expr::App { fun, arg } = &lambda.body {
        if let Expr::App {
            fun: op,
            arg: binder,
        } = fun.as_ref()
        {
            if **binder == Expr::Name("_".to_string()) {
                return match op.as_ref() {
                    Expr::Name(name) if is_op_name(name) => {
                        Some(format!("({} {})", name, atom(arg)))
                    }
                    quoted => Some(format!("(`{}` {})", unparse(quoted), atom(arg))),
                };
            }
        }
    }
    None
}

/// Render for infix-operand position: anything that would swallow the
/// operator gets parentheses.
fn operand(expr: &Expr) -> String {
    match expr {
        Expr::Lam(lambda) if as_section(lambda).is_none() => format!("({})", unparse(expr)),
        Expr::Cond { .. } => format!("({})", unparse(expr)),
        _ => unparse(expr),
    }
}

/// Render for function position: applications chain without parens
/// (infix ones come back already parenthesised), everything else
/// non-atomic gets them.
fn fun_position(expr: &Expr) -> String {
    match expr {
        Expr::App { .. }
        | Expr::Name(_)
        | Expr::Dec(_)
        | Expr::Str(_)
        | Expr::Symbol(_)
        | Expr::Table(_) => unparse(expr),
        _ => format!("({})", unparse(expr)),
    }
}

/// Render for argument position: must reparse as a single atomic.
fn atom(expr: &Expr) -> String {
    match expr {
        Expr::Name(_) | Expr::Dec(_) | Expr::Str(_) | Expr::Symbol(_) | Expr::Table(_) => {
            unparse(expr)
        }
        Expr::Lam(lambda) if as_section(lambda).is_some() => unparse(expr),
        Expr::App { .. } if as_infix(expr).is_some() => unparse(expr),
        _ => format!("({})", unparse(expr)),
    }
}
