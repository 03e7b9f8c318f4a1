// ABOUTME: Version info, REPL banner text, and front-end constants

pub const VERSION: &str = "0.3.0";
pub const WELCOME_MESSAGE: &str = "unitlang v0.3";
pub const WELCOME_SUBTITLE: &str =
    "A small functional language with tables, symbols, and dimensioned decimals";
pub const WELCOME_FOOTER: &str =
    "Type an expression, or 'quit' to leave. '#!prec OP N left|right' rebinds an operator.";

pub const PROMPT: &str = "> ";
pub const HISTORY_FILE: &str = ".unitlang_history";

pub const HELP_TEXT: &str = r#"
Surface syntax:
  x y. body                 functions (curried, one argument each)
  {k: v, shorthand}         tables; access with  tbl :k
  if c then a else b        conditionals
  :name .= value            bind a name in the current scope
  (+ 2)  (2 +)  (+)         operator sections
  a `f` b                   any expression as an infix operator
  meters 3 + meters 4       arithmetic carries SI dimensions

Modules: IO, Str, Sym, Refl, Imp — try  IO :__table__

REPL commands:
  quit | exit               leave the session
  #!prec OP N left|right    set operator priority, e.g.  #!prec + 9 right
"#;
