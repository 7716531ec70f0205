use crate::ast::Expr;

/// Converts an expression to the Crafting‑Interpreters prefix form, e.g.
/// `(* (- 123.0) (group 45.67))`.  Debugging aid only.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => lit.to_string(),

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => Self::parenthesize("group", &[&**inner]),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => Self::parenthesize(&operator.lexeme, &[&**right]),

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => Self::parenthesize(&operator.lexeme, &[&**left, &**right]),

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }

    fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
        let mut s = format!("({}", name);
        for expr in exprs {
            s.push(' ');
            s.push_str(&Self::print(expr));
        }
        s.push(')');
        s
    }
}
