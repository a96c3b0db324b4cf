//! Tiny expression language for declarative strategies.
//!
//! Predicates: `"<field> <op> <literal>"` with op in `== != < <= > >=`.
//! Arithmetic: `"<field> <op> <literal>"` with op in `+ - * / %`.
//! `<field>` is `value` or `key`; literals are integers, floats, `true`,
//! `false`, `null`, or strings (optionally quoted).

use std::cmp::Ordering;

use lazypipe_core::Value;

use crate::traits::OpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Value,
    Key,
}

impl Field {
    fn parse(s: &str) -> Result<Self, OpError> {
        match s.trim() {
            "value" | "v" => Ok(Field::Value),
            "key" | "k" => Ok(Field::Key),
            other => Err(OpError::Config(format!(
                "unknown field '{other}' (expected 'value' or 'key')"
            ))),
        }
    }

    pub fn pick<'a>(&self, value: &'a Value, key: &'a Value) -> &'a Value {
        match self {
            Field::Value => value,
            Field::Key => key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: Field,
    pub op: CmpOp,
    pub literal: Value,
}

impl Predicate {
    /// Parse a predicate like `"value > 18"` or `"key == alice"`.
    pub fn parse(expr: &str) -> Result<Self, OpError> {
        const OPS: [(&str, CmpOp); 6] = [
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            ("<=", CmpOp::Le),
            (">=", CmpOp::Ge),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
        ];

        for (token, op) in OPS {
            if let Some(pos) = expr.find(token) {
                let field = Field::parse(&expr[..pos])?;
                let literal = parse_literal(&expr[pos + token.len()..]);
                return Ok(Self { field, op, literal });
            }
        }

        Err(OpError::Config(format!("unparseable predicate: {expr}")))
    }

    /// Values of different kinds never compare equal; ordering across kinds
    /// follows `Value`'s total order.
    pub fn eval(&self, value: &Value, key: &Value) -> bool {
        let subject = self.field.pick(value, key);
        if subject.is_null() && !self.literal.is_null() {
            return self.op == CmpOp::Ne;
        }
        self.op.holds(subject.total_cmp(&self.literal))
    }

    pub fn looks_like(expr: &str) -> bool {
        ["==", "!=", "<", ">"].iter().any(|op| expr.contains(op))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arith {
    pub field: Field,
    pub op: ArithOp,
    pub literal: Value,
}

impl Arith {
    /// Parse `"value * 2"`, `"key + 1"`, ...
    pub fn parse(expr: &str) -> Result<Self, OpError> {
        const OPS: [(char, ArithOp); 5] = [
            ('+', ArithOp::Add),
            ('*', ArithOp::Mul),
            ('/', ArithOp::Div),
            ('%', ArithOp::Rem),
            ('-', ArithOp::Sub),
        ];

        for (token, op) in OPS {
            // Skip a leading sign so "value - -3" splits on the first operator.
            if let Some(pos) = expr.char_indices().skip(1).find(|(_, c)| *c == token).map(|(i, _)| i) {
                let field = Field::parse(&expr[..pos])?;
                let literal = parse_literal(&expr[pos + 1..]);
                if literal.as_f64().is_none() {
                    return Err(OpError::Config(format!(
                        "arithmetic needs a numeric literal: {expr}"
                    )));
                }
                return Ok(Self { field, op, literal });
            }
        }

        Err(OpError::Config(format!("unparseable arithmetic: {expr}")))
    }

    pub fn looks_like(expr: &str) -> bool {
        let mut parts = expr.split_whitespace();
        matches!(
            (parts.next(), parts.next()),
            (Some("value" | "key" | "v" | "k"), Some("+" | "-" | "*" | "/" | "%"))
        )
    }

    /// Non-numeric subjects, division by zero and overflow give `Null`.
    pub fn eval(&self, value: &Value, key: &Value) -> Value {
        apply_arith(self.field.pick(value, key), self.op, &self.literal)
    }
}

pub fn apply_arith(lhs: &Value, op: ArithOp, rhs: &Value) -> Value {
    match (lhs, rhs) {
        (Value::I64(a), Value::I64(b)) => {
            let out = match op {
                ArithOp::Add => a.checked_add(*b),
                ArithOp::Sub => a.checked_sub(*b),
                ArithOp::Mul => a.checked_mul(*b),
                ArithOp::Div => a.checked_div(*b),
                ArithOp::Rem => a.checked_rem(*b),
            };
            out.map_or(Value::Null, Value::I64)
        }
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => {
                let out = match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div if b == 0.0 => return Value::Null,
                    ArithOp::Div => a / b,
                    ArithOp::Rem if b == 0.0 => return Value::Null,
                    ArithOp::Rem => a % b,
                };
                Value::F64(out)
            }
            _ => Value::Null,
        },
    }
}

/// Parse a literal: integer, float, bool, null, or (optionally quoted) string.
pub fn parse_literal(raw: &str) -> Value {
    let s = raw.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Value::I64(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::F64(f);
    }
    match s {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    let unquoted = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))
        .unwrap_or(s);
    Value::Str(unquoted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_evaluates_predicates() {
        let p = Predicate::parse("value >= 3").unwrap();
        assert!(p.eval(&Value::I64(3), &Value::Null));
        assert!(p.eval(&Value::F64(3.5), &Value::Null));
        assert!(!p.eval(&Value::I64(2), &Value::Null));

        let p = Predicate::parse("key == 'alice'").unwrap();
        assert!(p.eval(&Value::Null, &Value::from("alice")));
        assert!(!p.eval(&Value::Null, &Value::from("bob")));
    }

    #[test]
    fn null_only_satisfies_not_equal() {
        let p = Predicate::parse("value < 10").unwrap();
        assert!(!p.eval(&Value::Null, &Value::Null));
        let p = Predicate::parse("value != 10").unwrap();
        assert!(p.eval(&Value::Null, &Value::Null));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Predicate::parse("value ~ 3").is_err());
        assert!(Predicate::parse("row > 3").is_err());
        assert!(Arith::parse("value * x").is_err());
    }

    #[test]
    fn arithmetic_handles_ints_floats_and_zero() {
        let double = Arith::parse("value * 2").unwrap();
        assert_eq!(double.eval(&Value::I64(4), &Value::Null), Value::I64(8));
        assert_eq!(double.eval(&Value::F64(1.5), &Value::Null), Value::F64(3.0));
        assert_eq!(double.eval(&Value::from("x"), &Value::Null), Value::Null);

        let halve = Arith::parse("value / 0").unwrap();
        assert_eq!(halve.eval(&Value::I64(4), &Value::Null), Value::Null);

        let shift = Arith::parse("key - -3").unwrap();
        assert_eq!(shift.eval(&Value::Null, &Value::I64(1)), Value::I64(4));
    }

    #[test]
    fn literals() {
        assert_eq!(parse_literal(" 42 "), Value::I64(42));
        assert_eq!(parse_literal("2.5"), Value::F64(2.5));
        assert_eq!(parse_literal("true"), Value::Bool(true));
        assert_eq!(parse_literal("\"a b\""), Value::from("a b"));
        assert_eq!(parse_literal("plain"), Value::from("plain"));
    }
}
