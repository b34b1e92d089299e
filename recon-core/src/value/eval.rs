//! Interpretation of selectors, operators and functions against a scope.

use std::cmp::Ordering;

use super::{BinaryOp, Field, Func, Item, Num, Operator, Record, Selector, UnaryOp, Value};

impl Value {
    /// Evaluate this value with `scope` as the current value.
    ///
    /// Selections yielding one value return it, several return a record of
    /// them, none return `Absent`. Anything without a meaning evaluates to
    /// `Absent`.
    pub fn evaluate(&self, scope: &Value) -> Value {
        match self {
            Value::Selector(selector) => {
                let mut selected = Vec::new();
                select(selector, scope, &mut selected);
                collect(selected)
            }
            Value::Operator(operator) => evaluate_operator(operator, scope),
            Value::Record(record) => {
                Value::Record(record.iter().map(|item| evaluate_item(item, scope)).collect())
            }
            value => value.clone(),
        }
    }
}

fn evaluate_item(item: &Item, scope: &Value) -> Item {
    match item {
        Item::Field(Field::Attr { key, value }) => Item::attr_with(key.clone(), value.evaluate(scope)),
        Item::Field(Field::Slot { key, value }) => Item::slot(key.clone(), value.evaluate(scope)),
        Item::Value(value) => Item::Value(value.evaluate(scope)),
    }
}

fn collect(mut selected: Vec<Value>) -> Value {
    match selected.len() {
        0 => Value::Absent,
        1 => selected.pop().unwrap_or_default(),
        _ => Value::Record(Record::of(selected)),
    }
}

fn select(selector: &Selector, current: &Value, out: &mut Vec<Value>) {
    match selector {
        Selector::Identity => {
            if current.is_defined() {
                out.push(current.clone());
            }
        }
        Selector::Literal { item, then } => {
            let value = item.evaluate(current);
            select(then, &value, out);
        }
        Selector::Get { key, then } => {
            let value = current.get(key);
            if value.is_defined() {
                select(then, value, out);
            }
        }
        Selector::GetAttr { key, then } => {
            let value = current.get_attr(key);
            if value.is_defined() {
                select(then, value, out);
            }
        }
        Selector::GetItem { index, then } => {
            let Value::Record(record) = current else { return };
            match record.get_item(*index) {
                Item::Value(Value::Absent) => {}
                Item::Value(value) => select(then, value, out),
                Item::Field(field) => select(then, &Value::Record(Record::of([field.clone()])), out),
            }
        }
        Selector::Keys { then } => {
            for field in fields(current) {
                select(then, &field.key_value(), out);
            }
        }
        Selector::Values { then } => {
            for field in fields(current) {
                select(then, field.value(), out);
            }
        }
        Selector::Children { then } => {
            if let Value::Record(record) = current {
                for item in record {
                    select(then, item.target(), out);
                }
            }
        }
        Selector::Descendants { then } => {
            let mut stack: Vec<&Value> = Vec::new();
            push_children(current, &mut stack);
            while let Some(value) = stack.pop() {
                select(then, value, out);
                push_children(value, &mut stack);
            }
        }
        Selector::Filter { predicate, then } => {
            if predicate.evaluate(current).is_truthy() {
                select(then, current, out);
            }
        }
    }
}

fn fields(value: &Value) -> impl Iterator<Item = &Field> {
    value.as_record().into_iter().flat_map(|record| record.iter().filter_map(Item::as_field))
}

/// Push the children of `value` so that they pop in order.
fn push_children<'a>(value: &'a Value, stack: &mut Vec<&'a Value>) {
    if let Value::Record(record) = value {
        stack.extend(record.iter().rev().map(Item::target));
    }
}

fn evaluate_operator(operator: &Operator, scope: &Value) -> Value {
    match operator {
        Operator::Binary { op: BinaryOp::Or, lhs, rhs } => {
            let lhs = lhs.evaluate(scope);
            if lhs.is_truthy() { lhs } else { rhs.evaluate(scope) }
        }
        Operator::Binary { op: BinaryOp::And, lhs, rhs } => {
            let lhs = lhs.evaluate(scope);
            if lhs.is_truthy() { rhs.evaluate(scope) } else { lhs }
        }
        Operator::Binary { op, lhs, rhs } => binary(*op, &lhs.evaluate(scope), &rhs.evaluate(scope)),
        Operator::Unary { op, operand } => unary(*op, &operand.evaluate(scope)),
        Operator::Conditional { cond, then, otherwise } => {
            if cond.evaluate(scope).is_truthy() {
                then.evaluate(scope)
            } else {
                otherwise.evaluate(scope)
            }
        }
        Operator::Invoke { func, args } => match func.evaluate(scope) {
            Value::Func(func) => apply(&func, &args.evaluate(scope), scope),
            _ => Value::Absent,
        },
    }
}

fn apply(func: &Func, args: &Value, scope: &Value) -> Value {
    match func {
        Func::Bridge { call, .. } => call(args),
        Func::Lambda { bindings, template } => {
            let mut frame = Record::new();
            bind(bindings, args, &mut frame);
            if let Value::Record(outer) = scope {
                for item in outer {
                    let _ = frame.push(item.clone());
                }
            }
            template.evaluate(&Value::Record(frame))
        }
    }
}

/// Bind parameter names to arguments: a single name takes the whole
/// argument value, a record of names binds positionally.
fn bind(bindings: &Value, args: &Value, frame: &mut Record) {
    match bindings {
        Value::Text(name) => {
            let _ = frame.push(Item::slot(name.as_str(), args.clone()));
        }
        Value::Record(names) => {
            let positional: Vec<&Value> = match args {
                Value::Record(args) => args.iter().map(Item::target).collect(),
                value => vec![value],
            };
            for (position, name) in names.iter().enumerate() {
                if let Some(name) = name.target().as_text() {
                    let arg = positional.get(position).map_or(Value::Absent, |v| (*v).clone());
                    let _ = frame.push(Item::slot(name, arg));
                }
            }
        }
        _ => {}
    }
}

enum Pair {
    Int(i64, i64),
    Uint(u64, u64),
    Float(f64, f64),
}

fn pair(a: Num, b: Num) -> Pair {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => Pair::Int(a, b),
        (Num::Uint(a), Num::Uint(b)) => Pair::Uint(a, b),
        (a, b) => Pair::Float(a.as_f64(), b.as_f64()),
    }
}

/// Integer arithmetic falling back to float on overflow.
fn arithmetic(
    a: Num,
    b: Num,
    int: fn(i64, i64) -> Option<i64>,
    uint: fn(u64, u64) -> Option<u64>,
    float: fn(f64, f64) -> f64,
) -> Value {
    let num = match pair(a, b) {
        Pair::Int(a, b) => int(a, b).map_or(Num::Float(float(a as f64, b as f64)), Num::Int),
        Pair::Uint(a, b) => uint(a, b).map_or(Num::Float(float(a as f64, b as f64)), Num::Uint),
        Pair::Float(a, b) => Num::Float(float(a, b)),
    };
    Value::Num(num)
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => match pair(*a, *b) {
            Pair::Int(a, b) => Some(a.cmp(&b)),
            Pair::Uint(a, b) => Some(a.cmp(&b)),
            Pair::Float(a, b) => a.partial_cmp(&b),
        },
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Data(a), Value::Data(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Num(_), Value::Num(_)) => compare(lhs, rhs) == Some(Ordering::Equal),
        _ => lhs == rhs,
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Eq => return Value::Bool(equal(lhs, rhs)),
        BinaryOp::Ne => return Value::Bool(!equal(lhs, rhs)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Gt => {
            return match compare(lhs, rhs) {
                Some(ordering) => Value::Bool(match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Ge => ordering.is_ge(),
                    _ => ordering.is_gt(),
                }),
                None => Value::Absent,
            };
        }
        _ => {}
    }
    match (lhs, rhs) {
        (Value::Text(a), Value::Text(b)) if op == BinaryOp::Plus => Value::Text(format!("{}{}", a, b)),
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::BitOr => Value::Bool(a | b),
            BinaryOp::BitXor => Value::Bool(a ^ b),
            BinaryOp::BitAnd => Value::Bool(a & b),
            _ => Value::Absent,
        },
        (Value::Num(a), Value::Num(b)) => numeric(op, *a, *b),
        _ => Value::Absent,
    }
}

fn numeric(op: BinaryOp, a: Num, b: Num) -> Value {
    match op {
        BinaryOp::Plus => arithmetic(a, b, i64::checked_add, u64::checked_add, |a, b| a + b),
        BinaryOp::Minus => arithmetic(a, b, i64::checked_sub, u64::checked_sub, |a, b| a - b),
        BinaryOp::Times => arithmetic(a, b, i64::checked_mul, u64::checked_mul, |a, b| a * b),
        BinaryOp::Divide | BinaryOp::Modulo => {
            let zero = match pair(a, b) {
                Pair::Int(_, b) => b == 0,
                Pair::Uint(_, b) => b == 0,
                Pair::Float(..) => false,
            };
            if zero {
                return Value::Absent;
            }
            if op == BinaryOp::Divide {
                arithmetic(a, b, i64::checked_div, u64::checked_div, |a, b| a / b)
            } else {
                arithmetic(a, b, i64::checked_rem, u64::checked_rem, |a, b| a % b)
            }
        }
        BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::BitAnd => {
            let f: fn(u64, u64) -> u64 = match op {
                BinaryOp::BitOr => |a, b| a | b,
                BinaryOp::BitXor => |a, b| a ^ b,
                _ => |a, b| a & b,
            };
            match pair(a, b) {
                Pair::Int(a, b) => Value::Num(Num::Int(f(a as u64, b as u64) as i64)),
                Pair::Uint(a, b) => Value::Num(Num::Uint(f(a, b))),
                Pair::Float(..) => Value::Absent,
            }
        }
        _ => Value::Absent,
    }
}

fn unary(op: UnaryOp, operand: &Value) -> Value {
    match (op, operand) {
        (UnaryOp::Not, value) => Value::Bool(!value.is_truthy()),
        (UnaryOp::BitNot, Value::Num(Num::Int(n))) => Value::Num(Num::Int(!n)),
        (UnaryOp::BitNot, Value::Num(Num::Uint(n))) => Value::Num(Num::Uint(!n)),
        (UnaryOp::Negative, Value::Num(Num::Int(n))) => {
            Value::Num(n.checked_neg().map_or(Num::Float(-(*n as f64)), Num::Int))
        }
        (UnaryOp::Negative, Value::Num(Num::Float(n))) => Value::Num(Num::Float(-n)),
        (UnaryOp::Positive, Value::Num(n)) => Value::Num(*n),
        _ => Value::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Value {
        Value::Record(Record::of([
            Item::attr("doc"),
            Item::slot("a", 1),
            Item::slot("b", Record::of([Item::slot("c", "deep"), Item::from(5)])),
            Item::slot("name", "recon"),
        ]))
    }

    #[test]
    fn test_get_chain() {
        let selector = Value::from(Selector::identity().get("b").get("c"));
        assert_eq!(selector.evaluate(&scope()), Value::from("deep"));
        let missing = Value::from(Selector::identity().get("zz"));
        assert_eq!(missing.evaluate(&scope()), Value::Absent);
    }

    #[test]
    fn test_identity_selects_scope() {
        assert_eq!(Value::from(Selector::identity()).evaluate(&Value::from(3)), Value::from(3));
    }

    #[test]
    fn test_keys_and_values() {
        let keys = Value::from(Selector::identity().keys()).evaluate(&scope());
        assert_eq!(keys, Value::Record(Record::of(["doc", "a", "b", "name"])));
        let values = Value::from(Selector::identity().get("b").values()).evaluate(&scope());
        assert_eq!(values, Value::from("deep"));
    }

    #[test]
    fn test_get_item_and_children() {
        let item = Value::from(Selector::identity().get("b").get_item(1)).evaluate(&scope());
        assert_eq!(item, Value::from(5));
        let children = Value::from(Selector::identity().get("b").children()).evaluate(&scope());
        assert_eq!(children, Value::Record(Record::of([Item::from("deep"), Item::from(5)])));
    }

    #[test]
    fn test_descendants_are_preorder() {
        let found = Value::from(Selector::identity().descendants()).evaluate(&scope());
        let Value::Record(found) = found else { panic!("expected a record") };
        assert_eq!(found.len(), 6);
        assert_eq!(found.get_item(0), &Item::Value(Value::Extant));
        assert_eq!(found.get_item(3), &Item::from("deep"));
    }

    #[test]
    fn test_filter_children() {
        let numbers = Value::Record(Record::of([1, 5, 10]));
        let gt3 = Value::from(Selector::identity()).gt(3);
        let selector = Value::from(Selector::identity().children().filter(gt3));
        assert_eq!(selector.evaluate(&numbers), Value::Record(Record::of([5, 10])));
    }

    #[test]
    fn test_arithmetic() {
        let none = Value::Absent;
        assert_eq!(Value::from(2).plus(3).times(4).evaluate(&none), Value::from(20));
        assert_eq!(Value::from(7).divide(2).evaluate(&none), Value::from(3));
        assert_eq!(Value::from(7.0).divide(2).evaluate(&none), Value::from(3.5));
        assert_eq!(Value::from(1).divide(0).evaluate(&none), Value::Absent);
        assert_eq!(Value::from(i64::MAX).plus(1).evaluate(&none), Value::from(i64::MAX as f64 + 1.0));
        assert_eq!(Value::from("a").plus("b").evaluate(&none), Value::from("ab"));
        assert_eq!(Value::from(5).negative().evaluate(&none), Value::from(-5));
    }

    #[test]
    fn test_comparisons_and_logic() {
        let none = Value::Absent;
        assert_eq!(Value::from(1).lt(2.5).evaluate(&none), Value::from(true));
        assert_eq!(Value::from(2).equal(2.0).evaluate(&none), Value::from(true));
        assert_eq!(Value::from("a").ge("b").evaluate(&none), Value::from(false));
        assert_eq!(Value::from(false).or("x").evaluate(&none), Value::from("x"));
        assert_eq!(Value::from(false).and("x").evaluate(&none), Value::from(false));
        assert_eq!(Value::from(true).not().evaluate(&none), Value::from(false));
    }

    #[test]
    fn test_conditional_uses_scope() {
        let a = Value::from(Selector::identity().get("a"));
        let expr = a.equal(1).conditional("one", "other");
        assert_eq!(expr.evaluate(&scope()), Value::from("one"));
    }

    #[test]
    fn test_invoke_bridge() {
        let double = Func::bridge("double", |args: &Value| match args {
            Value::Num(Num::Int(n)) => Value::from(n * 2),
            _ => Value::Absent,
        });
        let scope = Value::Record(Record::of([Item::slot("double", double), Item::slot("n", 21)]));
        let call = Value::from(Selector::identity().get("double"))
            .invoke(Selector::identity().get("n"));
        assert_eq!(call.evaluate(&scope), Value::from(42));
    }

    #[test]
    fn test_invoke_lambda() {
        let x = Value::from(Selector::identity().get("x"));
        let y = Value::from(Selector::identity().get("y"));
        let add = Value::Record(Record::of(["x", "y"])).lambda(x.plus(y));
        let call = add.invoke(Record::of([3, 4]));
        assert_eq!(call.evaluate(&Value::Absent), Value::from(7));
    }
}
