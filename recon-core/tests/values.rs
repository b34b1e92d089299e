//! Value algebra tests across the public API: copy-on-write handles,
//! immutability, byte buffers, and evaluation of parsed expressions.

use pretty_assertions::assert_eq;
use recon_core::value::{Data, Func, Item, Num, Record, Value};
use recon_core::{parse, ValueError};

// =============================================================================
// Copy-on-write
// =============================================================================

#[test]
fn test_branch_leaves_original_untouched() {
    let a = Record::of(["x", "y"]);
    let mut b = a.branch();
    assert!(a.is_aliased());
    b.push("z").unwrap();
    assert_eq!(a, Record::of(["x", "y"]));
    assert_eq!(b, Record::of(["x", "y", "z"]));
    assert!(a.is_aliased());
    assert!(!b.is_aliased());

    let mut a = a;
    a.set("k", 1).unwrap();
    assert!(!a.is_aliased());
    assert_eq!(a, Record::of([Item::from("x"), Item::from("y"), Item::slot("k", 1)]));
}

#[test]
fn test_parsed_records_branch() {
    let Value::Record(doc) = parse("{a: 1, b: {c: 2}}").unwrap() else { panic!("expected a record") };
    let mut copy = doc.branch();
    copy.set("a", 10).unwrap();
    assert_eq!(doc.get("a"), &Value::from(1));
    assert_eq!(copy.get("a"), &Value::from(10));
    assert_eq!(copy.get("b"), doc.get("b"));
}

#[test]
fn test_commit_rejects_mutation() {
    let mut record = Record::of([Item::slot("a", 1)]);
    record.commit();
    assert_eq!(record.set_slot("b", 2), Err(ValueError::Immutable));
    assert_eq!(record.delete("a"), Err(ValueError::Immutable));
    assert_eq!(record.splice(0, 1, [Item::from(2)]), Err(ValueError::Immutable));
    assert_eq!(record, Record::of([Item::slot("a", 1)]));

    // a branch of a frozen record is mutable again
    let mut thawed = record.branch();
    assert!(thawed.push("more").is_ok());
}

#[test]
fn test_index_errors() {
    let mut record = Record::of([1, 2]);
    assert_eq!(record.remove(5), Err(ValueError::IndexOutOfRange { index: 5, len: 2 }));
    assert_eq!(record.len(), 2);
}

// =============================================================================
// Byte buffers
// =============================================================================

#[test]
fn test_data_growth() {
    let mut data = Data::new();
    for i in 0..100u8 {
        data.add_byte(i).unwrap();
    }
    assert_eq!(data.len(), 100);
    assert_eq!(data.as_bytes(), (0..100u8).collect::<Vec<_>>().as_slice());
    assert!(data.capacity() >= 32 && data.capacity().is_power_of_two());
}

#[test]
fn test_data_encodings() {
    let data = Data::from(&b"recon"[..]);
    assert_eq!(data.to_base16(), "7265636F6E");
    assert_eq!(Data::from_base16("7265636f6e").unwrap(), data);
    assert_eq!(Data::from_base64(&data.to_base64()).unwrap(), data);
    assert!(matches!(Data::from_base16("7g"), Err(ValueError::InvalidBase16 { position: 1 })));
}

// =============================================================================
// Evaluation of parsed expressions
// =============================================================================

fn eval(expr: &str, scope: &str) -> Value {
    parse(expr).unwrap().evaluate(&parse(scope).unwrap())
}

#[test]
fn test_evaluate_selectors() {
    let scope = "{store: {book: {title: Dune, price: 9}, book: {title: Emma, price: 12}}}";
    assert_eq!(eval("$store.book.title", scope), Value::from("Dune"));
    assert_eq!(eval("$store.*.price", scope), Value::Record(Record::of([9, 12])));
    assert_eq!(eval("$store.*[$price > 10].title", scope), Value::from("Emma"));
    assert_eq!(eval("$missing", scope), Value::Absent);
}

#[test]
fn test_evaluate_operators() {
    assert_eq!(eval("$a + $b * 2", "{a: 1, b: 3}"), Value::from(7));
    assert_eq!(eval("$a / 2", "{a: 5.0}"), Value::Num(Num::Float(2.5)));
    assert_eq!(eval("$name + \"!\"", "{name: hi}"), Value::from("hi!"));
    assert_eq!(eval("$a > 1 ? big : small", "{a: 3}"), Value::from("big"));
    assert_eq!(eval("!$flag", "{flag: false}"), Value::Bool(true));
}

#[test]
fn test_evaluate_invocations() {
    let double = parse("x >> $x * 2").unwrap();
    let scope = Value::Record(Record::of([Item::slot("double", double), Item::slot("n", 21)]));
    assert_eq!(parse("$double($n)").unwrap().evaluate(&scope), Value::from(42));

    let len = Func::bridge("len", |v: &Value| match v {
        Value::Text(s) => Value::from(s.chars().count() as i64),
        _ => Value::Absent,
    });
    let scope = Value::Record(Record::of([Item::slot("len", len), Item::slot("s", "héllo")]));
    assert_eq!(parse("$len($s)").unwrap().evaluate(&scope), Value::from(5));
}
