//! The Recon value algebra.
//!
//! A [`Record`] holds an ordered sequence of [`Item`]s; an item is either a
//! [`Field`] (keyed) or a bare [`Value`]. Records and [`Data`] buffers are
//! copy-on-write handles: `branch()` shares storage, the first mutation of
//! an aliased handle detaches it.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::ValueError;

pub mod data;
mod eval;
pub mod func;
pub mod num;
pub mod operator;
pub mod record;
pub mod selector;

pub use data::Data;
pub use func::Func;
pub use num::Num;
pub use operator::{BinaryOp, Operator, UnaryOp};
pub use record::Record;
pub use selector::Selector;

/// Returned by lookups that miss.
pub static ABSENT: Value = Value::Absent;

/// Precedence of primaries (literals, selectors, invocations).
pub const PRIMARY_PRECEDENCE: u8 = 12;

/// Any Recon value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Record(Record),
    Data(Data),
    Text(String),
    Num(Num),
    Bool(bool),
    /// Present without a value, e.g. the value of a bare `@flag`.
    Extant,
    /// Not present at all.
    Absent,
    Selector(Selector),
    Operator(Operator),
    Func(Func),
}

/// A keyed member of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// `@key` or `@key(value)`.
    Attr { key: String, value: Value },
    /// `key:value`.
    Slot { key: Value, value: Value },
}

/// The unit of storage in a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Field(Field),
    Value(Value),
}

impl Field {
    pub fn attr(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Field::Attr { key: key.into(), value: value.into() }
    }

    pub fn slot(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Field::Slot { key: key.into(), value: value.into() }
    }

    pub fn value(&self) -> &Value {
        match self {
            Field::Attr { value, .. } | Field::Slot { value, .. } => value,
        }
    }

    pub fn value_mut(&mut self) -> &mut Value {
        match self {
            Field::Attr { value, .. } | Field::Slot { value, .. } => value,
        }
    }

    /// The key as text, if it is textual.
    pub fn key_str(&self) -> Option<&str> {
        match self {
            Field::Attr { key, .. } => Some(key),
            Field::Slot { key: Value::Text(key), .. } => Some(key),
            Field::Slot { .. } => None,
        }
    }

    /// The key as a value; attribute names become `Text`.
    pub fn key_value(&self) -> Value {
        match self {
            Field::Attr { key, .. } => Value::Text(key.clone()),
            Field::Slot { key, .. } => key.clone(),
        }
    }

    pub fn is_attr(&self) -> bool {
        matches!(self, Field::Attr { .. })
    }
}

impl Item {
    /// A bare attribute, `@key`.
    pub fn attr(key: impl Into<String>) -> Self {
        Item::Field(Field::attr(key, Value::Extant))
    }

    pub fn attr_with(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Item::Field(Field::attr(key, value))
    }

    pub fn slot(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Item::Field(Field::slot(key, value))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Item::Value(value.into())
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Item::Field(field) => Some(field),
            Item::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(value) => Some(value),
            Item::Field(_) => None,
        }
    }

    /// The value carried by the item, whether field or bare.
    pub fn target(&self) -> &Value {
        match self {
            Item::Field(field) => field.value(),
            Item::Value(value) => value,
        }
    }

    pub fn is_attr(&self) -> bool {
        matches!(self, Item::Field(Field::Attr { .. }))
    }
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Absent)
    }

    /// Neither `Extant` nor `Absent`.
    pub fn is_distinct(&self) -> bool {
        !matches!(self, Value::Absent | Value::Extant)
    }

    /// `false`, `Extant` and `Absent` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Extant | Value::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<Num> {
        match self {
            Value::Num(num) => Some(*num),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&Data> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Binding strength when printed inside an expression.
    pub fn precedence(&self) -> u8 {
        match self {
            Value::Operator(operator) => operator.precedence(),
            Value::Func(Func::Lambda { .. }) => func::LAMBDA_PRECEDENCE,
            _ => PRIMARY_PRECEDENCE,
        }
    }

    /// Keyed lookup on records; `&ABSENT` for any other value.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Record(record) => record.get(key),
            _ => &ABSENT,
        }
    }

    pub fn get_attr(&self, key: &str) -> &Value {
        match self {
            Value::Record(record) => record.get_attr(key),
            _ => &ABSENT,
        }
    }

    /// Convert into a record, wrapping non-record values as a single item.
    pub fn into_record(self) -> Record {
        match self {
            Value::Record(record) => record,
            Value::Absent => Record::new(),
            value => Record::of([Item::Value(value)]),
        }
    }
}

macro_rules! binary_builders {
    ($($(#[$meta:meta])* $name:ident => $op:ident),* $(,)?) => {
        impl Value {
            $(
                $(#[$meta])*
                pub fn $name(self, rhs: impl Into<Value>) -> Value {
                    Value::Operator(Operator::binary(BinaryOp::$op, self, rhs))
                }
            )*
        }
    };
}

binary_builders! {
    /// `self || rhs`
    or => Or,
    /// `self && rhs`
    and => And,
    bit_or => BitOr,
    bit_xor => BitXor,
    bit_and => BitAnd,
    lt => Lt,
    le => Le,
    equal => Eq,
    not_equal => Ne,
    ge => Ge,
    gt => Gt,
    plus => Plus,
    minus => Minus,
    times => Times,
    divide => Divide,
    modulo => Modulo,
}

impl Value {
    /// `!self`
    pub fn not(self) -> Value {
        Value::Operator(Operator::unary(UnaryOp::Not, self))
    }

    pub fn bit_not(self) -> Value {
        Value::Operator(Operator::unary(UnaryOp::BitNot, self))
    }

    pub fn negative(self) -> Value {
        Value::Operator(Operator::unary(UnaryOp::Negative, self))
    }

    pub fn positive(self) -> Value {
        Value::Operator(Operator::unary(UnaryOp::Positive, self))
    }

    /// `self ? then : otherwise`
    pub fn conditional(self, then: impl Into<Value>, otherwise: impl Into<Value>) -> Value {
        Value::Operator(Operator::conditional(self, then, otherwise))
    }

    /// `self(args)`
    pub fn invoke(self, args: impl Into<Value>) -> Value {
        Value::Operator(Operator::invoke(self, args))
    }

    /// `self >> template`
    pub fn lambda(self, template: impl Into<Value>) -> Value {
        Value::Func(Func::lambda(self, template))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Absent
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Data(Data::from(bytes))
    }
}

macro_rules! value_from_num {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Num(Num::from(n))
                }
            }
        )*
    };
}

value_from_num!(i32, i64, u32, u64, f32, f64);

macro_rules! value_from_variant {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Value {
                fn from(value: $variant) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from_variant!(Record, Data, Num, Selector, Operator, Func);

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Value(value)
    }
}

impl From<Field> for Item {
    fn from(field: Field) -> Self {
        Item::Field(field)
    }
}

macro_rules! item_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Item {
                fn from(value: $ty) -> Self {
                    Item::Value(Value::from(value))
                }
            }
        )*
    };
}

item_from_value!(&str, String, bool, i32, i64, u32, u64, f32, f64, Record, Data, Num, Selector, Operator, Func);

/// Aliasing and immutability flags carried by each copy-on-write handle.
///
/// The flags belong to the handle, not to the shared storage: marking one
/// handle unaliased leaves its former co-owners untouched.
#[derive(Debug, Default)]
pub(crate) struct ShareFlags(AtomicU8);

impl ShareFlags {
    const ALIASED: u8 = 0x01;
    const IMMUTABLE: u8 = 0x02;

    pub(crate) fn aliased() -> Self {
        Self(AtomicU8::new(Self::ALIASED))
    }

    /// Mark the handle as sharing its storage.
    #[inline]
    pub(crate) fn alias(&self) {
        self.0.fetch_or(Self::ALIASED, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn is_aliased(&self) -> bool {
        self.0.load(Ordering::Relaxed) & Self::ALIASED != 0
    }

    #[inline]
    pub(crate) fn is_immutable(&self) -> bool {
        self.0.load(Ordering::Relaxed) & Self::IMMUTABLE != 0
    }

    pub(crate) fn freeze(&mut self) {
        *self.0.get_mut() |= Self::IMMUTABLE;
    }

    /// Gate a mutation: fails on immutable handles, otherwise clears the
    /// aliased flag and reports whether it was set.
    pub(crate) fn begin_mutation(&mut self) -> Result<bool, ValueError> {
        let flags = self.0.get_mut();
        if *flags & Self::IMMUTABLE != 0 {
            return Err(ValueError::Immutable);
        }
        let was_aliased = *flags & Self::ALIASED != 0;
        *flags &= !Self::ALIASED;
        Ok(was_aliased)
    }
}
