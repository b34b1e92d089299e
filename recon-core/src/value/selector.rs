//! Path expressions over value trees.
//!
//! A selector is a linked chain of steps ending in [`Selector::Identity`].
//! `$a.b#0` is `Get("a") -> Get("b") -> GetItem(0) -> Identity`.

use super::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `$`: the current value.
    Identity,
    /// `$(value)`: a literal evaluated in place of the current value.
    Literal { item: Box<Value>, then: Box<Selector> },
    /// `$key` / `.key`: value of the first field keyed `key`.
    Get { key: String, then: Box<Selector> },
    /// `$@key` / `.@key`: value of the first attribute named `key`.
    GetAttr { key: String, then: Box<Selector> },
    /// `$#n` / `#n`: the item at position `n`.
    GetItem { index: usize, then: Box<Selector> },
    /// `$*:` / `.*:`: keys of all fields.
    Keys { then: Box<Selector> },
    /// `$:*` / `.:*`: values of all fields.
    Values { then: Box<Selector> },
    /// `$*` / `.*`: values of all items.
    Children { then: Box<Selector> },
    /// `$**` / `.**`: all nested values, depth first.
    Descendants { then: Box<Selector> },
    /// `$[pred]` / `[pred]`: the current value, if `pred` holds for it.
    Filter { predicate: Box<Value>, then: Box<Selector> },
}

fn identity() -> Box<Selector> {
    Box::new(Selector::Identity)
}

impl Selector {
    pub fn identity() -> Selector {
        Selector::Identity
    }

    /// The next step, or `None` at the end of the chain.
    pub fn next(&self) -> Option<&Selector> {
        match self {
            Selector::Identity => None,
            Selector::Literal { then, .. }
            | Selector::Get { then, .. }
            | Selector::GetAttr { then, .. }
            | Selector::GetItem { then, .. }
            | Selector::Keys { then }
            | Selector::Values { then }
            | Selector::Children { then }
            | Selector::Descendants { then }
            | Selector::Filter { then, .. } => Some(then.as_ref()),
        }
    }

    fn next_mut(&mut self) -> Option<&mut Selector> {
        match self {
            Selector::Identity => None,
            Selector::Literal { then, .. }
            | Selector::Get { then, .. }
            | Selector::GetAttr { then, .. }
            | Selector::GetItem { then, .. }
            | Selector::Keys { then }
            | Selector::Values { then }
            | Selector::Children { then }
            | Selector::Descendants { then }
            | Selector::Filter { then, .. } => Some(then.as_mut()),
        }
    }

    /// The final non-identity step.
    pub fn last(&self) -> &Selector {
        let mut step = self;
        while let Some(next) = step.next() {
            if matches!(next, Selector::Identity) {
                break;
            }
            step = next;
        }
        step
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Selector::Identity)
    }

    /// Append `step` (itself a chain) to the end of this chain.
    pub fn then(mut self, step: Selector) -> Selector {
        self.append(step);
        self
    }

    fn append(&mut self, step: Selector) {
        let mut tail = self;
        while !tail.is_identity() {
            tail = match tail.next_mut() {
                Some(next) => next,
                None => unreachable!("only identity ends a chain"),
            };
        }
        *tail = step;
    }

    pub fn literal(self, item: impl Into<Value>) -> Selector {
        self.then(Selector::Literal { item: Box::new(item.into()), then: identity() })
    }

    pub fn get(self, key: impl Into<String>) -> Selector {
        self.then(Selector::Get { key: key.into(), then: identity() })
    }

    pub fn get_attr(self, key: impl Into<String>) -> Selector {
        self.then(Selector::GetAttr { key: key.into(), then: identity() })
    }

    pub fn get_item(self, index: usize) -> Selector {
        self.then(Selector::GetItem { index, then: identity() })
    }

    pub fn keys(self) -> Selector {
        self.then(Selector::Keys { then: identity() })
    }

    pub fn values(self) -> Selector {
        self.then(Selector::Values { then: identity() })
    }

    pub fn children(self) -> Selector {
        self.then(Selector::Children { then: identity() })
    }

    pub fn descendants(self) -> Selector {
        self.then(Selector::Descendants { then: identity() })
    }

    pub fn filter(self, predicate: impl Into<Value>) -> Selector {
        self.then(Selector::Filter { predicate: Box::new(predicate.into()), then: identity() })
    }
}
