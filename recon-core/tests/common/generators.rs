//! Stochastic generators for test variations
//!
//! Uses seeded RNG for reproducibility. Print seed on failure for replay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recon_core::value::{BinaryOp, Data, Item, Operator, Record, Selector, UnaryOp, Value};

const BINARY_OPS: [BinaryOp; 16] = [
    BinaryOp::Or,
    BinaryOp::And,
    BinaryOp::BitOr,
    BinaryOp::BitXor,
    BinaryOp::BitAnd,
    BinaryOp::Lt,
    BinaryOp::Le,
    BinaryOp::Eq,
    BinaryOp::Ne,
    BinaryOp::Ge,
    BinaryOp::Gt,
    BinaryOp::Plus,
    BinaryOp::Minus,
    BinaryOp::Times,
    BinaryOp::Divide,
    BinaryOp::Modulo,
];

const UNARY_OPS: [UnaryOp; 4] = [UnaryOp::Not, UnaryOp::BitNot, UnaryOp::Negative, UnaryOp::Positive];

/// Seeded generator for reproducible stochastic tests
pub struct Gen {
    pub rng: StdRng,
    pub seed: u64,
}

impl Gen {
    /// Create with specific seed (for reproduction)
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), seed }
    }

    /// Create from `RECON_TEST_SEED` or a random seed
    pub fn from_env_or_random() -> Self {
        let seed = std::env::var("RECON_TEST_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        Self::new(seed)
    }

    /// Geometric distribution: count until rand > alpha
    pub fn geometric(&mut self, alpha: f64) -> usize {
        let mut n = 0;
        while self.rng.gen::<f64>() < alpha {
            n += 1;
        }
        n
    }

    /// Random boolean with probability p
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    /// Random identifier
    pub fn name(&mut self) -> String {
        let len = 1 + self.geometric(0.7);
        let chars = b"abcdefghijklmnopqrstuvwxyz0123456789-_";
        let mut name = String::with_capacity(len);
        name.push(self.rng.gen_range(b'a'..=b'z') as char);
        for _ in 1..len {
            name.push(chars[self.rng.gen_range(0..chars.len())] as char);
        }
        name
    }

    /// Random text, sometimes needing quotes or escapes
    pub fn text(&mut self) -> String {
        if self.chance(0.5) {
            return self.name();
        }
        let len = self.geometric(0.8);
        let chars = ['a', 'z', ' ', '"', '\\', '\n', '\t', '[', '@', '{', 'é', '\u{1}', '€'];
        (0..len).map(|_| chars[self.rng.gen_range(0..chars.len())]).collect()
    }

    /// Random round-trippable value: scalars, records, attributes, slots
    /// and expressions.
    pub fn value(&mut self, depth: usize) -> Value {
        match self.rng.gen_range(0..if depth == 0 { 5 } else { 8 }) {
            0 => Value::from(self.text()),
            1 => Value::from(self.rng.gen_range(-100_000i64..100_000)),
            2 => Value::from(self.rng.gen_range(-1.0e6f64..1.0e6)),
            3 => Value::Bool(self.chance(0.5)),
            4 => {
                let len = self.geometric(0.8);
                Value::Data(Data::from((0..len).map(|_| self.rng.gen()).collect::<Vec<u8>>()))
            }
            7 => self.expr(depth - 1),
            _ => Value::Record(self.record(depth - 1)),
        }
    }

    /// Random operator expression over identifiers, integers, selectors
    /// and attribute-only records.
    pub fn expr(&mut self, depth: usize) -> Value {
        if depth == 0 {
            return self.operand();
        }
        let depth = depth - 1;
        match self.rng.gen_range(0..6) {
            0 => {
                let op = BINARY_OPS[self.rng.gen_range(0..BINARY_OPS.len())];
                let lhs = self.expr(depth);
                Value::Operator(Operator::binary(op, lhs, self.expr(depth)))
            }
            1 => {
                let op = UNARY_OPS[self.rng.gen_range(0..UNARY_OPS.len())];
                Value::Operator(Operator::unary(op, self.expr(depth)))
            }
            2 => {
                let cond = self.expr(depth);
                let then = self.expr(depth);
                cond.conditional(then, self.expr(depth))
            }
            3 => {
                let func = self.expr(depth);
                let args = if self.chance(0.3) { Value::Extant } else { self.expr(depth) };
                func.invoke(args)
            }
            4 => Value::from(self.name()).lambda(self.expr(depth)),
            _ => {
                let selector = self.selector();
                Value::Selector(selector.filter(self.expr(depth)))
            }
        }
    }

    fn operand(&mut self) -> Value {
        match self.rng.gen_range(0..5) {
            0 => Value::from(self.name()),
            1 => Value::from(self.rng.gen_range(-1000i64..1000)),
            2 => Value::Bool(self.chance(0.5)),
            3 => Value::Selector(self.selector()),
            _ => {
                let attrs = (0..1 + self.geometric(0.3)).map(|_| Item::attr(self.name())).collect();
                Value::Record(Record::from_items(attrs))
            }
        }
    }

    pub fn selector(&mut self) -> Selector {
        let mut selector = Selector::identity();
        for _ in 0..self.geometric(0.6) {
            selector = match self.rng.gen_range(0..8) {
                0 => selector.get(self.name()),
                1 => selector.get_attr(self.name()),
                2 => selector.get_item(self.rng.gen_range(0..5)),
                3 => selector.keys(),
                4 => selector.values(),
                5 => selector.children(),
                6 => selector.descendants(),
                _ => selector.literal(self.rng.gen_range(0..5i64)),
            };
        }
        selector
    }

    pub fn record(&mut self, depth: usize) -> Record {
        let mut items = Vec::new();
        for _ in 0..self.geometric(0.4) {
            items.push(Item::attr_with(self.name(), self.param(depth)));
        }
        for _ in 0..self.geometric(0.7) {
            let item = match self.rng.gen_range(0..4) {
                0 => Item::slot(self.name(), self.value(depth)),
                1 => Item::slot(self.value(depth), self.value(depth)),
                2 => Item::Value(Value::Extant),
                _ => Item::Value(self.value(depth)),
            };
            items.push(item);
        }
        Record::from_items(items)
    }

    fn param(&mut self, depth: usize) -> Value {
        if self.chance(0.5) {
            Value::Extant
        } else {
            self.value(depth)
        }
    }

    /// Split `text` into random chunks on char boundaries.
    pub fn chunks<'a>(&mut self, text: &'a str) -> Vec<&'a str> {
        let mut chunks = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let mut end = self.rng.gen_range(0..=rest.len().min(8));
            while !rest.is_char_boundary(end) {
                end += 1;
            }
            let (chunk, tail) = rest.split_at(end);
            chunks.push(chunk);
            rest = tail;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducibility() {
        let mut g1 = Gen::new(42);
        let mut g2 = Gen::new(42);
        for _ in 0..10 {
            assert_eq!(g1.name(), g2.name());
            assert_eq!(g1.value(2), g2.value(2));
        }
    }

    #[test]
    fn test_expressions_have_operators() {
        let mut gen = Gen::new(3);
        let found = (0..50).any(|_| matches!(gen.expr(2), Value::Operator(_)));
        assert!(found);
    }

    #[test]
    fn test_chunks_cover_text() {
        let mut gen = Gen::new(7);
        let text = "héllo, wörld €";
        assert_eq!(gen.chunks(text).concat(), text);
    }
}
