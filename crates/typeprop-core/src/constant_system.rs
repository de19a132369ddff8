//! Constant evaluation for the JS back end
//!
//! Folding follows the runtime semantics of the emitted JavaScript: all
//! numbers are doubles, an integral double *is* an `int`, and bitwise
//! operators work on unsigned 32-bit values. Whenever the result would
//! depend on something the folder does not model (overflow past the safe
//! integer range, division by zero in integer operators, negative bitwise
//! operands) it declines by returning `None`.

use crate::world::ClassWorld;
use typeprop_ir::{ClassId, ConstantValue, DartType};

/// Largest magnitude at which every integer is exactly representable as a
/// double
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn is_safe_int(value: i64) -> bool {
    value.unsigned_abs() <= MAX_SAFE_INTEGER as u64
}

/// Operators a dynamic call with no argument may fold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    BitNot,
}

impl UnaryOperator {
    /// Maps a selector name to the operator, `None` for names that are not
    /// unary operators
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "unary-" => Some(UnaryOperator::Negate),
            "~" => Some(UnaryOperator::BitNot),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "unary-",
            UnaryOperator::BitNot => "~",
        }
    }
}

/// Binary operator of a folded dynamic call, keyed by selector name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    TruncatingDivide,
    Modulo,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
}

impl BinaryOperator {
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "~/" => BinaryOperator::TruncatingDivide,
            "%" => BinaryOperator::Modulo,
            "<<" => BinaryOperator::ShiftLeft,
            ">>" => BinaryOperator::ShiftRight,
            "&" => BinaryOperator::BitAnd,
            "|" => BinaryOperator::BitOr,
            "^" => BinaryOperator::BitXor,
            "<" => BinaryOperator::Less,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::Greater,
            ">=" => BinaryOperator::GreaterEqual,
            "==" => BinaryOperator::Equal,
            _ => return None,
        };
        Some(op)
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::TruncatingDivide => "~/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Equal => "==",
        }
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOperator::ShiftLeft
                | BinaryOperator::ShiftRight
                | BinaryOperator::BitAnd
                | BinaryOperator::BitOr
                | BinaryOperator::BitXor
        )
    }
}

/// Stateless constant folder
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantSystem;

impl ConstantSystem {
    pub fn new() -> Self {
        ConstantSystem
    }

    /// Builds a number constant, normalizing integral values to `Int` the
    /// way the runtime cannot tell them apart. `-0.0` stays a double.
    pub fn create_double(&self, value: f64) -> ConstantValue {
        if value.is_finite()
            && value.fract() == 0.0
            && value.abs() <= MAX_SAFE_INTEGER
            && !(value == 0.0 && value.is_sign_negative())
        {
            ConstantValue::Int(value as i64)
        } else {
            ConstantValue::Double(value)
        }
    }

    /// True if the constant passes an `is int` check at runtime
    pub fn is_int(&self, constant: &ConstantValue) -> bool {
        match constant {
            ConstantValue::Int(_) => true,
            ConstantValue::Double(d) => !d.is_nan() && d.floor() == *d,
            _ => false,
        }
    }

    /// Numeric value of an operand. `Int`s beyond the range a double holds
    /// exactly are not folded.
    fn number(&self, value: &ConstantValue) -> Option<f64> {
        match value {
            ConstantValue::Int(i) if !is_safe_int(*i) => None,
            _ => value.as_f64(),
        }
    }

    /// Folds an `Int` operation exactly while the result stays in the safe
    /// range and rounds it the way double arithmetic does otherwise.
    fn fold_int(
        &self,
        a: i64,
        b: i64,
        exact: impl Fn(i64, i64) -> Option<i64>,
        rounded: impl Fn(f64, f64) -> f64,
    ) -> Option<ConstantValue> {
        if !is_safe_int(a) || !is_safe_int(b) {
            return None;
        }
        match exact(a, b) {
            Some(result) if is_safe_int(result) => Some(ConstantValue::Int(result)),
            _ => Some(self.create_double(rounded(a as f64, b as f64))),
        }
    }

    /// Class the constant is an instance of at runtime
    pub fn runtime_class(&self, constant: &ConstantValue) -> ClassId {
        if constant.is_double() && self.is_int(constant) {
            ClassId::INT
        } else {
            constant.class()
        }
    }

    /// Decides a check of a non-null constant against a raw interface type
    pub fn is_subtype(&self, world: &ClassWorld, constant: &ConstantValue, ty: &DartType) -> bool {
        if ty.accepts_everything() {
            return true;
        }
        let Some(class) = ty.class() else {
            return false;
        };
        if class == ClassId::INT {
            return self.is_int(constant);
        }
        world.is_subclass_of(self.runtime_class(constant), class)
    }

    /// Folds a unary operator on a constant; `None` when the result is not
    /// known at compile time
    pub fn fold_unary(&self, op: UnaryOperator, operand: &ConstantValue) -> Option<ConstantValue> {
        match (op, operand) {
            (UnaryOperator::Negate, ConstantValue::Int(0)) => Some(ConstantValue::Int(0)),
            (UnaryOperator::Negate, ConstantValue::Int(i)) if is_safe_int(*i) => Some(ConstantValue::Int(-i)),
            (UnaryOperator::Negate, ConstantValue::Double(d)) => Some(self.create_double(-d)),
            (UnaryOperator::BitNot, value) => {
                let v = self.to_uint32(value)?;
                Some(ConstantValue::Int(i64::from(!v)))
            }
            _ => None,
        }
    }

    /// Folds a binary operator on two constants with JS number semantics.
    /// Returns `None` when the operator throws or may differ at runtime.
    pub fn fold_binary(&self, op: BinaryOperator, left: &ConstantValue, right: &ConstantValue) -> Option<ConstantValue> {
        use BinaryOperator::*;
        match op {
            Equal => Some(ConstantValue::Bool(self.equals(left, right))),
            Add => match (left, right) {
                (ConstantValue::String(a), ConstantValue::String(b)) => Some(ConstantValue::String(format!("{a}{b}"))),
                (ConstantValue::Int(a), ConstantValue::Int(b)) => {
                    self.fold_int(*a, *b, i64::checked_add, |a, b| a + b)
                }
                _ => self.fold_arithmetic(left, right, |a, b| a + b),
            },
            Subtract => match (left, right) {
                (ConstantValue::Int(a), ConstantValue::Int(b)) => {
                    self.fold_int(*a, *b, i64::checked_sub, |a, b| a - b)
                }
                _ => self.fold_arithmetic(left, right, |a, b| a - b),
            },
            Multiply => match (left, right) {
                (ConstantValue::Int(a), ConstantValue::Int(b)) => {
                    self.fold_int(*a, *b, i64::checked_mul, |a, b| a * b)
                }
                _ => self.fold_arithmetic(left, right, |a, b| a * b),
            },
            Divide => self.fold_arithmetic(left, right, |a, b| a / b),
            TruncatingDivide => self.fold_truncating_divide(left, right),
            Modulo => self.fold_modulo(left, right),
            Less | LessEqual | Greater | GreaterEqual => {
                let (a, b) = (self.number(left)?, self.number(right)?);
                let result = match op {
                    Less => a < b,
                    LessEqual => a <= b,
                    Greater => a > b,
                    _ => a >= b,
                };
                Some(ConstantValue::Bool(result))
            }
            ShiftLeft | ShiftRight | BitAnd | BitOr | BitXor => {
                let (a, b) = (self.to_uint32(left)?, self.to_uint32(right)?);
                let result = match op {
                    BitAnd => a & b,
                    BitOr => a | b,
                    BitXor => a ^ b,
                    ShiftLeft if b <= 31 => a << b,
                    ShiftRight if b <= 31 => a >> b,
                    _ => return None,
                };
                Some(ConstantValue::Int(i64::from(result)))
            }
        }
    }

    /// Value equality of the `==` operator on primitives
    pub fn equals(&self, left: &ConstantValue, right: &ConstantValue) -> bool {
        match (left, right) {
            (ConstantValue::Null, ConstantValue::Null) => true,
            (ConstantValue::Bool(a), ConstantValue::Bool(b)) => a == b,
            (ConstantValue::String(a), ConstantValue::String(b)) => a == b,
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Folds `identical(left, right)`. NaN is not comparable this way, as
    /// the emitted `===` disagrees with `identical` on it.
    pub fn identical(&self, left: &ConstantValue, right: &ConstantValue) -> Option<bool> {
        if left.is_nan() || right.is_nan() {
            return None;
        }
        Some(self.equals(left, right))
    }

    /// Concatenation of string constants; `None` if any part is not a string
    pub fn concatenate<'c>(&self, parts: impl IntoIterator<Item = &'c ConstantValue>) -> Option<ConstantValue> {
        let mut out = String::new();
        for part in parts {
            out.push_str(part.as_str()?);
        }
        Some(ConstantValue::String(out))
    }

    fn fold_arithmetic(
        &self,
        left: &ConstantValue,
        right: &ConstantValue,
        op: impl Fn(f64, f64) -> f64,
    ) -> Option<ConstantValue> {
        let (a, b) = (self.number(left)?, self.number(right)?);
        Some(self.create_double(op(a, b)))
    }

    fn fold_truncating_divide(&self, left: &ConstantValue, right: &ConstantValue) -> Option<ConstantValue> {
        if let (ConstantValue::Int(a), ConstantValue::Int(b)) = (left, right) {
            if !is_safe_int(*a) || !is_safe_int(*b) {
                return None;
            }
            return a.checked_div(*b).map(ConstantValue::Int);
        }
        let (a, b) = (self.number(left)?, self.number(right)?);
        if b == 0.0 {
            return None;
        }
        let quotient = (a / b).trunc();
        if !quotient.is_finite() || quotient.abs() > MAX_SAFE_INTEGER {
            return None;
        }
        Some(ConstantValue::Int(quotient as i64))
    }

    fn fold_modulo(&self, left: &ConstantValue, right: &ConstantValue) -> Option<ConstantValue> {
        if let (ConstantValue::Int(a), ConstantValue::Int(b)) = (left, right) {
            if !is_safe_int(*a) || !is_safe_int(*b) {
                return None;
            }
            return a.checked_rem_euclid(*b).map(ConstantValue::Int);
        }
        let (a, b) = (self.number(left)?, self.number(right)?);
        if b == 0.0 {
            return None;
        }
        let mut r = a % b;
        if r < 0.0 {
            r += b.abs();
        }
        Some(self.create_double(r))
    }

    /// Operand of a bitwise operator: an integral number in the unsigned
    /// 32-bit range
    fn to_uint32(&self, value: &ConstantValue) -> Option<u32> {
        if !self.is_int(value) {
            return None;
        }
        let v = value.as_f64()?;
        if (0.0..=f64::from(u32::MAX)).contains(&v) {
            Some(v as u32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    fn cs() -> ConstantSystem {
        ConstantSystem::new()
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!(BinaryOperator::parse("+"), Some(BinaryOperator::Add));
        assert_eq!(BinaryOperator::parse("~/"), Some(BinaryOperator::TruncatingDivide));
        assert_eq!(BinaryOperator::parse("[]"), None);
        assert_eq!(UnaryOperator::parse("unary-"), Some(UnaryOperator::Negate));
        assert_eq!(UnaryOperator::parse("-"), None);
        assert_eq!(BinaryOperator::parse(BinaryOperator::Modulo.name()), Some(BinaryOperator::Modulo));
    }

    #[test]
    fn test_fold_add() {
        let sum = cs().fold_binary(BinaryOperator::Add, &ConstantValue::Int(3), &ConstantValue::Int(4));
        assert_eq!(sum, Some(ConstantValue::Int(7)));
        let mixed = cs().fold_binary(BinaryOperator::Add, &ConstantValue::Int(1), &ConstantValue::Double(0.5));
        assert_eq!(mixed, Some(ConstantValue::Double(1.5)));
        let strings = cs().fold_binary(
            BinaryOperator::Add,
            &ConstantValue::string("a"),
            &ConstantValue::string("b"),
        );
        assert_eq!(strings, Some(ConstantValue::string("ab")));
        let overflow = cs().fold_binary(BinaryOperator::Add, &ConstantValue::Int(i64::MAX), &ConstantValue::Int(1));
        assert_eq!(overflow, None);
        let bad = cs().fold_binary(BinaryOperator::Add, &ConstantValue::Int(1), &ConstantValue::string("x"));
        assert_eq!(bad, None);
    }

    #[test]
    fn test_fold_division() {
        let c = cs();
        assert_eq!(
            c.fold_binary(BinaryOperator::Divide, &ConstantValue::Int(6), &ConstantValue::Int(3)),
            Some(ConstantValue::Int(2))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Divide, &ConstantValue::Int(1), &ConstantValue::Int(2)),
            Some(ConstantValue::Double(0.5))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Divide, &ConstantValue::Int(1), &ConstantValue::Int(0)),
            Some(ConstantValue::Double(f64::INFINITY))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::TruncatingDivide, &ConstantValue::Int(7), &ConstantValue::Int(2)),
            Some(ConstantValue::Int(3))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::TruncatingDivide, &ConstantValue::Int(7), &ConstantValue::Int(0)),
            None
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Modulo, &ConstantValue::Int(-7), &ConstantValue::Int(3)),
            Some(ConstantValue::Int(2))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Modulo, &ConstantValue::Double(-1.5), &ConstantValue::Int(1)),
            Some(ConstantValue::Double(0.5))
        );
    }

    #[test]
    fn test_fold_bitwise_uses_uint32() {
        let c = cs();
        assert_eq!(
            c.fold_binary(BinaryOperator::BitAnd, &ConstantValue::Int(12), &ConstantValue::Int(10)),
            Some(ConstantValue::Int(8))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::ShiftLeft, &ConstantValue::Int(1), &ConstantValue::Int(31)),
            Some(ConstantValue::Int(2_147_483_648))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::ShiftLeft, &ConstantValue::Int(1), &ConstantValue::Int(32)),
            None
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::BitOr, &ConstantValue::Int(-1), &ConstantValue::Int(1)),
            None
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::BitXor, &ConstantValue::Double(1.5), &ConstantValue::Int(1)),
            None
        );
        assert_eq!(
            c.fold_unary(UnaryOperator::BitNot, &ConstantValue::Int(0)),
            Some(ConstantValue::Int(4_294_967_295))
        );
    }

    #[test]
    fn test_fold_comparisons_and_equality() {
        let c = cs();
        assert_eq!(
            c.fold_binary(BinaryOperator::Less, &ConstantValue::Int(1), &ConstantValue::Double(1.5)),
            Some(ConstantValue::Bool(true))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::GreaterEqual, &ConstantValue::Double(f64::NAN), &ConstantValue::Int(0)),
            Some(ConstantValue::Bool(false))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Less, &ConstantValue::string("a"), &ConstantValue::string("b")),
            None
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Equal, &ConstantValue::Int(1), &ConstantValue::Double(1.0)),
            Some(ConstantValue::Bool(true))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Equal, &ConstantValue::Null, &ConstantValue::Int(0)),
            Some(ConstantValue::Bool(false))
        );
    }

    #[test]
    fn test_negate() {
        let c = cs();
        assert_eq!(c.fold_unary(UnaryOperator::Negate, &ConstantValue::Int(5)), Some(ConstantValue::Int(-5)));
        assert_eq!(c.fold_unary(UnaryOperator::Negate, &ConstantValue::Int(i64::MIN)), None);
        assert_eq!(
            c.fold_unary(UnaryOperator::Negate, &ConstantValue::Double(0.0)),
            Some(ConstantValue::Double(-0.0))
        );
        assert_eq!(c.fold_unary(UnaryOperator::Negate, &ConstantValue::string("x")), None);
    }

    #[test]
    fn test_runtime_classes() {
        let c = cs();
        assert_eq!(c.runtime_class(&ConstantValue::Double(2.0)), ClassId::INT);
        assert_eq!(c.runtime_class(&ConstantValue::Double(2.5)), ClassId::DOUBLE);
        assert_eq!(c.runtime_class(&ConstantValue::Bool(true)), ClassId::BOOL);
        assert!(c.is_int(&ConstantValue::Double(f64::INFINITY)));
        assert!(c.is_int(&ConstantValue::Double(-0.0)));
        assert!(!c.is_int(&ConstantValue::Double(f64::NAN)));
        assert_eq!(c.runtime_class(&ConstantValue::Double(f64::NEG_INFINITY)), ClassId::INT);
        assert_eq!(c.runtime_class(&ConstantValue::Double(f64::NAN)), ClassId::DOUBLE);
        assert!(c.is_subtype(&ClassWorld::core(), &ConstantValue::Double(f64::INFINITY), &DartType::int()));
    }

    #[test]
    fn test_fold_beyond_safe_integers() {
        let c = cs();
        let two_53 = 1_i64 << 53;
        assert_eq!(
            c.fold_binary(BinaryOperator::Subtract, &ConstantValue::Int(two_53 + 1), &ConstantValue::Int(two_53)),
            None
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Add, &ConstantValue::Int(two_53), &ConstantValue::Int(1)),
            Some(ConstantValue::Int(two_53))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Multiply, &ConstantValue::Int(two_53), &ConstantValue::Int(4)),
            Some(ConstantValue::Double(4.0 * two_53 as f64))
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Add, &ConstantValue::Int(two_53 + 1), &ConstantValue::Double(0.5)),
            None
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Less, &ConstantValue::Int(two_53 + 1), &ConstantValue::Int(two_53 + 2)),
            None
        );
        assert_eq!(
            c.fold_binary(BinaryOperator::Modulo, &ConstantValue::Int(two_53 + 1), &ConstantValue::Int(2)),
            None
        );
        assert_eq!(c.fold_unary(UnaryOperator::Negate, &ConstantValue::Int(two_53 + 1)), None);
    }

    #[test]
    fn test_constant_subtype() {
        let c = cs();
        let world = ClassWorld::core();
        assert!(c.is_subtype(&world, &ConstantValue::Int(1), &DartType::double()));
        assert!(c.is_subtype(&world, &ConstantValue::Double(3.0), &DartType::int()));
        assert!(!c.is_subtype(&world, &ConstantValue::Double(3.5), &DartType::int()));
        assert!(c.is_subtype(&world, &ConstantValue::Double(3.5), &DartType::num()));
        assert!(!c.is_subtype(&world, &ConstantValue::string("s"), &DartType::num()));
        assert!(c.is_subtype(&world, &ConstantValue::string("s"), &DartType::object()));
    }

    #[test]
    fn test_identical_and_concatenate() {
        let c = cs();
        assert_eq!(c.identical(&ConstantValue::Int(1), &ConstantValue::Int(1)), Some(true));
        assert_eq!(c.identical(&ConstantValue::Double(f64::NAN), &ConstantValue::Int(1)), None);
        assert_eq!(c.identical(&ConstantValue::Null, &ConstantValue::Bool(false)), Some(false));
        let parts = [ConstantValue::string("x = "), ConstantValue::string("1")];
        assert_eq!(c.concatenate(&parts), Some(ConstantValue::string("x = 1")));
        let mixed = [ConstantValue::string("x"), ConstantValue::Int(1)];
        assert_eq!(c.concatenate(&mixed), None);
    }

    #[quickcheck]
    fn qc_int_add_matches_checked_add(a: i32, b: i32) -> bool {
        let folded = cs().fold_binary(
            BinaryOperator::Add,
            &ConstantValue::Int(i64::from(a)),
            &ConstantValue::Int(i64::from(b)),
        );
        folded == Some(ConstantValue::Int(i64::from(a) + i64::from(b)))
    }

    #[quickcheck]
    fn qc_large_int_arithmetic_matches_doubles(a: i64, b: i64, shift: u8) -> TestResult {
        // Spread operands over the range where doubles start to round.
        let (a, b) = (a >> (shift % 16), b >> (shift % 16));
        if !is_safe_int(a) || !is_safe_int(b) {
            return TestResult::discard();
        }
        let (x, y) = (ConstantValue::Int(a), ConstantValue::Int(b));
        let (fa, fb) = (a as f64, b as f64);
        let cases = [
            (BinaryOperator::Add, fa + fb),
            (BinaryOperator::Subtract, fa - fb),
            (BinaryOperator::Multiply, fa * fb),
        ];
        TestResult::from_bool(cases.into_iter().all(|(op, expected)| {
            match cs().fold_binary(op, &x, &y) {
                Some(ConstantValue::Int(v)) => is_safe_int(v) && v as f64 == expected,
                Some(ConstantValue::Double(d)) => d == expected,
                _ => false,
            }
        }))
    }

    #[quickcheck]
    fn qc_bitwise_results_are_uint32(a: u32, b: u32) -> bool {
        [BinaryOperator::BitAnd, BinaryOperator::BitOr, BinaryOperator::BitXor]
            .into_iter()
            .all(|op| {
                match cs().fold_binary(op, &ConstantValue::Int(i64::from(a)), &ConstantValue::Int(i64::from(b))) {
                    Some(ConstantValue::Int(v)) => (0..=i64::from(u32::MAX)).contains(&v),
                    _ => false,
                }
            })
    }

    #[quickcheck]
    fn qc_create_double_normalizes_integral_values(v: i32) -> bool {
        cs().create_double(f64::from(v)) == ConstantValue::Int(i64::from(v))
    }

    #[quickcheck]
    fn qc_comparison_is_antisymmetric(a: i32, b: i32) -> TestResult {
        if a == b {
            return TestResult::discard();
        }
        let (l, r) = (ConstantValue::Int(i64::from(a)), ConstantValue::Int(i64::from(b)));
        let lt = cs().fold_binary(BinaryOperator::Less, &l, &r);
        let gt = cs().fold_binary(BinaryOperator::Greater, &l, &r);
        TestResult::from_bool(lt.is_some() && lt != gt)
    }
}
