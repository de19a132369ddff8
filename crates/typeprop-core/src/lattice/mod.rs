//! Constant propagation lattice
//!
//! A flat three-level lattice per definition:
//!
//! ```text
//!        NonConstant(mask)
//!       /      |       \
//!  Constant  Constant  Constant ...
//!       \      |       /
//!            Nothing
//! ```
//!
//! Every `Constant` and `NonConstant` carries a type mask, so the lattice
//! also tracks types for values that are not constant. The join of two
//! non-constants is the union of their masks.

mod abstract_bool;
mod abstract_value;

pub use abstract_bool::AbstractBool;
pub use abstract_value::{AbstractValue, ValueKind};

use crate::constant_system::{BinaryOperator, ConstantSystem, UnaryOperator};
use crate::type_mask::TypeMask;
use crate::type_system::TypeMaskSystem;
use typeprop_ir::{ConstantValue, DartType};

/// Abstract values and the operations on them, backed by a type mask
/// system and the constant folder
pub struct ConstantPropagationLattice<'a> {
    types: &'a TypeMaskSystem<'a>,
    constants: &'a ConstantSystem,
}

impl<'a> ConstantPropagationLattice<'a> {
    pub fn new(types: &'a TypeMaskSystem<'a>, constants: &'a ConstantSystem) -> Self {
        Self { types, constants }
    }

    pub fn types(&self) -> &'a TypeMaskSystem<'a> {
        self.types
    }

    pub fn constant_system(&self) -> &'a ConstantSystem {
        self.constants
    }

    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    pub fn nothing(&self) -> AbstractValue {
        AbstractValue::Nothing
    }

    /// A constant typed by its runtime class
    pub fn constant(&self, value: ConstantValue) -> AbstractValue {
        let ty = self.types.get_type_of(&value);
        AbstractValue::Constant { value, ty }
    }

    /// Any value of `ty`
    pub fn non_constant(&self, ty: TypeMask) -> AbstractValue {
        AbstractValue::NonConstant { ty }
    }

    /// Any value at all
    pub fn dynamic(&self) -> AbstractValue {
        self.non_constant(self.types.dynamic_type())
    }

    pub fn any_bool(&self) -> AbstractValue {
        self.non_constant(self.types.bool_type())
    }

    pub fn any_string(&self) -> AbstractValue {
        self.non_constant(self.types.string_type())
    }

    pub fn bool_constant(&self, value: bool) -> AbstractValue {
        self.constant(ConstantValue::Bool(value))
    }

    // ---------------------------------------------------------------------
    // Lattice operations
    // ---------------------------------------------------------------------

    /// Least upper bound. `Nothing` is the identity, equal constants merge,
    /// anything else is a non-constant of the joined masks.
    pub fn join(&self, a: &AbstractValue, b: &AbstractValue) -> AbstractValue {
        match (a, b) {
            (AbstractValue::Nothing, other) | (other, AbstractValue::Nothing) => other.clone(),
            (AbstractValue::Constant { value: x, .. }, AbstractValue::Constant { value: y, .. }) if x == y => a.clone(),
            _ => self.non_constant(self.types.join(&mask_of(a), &mask_of(b))),
        }
    }

    /// Folds a unary operator.
    ///
    /// Returns `Some(Nothing)` while the operand is unknown, a constant on a
    /// successful fold and `Some(dynamic)` when the folder declines. `None`
    /// means the operand is not constant and the caller should use the
    /// declared return type.
    pub fn unary_op(&self, op: UnaryOperator, value: &AbstractValue) -> Option<AbstractValue> {
        match value {
            AbstractValue::Nothing => Some(AbstractValue::Nothing),
            AbstractValue::Constant { value, .. } => Some(match self.constants.fold_unary(op, value) {
                Some(folded) => self.constant(folded),
                None => self.dynamic(),
            }),
            AbstractValue::NonConstant { .. } => None,
        }
    }

    /// Folds a binary operator; outcomes as for [`Self::unary_op`].
    pub fn binary_op(&self, op: BinaryOperator, left: &AbstractValue, right: &AbstractValue) -> Option<AbstractValue> {
        if left.is_nothing() || right.is_nothing() {
            return Some(AbstractValue::Nothing);
        }
        let (Some(l), Some(r)) = (left.constant(), right.constant()) else {
            return None;
        };
        Some(match self.constants.fold_binary(op, l, r) {
            Some(folded) => self.constant(folded),
            None => self.dynamic(),
        })
    }

    /// Value of a string interpolation of `parts`
    pub fn string_concat<'v>(&self, parts: impl IntoIterator<Item = &'v AbstractValue>) -> AbstractValue {
        let mut constants = Vec::new();
        let mut all_constant = true;
        for part in parts {
            match part {
                AbstractValue::Nothing => return AbstractValue::Nothing,
                AbstractValue::Constant { value, .. } => constants.push(value),
                AbstractValue::NonConstant { .. } => all_constant = false,
            }
        }
        if all_constant {
            if let Some(folded) = self.constants.concatenate(constants) {
                return self.constant(folded);
            }
        }
        self.any_string()
    }

    /// Value of `identical(left, right)`
    pub fn identical(&self, left: &AbstractValue, right: &AbstractValue) -> AbstractValue {
        if left.is_nothing() || right.is_nothing() {
            return AbstractValue::Nothing;
        }
        if let (Some(l), Some(r)) = (left.constant(), right.constant()) {
            return match self.constants.identical(l, r) {
                Some(result) => self.bool_constant(result),
                None => self.any_bool(),
            };
        }
        if self.are_disjoint(left, right) {
            self.bool_constant(false)
        } else {
            self.any_bool()
        }
    }

    /// Decides whether `value` passes a check against `ty`. `allow_null`
    /// lets `null` pass, as in a cast.
    pub fn is_subtype_of(&self, value: &AbstractValue, ty: &DartType, allow_null: bool) -> AbstractBool {
        match value {
            AbstractValue::Nothing => AbstractBool::Nothing,
            AbstractValue::NonConstant { ty: mask } => self.types.is_subtype_of(mask, ty, allow_null),
            AbstractValue::Constant { value, .. } if value.is_null() => {
                if allow_null || ty.accepts_everything() || ty.is_null() {
                    AbstractBool::True
                } else if ty.is_type_variable() {
                    AbstractBool::Maybe
                } else {
                    AbstractBool::False
                }
            }
            AbstractValue::Constant { value, .. } => match ty {
                DartType::Dynamic | DartType::Void => AbstractBool::True,
                DartType::TypeVariable { .. } | DartType::Function => AbstractBool::Maybe,
                DartType::Interface { .. } => {
                    if !self.constants.is_subtype(self.types.world(), value, ty) {
                        AbstractBool::False
                    } else if ty.treat_as_raw() {
                        AbstractBool::True
                    } else {
                        AbstractBool::Maybe
                    }
                }
            },
        }
    }

    // ---------------------------------------------------------------------
    // Category queries. `Nothing` satisfies every one of them.
    // ---------------------------------------------------------------------

    /// True if every value is a bool (or `null`, with `allow_null`)
    pub fn is_definitely_bool(&self, value: &AbstractValue, allow_null: bool) -> bool {
        value
            .ty()
            .map_or(true, |mask| self.types.is_definitely_bool(mask, allow_null))
    }

    pub fn is_definitely_num(&self, value: &AbstractValue, allow_null: bool) -> bool {
        value
            .ty()
            .map_or(true, |mask| self.types.is_definitely_num(mask, allow_null))
    }

    pub fn is_definitely_int(&self, value: &AbstractValue, allow_null: bool) -> bool {
        value
            .ty()
            .map_or(true, |mask| self.types.is_definitely_int(mask, allow_null))
    }

    pub fn is_definitely_string(&self, value: &AbstractValue, allow_null: bool) -> bool {
        value
            .ty()
            .map_or(true, |mask| self.types.is_definitely_string(mask, allow_null))
    }

    pub fn is_definitely_num_string_bool(&self, value: &AbstractValue, allow_null: bool) -> bool {
        value
            .ty()
            .map_or(true, |mask| self.types.is_definitely_num_string_bool(mask, allow_null))
    }

    /// True if the value can never be a num, string or bool; `null`
    /// is allowed
    pub fn is_definitely_not_num_string_bool(&self, value: &AbstractValue) -> bool {
        value
            .ty()
            .map_or(true, |mask| self.types.is_definitely_not_num_string_bool(mask))
    }

    /// True if the value is never a number with a fractional part. Integers
    /// are doubles at runtime, so this is proven by excluding the exact
    /// double mask.
    pub fn is_definitely_not_non_integer_double(&self, value: &AbstractValue) -> bool {
        match value {
            AbstractValue::Nothing => true,
            AbstractValue::Constant { value, .. } => !value.is_double() || self.constants.is_int(value),
            AbstractValue::NonConstant { ty } => self.types.is_definitely_not_non_integer_double(ty),
        }
    }

    /// True if the two values can never be the same runtime value
    pub fn are_disjoint(&self, a: &AbstractValue, b: &AbstractValue) -> bool {
        self.types.are_disjoint(&mask_of(a), &mask_of(b))
    }
}

fn mask_of(value: &AbstractValue) -> TypeMask {
    value.ty().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_system::InferenceResults;
    use crate::world::ClassWorld;
    use proptest::prelude::*;
    use typeprop_ir::ClassId;

    /// Runs `f` with a lattice over the core world
    fn with_lattice<R>(f: impl FnOnce(&ConstantPropagationLattice<'_>) -> R) -> R {
        let world = ClassWorld::core();
        let oracle = InferenceResults::new();
        let constants = ConstantSystem::new();
        let types = TypeMaskSystem::new(&world, &oracle, &constants);
        let lattice = ConstantPropagationLattice::new(&types, &constants);
        f(&lattice)
    }

    #[test]
    fn test_join_basics() {
        with_lattice(|l| {
            let three = l.constant(ConstantValue::Int(3));
            let four = l.constant(ConstantValue::Int(4));
            assert_eq!(l.join(&l.nothing(), &three), three);
            assert_eq!(l.join(&three, &three), three);
            assert_eq!(l.join(&three, &four), l.non_constant(l.types().int_type()));
            let s = l.constant(ConstantValue::string("s"));
            let joined = l.join(&three, &s);
            assert_eq!(joined.ty(), Some(&TypeMask::from_classes([ClassId::INT, ClassId::STRING], false)));
        });
    }

    #[test]
    fn test_binary_op_outcomes() {
        with_lattice(|l| {
            let three = l.constant(ConstantValue::Int(3));
            let four = l.constant(ConstantValue::Int(4));
            let any_int = l.non_constant(l.types().int_type());
            assert_eq!(
                l.binary_op(BinaryOperator::Add, &three, &four),
                Some(l.constant(ConstantValue::Int(7)))
            );
            assert_eq!(
                l.binary_op(BinaryOperator::Add, &l.nothing(), &any_int),
                Some(AbstractValue::Nothing)
            );
            assert_eq!(l.binary_op(BinaryOperator::Add, &three, &any_int), None);
            let zero = l.constant(ConstantValue::Int(0));
            assert_eq!(
                l.binary_op(BinaryOperator::TruncatingDivide, &three, &zero),
                Some(l.dynamic())
            );
            assert_eq!(l.unary_op(UnaryOperator::Negate, &three), Some(l.constant(ConstantValue::Int(-3))));
            assert_eq!(l.unary_op(UnaryOperator::Negate, &any_int), None);
        });
    }

    #[test]
    fn test_string_concat() {
        with_lattice(|l| {
            let a = l.constant(ConstantValue::string("a"));
            let b = l.constant(ConstantValue::string("b"));
            assert_eq!(l.string_concat([&a, &b]), l.constant(ConstantValue::string("ab")));
            assert_eq!(l.string_concat([&a, &l.nothing()]), AbstractValue::Nothing);
            assert_eq!(l.string_concat([&a, &l.dynamic()]), l.any_string());
            let one = l.constant(ConstantValue::Int(1));
            assert_eq!(l.string_concat([&a, &one]), l.any_string());
        });
    }

    #[test]
    fn test_identical() {
        with_lattice(|l| {
            let null = l.constant(ConstantValue::Null);
            let any_int = l.non_constant(l.types().int_type());
            assert_eq!(l.identical(&null, &any_int), l.bool_constant(false));
            assert_eq!(l.identical(&null, &l.dynamic()), l.any_bool());
            let nan = l.constant(ConstantValue::Double(f64::NAN));
            assert_eq!(l.identical(&nan, &nan), l.any_bool());
            let one = l.constant(ConstantValue::Int(1));
            assert_eq!(l.identical(&one, &one), l.bool_constant(true));
            assert_eq!(l.identical(&one, &l.nothing()), AbstractValue::Nothing);
        });
    }

    #[test]
    fn test_is_subtype_of_constants() {
        with_lattice(|l| {
            let null = l.constant(ConstantValue::Null);
            assert_eq!(l.is_subtype_of(&null, &DartType::int(), false), AbstractBool::False);
            assert_eq!(l.is_subtype_of(&null, &DartType::int(), true), AbstractBool::True);
            assert_eq!(l.is_subtype_of(&null, &DartType::object(), false), AbstractBool::True);
            assert_eq!(
                l.is_subtype_of(&null, &DartType::type_variable("T"), false),
                AbstractBool::Maybe
            );

            let two = l.constant(ConstantValue::Double(2.0));
            assert_eq!(l.is_subtype_of(&two, &DartType::int(), false), AbstractBool::True);
            let half = l.constant(ConstantValue::Double(0.5));
            assert_eq!(l.is_subtype_of(&half, &DartType::int(), false), AbstractBool::False);
            assert_eq!(l.is_subtype_of(&half, &DartType::num(), false), AbstractBool::True);
            assert_eq!(
                l.is_subtype_of(&l.nothing(), &DartType::num(), false),
                AbstractBool::Nothing
            );
        });
    }

    #[test]
    fn test_generic_check_on_constant_is_maybe() {
        let mut builder = ClassWorld::builder();
        let comparable = builder.add_abstract_class("Comparable", None, &[]);
        let world = builder.build();
        let oracle = InferenceResults::new();
        let constants = ConstantSystem::new();
        let types = TypeMaskSystem::new(&world, &oracle, &constants);
        let l = ConstantPropagationLattice::new(&types, &constants);

        let one = l.constant(ConstantValue::Int(1));
        let num_of_int = DartType::generic(ClassId::NUM, vec![DartType::int()]);
        assert_eq!(l.is_subtype_of(&one, &num_of_int, false), AbstractBool::Maybe);
        let comparable_of_int = DartType::generic(comparable, vec![DartType::int()]);
        assert_eq!(l.is_subtype_of(&one, &comparable_of_int, false), AbstractBool::False);
    }

    #[test]
    fn test_category_queries() {
        with_lattice(|l| {
            assert!(l.is_definitely_num(&l.nothing(), false));
            assert!(l.is_definitely_int(&l.constant(ConstantValue::Double(4.0)), false));
            assert!(!l.is_definitely_num(&l.constant(ConstantValue::Null), false));
            assert!(l.is_definitely_not_num_string_bool(&l.constant(ConstantValue::Null)));
            assert!(l.is_definitely_not_non_integer_double(&l.constant(ConstantValue::Double(4.0))));
            assert!(!l.is_definitely_not_non_integer_double(&l.constant(ConstantValue::Double(4.5))));
            assert!(!l.is_definitely_not_non_integer_double(&l.non_constant(l.types().num_type())));
        });
    }

    fn arb_value() -> impl Strategy<Value = (u8, i8, u8, bool)> {
        (0u8..3, any::<i8>(), 0u8..16, any::<bool>())
    }

    fn materialize(l: &ConstantPropagationLattice<'_>, (kind, n, classes, nullable): (u8, i8, u8, bool)) -> AbstractValue {
        match kind {
            0 => l.nothing(),
            1 => l.constant(ConstantValue::Int(i64::from(n % 3))),
            _ => {
                let pool = [ClassId::BOOL, ClassId::INT, ClassId::DOUBLE, ClassId::STRING];
                let picked = pool
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| classes & (1 << i) != 0)
                    .map(|(_, c)| *c);
                l.non_constant(TypeMask::from_classes(picked, nullable))
            }
        }
    }

    proptest! {
        #[test]
        fn prop_join_is_commutative(a in arb_value(), b in arb_value()) {
            with_lattice(|l| {
                let (a, b) = (materialize(l, a), materialize(l, b));
                prop_assert_eq!(l.join(&a, &b), l.join(&b, &a));
                Ok(())
            })?;
        }

        #[test]
        fn prop_join_identity_and_idempotence(a in arb_value()) {
            with_lattice(|l| {
                let a = materialize(l, a);
                prop_assert_eq!(l.join(&l.nothing(), &a), a.clone());
                prop_assert_eq!(l.join(&a, &a), a);
                Ok(())
            })?;
        }

        #[test]
        fn prop_join_is_an_upper_bound(a in arb_value(), b in arb_value()) {
            with_lattice(|l| {
                let (a, b) = (materialize(l, a), materialize(l, b));
                let j = l.join(&a, &b);
                prop_assert!(j.kind() >= a.kind());
                prop_assert!(j.kind() >= b.kind());
                prop_assert_eq!(l.join(&j, &a), j.clone());
                Ok(())
            })?;
        }

        #[test]
        fn prop_join_is_associative(a in arb_value(), b in arb_value(), c in arb_value()) {
            with_lattice(|l| {
                let (a, b, c) = (materialize(l, a), materialize(l, b), materialize(l, c));
                prop_assert_eq!(l.join(&l.join(&a, &b), &c), l.join(&a, &l.join(&b, &c)));
                Ok(())
            })?;
        }
    }
}
