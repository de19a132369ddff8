//! Choice of builtin operators for dynamic operator calls

use crate::lattice::{AbstractValue, ConstantPropagationLattice};
use smallvec::smallvec;
use typeprop_ir::{BuiltinOperator, NodeId, Operands, Selector};

/// Arithmetic and comparison operators valid on any two numbers
const NUMERIC_BINARY: &[(&str, BuiltinOperator)] = &[
    ("+", BuiltinOperator::NumAdd),
    ("-", BuiltinOperator::NumSubtract),
    ("*", BuiltinOperator::NumMultiply),
    ("/", BuiltinOperator::NumDivide),
    ("<", BuiltinOperator::NumLt),
    ("<=", BuiltinOperator::NumLe),
    (">", BuiltinOperator::NumGt),
    (">=", BuiltinOperator::NumGe),
];

/// Operators that agree with their JS counterparts only on integers
const BITWISE_BINARY: &[(&str, BuiltinOperator)] = &[
    ("&", BuiltinOperator::NumAnd),
    ("|", BuiltinOperator::NumOr),
    ("^", BuiltinOperator::NumXor),
    ("<<", BuiltinOperator::NumShl),
    (">>", BuiltinOperator::NumShr),
];

const NUMERIC_UNARY: &[(&str, BuiltinOperator)] = &[("unary-", BuiltinOperator::NumNegate)];

const BITWISE_UNARY: &[(&str, BuiltinOperator)] = &[("~", BuiltinOperator::NumBitNot)];

fn lookup(table: &[(&str, BuiltinOperator)], name: &str) -> Option<BuiltinOperator> {
    table.iter().find(|(n, _)| *n == name).map(|(_, op)| *op)
}

/// A dynamic call operand: the node and what the analysis knows about it
pub(crate) type Operand<'v> = (NodeId, &'v AbstractValue);

/// Picks a builtin operator that computes the same result as the dynamic
/// call `receiver.selector(arguments)`, and the operands to apply it to.
pub(crate) fn specialize_operator(
    lattice: &ConstantPropagationLattice<'_>,
    selector: &Selector,
    receiver: Operand<'_>,
    arguments: &[Operand<'_>],
) -> Option<(BuiltinOperator, Operands)> {
    if !selector.is_operator() {
        return None;
    }
    if receiver.1.is_nothing() || arguments.iter().any(|(_, v)| v.is_nothing()) {
        return None;
    }
    let name = selector.name.as_str();
    match arguments {
        [] => {
            let value = receiver.1;
            if !lattice.is_definitely_num(value, false) {
                return None;
            }
            if let Some(op) = lookup(NUMERIC_UNARY, name) {
                return Some((op, smallvec![receiver.0]));
            }
            let op = lookup(BITWISE_UNARY, name)?;
            lattice
                .is_definitely_not_non_integer_double(value)
                .then(|| (op, smallvec![receiver.0]))
        }
        [argument] => {
            if name == "==" {
                return specialize_equality(lattice, receiver, *argument);
            }
            let operands: Operands = smallvec![receiver.0, argument.0];
            let (left, right) = (receiver.1, argument.1);
            if name == "+" && lattice.is_definitely_string(left, false) && lattice.is_definitely_string(right, false) {
                return Some((BuiltinOperator::StringConcatenate, operands));
            }
            if !lattice.is_definitely_num(left, false) || !lattice.is_definitely_num(right, false) {
                return None;
            }
            if let Some(op) = lookup(NUMERIC_BINARY, name) {
                return Some((op, operands));
            }
            let op = lookup(BITWISE_BINARY, name)?;
            let integral =
                lattice.is_definitely_not_non_integer_double(left) && lattice.is_definitely_not_non_integer_double(right);
            integral.then_some((op, operands))
        }
        _ => None,
    }
}

/// Rules for `==`, in order of preference:
///
/// 1. comparison with the null constant of a value that is never a num,
///    string or bool is a falsy check, since every other value is truthy;
/// 2. two primitives that are not both nullable compare with `===`;
/// 3. two nullable primitives of the same category compare with `==`,
///    which equates null only with null for them.
fn specialize_equality(
    lattice: &ConstantPropagationLattice<'_>,
    left: Operand<'_>,
    right: Operand<'_>,
) -> Option<(BuiltinOperator, Operands)> {
    if left.1.is_null_constant() && lattice.is_definitely_not_num_string_bool(right.1) {
        return Some((BuiltinOperator::IsFalsy, smallvec![right.0]));
    }
    if right.1.is_null_constant() && lattice.is_definitely_not_num_string_bool(left.1) {
        return Some((BuiltinOperator::IsFalsy, smallvec![left.0]));
    }

    let (l, r) = (left.1, right.1);
    let operands: Operands = smallvec![left.0, right.0];
    if lattice.is_definitely_num_string_bool(l, true)
        && lattice.is_definitely_num_string_bool(r, true)
        && !(l.is_nullable() && r.is_nullable())
    {
        return Some((BuiltinOperator::StrictEq, operands));
    }

    let same_category = (lattice.is_definitely_num(l, true) && lattice.is_definitely_num(r, true))
        || (lattice.is_definitely_string(l, true) && lattice.is_definitely_string(r, true))
        || (lattice.is_definitely_bool(l, true) && lattice.is_definitely_bool(r, true));
    same_category.then_some((BuiltinOperator::LooseEq, operands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant_system::ConstantSystem;
    use crate::type_mask::TypeMask;
    use crate::type_system::{InferenceResults, TypeMaskSystem};
    use crate::world::ClassWorld;
    use typeprop_ir::{ClassId, ConstantValue};

    const A: NodeId = NodeId(1);
    const B: NodeId = NodeId(2);

    fn with_lattice(f: impl FnOnce(&ConstantPropagationLattice<'_>)) {
        let world = ClassWorld::core();
        let oracle = InferenceResults::new();
        let constants = ConstantSystem::new();
        let types = TypeMaskSystem::new(&world, &oracle, &constants);
        f(&ConstantPropagationLattice::new(&types, &constants));
    }

    fn binary(
        l: &ConstantPropagationLattice<'_>,
        name: &str,
        left: &AbstractValue,
        right: &AbstractValue,
    ) -> Option<BuiltinOperator> {
        specialize_operator(l, &Selector::operator(name), (A, left), &[(B, right)]).map(|(op, _)| op)
    }

    #[test]
    fn test_numeric_operators() {
        with_lattice(|l| {
            let num = l.non_constant(l.types().num_type());
            let int = l.non_constant(l.types().int_type());
            assert_eq!(binary(l, "+", &num, &int), Some(BuiltinOperator::NumAdd));
            assert_eq!(binary(l, "<", &num, &num), Some(BuiltinOperator::NumLt));
            assert_eq!(binary(l, "&", &int, &int), Some(BuiltinOperator::NumAnd));
            assert_eq!(binary(l, "&", &num, &int), None);
            assert_eq!(binary(l, "~/", &int, &int), None);
            let nullable = l.non_constant(l.types().num_type().nullable());
            assert_eq!(binary(l, "+", &nullable, &int), None);
        });
    }

    #[test]
    fn test_string_plus() {
        with_lattice(|l| {
            let s = l.non_constant(l.types().string_type());
            assert_eq!(binary(l, "+", &s, &s), Some(BuiltinOperator::StringConcatenate));
            assert_eq!(binary(l, "-", &s, &s), None);
        });
    }

    #[test]
    fn test_unary_operators() {
        with_lattice(|l| {
            let num = l.non_constant(l.types().num_type());
            let int = l.non_constant(l.types().int_type());
            let negate = specialize_operator(l, &Selector::operator("unary-"), (A, &num), &[]);
            assert_eq!(negate, Some((BuiltinOperator::NumNegate, smallvec![A])));
            assert!(specialize_operator(l, &Selector::operator("~"), (A, &num), &[]).is_none());
            assert!(specialize_operator(l, &Selector::operator("~"), (A, &int), &[]).is_some());
        });
    }

    #[test]
    fn test_equality_with_null_becomes_falsy_check() {
        let mut builder = ClassWorld::builder();
        let point = builder.add_class("Point", None, &[]);
        let world = builder.build();
        let oracle = InferenceResults::new();
        let constants = ConstantSystem::new();
        let types = TypeMaskSystem::new(&world, &oracle, &constants);
        let l = ConstantPropagationLattice::new(&types, &constants);

        let null = l.constant(ConstantValue::Null);
        let object = l.non_constant(TypeMask::exact(point).nullable());
        let chosen = specialize_operator(&l, &Selector::operator("=="), (A, &object), &[(B, &null)]);
        assert_eq!(chosen, Some((BuiltinOperator::IsFalsy, smallvec![A])));
        let chosen = specialize_operator(&l, &Selector::operator("=="), (A, &null), &[(B, &object)]);
        assert_eq!(chosen, Some((BuiltinOperator::IsFalsy, smallvec![B])));
    }

    #[test]
    fn test_equality_of_primitives() {
        with_lattice(|l| {
            let int = l.non_constant(l.types().int_type());
            let maybe_int = l.non_constant(l.types().int_type().nullable());
            let maybe_string = l.non_constant(l.types().string_type().nullable());
            let string = l.non_constant(l.types().string_type());
            assert_eq!(binary(l, "==", &int, &string), Some(BuiltinOperator::StrictEq));
            assert_eq!(binary(l, "==", &maybe_int, &int), Some(BuiltinOperator::StrictEq));
            assert_eq!(binary(l, "==", &maybe_int, &maybe_int), Some(BuiltinOperator::LooseEq));
            assert_eq!(binary(l, "==", &maybe_int, &maybe_string), None);
            assert_eq!(binary(l, "==", &int, &l.dynamic()), None);
        });
    }

    #[test]
    fn test_unknown_operands_are_left_alone() {
        with_lattice(|l| {
            let int = l.non_constant(l.types().int_type());
            assert_eq!(binary(l, "+", &int, &l.nothing()), None);
            assert!(specialize_operator(l, &Selector::call("add", 1), (A, &int), &[(B, &int)]).is_none());
        });
    }
}
