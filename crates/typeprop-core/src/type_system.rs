//! Type-mask queries backed by the whole-program inference oracle

use crate::constant_system::ConstantSystem;
use crate::lattice::AbstractBool;
use crate::type_mask::TypeMask;
use crate::world::ClassWorld;
use std::collections::HashMap;
use typeprop_ir::{BuiltinResult, ClassId, ConstantValue, DartType, ElementId, Selector};

/// Guaranteed types computed by the whole-program inference.
///
/// `None` means the inference has no information; callers must then assume
/// any value.
pub trait TypeOracle {
    fn parameter_type(&self, parameter: ElementId) -> Option<TypeMask>;

    fn field_type(&self, field: ElementId) -> Option<TypeMask>;

    fn return_type(&self, function: ElementId) -> Option<TypeMask>;

    /// Return type of a dynamic call of `selector` on a receiver in `receiver`
    fn selector_return_type(&self, selector: &Selector, receiver: &TypeMask) -> Option<TypeMask>;
}

/// Map-backed inference results, filled in by the inference stage
#[derive(Debug, Clone, Default)]
pub struct InferenceResults {
    parameters: HashMap<ElementId, TypeMask>,
    fields: HashMap<ElementId, TypeMask>,
    returns: HashMap<ElementId, TypeMask>,
    selectors: HashMap<String, TypeMask>,
}

impl InferenceResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, parameter: ElementId, mask: TypeMask) -> Self {
        self.parameters.insert(parameter, mask);
        self
    }

    pub fn with_field(mut self, field: ElementId, mask: TypeMask) -> Self {
        self.fields.insert(field, mask);
        self
    }

    pub fn with_return(mut self, function: ElementId, mask: TypeMask) -> Self {
        self.returns.insert(function, mask);
        self
    }

    /// Records the return type of every target of `selector`
    pub fn with_selector(mut self, selector: &str, mask: TypeMask) -> Self {
        self.selectors.insert(selector.to_string(), mask);
        self
    }
}

impl TypeOracle for InferenceResults {
    fn parameter_type(&self, parameter: ElementId) -> Option<TypeMask> {
        self.parameters.get(&parameter).cloned()
    }

    fn field_type(&self, field: ElementId) -> Option<TypeMask> {
        self.fields.get(&field).cloned()
    }

    fn return_type(&self, function: ElementId) -> Option<TypeMask> {
        self.returns.get(&function).cloned()
    }

    fn selector_return_type(&self, selector: &Selector, _receiver: &TypeMask) -> Option<TypeMask> {
        self.selectors.get(&selector.name).cloned()
    }
}

/// Answers type questions about masks in the context of one class world
pub struct TypeMaskSystem<'a> {
    world: &'a ClassWorld,
    oracle: &'a dyn TypeOracle,
    constant_system: &'a ConstantSystem,
    dynamic_type: TypeMask,
    bool_type: TypeMask,
    int_type: TypeMask,
    num_type: TypeMask,
    string_type: TypeMask,
    exact_double_type: TypeMask,
    num_string_bool_type: TypeMask,
}

impl<'a> TypeMaskSystem<'a> {
    pub fn new(world: &'a ClassWorld, oracle: &'a dyn TypeOracle, constant_system: &'a ConstantSystem) -> Self {
        let num_type = world.subtype_mask(ClassId::NUM);
        let string_type = world.subtype_mask(ClassId::STRING);
        let bool_type = world.subtype_mask(ClassId::BOOL);
        let num_string_bool_type = num_type.union(&string_type).union(&bool_type);
        Self {
            world,
            oracle,
            constant_system,
            dynamic_type: world.dynamic_mask(),
            int_type: world.subtype_mask(ClassId::INT),
            exact_double_type: TypeMask::exact(ClassId::DOUBLE),
            num_type,
            string_type,
            bool_type,
            num_string_bool_type,
        }
    }

    pub fn world(&self) -> &'a ClassWorld {
        self.world
    }

    pub fn dynamic_type(&self) -> TypeMask {
        self.dynamic_type.clone()
    }

    pub fn bool_type(&self) -> TypeMask {
        self.bool_type.clone()
    }

    pub fn int_type(&self) -> TypeMask {
        self.int_type.clone()
    }

    pub fn num_type(&self) -> TypeMask {
        self.num_type.clone()
    }

    pub fn string_type(&self) -> TypeMask {
        self.string_type.clone()
    }

    pub fn null_type(&self) -> TypeMask {
        TypeMask::null()
    }

    /// Non-integral numbers only
    pub fn exact_double_type(&self) -> TypeMask {
        self.exact_double_type.clone()
    }

    pub fn builtin_result_type(&self, result: BuiltinResult) -> TypeMask {
        match result {
            BuiltinResult::Number => self.num_type(),
            BuiltinResult::Integer => self.int_type(),
            BuiltinResult::Boolean => self.bool_type(),
            BuiltinResult::String => self.string_type(),
        }
    }

    // ---------------------------------------------------------------------
    // Oracle queries
    // ---------------------------------------------------------------------

    /// Type of a function parameter; parameters unknown to the inference
    /// (and continuation parameters) may hold anything
    pub fn get_parameter_type(&self, parameter: Option<ElementId>) -> TypeMask {
        parameter
            .and_then(|p| self.oracle.parameter_type(p))
            .unwrap_or_else(|| self.dynamic_type())
    }

    pub fn get_field_type(&self, field: ElementId) -> TypeMask {
        self.oracle.field_type(field).unwrap_or_else(|| self.dynamic_type())
    }

    pub fn get_return_type(&self, function: ElementId) -> TypeMask {
        self.oracle.return_type(function).unwrap_or_else(|| self.dynamic_type())
    }

    /// Return type of a dynamic call. `==` always produces a non-null bool.
    pub fn get_invoke_return_type(&self, selector: &Selector, receiver: &TypeMask) -> TypeMask {
        if let Some(mask) = self.oracle.selector_return_type(selector, receiver) {
            return mask;
        }
        if selector.is_operator() && selector.name == "==" {
            return self.bool_type();
        }
        self.dynamic_type()
    }

    /// Exact mask of a constant; integral doubles count as `int`
    pub fn get_type_of(&self, constant: &ConstantValue) -> TypeMask {
        if constant.is_null() {
            TypeMask::null()
        } else {
            TypeMask::exact(self.constant_system.runtime_class(constant))
        }
    }

    // ---------------------------------------------------------------------
    // Mask algebra and predicates
    // ---------------------------------------------------------------------

    /// Least upper bound of two masks
    pub fn join(&self, a: &TypeMask, b: &TypeMask) -> TypeMask {
        a.union(b)
    }

    pub fn intersection(&self, a: &TypeMask, b: &TypeMask) -> TypeMask {
        a.intersection(b)
    }

    fn is_definitely(&self, mask: &TypeMask, category: &TypeMask, allow_null: bool) -> bool {
        (allow_null || !mask.is_nullable()) && mask.classes_within(category)
    }

    /// True if every value in `mask` is a bool. `allow_null` admits a
    /// nullable mask.
    pub fn is_definitely_bool(&self, mask: &TypeMask, allow_null: bool) -> bool {
        self.is_definitely(mask, &self.bool_type, allow_null)
    }

    /// Like [`Self::is_definitely_bool`] for numbers
    pub fn is_definitely_num(&self, mask: &TypeMask, allow_null: bool) -> bool {
        self.is_definitely(mask, &self.num_type, allow_null)
    }

    /// Like [`Self::is_definitely_bool`] for integers
    pub fn is_definitely_int(&self, mask: &TypeMask, allow_null: bool) -> bool {
        self.is_definitely(mask, &self.int_type, allow_null)
    }

    /// Like [`Self::is_definitely_bool`] for strings
    pub fn is_definitely_string(&self, mask: &TypeMask, allow_null: bool) -> bool {
        self.is_definitely(mask, &self.string_type, allow_null)
    }

    /// True if every value is a num, string or bool. These are the values
    /// the back end compares with JS `==` directly.
    pub fn is_definitely_num_string_bool(&self, mask: &TypeMask, allow_null: bool) -> bool {
        self.is_definitely(mask, &self.num_string_bool_type, allow_null)
    }

    /// True if the mask holds no num, string or bool (null is allowed)
    pub fn is_definitely_not_num_string_bool(&self, mask: &TypeMask) -> bool {
        !mask.shares_class_with(&self.num_string_bool_type)
    }

    /// True if no value in `mask` is a number with a fractional part
    pub fn is_definitely_not_non_integer_double(&self, mask: &TypeMask) -> bool {
        self.are_disjoint(mask, &self.exact_double_type)
    }

    /// True if no runtime value is in both masks. `null` only counts as a
    /// shared value when both masks are nullable.
    pub fn are_disjoint(&self, a: &TypeMask, b: &TypeMask) -> bool {
        !a.shares_class_with(b) && !(a.is_nullable() && b.is_nullable())
    }

    /// Decides whether every value in `mask` passes a check against `ty`.
    ///
    /// `allow_null` makes `null` pass (as in a cast). Generic types with
    /// type arguments, type variables and function types are only ever
    /// answered with `Maybe`, except that a mask disjoint from the class
    /// cannot pass any parameterization of it.
    pub fn is_subtype_of(&self, mask: &TypeMask, ty: &DartType, allow_null: bool) -> AbstractBool {
        // Top types accept every value, `null` included.
        if ty.accepts_everything() {
            return AbstractBool::True;
        }
        let DartType::Interface { class, .. } = ty else {
            return AbstractBool::Maybe;
        };
        let type_mask = if *class == ClassId::NULL {
            TypeMask::null()
        } else if allow_null {
            self.world.subtype_mask(*class).nullable()
        } else {
            self.world.subtype_mask(*class)
        };
        if self.are_disjoint(mask, &type_mask) {
            return AbstractBool::False;
        }
        if !ty.treat_as_raw() {
            return AbstractBool::Maybe;
        }
        if type_mask.contains_mask(mask) {
            return AbstractBool::True;
        }
        AbstractBool::Maybe
    }
}
