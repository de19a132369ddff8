//! Static types as written in type tests and casts

use crate::ids::ClassId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A static (declared) type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DartType {
    Dynamic,
    Void,
    /// A class type, possibly with type arguments
    Interface {
        class: ClassId,
        type_arguments: Vec<DartType>,
    },
    /// A type parameter of the enclosing class or function
    TypeVariable { name: String },
    /// Any function type
    Function,
}

impl DartType {
    pub fn interface(class: ClassId) -> Self {
        DartType::Interface {
            class,
            type_arguments: Vec::new(),
        }
    }

    pub fn generic(class: ClassId, type_arguments: Vec<DartType>) -> Self {
        DartType::Interface { class, type_arguments }
    }

    pub fn type_variable(name: impl Into<String>) -> Self {
        DartType::TypeVariable { name: name.into() }
    }

    pub fn int() -> Self {
        Self::interface(ClassId::INT)
    }

    pub fn double() -> Self {
        Self::interface(ClassId::DOUBLE)
    }

    pub fn num() -> Self {
        Self::interface(ClassId::NUM)
    }

    pub fn string() -> Self {
        Self::interface(ClassId::STRING)
    }

    pub fn bool() -> Self {
        Self::interface(ClassId::BOOL)
    }

    pub fn object() -> Self {
        Self::interface(ClassId::OBJECT)
    }

    pub fn null() -> Self {
        Self::interface(ClassId::NULL)
    }

    pub fn class(&self) -> Option<ClassId> {
        match self {
            DartType::Interface { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, DartType::Dynamic)
    }

    pub fn is_object(&self) -> bool {
        self.class() == Some(ClassId::OBJECT)
    }

    pub fn is_null(&self) -> bool {
        self.class() == Some(ClassId::NULL)
    }

    pub fn is_int(&self) -> bool {
        self.class() == Some(ClassId::INT)
    }

    pub fn is_type_variable(&self) -> bool {
        matches!(self, DartType::TypeVariable { .. })
    }

    /// True if instances can be checked against the class alone, i.e. there
    /// are no type arguments or every type argument is `dynamic`
    pub fn treat_as_raw(&self) -> bool {
        match self {
            DartType::Interface { type_arguments, .. } => type_arguments.iter().all(DartType::is_dynamic),
            _ => true,
        }
    }

    /// True for `dynamic`, `void` and `Object`: every value passes a check
    /// against such a type
    pub fn accepts_everything(&self) -> bool {
        matches!(self, DartType::Dynamic | DartType::Void) || self.is_object()
    }
}

impl fmt::Display for DartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DartType::Dynamic => f.write_str("dynamic"),
            DartType::Void => f.write_str("void"),
            DartType::Interface { class, type_arguments } => {
                write!(f, "{class}")?;
                if !type_arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in type_arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            DartType::TypeVariable { name } => f.write_str(name),
            DartType::Function => f.write_str("Function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treat_as_raw() {
        assert!(DartType::int().treat_as_raw());
        assert!(DartType::generic(ClassId(9), vec![DartType::Dynamic]).treat_as_raw());
        assert!(!DartType::generic(ClassId(9), vec![DartType::int()]).treat_as_raw());
    }

    #[test]
    fn test_display_generic() {
        let ty = DartType::generic(ClassId(9), vec![DartType::int(), DartType::type_variable("T")]);
        assert_eq!(ty.to_string(), "C9<int,T>");
    }
}
