//! Stable identifiers used throughout the IR

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in a [`crate::Graph`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A declared class in the closed world.
///
/// The first few ids are reserved for the core library classes so that the
/// IR can name them without access to the class world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const OBJECT: ClassId = ClassId(0);
    pub const NULL: ClassId = ClassId(1);
    pub const BOOL: ClassId = ClassId(2);
    pub const NUM: ClassId = ClassId(3);
    pub const INT: ClassId = ClassId(4);
    pub const DOUBLE: ClassId = ClassId(5);
    pub const STRING: ClassId = ClassId(6);
    pub const FUNCTION: ClassId = ClassId(7);

    /// Number of reserved core class ids
    pub const CORE_COUNT: u32 = 8;

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_core(self) -> bool {
        self.0 < Self::CORE_COUNT
    }

    /// Source name of a core class, `None` for user classes
    pub fn core_name(self) -> Option<&'static str> {
        match self {
            ClassId::OBJECT => Some("Object"),
            ClassId::NULL => Some("Null"),
            ClassId::BOOL => Some("bool"),
            ClassId::NUM => Some("num"),
            ClassId::INT => Some("int"),
            ClassId::DOUBLE => Some("double"),
            ClassId::STRING => Some("String"),
            ClassId::FUNCTION => Some("Function"),
            _ => None,
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.core_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "C{}", self.0),
        }
    }
}

/// A program element (function, field or parameter) known to the
/// whole-program inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_class_names() {
        assert_eq!(ClassId::INT.to_string(), "int");
        assert_eq!(ClassId::STRING.to_string(), "String");
        assert_eq!(ClassId(12).to_string(), "C12");
        assert!(ClassId::FUNCTION.is_core());
        assert!(!ClassId(ClassId::CORE_COUNT).is_core());
    }
}
