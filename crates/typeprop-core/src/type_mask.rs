//! Approximate types: a set of concrete runtime classes plus nullability

use smallvec::SmallVec;
use std::fmt;
use typeprop_ir::ClassId;

/// Set of runtime classes a value may be an instance of.
///
/// The class list holds only instantiated (concrete) classes and is kept
/// sorted and free of duplicates, so structural equality is set equality.
/// `null` is tracked by the `nullable` flag rather than as a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeMask {
    classes: SmallVec<[ClassId; 4]>,
    nullable: bool,
}

impl TypeMask {
    /// The mask of no value at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// The mask containing only `null`
    pub fn null() -> Self {
        Self {
            classes: SmallVec::new(),
            nullable: true,
        }
    }

    /// Non-null instances of exactly `class`
    pub fn exact(class: ClassId) -> Self {
        let mut classes = SmallVec::new();
        classes.push(class);
        Self {
            classes,
            nullable: false,
        }
    }

    pub fn from_classes(classes: impl IntoIterator<Item = ClassId>, nullable: bool) -> Self {
        let mut classes: SmallVec<[ClassId; 4]> = classes.into_iter().collect();
        classes.sort_unstable();
        classes.dedup();
        Self { classes, nullable }
    }

    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && !self.nullable
    }

    /// True if the only possible value is `null`
    pub fn is_null(&self) -> bool {
        self.classes.is_empty() && self.nullable
    }

    pub fn nullable(&self) -> Self {
        Self {
            classes: self.classes.clone(),
            nullable: true,
        }
    }

    pub fn non_nullable(&self) -> Self {
        Self {
            classes: self.classes.clone(),
            nullable: false,
        }
    }

    pub fn contains_class(&self, class: ClassId) -> bool {
        self.classes.binary_search(&class).is_ok()
    }

    pub fn union(&self, other: &TypeMask) -> TypeMask {
        let mut classes = SmallVec::with_capacity(self.classes.len() + other.classes.len());
        let (mut i, mut j) = (0, 0);
        while i < self.classes.len() && j < other.classes.len() {
            let (a, b) = (self.classes[i], other.classes[j]);
            if a < b {
                classes.push(a);
                i += 1;
            } else if b < a {
                classes.push(b);
                j += 1;
            } else {
                classes.push(a);
                i += 1;
                j += 1;
            }
        }
        classes.extend_from_slice(&self.classes[i..]);
        classes.extend_from_slice(&other.classes[j..]);
        TypeMask {
            classes,
            nullable: self.nullable || other.nullable,
        }
    }

    pub fn intersection(&self, other: &TypeMask) -> TypeMask {
        let classes = self
            .classes
            .iter()
            .copied()
            .filter(|c| other.contains_class(*c))
            .collect();
        TypeMask {
            classes,
            nullable: self.nullable && other.nullable,
        }
    }

    /// True if every class of `self` is a class of `other` (nullability
    /// not considered)
    pub fn classes_within(&self, other: &TypeMask) -> bool {
        self.classes.iter().all(|c| other.contains_class(*c))
    }

    /// True if `other` describes a subset of the values `self` describes
    pub fn contains_mask(&self, other: &TypeMask) -> bool {
        other.classes_within(self) && (self.nullable || !other.nullable)
    }

    pub fn shares_class_with(&self, other: &TypeMask) -> bool {
        self.classes.iter().any(|c| other.contains_class(*c))
    }
}

impl fmt::Display for TypeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("[empty]");
        }
        if self.is_null() {
            return f.write_str("[null]");
        }
        f.write_str("[")?;
        for (i, class) in self.classes.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{class}")?;
        }
        f.write_str("]")?;
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_merges_sorted() {
        let a = TypeMask::from_classes([ClassId::STRING, ClassId::INT], false);
        let b = TypeMask::from_classes([ClassId::DOUBLE, ClassId::INT], true);
        let u = a.union(&b);
        assert_eq!(u.classes(), &[ClassId::INT, ClassId::DOUBLE, ClassId::STRING]);
        assert!(u.is_nullable());
        assert_eq!(u, b.union(&a));
    }

    #[test]
    fn test_intersection_and_nullability() {
        let a = TypeMask::from_classes([ClassId::INT, ClassId::DOUBLE], true);
        let b = TypeMask::exact(ClassId::INT).nullable();
        let i = a.intersection(&b);
        assert_eq!(i, TypeMask::exact(ClassId::INT).nullable());
        assert!(TypeMask::exact(ClassId::INT).intersection(&TypeMask::null()).is_empty());
    }

    #[test]
    fn test_contains_mask() {
        let num = TypeMask::from_classes([ClassId::INT, ClassId::DOUBLE], false);
        assert!(num.contains_mask(&TypeMask::exact(ClassId::INT)));
        assert!(!num.contains_mask(&TypeMask::exact(ClassId::INT).nullable()));
        assert!(num.nullable().contains_mask(&TypeMask::null()));
        assert!(num.contains_mask(&TypeMask::empty()));
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeMask::empty().to_string(), "[empty]");
        assert_eq!(TypeMask::null().to_string(), "[null]");
        let m = TypeMask::from_classes([ClassId::DOUBLE, ClassId::INT], true);
        assert_eq!(m.to_string(), "[int|double]?");
    }
}
