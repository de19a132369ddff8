//! Closed-world class hierarchy
//!
//! The hierarchy is a directed graph with an edge from every class to each
//! of its direct supertypes (superclass and implemented interfaces). Once
//! built, the world precomputes for each class its transitive supertypes
//! and the concrete classes below it, so type-mask queries are set
//! operations.
//!
//! The core library is always present. Because the back end represents all
//! numbers as JS numbers, `int` implements `double`: every integral number
//! passes an `is double` check, and the exact `double` class stands for the
//! non-integral numbers only.

use crate::type_mask::TypeMask;
use indexmap::IndexSet;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use typeprop_ir::ClassId;

/// A class declaration as handed to [`ClassWorldBuilder`]
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    /// Abstract classes have no instances of their own
    pub is_abstract: bool,
    pub type_parameters: usize,
}

/// Collects class declarations; [`ClassWorldBuilder::build`] closes the world
#[derive(Debug, Clone)]
pub struct ClassWorldBuilder {
    classes: Vec<ClassInfo>,
}

impl ClassWorldBuilder {
    /// A builder already holding the core classes at their reserved ids
    pub fn new() -> Self {
        let mut builder = Self { classes: Vec::new() };
        let core = |name: &str, superclass: Option<ClassId>, interfaces: Vec<ClassId>, is_abstract: bool| ClassInfo {
            name: name.to_string(),
            superclass,
            interfaces,
            is_abstract,
            type_parameters: 0,
        };
        let object = Some(ClassId::OBJECT);
        builder.classes.push(core("Object", None, vec![], true));
        builder.classes.push(core("Null", object, vec![], true));
        builder.classes.push(core("bool", object, vec![], false));
        builder.classes.push(core("num", object, vec![], true));
        builder.classes.push(core("int", Some(ClassId::NUM), vec![ClassId::DOUBLE], false));
        builder.classes.push(core("double", Some(ClassId::NUM), vec![], false));
        builder.classes.push(core("String", object, vec![], false));
        builder.classes.push(core("Function", object, vec![], true));
        debug_assert_eq!(builder.classes.len() as u32, ClassId::CORE_COUNT);
        builder
    }

    fn push(&mut self, info: ClassInfo) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(info);
        id
    }

    /// Adds an instantiated class extending `superclass` (or `Object`)
    pub fn add_class(&mut self, name: &str, superclass: Option<ClassId>, interfaces: &[ClassId]) -> ClassId {
        self.push(ClassInfo {
            name: name.to_string(),
            superclass: Some(superclass.unwrap_or(ClassId::OBJECT)),
            interfaces: interfaces.to_vec(),
            is_abstract: false,
            type_parameters: 0,
        })
    }

    /// Adds a class that is never instantiated itself
    pub fn add_abstract_class(&mut self, name: &str, superclass: Option<ClassId>, interfaces: &[ClassId]) -> ClassId {
        self.push(ClassInfo {
            name: name.to_string(),
            superclass: Some(superclass.unwrap_or(ClassId::OBJECT)),
            interfaces: interfaces.to_vec(),
            is_abstract: true,
            type_parameters: 0,
        })
    }

    /// Adds an instantiated class taking `type_parameters` type arguments
    pub fn add_generic_class(&mut self, name: &str, superclass: Option<ClassId>, type_parameters: usize) -> ClassId {
        self.push(ClassInfo {
            name: name.to_string(),
            superclass: Some(superclass.unwrap_or(ClassId::OBJECT)),
            interfaces: Vec::new(),
            is_abstract: false,
            type_parameters,
        })
    }

    /// Closes the world, computing supertypes and subtype masks by a
    /// depth-first walk from every class
    pub fn build(self) -> ClassWorld {
        let mut hierarchy: DiGraph<ClassId, ()> = DiGraph::with_capacity(self.classes.len(), self.classes.len());
        for i in 0..self.classes.len() {
            hierarchy.add_node(ClassId(i as u32));
        }
        for (i, info) in self.classes.iter().enumerate() {
            let sub = NodeIndex::new(i);
            for sup in info.superclass.iter().chain(info.interfaces.iter()) {
                hierarchy.add_edge(sub, NodeIndex::new(sup.index()), ());
            }
        }

        let mut supertypes: Vec<IndexSet<ClassId>> = vec![IndexSet::new(); self.classes.len()];
        let mut concrete_subtypes: Vec<Vec<ClassId>> = vec![Vec::new(); self.classes.len()];
        for (i, info) in self.classes.iter().enumerate() {
            let mut dfs = Dfs::new(&hierarchy, NodeIndex::new(i));
            while let Some(node) = dfs.next(&hierarchy) {
                let sup = hierarchy[node];
                supertypes[i].insert(sup);
                if !info.is_abstract {
                    concrete_subtypes[sup.index()].push(ClassId(i as u32));
                }
            }
        }

        let subtype_masks = concrete_subtypes
            .into_iter()
            .map(|classes| TypeMask::from_classes(classes, false))
            .collect::<Vec<_>>();
        let instantiated = TypeMask::from_classes(
            self.classes
                .iter()
                .enumerate()
                .filter(|(_, info)| !info.is_abstract)
                .map(|(i, _)| ClassId(i as u32)),
            false,
        );

        ClassWorld {
            classes: self.classes,
            supertypes,
            subtype_masks,
            instantiated,
        }
    }
}

impl Default for ClassWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable class hierarchy with precomputed subtype relations
#[derive(Debug, Clone)]
pub struct ClassWorld {
    classes: Vec<ClassInfo>,
    supertypes: Vec<IndexSet<ClassId>>,
    subtype_masks: Vec<TypeMask>,
    instantiated: TypeMask,
}

impl ClassWorld {
    /// A world containing only the core classes
    pub fn core() -> Self {
        ClassWorldBuilder::new().build()
    }

    /// A builder for a world with user classes on top of the core ones
    pub fn builder() -> ClassWorldBuilder {
        ClassWorldBuilder::new()
    }

    /// Number of declared classes, core classes included
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Declaration of `class`; `None` for ids from another world
    pub fn info(&self, class: ClassId) -> Option<&ClassInfo> {
        self.classes.get(class.index())
    }

    /// Reflexive, transitive subtype relation over declared classes
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        self.supertypes
            .get(sub.index())
            .is_some_and(|set| set.contains(&sup))
    }

    /// Non-null instances of `class` or any of its subtypes
    pub fn subtype_mask(&self, class: ClassId) -> TypeMask {
        self.subtype_masks
            .get(class.index())
            .cloned()
            .unwrap_or_default()
    }

    /// Every instantiated class, plus `null`
    pub fn dynamic_mask(&self) -> TypeMask {
        self.instantiated.nullable()
    }
}

impl Default for ClassWorld {
    fn default() -> Self {
        Self::core()
    }
}
