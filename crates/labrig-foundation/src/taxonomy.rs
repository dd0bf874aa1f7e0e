//! Category resolution against the injected taxonomy.
//!
//! The taxonomy is consulted, never reconstructed: an identifier either has an
//! entry in the [`CategorySource`] or it is a classification gap. Nothing here
//! looks inside identifier strings.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use labrig_kernel::{
    AssetRequirement, CategorySource, ClassificationGapError, GapSubject, ResourceCategory,
    ResourceInstance,
};

/// Fact table mapping class identifiers to categories.
///
/// Typically populated from the output of the class-discovery subsystem.
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomy {
    entries: HashMap<String, ResourceCategory>,
}

impl StaticTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(
        mut self,
        type_identifier: impl Into<String>,
        category: ResourceCategory,
    ) -> Self {
        self.entries.insert(type_identifier.into(), category);
        self
    }

    pub fn insert(&mut self, type_identifier: impl Into<String>, category: ResourceCategory) {
        self.entries.insert(type_identifier.into(), category);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ResourceCategory)> for StaticTaxonomy {
    fn from_iter<I: IntoIterator<Item = (S, ResourceCategory)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl CategorySource for StaticTaxonomy {
    fn category_of(&self, type_identifier: &str) -> Option<ResourceCategory> {
        self.entries.get(type_identifier).copied()
    }
}

/// How a requirement relates to the typed-resource engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementClass {
    Typed(ResourceCategory),
    /// Not a typed-resource requirement; skipped entirely.
    Untyped,
    Gap(ClassificationGapError),
}

/// Resolves categories for requirements and instances.
#[derive(Clone)]
pub struct Taxonomy {
    source: Arc<dyn CategorySource>,
}

impl std::fmt::Debug for Taxonomy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Taxonomy")
            .field("source", &"<category source>")
            .finish()
    }
}

impl Taxonomy {
    pub fn new(source: Arc<dyn CategorySource>) -> Self {
        Self { source }
    }

    pub fn category_of(&self, type_identifier: &str) -> Option<ResourceCategory> {
        self.source.category_of(type_identifier)
    }

    /// An explicit `required_category` always wins; otherwise the declared
    /// `type_hint` is looked up.
    pub fn resolve_requirement(&self, req: &AssetRequirement) -> RequirementClass {
        resolve_requirement_with(Some(self), req)
    }

    /// Fill in missing instance categories from their type identifiers.
    ///
    /// Instances that remain unclassified are removed and reported.
    pub fn classify_instances(
        &self,
        inventory: Vec<ResourceInstance>,
    ) -> (Vec<ResourceInstance>, Vec<ClassificationGapError>) {
        classify_instances_with(Some(self), inventory)
    }
}

pub(crate) fn resolve_requirement_with(
    taxonomy: Option<&Taxonomy>,
    req: &AssetRequirement,
) -> RequirementClass {
    if let Some(category) = req.required_category {
        return RequirementClass::Typed(category);
    }
    let Some(hint) = req.type_hint.as_deref() else {
        return RequirementClass::Untyped;
    };
    match taxonomy.and_then(|t| t.category_of(hint)) {
        Some(category) => RequirementClass::Typed(category),
        None => {
            let gap = ClassificationGapError {
                subject: GapSubject::Requirement(req.name.clone()),
                type_identifier: Some(hint.to_string()),
            };
            warn!(
                requirement = %req.name,
                type_hint = hint,
                "classification gap: requirement excluded"
            );
            RequirementClass::Gap(gap)
        }
    }
}

pub(crate) fn classify_instances_with(
    taxonomy: Option<&Taxonomy>,
    inventory: Vec<ResourceInstance>,
) -> (Vec<ResourceInstance>, Vec<ClassificationGapError>) {
    let mut classified = Vec::with_capacity(inventory.len());
    let mut gaps = Vec::new();

    for mut instance in inventory {
        if instance.category.is_none() {
            instance.category = taxonomy.and_then(|t| t.category_of(&instance.type_identifier));
        }
        if instance.category.is_some() {
            classified.push(instance);
        } else {
            warn!(
                resource_id = %instance.id,
                type_identifier = %instance.type_identifier,
                "classification gap: instance excluded"
            );
            gaps.push(ClassificationGapError {
                subject: GapSubject::Instance(instance.id.clone()),
                type_identifier: Some(instance.type_identifier.clone()),
            });
        }
    }

    (classified, gaps)
}
