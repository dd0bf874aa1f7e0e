//! Protocol asset requirements.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::category::ResourceCategory;

/// Restricts where a matching instance may be located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationConstraint {
    /// The instance must sit at exactly this location.
    Exact(String),
    /// The instance must sit at one of these locations.
    AnyOf(BTreeSet<String>),
}

impl LocationConstraint {
    /// Whether an instance at `location` satisfies the constraint. An instance
    /// with no recorded location never satisfies a constraint.
    pub fn admits(&self, location: Option<&str>) -> bool {
        match (self, location) {
            (_, None) => false,
            (Self::Exact(expected), Some(loc)) => expected == loc,
            (Self::AnyOf(allowed), Some(loc)) => allowed.contains(loc),
        }
    }
}

fn default_cardinality() -> usize {
    1
}

fn deserialize_cardinality<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = usize::deserialize(deserializer)?;
    if value == 0 {
        return Err(serde::de::Error::custom("cardinality must be >= 1"));
    }
    Ok(value)
}

/// A protocol's declared need for `cardinality` distinct instances of a category.
///
/// Immutable once the protocol version is published; the builder methods exist for
/// constructing definitions, not for editing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRequirement {
    pub name: String,
    /// `None` means this is not a typed-resource requirement, unless `type_hint`
    /// resolves through the taxonomy.
    #[serde(default)]
    pub required_category: Option<ResourceCategory>,
    /// Declared class identifier, resolved through `category_of` when no category is given.
    #[serde(default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(
        default = "default_cardinality",
        deserialize_with = "deserialize_cardinality"
    )]
    pub cardinality: usize,
    #[serde(default)]
    pub min_capacity: Option<f64>,
    #[serde(default)]
    pub location_constraints: Option<LocationConstraint>,
}

impl AssetRequirement {
    /// A mandatory requirement for one instance of `category`.
    pub fn new(name: impl Into<String>, category: ResourceCategory) -> Self {
        Self {
            name: name.into(),
            required_category: Some(category),
            type_hint: None,
            optional: false,
            cardinality: 1,
            min_capacity: None,
            location_constraints: None,
        }
    }

    /// A requirement that is not a typed resource (a parameter, a file, ...).
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            required_category: None,
            ..Self::new(name, ResourceCategory::Plate)
        }
    }

    /// A requirement declared by class identifier, to be classified by the taxonomy.
    pub fn from_type_hint(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self {
            type_hint: Some(type_hint.into()),
            ..Self::untyped(name)
        }
    }

    /// # Panics
    ///
    /// Panics if `cardinality` is 0.
    pub fn with_cardinality(mut self, cardinality: usize) -> Self {
        assert!(cardinality > 0, "cardinality must be >= 1");
        self.cardinality = cardinality;
        self
    }

    pub fn with_min_capacity(mut self, min_capacity: f64) -> Self {
        self.min_capacity = Some(min_capacity);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location_constraints = Some(LocationConstraint::Exact(location.into()));
        self
    }

    pub fn at_any_location<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.location_constraints = Some(LocationConstraint::AnyOf(
            locations.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Whether this requirement asks for a typed resource at all.
    pub fn is_typed(&self) -> bool {
        self.required_category.is_some() || self.type_hint.is_some()
    }
}
