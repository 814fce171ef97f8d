//! Typed, directed, justified relations between atomic units.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::UnitId;

/// Unique identifier for relations (UUID v4).
pub type RelationId = Uuid;

/// Closed enumeration of relation types.
///
/// Open to extension in source, but persisted tags must always parse back
/// into a variant: arbitrary text is rejected at the validation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Source provides evidence for the target.
    Supports,
    /// Source asserts the opposite of the target.
    Contradicts,
    /// Source builds on and generalizes the target.
    Extends,
    /// Source sharpens or narrows the target.
    Refines,
    /// Source was derived from the target.
    DerivesFrom,
    /// Source presents evidence against the target.
    Refutes,
    /// Source logically implies the target.
    Implies,
}

impl RelationType {
    /// Returns the persisted snake_case tag for this type.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supports => "supports",
            Self::Contradicts => "contradicts",
            Self::Extends => "extends",
            Self::Refines => "refines",
            Self::DerivesFrom => "derives_from",
            Self::Refutes => "refutes",
            Self::Implies => "implies",
        }
    }

    /// Returns all variants as an array.
    #[inline]
    pub fn all() -> [RelationType; 7] {
        [
            Self::Supports,
            Self::Contradicts,
            Self::Extends,
            Self::Refines,
            Self::DerivesFrom,
            Self::Refutes,
            Self::Implies,
        ]
    }

    /// Whether this type participates in lineage tracing by default.
    ///
    /// Lineage follows forward intellectual descent: a unit derives from,
    /// extends or refines its antecedents.
    #[inline]
    pub fn is_lineage(&self) -> bool {
        matches!(self, Self::DerivesFrom | Self::Extends | Self::Refines)
    }

    /// Returns a human-readable description of this relation type.
    #[inline]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Supports => "Source provides evidence for the target",
            Self::Contradicts => "Source asserts the opposite of the target",
            Self::Extends => "Source builds on and generalizes the target",
            Self::Refines => "Source sharpens or narrows the target",
            Self::DerivesFrom => "Source was derived from the target",
            Self::Refutes => "Source presents evidence against the target",
            Self::Implies => "Source logically implies the target",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = CoreError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "supports" => Ok(Self::Supports),
            "contradicts" => Ok(Self::Contradicts),
            "extends" => Ok(Self::Extends),
            "refines" => Ok(Self::Refines),
            "derives_from" => Ok(Self::DerivesFrom),
            "refutes" => Ok(Self::Refutes),
            "implies" => Ok(Self::Implies),
            _ => Err(CoreError::UnknownRelationType {
                tag: tag.to_string(),
            }),
        }
    }
}

/// A directed edge between two units with a required justification.
///
/// The relation graph is a multigraph: there is no uniqueness constraint
/// on `(source_id, target_id, relation_type)`, and cycles are allowed.
///
/// # Example
///
/// ```rust
/// use claim_graph_core::types::{Relation, RelationType};
/// use uuid::Uuid;
///
/// let rel = Relation::new(
///     Uuid::new_v4(),
///     Uuid::new_v4(),
///     RelationType::Contradicts,
///     "competing models",
/// );
/// assert_eq!(rel.relation_type, RelationType::Contradicts);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Unique identifier for this relation.
    pub id: RelationId,

    /// Unit the edge starts at. Must exist at creation time.
    pub source_id: UnitId,

    /// Unit the edge points to. Must exist at creation time.
    pub target_id: UnitId,

    /// Type of relationship.
    #[serde(rename = "type")]
    pub relation_type: RelationType,

    /// Free-text justification for why this relation exists.
    pub reasoning: String,

    /// Timestamp set once at creation.
    pub created_at: DateTime<Utc>,
}

impl Relation {
    /// Create a new relation with a fresh id.
    pub fn new(
        source_id: UnitId,
        target_id: UnitId,
        relation_type: RelationType,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            target_id,
            relation_type,
            reasoning: reasoning.into(),
            created_at: Utc::now(),
        }
    }

    /// Validate relation constraints: the justification must be present.
    pub fn validate(&self) -> CoreResult<()> {
        if self.reasoning.trim().is_empty() {
            return Err(CoreError::validation("reasoning", "must not be empty"));
        }
        Ok(())
    }

    /// Given one endpoint, returns the other. `None` if `id` is neither.
    pub fn other_endpoint(&self, id: UnitId) -> Option<UnitId> {
        if self.source_id == id {
            Some(self.target_id)
        } else if self.target_id == id {
            Some(self.source_id)
        } else {
            None
        }
    }
}
