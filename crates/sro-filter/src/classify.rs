//! Ownership classification
//!
//! Decides whether an object *is* a composite resource or is *owned* by one.
//! Composite detection is a chain of checks ordered by decreasing
//! reliability; the first check that reaches a verdict wins.
//!
//! | Tier        | Signal                                         | Verdict |
//! |-------------|------------------------------------------------|---------|
//! | `kind`      | type metadata kind equals the composite kind   | yes     |
//! | `type`      | type descriptor resolves to the composite kind | yes     |
//! | `owned`     | object is owned by a composite resource        | no      |
//! | `self-link` | self link contains the composite API group     | yes     |
//! | `dump`      | no kind at all, payload mentions the API group | yes     |

use std::fmt;

use crate::config::FilterConfig;
use crate::kinds::KnownKind;
use crate::object::ClusterObject;

/// One check of the composite classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeTier {
    Kind,
    Type,
    Owned,
    SelfLink,
    Dump,
}

/// Evaluation order of [`is_composite`]
pub const COMPOSITE_TIERS: [CompositeTier; 5] = [
    CompositeTier::Kind,
    CompositeTier::Type,
    CompositeTier::Owned,
    CompositeTier::SelfLink,
    CompositeTier::Dump,
];

impl CompositeTier {
    /// Run this check alone; `None` means the tier has no opinion
    pub fn check(self, obj: &dyn ClusterObject, config: &FilterConfig) -> Option<bool> {
        let decided = match self {
            Self::Kind => obj.gvk_kind() == Some(config.composite_kind.as_str()),
            Self::Type => is_composite_type(obj, config),
            Self::Owned => return is_owned(obj, config).then_some(false),
            Self::SelfLink => obj.self_link().contains(&config.self_link_fragment),
            Self::Dump => {
                obj.gvk_kind().is_none() && obj.dump().contains(&config.api_group_fragment)
            }
        };
        decided.then_some(true)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Type => "type",
            Self::Owned => "owned",
            Self::SelfLink => "self-link",
            Self::Dump => "dump",
        }
    }
}

impl fmt::Display for CompositeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Is the object an instance of the composite resource?
pub fn is_composite(obj: &dyn ClusterObject, config: &FilterConfig) -> bool {
    for tier in COMPOSITE_TIERS {
        if let Some(verdict) = tier.check(obj, config) {
            if verdict {
                tracing::debug!(
                    tier = %tier,
                    name = obj.name(),
                    kind = obj.display_type(),
                    "object is a composite resource"
                );
            }
            return verdict;
        }
    }
    false
}

/// Is the object owned by a composite resource?
///
/// Either channel suffices: an owner reference of the composite kind, or
/// the ownership label with any value.
pub fn is_owned(obj: &dyn ClusterObject, config: &FilterConfig) -> bool {
    if obj
        .owner_references()
        .iter()
        .any(|owner| owner.kind == config.composite_kind)
    {
        tracing::debug!(
            via = "owner-reference",
            name = obj.name(),
            kind = obj.display_type(),
            "object is owned"
        );
        return true;
    }

    if obj
        .labels()
        .is_some_and(|labels| labels.contains_key(&config.owned_label))
    {
        tracing::debug!(
            via = "label",
            name = obj.name(),
            kind = obj.display_type(),
            "object is owned"
        );
        return true;
    }

    false
}

fn is_composite_type(obj: &dyn ClusterObject, config: &FilterConfig) -> bool {
    match KnownKind::from_name(&config.composite_kind) {
        Some(kind) => obj.type_kind() == Some(kind),
        None => obj.type_name() == Some(config.composite_kind.as_str()),
    }
}
