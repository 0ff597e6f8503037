//! Policy resolution.
//!
//! Turns the loose [`PolicySpec`] written by a rule author into a typed
//! [`ResolvedPolicy`] for one role, applying the lookup order
//! `roles[role]` → `default` → equal split with multiplier 1.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{PolicySpec, RulesDocument};

/// How a role's share of the pool is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum AllocationMethod {
    /// Fixed percentage of the pool.
    Percentage {
        /// Percent of the pool, 0 to 100.
        percentage: Decimal,
    },
    /// Pool × role hours / total hours × multiplier.
    HoursWeighted,
    /// Pool / roles present × multiplier.
    Equal,
    /// Pool × role hours / total hours; used when no known method is named.
    HoursShare,
}

impl AllocationMethod {
    /// Label recorded in payout audit details.
    pub fn label(&self) -> &'static str {
        match self {
            AllocationMethod::Percentage { .. } => "percentage",
            AllocationMethod::HoursWeighted => "hours_weighted",
            AllocationMethod::Equal => "equal",
            AllocationMethod::HoursShare => "hours_share",
        }
    }
}

/// How a role's allocation is split among its shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndividualMethod {
    /// Same amount for every shift in the role.
    Equal,
    /// Proportional to hours on the shift.
    HoursBased,
}

impl IndividualMethod {
    /// Label recorded in payout audit details.
    pub fn label(&self) -> &'static str {
        match self {
            IndividualMethod::Equal => "equal",
            IndividualMethod::HoursBased => "hours_based",
        }
    }
}

/// Where a role's policy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySource {
    /// An entry in `roles`.
    Role,
    /// The document's `default`.
    Default,
    /// Neither was present.
    Fallback,
}

/// A policy ready to be applied to one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    /// Role allocation method.
    pub method: AllocationMethod,
    /// Scales `HoursWeighted` and `Equal` allocations.
    pub multiplier: Decimal,
    /// Split within the role.
    pub individual: IndividualMethod,
    /// Lookup provenance.
    pub source: PolicySource,
}

impl ResolvedPolicy {
    /// The policy applied when the document names none for a role.
    pub fn fallback() -> Self {
        Self {
            method: AllocationMethod::Equal,
            multiplier: Decimal::ONE,
            individual: IndividualMethod::HoursBased,
            source: PolicySource::Fallback,
        }
    }
}

/// Resolves the policy for `role`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDistributionRule`] when the applied policy
/// has an unreadable number, a `percentage` policy has no percentage or one
/// outside 0–100, or a multiplier is negative.
///
/// # Examples
///
/// ```
/// use tip_pool_engine::calculation::{resolve_policy, AllocationMethod, PolicySource};
/// use tip_pool_engine::models::RulesDocument;
///
/// let doc = RulesDocument::from_value(&serde_json::json!({
///     "default": { "method": "hours_weighted" }
/// }));
/// let policy = resolve_policy(&doc, "chef").unwrap();
/// assert_eq!(policy.method, AllocationMethod::HoursWeighted);
/// assert_eq!(policy.source, PolicySource::Default);
/// ```
pub fn resolve_policy(doc: &RulesDocument, role: &str) -> EngineResult<ResolvedPolicy> {
    let (spec, source) = match (doc.roles.get(role), doc.default.as_ref()) {
        (Some(spec), _) => (spec, PolicySource::Role),
        (None, Some(spec)) => (spec, PolicySource::Default),
        (None, None) => return Ok(ResolvedPolicy::fallback()),
    };
    interpret(spec, role, source)
}

fn interpret(spec: &PolicySpec, role: &str, source: PolicySource) -> EngineResult<ResolvedPolicy> {
    let invalid = |message: String| EngineError::InvalidDistributionRule {
        role: role.to_string(),
        message,
    };

    if !spec.problems.is_empty() {
        return Err(invalid(spec.problems.join("; ")));
    }

    let method = match spec.method.as_deref() {
        Some("percentage") => {
            let percentage = spec
                .percentage
                .ok_or_else(|| invalid("percentage method requires a percentage".to_string()))?;
            if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
                return Err(invalid(format!(
                    "percentage {} is outside 0-100",
                    percentage.normalize()
                )));
            }
            AllocationMethod::Percentage { percentage }
        }
        Some("hours_weighted") => AllocationMethod::HoursWeighted,
        Some("equal") => AllocationMethod::Equal,
        _ => AllocationMethod::HoursShare,
    };

    let multiplier = spec.multiplier.unwrap_or(Decimal::ONE);
    if multiplier < Decimal::ZERO {
        return Err(invalid(format!(
            "multiplier {} must not be negative",
            multiplier.normalize()
        )));
    }

    let individual = match spec.individual_method.as_deref() {
        Some("equal") => IndividualMethod::Equal,
        _ => IndividualMethod::HoursBased,
    };

    Ok(ResolvedPolicy {
        method,
        multiplier,
        individual,
        source,
    })
}
