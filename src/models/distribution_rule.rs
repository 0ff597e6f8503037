//! Distribution rules: named, versioned tip allocation policies.
//!
//! The `rules` document of a [`DistributionRule`] is kept as opaque JSON so
//! that historic rules survive schema drift. It is interpreted as a
//! [`RulesDocument`] only when a pool is calculated.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted distribution rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRule {
    /// Rule id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// The policy document, stored verbatim.
    pub rules: Value,
    /// Only active rules may be used for new calculations.
    pub is_active: bool,
    /// The user who authored the rule.
    #[serde(default)]
    pub created_by: Option<i64>,
    /// When the rule was stored.
    pub created_at: DateTime<Utc>,
}

impl DistributionRule {
    /// Interprets the stored document.
    pub fn document(&self) -> RulesDocument {
        RulesDocument::from_value(&self.rules)
    }
}

/// Input for creating a distribution rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDistributionRule {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// The policy document.
    pub rules: Value,
    /// The authoring user.
    #[serde(default)]
    pub created_by: Option<i64>,
}

/// One allocation policy as written by the rule author.
///
/// Fields are read loosely. A `method` that is missing, unknown or not a
/// string selects the plain hours-proportional fallback at allocation time.
/// A numeric field that is present but unreadable is kept in `problems` and
/// only fails a calculation that applies this policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PolicySpec {
    /// `percentage`, `hours_weighted` or `equal`.
    pub method: Option<String>,
    /// Share of the pool in percent; used by the `percentage` method.
    pub percentage: Option<Decimal>,
    /// Scales `hours_weighted` and `equal` allocations; defaults to 1.
    pub multiplier: Option<Decimal>,
    /// `equal` or `hours_based` split within the role.
    pub individual_method: Option<String>,
    /// Fields that were present but could not be read.
    #[serde(skip)]
    pub problems: Vec<String>,
}

impl PolicySpec {
    /// Reads one policy. A value that is not an object is an empty policy.
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let mut problems = Vec::new();
        let mut number = |key: &str| match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let parsed = read_decimal(raw);
                if parsed.is_none() {
                    problems.push(format!("{} {} is not a number", key, raw));
                }
                parsed
            }
        };
        let percentage = number("percentage");
        let multiplier = number("multiplier");

        Self {
            method: read_label(fields.get("method")),
            percentage,
            multiplier,
            individual_method: read_label(
                fields
                    .get("individual_method")
                    .or_else(|| fields.get("individualMethod")),
            ),
            problems,
        }
    }
}

/// The nested policy document of a distribution rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RulesDocument {
    /// Policy for roles without an entry in `roles`.
    pub default: Option<PolicySpec>,
    /// Per-role policies.
    pub roles: BTreeMap<String, PolicySpec>,
}

/// A non-fatal observation about a rules document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDiagnostic {
    /// Stable code for the observation.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

const KNOWN_METHODS: [&str; 3] = ["percentage", "hours_weighted", "equal"];

/// Strings are taken as-is; any other non-null value by its JSON text, so it
/// never matches a known name.
fn read_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(label) => Some(label.clone()),
        other => Some(other.to_string()),
    }
}

fn read_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

impl RulesDocument {
    /// Reads a stored rules document.
    ///
    /// Never fails: a value that is not an object reads as an empty document,
    /// a `roles` entry that is not an object contributes no roles, and
    /// problems inside a policy surface when that policy is applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use tip_pool_engine::models::RulesDocument;
    ///
    /// let doc = RulesDocument::from_value(&serde_json::json!({
    ///     "default": { "method": "hours_weighted", "multiplier": 1 },
    ///     "roles": { "bartender": { "method": "percentage", "percentage": 15 } }
    /// }));
    /// assert!(doc.default.is_some());
    /// assert_eq!(doc.roles.len(), 1);
    /// ```
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let default = fields
            .get("default")
            .filter(|policy| !policy.is_null())
            .map(PolicySpec::from_value);
        let roles = fields
            .get("roles")
            .and_then(Value::as_object)
            .map(|roles| {
                roles
                    .iter()
                    .filter(|(_, policy)| !policy.is_null())
                    .map(|(role, policy)| (role.clone(), PolicySpec::from_value(policy)))
                    .collect()
            })
            .unwrap_or_default();

        Self { default, roles }
    }

    /// Reports authoring problems that the engine tolerates.
    ///
    /// Allocations are never normalized, so these only feed warnings.
    pub fn diagnostics(&self) -> Vec<RuleDiagnostic> {
        let mut diagnostics = Vec::new();

        let percentage_sum: Decimal = self
            .roles
            .values()
            .filter(|p| p.method.as_deref() == Some("percentage"))
            .filter_map(|p| p.percentage)
            .sum();
        if percentage_sum > Decimal::ONE_HUNDRED {
            diagnostics.push(RuleDiagnostic {
                code: "PERCENTAGE_OVER_100".to_string(),
                message: format!(
                    "role percentages sum to {}%, more than the pool",
                    percentage_sum.normalize()
                ),
            });
        }

        let policies = self
            .default
            .iter()
            .map(|p| ("default", p))
            .chain(self.roles.iter().map(|(role, p)| (role.as_str(), p)));
        for (owner, policy) in policies {
            for problem in &policy.problems {
                diagnostics.push(RuleDiagnostic {
                    code: "UNREADABLE_FIELD".to_string(),
                    message: format!("policy '{}': {}", owner, problem),
                });
            }
            if let Some(method) = policy.method.as_deref() {
                if !KNOWN_METHODS.contains(&method) {
                    diagnostics.push(RuleDiagnostic {
                        code: "UNKNOWN_METHOD".to_string(),
                        message: format!(
                            "policy '{}' uses unknown method '{}'; hours share applies",
                            owner, method
                        ),
                    });
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_camel_case_individual_method() {
        let doc = RulesDocument::from_value(&json!({
            "roles": {
                "server": { "method": "hours_weighted", "individualMethod": "equal" }
            }
        }));
        assert_eq!(
            doc.roles["server"].individual_method.as_deref(),
            Some("equal")
        );
    }

    #[test]
    fn test_parses_string_and_number_decimals() {
        let doc = RulesDocument::from_value(&json!({
            "roles": {
                "bartender": { "method": "percentage", "percentage": "12.5" },
                "busser": { "method": "percentage", "percentage": 7.5, "multiplier": 2 }
            }
        }));
        assert_eq!(doc.roles["bartender"].percentage, Some(Decimal::new(125, 1)));
        assert_eq!(doc.roles["busser"].percentage, Some(Decimal::new(75, 1)));
        assert_eq!(doc.roles["busser"].multiplier, Some(Decimal::new(2, 0)));
    }

    #[test]
    fn test_null_document_is_empty() {
        let doc = RulesDocument::from_value(&Value::Null);
        assert_eq!(doc, RulesDocument::default());
    }

    #[test]
    fn test_non_object_shapes_read_as_empty() {
        assert_eq!(
            RulesDocument::from_value(&json!(["not", "a", "document"])),
            RulesDocument::default()
        );
        let doc = RulesDocument::from_value(&json!({ "roles": ["server"], "default": 7 }));
        assert!(doc.roles.is_empty());
        assert_eq!(doc.default, Some(PolicySpec::default()));
    }

    #[test]
    fn test_non_string_method_reads_as_unknown_label() {
        let doc = RulesDocument::from_value(&json!({ "default": { "method": 5 } }));
        let policy = doc.default.as_ref().unwrap();
        assert_eq!(policy.method.as_deref(), Some("5"));
        assert!(policy.problems.is_empty());
        assert_eq!(doc.diagnostics()[0].code, "UNKNOWN_METHOD");
    }

    #[test]
    fn test_unreadable_numbers_are_kept_as_problems() {
        let doc = RulesDocument::from_value(&json!({
            "roles": { "server": { "method": "percentage", "percentage": "lots", "multiplier": [2] } }
        }));
        let server = &doc.roles["server"];
        assert_eq!(server.percentage, None);
        assert_eq!(server.multiplier, None);
        assert_eq!(server.problems.len(), 2);
        assert!(doc.diagnostics().iter().all(|d| d.code == "UNREADABLE_FIELD"));
    }

    #[test]
    fn test_exponent_numbers_are_read() {
        let doc = RulesDocument::from_value(&json!({
            "default": { "method": "equal", "multiplier": 2.5e20 }
        }));
        assert_eq!(
            doc.default.as_ref().unwrap().multiplier,
            Some(Decimal::from_str("250000000000000000000").unwrap())
        );
    }

    #[test]
    fn test_diagnostics_flag_percentages_over_100() {
        let doc = RulesDocument::from_value(&json!({
            "roles": {
                "server": { "method": "percentage", "percentage": 70 },
                "kitchen": { "method": "percentage", "percentage": 40 }
            }
        }));
        let diagnostics = doc.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "PERCENTAGE_OVER_100");
        assert!(diagnostics[0].message.contains("110%"));
    }

    #[test]
    fn test_diagnostics_flag_unknown_methods() {
        let doc = RulesDocument::from_value(&json!({
            "default": { "method": "seniority" }
        }));
        let diagnostics = doc.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "UNKNOWN_METHOD");
    }

    #[test]
    fn test_well_formed_document_has_no_diagnostics() {
        let doc = RulesDocument::from_value(&json!({
            "default": { "method": "hours_weighted", "multiplier": 1 },
            "roles": {
                "server": { "method": "percentage", "percentage": 60 },
                "kitchen": { "method": "percentage", "percentage": 40 }
            }
        }));
        assert!(doc.diagnostics().is_empty());
    }
}
