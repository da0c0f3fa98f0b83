//! Status conditions for SecurityGroup resources
//!
//! Conditions are kept with at most one entry per [`ConditionType`]. Writes go
//! through [`set_conditions`], which only replaces an entry when something
//! other than its transition time changed, so re-applying the same condition
//! keeps the original timestamp.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    /// Whether the security group exists and matches the spec
    Ready,
    /// Whether the last reconciliation against the management service succeeded
    Synced,
}

/// Condition status (True, False, Unknown)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Reason for the condition's last transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionReason {
    Creating,
    Deleting,
    SpecChanging,
    Available,
    Unavailable,
    ReconcileSuccess,
    ReconcileError,
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Status condition
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type
    pub r#type: ConditionType,

    /// Status (True, False, Unknown)
    pub status: ConditionStatus,

    /// Last transition time
    pub last_transition_time: DateTime<Utc>,

    /// Reason for the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ConditionReason>,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Condition {
    fn new(r#type: ConditionType, status: ConditionStatus, reason: ConditionReason) -> Self {
        Self {
            r#type,
            status,
            last_transition_time: Utc::now(),
            reason: Some(reason),
            message: String::new(),
        }
    }

    /// The security group is being created
    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Creating)
    }

    /// The security group is being deleted
    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Deleting)
    }

    /// The security group is being brought in line with a changed spec
    pub fn spec_changing() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::SpecChanging)
    }

    /// The security group exists and matches the spec
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::True, ConditionReason::Available)
    }

    /// The security group is missing from the management service
    pub fn unavailable() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Unavailable)
    }

    /// The last reconciliation succeeded
    pub fn reconcile_success() -> Self {
        Self::new(ConditionType::Synced, ConditionStatus::True, ConditionReason::ReconcileSuccess)
    }

    /// The last reconciliation failed with `err`
    pub fn reconcile_error(err: impl fmt::Display) -> Self {
        Self::new(ConditionType::Synced, ConditionStatus::False, ConditionReason::ReconcileError)
            .with_message(err.to_string())
    }

    /// Attach a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Compare everything except the transition time
    pub fn equal(&self, other: &Condition) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Get the condition of the given type, or an `Unknown` one if none is set.
pub fn get_condition(conditions: &[Condition], r#type: ConditionType) -> Condition {
    conditions
        .iter()
        .find(|c| c.r#type == r#type)
        .cloned()
        .unwrap_or_else(|| Condition {
            r#type,
            status: ConditionStatus::Unknown,
            last_transition_time: DateTime::<Utc>::default(),
            reason: None,
            message: String::new(),
        })
}

/// Merge conditions into the list.
///
/// An existing entry of the same type is replaced only if it differs; new
/// types are appended. Existing entries never move.
pub fn set_conditions(conditions: &mut Vec<Condition>, updates: impl IntoIterator<Item = Condition>) {
    for update in updates {
        match conditions.iter_mut().find(|c| c.r#type == update.r#type) {
            Some(existing) => {
                if !existing.equal(&update) {
                    *existing = update;
                }
            }
            None => conditions.push(update),
        }
    }
}

/// Set equality of two condition lists, ignoring order and transition times.
pub fn conditions_equal(a: &[Condition], b: &[Condition]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }

    let mut a: Vec<&Condition> = a.iter().collect();
    let mut b: Vec<&Condition> = b.iter().collect();
    a.sort_by_key(|c| c.r#type);
    b.sort_by_key(|c| c.r#type);

    a.iter().zip(b.iter()).all(|(x, y)| x.equal(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_get_condition_missing_is_unknown() {
        let cond = get_condition(&[], ConditionType::Ready);
        assert_eq!(cond.r#type, ConditionType::Ready);
        assert_eq!(cond.status, ConditionStatus::Unknown);
        assert!(cond.reason.is_none());
    }

    #[test]
    fn test_set_conditions_keeps_one_per_type() {
        let mut conditions = Vec::new();
        set_conditions(&mut conditions, [Condition::creating()]);
        set_conditions(&mut conditions, [Condition::reconcile_error("boom")]);
        set_conditions(&mut conditions, [Condition::available(), Condition::reconcile_success()]);
        set_conditions(&mut conditions, [Condition::spec_changing(), Condition::spec_changing()]);

        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].r#type, ConditionType::Ready);
        assert_eq!(conditions[0].reason, Some(ConditionReason::SpecChanging));
        assert_eq!(conditions[1].r#type, ConditionType::Synced);
        assert_eq!(conditions[1].reason, Some(ConditionReason::ReconcileSuccess));
    }

    #[test]
    fn test_set_conditions_unchanged_keeps_transition_time() {
        let mut original = Condition::available();
        original.last_transition_time -= Duration::hours(1);
        let stamp = original.last_transition_time;
        let mut conditions = vec![original];

        set_conditions(&mut conditions, [Condition::available()]);
        assert_eq!(conditions[0].last_transition_time, stamp);

        set_conditions(&mut conditions, [Condition::available().with_message("updated")]);
        assert!(conditions[0].last_transition_time > stamp);
        assert_eq!(conditions[0].message, "updated");
    }

    #[test]
    fn test_conditions_equal_ignores_order_and_time() {
        let mut ready = Condition::available();
        ready.last_transition_time -= Duration::minutes(5);
        let a = vec![ready, Condition::reconcile_success()];
        let b = vec![Condition::reconcile_success(), Condition::available()];
        assert!(conditions_equal(&a, &b));
    }

    #[test]
    fn test_conditions_equal_detects_differences() {
        let a = vec![Condition::available()];
        let b = vec![Condition::available(), Condition::reconcile_success()];
        assert!(!conditions_equal(&a, &b));

        let c = vec![Condition::reconcile_error("first")];
        let d = vec![Condition::reconcile_error("second")];
        assert!(!conditions_equal(&c, &d));

        assert!(conditions_equal(&[], &[]));
    }

    #[test]
    fn test_condition_wire_vocabulary() {
        let json = serde_json::to_value(Condition::spec_changing()).unwrap();
        assert_eq!(json["type"], "Ready");
        assert_eq!(json["status"], "False");
        assert_eq!(json["reason"], "SpecChanging");
        assert!(json.get("lastTransitionTime").is_some());

        let json = serde_json::to_value(Condition::reconcile_error("timeout")).unwrap();
        assert_eq!(json["type"], "Synced");
        assert_eq!(json["reason"], "ReconcileError");
        assert_eq!(json["message"], "timeout");
    }
}
