//! Risk tiers driving approval and blocking policy.

use serde::{Deserialize, Serialize};

/// Risk tier assigned to a tool, task, or blueprint.
///
/// Higher tiers require more stringent approval workflows and are the first
/// thing blocked in a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Informational — always allowed, logged only.
    Low,
    /// Moderate risk — allowed unless an explicit deny rule matches.
    Medium,
    /// High risk — requires approval unless the principal holds the
    /// action's specific permissions.
    High,
    /// Critical — always requires a multi-party approval chain; permissions
    /// alone can never auto-approve it.
    Critical,
}

impl RiskTier {
    /// Whether this tier can require human approval at all.
    pub fn requires_approval(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// The escalation chain a Critical action must clear. Empty for other
    /// tiers — they have no multi-party requirement.
    pub fn escalation_path(self) -> &'static [&'static str] {
        match self {
            Self::Critical => &["Senior Engineer", "Tech Lead", "Director"],
            _ => &[],
        }
    }

    /// Advisory estimate of how long approval usually takes, in seconds.
    /// Display-only; never used in decision logic.
    pub fn estimated_approval_secs(self) -> u64 {
        match self {
            Self::Low => 0,
            Self::Medium => 0,
            Self::High => 1_800,
            Self::Critical => 14_400,
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_tier_ordering() {
        assert!(RiskTier::Low < RiskTier::Medium);
        assert!(RiskTier::Medium < RiskTier::High);
        assert!(RiskTier::High < RiskTier::Critical);
    }

    #[test]
    fn test_requires_approval() {
        assert!(!RiskTier::Low.requires_approval());
        assert!(!RiskTier::Medium.requires_approval());
        assert!(RiskTier::High.requires_approval());
        assert!(RiskTier::Critical.requires_approval());
    }

    #[test]
    fn test_escalation_path_only_for_critical() {
        assert!(RiskTier::High.escalation_path().is_empty());
        assert_eq!(
            RiskTier::Critical.escalation_path(),
            &["Senior Engineer", "Tech Lead", "Director"]
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        for tier in [
            RiskTier::Low,
            RiskTier::Medium,
            RiskTier::High,
            RiskTier::Critical,
        ] {
            let json = serde_json::to_string(&tier).unwrap();
            let back: RiskTier = serde_json::from_str(&json).unwrap();
            assert_eq!(tier, back);
        }
        assert_eq!(
            serde_json::to_string(&RiskTier::Critical).unwrap(),
            "\"critical\""
        );
    }
}
