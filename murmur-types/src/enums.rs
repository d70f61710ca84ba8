use serde::{Deserialize, Serialize};

/// Relevance band assigned to a post search match, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Substring,
    Word,
    Prefix,
    Exact,
}

impl MatchTier {
    pub fn score(&self) -> i32 {
        match self {
            MatchTier::Exact => 100,
            MatchTier::Prefix => 90,
            MatchTier::Word => 80,
            MatchTier::Substring => 70,
        }
    }

    pub fn from_score(score: i32) -> Option<Self> {
        match score {
            100 => Some(MatchTier::Exact),
            90 => Some(MatchTier::Prefix),
            80 => Some(MatchTier::Word),
            70 => Some(MatchTier::Substring),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Prefix => "prefix",
            MatchTier::Word => "word",
            MatchTier::Substring => "substring",
        }
    }
}

/// Result of a follow request; the edge is never duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_scores_round_trip() {
        for tier in [
            MatchTier::Exact,
            MatchTier::Prefix,
            MatchTier::Word,
            MatchTier::Substring,
        ] {
            assert_eq!(MatchTier::from_score(tier.score()), Some(tier));
        }
        assert_eq!(MatchTier::from_score(0), None);
    }

    #[test]
    fn test_tier_ordering_matches_scores() {
        assert!(MatchTier::Exact > MatchTier::Prefix);
        assert!(MatchTier::Prefix > MatchTier::Word);
        assert!(MatchTier::Word > MatchTier::Substring);
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        let json = serde_json::to_string(&MatchTier::Prefix).unwrap();
        assert_eq!(json, "\"prefix\"");
    }
}
