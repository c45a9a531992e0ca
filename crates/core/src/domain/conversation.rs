use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    ProductInquiry,
    HighIntent,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown intent `{0}` (expected greeting|product_inquiry|high_intent)")]
pub struct UnknownIntent(pub String);

impl Intent {
    /// Declaration order is also the match order used when reading model output.
    pub const ALL: [Intent; 3] = [Self::Greeting, Self::ProductInquiry, Self::HighIntent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ProductInquiry => "product_inquiry",
            Self::HighIntent => "high_intent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Greeting => "Casual greeting or introduction",
            Self::ProductInquiry => "Product features, pricing, or general information questions",
            Self::HighIntent => {
                "User is ready to sign up, try the product, or shows strong purchase intent"
            }
        }
    }

    pub fn is_high_intent(&self) -> bool {
        matches!(self, Self::HighIntent)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
            .ok_or(UnknownIntent(normalized))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_message: String,
    pub intent: Intent,
    pub agent_response: String,
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn intent_round_trips_through_wire_names() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>(), Ok(intent));
        }
        assert_eq!(" High_Intent ".parse::<Intent>(), Ok(Intent::HighIntent));
    }

    #[test]
    fn unknown_intent_is_rejected() {
        assert!("purchase".parse::<Intent>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let encoded = serde_json::to_string(&Intent::ProductInquiry).expect("serialize intent");
        assert_eq!(encoded, "\"product_inquiry\"");
    }
}
