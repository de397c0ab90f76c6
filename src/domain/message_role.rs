use std::fmt;
use std::str::FromStr;

pub const MAX_ROLE_LENGTH: usize = 20;

/// Free-form speaker label attached to a message.
///
/// Any non-empty label up to [`MAX_ROLE_LENGTH`] characters is accepted; only
/// `user` carries meaning for summaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRole(String);

impl MessageRole {
    pub const USER: &'static str = "user";
    pub const ASSISTANT: &'static str = "assistant";
    pub const SYSTEM: &'static str = "system";

    pub fn user() -> Self {
        Self(Self::USER.to_string())
    }

    pub fn assistant() -> Self {
        Self(Self::ASSISTANT.to_string())
    }

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_user(&self) -> bool {
        self.0 == Self::USER
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Message role must not be empty".to_string());
        }
        if trimmed.chars().count() > MAX_ROLE_LENGTH {
            return Err(format!(
                "Message role exceeds {} characters: {}",
                MAX_ROLE_LENGTH, trimmed
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
