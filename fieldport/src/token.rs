//! Reference tokens embedded in field settings.
//!
//! A token is `<prefix>:<key>`. Live settings carry a uid or numeric id as the
//! key; the portable document carries a handle.

use std::fmt;
use std::str::FromStr;

/// Entry source meaning "all singles".
pub const SINGLES: &str = "singles";
/// User source meaning "administrators".
pub const ADMINS: &str = "admins";
/// Source meaning "everything".
pub const ALL: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPrefix {
    Folder,
    Volume,
    Group,
    Section,
    Single,
    TagGroup,
}

impl TokenPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPrefix::Folder => "folder",
            TokenPrefix::Volume => "volume",
            TokenPrefix::Group => "group",
            TokenPrefix::Section => "section",
            TokenPrefix::Single => "single",
            TokenPrefix::TagGroup => "taggroup",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "folder" => TokenPrefix::Folder,
            "volume" => TokenPrefix::Volume,
            "group" => TokenPrefix::Group,
            "section" => TokenPrefix::Section,
            "single" => TokenPrefix::Single,
            "taggroup" => TokenPrefix::TagGroup,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefToken {
    pub prefix: TokenPrefix,
    pub key: String,
}

impl RefToken {
    pub fn new(prefix: TokenPrefix, key: impl Into<String>) -> Self {
        Self {
            prefix,
            key: key.into(),
        }
    }

    /// `None` for sentinels, bare handles and anything without a known prefix.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl fmt::Display for RefToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix.as_str(), self.key)
    }
}

impl FromStr for RefToken {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, key) = s.split_once(':').ok_or(())?;
        let prefix = TokenPrefix::parse(prefix).ok_or(())?;
        if key.is_empty() {
            return Err(());
        }
        Ok(RefToken::new(prefix, key))
    }
}
