use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Loan ID - aggregate id owned by the lending service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Book ID - reference into the inventory service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Member ID - reference into the membership service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Extension count error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// The loan has already been extended the maximum number of times
    LimitExceeded,
}

/// Number of times a loan has been extended.
///
/// Invariant: at most [`ExtensionCount::MAX`] extensions. The type refuses to hold a larger
/// value, so a loan read back from storage cannot carry an impossible count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ExtensionCount(u8);

impl ExtensionCount {
    pub const MAX: u8 = 2;

    pub fn new() -> Self {
        Self(0)
    }

    /// Returns the next count.
    ///
    /// # Errors
    /// `ExtensionError::LimitExceeded` once [`ExtensionCount::MAX`] has been reached.
    pub fn increment(self) -> Result<Self, ExtensionError> {
        if !self.can_extend() {
            return Err(ExtensionError::LimitExceeded);
        }
        Ok(Self(self.0 + 1))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn can_extend(&self) -> bool {
        self.0 < Self::MAX
    }
}

impl Default for ExtensionCount {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<u8> for ExtensionCount {
    type Error = ExtensionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(ExtensionError::LimitExceeded);
        }
        Ok(Self(value))
    }
}

impl From<ExtensionCount> for u8 {
    fn from(count: ExtensionCount) -> Self {
        count.0
    }
}

impl fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionError::LimitExceeded => {
                write!(f, "extension count cannot exceed {}", ExtensionCount::MAX)
            }
        }
    }
}
