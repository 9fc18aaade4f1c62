//! # MedRec Types
//!
//! Validated text primitives shared by the core and API crates.
//!
//! Caller input and directory cells both arrive as loosely-typed strings where an empty value
//! means "not supplied". These types make that rule explicit so that fallback resolution never
//! has to re-check for blank strings.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so a value that
/// only contained whitespace is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Lifts an optional, possibly blank, value into `Option<NonEmptyText>`.
    ///
    /// `None`, `Some("")` and `Some("   ")` all collapse to `None`.
    pub fn from_optional<S: AsRef<str>>(input: Option<S>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// Returns the first whitespace-separated token.
    ///
    /// Used where a single given name is wanted from a value that may hold a full name.
    pub fn first_token(&self) -> NonEmptyText {
        let token = self.0.split_whitespace().next().unwrap_or(&self.0);
        Self(token.to_owned())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a patient row in the directory store.
///
/// Kept exactly as given and compared by exact equality only: `P1` and `P10` are unrelated
/// identifiers, and so are `P1` and `P1 `. Only blank input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Parses a patient identifier without altering it.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` for blank input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let raw = input.as_ref();
        if raw.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `candidate` is exactly this identifier.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
