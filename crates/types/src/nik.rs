use crate::TextError;

/// An Indonesian national identity number (NIK): exactly 16 ASCII digits.
///
/// The NIK is the dedup key for patient records, so a malformed value must
/// never reach the database. Blank input is not an error here; callers that
/// treat "no NIK" as valid should use [`Nik::parse_opt`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nik(String);

impl Nik {
    /// Parses a NIK, trimming surrounding whitespace first.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and
    /// [`TextError::InvalidNik`] when the input is not 16 digits.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.len() != 16 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::InvalidNik);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Parses an optional NIK: `None` and blank input both yield `Ok(None)`.
    pub fn parse_opt(input: Option<&str>) -> Result<Option<Self>, TextError> {
        match input {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => Self::parse(raw).map(Some),
        }
    }

    /// Returns the digits as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Nik {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Nik {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Nik {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Nik {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Nik {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Nik::parse(&s).map_err(serde::de::Error::custom)
    }
}
