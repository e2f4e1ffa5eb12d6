//! Uniform success/error result wrapper.
//!
//! Every operation executor returns an [`Envelope`]: expected failures
//! (missing credentials, provider errors, exhausted retries) are values in the
//! `Failure` branch, never panics or errors across the public boundary. The
//! wire shape is `{ "success": true, "data": … }` or
//! `{ "success": false, "error": … }`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Result of one operation executor invocation.
///
/// Exactly one of the payload/error is present, discriminated by `success`.
/// The enum makes that invariant structural; serde enforces it on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure(String),
}

impl<T> Envelope<T> {
    /// Build a success envelope.
    pub fn ok(data: T) -> Self {
        Self::Success(data)
    }

    /// Build a failure envelope from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        Self::Failure(error.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(error) => Err(error),
        }
    }

    /// Map the success payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Self::Success(data) => Envelope::Success(f(data)),
            Self::Failure(error) => Envelope::Failure(error),
        }
    }
}

impl<T> From<Result<T, String>> for Envelope<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::Failure(error),
        }
    }
}

#[derive(Serialize)]
struct WireSuccess<'a, T> {
    success: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct WireFailure<'a> {
    success: bool,
    error: &'a str,
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(data) => WireSuccess { success: true, data }.serialize(serializer),
            Self::Failure(error) => WireFailure {
                success: false,
                error,
            }
            .serialize(serializer),
        }
    }
}

// No `#[serde(default)]` on `data`: that would put a `T: Default` bound on
// the derived impl. Missing `Option` fields already read as `None`.
#[derive(Deserialize)]
struct WireEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireEnvelope::<T>::deserialize(deserializer)?;
        match (wire.success, wire.data, wire.error) {
            (true, Some(data), None) => Ok(Self::Success(data)),
            (false, None, Some(error)) => Ok(Self::Failure(error)),
            (true, _, _) => Err(serde::de::Error::custom(
                "success envelope must carry `data` and no `error`",
            )),
            (false, _, _) => Err(serde::de::Error::custom(
                "failure envelope must carry `error` and no `data`",
            )),
        }
    }
}
