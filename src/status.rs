//! The clean/dirty status a monitor derives from its comparisons.
//!
//! A status is recomputed on every relevant state event and handed to
//! change handlers. The two flags are mutually exclusive by construction:
//! the type stores a single flag, so `dirty == !clean` cannot be violated.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Derived status of the observed state relative to its baseline.
///
/// Serializes as `{"clean": bool, "dirty": bool}`; deserialization rejects
/// payloads where the two fields agree.
///
/// # Examples
///
/// ```
/// use statewatch::ChangeStatus;
///
/// let status = ChangeStatus::from_clean(false);
/// assert!(status.dirty());
/// assert!(!status.clean());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeStatus {
    clean: bool,
}

impl ChangeStatus {
    /// Creates a status from the result of a comparison.
    #[must_use]
    pub const fn from_clean(clean: bool) -> Self {
        Self { clean }
    }

    /// Returns true if the state matches the baseline (minus ignored paths).
    #[must_use]
    pub const fn clean(&self) -> bool {
        self.clean
    }

    /// Returns true if the state has diverged from the baseline.
    #[must_use]
    pub const fn dirty(&self) -> bool {
        !self.clean
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clean {
            write!(f, "clean")
        } else {
            write!(f, "dirty")
        }
    }
}

impl Serialize for ChangeStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("ChangeStatus", 2)?;
        s.serialize_field("clean", &self.clean)?;
        s.serialize_field("dirty", &!self.clean)?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for ChangeStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StatusVisitor;

        impl<'de> Visitor<'de> for StatusVisitor {
            type Value = ChangeStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a status object with mutually exclusive clean/dirty flags")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut clean: Option<bool> = None;
                let mut dirty: Option<bool> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "clean" => clean = Some(map.next_value()?),
                        "dirty" => dirty = Some(map.next_value()?),
                        _ => {
                            let _: de::IgnoredAny = map.next_value()?;
                        }
                    }
                }

                match (clean, dirty) {
                    (Some(c), Some(d)) if c == d => Err(de::Error::custom(
                        "clean and dirty must be mutually exclusive",
                    )),
                    (Some(c), _) => Ok(ChangeStatus::from_clean(c)),
                    (None, Some(d)) => Ok(ChangeStatus::from_clean(!d)),
                    (None, None) => Err(de::Error::missing_field("clean")),
                }
            }
        }

        deserializer.deserialize_map(StatusVisitor)
    }
}
