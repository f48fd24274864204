use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// The backend hands out identities as JSON strings in some payloads and as
/// integers in others, so both are accepted and normalized to the string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentity {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawIdentity> for String {
    fn from(raw: RawIdentity) -> String {
        match raw {
            RawIdentity::Text(s) => s,
            RawIdentity::Signed(n) => n.to_string(),
            RawIdentity::Unsigned(n) => n.to_string(),
        }
    }
}

macro_rules! identity_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                $name(n.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawIdentity::deserialize(deserializer).map(|raw| $name(raw.into()))
            }
        }
    };
}

identity_newtype!(
    /// Canonical node identity used by the dataset, the hierarchy index and
    /// the graph state alike.  Comparisons are structural.
    NodeId
);

identity_newtype!(
    /// Canonical relationship identity.
    EdgeId
);
