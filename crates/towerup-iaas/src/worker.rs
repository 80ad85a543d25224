//! Worker instance families each IAAS accepts.
//!
//! Worker sizing is rendered into instance-type names (`m5.large`,
//! `n2-standard-4`), so only the families below are allowed through;
//! anything else is rejected when the descriptor is loaded.

use crate::{ConfigError, IaasName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! worker_type {
    ($name:ident, $iaas:expr, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn supported() -> String {
                Self::ALL
                    .iter()
                    .map(|w| w.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|w| w.as_str() == s)
                    .ok_or_else(|| ConfigError::UnsupportedWorkerType {
                        iaas: $iaas,
                        worker_type: s.to_owned(),
                        supported: Self::supported(),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = ConfigError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(w: $name) -> String {
                w.as_str().to_owned()
            }
        }
    };
}

worker_type!(AwsWorkerType, IaasName::Aws, {
    M4 => "m4",
    M5 => "m5",
    M5a => "m5a",
});

worker_type!(GcpWorkerType, IaasName::Gcp, {
    N1 => "n1",
    N2 => "n2",
});
