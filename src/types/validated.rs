//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for configuration values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("storage root cannot be empty or whitespace")]
    EmptyStorageRoot,

    #[error("port cannot be 0")]
    InvalidPort,

    #[error("invalid permission mode {0:#o} (must be at most 0o7777)")]
    InvalidFileMode(u32),

    #[error("{0} cannot be 0")]
    Zero(&'static str),
}

/// Generates a validated string newtype with `new`, `as_str`, `AsRef<str>`,
/// `Deref`, `Display`, `TryFrom<String>` and validating serde impls.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// A hostname or IP literal that cannot be empty or whitespace-only
    ///
    /// # Examples
    /// ```
    /// use fusenet::types::HostName;
    ///
    /// let host = HostName::new("localhost".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "localhost");
    ///
    /// assert!(HostName::new("  ".to_string()).is_err());
    /// ```
    pub struct HostName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyHostName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// Root directory of the filesystem storage backend
    pub struct StorageRoot(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyStorageRoot)
            } else {
                Ok(())
            }
        },
    }
}

impl StorageRoot {
    /// The root as a filesystem path
    #[must_use]
    pub fn as_path(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_valid() {
        let host = HostName::new("news.example.com".to_string()).unwrap();
        assert_eq!(host.as_str(), "news.example.com");
        assert_eq!(format!("{}", host), "news.example.com");
    }

    #[test]
    fn test_hostname_whitespace_rejected() {
        assert!(matches!(
            HostName::new(" \t\n ".to_string()),
            Err(ValidationError::EmptyHostName)
        ));
    }

    #[test]
    fn test_hostname_from_str() {
        let host: HostName = "127.0.0.1".parse().unwrap();
        assert_eq!(&*host, "127.0.0.1");
    }

    #[test]
    fn test_storage_root_rejects_empty() {
        assert!(matches!(
            StorageRoot::new(String::new()),
            Err(ValidationError::EmptyStorageRoot)
        ));
    }

    #[test]
    fn test_storage_root_as_path() {
        let root = StorageRoot::new("db".to_string()).unwrap();
        assert_eq!(root.as_path(), std::path::Path::new("db"));
    }

    #[test]
    fn test_storage_root_serde() {
        let root = StorageRoot::new("/var/lib/fusenet".to_string()).unwrap();
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(json, "\"/var/lib/fusenet\"");

        let back: StorageRoot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn test_hostname_serde_invalid() {
        let result: Result<HostName, _> = serde_json::from_str("\"   \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::InvalidFileMode(0o17777).to_string(),
            "invalid permission mode 0o17777 (must be at most 0o7777)"
        );
        assert_eq!(
            ValidationError::Zero("read_buffer_size").to_string(),
            "read_buffer_size cannot be 0"
        );
    }
}
