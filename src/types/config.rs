//! Configuration-related type-safe wrappers using NonZero types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::{NonZeroU16, NonZeroU32, NonZeroUsize};

use super::ValidationError;

/// A validated network port number that cannot be zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Port(NonZeroU16);

impl Port {
    /// Create a new Port from a u16, returning None if port is 0
    #[must_use]
    pub const fn new(port: u16) -> Option<Self> {
        match NonZeroU16::new(port) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Get the port number as u16
    #[must_use]
    #[inline]
    pub const fn get(&self) -> u16 {
        self.0.get()
    }

    /// Default service port (4000)
    pub const DEFAULT: Self = Self(NonZeroU16::new(4000).unwrap());
}

impl Default for Port {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::InvalidPort)
    }
}

impl std::str::FromStr for Port {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port: u16 = s
            .parse()
            .map_err(|e| format!("Invalid port number: {}", e))?;
        Self::try_from(port).map_err(|e| format!("Invalid port: {}", e))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.get()
    }
}

impl Serialize for Port {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.get())
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        Self::new(port).ok_or_else(|| serde::de::Error::custom("port cannot be 0"))
    }
}

/// Size of the per-connection socket read buffer
///
/// Ensures every read can make progress by at least one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadBufferSize(NonZeroUsize);

impl ReadBufferSize {
    /// Create a new ReadBufferSize, returning None if value is 0
    #[must_use]
    pub const fn new(value: usize) -> Option<Self> {
        match NonZeroUsize::new(value) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> usize {
        self.0.get()
    }

    /// Default read buffer size (4KB)
    pub const DEFAULT: Self = Self(NonZeroUsize::new(4096).unwrap());
}

impl Default for ReadBufferSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ReadBufferSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Serialize for ReadBufferSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.get() as u64)
    }
}

impl<'de> Deserialize<'de> for ReadBufferSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = usize::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("read_buffer_size cannot be 0"))
    }
}

/// Upper bound on the declared length of one string parameter
///
/// A peer announcing a longer string is treated as misbehaving before any
/// allocation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaxStringLength(NonZeroU32);

impl MaxStringLength {
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }

    /// Default limit (16MB)
    pub const DEFAULT: Self = Self(NonZeroU32::new(16 * 1024 * 1024).unwrap());
}

impl Default for MaxStringLength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MaxStringLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Serialize for MaxStringLength {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.get())
    }
}

impl<'de> Deserialize<'de> for MaxStringLength {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u32::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("max_string_length cannot be 0"))
    }
}

/// Unsent output a connection may accumulate before it stops being served
///
/// A request is only executed while the connection's unsent answers are
/// within this limit, so a single answer may exceed it but a peer that
/// pipelines requests without reading cannot grow the backlog further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputBacklogLimit(NonZeroUsize);

impl OutputBacklogLimit {
    #[must_use]
    pub const fn new(value: usize) -> Option<Self> {
        match NonZeroUsize::new(value) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> usize {
        self.0.get()
    }

    /// Default limit (4MB)
    pub const DEFAULT: Self = Self(NonZeroUsize::new(4 * 1024 * 1024).unwrap());
}

impl Default for OutputBacklogLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for OutputBacklogLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Serialize for OutputBacklogLimit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.get() as u64)
    }
}

impl<'de> Deserialize<'de> for OutputBacklogLimit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = usize::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("output_backlog_limit cannot be 0"))
    }
}

/// Unix permission bits for directories and files created by the
/// filesystem backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl FileMode {
    /// Largest accepted mode (all permission, setuid/setgid and sticky bits)
    pub const MAX: u32 = 0o7777;

    /// Default directory mode
    pub const DIRECTORY: Self = Self(0o755);

    /// Default file mode
    pub const FILE: Self = Self(0o644);

    /// Create a new FileMode, rejecting bits outside the permission range
    pub const fn new(mode: u32) -> Result<Self, ValidationError> {
        if mode > Self::MAX {
            Err(ValidationError::InvalidFileMode(mode))
        } else {
            Ok(Self(mode))
        }
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#o}", self.0)
    }
}

impl Serialize for FileMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u32::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_valid() {
        let port = Port::new(8080).unwrap();
        assert_eq!(port.get(), 8080);
    }

    #[test]
    fn test_port_zero_rejected() {
        assert!(Port::new(0).is_none());
        assert_eq!(Port::try_from(0), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn test_port_default() {
        assert_eq!(Port::default().get(), 4000);
    }

    #[test]
    fn test_port_from_str() {
        assert_eq!("4119".parse::<Port>().unwrap().get(), 4119);
        assert!("0".parse::<Port>().is_err());
        assert!("abc".parse::<Port>().is_err());
        assert!("70000".parse::<Port>().is_err());
    }

    #[test]
    fn test_port_serde() {
        let port = Port::new(4000).unwrap();
        assert_eq!(serde_json::to_string(&port).unwrap(), "4000");
        assert!(serde_json::from_str::<Port>("0").is_err());
    }

    #[test]
    fn test_read_buffer_size() {
        assert!(ReadBufferSize::new(0).is_none());
        assert_eq!(ReadBufferSize::default().get(), 4096);
        assert!(serde_json::from_str::<ReadBufferSize>("0").is_err());
        assert_eq!(
            serde_json::from_str::<ReadBufferSize>("1").unwrap().get(),
            1
        );
    }

    #[test]
    fn test_max_string_length() {
        assert!(MaxStringLength::new(0).is_none());
        assert_eq!(MaxStringLength::default().get(), 16 * 1024 * 1024);
    }

    #[test]
    fn test_output_backlog_limit() {
        assert!(OutputBacklogLimit::new(0).is_none());
        assert_eq!(OutputBacklogLimit::default().get(), 4 * 1024 * 1024);
        assert!(serde_json::from_str::<OutputBacklogLimit>("0").is_err());
        assert_eq!(
            serde_json::from_str::<OutputBacklogLimit>("65536").unwrap().get(),
            65536
        );
    }

    #[test]
    fn test_file_mode_bounds() {
        assert!(FileMode::new(0o7777).is_ok());
        assert_eq!(
            FileMode::new(0o10000),
            Err(ValidationError::InvalidFileMode(0o10000))
        );
    }

    #[test]
    fn test_file_mode_display() {
        assert_eq!(FileMode::DIRECTORY.to_string(), "0o755");
        assert_eq!(FileMode::FILE.get(), 0o644);
    }
}
