use derive_more::Display;

/// Minimum growth, in bytes, for an entry to show up in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
#[display("{_0} bytes")]
pub struct Threshold(i64);

impl Threshold {
    pub const BYTES_PER_MIB: i64 = 1024 * 1024;

    pub fn from_mib(mib: u64) -> Self {
        Self(i64::try_from(mib).unwrap_or(i64::MAX).saturating_mul(Self::BYTES_PER_MIB))
    }

    pub fn from_bytes(bytes: u64) -> Self {
        Self(i64::try_from(bytes).unwrap_or(i64::MAX))
    }

    pub fn bytes(self) -> i64 {
        self.0
    }
}

impl Default for Threshold {
    /// Half a MiB.
    fn default() -> Self {
        Self(512 * 1024)
    }
}
