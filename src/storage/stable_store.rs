use crate::Result;

/// Small durable key/value metadata, e.g. current term and vote.
pub trait StableStore: Send + Sync {
    fn set(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()>;

    /// Fails with a not-found error for a key that was never set.
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Vec<u8>>;

    fn set_u64(
        &self,
        key: &[u8],
        value: u64,
    ) -> Result<()>;

    fn get_u64(
        &self,
        key: &[u8],
    ) -> Result<u64>;
}
