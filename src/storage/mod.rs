mod codec;
mod keys;
mod log_store;
mod raft_store;
mod range_delete;
mod sled_adapter;
mod stable_store;

#[cfg(test)]
mod keys_test;

pub use codec::*;
pub use keys::*;
pub use log_store::*;
pub use raft_store::*;
pub use range_delete::*;
#[doc(hidden)]
pub use sled_adapter::*;
pub use stable_store::*;
