//! Key encoding for `RocksDB`.

use cost_estimate_core::MemberId;

/// Create an accumulator record key from a member ID.
///
/// Member IDs are restricted to ASCII, so the key is the ID's bytes.
#[must_use]
pub fn accumulator_key(member_id: &MemberId) -> Vec<u8> {
    member_id.as_str().as_bytes().to_vec()
}
