use proptest::prelude::*;

use relaymesh_types::{
    ApiInterface, BlockHash, DataHash, Endpoint, FinalizationMarker, Timestamp,
};

proptest! {
    /// BlockHash roundtrip: new -> as_bytes produces identical bytes.
    #[test]
    fn block_hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// DataHash roundtrip: new -> as_bytes produces identical bytes.
    #[test]
    fn data_hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = DataHash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// DataHash bincode serialization roundtrip.
    #[test]
    fn data_hash_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = DataHash::new(bytes);
        let encoded = bincode::serialize(&hash).unwrap();
        let decoded: DataHash = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded.as_bytes(), hash.as_bytes());
    }

    /// FinalizationMarker bincode serialization roundtrip.
    #[test]
    fn marker_bincode_roundtrip(
        height in 0u64..u64::MAX,
        bytes in prop::array::uniform32(0u8..),
    ) {
        let marker = FinalizationMarker::new(height, BlockHash::new(bytes));
        let encoded = bincode::serialize(&marker).unwrap();
        let decoded: FinalizationMarker = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, marker);
    }

    /// Endpoint keys are injective over (chain_id, interface).
    #[test]
    fn endpoint_key_distinguishes_interfaces(chain in "[A-Z]{2,8}[0-9]") {
        let a = Endpoint::new(chain.clone(), ApiInterface::JsonRpc);
        let b = Endpoint::new(chain, ApiInterface::Rest);
        prop_assert_ne!(a.key(), b.key());
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(
        base in 1u64..1_000_000,
        deficit in 1u64..1_000_000,
    ) {
        let later = Timestamp::new(base + deficit);
        let earlier = Timestamp::new(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
    }

    /// has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired(
        base in 0u64..1_000_000,
        window in 0u64..1_000_000,
        now in 0u64..3_000_000,
    ) {
        let t = Timestamp::new(base);
        prop_assert_eq!(t.has_expired(window, Timestamp::new(now)), now >= base + window);
    }
}
