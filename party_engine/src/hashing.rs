/// Party kernel — Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
///
/// Rules:
///   - kernel_version first, then scalar fields, then registries
///   - Players sorted by id, parties sorted by handle
///   - Member and invitee order preserved (succession order is state)
///   - UTF-8 JSON, no whitespace, no float

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::WorldState;
use crate::KERNEL_VERSION;

/// Canonical serialization of the world to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &WorldState) -> Result<Vec<u8>, serde_json::Error> {
    let obj = build_canonical_value(state)?;
    serde_json::to_vec(&obj)
}

/// SHA-256 of the canonical serialization, lowercase hex.
pub fn canonical_hash(state: &WorldState) -> Result<String, serde_json::Error> {
    let bytes = canonical_serialize(state)?;
    Ok(hex_digest(&bytes))
}

pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Field order: kernel_version, clock_ms, next_party_id, constants,
/// players, parties.
fn build_canonical_value(state: &WorldState) -> Result<Value, serde_json::Error> {
    // BTreeMap iteration is already sorted by id.
    let players = state
        .players
        .values()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let parties = state
        .parties
        .values()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let mut root = Map::new();
    root.insert(
        "kernel_version".to_string(),
        Value::Number(KERNEL_VERSION.into()),
    );
    root.insert("clock_ms".to_string(), Value::Number(state.clock_ms.into()));
    root.insert(
        "next_party_id".to_string(),
        Value::Number(state.next_party_id.into()),
    );
    root.insert("constants".to_string(), serde_json::to_value(&state.constants)?);
    root.insert("players".to_string(), Value::Array(players));
    root.insert("parties".to_string(), Value::Array(parties));
    Ok(Value::Object(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{party_of, world};

    #[test]
    fn kernel_version_leads() {
        let state = world(&[(1, "Lars", 30)]);
        let bytes = canonical_serialize(&state).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with(&format!("{{\"kernel_version\":{}", KERNEL_VERSION)));
    }

    #[test]
    fn hash_is_stable_and_sensitive_to_succession_order() {
        let mut a = world(&[(1, "Lars", 30), (2, "Ann", 25), (3, "Bo", 25)]);
        let party = party_of(&mut a, 1, &[2, 3]);
        let b = a.clone();
        assert_eq!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
        assert_eq!(canonical_hash(&a).unwrap().len(), 64);

        let mut c = a.clone();
        c.parties.get_mut(&party).unwrap().members.reverse();
        assert_ne!(canonical_hash(&a).unwrap(), canonical_hash(&c).unwrap());
    }
}
