use crate::types::RemoteDataset;
use serde::Deserialize;
use serde_json::Value;

/// True when the remote copy differs from `local` on any mapped field.
///
/// The remote document is first read back into the mapped shape, which drops
/// server-added keys (ids, timestamps, file sizes, sync status). A mapped
/// field present on one side only is a change, so clearing an optional field
/// locally is seen. A remote document missing a required mapped field counts
/// as changed. Arrays are compared as multisets.
pub fn is_changed(local: &RemoteDataset, remote: &Value) -> bool {
    let Ok(remote) = RemoteDataset::deserialize(remote) else {
        return true;
    };
    match (serde_json::to_value(local), serde_json::to_value(&remote)) {
        (Ok(l), Ok(r)) => !same(&l, &r),
        _ => true,
    }
}

/// Structural equality where array order is irrelevant and each element of
/// one side must match a distinct element of the other.
fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, av)| b.get(key).is_some_and(|bv| same(av, bv)))
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return false;
            }
            let mut used = vec![false; b.len()];
            a.iter().all(|av| {
                match b
                    .iter()
                    .enumerate()
                    .position(|(i, bv)| !used[i] && same(av, bv))
                {
                    Some(i) => {
                        used[i] = true;
                        true
                    }
                    None => false,
                }
            })
        }
        (a, b) => a == b,
    }
}
