//! Blake2b hashing for task ids and content references.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use verity_types::{ClaimId, MethodologyId, ProjectId, StrategyRef, TaskId};

type Blake2b256 = Blake2b<U32>;

const TASK_DOMAIN: &[u8] = b"verity/task/v1";
const VERSION_DOMAIN: &[u8] = b"verity/methodology/v1";

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Derive the handle of a new task.
///
/// Fields are length-prefixed so that no two distinct inputs share an
/// encoding; the nonce separates resubmissions of the same claim.
pub fn derive_task_id(
    strategy: &StrategyRef,
    project: &ProjectId,
    claim: &ClaimId,
    methodology: &MethodologyId,
    nonce: u64,
) -> TaskId {
    let mut hasher = Blake2b256::new();
    hasher.update(TASK_DOMAIN);
    for field in [
        strategy.as_str(),
        project.as_str(),
        claim.as_str(),
        methodology.as_str(),
    ] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update(nonce.to_be_bytes());
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    TaskId::new(output)
}

/// Version hash of a methodology document.
pub fn version_hash(content: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[VERSION_DOMAIN, content])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        let h1 = blake2b_256(b"hello verity");
        let h2 = blake2b_256(b"hello verity");
        assert_eq!(h1, h2);
    }

    #[test]
    fn blake2b_multi_equivalent() {
        let single = blake2b_256(b"helloworld");
        let multi = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn task_id_depends_on_every_field() {
        let s = StrategyRef::new("optimistic");
        let p = ProjectId::new("p1");
        let c = ClaimId::new("c1");
        let m = MethodologyId::new("m1");
        let base = derive_task_id(&s, &p, &c, &m, 0);

        assert_eq!(base, derive_task_id(&s, &p, &c, &m, 0));
        assert_ne!(base, derive_task_id(&s, &p, &c, &m, 1));
        assert_ne!(base, derive_task_id(&s, &ProjectId::new("p2"), &c, &m, 0));
        assert_ne!(base, derive_task_id(&s, &p, &ClaimId::new("c2"), &m, 0));
        assert_ne!(base, derive_task_id(&s, &p, &c, &MethodologyId::new("m2"), 0));
        assert!(!base.is_zero());
    }

    #[test]
    fn length_prefix_prevents_field_shifting() {
        let s = StrategyRef::new("s");
        let m = MethodologyId::new("m");
        let a = derive_task_id(&s, &ProjectId::new("ab"), &ClaimId::new("c"), &m, 0);
        let b = derive_task_id(&s, &ProjectId::new("a"), &ClaimId::new("bc"), &m, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn version_hash_is_domain_separated() {
        assert_ne!(version_hash(b"doc"), blake2b_256(b"doc"));
    }
}
