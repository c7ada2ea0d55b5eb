//! Eligibility filter over repository listing metadata

use crate::models::{RepositoryRecord, PUBLIC_DOMAIN_EQUIVALENT_KEYS};

/// Why a repository was left out of the eligible set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Archived,
    Fork,
    AlreadyPublicDomain,
}

/// Decide whether a single record is excluded
pub fn exclusion(record: &RepositoryRecord) -> Option<Exclusion> {
    if record.archived {
        Some(Exclusion::Archived)
    } else if record.fork {
        Some(Exclusion::Fork)
    } else if record
        .license_key()
        .is_some_and(|key| PUBLIC_DOMAIN_EQUIVALENT_KEYS.contains(&key))
    {
        Some(Exclusion::AlreadyPublicDomain)
    } else {
        None
    }
}

/// Keep the records eligible for relicensing, preserving listing order
pub fn filter(records: Vec<RepositoryRecord>) -> Vec<RepositoryRecord> {
    records
        .into_iter()
        .filter(|record| match exclusion(record) {
            Some(reason) => {
                tracing::debug!("Excluding {}: {:?}", record.name, reason);
                false
            }
            None => true,
        })
        .collect()
}
