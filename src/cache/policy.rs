//! Expiration Policy Module
//!
//! Pure liveness rules over [`CacheEntryMetadata`]. Nothing here reads a
//! clock; the timestamps inside the metadata are the only notion of time.
//!
//! Both bounds are measured from `created`. A sliding expiration therefore
//! caps the total lifetime the same way an absolute one does and is never
//! renewed by `last_accessed`.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::CacheEntryMetadata;
use crate::error::{CacheError, Result};

// == Effective Absolute Expiration ==
/// Resolves the absolute bound of an entry.
///
/// `absolute_expiration_relative_to_now` wins over `absolute_expiration`
/// when both are set. A bound at or before `created` is a configuration
/// error.
pub fn effective_absolute_expiration(meta: &CacheEntryMetadata) -> Result<Option<DateTime<Utc>>> {
    if let Some(at) = meta.absolute_expiration {
        if at <= meta.created {
            return Err(CacheError::Configuration(format!(
                "absolute expiration {} must be after creation time {}",
                at.to_rfc3339(),
                meta.created.to_rfc3339()
            )));
        }
    }

    let Some(after) = meta.absolute_expiration_relative_to_now else {
        return Ok(meta.absolute_expiration);
    };

    let bound = TimeDelta::from_std(after)
        .ok()
        .and_then(|delta| meta.created.checked_add_signed(delta))
        .ok_or_else(|| {
            CacheError::Configuration(format!("relative expiration {after:?} is out of range"))
        })?;

    if bound <= meta.created {
        return Err(CacheError::Configuration(
            "relative absolute expiration must be positive".to_string(),
        ));
    }
    Ok(Some(bound))
}

// == Remaining Lifetime ==
/// Lifetime of the entry in whole seconds, or `None` when unbounded.
///
/// With both an absolute and a sliding bound the smaller one applies.
/// Fractions are truncated.
pub fn remaining_lifetime_seconds(meta: &CacheEntryMetadata) -> Result<Option<u64>> {
    let absolute = effective_absolute_expiration(meta)?
        .map(|at| (at - meta.created).to_std().unwrap_or(Duration::ZERO));

    let lifetime = match (absolute, meta.sliding_expiration) {
        (Some(absolute), Some(sliding)) => Some(absolute.min(sliding)),
        (Some(absolute), None) => Some(absolute),
        (None, Some(sliding)) => Some(sliding),
        (None, None) => None,
    };

    Ok(lifetime.map(|d| d.as_secs()))
}

// == Is Expired ==
/// True when the entry has a bounded lifetime shorter than one second.
pub fn is_expired(meta: &CacheEntryMetadata) -> Result<bool> {
    Ok(matches!(remaining_lifetime_seconds(meta)?, Some(secs) if secs < 1))
}

/// Rejects metadata whose absolute bound is not after its creation.
pub fn validate(meta: &CacheEntryMetadata) -> Result<()> {
    effective_absolute_expiration(meta).map(|_| ())
}
