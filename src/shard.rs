//! Sharding protocol module
//!
//! A sharding supervisor runs the same binary several times with
//! `TEST_TOTAL_SHARDS` and `TEST_SHARD_INDEX` set, and each run keeps the
//! runnable tests whose enumeration id falls into its shard.

use crate::config::{ConfigError, EnvReader};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const TOTAL_SHARDS_ENV: &str = "TEST_TOTAL_SHARDS";
pub const SHARD_INDEX_ENV: &str = "TEST_SHARD_INDEX";
pub const SHARD_STATUS_FILE_ENV: &str = "TEST_SHARD_STATUS_FILE";

/// A validated shard assignment with more than one shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSpec {
    total: u32,
    index: u32,
}

impl ShardSpec {
    /// Validate a total and index pair
    ///
    /// Returns `Ok(None)` for a single shard, which is the same as no sharding.
    pub fn new(total: i64, index: i64) -> Result<Option<Self>, ConfigError> {
        if total <= 0 {
            return Err(ConfigError::InconsistentSharding {
                reason: format!("{TOTAL_SHARDS_ENV} = {total} must be > 0"),
            });
        }
        if index < 0 || index >= total {
            return Err(ConfigError::InconsistentSharding {
                reason: format!(
                    "{SHARD_INDEX_ENV} = {index} must be in [0, {TOTAL_SHARDS_ENV}) = [0, {total})"
                ),
            });
        }
        if total == 1 {
            return Ok(None);
        }

        let total = u32::try_from(total).map_err(|_| ConfigError::InconsistentSharding {
            reason: format!("{TOTAL_SHARDS_ENV} = {total} is too large"),
        })?;
        let index = u32::try_from(index).map_err(|_| ConfigError::InconsistentSharding {
            reason: format!("{SHARD_INDEX_ENV} = {index} is too large"),
        })?;
        Ok(Some(Self { total, index }))
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// True when the runnable test with enumeration id `test_id` belongs to this shard
    pub fn selects(&self, test_id: usize) -> bool {
        should_run_test_on_shard(self.total, self.index, test_id)
    }
}

/// Shard membership of a runnable test id
pub fn should_run_test_on_shard(total_shards: u32, shard_index: u32, test_id: usize) -> bool {
    // A zero total never reaches here through ShardSpec
    total_shards != 0 && test_id % total_shards as usize == shard_index as usize
}

/// Resolve the sharding variables
///
/// Neither variable set means no sharding; exactly one set is an error.
pub fn resolve_sharding<R: EnvReader>(reader: &R) -> Result<Option<ShardSpec>, ConfigError> {
    let total = reader
        .get_var(TOTAL_SHARDS_ENV)?
        .map(|value| parse_shard_var(&value, TOTAL_SHARDS_ENV))
        .transpose()?;
    let index = reader
        .get_var(SHARD_INDEX_ENV)?
        .map(|value| parse_shard_var(&value, SHARD_INDEX_ENV))
        .transpose()?;

    match (total, index) {
        (None, None) => Ok(None),
        (Some(total), Some(index)) => ShardSpec::new(total, index),
        (Some(total), None) => Err(ConfigError::InconsistentSharding {
            reason: format!("{TOTAL_SHARDS_ENV} = {total} is set but {SHARD_INDEX_ENV} is not"),
        }),
        (None, Some(index)) => Err(ConfigError::InconsistentSharding {
            reason: format!("{SHARD_INDEX_ENV} = {index} is set but {TOTAL_SHARDS_ENV} is not"),
        }),
    }
}

fn parse_shard_var(value: &str, key: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidEnvValue {
            key: key.to_owned(),
            value: value.to_owned(),
            expected: "an integer".to_owned(),
        })
}

/// Location of the shard status file, if the supervisor asked for one
pub fn resolve_status_file<R: EnvReader>(reader: &R) -> Result<Option<PathBuf>, ConfigError> {
    Ok(reader
        .get_var(SHARD_STATUS_FILE_ENV)?
        .filter(|path| !path.is_empty())
        .map(PathBuf::from))
}

/// Create the shard status file so the supervisor knows sharding is honoured
pub fn touch_status_file(path: &Path) -> std::io::Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(drop)
}
