//! Standalone header checks: timestamp freshness and proof of work.
//!
//! Neither check looks at other headers. The contextual rules (median time
//! past, difficulty retargeting) belong to a chain and are not handled here.

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::{blockdata::block::BlockHeader, consensus::Params, hashes::BlockHash, pow::Target};

/// Reasons a header fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The timestamp lies too far in the future.
    #[error("header time {time} is later than {max}")]
    TimeTooNew {
        /// Header timestamp.
        time: u32,
        /// Latest accepted timestamp.
        max: i64,
    },

    /// The block id is above the target encoded in the header.
    #[error("header hash {hash} is above target {target}")]
    BadProofOfWork {
        /// Block id.
        hash: BlockHash,
        /// Decoded target.
        target: Target,
    },
}

impl BlockHeader {
    /// Returns `true` if the timestamp is no more than two hours ahead of the
    /// system clock.
    pub fn valid_timestamp(&self) -> bool {
        self.valid_timestamp_at(Utc::now().timestamp())
    }

    /// [`valid_timestamp`](Self::valid_timestamp) against `now`, in seconds
    /// since the Unix epoch.
    pub fn valid_timestamp_at(&self, now: i64) -> bool {
        self.valid_timestamp_with(now, &Params::MAINNET)
    }

    /// [`valid_timestamp_at`](Self::valid_timestamp_at) with the allowed drift
    /// taken from `params`.
    pub fn valid_timestamp_with(&self, now: i64, params: &Params) -> bool {
        self.validate_timestamp_with(now, params).is_ok()
    }

    /// Returns `true` if the block id, read as an integer, does not exceed
    /// the target decoded from `bits`.
    pub fn valid_proof_of_work(&self) -> bool {
        self.validate_proof_of_work().is_ok()
    }

    /// Checks the timestamp against `now`.
    ///
    /// # Errors
    ///
    /// * `ValidationError::TimeTooNew` - If `time` is later than
    ///   `now + MAX_TIME_OFFSET`
    pub fn validate_timestamp_at(&self, now: i64) -> Result<(), ValidationError> {
        self.validate_timestamp_with(now, &Params::MAINNET)
    }

    fn validate_timestamp_with(&self, now: i64, params: &Params) -> Result<(), ValidationError> {
        let time = self.time();
        let max = now.saturating_add(i64::from(params.max_time_offset));
        if i64::from(time) > max {
            debug!(time, max, "header timestamp too far in the future");
            return Err(ValidationError::TimeTooNew { time, max });
        }
        Ok(())
    }

    /// Checks the block id against the header's own target.
    ///
    /// # Errors
    ///
    /// * `ValidationError::BadProofOfWork` - If the id is above the target
    pub fn validate_proof_of_work(&self) -> Result<(), ValidationError> {
        let hash = self.id();
        let target = self.target();
        if Target::from_hash(hash) > target {
            debug!(%hash, %target, "header hash above target");
            return Err(ValidationError::BadProofOfWork { hash, target });
        }
        Ok(())
    }

    /// Runs both checks, returning the block id if they pass.
    pub fn validate_at(&self, now: i64) -> Result<BlockHash, ValidationError> {
        self.validate_timestamp_at(now)?;
        self.validate_proof_of_work()?;
        Ok(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blockdata::{block::HeaderLayout, genesis::GenesisInfo},
        pow::CompactTarget,
    };

    fn genesis_with(time: u32, bits: u32) -> BlockHeader {
        let mut header = GenesisInfo::mainnet().to_legacy_header();
        header.time = time;
        header.bits = CompactTarget::from_consensus(bits);
        BlockHeader::new(header).unwrap()
    }

    #[test]
    fn test_timestamp_boundaries() {
        let now: i64 = 1_700_000_000;
        let at = |offset: u32| genesis_with(1_700_000_000 + offset, 0x1d00ffff);

        assert!(at(0).valid_timestamp_at(now));
        assert!(at(7200).valid_timestamp_at(now));
        assert!(!at(7201).valid_timestamp_at(now));
        assert_eq!(
            at(7201).validate_timestamp_at(now),
            Err(ValidationError::TimeTooNew {
                time: 1_700_007_201,
                max: 1_700_007_200
            })
        );
    }

    #[test]
    fn test_timestamp_custom_offset() {
        let params = Params {
            max_time_offset: 0,
            ..Params::MAINNET
        };
        let header = genesis_with(1_700_000_001, 0x1d00ffff);
        assert!(header.valid_timestamp_at(1_700_000_000));
        assert!(!header.valid_timestamp_with(1_700_000_000, &params));
    }

    #[test]
    fn test_timestamp_against_system_clock() {
        let now = u32::try_from(Utc::now().timestamp()).unwrap();
        assert!(genesis_with(now, 0x1d00ffff).valid_timestamp());
        assert!(!genesis_with(now + 3 * 7200, 0x1d00ffff).valid_timestamp());
    }

    #[test]
    fn test_genesis_proof_of_work() {
        let header = BlockHeader::new(GenesisInfo::mainnet().to_legacy_header()).unwrap();
        assert!(header.valid_proof_of_work());
        assert_eq!(header.validate_at(1_231_006_505), Ok(GenesisInfo::mainnet().hash));
    }

    #[test]
    fn test_proof_of_work_extremes() {
        // 2^256 accepts every hash
        let header = genesis_with(1_231_006_505, 0x23000001);
        assert_eq!(header.target(), Target::largest());
        assert!(header.valid_proof_of_work());

        // a target of one rejects practically every hash
        let header = genesis_with(1_231_006_505, 0x03000001);
        assert!(!header.valid_proof_of_work());
        assert!(matches!(
            header.validate_proof_of_work(),
            Err(ValidationError::BadProofOfWork { hash, .. }) if hash == header.id()
        ));
    }

    #[test]
    fn test_validate_at_reports_timestamp_first() {
        let header = genesis_with(2_000_000_000, 0x03000001);
        assert!(matches!(
            header.validate_at(1_231_006_505),
            Err(ValidationError::TimeTooNew { .. })
        ));
        assert!(matches!(header.layout(), HeaderLayout::Legacy(_)));
    }
}
