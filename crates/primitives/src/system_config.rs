//! System configuration values and the parent chain config update event
//! decoder.

use alloy_consensus::Receipt;
use alloy_primitives::{b256, Address, Log, B256, U256};
use thiserror::Error;

/// `keccak256("ConfigUpdate(uint256,uint8,bytes)")`: the topic of the system
/// config contract's update event.
pub const CONFIG_UPDATE_TOPIC: B256 =
    b256!("1d2b0bda21d56b8bd12d4f94ebacffdfb35f5e226f84b461103bb8beab6353be");

/// The initial version of the config update event log.
pub const CONFIG_UPDATE_EVENT_VERSION_0: B256 = B256::ZERO;

/// System configuration values mirrored from the parent chain config
/// contract, folded forward by [SystemConfig::update_with_receipts].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemConfig {
    /// The address authorized to post batch data
    pub batcher_address: Address,
    /// The version byte of the last batcher hash update
    pub batcher_hash_version: u8,
    /// Whether the batcher may post batch data as blobs
    pub blobs_enabled: bool,
    /// Fee overhead
    pub overhead: U256,
    /// Fee scalar
    pub scalar: U256,
    /// L2 gas limit
    pub gas_limit: u64,
}

/// The type tag of a config update event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemConfigUpdateType {
    /// A versioned batcher hash update
    Batcher,
    /// A fee overhead and scalar update
    GasConfig,
    /// A gas limit update
    GasLimit,
    /// An unsafe block signer update, ignored by derivation
    UnsafeBlockSigner,
}

impl TryFrom<B256> for SystemConfigUpdateType {
    type Error = SystemConfigUpdateError;

    fn try_from(topic: B256) -> Result<Self, Self::Error> {
        let tag = u64::try_from(U256::from_be_bytes(topic.0))
            .map_err(|_| SystemConfigUpdateError::InvalidUpdateType(topic))?;
        match tag {
            0 => Ok(Self::Batcher),
            1 => Ok(Self::GasConfig),
            2 => Ok(Self::GasLimit),
            3 => Ok(Self::UnsafeBlockSigner),
            _ => Err(SystemConfigUpdateError::InvalidUpdateType(topic)),
        }
    }
}

/// An error decoding or applying a config update event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemConfigUpdateError {
    /// Unexpected topic count in the update log.
    #[error("Invalid config update log: invalid topic length: {0}")]
    InvalidTopicLen(usize),
    /// The first topic is not the config update event hash.
    #[error("Invalid config update log: invalid topic")]
    InvalidTopic,
    /// Unsupported event version.
    #[error("Unsupported config update event version: {0}")]
    UnsupportedVersion(B256),
    /// The update type topic does not carry a recognized type tag.
    #[error("Invalid config update type: {0}")]
    InvalidUpdateType(B256),
    /// The update payload has an unexpected length.
    #[error("Invalid config update log: invalid data length: {0}")]
    InvalidDataLen(usize),
    /// The ABI pointer word is not the expected offset.
    #[error("Invalid config update log: invalid data pointer")]
    InvalidDataPointer,
    /// The ABI length word does not match the payload.
    #[error("Invalid config update log: invalid payload length word")]
    InvalidPayloadLen,
    /// The batcher hash version byte is not recognized.
    #[error("Unsupported batcher hash version: {0}")]
    UnsupportedBatcherHashVersion(u8),
    /// The batcher hash padding bytes are not zero.
    #[error("Invalid batcher hash padding")]
    InvalidBatcherHashPadding,
    /// The blobs flag byte is not a boolean.
    #[error("Invalid blobs enabled flag: {0}")]
    InvalidBlobsFlag(u8),
    /// The gas limit word does not fit in 64 bits.
    #[error("Gas limit out of range")]
    GasLimitOutOfRange,
}

impl SystemConfig {
    /// Folds the config update events contained in a block's receipts into
    /// the config. Logs of reverted transactions and logs emitted by other
    /// contracts are skipped; a malformed update event is an error.
    pub fn update_with_receipts(
        &mut self,
        receipts: &[Receipt],
        config_address: Address,
    ) -> Result<(), SystemConfigUpdateError> {
        for receipt in receipts {
            if !receipt.status.coerce_status() {
                continue;
            }
            for log in &receipt.logs {
                let topics = log.data.topics();
                if log.address == config_address
                    && !topics.is_empty()
                    && topics[0] == CONFIG_UPDATE_TOPIC
                {
                    self.process_config_update_log(log)?;
                }
            }
        }
        Ok(())
    }

    /// Processes a single config update log and applies its effect,
    /// returning the update type that was handled. The log must carry the
    /// event topic, the zero event version, and a recognized update type.
    pub fn process_config_update_log(
        &mut self,
        log: &Log,
    ) -> Result<SystemConfigUpdateType, SystemConfigUpdateError> {
        let topics = log.data.topics();
        if topics.len() != 3 {
            return Err(SystemConfigUpdateError::InvalidTopicLen(topics.len()));
        }
        if topics[0] != CONFIG_UPDATE_TOPIC {
            return Err(SystemConfigUpdateError::InvalidTopic);
        }
        if topics[1] != CONFIG_UPDATE_EVENT_VERSION_0 {
            return Err(SystemConfigUpdateError::UnsupportedVersion(topics[1]));
        }

        let update_type = SystemConfigUpdateType::try_from(topics[2])?;
        match update_type {
            SystemConfigUpdateType::Batcher => self.update_batcher_hash(&log.data.data)?,
            SystemConfigUpdateType::GasConfig => self.update_gas_config(&log.data.data)?,
            SystemConfigUpdateType::GasLimit => self.update_gas_limit(&log.data.data)?,
            SystemConfigUpdateType::UnsafeBlockSigner => { /* ignored by derivation */ }
        }
        Ok(update_type)
    }

    /// Applies a versioned batcher hash update. The payload word is 12 bytes
    /// of versioned padding followed by the 20 byte batcher address: padding
    /// byte 0 is the version, and for version 1 padding byte 1 selects
    /// whether the batcher may post blobs. All other padding must be zero.
    fn update_batcher_hash(&mut self, data: &[u8]) -> Result<(), SystemConfigUpdateError> {
        let payload = abi_payload(data, 32)?;

        let version = payload[0];
        match version {
            0 => {
                if payload[1..12].iter().any(|b| *b != 0) {
                    return Err(SystemConfigUpdateError::InvalidBatcherHashPadding);
                }
                self.blobs_enabled = false;
            }
            1 => {
                if payload[2..12].iter().any(|b| *b != 0) {
                    return Err(SystemConfigUpdateError::InvalidBatcherHashPadding);
                }
                self.blobs_enabled = match payload[1] {
                    0 => false,
                    1 => true,
                    flag => return Err(SystemConfigUpdateError::InvalidBlobsFlag(flag)),
                };
            }
            version => {
                return Err(SystemConfigUpdateError::UnsupportedBatcherHashVersion(version))
            }
        }
        self.batcher_hash_version = version;
        self.batcher_address = Address::from_slice(&payload[12..32]);
        Ok(())
    }

    /// Applies a fee overhead and scalar update from two payload words.
    fn update_gas_config(&mut self, data: &[u8]) -> Result<(), SystemConfigUpdateError> {
        let payload = abi_payload(data, 64)?;
        self.overhead = U256::from_be_slice(&payload[..32]);
        self.scalar = U256::from_be_slice(&payload[32..]);
        Ok(())
    }

    /// Applies a gas limit update from a single payload word that must fit
    /// in 64 bits.
    fn update_gas_limit(&mut self, data: &[u8]) -> Result<(), SystemConfigUpdateError> {
        let payload = abi_payload(data, 32)?;
        self.gas_limit =
            word_to_u64(payload).ok_or(SystemConfigUpdateError::GasLimitOutOfRange)?;
        Ok(())
    }
}

/// Validates the ABI envelope of an update payload: a pointer word that must
/// be 32, a length word that must match, then the payload itself.
fn abi_payload(data: &[u8], expected_len: u64) -> Result<&[u8], SystemConfigUpdateError> {
    if data.len() != 64 + expected_len as usize {
        return Err(SystemConfigUpdateError::InvalidDataLen(data.len()));
    }
    if word_to_u64(&data[..32]) != Some(32) {
        return Err(SystemConfigUpdateError::InvalidDataPointer);
    }
    if word_to_u64(&data[32..64]) != Some(expected_len) {
        return Err(SystemConfigUpdateError::InvalidPayloadLen);
    }
    Ok(&data[64..])
}

/// Reads a 32 byte big endian word as a `u64`, or `None` if the value does
/// not fit.
fn word_to_u64(word: &[u8]) -> Option<u64> {
    if word.len() != 32 || word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Some(u64::from_be_bytes(bytes))
}
