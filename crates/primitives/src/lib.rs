#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod blob;
pub use blob::{
    Blob, BlobDecodingError, BlobEncodingError, BLOB_BYTES_SIZE, BLOB_ENCODING_ROUNDS,
    BLOB_ENCODING_VERSION, BLOB_MAX_DATA_SIZE, BLOB_VERSION_OFFSET, BYTES_PER_FIELD_ELEMENT,
};

pub mod blob_hash;
pub use blob_hash::{kzg_to_versioned_hash, IndexedBlobHash, VERSIONED_HASH_VERSION_KZG};

pub mod block;
pub use block::{BlockID, BlockInfo};

pub mod system_config;
pub use system_config::{
    SystemConfig, SystemConfigUpdateError, SystemConfigUpdateType, CONFIG_UPDATE_EVENT_VERSION_0,
    CONFIG_UPDATE_TOPIC,
};
