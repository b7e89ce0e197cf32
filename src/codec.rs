//! Versioned CBOR envelope for every stored record.
//!
//! Records are written as a two element array `[schema_version, record]`. A record
//! written under another schema version is refused on read instead of being
//! decoded on a best effort basis; a schema change must ship with an explicit
//! migration that rewrites the affected trees.
use super::error::StorageError;

pub const SCHEMA_VERSION: u16 = 1;

pub fn encode_record<T: minicbor::Encode<()>>(record: &T) -> Result<Vec<u8>, StorageError> {
    let mut encoder = minicbor::Encoder::new(Vec::new());
    encoder
        .array(2)
        .and_then(|e| e.u16(SCHEMA_VERSION))
        .and_then(|e| e.encode(record))
        .map_err(|e| StorageError::Encode(e.to_string()))?;

    Ok(encoder.into_writer())
}

pub fn decode_record<'b, T: minicbor::Decode<'b, ()>>(bytes: &'b [u8]) -> Result<T, StorageError> {
    let mut decoder = minicbor::Decoder::new(bytes);

    if decoder.array()? != Some(2) {
        return Err(minicbor::decode::Error::message("record is not a versioned envelope").into());
    }
    let found = decoder.u16()?;
    if found != SCHEMA_VERSION {
        return Err(StorageError::SchemaVersion {
            found,
            expected: SCHEMA_VERSION,
        });
    }

    Ok(decoder.decode()?)
}
