//! PassFort vault entries.

use chrono::{DateTime, Utc};

use crate::codec::{self, Entity, Record, RecordReader, RecordWriter, Result};
use crate::crypto::EncryptedSecret;

/// A stored credential. The password itself is only held encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEntry {
    pub id: u64,
    pub title: String,
    pub username: String,
    pub url: String,
    pub notes: String,
    pub secret: EncryptedSecret,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl PasswordEntry {
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        secret: EncryptedSecret,
    ) -> Self {
        let now = codec::now();
        Self {
            id: 0,
            title: title.into(),
            username: username.into(),
            url: String::new(),
            notes: String::new(),
            secret,
            created_at: now,
            modified_at: now,
        }
    }

    /// Replace the encrypted password and bump the modification time.
    pub fn replace_secret(&mut self, secret: EncryptedSecret) {
        self.secret = secret;
        self.modified_at = codec::now();
    }
}

impl Record for PasswordEntry {
    fn encode(&self, w: &mut RecordWriter) -> Result<()> {
        w.write_u64(self.id);
        w.write_str(&self.title)?;
        w.write_str(&self.username)?;
        w.write_str(&self.url)?;
        w.write_str(&self.notes)?;
        w.write_bytes(&self.secret.to_blob())?;
        w.write_timestamp(&self.created_at);
        w.write_timestamp(&self.modified_at);
        Ok(())
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            id: r.read_u64()?,
            title: r.read_string()?,
            username: r.read_string()?,
            url: r.read_string()?,
            notes: r.read_string()?,
            secret: EncryptedSecret::from_blob(r.read_byte_slice()?)?,
            created_at: r.read_timestamp()?,
            modified_at: r.read_timestamp()?,
        })
    }
}

impl Entity for PasswordEntry {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_from_slice, encode_to_vec, CodecError};
    use crate::crypto::IV_SIZE;

    #[test]
    fn round_trip_keeps_blob() {
        let secret = EncryptedSecret {
            iv: [7; IV_SIZE],
            ciphertext: vec![1, 2, 3, 4],
        };
        let mut entry = PasswordEntry::new("Mail", "alice", secret);
        entry.url = "https://mail.example.com".into();
        let back: PasswordEntry = decode_from_slice(&encode_to_vec(&entry).unwrap()).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn short_blob_is_a_format_error() {
        let mut w = RecordWriter::new();
        w.write_u64(1);
        for _ in 0..4 {
            w.write_str("").unwrap();
        }
        w.write_bytes(&[0; 4]).unwrap();
        w.write_i64(0);
        w.write_i64(0);
        let err = decode_from_slice::<PasswordEntry>(w.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { field: "password blob", .. }));
    }
}
