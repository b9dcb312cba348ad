//! Key-value list with message, the shared text layout of commit and tag
//! payloads.
//!
//! ```text
//! tree <sha>
//! parent <sha>
//! author <name> <email> <timestamp> <tz>
//!
//! <free-text message>
//! ```
//!
//! Values may span lines; continuation lines are prefixed with a single
//! space on disk and joined with plain newlines in memory. Field order is
//! preserved so that parse/serialize round-trips byte-identically.

use crate::error::Error;
use bytes::Bytes;
use std::io::Write;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    fields: Vec<(String, String)>,
    message: String,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First value for `key`, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in order of appearance.
    pub fn all<'k>(&'k self, key: &'k str) -> impl Iterator<Item = &'k str> {
        self.fields
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse from payload bytes with an explicit cursor over the buffer.
    pub fn parse(raw: &[u8]) -> anyhow::Result<Self> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0;

        while pos < raw.len() {
            // A blank line separates the fields from the message.
            if raw[pos] == b'\n' {
                kvlm.message = String::from_utf8(raw[pos + 1..].to_vec())?;
                return Ok(kvlm);
            }

            let space = raw[pos..]
                .iter()
                .position(|&b| b == b' ')
                .map(|i| pos + i)
                .ok_or_else(|| Error::Format("header line without key separator".into()))?;
            let newline = raw[pos..].iter().position(|&b| b == b'\n').map(|i| pos + i);
            if newline.is_some_and(|nl| nl < space) {
                return Err(Error::Format("header line without key separator".into()).into());
            }
            let key = String::from_utf8(raw[pos..space].to_vec())?;

            // The value runs until a newline not followed by a space.
            let mut end = space;
            loop {
                match raw[end + 1..].iter().position(|&b| b == b'\n') {
                    Some(i) => end = end + 1 + i,
                    None => {
                        end = raw.len();
                        break;
                    }
                }
                if raw.get(end + 1) != Some(&b' ') {
                    break;
                }
            }

            let value = String::from_utf8(raw[space + 1..end].to_vec())?.replace("\n ", "\n");
            kvlm.fields.push((key, value));

            pos = end + 1;
        }

        Ok(kvlm)
    }

    pub fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut out = Vec::new();

        for (key, value) in &self.fields {
            out.write_all(key.as_bytes())?;
            out.push(b' ');
            out.write_all(value.replace('\n', "\n ").as_bytes())?;
            out.push(b'\n');
        }
        out.push(b'\n');
        out.write_all(self.message.as_bytes())?;

        Ok(Bytes::from(out))
    }
}
