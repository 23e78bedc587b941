//! Retention of wire fields not present in the schema.

use std::collections::BTreeMap;

use ::bytes::{BufMut, Bytes};

use crate::encoding::{skip_field, DecodeContext, WireType};
use crate::error::DecodeError;
use crate::reader::WireReader;

/// The unknown fields retained by a decoded message.
///
/// A multimap from field number to the verbatim raw bytes of each occurrence,
/// tag included. Storing the raw span (rather than a re-encodable decoded
/// form) keeps round-trips byte-identical even for non-canonical varints.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct UnknownFieldSet {
    fields: BTreeMap<u32, Vec<Bytes>>,
}

impl UnknownFieldSet {
    /// Creates an empty `UnknownFieldSet`.
    pub fn new() -> UnknownFieldSet {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The total number of retained field occurrences.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Gets an iterator over the retained occurrences, grouped by field
    /// number, each group in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Bytes)> {
        self.fields
            .iter()
            .flat_map(|(field_number, raw)| core::iter::repeat(*field_number).zip(raw))
    }

    /// Consumes the body of the field whose key began at `field_start` and,
    /// when the context retains unknown fields, records the raw span
    /// verbatim. Group delimiters are fatal.
    pub fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        field_start: usize,
        r: &mut WireReader<'_>,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        skip_field(wire_type, r).map_err(|err| err.at_unknown(field_start))?;
        if ctx.retain_unknown_fields() {
            let raw = Bytes::copy_from_slice(r.raw_since(field_start));
            self.fields.entry(field_number).or_default().push(raw);
        }
        Ok(())
    }

    /// Appends every retained occurrence verbatim.
    pub fn encode_raw(&self, buf: &mut impl BufMut) {
        for (_, raw) in self.iter() {
            buf.put_slice(raw);
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.iter().map(|(_, raw)| raw.len()).sum()
    }
}
