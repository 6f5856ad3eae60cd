// Copyright 2026 Cornell University
// released under MIT License

//! # Word codecs
//! A codec converts between the integer arguments written in a test script
//! and the typed words exchanged with a DUT port. There is one codec per
//! stream kind; the registry picks the right one for each interface.

use std::fmt;

use baa::{BitVecOps, BitVecValue};
use thiserror::Error;

/// Widest field a script argument can describe
pub const MAX_FIELD_WIDTH: u32 = 64;

/// Truncates `value` to its lowest `width` bits
pub fn truncate(value: u64, width: u32) -> u64 {
    if width >= 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

fn field(value: u64, width: u32) -> BitVecValue {
    BitVecValue::from_u64(truncate(value, width), width)
}

/// A `Word` is the unit of data held by a port: an ordered list of
/// fixed-width unsigned fields (e.g. `data` followed by `last`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Word {
    fields: Vec<BitVecValue>,
}

impl Word {
    pub fn new(fields: Vec<BitVecValue>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[BitVecValue] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Returns field `idx` as a `u64`
    /// (fields are never wider than `MAX_FIELD_WIDTH`)
    pub fn value(&self, idx: usize) -> u64 {
        self.fields[idx].to_u64().unwrap_or_default()
    }

    pub fn values(&self) -> Vec<u64> {
        (0..self.arity()).map(|idx| self.value(idx)).collect()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("`{kind}` words have {expected} fields but {found} were supplied")]
    ArityMismatch {
        kind: String,
        expected: usize,
        found: usize,
    },
    #[error("`{kind}` field {field} is {width} bits wide and cannot hold {value}")]
    ValueTooWide {
        kind: String,
        field: usize,
        value: u64,
        width: u32,
    },
}

/// Converts script arguments to and from the words of one stream kind.
/// All values are unsigned. Encoding truncates them to the declared field
/// widths; comparisons do not.
pub trait WordCodec: fmt::Debug {
    /// The stream-kind tag scripts use to refer to this codec
    fn kind(&self) -> &str;

    /// Width of every field, in argument order
    fn field_widths(&self) -> &[u32];

    fn arity(&self) -> usize {
        self.field_widths().len()
    }

    fn check_arity(&self, found: usize) -> Result<(), CodecError> {
        if found == self.arity() {
            Ok(())
        } else {
            Err(CodecError::ArityMismatch {
                kind: self.kind().to_string(),
                expected: self.arity(),
                found,
            })
        }
    }

    /// Fails on the first argument that does not fit its field
    fn check_fits(&self, args: &[u64]) -> Result<(), CodecError> {
        let widths = self.field_widths();
        let too_wide = args
            .iter()
            .zip(widths)
            .position(|(value, width)| truncate(*value, *width) != *value);
        match too_wide {
            Some(field) => Err(CodecError::ValueTooWide {
                kind: self.kind().to_string(),
                field,
                value: args[field],
                width: widths[field],
            }),
            None => Ok(()),
        }
    }

    /// Packs `args` into a word
    fn encode(&self, args: &[u64]) -> Result<Word, CodecError> {
        self.check_arity(args.len())?;
        let fields = args
            .iter()
            .zip(self.field_widths())
            .map(|(value, width)| field(*value, *width))
            .collect();
        Ok(Word::new(fields))
    }

    /// Unpacks a word into its argument list
    fn decode(&self, word: &Word) -> Result<Vec<u64>, CodecError> {
        self.check_arity(word.arity())?;
        Ok(word.values())
    }

    /// Exact element-wise equality over the declared arity
    fn equal(&self, lhs: &[u64], rhs: &[u64]) -> bool {
        lhs.len() == self.arity() && lhs == rhs
    }

    /// The all-zero word (initial value of signal ports)
    fn zero(&self) -> Word {
        Word::new(
            self.field_widths()
                .iter()
                .map(|width| BitVecValue::zero(*width))
                .collect(),
        )
    }
}

fn check_width(width: u32) {
    assert!(
        (1..=MAX_FIELD_WIDTH).contains(&width),
        "field widths must be between 1 and {MAX_FIELD_WIDTH} bits, got {width}"
    );
}

/// AXI4-Stream style word. Fields are `data` and `last`, optionally
/// followed by the `keep` and `dest` side channels.
#[derive(Debug, Clone)]
pub struct AxisCodec {
    kind: String,
    widths: Vec<u32>,
}

impl AxisCodec {
    /// A `data` + `last` word
    pub fn new(kind: impl ToString, data_width: u32) -> Self {
        check_width(data_width);
        Self {
            kind: kind.to_string(),
            widths: vec![data_width, 1],
        }
    }

    /// A `data` + `last` + `keep` + `dest` word
    pub fn with_side_channels(
        kind: impl ToString,
        data_width: u32,
        keep_width: u32,
        dest_width: u32,
    ) -> Self {
        check_width(keep_width);
        check_width(dest_width);
        let mut codec = Self::new(kind, data_width);
        codec.widths.extend([keep_width, dest_width]);
        codec
    }

    pub fn data_width(&self) -> u32 {
        self.widths[0]
    }

    /// Builds a word with the given `data` and `last`; side channels are zero
    pub fn word(&self, data: u64, last: bool) -> Word {
        let mut fields = vec![field(data, self.widths[0]), field(last as u64, 1)];
        let side_channels = self.widths[2..].iter().map(|width| BitVecValue::zero(*width));
        fields.extend(side_channels);
        Word::new(fields)
    }
}

impl WordCodec for AxisCodec {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn field_widths(&self) -> &[u32] {
        &self.widths
    }
}

/// A single unsigned value, used for scalar signal ports
#[derive(Debug, Clone)]
pub struct ScalarCodec {
    kind: String,
    width: [u32; 1],
}

impl ScalarCodec {
    /// Creates a codec of kind `uint_<width>`
    pub fn new(width: u32) -> Self {
        check_width(width);
        Self {
            kind: format!("uint_{width}"),
            width: [width],
        }
    }

    pub fn word(&self, value: u64) -> Word {
        Word::new(vec![field(value, self.width[0])])
    }
}

impl WordCodec for ScalarCodec {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn field_widths(&self) -> &[u32] {
        &self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn encode_truncates_to_field_width() {
        let codec = AxisCodec::new("uaxis_l", 8);
        let word = codec.encode(&[0x1ff, 3]).unwrap();
        assert_eq!(word.values(), vec![0xff, 1]);
        assert_eq!(word.fields()[0].width(), 8);
        assert_eq!(word.fields()[1].width(), 1);
    }

    #[test]
    fn encode_rejects_wrong_arity() {
        let codec = AxisCodec::new("uaxis_l", 64);
        let err = codec.encode(&[1, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            CodecError::ArityMismatch {
                kind: "uaxis_l".to_string(),
                expected: 2,
                found: 3,
            }
        );
        assert!(ScalarCodec::new(3).encode(&[]).is_err());
    }

    #[test]
    fn decode_rejects_word_of_another_shape() {
        let scalar = ScalarCodec::new(16);
        let axis = AxisCodec::new("uaxis_l", 16);
        let word = axis.encode(&[4, 1]).unwrap();
        assert!(scalar.decode(&word).is_err());
    }

    #[test]
    fn equality_is_exact_and_elementwise() {
        let codec = AxisCodec::new("uaxis_l", 4);
        assert!(codec.equal(&[6, 0], &[6, 0]));
        // bits above the field width are not dropped
        assert!(!codec.equal(&[0x16, 2], &[6, 0]));
        assert!(!codec.equal(&[7, 0], &[6, 0]));
        assert!(!codec.equal(&[6, 1], &[6, 0]));
        // a list of the wrong arity never compares equal
        assert!(!codec.equal(&[6], &[6]));
    }

    #[test]
    fn expectations_must_fit_their_fields() {
        let codec = AxisCodec::new("uaxis_l", 4);
        assert_eq!(codec.check_fits(&[15, 1]), Ok(()));
        assert_eq!(
            codec.check_fits(&[6, 2]),
            Err(CodecError::ValueTooWide {
                kind: "uaxis_l".to_string(),
                field: 1,
                value: 2,
                width: 1,
            })
        );
        let err = codec.check_fits(&[0x16, 0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`uaxis_l` field 0 is 4 bits wide and cannot hold 22"
        );
        let wide = AxisCodec::new("uaxis_l", 64);
        assert_eq!(wide.check_fits(&[u64::MAX, 1]), Ok(()));
    }

    #[test]
    fn side_channels_extend_the_word() {
        let codec = AxisCodec::with_side_channels("uaxis_lkd", 64, 8, 4);
        assert_eq!(codec.arity(), 4);
        assert_eq!(codec.data_width(), 64);
        let word = codec.encode(&[u64::MAX, 1, 0x1ff, 0x13]).unwrap();
        assert_eq!(word.values(), vec![u64::MAX, 1, 0xff, 0x3]);
        assert_eq!(codec.word(7, true).values(), vec![7, 1, 0, 0]);
        let decoded = codec.decode(&codec.word(7, false)).unwrap();
        assert_eq!(decoded, vec![7, 0, 0, 0]);
    }

    #[test]
    fn zero_word_matches_declared_shape() {
        let codec = ScalarCodec::new(3);
        assert_eq!(codec.kind(), "uint_3");
        assert_eq!(codec.zero().values(), vec![0]);
        assert_eq!(codec.zero().fields()[0].width(), 3);
        assert_eq!(codec.word(9).values(), vec![1]);
    }

    #[test]
    fn decode_inverts_encode_for_in_range_values() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let codecs: Vec<Box<dyn WordCodec>> = vec![
            Box::new(AxisCodec::new("uaxis_l", 64)),
            Box::new(AxisCodec::new("uaxis_l32", 32)),
            Box::new(AxisCodec::with_side_channels("uaxis_lkd", 48, 6, 4)),
            Box::new(ScalarCodec::new(1)),
            Box::new(ScalarCodec::new(13)),
        ];
        for codec in &codecs {
            for _ in 0..32 {
                let args: Vec<u64> = codec
                    .field_widths()
                    .iter()
                    .map(|width| truncate(rng.gen::<u64>(), *width))
                    .collect();
                let word = codec.encode(&args).unwrap();
                assert_eq!(codec.decode(&word).unwrap(), args, "{}", codec.kind());
            }
        }
    }
}
