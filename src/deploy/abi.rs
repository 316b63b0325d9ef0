//! Solidity ABI encoding for nested records.
//!
//! [`AbiType`] is the schema, [`AbiValue`] the value tree. Encoding follows the
//! canonical head/tail layout: static members are written in declaration
//! order; dynamic members (`string`, `bytes`, `T[]`, and tuples or fixed
//! arrays holding any dynamic member) reserve one offset word in the head and
//! append their length-prefixed, zero-padded payload to the tail. Offsets are
//! relative to the start of the enclosing sequence.
//!
//! [`decode_params`] is the strict inverse; it is used on `eth_call` return
//! data and rejects dirty padding or out-of-range words.

use crate::domain::errors::EncodingError;
use alloy_primitives::{Address, B256, I256, U256};
use sha3::{Digest, Keccak256};
use std::fmt;

const WORD: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiType {
    Address,
    Bool,
    Uint(usize),
    Int(usize),
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<AbiType>),
    FixedArray(Box<AbiType>, usize),
    Tuple(Vec<AbiType>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    Uint(U256),
    Int(I256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

/// Keccak-256 (the pre-standard variant used by the EVM, not SHA3-256).
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let digest: [u8; 32] = Keccak256::digest(data.as_ref()).into();
    B256::from(digest)
}

/// `abi.encode(value)` for a single top-level value.
pub fn encode_record(schema: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodingError> {
    encode_params(std::slice::from_ref(schema), std::slice::from_ref(value))
}

/// `abi.encode(v0, v1, ...)`.
pub fn encode_params(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, EncodingError> {
    encode_sequence(types, values, "arg")
}

pub fn decode_params(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, EncodingError> {
    decode_sequence(types, data, 0)
}

pub fn decode_record(schema: &AbiType, data: &[u8]) -> Result<AbiValue, EncodingError> {
    let mut values = decode_params(std::slice::from_ref(schema), data)?;
    values.pop().ok_or(EncodingError::Arity {
        field: "record".to_string(),
        expected: 1,
        got: 0,
    })
}

// ── Schema ───────────────────────────────────────────────────────────────────

impl AbiType {
    /// Parse a Solidity type string such as `(address,uint16[],bytes)[]`.
    /// `uint`/`int` normalize to their 256-bit forms.
    pub fn parse(raw: &str) -> Result<Self, EncodingError> {
        let compact = raw
            .chars()
            .filter(|char| !char.is_whitespace())
            .collect::<String>();
        parse_compact(&compact)
    }

    pub fn canonical(&self) -> String {
        match self {
            AbiType::Address => "address".to_string(),
            AbiType::Bool => "bool".to_string(),
            AbiType::Uint(bits) => format!("uint{bits}"),
            AbiType::Int(bits) => format!("int{bits}"),
            AbiType::FixedBytes(width) => format!("bytes{width}"),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::Array(inner) => format!("{}[]", inner.canonical()),
            AbiType::FixedArray(inner, len) => format!("{}[{len}]", inner.canonical()),
            AbiType::Tuple(components) => format!(
                "({})",
                components
                    .iter()
                    .map(AbiType::canonical)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
            AbiType::Tuple(components) => components.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of its enclosing sequence.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD;
        }
        match self {
            AbiType::FixedArray(inner, len) => inner.head_size().saturating_mul(*len),
            AbiType::Tuple(components) => components.iter().map(AbiType::head_size).sum(),
            _ => WORD,
        }
    }

    fn check_width(&self) -> Result<(), EncodingError> {
        let valid = match self {
            AbiType::Uint(bits) | AbiType::Int(bits) => {
                *bits >= 8 && *bits <= 256 && bits % 8 == 0
            }
            AbiType::FixedBytes(width) => (1..=32).contains(width),
            _ => true,
        };
        if valid {
            Ok(())
        } else {
            Err(EncodingError::UnsupportedType(self.canonical()))
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn parse_compact(kind: &str) -> Result<AbiType, EncodingError> {
    if kind.is_empty() {
        return Err(EncodingError::UnsupportedType("empty type".to_string()));
    }

    if kind.ends_with(']') {
        let open = kind
            .rfind('[')
            .ok_or_else(|| EncodingError::UnsupportedType(kind.to_string()))?;
        let inner = parse_compact(&kind[..open])?;
        let len_raw = &kind[open + 1..kind.len() - 1];
        if len_raw.is_empty() {
            return Ok(AbiType::Array(Box::new(inner)));
        }
        let len = len_raw
            .parse::<usize>()
            .map_err(|_error| EncodingError::UnsupportedType(kind.to_string()))?;
        return Ok(AbiType::FixedArray(Box::new(inner), len));
    }

    if let Some(body) = kind.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        if body.is_empty() {
            return Ok(AbiType::Tuple(Vec::new()));
        }
        let components = split_top_level(body)?
            .into_iter()
            .map(parse_compact)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AbiType::Tuple(components));
    }

    let parsed = match kind {
        "address" => AbiType::Address,
        "bool" => AbiType::Bool,
        "string" => AbiType::String,
        "bytes" => AbiType::Bytes,
        "uint" => AbiType::Uint(256),
        "int" => AbiType::Int(256),
        _ => {
            if let Some(bits) = kind.strip_prefix("uint") {
                AbiType::Uint(parse_width(bits, kind)?)
            } else if let Some(bits) = kind.strip_prefix("int") {
                AbiType::Int(parse_width(bits, kind)?)
            } else if let Some(width) = kind.strip_prefix("bytes") {
                AbiType::FixedBytes(parse_width(width, kind)?)
            } else {
                return Err(EncodingError::UnsupportedType(kind.to_string()));
            }
        }
    };
    parsed.check_width()?;
    Ok(parsed)
}

fn parse_width(raw: &str, kind: &str) -> Result<usize, EncodingError> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(EncodingError::UnsupportedType(kind.to_string()));
    }
    raw.parse::<usize>()
        .map_err(|_error| EncodingError::UnsupportedType(kind.to_string()))
}

fn split_top_level(body: &str) -> Result<Vec<&str>, EncodingError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (index, char) in body.char_indices() {
        match char {
            '(' => depth = depth.saturating_add(1),
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| EncodingError::UnsupportedType(body.to_string()))?;
            }
            ',' if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(EncodingError::UnsupportedType(body.to_string()));
    }
    parts.push(&body[start..]);
    Ok(parts)
}

// ── Values ───────────────────────────────────────────────────────────────────

impl AbiValue {
    pub fn uint(value: u64) -> Self {
        AbiValue::Uint(U256::from(value))
    }

    pub fn int(value: i64) -> Self {
        let magnitude = U256::from(value.unsigned_abs());
        let raw = if value < 0 {
            magnitude.wrapping_neg()
        } else {
            magnitude
        };
        AbiValue::Int(I256::from_raw(raw))
    }

    pub fn bytes32(value: B256) -> Self {
        AbiValue::FixedBytes(value.to_vec())
    }

    pub fn string(value: impl Into<String>) -> Self {
        AbiValue::String(value.into())
    }

    pub fn addresses(values: impl IntoIterator<Item = Address>) -> Self {
        AbiValue::Array(values.into_iter().map(AbiValue::Address).collect())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Address(_) => "address",
            AbiValue::Bool(_) => "bool",
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(address) => Some(*address),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::Bytes(bytes) | AbiValue::FixedBytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(text) => Some(text),
            _ => None,
        }
    }

    /// Members of a tuple or elements of an array.
    pub fn items(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array(items) | AbiValue::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

// ── Functions ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub inputs: Vec<AbiType>,
    pub outputs: Vec<AbiType>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, inputs: Vec<AbiType>, outputs: Vec<AbiType>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
        }
    }

    /// Parse `name(type,...)`.
    pub fn parse(signature: &str) -> Result<Self, EncodingError> {
        let compact = signature
            .chars()
            .filter(|char| !char.is_whitespace())
            .collect::<String>();
        let open = compact
            .find('(')
            .ok_or_else(|| EncodingError::UnsupportedType(signature.to_string()))?;
        let name = &compact[..open];
        if name.is_empty() {
            return Err(EncodingError::UnsupportedType(signature.to_string()));
        }
        let inputs = match parse_compact(&compact[open..])? {
            AbiType::Tuple(components) => components,
            _ => return Err(EncodingError::UnsupportedType(signature.to_string())),
        };
        Ok(Self::new(name, inputs, Vec::new()))
    }

    pub fn with_outputs(mut self, outputs: Vec<AbiType>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn signature(&self) -> String {
        let args = self
            .inputs
            .iter()
            .map(AbiType::canonical)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({args})", self.name)
    }

    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector()))
    }

    /// Calldata: 4-byte selector followed by the encoded arguments.
    pub fn encode_input(&self, args: &[AbiValue]) -> Result<Vec<u8>, EncodingError> {
        let encoded = encode_params(&self.inputs, args)?;
        let mut out = Vec::with_capacity(4 + encoded.len());
        out.extend_from_slice(&self.selector());
        out.extend_from_slice(&encoded);
        Ok(out)
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<AbiValue>, EncodingError> {
        decode_params(&self.outputs, data)
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

fn encode_sequence(
    types: &[AbiType],
    values: &[AbiValue],
    field: &str,
) -> Result<Vec<u8>, EncodingError> {
    if types.len() != values.len() {
        return Err(EncodingError::Arity {
            field: field.to_string(),
            expected: types.len(),
            got: values.len(),
        });
    }

    let head_size: usize = types.iter().map(AbiType::head_size).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (index, (kind, value)) in types.iter().zip(values).enumerate() {
        let encoded = encode_value(kind, value, &format!("{field}.{index}"))?;
        if kind.is_dynamic() {
            head.extend_from_slice(&usize_word(head_size.saturating_add(tail.len())));
            tail.extend_from_slice(&encoded);
        } else {
            head.extend_from_slice(&encoded);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

fn encode_value(kind: &AbiType, value: &AbiValue, field: &str) -> Result<Vec<u8>, EncodingError> {
    kind.check_width()?;
    match (kind, value) {
        (AbiType::Address, AbiValue::Address(address)) => Ok(address.into_word().to_vec()),
        (AbiType::Bool, AbiValue::Bool(flag)) => Ok(usize_word(usize::from(*flag)).to_vec()),
        (AbiType::Uint(bits), AbiValue::Uint(number)) => {
            if number.bit_len() > *bits {
                return Err(out_of_range(field, kind));
            }
            Ok(number.to_be_bytes::<32>().to_vec())
        }
        (AbiType::Int(bits), AbiValue::Int(number)) => {
            if !int_fits(*number, *bits) {
                return Err(out_of_range(field, kind));
            }
            Ok(number.into_raw().to_be_bytes::<32>().to_vec())
        }
        (AbiType::FixedBytes(width), AbiValue::FixedBytes(bytes)) => {
            if bytes.len() != *width {
                return Err(out_of_range(field, kind));
            }
            let mut word = vec![0u8; WORD];
            word[..bytes.len()].copy_from_slice(bytes);
            Ok(word)
        }
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => Ok(encode_dynamic_bytes(bytes)),
        (AbiType::String, AbiValue::String(text)) => Ok(encode_dynamic_bytes(text.as_bytes())),
        (AbiType::Array(inner), AbiValue::Array(items)) => {
            let element_types = vec![(**inner).clone(); items.len()];
            let mut out = usize_word(items.len()).to_vec();
            out.extend_from_slice(&encode_sequence(&element_types, items, field)?);
            Ok(out)
        }
        (AbiType::FixedArray(inner, len), AbiValue::Array(items)) => {
            if items.len() != *len {
                return Err(EncodingError::Arity {
                    field: field.to_string(),
                    expected: *len,
                    got: items.len(),
                });
            }
            let element_types = vec![(**inner).clone(); *len];
            encode_sequence(&element_types, items, field)
        }
        (AbiType::Tuple(components), AbiValue::Tuple(items)) => {
            encode_sequence(components, items, field)
        }
        _ => Err(EncodingError::TypeMismatch {
            field: field.to_string(),
            expected: kind.canonical(),
            found: value.kind().to_string(),
        }),
    }
}

/// Length word followed by the payload zero-padded to a word boundary.
fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = padded_len(bytes.len());
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD).saturating_mul(WORD)
}

fn usize_word(value: usize) -> [u8; 32] {
    U256::from(value).to_be_bytes::<32>()
}

fn int_fits(value: I256, bits: usize) -> bool {
    let raw = value.into_raw();
    let magnitude = if value.is_negative() { !raw } else { raw };
    magnitude.bit_len() < bits
}

fn out_of_range(field: &str, kind: &AbiType) -> EncodingError {
    EncodingError::OutOfRange {
        field: field.to_string(),
        kind: kind.canonical(),
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

fn decode_sequence(
    types: &[AbiType],
    data: &[u8],
    base: usize,
) -> Result<Vec<AbiValue>, EncodingError> {
    let mut cursor = base;
    let mut out = Vec::with_capacity(types.len());
    for kind in types {
        if kind.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let start = base.checked_add(offset).ok_or(EncodingError::OutOfBounds {
                offset,
                len: data.len(),
            })?;
            out.push(decode_value(kind, data, start)?);
            cursor = cursor.saturating_add(WORD);
        } else {
            out.push(decode_value(kind, data, cursor)?);
            cursor = cursor.saturating_add(kind.head_size());
        }
    }
    Ok(out)
}

fn decode_value(kind: &AbiType, data: &[u8], at: usize) -> Result<AbiValue, EncodingError> {
    kind.check_width()?;
    match kind {
        AbiType::Address => {
            let word = read_word(data, at)?;
            if word[..12].iter().any(|byte| *byte != 0) {
                return Err(EncodingError::NonCanonical(format!(
                    "dirty address word at offset {at}"
                )));
            }
            Ok(AbiValue::Address(Address::from_slice(&word[12..])))
        }
        AbiType::Bool => match U256::from_be_bytes(read_word(data, at)?) {
            value if value == U256::ZERO => Ok(AbiValue::Bool(false)),
            value if value == U256::from(1u8) => Ok(AbiValue::Bool(true)),
            _ => Err(EncodingError::NonCanonical(format!(
                "bool word at offset {at} is neither 0 nor 1"
            ))),
        },
        AbiType::Uint(bits) => {
            let value = U256::from_be_bytes(read_word(data, at)?);
            if value.bit_len() > *bits {
                return Err(EncodingError::NonCanonical(format!(
                    "uint{bits} overflow at offset {at}"
                )));
            }
            Ok(AbiValue::Uint(value))
        }
        AbiType::Int(bits) => {
            let value = I256::from_raw(U256::from_be_bytes(read_word(data, at)?));
            if !int_fits(value, *bits) {
                return Err(EncodingError::NonCanonical(format!(
                    "int{bits} is not sign-extended at offset {at}"
                )));
            }
            Ok(AbiValue::Int(value))
        }
        AbiType::FixedBytes(width) => {
            let word = read_word(data, at)?;
            if word[*width..].iter().any(|byte| *byte != 0) {
                return Err(EncodingError::NonCanonical(format!(
                    "bytes{width} has dirty padding at offset {at}"
                )));
            }
            Ok(AbiValue::FixedBytes(word[..*width].to_vec()))
        }
        AbiType::Bytes => Ok(AbiValue::Bytes(read_dynamic_bytes(data, at)?)),
        AbiType::String => {
            let bytes = read_dynamic_bytes(data, at)?;
            String::from_utf8(bytes)
                .map(AbiValue::String)
                .map_err(|error| EncodingError::NonCanonical(format!("invalid utf-8: {error}")))
        }
        AbiType::Array(inner) => {
            let len = read_usize(data, at)?;
            // Every element takes at least one head word.
            if len > data.len() / WORD {
                return Err(EncodingError::OutOfBounds {
                    offset: at,
                    len: data.len(),
                });
            }
            let element_types = vec![(**inner).clone(); len];
            decode_sequence(&element_types, data, at.saturating_add(WORD)).map(AbiValue::Array)
        }
        AbiType::FixedArray(inner, len) => {
            let element_types = vec![(**inner).clone(); *len];
            decode_sequence(&element_types, data, at).map(AbiValue::Array)
        }
        AbiType::Tuple(components) => decode_sequence(components, data, at).map(AbiValue::Tuple),
    }
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; 32], EncodingError> {
    let end = at.checked_add(WORD).ok_or(EncodingError::OutOfBounds {
        offset: at,
        len: data.len(),
    })?;
    let slice = data.get(at..end).ok_or(EncodingError::OutOfBounds {
        offset: at,
        len: data.len(),
    })?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(slice);
    Ok(word)
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, EncodingError> {
    let value = U256::from_be_bytes(read_word(data, at)?);
    if value.bit_len() > 32 {
        return Err(EncodingError::OutOfBounds {
            offset: at,
            len: data.len(),
        });
    }
    Ok(value.as_limbs()[0] as usize)
}

fn read_dynamic_bytes(data: &[u8], at: usize) -> Result<Vec<u8>, EncodingError> {
    let len = read_usize(data, at)?;
    let start = at.saturating_add(WORD);
    let end = start.saturating_add(padded_len(len));
    let padded = data.get(start..end).ok_or(EncodingError::OutOfBounds {
        offset: start,
        len: data.len(),
    })?;
    if padded[len..].iter().any(|byte| *byte != 0) {
        return Err(EncodingError::NonCanonical(format!(
            "dynamic bytes at offset {at} have dirty padding"
        )));
    }
    Ok(padded[..len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u64) -> String {
        format!("{value:064x}")
    }

    #[test]
    fn selector_matches_known_transfer_selector() {
        let spec = FunctionSpec::parse("transfer(address, uint)").expect("signature should parse");
        assert_eq!(spec.signature(), "transfer(address,uint256)");
        assert_eq!(spec.selector_hex(), "0xa9059cbb");
    }

    #[test]
    fn keccak_of_empty_input_is_the_well_known_digest() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(keccak256(b"abc"), alloy_primitives::keccak256(b"abc"));
    }

    #[test]
    fn parse_and_canonical_support_nested_tuples_and_arrays() {
        let parsed = AbiType::parse("((address, uint)[], int24[2], bytes32, string)")
            .expect("type should parse");
        assert_eq!(
            parsed.canonical(),
            "((address,uint256)[],int24[2],bytes32,string)"
        );
        assert!(parsed.is_dynamic());
        assert!(AbiType::parse("uint7").is_err());
        assert!(AbiType::parse("bytes33").is_err());
        assert!(AbiType::parse("(address,uint256").is_err());
        assert!(AbiType::parse("fixed128x18").is_err());
    }

    #[test]
    fn encode_transfer_call_matches_expected_calldata() {
        let spec = FunctionSpec::parse("transfer(address,uint256)").expect("signature should parse");
        let to = Address::repeat_byte(0x33);
        let calldata = spec
            .encode_input(&[AbiValue::Address(to), AbiValue::uint(1_000)])
            .expect("transfer should encode");
        assert_eq!(
            hex::encode(calldata),
            format!("a9059cbb{:0>64}{}", "33".repeat(20), word(1_000))
        );
    }

    #[test]
    fn encode_matches_solidity_documentation_example() {
        // f(uint256,uint32[],bytes10,bytes), the worked example from the Solidity ABI docs.
        let types = [
            AbiType::Uint(256),
            AbiType::Array(Box::new(AbiType::Uint(32))),
            AbiType::FixedBytes(10),
            AbiType::Bytes,
        ];
        let values = [
            AbiValue::uint(0x123),
            AbiValue::Array(vec![AbiValue::uint(0x456), AbiValue::uint(0x789)]),
            AbiValue::FixedBytes(b"1234567890".to_vec()),
            AbiValue::Bytes(b"Hello, world!".to_vec()),
        ];
        let encoded = encode_params(&types, &values).expect("example should encode");
        let expected = [
            word(0x123),
            word(0x80),
            format!("{:0<64}", hex::encode(b"1234567890")),
            word(0xe0),
            word(2),
            word(0x456),
            word(0x789),
            word(0xd),
            format!("{:0<64}", hex::encode(b"Hello, world!")),
        ]
        .concat();
        assert_eq!(hex::encode(&encoded), expected);
        assert_eq!(
            decode_params(&types, &encoded).expect("example should decode"),
            values.to_vec()
        );
    }

    #[test]
    fn negative_ticks_are_sign_extended() {
        let encoded =
            encode_params(&[AbiType::Int(24)], &[AbiValue::int(-200)]).expect("int24 encodes");
        assert_eq!(
            hex::encode(&encoded),
            format!("{}ff38", "f".repeat(60))
        );
        let decoded = decode_params(&[AbiType::Int(24)], &encoded).expect("int24 decodes");
        assert_eq!(decoded, vec![AbiValue::int(-200)]);
    }

    #[test]
    fn integer_widths_are_enforced() {
        let err = encode_params(&[AbiType::Uint(16)], &[AbiValue::uint(70_000)])
            .expect_err("70000 does not fit uint16");
        assert!(matches!(err, EncodingError::OutOfRange { .. }), "got {err}");

        assert!(encode_params(&[AbiType::Int(24)], &[AbiValue::int(8_388_607)]).is_ok());
        assert!(encode_params(&[AbiType::Int(24)], &[AbiValue::int(-8_388_608)]).is_ok());
        assert!(encode_params(&[AbiType::Int(24)], &[AbiValue::int(8_388_608)]).is_err());
        assert!(encode_params(&[AbiType::Int(24)], &[AbiValue::int(-8_388_609)]).is_err());
    }

    #[test]
    fn nested_record_round_trips() {
        let schema = AbiType::parse(
            "(address,string,(int24[],uint16[],bytes),(address,uint256,uint16,bytes)[],bool)",
        )
        .expect("schema should parse");
        let value = AbiValue::Tuple(vec![
            AbiValue::Address(Address::repeat_byte(0xab)),
            AbiValue::string("Vault Token"),
            AbiValue::Tuple(vec![
                AbiValue::Array(vec![AbiValue::int(-230_400), AbiValue::int(-120_000)]),
                AbiValue::Array(vec![AbiValue::uint(6_000), AbiValue::uint(4_000)]),
                AbiValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            ]),
            AbiValue::Array(vec![
                AbiValue::Tuple(vec![
                    AbiValue::Address(Address::repeat_byte(0x01)),
                    AbiValue::uint(1),
                    AbiValue::uint(0),
                    AbiValue::Bytes(Vec::new()),
                ]),
                AbiValue::Tuple(vec![
                    AbiValue::Address(Address::repeat_byte(0x02)),
                    AbiValue::Uint(U256::MAX),
                    AbiValue::uint(500),
                    AbiValue::Bytes(vec![7; 40]),
                ]),
            ]),
            AbiValue::Bool(true),
        ]);
        let encoded = encode_record(&schema, &value).expect("record should encode");
        assert_eq!(encoded.len() % 32, 0);
        let decoded = decode_record(&schema, &encoded).expect("record should decode");
        assert_eq!(decoded, value);
    }

    #[test]
    fn static_tuple_is_inlined_without_offset() {
        let schema = AbiType::parse("(address,uint24)").expect("schema should parse");
        let value = AbiValue::Tuple(vec![
            AbiValue::Address(Address::repeat_byte(0x11)),
            AbiValue::uint(10_000),
        ]);
        let encoded = encode_record(&schema, &value).expect("static tuple encodes");
        assert_eq!(encoded.len(), 64);
        assert_eq!(&encoded[12..32], Address::repeat_byte(0x11).as_slice());
    }

    #[test]
    fn type_mismatch_is_reported_with_field_path() {
        let err = encode_params(
            &[AbiType::Tuple(vec![AbiType::Address, AbiType::String])],
            &[AbiValue::Tuple(vec![
                AbiValue::Address(Address::ZERO),
                AbiValue::uint(1),
            ])],
        )
        .expect_err("uint is not a string");
        assert_eq!(
            err,
            EncodingError::TypeMismatch {
                field: "arg.0.1".to_string(),
                expected: "string".to_string(),
                found: "uint".to_string(),
            }
        );
    }

    #[test]
    fn decode_rejects_dirty_address_and_truncated_data() {
        let mut dirty = [0u8; 32];
        dirty[0] = 1;
        assert!(matches!(
            decode_params(&[AbiType::Address], &dirty),
            Err(EncodingError::NonCanonical(_))
        ));
        assert!(matches!(
            decode_params(&[AbiType::Address], &dirty[..16]),
            Err(EncodingError::OutOfBounds { .. })
        ));

        let mut huge_array = usize_word(32).to_vec();
        huge_array.extend_from_slice(&usize_word(1_000_000));
        assert!(decode_params(&[AbiType::Array(Box::new(AbiType::Uint(8)))], &huge_array).is_err());
    }
}
