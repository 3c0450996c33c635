//! Complex Types Tests - NDR Encoding Scenarios
//!
//! These tests exercise complex data type handling:
//! - Structures with several pointers to equal values
//! - Conformant arrays sized independently of their contents
//! - Unions with discriminants
//! - Empty and null strings
//! - Large data transfers over a connection

mod common;

use common::*;
use msrpc::CallOptions;
use msrpc_dcom::oaut::{SafeArray, SafeArrayUnion, SizedArray};
use msrpc_ndr::{
    decode_elements, encode_elements, from_bytes, to_bytes, Bytes, ConformantArray, NdrContext,
    NdrDecode, NdrEncode, NdrError, NdrReader, NdrWString, NdrWriter, SizeInfo, UniquePtr,
    FIRST_REFERENT_ID, REFERENT_ID_STEP,
};

/// `{ long tag; [unique] wchar_t *first; [unique] wchar_t *second; }`
#[derive(Debug, Default, PartialEq)]
struct Pair {
    tag: i32,
    first: UniquePtr<NdrWString>,
    second: UniquePtr<NdrWString>,
}

impl NdrEncode for Pair {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_align(4);
        w.write_i32(self.tag);
        self.first.ndr_encode(w)?;
        self.second.ndr_encode(w)
    }
}

impl NdrDecode for Pair {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_align(4)?;
        self.tag = r.read_i32()?;
        self.first.ndr_decode(r)?;
        self.second.ndr_decode(r)
    }
}

/// `[size_is(count)] short values[]` whose count travels separately
#[derive(Debug, Default, PartialEq)]
struct Shorts {
    count: usize,
    values: Vec<i16>,
}

impl NdrEncode for Shorts {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        let size = w.declare_size(SizeInfo::one(self.count))?;
        encode_elements(&self.values, size.dim(0)?, w)
    }
}

impl NdrDecode for Shorts {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        let size = r.declare_size(1)?;
        self.count = size.dim(0)?;
        decode_elements(&mut self.values, self.count, r)
    }
}

#[test]
fn test_equal_pointers_are_not_aliased() {
    init_logging();

    let pair = Pair {
        tag: 1,
        first: UniquePtr::new(NdrWString::new("same")),
        second: UniquePtr::new(NdrWString::new("same")),
    };
    let bytes = to_bytes(NdrContext::new(), &pair).unwrap();

    let first_id = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let second_id = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    assert_eq!(first_id, FIRST_REFERENT_ID);
    assert_eq!(second_id, FIRST_REFERENT_ID + REFERENT_ID_STEP);

    let decoded: Pair = from_bytes(NdrContext::new(), bytes).unwrap();
    assert_eq!(decoded, pair);
}

#[test]
fn test_referents_follow_declaration_order() {
    let pair = Pair {
        tag: 2,
        first: UniquePtr::new(NdrWString::new("a")),
        second: UniquePtr::new(NdrWString::new("b")),
    };
    let bytes = to_bytes(NdrContext::new(), &pair).unwrap();
    // each referent: max count, offset, actual count, "x\0"
    let first_char = u16::from_le_bytes(bytes[24..26].try_into().unwrap());
    let second_char = u16::from_le_bytes(bytes[40..42].try_into().unwrap());
    assert_eq!(first_char, 'a' as u16);
    assert_eq!(second_char, 'b' as u16);
}

#[test]
fn test_array_sized_by_independent_count() {
    let shorts = Shorts {
        count: 4,
        values: vec![10, 20, 30, 40],
    };
    let bytes = to_bytes(NdrContext::new(), &shorts).unwrap();
    let decoded: Shorts = from_bytes(NdrContext::new(), bytes).unwrap();
    assert_eq!(decoded.values, vec![10, 20, 30, 40]);

    // a shorter count truncates, a longer one pads
    let bytes = to_bytes(NdrContext::new(), &Shorts { count: 2, ..shorts }).unwrap();
    let decoded: Shorts = from_bytes(NdrContext::new(), bytes).unwrap();
    assert_eq!(decoded.values, vec![10, 20]);

    let padded = Shorts {
        count: 3,
        values: vec![7],
    };
    let bytes = to_bytes(NdrContext::new(), &padded).unwrap();
    let decoded: Shorts = from_bytes(NdrContext::new(), bytes).unwrap();
    assert_eq!(decoded.values, vec![7, 0, 0]);
}

#[test]
fn test_oversized_count_is_fatal() {
    let mut raw = Vec::new();
    raw.extend_from_slice(&1000u32.to_le_bytes());
    raw.extend_from_slice(&[1, 0, 2, 0]);
    let err = from_bytes::<Shorts>(NdrContext::new(), Bytes::from(raw)).unwrap_err();
    assert!(matches!(
        err,
        NdrError::SizeExceedsBuffer {
            declared: 1000,
            remaining: 4,
            ..
        }
    ));
}

#[test]
fn test_empty_arrays() {
    let empty = ConformantArray::<i32>::new(Vec::new());
    let bytes = to_bytes(NdrContext::new(), &empty).unwrap();
    assert_eq!(bytes.as_ref(), &[0, 0, 0, 0]);
    let decoded: ConformantArray<i32> = from_bytes(NdrContext::new(), bytes).unwrap();
    assert!(decoded.is_empty());
}

#[test]
fn test_unknown_union_arm_is_rejected() {
    let array = SafeArray::from_u32s(&[1]);
    let mut raw = to_bytes(NdrContext::new(), &array).unwrap().to_vec();
    raw[16..20].copy_from_slice(&0x24u32.to_le_bytes());
    let err = from_bytes::<SafeArray>(NdrContext::new(), Bytes::from(raw)).unwrap_err();
    assert!(matches!(err, NdrError::UnsupportedDiscriminant { value: 0x24, .. }));
}

#[test]
fn test_each_union_arm_round_trips() {
    let arrays = [
        SafeArray::from_bytes(&[1, 2]),
        SafeArray::from_strings(&["x", "yz"]),
        SafeArray::from_u32s(&[u32::MAX]),
        SafeArray {
            data: SafeArrayUnion::Word(SizedArray::new(vec![1u16, 2])),
            ..SafeArray::from_bytes(&[])
        },
    ];
    for array in arrays {
        let bytes = to_bytes(NdrContext::big_endian(), &array).unwrap();
        let decoded: SafeArray = from_bytes(NdrContext::big_endian(), bytes).unwrap();
        assert_eq!(decoded, array);
    }
}

#[test]
fn test_empty_and_null_strings_differ() {
    let empty = UniquePtr::new(NdrWString::new(""));
    let null: UniquePtr<NdrWString> = UniquePtr::null();

    let empty_bytes = to_bytes(NdrContext::new(), &empty).unwrap();
    let null_bytes = to_bytes(NdrContext::new(), &null).unwrap();
    assert_eq!(null_bytes.as_ref(), &[0, 0, 0, 0]);
    assert_ne!(&empty_bytes[0..4], &[0, 0, 0, 0]);

    let decoded: UniquePtr<NdrWString> = from_bytes(NdrContext::new(), empty_bytes).unwrap();
    assert_eq!(decoded.as_ref().map(|s| s.as_str()), Some(""));
    let decoded: UniquePtr<NdrWString> = from_bytes(NdrContext::new(), null_bytes).unwrap();
    assert!(decoded.as_ref().is_none());
}

#[tokio::test]
async fn test_null_and_empty_strings_over_connection() {
    init_logging();

    let conn = connect_echo().await;
    let options = CallOptions::default();

    let null = conn.call(Measure::default(), &options).await.unwrap();
    assert_eq!(null.length, -1);

    let empty = Measure {
        text: UniquePtr::new(NdrWString::new("")),
        ..Default::default()
    };
    assert_eq!(conn.call(empty, &options).await.unwrap().length, 0);

    let text = Measure {
        text: UniquePtr::new(NdrWString::new("héllo")),
        ..Default::default()
    };
    assert_eq!(conn.call(text, &options).await.unwrap().length, 5);
}

#[tokio::test]
async fn test_large_array_over_connection() {
    let conn = connect_echo().await;
    let values: Vec<i32> = (0..100_000).collect();
    let expected: i64 = values.iter().map(|&v| v as i64).sum();

    let op = Sum {
        values: ConformantArray::new(values),
        ..Default::default()
    };
    let result = conn.call(op, &CallOptions::default()).await.unwrap();
    assert_eq!(result.total, expected);
}
