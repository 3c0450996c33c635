//! Envelope Tests - Operation Round Trips
//!
//! End-to-end behavior of the operation envelope:
//! - Marshaling a structure carrying an automation payload
//! - Dispatch of unregistered opnums
//! - Mapping of return codes to named errors

mod common;

use common::*;
use msrpc::{encode_request, hresult, CallContext, CallOptions, Operation, RpcError, Status};
use msrpc_dcom::oaut::SafeArray;
use msrpc_ndr::{
    from_bytes, to_bytes, Bytes, NdrContext, NdrDecode, NdrEncode, NdrReader, NdrWString,
    NdrWriter, UniquePtr,
};

/// `{ unsigned short opNum; [string, unique] wchar_t *name; SAFEARRAY payload; }`
#[derive(Debug, Default, PartialEq)]
struct Invocation {
    op_num: u16,
    name: UniquePtr<NdrWString>,
    payload: UniquePtr<SafeArray>,
}

impl NdrEncode for Invocation {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_align(4);
        w.write_u16(self.op_num);
        self.name.ndr_encode(w)?;
        self.payload.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Invocation {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_align(4)?;
        self.op_num = r.read_u16()?;
        self.name.ndr_decode(r)?;
        self.payload.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Operation with no parameters, for probing opnums the server lacks
struct Probe(u16);

impl Operation for Probe {
    fn op_num(&self) -> u16 {
        self.0
    }

    fn op_name(&self) -> &'static str {
        "/IEcho/v1/Probe"
    }

    fn marshal_request<'a>(&'a self, _w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        Ok(())
    }

    fn unmarshal_request<'a>(&'a mut self, _r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        Ok(())
    }

    fn marshal_response<'a>(&'a self, _w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        Ok(())
    }

    fn unmarshal_response<'a>(&'a mut self, _r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        Ok(())
    }
}

#[test]
fn test_structure_with_safearray_payload() {
    init_logging();

    let invocation = Invocation {
        op_num: 7,
        name: UniquePtr::new(NdrWString::new("PropertiesUsed")),
        payload: UniquePtr::new(SafeArray::from_bytes(&[1, 2, 3])),
    };

    for ctx in [NdrContext::new(), NdrContext::big_endian()] {
        let bytes = to_bytes(ctx, &invocation).unwrap();
        let decoded: Invocation = from_bytes(ctx, bytes).unwrap();

        assert_eq!(decoded.op_num, 7);
        assert_eq!(decoded.name.as_ref().map(|n| n.as_str()), Some("PropertiesUsed"));
        let payload = decoded.payload.as_ref().and_then(|p| p.as_bytes());
        assert_eq!(payload, Some(&[1u8, 2, 3][..]));
        assert_eq!(decoded, invocation);
    }
}

#[test]
fn test_null_payload_round_trips() {
    let invocation = Invocation {
        op_num: 7,
        ..Default::default()
    };
    let bytes = to_bytes(NdrContext::new(), &invocation).unwrap();
    // opNum, pad, two null pointers
    assert_eq!(bytes.len(), 12);
    let decoded: Invocation = from_bytes(NdrContext::new(), bytes).unwrap();
    assert_eq!(decoded, invocation);
}

#[tokio::test]
async fn test_unregistered_opnum_is_not_implemented() {
    init_logging();

    let interface = create_echo_interface();
    assert_eq!(interface.opnums(), vec![0, 1, 2]);

    let ctx = CallContext::new(echo_syntax(), 5);
    match interface.handle(ctx, Bytes::new()).await {
        Err(RpcError::NotImplemented { interface, opnum }) => {
            assert_eq!(interface, "IEcho");
            assert_eq!(opnum, 5);
        }
        Err(other) => panic!("expected not implemented, got {}", other),
        Ok(_) => panic!("opnum 5 should not dispatch"),
    }

    // A registered opnum with a garbage stub is a decode error instead
    let ctx = CallContext::new(echo_syntax(), echo_opnum::ECHO);
    let err = interface
        .handle(ctx, Bytes::from_static(&[0xff]))
        .await
        .err()
        .expect("garbage stub must not decode");
    assert!(matches!(err, RpcError::Ndr { op: "/IEcho/v1/Echo", .. }));
}

#[tokio::test]
async fn test_unregistered_opnum_over_connection() {
    let conn = connect_echo().await;
    let err = conn.call(Probe(5), &CallOptions::default()).await.err().unwrap();
    assert!(matches!(err.root(), RpcError::NotImplemented { opnum: 5, .. }));
    assert!(err.to_string().starts_with("/IEcho/v1/Probe: "));

    // Opnums 0-2 still work after the failed call
    let echo = conn.call(Echo::new("still here"), &CallOptions::default()).await.unwrap();
    assert_eq!(echo.reply.as_str(), "still here");
}

#[tokio::test]
async fn test_return_code_zero_is_success() {
    let conn = connect_echo().await;
    let echo = conn.call(Echo::new("hello"), &CallOptions::default()).await.unwrap();
    assert_eq!(echo.ret, 0);
    assert_eq!(echo.reply.as_str(), "hello");
}

#[tokio::test]
async fn test_failure_code_names_operation_and_code() {
    init_logging();

    let conn = connect_echo().await;
    let err = conn
        .call(Echo::new("status:80070057"), &CallOptions::default())
        .await
        .err()
        .unwrap();

    let message = err.to_string();
    assert!(message.contains("/IEcho/v1/Echo"), "{}", message);
    assert!(message.contains("0x80070057"), "{}", message);
    assert_eq!(err.status(), Some(Status::from_code(hresult::E_INVALIDARG as i32)));

    // invoke leaves the decision to the caller
    let mut op = Echo::new("status:80070057");
    conn.invoke(&mut op, &CallOptions::default()).await.unwrap();
    assert_eq!(op.return_code() as u32, hresult::E_INVALIDARG);
    let named = conn.error_for(&op, op.return_code());
    assert_eq!(named.to_string(), message);
}

#[tokio::test]
async fn test_unknown_code_keeps_raw_value() {
    let conn = connect_echo().await;
    let err = conn
        .call(Echo::new("status:a0001234"), &CallOptions::default())
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("0xa0001234"));
}

#[test]
fn test_each_request_uses_fresh_referent_ids() {
    let mut first = Measure {
        text: UniquePtr::new(NdrWString::new("a")),
        ..Default::default()
    };
    let mut second = first.clone();
    let a = encode_request(&mut first, NdrContext::new()).unwrap();
    let b = encode_request(&mut second, NdrContext::new()).unwrap();
    assert_eq!(a, b);
}
