//! DCOM Tests - Derived Interfaces and Object Addressing
//!
//! A classifier-module interface derived from IDispatch:
//! - Base interface client embedded through a superclass bind
//! - Inherited IDispatch handlers answering on the derived context
//! - IPID routing, including IPIDs recovered from interface pointers
//! - A derived method returning a SAFEARRAY

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use msrpc::{
    hresult, BindOptions, CallContext, CallOptions, Conn, InterfaceBuilder, Operation, RpcError,
    SyntaxId,
};
use msrpc_dcom::dispatch::{
    GetIDsOfNamesRequest, GetIDsOfNamesResponse, IDISPATCH_IID, IDISPATCH_OPNUM_COUNT,
    IDISPATCH_SYNTAX,
};
use msrpc_dcom::{
    dispatch_interface, Dispatch, DispatchClient, Iid, InterfacePointer, Ipid, ObjectClient,
    ObjectExporter, OrpcOperation, OrpcThat, OrpcThis, SafeArray,
};
use msrpc_ndr::{from_bytes, to_bytes, NdrContext, NdrReader, NdrWriter, UniquePtr};

const CLASSIFIER_UUID: &str = "bb36ea26-6318-4b8c-8592-f72dd602e7a5";
const PROPERTIES_USED: u16 = IDISPATCH_OPNUM_COUNT;

fn classifier_syntax() -> SyntaxId {
    SyntaxId::parse(CLASSIFIER_UUID, 0, 0).expect("valid classifier UUID")
}

/// `HRESULT PropertiesUsed([out, retval] SAFEARRAY(BYTE) *used)`
#[derive(Debug, Clone, Default, PartialEq)]
struct PropertiesUsed {
    this: OrpcThis,
    that: OrpcThat,
    used: UniquePtr<SafeArray>,
    ret: i32,
}

impl Operation for PropertiesUsed {
    fn op_num(&self) -> u16 {
        PROPERTIES_USED
    }

    fn op_name(&self) -> &'static str {
        "/IClassifierModule/v0/PropertiesUsed"
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.this)
    }

    fn unmarshal_request<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.this)
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> msrpc_ndr::Result<()> {
        w.write_param(&self.that)?;
        w.write_param(&self.used)?;
        w.write_i32(self.ret);
        Ok(())
    }

    fn unmarshal_response<'a>(&'a mut self, r: &mut NdrReader<'a>) -> msrpc_ndr::Result<()> {
        r.read_param(&mut self.that)?;
        r.read_param(&mut self.used)?;
        self.ret = r.read_i32()?;
        Ok(())
    }

    fn return_code(&self) -> i32 {
        self.ret
    }
}

impl OrpcOperation for PropertiesUsed {
    fn orpc_this(&mut self) -> &mut OrpcThis {
        &mut self.this
    }
}

/// Client of the derived interface, with IDispatch embedded
#[derive(Debug, Clone)]
struct ClassifierClient {
    object: ObjectClient,
    dispatch: DispatchClient,
}

impl ClassifierClient {
    async fn new(conn: &Conn) -> msrpc::Result<Self> {
        let object = ObjectClient::bind(conn, classifier_syntax(), BindOptions::default()).await?;
        Ok(Self::from_object(object))
    }

    fn from_object(object: ObjectClient) -> Self {
        let dispatch = DispatchClient::from_object(&object);
        Self { object, dispatch }
    }

    fn with_ipid(&self, ipid: Ipid) -> Self {
        Self::from_object(self.object.with_ipid(ipid))
    }

    async fn properties_used(&self, options: &CallOptions) -> msrpc::Result<Vec<u8>> {
        let op = self.object.invoke(PropertiesUsed::default(), options).await?;
        Ok(op
            .used
            .as_ref()
            .and_then(|array| array.as_bytes())
            .map(<[u8]>::to_vec)
            .unwrap_or_default())
    }
}

/// Classifier that only knows the names of the properties it reads
struct Classifier {
    properties: Vec<&'static str>,
}

#[async_trait]
impl Dispatch for Classifier {
    async fn get_ids_of_names(
        &self,
        _ctx: &CallContext,
        request: GetIDsOfNamesRequest,
    ) -> msrpc_dcom::Result<GetIDsOfNamesResponse> {
        let mut disp_ids = Vec::new();
        for name in request.names() {
            match self.properties.iter().position(|p| *p == name) {
                Some(i) => disp_ids.push(i as i32 + 1),
                None => {
                    return Ok(GetIDsOfNamesResponse {
                        ret: hresult::DISP_E_UNKNOWNNAME as i32,
                        ..Default::default()
                    })
                }
            }
        }
        Ok(GetIDsOfNamesResponse {
            disp_ids,
            ..Default::default()
        })
    }
}

struct Fixture {
    conn: Conn,
    exporter: Arc<ObjectExporter>,
    ipid: Ipid,
}

/// Server exporting one classifier; PropertiesUsed answers `[1, 2, 3]`
fn setup() -> Fixture {
    init_logging();

    let exporter = Arc::new(ObjectExporter::default());
    let classifier: Arc<dyn Dispatch> = Arc::new(Classifier {
        properties: vec!["FileName", "Owner", "Size"],
    });
    let std = exporter.export(Iid::from(classifier_syntax().uuid), classifier);

    let resolver = Arc::clone(&exporter);
    let interface = InterfaceBuilder::from_syntax(classifier_syntax())
        .name("IClassifierModule")
        .operation(PROPERTIES_USED, move |ctx, mut op: PropertiesUsed| {
            let exporter = Arc::clone(&resolver);
            async move {
                let _object: Arc<dyn Dispatch> = exporter.resolve(&ctx).map_err(RpcError::from)?;
                op.used = UniquePtr::new(SafeArray::from_bytes(&[1, 2, 3]));
                Ok(op)
            }
        })
        .inherit(&dispatch_interface(Arc::clone(&exporter)))
        .build();

    let server = start_test_server(vec![interface, create_echo_interface()]);
    Fixture {
        conn: connect(server),
        exporter,
        ipid: std.ipid,
    }
}

#[tokio::test]
async fn test_superclass_bind_reuses_context() {
    let fixture = setup();
    let client = ClassifierClient::new(&fixture.conn).await.unwrap();

    let options = BindOptions::default().superclass(client.object.conn());
    let base = ObjectClient::bind(&fixture.conn, IDISPATCH_SYNTAX, options)
        .await
        .unwrap();
    assert_eq!(base.conn().context_id(), client.object.conn().context_id());
    assert_eq!(fixture.conn.bound_count(), 1);

    // the embedded client is the same object seen through IDispatch
    let dispatch = client.dispatch.object().identity();
    assert_eq!(dispatch.iid, Iid::from(IDISPATCH_IID));
    assert_eq!(dispatch.causality, client.object.identity().causality);
}

#[tokio::test]
async fn test_superclass_bind_follows_derived_client() {
    let fixture = setup();
    let client = ClassifierClient::new(&fixture.conn).await.unwrap();
    let echo = fixture
        .conn
        .bind(echo_syntax(), BindOptions::default())
        .await
        .unwrap();
    assert_ne!(echo.context_id(), client.object.conn().context_id());

    // echo was bound last; IDispatch still rides on the classifier context
    let options = BindOptions::default().superclass(client.object.conn());
    let dispatch = DispatchClient::new(&fixture.conn, options)
        .await
        .unwrap()
        .with_ipid(fixture.ipid);
    assert_eq!(dispatch.object().conn().context_id(), client.object.conn().context_id());
    assert_eq!(dispatch.object().conn().syntax(), classifier_syntax());

    let ids = dispatch
        .get_ids_of_names(&["Owner"], 0, &CallOptions::default())
        .await
        .unwrap();
    assert_eq!(ids, vec![2]);
    assert_eq!(echo.call_count(), 0);
}

#[tokio::test]
async fn test_superclass_bind_needs_a_context_of_this_conn() {
    let fixture = setup();
    let elsewhere = setup();
    let foreign = ClassifierClient::new(&elsewhere.conn).await.unwrap();

    let options = BindOptions::default().superclass(foreign.object.conn());
    let err = ObjectClient::bind(&fixture.conn, IDISPATCH_SYNTAX, options)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::NotBound));
}

#[tokio::test]
async fn test_base_and_derived_methods_share_object() {
    let fixture = setup();
    let client = ClassifierClient::new(&fixture.conn)
        .await
        .unwrap()
        .with_ipid(fixture.ipid);
    let options = CallOptions::default();

    assert_eq!(client.dispatch.get_type_info_count(&options).await.unwrap(), 0);
    let ids = client
        .dispatch
        .get_ids_of_names(&["Size", "FileName"], 0x409, &options)
        .await
        .unwrap();
    assert_eq!(ids, vec![3, 1]);
    assert_eq!(client.properties_used(&options).await.unwrap(), vec![1, 2, 3]);

    assert_eq!(client.object.conn().call_count(), 3);
    assert_eq!(fixture.exporter.rejected_calls(), 0);
}

#[tokio::test]
async fn test_ipid_from_marshaled_interface_pointer() {
    let fixture = setup();
    let pointer = fixture.exporter.interface_pointer(&fixture.ipid).unwrap();

    // the pointer crosses the wire before the client uses it
    let bytes = to_bytes(NdrContext::new(), &pointer).unwrap();
    let received: InterfacePointer = from_bytes(NdrContext::new(), bytes).unwrap();
    let ipid = received.ipid().unwrap();
    assert_eq!(ipid, fixture.ipid);

    let objref = received.objref().unwrap();
    let std = objref.std_obj_ref().unwrap();
    assert_eq!(std.oxid, fixture.exporter.oxid());

    let client = ClassifierClient::new(&fixture.conn).await.unwrap().with_ipid(ipid);
    let used = client.properties_used(&CallOptions::default()).await.unwrap();
    assert_eq!(used, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_missing_ipid_is_reported_per_operation() {
    let fixture = setup();
    let client = ClassifierClient::new(&fixture.conn).await.unwrap();

    let err = client.properties_used(&CallOptions::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "/IClassifierModule/v0/PropertiesUsed: ipid is missing");

    let err = client
        .dispatch
        .get_ids_of_names(&["Owner"], 0, &CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "/IDispatch/v0/GetIDsOfNames: ipid is missing");
    assert_eq!(client.object.conn().call_count(), 0);
}

#[tokio::test]
async fn test_unknown_ipid_faults_on_both_levels() {
    let fixture = setup();
    let client = ClassifierClient::new(&fixture.conn)
        .await
        .unwrap()
        .with_ipid(Ipid::generate());

    let err = client.properties_used(&CallOptions::default()).await.unwrap_err();
    assert!(matches!(err.root(), RpcError::Fault(code) if *code == hresult::CO_E_OBJNOTCONNECTED));

    let err = client
        .dispatch
        .get_type_info_count(&CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.hresult(), hresult::CO_E_OBJNOTCONNECTED);
    assert_eq!(fixture.exporter.rejected_calls(), 2);
}

#[tokio::test]
async fn test_disconnected_object_stops_answering() {
    let fixture = setup();
    let client = ClassifierClient::new(&fixture.conn)
        .await
        .unwrap()
        .with_ipid(fixture.ipid);
    client.properties_used(&CallOptions::default()).await.unwrap();

    assert!(fixture.exporter.disconnect(&fixture.ipid));
    let err = client.properties_used(&CallOptions::default()).await.unwrap_err();
    assert!(matches!(err.root(), RpcError::Fault(code) if *code == hresult::CO_E_OBJNOTCONNECTED));
}

#[tokio::test]
async fn test_unknown_name_is_method_failure() {
    let fixture = setup();
    let client = ClassifierClient::new(&fixture.conn)
        .await
        .unwrap()
        .with_ipid(fixture.ipid);

    let err = client
        .dispatch
        .get_ids_of_names(&["Owner", "Color"], 0, &CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.hresult(), hresult::DISP_E_UNKNOWNNAME);
    assert!(err.to_string().contains("0x80020006"));
}
