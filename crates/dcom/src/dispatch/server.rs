//! IDispatch server

use std::sync::Arc;

use async_trait::async_trait;
use msrpc::{hresult, CallContext, Interface, InterfaceBuilder, RpcError};

use super::protocol::*;
use crate::server::ObjectExporter;
use crate::types::Result;

/// Server side of IDispatch, implemented per exported object
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn get_type_info_count(
        &self,
        _ctx: &CallContext,
        _request: GetTypeInfoCountRequest,
    ) -> Result<GetTypeInfoCountResponse> {
        Ok(GetTypeInfoCountResponse::default())
    }

    async fn get_ids_of_names(
        &self,
        _ctx: &CallContext,
        _request: GetIDsOfNamesRequest,
    ) -> Result<GetIDsOfNamesResponse> {
        Ok(GetIDsOfNamesResponse {
            ret: hresult::E_NOTIMPL as i32,
            ..Default::default()
        })
    }
}

/// IDispatch interface serving the `Arc<dyn Dispatch>` objects of `exporter`.
///
/// Derived interfaces pass the result to [`InterfaceBuilder::inherit`].
pub fn dispatch_interface(exporter: Arc<ObjectExporter>) -> Interface {
    let for_count = Arc::clone(&exporter);
    InterfaceBuilder::from_syntax(IDISPATCH_SYNTAX)
        .name("IDispatch")
        .operation(opnum::GET_TYPE_INFO_COUNT, move |ctx, mut op: GetTypeInfoCount| {
            let exporter = Arc::clone(&for_count);
            async move {
                let object: Arc<dyn Dispatch> = exporter.resolve(&ctx).map_err(RpcError::from)?;
                op.response = object
                    .get_type_info_count(&ctx, op.request.clone())
                    .await
                    .map_err(RpcError::from)?;
                Ok(op)
            }
        })
        .operation(opnum::GET_IDS_OF_NAMES, move |ctx, mut op: GetIDsOfNames| {
            let exporter = Arc::clone(&exporter);
            async move {
                let object: Arc<dyn Dispatch> = exporter.resolve(&ctx).map_err(RpcError::from)?;
                op.response = object
                    .get_ids_of_names(&ctx, op.request.clone())
                    .await
                    .map_err(RpcError::from)?;
                Ok(op)
            }
        })
        .build()
}
