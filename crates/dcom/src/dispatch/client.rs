//! IDispatch client

use msrpc::{BindOptions, CallOptions, Conn};
use tracing::debug;

use super::protocol::*;
use crate::client::ObjectClient;
use crate::types::{Iid, Ipid, Result};

/// Client for IDispatch.
///
/// Interfaces deriving from IDispatch embed one of these, built with
/// [`DispatchClient::from_object`] on the derived client's context.
#[derive(Debug, Clone)]
pub struct DispatchClient {
    object: ObjectClient,
}

impl DispatchClient {
    /// Bind IDispatch on `conn`.
    ///
    /// With `options.superclass` set, the derived client's context is reused.
    pub async fn new(conn: &Conn, options: BindOptions) -> Result<Self> {
        let object = ObjectClient::bind(conn, IDISPATCH_SYNTAX, options).await?;
        Ok(Self { object })
    }

    /// IDispatch view of an object client for a derived interface
    pub fn from_object(object: &ObjectClient) -> Self {
        Self {
            object: object.superclass(Iid::from(IDISPATCH_IID)),
        }
    }

    pub fn object(&self) -> &ObjectClient {
        &self.object
    }

    pub fn ipid(&self) -> Option<Ipid> {
        self.object.ipid()
    }

    pub fn with_ipid(&self, ipid: Ipid) -> Self {
        Self {
            object: self.object.with_ipid(ipid),
        }
    }

    /// Whether the object exposes type information
    pub async fn get_type_info_count(&self, options: &CallOptions) -> Result<u32> {
        let op = GetTypeInfoCount::from(GetTypeInfoCountRequest::default());
        let response = GetTypeInfoCountResponse::from(self.object.invoke(op, options).await?);
        Ok(response.type_info_count)
    }

    /// Map member names to DISPIDs
    pub async fn get_ids_of_names<S: AsRef<str>>(
        &self,
        names: &[S],
        lcid: u32,
        options: &CallOptions,
    ) -> Result<Vec<i32>> {
        let op = GetIDsOfNames::from(GetIDsOfNamesRequest::new(names, lcid));
        let response = GetIDsOfNamesResponse::from(self.object.invoke(op, options).await?);
        debug!(names = names.len(), "resolved DISPIDs");
        Ok(response.disp_ids)
    }
}
