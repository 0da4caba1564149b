use crate::proxy::RemoteWriteProxy;

#[derive(Clone)]
pub struct HttpServerState {
    pub proxy: RemoteWriteProxy,
}
