use {
    std::{convert::Infallible, pin::Pin},
    hyper::{Response, body::{Bytes, Incoming}},
    http_body_util::Full,
    crate::server::CounterServer,
};

#[derive(Clone)]
pub struct HttpHandler {
    server: CounterServer,
}

impl HttpHandler {
    pub fn new(server: CounterServer) -> Self {
        Self {
            server,
        }
    }
}

impl hyper::service::Service<hyper::Request<Incoming>> for HttpHandler {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
        let server = self.server.clone();
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let headers = req.headers().clone();

        Box::pin(async move { Ok(server.dispatch(method, path, headers).await) })
    }
}
