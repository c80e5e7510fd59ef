use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::transport::{Request, Response, Transport};

/// Records every request and answers from a queue of canned responses.
pub(crate) struct StubTransport {
    endpoint: Endpoint,
    responses: Mutex<VecDeque<Result<Response>>>,
    calls: Mutex<Vec<Request>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self {
            endpoint: Endpoint::for_organization("contoso").unwrap(),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond_json(self, status: u16, body: Value) -> Self {
        self.push(Ok(Response {
            status,
            body: body.to_string(),
        }))
    }

    pub(crate) fn respond_status(self, status: u16, body: &str) -> Self {
        self.push(Err(ApiError::Status {
            status,
            body: body.to_string(),
        }))
    }

    pub(crate) fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    /// Final URL of the nth call, as the real client would send it.
    pub(crate) fn url_of(&self, index: usize) -> String {
        let calls = self.calls();
        self.endpoint.resolve(&calls[index].target).unwrap().to_string()
    }

    fn push(self, response: Result<Response>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }
}

#[async_trait]
impl Transport for StubTransport {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        self.calls.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no canned response left")
    }
}
