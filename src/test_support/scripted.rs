use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// Scripted transport that returns pre-seeded responses in FIFO order.
///
/// Used to drive exact response sequences, including malformed bodies and
/// transport failures, without a server model.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    responses: Rc<RefCell<VecDeque<Result<ApiResponse, TransportError>>>>,
    invocations: Rc<RefCell<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    /// Creates a transport with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all requests sent so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<ApiRequest> {
        self.invocations.borrow().clone()
    }

    /// Queues a response with `status` and `body`.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.responses
            .borrow_mut()
            .push_back(Ok(ApiResponse::new(status, body)));
    }

    /// Queues a response with `status` and an empty body.
    pub fn push_status(&self, status: u16) {
        self.push_response(status, "");
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    /// Returns the number of responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.invocations.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Request {
                    method: request.method,
                    url: request.url.clone(),
                    message: String::from("no scripted response available"),
                })
            })
    }
}
