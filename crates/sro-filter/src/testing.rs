//! Scripted API server for tests of the kube-backed collaborators

use http::{Method, Request, Response, StatusCode};
use kube::Client;
use kube::client::Body;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tower_test::mock::{self, Handle};

/// A client whose requests are answered by the returned server
pub fn mock_client() -> (Client, ApiServer) {
    let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
    (Client::new(service, "default"), ApiServer { handle })
}

/// A request as seen by the server
#[derive(Debug)]
pub struct Received {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: Value,
}

pub struct ApiServer {
    handle: Handle<Request<Body>, Response<Body>>,
}

impl ApiServer {
    /// Wait for the next request and answer it
    pub async fn respond(&mut self, status: StatusCode, body: &impl Serialize) -> Received {
        let (request, send) = self
            .handle
            .next_request()
            .await
            .expect("client sent no request");
        let (parts, request_body) = request.into_parts();
        let bytes = request_body.collect_bytes().await.unwrap();
        let body_json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        let response = Response::builder()
            .status(status)
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        send.send_response(response);

        Received {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().unwrap_or_default().to_string(),
            body: body_json,
        }
    }

    pub async fn respond_ok(&mut self, body: &impl Serialize) -> Received {
        self.respond(StatusCode::OK, body).await
    }

    pub async fn respond_not_found(&mut self, name: &str) -> Received {
        let status = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("\"{}\" not found", name),
            "reason": "NotFound",
            "code": 404
        });
        self.respond(StatusCode::NOT_FOUND, &status).await
    }

    /// Assert that no further request arrives
    pub async fn assert_idle(&mut self) {
        let next = tokio::time::timeout(Duration::from_millis(100), self.handle.next_request());
        assert!(
            matches!(next.await, Err(_) | Ok(None)),
            "unexpected request"
        );
    }
}
