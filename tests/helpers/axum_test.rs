// ABOUTME: In-process HTTP harness for driving the accounts router in tests
// ABOUTME: Builds requests with session or token bearers and reads redirects and JSON bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceExt;
use url::Url;

/// Request under construction, sent with [`TestRequest::send`]
pub struct TestRequest {
    request: Request<Body>,
}

impl TestRequest {
    fn new(method: Method, uri: &str) -> Self {
        let mut request = Request::new(Body::empty());
        *request.method_mut() = method;
        *request.uri_mut() = uri.parse().expect("test uri");
        Self { request }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn header(self, name: &'static str, value: &str) -> Self {
        self.insert(HeaderName::from_static(name), value)
    }

    fn insert(mut self, name: HeaderName, value: &str) -> Self {
        self.request
            .headers_mut()
            .insert(name, HeaderValue::from_str(value).expect("header value"));
        self
    }

    /// Session JWT or access token, both travel as a bearer
    pub fn bearer(self, credential: &str) -> Self {
        self.insert(header::AUTHORIZATION, &format!("Bearer {credential}"))
    }

    pub fn json<T: Serialize>(self, body: &T) -> Self {
        let encoded = serde_json::to_vec(body).expect("json body");
        self.body("application/json", encoded)
    }

    /// `application/x-www-form-urlencoded`, as relying parties post to `/oauth2/token`
    pub fn form<T: Serialize + ?Sized>(self, fields: &T) -> Self {
        let encoded = serde_urlencoded::to_string(fields).expect("form body");
        self.body("application/x-www-form-urlencoded", encoded.into_bytes())
    }

    fn body(mut self, content_type: &str, bytes: Vec<u8>) -> Self {
        *self.request.body_mut() = Body::from(bytes);
        self.insert(header::CONTENT_TYPE, content_type)
    }

    pub async fn send(self, app: &Router) -> TestResponse {
        let response = app
            .clone()
            .oneshot(self.request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body")
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Fully buffered response
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    #[track_caller]
    pub fn expect_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Redirect target of a 302
    pub fn location(&self) -> Url {
        Url::parse(self.header("location").expect("location header")).expect("absolute location")
    }

    /// Redirect target without its query, for comparing against registered URIs
    pub fn location_base(&self) -> String {
        let mut url = self.location();
        url.set_query(None);
        url.to_string()
    }

    pub fn location_param(&self, name: &str) -> Option<String> {
        self.location()
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Token responses and token errors must not be cached
    #[track_caller]
    pub fn assert_no_store(&self) {
        assert_eq!(self.header("cache-control"), Some("no-store"));
        assert_eq!(self.header("pragma"), Some("no-cache"));
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("json response")
    }
}
