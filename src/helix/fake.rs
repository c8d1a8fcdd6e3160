//! In-memory [`Transport`] answering from a closure and recording every request.

use std::cell::{Ref, RefCell};

use serde_json::Value;

use super::Transport;
use crate::result::Result;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Query or form parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        find(&self.params, key)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        find(&self.headers, key)
    }
}

fn find<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

type Handler = Box<dyn Fn(&Request) -> Result<Value>>;

pub struct FakeTransport {
    handler: Handler,
    requests: RefCell<Vec<Request>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Value> + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// A transport that fails the test if it is ever called
    pub fn unreachable() -> Self {
        Self::new(|req| panic!("unexpected request to {}", req.url))
    }

    pub fn requests(&self) -> Ref<'_, Vec<Request>> {
        self.requests.borrow()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.url == url).count()
    }

    fn handle(&self, request: Request) -> Result<Value> {
        let res = (self.handler)(&request);
        self.requests.borrow_mut().push(request);
        res
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str, query: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Value> {
        self.handle(Request {
            method: "GET",
            url: url.to_owned(),
            params: owned(query),
            headers: owned(headers),
        })
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value> {
        self.handle(Request {
            method: "POST",
            url: url.to_owned(),
            params: owned(form),
            headers: Vec::new(),
        })
    }
}
