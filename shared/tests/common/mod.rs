#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use crux_kv::error::KeyValueError;
use crux_kv::value::Value;
use crux_kv::{KeyValueOperation, KeyValueResponse, KeyValueResult};
use serde_json::Value as Json;
use shared::{App, Effect, Event, Model, ViewModel};
use url::Url;

/// Plays the shell: answers HTTP by method and path and keeps storage in
/// memory. The last answer queued for a route is repeated; unscripted
/// routes answer 404. Requests on a held route wait for [`Backend::release`].
pub struct Backend {
    app: AppTester<App, Effect>,
    pub model: Model,
    routes: HashMap<(String, String), VecDeque<(u16, Vec<u8>)>>,
    held_routes: Vec<(String, String)>,
    held: Vec<Request<HttpRequest>>,
    sent: Vec<HttpRequest>,
    storage: Option<HashMap<String, Vec<u8>>>,
    renders: usize,
}

impl Default for Backend {
    fn default() -> Self {
        Self::with_model(Model::default())
    }
}

impl Backend {
    pub fn with_model(model: Model) -> Self {
        Self {
            app: AppTester::default(),
            model,
            routes: HashMap::new(),
            held_routes: Vec::new(),
            held: Vec::new(),
            sent: Vec::new(),
            storage: Some(HashMap::new()),
            renders: 0,
        }
    }

    /// Storage that fails every operation.
    pub fn without_storage(mut self) -> Self {
        self.storage = None;
        self
    }

    pub fn respond(&mut self, method: &str, path: &str, status: u16, body: Vec<u8>) {
        self.routes
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body));
    }

    pub fn json(&mut self, method: &str, path: &str, status: u16, body: Json) {
        self.respond(method, path, status, serde_json::to_vec(&body).unwrap());
    }

    pub fn hold(&mut self, method: &str, path: &str) {
        self.held_routes.push((method.to_string(), path.to_string()));
    }

    /// Answers the oldest held request whose query has `name=value`.
    pub fn release(&mut self, name: &str, value: &str) {
        let index = self
            .held
            .iter()
            .position(|r| query(&r.operation, name).as_deref() == Some(value))
            .expect("a held request with that query");
        let mut request = self.held.remove(index);
        let answer = self.answer(&request.operation);
        let update = self.app.resolve(&mut request, HttpResult::Ok(answer)).expect("request resolves");
        self.run(update.events.into());
    }

    pub fn dispatch(&mut self, event: Event) {
        self.run(VecDeque::from([event]));
    }

    fn run(&mut self, mut events: VecDeque<Event>) {
        while let Some(event) = events.pop_front() {
            let update = self.app.update(event, &mut self.model);
            events.extend(update.events);

            for effect in update.effects {
                match effect {
                    Effect::Render(_) => self.renders += 1,
                    Effect::Http(mut request) => {
                        self.sent.push(request.operation.clone());
                        let route = route_key(&request.operation);
                        if self.held_routes.contains(&route) {
                            self.held.push(request);
                            continue;
                        }
                        let answer = self.answer(&request.operation);
                        let update = self
                            .app
                            .resolve(&mut request, HttpResult::Ok(answer))
                            .expect("request resolves");
                        events.extend(update.events);
                    }
                    Effect::KeyValue(mut request) => {
                        let result = self.store(&request.operation);
                        let update = self
                            .app
                            .resolve(&mut request, result)
                            .expect("storage resolves");
                        events.extend(update.events);
                    }
                }
            }
        }
    }

    fn answer(&mut self, request: &HttpRequest) -> HttpResponse {
        let (status, body) = match self.routes.get_mut(&route_key(request)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => (404, Vec::new()),
        };
        HttpResponse::status(status).body(body).build()
    }

    fn store(&mut self, operation: &KeyValueOperation) -> KeyValueResult {
        let Some(entries) = self.storage.as_mut() else {
            return KeyValueResult::Err {
                error: KeyValueError::Io {
                    message: "storage offline".into(),
                },
            };
        };
        let wrap = |v: Option<Vec<u8>>| v.map_or(Value::None, Value::Bytes);
        let response = match operation {
            KeyValueOperation::Get { key } => KeyValueResponse::Get {
                value: wrap(entries.get(key).cloned()),
            },
            KeyValueOperation::Set { key, value } => KeyValueResponse::Set {
                previous: wrap(entries.insert(key.clone(), value.clone())),
            },
            KeyValueOperation::Delete { key } => KeyValueResponse::Delete {
                previous: wrap(entries.remove(key)),
            },
            other => panic!("unexpected storage operation {other:?}"),
        };
        KeyValueResult::Ok { response }
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.storage.as_ref().and_then(|s| s.get(key).cloned())
    }

    pub fn put_stored(&mut self, key: &str, value: Vec<u8>) {
        if let Some(entries) = self.storage.as_mut() {
            entries.insert(key.to_string(), value);
        }
    }

    pub fn requests(&self) -> &[HttpRequest] {
        &self.sent
    }

    /// `METHOD /path` of every request sent so far.
    pub fn routes(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|r| {
                let (method, path) = route_key(r);
                format!("{method} {path}")
            })
            .collect()
    }

    pub fn last_to(&self, method: &str, path: &str) -> Option<&HttpRequest> {
        let wanted = (method.to_string(), path.to_string());
        self.sent.iter().rev().find(|r| route_key(r) == wanted)
    }
}

fn route_key(request: &HttpRequest) -> (String, String) {
    let url = Url::parse(&request.url).unwrap();
    (request.method.to_uppercase(), url.path().to_string())
}

pub fn query(request: &HttpRequest, name: &str) -> Option<String> {
    Url::parse(&request.url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn body_json(request: &HttpRequest) -> Json {
    serde_json::from_slice(&request.body).unwrap()
}
