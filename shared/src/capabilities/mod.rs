mod http;
mod kv;

pub use self::http::{
    HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpResult, ValidatedUrl,
    MAX_TIMEOUT_MS,
};
pub use self::kv::{
    KeyNamespace, KvError, KvKey, KvOperation, KvOutput, KvResult, StorageErrorCode, TypedKvStore,
};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::app::App;
use crate::event::Event;
use crate::form::{DirectoryKey, LocationTriple, SubmitStage};
use crate::{DialogId, PotholeId};

/// Sent with every request so shell logs can be matched to core logs.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub key_value: KeyValue<Event>,
    pub render: Render<Event>,
}

impl Capabilities {
    /// Hands a built request to the shell. Its outcome comes back as the
    /// event `reply` resolves to.
    pub fn send(&self, request: HttpRequest, reply: HttpReply) {
        let request_id = request.request_id().to_string();
        let host = request.url().host().to_string();
        trace!(
            request_id = %request_id,
            method = request.method().as_str(),
            path = request.url().path(),
            "http request"
        );

        let url = request.url().as_str();
        let mut builder = match request.method() {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
            HttpMethod::Put => self.http.put(url),
            HttpMethod::Delete => self.http.delete(url),
        };
        if let Some(body) = request.body() {
            builder = builder.body_bytes(body.to_vec());
        }
        // Headers go on after the body so an explicit content type wins.
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        builder = builder.header(REQUEST_ID_HEADER, request_id.as_str());

        builder.send(move |result| reply.resolve(received(result, &host, request_id)));
    }

    /// Runs a validated storage operation against the shell's key-value store.
    pub fn store(&self, operation: KvOperation, reply: KvReply) {
        match operation {
            KvOperation::Get { key } => self.key_value.get(key.raw(), move |result| {
                reply.resolve(result.map(KvOutput::Value).map_err(storage_error))
            }),
            KvOperation::Set { key, value } => self.key_value.set(key.raw(), value, move |result| {
                reply.resolve(result.map(|_| KvOutput::Written).map_err(storage_error))
            }),
            KvOperation::Delete { key } => self.key_value.delete(key.raw(), move |result| {
                reply.resolve(
                    result
                        .map(|previous| KvOutput::Deleted {
                            existed: previous.is_some(),
                        })
                        .map_err(storage_error),
                )
            }),
        }
    }
}

/// Every status is a response; only failures to reach the backend are errors.
fn received(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
    host: &str,
    request_id: String,
) -> HttpResult {
    match result {
        Ok(mut response) => {
            let status = u16::from(response.status());
            let body = response.take_body().unwrap_or_default();
            Ok(HttpResponse::new(status, HttpHeaders::new(), body, request_id))
        }
        Err(e) => Err(HttpError::ConnectionError {
            host: host.to_string(),
            message: e.to_string(),
        }),
    }
}

fn storage_error(error: impl std::fmt::Debug) -> KvError {
    KvError::storage(StorageErrorCode::Unavailable, format!("{error:?}"))
}

/// Routing for an HTTP outcome. Dialog-scoped replies carry the provenance
/// used to discard answers the dialog has moved past.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpReply {
    Login,
    Logout,
    Potholes,
    EditRecord { dialog: DialogId },
    Directory { dialog: DialogId, key: DirectoryKey },
    ReversePostal { dialog: DialogId, triple: LocationTriple },
    ForwardPostal { dialog: DialogId, code: String },
    Citizen { dialog: DialogId, phone: String },
    SubmitStep { dialog: DialogId, stage: SubmitStage },
    DeletePothole { id: PotholeId },
}

impl HttpReply {
    #[must_use]
    pub fn resolve(self, result: HttpResult) -> Event {
        match self {
            Self::Login => Event::LoginResponse(result),
            Self::Logout => Event::LogoutResponse(result),
            Self::Potholes => Event::PotholesLoaded(result),
            Self::EditRecord { dialog } => Event::EditRecordLoaded { dialog, result },
            Self::Directory { dialog, key } => Event::DirectoryLoaded {
                dialog,
                key,
                result,
            },
            Self::ReversePostal { dialog, triple } => Event::ReversePostalLoaded {
                dialog,
                triple,
                result,
            },
            Self::ForwardPostal { dialog, code } => Event::ForwardPostalLoaded {
                dialog,
                code,
                result,
            },
            Self::Citizen { dialog, phone } => Event::CitizenLoaded {
                dialog,
                phone,
                result,
            },
            Self::SubmitStep { dialog, stage } => Event::SubmitStepCompleted {
                dialog,
                stage,
                result,
            },
            Self::DeletePothole { id } => Event::PotholeDeleted { id, result },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvReply {
    SessionLoaded,
    SessionStored,
    SessionCleared,
}

impl KvReply {
    #[must_use]
    pub fn resolve(self, result: KvResult) -> Event {
        match self {
            Self::SessionLoaded => Event::SessionLoaded(result),
            Self::SessionStored => Event::SessionStored(result),
            Self::SessionCleared => Event::SessionCleared(result),
        }
    }
}
