//! Backend endpoints, request construction and response decoding.

mod dto;

pub use dto::*;

use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};

use crate::capabilities::{HttpError, HttpMethod, HttpRequest, HttpResult, ValidatedUrl};
use crate::config::ApiConfig;
use crate::form::{DirectoryEntry, DirectoryKey, LocalFile, LocationTriple, PotholeWrite, SubmitAction};
use crate::{AppError, AppResult, ErrorKind, PotholeId};

pub const UPLOAD_FIELD: &str = "file";

pub mod paths {
    pub const LOGIN: &str = "/api/auth/login";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const STATES: &str = "/api/geography/states/list";
    pub const MUNICIPALITIES: &str = "/api/geography/municipalities/list";
    pub const LOCALITIES: &str = "/api/geography/localities/list";
    pub const STREETS: &str = "/api/geography/streets/list/by-locality";
    pub const CATEGORIES: &str = "/api/pothole-categories/list";
    pub const ZIP_REVERSE: &str = "/api/geography/zipcode/reverse-lookup";
    pub const ZIP_FORWARD: &str = "/api/geography/zipcode/lookup";
    pub const CITIZEN_LOOKUP: &str = "/api/citizens/lookup";
    pub const LOCATION_ADD: &str = "/api/geography/locations/add";
    pub const CITIZEN_ADD: &str = "/api/citizens/add";
    pub const FILE_UPLOAD: &str = "/api/files/upload/pothole-image";
    pub const FILE_DELETE: &str = "/api/files/delete";
    pub const POTHOLES_ACTIVE: &str = "/api/potholes/active";
    pub const POTHOLE_ADD: &str = "/api/potholes/add";
    pub const POTHOLE_UPDATE: &str = "/api/potholes/update";
    pub const POTHOLE_DELETE: &str = "/api/potholes/delete";
    pub const POTHOLE: &str = "/api/potholes";
}

/// Builds requests against the configured backend, attaching the session token when present.
pub struct ApiClient<'a> {
    config: &'a ApiConfig,
    token: Option<&'a SecretString>,
}

impl<'a> ApiClient<'a> {
    pub fn new(config: &'a ApiConfig, token: Option<&'a SecretString>) -> Self {
        Self { config, token }
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<ValidatedUrl, HttpError> {
        let mut url = ValidatedUrl::parse(&self.config.base_url)?;
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{path}"));
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(ValidatedUrl::from_parsed(url))
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<HttpRequest, HttpError> {
        let request = HttpRequest::new(method, self.url(path, query)?);

        match self.token {
            Some(token) => {
                request.with_header(self.config.auth_header.as_str(), token.expose_secret().as_str())
            }
            None => Ok(request),
        }
    }

    pub fn login(&self, payload: &LoginPayload) -> Result<HttpRequest, HttpError> {
        self.request(HttpMethod::Post, paths::LOGIN, &[])?
            .with_json(payload)
    }

    pub fn logout(&self) -> Result<HttpRequest, HttpError> {
        self.request(HttpMethod::Post, paths::LOGOUT, &[])
    }

    pub fn directory(&self, key: DirectoryKey) -> Result<HttpRequest, HttpError> {
        match key {
            DirectoryKey::States => self.request(HttpMethod::Get, paths::STATES, &[]),
            DirectoryKey::Categories => self.request(HttpMethod::Get, paths::CATEGORIES, &[]),
            DirectoryKey::Municipalities(state_id) => self.request(
                HttpMethod::Get,
                paths::MUNICIPALITIES,
                &[("stateId", state_id.to_string())],
            ),
            DirectoryKey::Localities(municipality_id) => self.request(
                HttpMethod::Get,
                paths::LOCALITIES,
                &[("municipalityId", municipality_id.to_string())],
            ),
            DirectoryKey::Streets(locality_id) => self.request(
                HttpMethod::Get,
                paths::STREETS,
                &[("localityId", locality_id.to_string())],
            ),
        }
    }

    pub fn reverse_postal(&self, triple: LocationTriple) -> Result<HttpRequest, HttpError> {
        self.request(
            HttpMethod::Get,
            paths::ZIP_REVERSE,
            &[
                ("stateId", triple.state_id.to_string()),
                ("municipalityId", triple.municipality_id.to_string()),
                ("localityId", triple.locality_id.to_string()),
            ],
        )
    }

    /// The backend takes the code as a number, so leading zeros are dropped.
    pub fn forward_postal(&self, code: &str) -> Result<HttpRequest, HttpError> {
        let numeric = code
            .parse::<u32>()
            .map_or_else(|_| code.to_string(), |n| n.to_string());
        self.request(HttpMethod::Get, paths::ZIP_FORWARD, &[("postalCode", numeric)])
    }

    pub fn citizen_lookup(&self, phone: &str) -> Result<HttpRequest, HttpError> {
        self.request(
            HttpMethod::Get,
            paths::CITIZEN_LOOKUP,
            &[("phoneNumber", phone.to_string())],
        )
    }

    pub fn submit(&self, action: &SubmitAction) -> Result<HttpRequest, HttpError> {
        match action {
            SubmitAction::CreateLocation(dto) => self
                .request(HttpMethod::Post, paths::LOCATION_ADD, &[])?
                .with_json(dto),
            SubmitAction::CreateCitizen(dto) => self
                .request(HttpMethod::Post, paths::CITIZEN_ADD, &[])?
                .with_json(dto),
            SubmitAction::DeletePhoto { filename } => self.request(
                HttpMethod::Delete,
                paths::FILE_DELETE,
                &[("filename", filename.clone())],
            ),
            SubmitAction::UploadPhoto(file) => self.upload_photo(file),
            SubmitAction::WritePothole(PotholeWrite::Create(dto)) => self
                .request(HttpMethod::Post, paths::POTHOLE_ADD, &[])?
                .with_json(dto),
            SubmitAction::WritePothole(PotholeWrite::Update { id, dto }) => self
                .request(
                    HttpMethod::Put,
                    &format!("{}/{id}", paths::POTHOLE_UPDATE),
                    &[],
                )?
                .with_json(dto),
        }
    }

    fn upload_photo(&self, file: &LocalFile) -> Result<HttpRequest, HttpError> {
        self.request(HttpMethod::Post, paths::FILE_UPLOAD, &[])?
            .with_multipart_file(UPLOAD_FIELD, &file.name, &file.mime_type, &file.bytes)
    }

    pub fn active_potholes(&self) -> Result<HttpRequest, HttpError> {
        self.request(HttpMethod::Get, paths::POTHOLES_ACTIVE, &[])
    }

    pub fn pothole(&self, id: PotholeId) -> Result<HttpRequest, HttpError> {
        self.request(HttpMethod::Get, &format!("{}/{id}", paths::POTHOLE), &[])
    }

    pub fn delete_pothole(&self, id: PotholeId) -> Result<HttpRequest, HttpError> {
        self.request(
            HttpMethod::Delete,
            &format!("{}/{id}", paths::POTHOLE_DELETE),
            &[],
        )
    }
}

/// Success body as `T`; transport failures and non-2xx statuses become [`AppError`]s.
pub fn decode_json<T: DeserializeOwned>(result: HttpResult) -> AppResult<T> {
    let response = result?;
    if !response.is_success() {
        return Err(AppError::from_http_status(
            response.status(),
            Some(response.body()),
        ));
    }
    Ok(response.json()?)
}

/// Like [`decode_json`], but `404` and empty bodies mean "nothing there".
pub fn decode_optional<T: DeserializeOwned>(result: HttpResult) -> AppResult<Option<T>> {
    let response = result?;
    if response.status() == 404 {
        return Ok(None);
    }
    if !response.is_success() {
        return Err(AppError::from_http_status(
            response.status(),
            Some(response.body()),
        ));
    }
    if response.body().iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(response.json::<Option<T>>()?)
}

pub fn decode_empty(result: HttpResult) -> AppResult<()> {
    let response = result?;
    if response.is_success() {
        Ok(())
    } else {
        Err(AppError::from_http_status(
            response.status(),
            Some(response.body()),
        ))
    }
}

macro_rules! directory_row {
    ($name:ident, $id:ident, $label:ident) => {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct $name {
            $id: u64,
            $label: String,
        }

        impl From<$name> for DirectoryEntry {
            fn from(row: $name) -> Self {
                DirectoryEntry::new(row.$id, row.$label)
            }
        }
    };
}

directory_row!(StateRow, state_id, state_name);
directory_row!(MunicipalityRow, municipality_id, municipality_name);
directory_row!(LocalityRow, locality_id, locality_name);
directory_row!(StreetRow, street_id, street_name);
directory_row!(CategoryRow, category_id, category_name);

fn rows<R>(result: HttpResult) -> AppResult<Vec<DirectoryEntry>>
where
    R: DeserializeOwned + Into<DirectoryEntry>,
{
    decode_json::<Vec<R>>(result).map(|rows| rows.into_iter().map(Into::into).collect())
}

pub fn decode_directory(key: DirectoryKey, result: HttpResult) -> AppResult<Vec<DirectoryEntry>> {
    match key {
        DirectoryKey::States => rows::<StateRow>(result),
        DirectoryKey::Categories => rows::<CategoryRow>(result),
        DirectoryKey::Municipalities(_) => rows::<MunicipalityRow>(result),
        DirectoryKey::Localities(_) => rows::<LocalityRow>(result),
        DirectoryKey::Streets(_) => rows::<StreetRow>(result),
    }
}

/// A numeric id answered as a bare JSON number.
pub fn decode_id(result: HttpResult) -> AppResult<u64> {
    let value: serde_json::Value = decode_json(result)?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| {
            AppError::new(ErrorKind::Deserialization, "expected a numeric id")
                .with_internal(value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{HttpHeaders, HttpResponse};
    use crate::{LocalityId, MunicipalityId, StateId};
    use serde_json::json;

    fn config() -> ApiConfig {
        ApiConfig::default()
    }

    #[test]
    fn test_token_is_injected_into_configured_header() {
        let config = config();
        let token = SecretString::new("tok-123".to_string());

        let signed = ApiClient::new(&config, Some(&token)).active_potholes().unwrap();
        assert_eq!(signed.headers().get("X-Auth-Token"), Some("tok-123"));

        let anonymous = ApiClient::new(&config, None).active_potholes().unwrap();
        assert_eq!(anonymous.headers().get("X-Auth-Token"), None);
    }

    #[test]
    fn test_urls_keep_base_path_prefix() {
        let config = ApiConfig {
            base_url: "https://city.example.mx/backend/".into(),
            ..ApiConfig::default()
        };
        let request = ApiClient::new(&config, None)
            .directory(DirectoryKey::Municipalities(StateId::new(5)))
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://city.example.mx/backend/api/geography/municipalities/list?stateId=5"
        );
    }

    #[test]
    fn test_reverse_postal_query() {
        let config = config();
        let request = ApiClient::new(&config, None)
            .reverse_postal(LocationTriple {
                state_id: StateId::new(5),
                municipality_id: MunicipalityId::new(12),
                locality_id: LocalityId::new(44),
            })
            .unwrap();
        assert_eq!(request.url().path(), paths::ZIP_REVERSE);
        assert_eq!(request.query_param("stateId").as_deref(), Some("5"));
        assert_eq!(request.query_param("municipalityId").as_deref(), Some("12"));
        assert_eq!(request.query_param("localityId").as_deref(), Some("44"));
    }

    #[test]
    fn test_forward_postal_sends_numeric_code() {
        let config = config();
        let request = ApiClient::new(&config, None).forward_postal("01000").unwrap();
        assert_eq!(request.query_param("postalCode").as_deref(), Some("1000"));
    }

    #[test]
    fn test_upload_uses_multipart() {
        let config = config();
        let file = LocalFile {
            name: "bache.jpg".into(),
            mime_type: "image/jpeg".into(),
            bytes: vec![1, 2, 3],
        };
        let request = ApiClient::new(&config, None)
            .submit(&SubmitAction::UploadPhoto(file))
            .unwrap();
        assert_eq!(request.url().path(), paths::FILE_UPLOAD);
        assert!(request
            .headers()
            .get("Content-Type")
            .is_some_and(|ct| ct.starts_with("multipart/form-data")));
    }

    #[test]
    fn test_decode_optional_maps_404_to_none() {
        let found: Option<CitizenLookupDto> =
            decode_optional(Ok(HttpResponse::empty(404))).unwrap();
        assert!(found.is_none());

        let empty: Option<ZipCodeLookupDto> =
            decode_optional(Ok(HttpResponse::empty(200))).unwrap();
        assert!(empty.is_none());

        let failed: AppResult<Option<ZipCodeLookupDto>> =
            decode_optional(Ok(HttpResponse::empty(500)));
        assert_eq!(failed.unwrap_err().kind, ErrorKind::Server);
    }

    #[test]
    fn test_decode_json_surfaces_server_message() {
        let response = HttpResponse::from_json(409, &json!({"message": "Ya existe"})).unwrap();
        let error = decode_json::<u64>(Ok(response)).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Conflict);
        assert_eq!(error.user_facing_message(), "Ya existe");
    }

    #[test]
    fn test_decode_directory_rows() {
        let response = HttpResponse::from_json(
            200,
            &json!([
                {"municipalityId": 12, "municipalityName": "Saltillo", "stateId": 5},
                {"municipalityId": 13, "municipalityName": "Ramos Arizpe", "stateId": 5}
            ]),
        )
        .unwrap();
        let entries =
            decode_directory(DirectoryKey::Municipalities(StateId::new(5)), Ok(response)).unwrap();
        assert_eq!(
            entries,
            vec![
                DirectoryEntry::new(12, "Saltillo"),
                DirectoryEntry::new(13, "Ramos Arizpe"),
            ]
        );
    }

    #[test]
    fn test_decode_id_accepts_bare_number() {
        let response = HttpResponse::new(200, HttpHeaders::new(), b"42".to_vec(), String::new());
        assert_eq!(decode_id(Ok(response)).unwrap(), 42);

        let response = HttpResponse::new(200, HttpHeaders::new(), b"{}".to_vec(), String::new());
        assert_eq!(
            decode_id(Ok(response)).unwrap_err().kind,
            ErrorKind::Deserialization
        );
    }
}
