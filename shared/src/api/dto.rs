use serde::{Deserialize, Serialize};

use crate::form::{CitizenRecord, LocationTriple};
use crate::{
    CategoryId, CitizenId, LocalityId, LocationId, MunicipalityId, PotholeId, StateId, StreetId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub admin: bool,
}

/// One row of the postal code directory, returned by both lookup directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipCodeLookupDto {
    pub state_id: StateId,
    pub municipality_id: MunicipalityId,
    pub locality_id: LocalityId,
    pub postal_code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality_name: Option<String>,
}

impl ZipCodeLookupDto {
    pub fn triple(&self) -> LocationTriple {
        LocationTriple {
            state_id: self.state_id,
            municipality_id: self.municipality_id,
            locality_id: self.locality_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenLookupDto {
    pub citizen_id: CitizenId,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub second_last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<u64>,
}

impl From<CitizenLookupDto> for CitizenRecord {
    fn from(dto: CitizenLookupDto) -> Self {
        CitizenRecord {
            citizen_id: dto.citizen_id,
            first_name: dto.first_name,
            middle_name: dto.middle_name,
            last_name: dto.last_name,
            second_last_name: dto.second_last_name,
            email: dto.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCreateDto {
    pub state_id: StateId,
    pub municipality_id: MunicipalityId,
    pub locality_id: LocalityId,
    pub main_street_id: StreetId,
    pub street_one_id: Option<StreetId>,
    pub street_two_id: Option<StreetId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenCreateDto {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<u64>,
    pub registered_location_id: LocationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotholeCreateDto {
    pub reporter_citizen_id: Option<CitizenId>,
    pub location_id: LocationId,
    pub category_id: CategoryId,
    pub status_id: u64,
    pub photo_url: Option<String>,
    pub date_reported: Option<String>,
}

/// Fields left as `None` under `skip_serializing_if` are not touched by the backend;
/// the others are sent as `null` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotholeUpdateDto {
    pub report_by_citizen_id: Option<CitizenId>,
    pub location_id: Option<LocationId>,
    pub category_id: Option<CategoryId>,
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_validated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_closed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporterDto {
    pub citizen_id: CitizenId,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub second_last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<u64>,
}

impl ReporterDto {
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
            self.second_last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn phone(&self) -> String {
        self.phone_number.map(|p| p.to_string()).unwrap_or_default()
    }

    pub fn record(&self) -> CitizenRecord {
        CitizenRecord {
            citizen_id: self.citizen_id,
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            second_last_name: self.second_last_name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredByDto {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRef {
    pub state_id: StateId,
    pub state_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityRef {
    pub municipality_id: MunicipalityId,
    pub municipality_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalityRef {
    pub locality_id: LocalityId,
    pub locality_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetRef {
    pub street_id: StreetId,
    pub street_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotholeLocationDto {
    pub location_id: LocationId,
    pub state: StateRef,
    pub municipality: MunicipalityRef,
    pub locality: LocalityRef,
    #[serde(default)]
    pub postal_code: Option<u32>,
    pub main_street: StreetRef,
    #[serde(default)]
    pub street_one: Option<StreetRef>,
    #[serde(default)]
    pub street_two: Option<StreetRef>,
}

impl PotholeLocationDto {
    pub fn triple(&self) -> LocationTriple {
        LocationTriple {
            state_id: self.state.state_id,
            municipality_id: self.municipality.municipality_id,
            locality_id: self.locality.locality_id,
        }
    }

    /// "Main street, between One and Two, Locality".
    pub fn address(&self) -> String {
        let mut address = self.main_street.street_name.clone();
        match (&self.street_one, &self.street_two) {
            (Some(one), Some(two)) => {
                address.push_str(&format!(", between {} and {}", one.street_name, two.street_name));
            }
            (Some(one), None) | (None, Some(one)) => {
                address.push_str(&format!(", near {}", one.street_name));
            }
            (None, None) => {}
        }
        address.push_str(", ");
        address.push_str(&self.locality.locality_name);
        address
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub category_id: CategoryId,
    pub category_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotholeResponseDto {
    pub pothole_id: PotholeId,
    #[serde(default)]
    pub reporter_citizen: Option<ReporterDto>,
    #[serde(default)]
    pub registered_by_user: Option<RegisteredByDto>,
    #[serde(default)]
    pub location: Option<PotholeLocationDto>,
    #[serde(default)]
    pub category: Option<CategoryDto>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub date_reported: Option<String>,
    #[serde(default)]
    pub date_validated: Option<String>,
    #[serde(default)]
    pub date_closed: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}
