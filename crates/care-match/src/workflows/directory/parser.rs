use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::io::Read;

use crate::workflows::intake::domain::{
    ContactDetails, Coordinates, LocationData, NeedCategory, Provider, ProviderId,
    VerificationStatus,
};

const LIST_SEPARATOR: char = ';';

#[derive(Debug)]
pub(crate) struct RowError {
    pub(crate) line: u64,
    pub(crate) reason: String,
}

pub(crate) enum ParseFailure {
    Csv(csv::Error),
    Row(RowError),
}

pub(crate) fn parse_providers<R: Read>(reader: R) -> Result<Vec<Provider>, ParseFailure> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut providers = Vec::new();

    for (index, record) in csv_reader.deserialize::<ProviderRow>().enumerate() {
        let row = record.map_err(ParseFailure::Csv)?;
        // Line 1 holds the headers.
        let line = index as u64 + 2;
        let provider = row.into_provider(line).map_err(ParseFailure::Row)?;
        providers.push(provider);
    }

    Ok(providers)
}

#[derive(Debug, Deserialize)]
struct ProviderRow {
    #[serde(rename = "Provider ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Services")]
    services: String,
    #[serde(rename = "Address", default, deserialize_with = "empty_string_as_none")]
    address: Option<String>,
    #[serde(rename = "Latitude", default, deserialize_with = "empty_string_as_none")]
    latitude: Option<String>,
    #[serde(rename = "Longitude", default, deserialize_with = "empty_string_as_none")]
    longitude: Option<String>,
    #[serde(rename = "Region", default, deserialize_with = "empty_string_as_none")]
    region: Option<String>,
    #[serde(rename = "Languages")]
    languages: String,
    #[serde(rename = "Specializations", default)]
    specializations: String,
    #[serde(rename = "Phone", default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(rename = "Website", default, deserialize_with = "empty_string_as_none")]
    website: Option<String>,
    #[serde(rename = "Emergency Services")]
    emergency_services: String,
    #[serde(rename = "Verification Status")]
    verification_status: String,
    #[serde(rename = "Active")]
    active: String,
}

impl ProviderRow {
    fn into_provider(self, line: u64) -> Result<Provider, RowError> {
        let fail = |reason: String| RowError { line, reason };

        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(fail("missing provider id".to_string()));
        }

        let mut service_types = BTreeSet::new();
        for entry in split_list(&self.services) {
            let category = NeedCategory::parse(&entry)
                .ok_or_else(|| fail(format!("unknown service type '{entry}' for {id}")))?;
            service_types.insert(category);
        }

        let coordinates = match (self.latitude.as_deref(), self.longitude.as_deref()) {
            (Some(lat), Some(lng)) => {
                let lat = lat
                    .parse::<f64>()
                    .map_err(|_| fail(format!("invalid latitude '{lat}' for {id}")))?;
                let lng = lng
                    .parse::<f64>()
                    .map_err(|_| fail(format!("invalid longitude '{lng}' for {id}")))?;
                Some(Coordinates::new(lat, lng))
            }
            _ => None,
        };

        let location = if self.address.is_none() && coordinates.is_none() && self.region.is_none()
        {
            None
        } else {
            Some(LocationData {
                address: self.address,
                coordinates,
                region: self.region,
            })
        };

        let verification_status = VerificationStatus::parse(&self.verification_status)
            .ok_or_else(|| {
                fail(format!(
                    "unknown verification status '{}' for {id}",
                    self.verification_status
                ))
            })?;

        let emergency_services = parse_flag(&self.emergency_services)
            .ok_or_else(|| fail(format!("invalid emergency services flag for {id}")))?;
        let is_active =
            parse_flag(&self.active).ok_or_else(|| fail(format!("invalid active flag for {id}")))?;

        Ok(Provider {
            id: ProviderId(id),
            name: self.name,
            service_types,
            location,
            languages_supported: split_list(&self.languages)
                .map(|code| code.to_lowercase())
                .collect(),
            vulnerability_specializations: split_list(&self.specializations)
                .map(|tag| tag.to_lowercase())
                .collect(),
            contact: ContactDetails {
                phone: self.phone,
                email: self.email,
                website: self.website,
            },
            emergency_services,
            verification_status,
            is_active,
        })
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
