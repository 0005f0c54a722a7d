//! Provider directory import and the in-process roster built from it.

mod parser;

use std::io::Read;
use std::path::Path;

use crate::workflows::intake::domain::Provider;
use crate::workflows::intake::repository::{DirectoryError, ProviderDirectory};

use parser::ParseFailure;

/// Failure to turn a provider directory export into `Provider` records.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryImportError {
    #[error("failed to read provider directory export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid provider CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid provider on line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}

impl From<ParseFailure> for DirectoryImportError {
    fn from(failure: ParseFailure) -> Self {
        match failure {
            ParseFailure::Csv(err) => Self::Csv(err),
            ParseFailure::Row(row) => Self::InvalidRow {
                line: row.line,
                reason: row.reason,
            },
        }
    }
}

/// Reads provider directory exports. List columns use `;` as separator.
pub struct ProviderCsvImporter;

impl ProviderCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Provider>, DirectoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Provider>, DirectoryImportError> {
        Ok(parser::parse_providers(reader)?)
    }
}

/// Fixed provider list served as a directory. Holds every provider; only verified,
/// active ones are listed.
#[derive(Debug, Clone, Default)]
pub struct ProviderRoster {
    providers: Vec<Provider>,
}

impl ProviderRoster {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ProviderDirectory for ProviderRoster {
    fn list_active_verified(&self) -> Result<Vec<Provider>, DirectoryError> {
        Ok(self
            .providers
            .iter()
            .filter(|provider| provider.is_matchable())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::intake::domain::{NeedCategory, VerificationStatus};

    const EXPORT: &str = "Provider ID,Name,Services,Address,Latitude,Longitude,Region,Languages,Specializations,Phone,Email,Website,Emergency Services,Verification Status,Active\n\
prv-1,Harbor Shelter,shelter; food,12 Dock St,-1.2921,36.8219,Central,en;SW,Women; children,+254700000001,,,yes,verified,true\n\
prv-2,Legal Aid Clinic,legal_aid,,,,,en,,,,,no,pending,true\n";

    #[test]
    fn importer_parses_lists_flags_and_coordinates() {
        let providers = ProviderCsvImporter::from_reader(EXPORT.as_bytes()).expect("import");
        assert_eq!(providers.len(), 2);

        let shelter = &providers[0];
        assert_eq!(shelter.id.0, "prv-1");
        assert!(shelter.service_types.contains(&NeedCategory::Shelter));
        assert!(shelter.service_types.contains(&NeedCategory::Food));
        assert!(shelter.languages_supported.contains("sw"));
        assert!(shelter.vulnerability_specializations.contains("women"));
        assert!(shelter.emergency_services);
        assert!(shelter.coordinates().is_some());
        assert_eq!(shelter.verification_status, VerificationStatus::Verified);

        let clinic = &providers[1];
        assert!(clinic.location.is_none());
        assert!(!clinic.emergency_services);
        assert_eq!(clinic.verification_status, VerificationStatus::Pending);
    }

    #[test]
    fn unknown_service_type_reports_the_line() {
        let export = "Provider ID,Name,Services,Languages,Emergency Services,Verification Status,Active\n\
prv-9,Mystery Org,astrology,en,no,verified,true\n";

        match ProviderCsvImporter::from_reader(export.as_bytes()) {
            Err(DirectoryImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("astrology"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn roster_lists_only_verified_active_providers() {
        let providers = ProviderCsvImporter::from_reader(EXPORT.as_bytes()).expect("import");
        let roster = ProviderRoster::new(providers);

        let listed = roster.list_active_verified().expect("roster never fails");
        assert_eq!(roster.len(), 2);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.0, "prv-1");
    }

    #[test]
    fn missing_export_surfaces_io_error_with_source() {
        use std::error::Error as _;

        let err = ProviderCsvImporter::from_path("/nonexistent/providers.csv")
            .expect_err("file does not exist");

        assert!(matches!(err, DirectoryImportError::Io(_)));
        assert!(err
            .to_string()
            .starts_with("failed to read provider directory export"));
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_row_message_names_the_line() {
        let err = DirectoryImportError::InvalidRow {
            line: 7,
            reason: "unknown service type 'astrology'".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "invalid provider on line 7: unknown service type 'astrology'"
        );
    }
}
