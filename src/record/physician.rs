/// Physician record definitions
///
/// A record is the unit of extracted knowledge: one per parsed detail page.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// The fields extracted from a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Overview,
    FullName,
    YearsOfPractice,
    Language,
    OfficeLocation,
    HospitalAffiliation,
    Specialties,
    EducationAndMedicalTraining,
    CertificationAndLicensure,
}

impl Field {
    /// Every field, in document order
    pub const ALL: [Field; 9] = [
        Self::Overview,
        Self::FullName,
        Self::YearsOfPractice,
        Self::Language,
        Self::OfficeLocation,
        Self::HospitalAffiliation,
        Self::Specialties,
        Self::EducationAndMedicalTraining,
        Self::CertificationAndLicensure,
    ];

    /// The document attribute name stored in the index
    pub fn name(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::FullName => "full_name",
            Self::YearsOfPractice => "years_of_practice",
            Self::Language => "language",
            Self::OfficeLocation => "office_location",
            Self::HospitalAffiliation => "hospital_affiliation",
            Self::Specialties => "specialties",
            Self::EducationAndMedicalTraining => "education_and_medical_training",
            Self::CertificationAndLicensure => "certification_and_licensure",
        }
    }

    /// The key used for this field in the `[selectors]` config table
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::FullName => "full-name",
            Self::YearsOfPractice => "years-of-practice",
            Self::Language => "language",
            Self::OfficeLocation => "office-location",
            Self::HospitalAffiliation => "hospital-affiliation",
            Self::Specialties => "specialties",
            Self::EducationAndMedicalTraining => "education-and-medical-training",
            Self::CertificationAndLicensure => "certification-and-licensure",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Structured data extracted from one physician detail page
///
/// Every attribute is optional; `None` means the page had no match for the
/// field's selector and is serialized as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicianRecord {
    pub overview: Option<String>,
    pub full_name: Option<String>,
    pub years_of_practice: Option<String>,
    pub language: Option<String>,
    pub office_location: Option<String>,
    pub hospital_affiliation: Option<String>,
    pub specialties: Option<String>,
    pub education_and_medical_training: Option<String>,
    pub certification_and_licensure: Option<String>,

    /// Page the record was extracted from; not part of the indexed document
    #[serde(skip)]
    pub source_url: Option<String>,
}

impl PhysicianRecord {
    /// Returns the value of a field
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Sets the value of a field
    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// Number of fields that carry a value
    pub fn populated_fields(&self) -> usize {
        Field::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    /// Returns true if no field carries a value
    pub fn is_empty(&self) -> bool {
        self.populated_fields() == 0
    }

    /// Stable document key derived from the physician's identity
    ///
    /// Hashes the normalized full name and office location so repeated
    /// crawls overwrite the same document. Without a name the office alone
    /// does not identify a physician, so the source URL is hashed instead.
    pub fn document_id(&self) -> String {
        let mut hasher = Sha256::new();

        if self.full_name.is_none() {
            hasher.update(b"url|");
            hasher.update(self.source_url.as_deref().unwrap_or_default().as_bytes());
        } else {
            hasher.update(normalize_key(self.full_name.as_deref()).as_bytes());
            hasher.update(b"|");
            hasher.update(normalize_key(self.office_location.as_deref()).as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Overview => &self.overview,
            Field::FullName => &self.full_name,
            Field::YearsOfPractice => &self.years_of_practice,
            Field::Language => &self.language,
            Field::OfficeLocation => &self.office_location,
            Field::HospitalAffiliation => &self.hospital_affiliation,
            Field::Specialties => &self.specialties,
            Field::EducationAndMedicalTraining => &self.education_and_medical_training,
            Field::CertificationAndLicensure => &self.certification_and_licensure,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Overview => &mut self.overview,
            Field::FullName => &mut self.full_name,
            Field::YearsOfPractice => &mut self.years_of_practice,
            Field::Language => &mut self.language,
            Field::OfficeLocation => &mut self.office_location,
            Field::HospitalAffiliation => &mut self.hospital_affiliation,
            Field::Specialties => &mut self.specialties,
            Field::EducationAndMedicalTraining => &mut self.education_and_medical_training,
            Field::CertificationAndLicensure => &mut self.certification_and_licensure,
        }
    }
}

/// Lower-cases and collapses runs of whitespace
fn normalize_key(value: Option<&str>) -> String {
    value
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
