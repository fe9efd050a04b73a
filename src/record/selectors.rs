//! Selector rules mapping each record field to its own CSS selector

use crate::record::Field;
use crate::ConfigError;
use scraper::Selector;
use serde::Deserialize;
use std::collections::HashMap;

/// One CSS selector per record field
///
/// Every field is resolved from its own selector; validation rejects two
/// fields sharing the same selector string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorRules {
    pub overview: String,
    pub full_name: String,
    pub years_of_practice: String,
    pub language: String,
    pub office_location: String,
    pub hospital_affiliation: String,
    pub specialties: String,
    pub education_and_medical_training: String,
    pub certification_and_licensure: String,
}

impl Default for SelectorRules {
    fn default() -> Self {
        Self {
            overview: ".Raw-s14xcvr1-0.gXqFYO".to_string(),
            full_name: ".sc-iwsKbI.kjxnCg".to_string(),
            years_of_practice: "[data-field='years-of-practice'] .DataField__Data-c3wc7f-1"
                .to_string(),
            language: "[data-field='languages'] .DataField__Data-c3wc7f-1".to_string(),
            office_location: ".Paragraph-fqygwe-0.cojhks".to_string(),
            hospital_affiliation: ".Paragraph-fqygwe-0.fwayNy".to_string(),
            specialties: "[data-field='specialties'] .DataField__Data-c3wc7f-1".to_string(),
            education_and_medical_training: ".EducationAndExperience__Item-xn5fll-0.bzYYRk"
                .to_string(),
            certification_and_licensure: ".Paragraph-fqygwe-0.bQPwuv".to_string(),
        }
    }
}

impl SelectorRules {
    /// Returns the selector string configured for a field
    pub fn get(&self, field: Field) -> &str {
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

    /// Checks that every selector parses and that no selector is shared
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile().map(|_| ())
    }

    /// Parses every selector once, ready for repeated extraction
    pub fn compile(&self) -> Result<CompiledSelectors, ConfigError> {
        let mut seen: HashMap<&str, Field> = HashMap::new();
        let mut compiled = Vec::with_capacity(Field::ALL.len());

        for field in Field::ALL {
            let raw = self.get(field).trim();

            if raw.is_empty() {
                return Err(ConfigError::InvalidSelector {
                    field: field.config_key().to_string(),
                    message: "selector cannot be empty".to_string(),
                });
            }

            if let Some(other) = seen.insert(raw, field) {
                return Err(ConfigError::InvalidSelector {
                    field: field.config_key().to_string(),
                    message: format!("selector '{}' is already used by {}", raw, other.config_key()),
                });
            }

            let selector = Selector::parse(raw).map_err(|e| ConfigError::InvalidSelector {
                field: field.config_key().to_string(),
                message: e.to_string(),
            })?;

            compiled.push((field, selector));
        }

        Ok(CompiledSelectors { selectors: compiled })
    }
}

/// Parsed selectors, one per field in [`Field::ALL`] order
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    selectors: Vec<(Field, Selector)>,
}

impl CompiledSelectors {
    /// Iterates over every field with its selector
    pub fn iter(&self) -> impl Iterator<Item = (Field, &Selector)> {
        self.selectors.iter().map(|(field, selector)| (*field, selector))
    }
}
