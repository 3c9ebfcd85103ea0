use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// One catalog record. `id` is assigned by the catalog on first persistence
/// and stays `None` before that; `isbn` is the unique business key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: Option<i64>,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub stock: u32,
    #[serde(flatten)]
    pub details: BookDetails,
}

/// Category-specific payload. The `category` tag is the discriminator in
/// every serialized form (snapshot artifacts and the catalog's details
/// column); an unknown tag fails decoding instead of dropping fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "category")]
pub enum BookDetails {
    Computer {
        programming_language: String,
        framework: String,
        difficulty: String,
    },
    Literature {
        genre: String,
        era: String,
        language: String,
    },
    Science {
        subject_area: String,
        research_field: String,
        academic_level: String,
    },
    Art {
        art_form: String,
        medium: String,
        style: String,
    },
    History {
        time_period: String,
        region: String,
        historical_figures: String,
    },
    Philosophy {
        philosophical_school: String,
        key_concepts: String,
        thinkers: String,
    },
    Economics {
        economic_school: String,
        market_type: String,
        application_field: String,
    },
    Medicine {
        medical_specialty: String,
        clinical_focus: String,
        practice_area: String,
    },
    Education {
        education_level: String,
        subject: String,
        teaching_method: String,
    },
    Law {
        legal_system: String,
        jurisdiction: String,
        legal_field: String,
    },
}

impl BookDetails {
    pub fn category(&self) -> &'static str {
        match self {
            BookDetails::Computer { .. } => "Computer",
            BookDetails::Literature { .. } => "Literature",
            BookDetails::Science { .. } => "Science",
            BookDetails::Art { .. } => "Art",
            BookDetails::History { .. } => "History",
            BookDetails::Philosophy { .. } => "Philosophy",
            BookDetails::Economics { .. } => "Economics",
            BookDetails::Medicine { .. } => "Medicine",
            BookDetails::Education { .. } => "Education",
            BookDetails::Law { .. } => "Law",
        }
    }
}

fn require(value: &str, name: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(name));
    }
    Ok(())
}

impl Book {
    /// Field-presence checks applied before a record enters the catalog:
    /// common fields plus the required fields of its category.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.isbn, "isbn")?;
        require(&self.title, "title")?;
        require(&self.author, "author")?;
        match &self.details {
            BookDetails::Computer {
                programming_language,
                difficulty,
                ..
            } => {
                require(programming_language, "programming_language")?;
                require(difficulty, "difficulty")
            }
            BookDetails::Literature { genre, .. } => require(genre, "genre"),
            BookDetails::Science { subject_area, .. } => require(subject_area, "subject_area"),
            BookDetails::Art { art_form, .. } => require(art_form, "art_form"),
            BookDetails::History { time_period, .. } => require(time_period, "time_period"),
            BookDetails::Philosophy {
                philosophical_school,
                ..
            } => require(philosophical_school, "philosophical_school"),
            BookDetails::Economics {
                economic_school, ..
            } => require(economic_school, "economic_school"),
            BookDetails::Medicine {
                medical_specialty, ..
            } => require(medical_specialty, "medical_specialty"),
            BookDetails::Education {
                education_level, ..
            } => require(education_level, "education_level"),
            BookDetails::Law { legal_system, .. } => require(legal_system, "legal_system"),
        }
    }
}
