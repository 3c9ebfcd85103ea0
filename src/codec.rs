//! Snapshot codec: one artifact is one JSON array holding the full catalog.

use crate::model::Book;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed snapshot: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serialize the full record list into one self-describing unit. Every
/// record carries its category discriminator so `decode` can rebuild the
/// concrete variant.
pub fn encode(books: &[Book]) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec_pretty(books).map_err(CodecError::Encode)
}

/// Inverse of [`encode`]. An unrecognized category or malformed structure
/// is a [`CodecError::Decode`], never a silently truncated list.
pub fn decode(bytes: &[u8]) -> Result<Vec<Book>, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BookDetails;

    fn sample_catalog() -> Vec<Book> {
        let details = vec![
            BookDetails::Computer {
                programming_language: "Rust".into(),
                framework: "tokio".into(),
                difficulty: "advanced".into(),
            },
            BookDetails::Literature {
                genre: "novel".into(),
                era: "modern".into(),
                language: "en".into(),
            },
            BookDetails::Science {
                subject_area: "physics".into(),
                research_field: "optics".into(),
                academic_level: "graduate".into(),
            },
            BookDetails::Art {
                art_form: "painting".into(),
                medium: "oil".into(),
                style: "impressionism".into(),
            },
            BookDetails::History {
                time_period: "antiquity".into(),
                region: "Mediterranean".into(),
                historical_figures: "Hannibal".into(),
            },
            BookDetails::Philosophy {
                philosophical_school: "stoicism".into(),
                key_concepts: "virtue".into(),
                thinkers: "Epictetus".into(),
            },
            BookDetails::Economics {
                economic_school: "Austrian".into(),
                market_type: "open".into(),
                application_field: "macro".into(),
            },
            BookDetails::Medicine {
                medical_specialty: "cardiology".into(),
                clinical_focus: "arrhythmia".into(),
                practice_area: "hospital".into(),
            },
            BookDetails::Education {
                education_level: "secondary".into(),
                subject: "math".into(),
                teaching_method: "inquiry".into(),
            },
            BookDetails::Law {
                legal_system: "common law".into(),
                jurisdiction: "UK".into(),
                legal_field: "contract".into(),
            },
        ];
        details
            .into_iter()
            .enumerate()
            .map(|(i, details)| Book {
                id: Some(i as i64 + 1),
                isbn: format!("978-0-00-{:06}-0", i),
                title: format!("Title {i}"),
                author: format!("Author {i}"),
                stock: i as u32,
                details,
            })
            .collect()
    }

    #[test]
    fn round_trip_all_categories() {
        let books = sample_catalog();
        let bytes = encode(&books).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, books);
    }

    #[test]
    fn round_trip_preserves_unassigned_id() {
        let mut books = sample_catalog();
        books[0].id = None;
        let decoded = decode(&encode(&books).unwrap()).unwrap();
        assert_eq!(decoded[0].id, None);
    }

    #[test]
    fn unknown_category_is_a_decode_error() {
        let payload = br#"[{
            "id": 1,
            "isbn": "978-0-00-000000-0",
            "title": "t",
            "author": "a",
            "stock": 1,
            "category": "Cooking",
            "cuisine": "french"
        }]"#;
        assert!(matches!(decode(payload), Err(CodecError::Decode(_))));
    }

    #[test]
    fn truncated_payload_is_a_decode_error() {
        let books = sample_catalog();
        let bytes = encode(&books).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() / 2]),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn encoded_records_carry_the_discriminator() {
        let books = sample_catalog();
        let value: serde_json::Value = serde_json::from_slice(&encode(&books).unwrap()).unwrap();
        assert_eq!(value[0]["category"], "Computer");
        assert_eq!(value[9]["category"], "Law");
    }
}
