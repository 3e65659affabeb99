//! The persisted dataset: one JSON object with a list per record kind.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::types::{CollectResult, Product, Review, Testimonial};

/// Everything collected in one run, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub reviews: Vec<Review>,
    pub products: Vec<Product>,
    pub testimonials: Vec<Testimonial>,
}

impl Dataset {
    /// Serialize with four-space indentation and unescaped UTF-8.
    pub fn to_json_bytes(&self) -> CollectResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Write the dataset to any writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> CollectResult<()> {
        writer.write_all(&self.to_json_bytes()?)?;
        Ok(())
    }

    /// Write the dataset to a file, creating parent directories as needed.
    pub fn write_to_file(&self, path: &Path) -> CollectResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(path)?;
        self.write_to(&mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Read a dataset from any reader.
    pub fn read_from<R: Read>(reader: R) -> CollectResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read a dataset from a file.
    pub fn read_from_file(path: &Path) -> CollectResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_from(std::io::BufReader::new(file))
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty() && self.products.is_empty() && self.testimonials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use chrono::NaiveDate;
    use serde_json::json;

    fn sample() -> Dataset {
        Dataset {
            reviews: vec![Review {
                date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
                content: "Très bon, would buy again".into(),
            }],
            products: vec![Product {
                title: "Box of Chocolate Candy".into(),
                price: "$9.99".into(),
            }],
            testimonials: vec![Testimonial {
                user: "jane_doe".into(),
                text: "Lovely shop".into(),
            }],
        }
    }

    #[test]
    fn test_json_shape() {
        let bytes = sample().to_json_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_json_eq!(
            value,
            json!({
                "reviews": [{"date": "2023-05-01", "content": "Très bon, would buy again"}],
                "products": [{"title": "Box of Chocolate Candy", "price": "$9.99"}],
                "testimonials": [{"user": "jane_doe", "text": "Lovely shop"}]
            })
        );
    }

    #[test]
    fn test_formatting_is_indented_and_unescaped() {
        let text = String::from_utf8(sample().to_json_bytes().unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"reviews\": [\n        {"));
        assert!(text.contains("Très bon"));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn test_file_round_trip_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/combined_data.json");

        sample().write_to_file(&path).unwrap();
        let back = Dataset::read_from_file(&path).unwrap();
        assert_eq!(back, sample());
        assert!(!back.is_empty());
        assert!(Dataset::default().is_empty());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let raw = r#"{"reviews": [{"date": "2023-13-40", "content": "x"}], "products": [], "testimonials": []}"#;
        assert!(Dataset::read_from(raw.as_bytes()).is_err());
    }
}
