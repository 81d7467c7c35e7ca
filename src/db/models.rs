//! Product record types and field validation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Fixed set of product categories accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Floor,
    Wall,
    Other,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 3] =
        [ProductCategory::Floor, ProductCategory::Wall, ProductCategory::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Floor => "floor",
            ProductCategory::Wall => "wall",
            ProductCategory::Other => "other",
        }
    }

    /// Parse the wire/database representation. Case-sensitive, matching the
    /// stored values exactly.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "floor" => Some(ProductCategory::Floor),
            "wall" => Some(ProductCategory::Wall),
            "other" => Some(ProductCategory::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product record as stored and served.
///
/// Wire field names are camelCase; `model_url` and `thumbnail_url` are
/// `/uploads/...` paths resolvable against the static file route.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: ProductCategory,
    pub model_url: String,
    pub thumbnail_url: String,
    pub created_at: DateTime<Utc>,
}

/// One or more field-level validation failures.
#[derive(Debug, Error)]
pub struct ValidationError {
    messages: Vec<String>,
}

impl ValidationError {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("; "))
    }
}

/// Client-supplied product metadata, not yet validated.
///
/// Validation runs before any file is committed to the upload store, so a
/// rejected request leaves nothing behind.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub category: Option<String>,
}

impl ProductDraft {
    /// Check required fields and enumeration membership.
    ///
    /// Returns the trimmed name and the parsed category on success, or all
    /// field failures at once.
    pub fn validate(&self) -> Result<(String, ProductCategory), ValidationError> {
        let mut messages = Vec::new();

        let name = match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => Some(n.to_string()),
            _ => {
                messages.push("Field 'name' is required.".to_string());
                None
            }
        };

        let category = match self.category.as_deref() {
            Some(raw) => match ProductCategory::parse(raw) {
                Some(c) => Some(c),
                None => {
                    messages.push(format!(
                        "Field 'category' must be one of: floor, wall, other (got '{}').",
                        raw
                    ));
                    None
                }
            },
            None => {
                messages.push("Field 'category' is required.".to_string());
                None
            }
        };

        match (name, category) {
            (Some(n), Some(c)) if messages.is_empty() => Ok((n, c)),
            _ => Err(ValidationError { messages }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: Option<&str>, category: Option<&str>) -> ProductDraft {
        ProductDraft {
            name: name.map(String::from),
            category: category.map(String::from),
        }
    }

    #[test]
    fn category_round_trips_through_str() {
        for cat in ProductCategory::ALL {
            assert_eq!(ProductCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(ProductCategory::parse("ceiling"), None);
        assert_eq!(ProductCategory::parse("Floor"), None);
    }

    #[test]
    fn valid_draft_passes() {
        let (name, category) = draft(Some("  Chair "), Some("floor")).validate().unwrap();
        assert_eq!(name, "Chair");
        assert_eq!(category, ProductCategory::Floor);
    }

    #[test]
    fn missing_name_rejected() {
        let err = draft(None, Some("wall")).validate().unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn blank_name_rejected() {
        assert!(draft(Some("   "), Some("wall")).validate().is_err());
    }

    #[test]
    fn bad_category_rejected() {
        let err = draft(Some("Chair"), Some("invalid")).validate().unwrap_err();
        assert!(err.to_string().contains("floor, wall, other"));
    }

    #[test]
    fn all_failures_reported_together() {
        let err = draft(None, None).validate().unwrap_err();
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn product_serializes_camel_case() {
        let product = Product {
            id: Uuid::nil(),
            name: "Chair".to_string(),
            category: ProductCategory::Floor,
            model_url: "/uploads/1-2.glb".to_string(),
            thumbnail_url: "/uploads/1-3.png".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["modelUrl"], "/uploads/1-2.glb");
        assert_eq!(json["thumbnailUrl"], "/uploads/1-3.png");
        assert_eq!(json["category"], "floor");
        assert!(json.get("createdAt").is_some());
    }
}
