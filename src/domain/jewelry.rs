//! Jewelry catalog entity, its closed enumerations and write payloads.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Declares a closed string enumeration with `as_str`, `Display` and a
/// `FromStr` that rejects unknown values with a validation error.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(AppError::validation(format!("Invalid {}: {}", $label, s))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Product category
    Category("category") {
        Rings => "rings",
        Necklaces => "necklaces",
        Earrings => "earrings",
        Bracelets => "bracelets",
        Anklets => "anklets",
        Pendants => "pendants",
        Bangles => "bangles",
        Chains => "chains",
        Sets => "sets",
        Watches => "watches",
        Other => "other",
    }
}

string_enum! {
    /// Style or stone sub-classification
    Subcategory("subcategory") {
        Gold => "gold",
        Silver => "silver",
        Platinum => "platinum",
        Diamond => "diamond",
        Pearl => "pearl",
        Gemstone => "gemstone",
        Traditional => "traditional",
        Modern => "modern",
        Vintage => "vintage",
        Bridal => "bridal",
        Casual => "casual",
        Formal => "formal",
    }
}

string_enum! {
    Gender("gender") {
        Men => "men",
        Women => "women",
        Unisex => "unisex",
    }
}

string_enum! {
    Material("material") {
        Gold => "gold",
        Silver => "silver",
        Platinum => "platinum",
        RoseGold => "rose_gold",
        WhiteGold => "white_gold",
        Mixed => "mixed",
    }
}

string_enum! {
    #[derive(Default)]
    WeightUnit("weight unit") {
        #[default]
        Grams => "grams",
        Carats => "carats",
        Ounces => "ounces",
    }
}

string_enum! {
    #[derive(Default)]
    DimensionUnit("dimension unit") {
        #[default]
        Mm => "mm",
        Cm => "cm",
        Inches => "inches",
    }
}

/// Hosted image reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
    pub public_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(default)]
    pub unit: DimensionUnit,
}

impl Dimensions {
    fn check(&self) -> AppResult<()> {
        for (label, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if let Some(v) = value {
                non_negative(label, v)?;
            }
        }
        Ok(())
    }
}

/// Jewelry domain entity
#[derive(Debug, Clone, PartialEq)]
pub struct Jewelry {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub gender: Gender,
    pub material: Material,
    pub images: Vec<ImageRef>,
    pub price: f64,
    pub weight: Option<f64>,
    pub weight_unit: WeightUnit,
    pub dimensions: Option<Dimensions>,
    pub in_stock: bool,
    pub featured: bool,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Jewelry {
    /// Flip the active flag and return the new value.
    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.updated_at = Utc::now();
        self.is_active
    }
}

/// A catalog item together with its creator's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct JewelryWithOwner {
    pub item: Jewelry,
    pub owner_name: Option<String>,
}

/// Creator reference embedded in item responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBy {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Jewelry as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JewelryResponse {
    pub id: Uuid,
    #[schema(example = "Solitaire Diamond Ring")]
    pub name: String,
    pub description: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub gender: Gender,
    pub material: Material,
    pub images: Vec<ImageRef>,
    #[schema(example = 1299.99)]
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub weight_unit: WeightUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    pub in_stock: bool,
    pub featured: bool,
    pub tags: Vec<String>,
    pub created_by: CreatedBy,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JewelryWithOwner> for JewelryResponse {
    fn from(row: JewelryWithOwner) -> Self {
        let j = row.item;
        Self {
            id: j.id,
            name: j.name,
            description: j.description,
            category: j.category,
            subcategory: j.subcategory,
            gender: j.gender,
            material: j.material,
            images: j.images,
            price: j.price,
            weight: j.weight,
            weight_unit: j.weight_unit,
            dimensions: j.dimensions,
            in_stock: j.in_stock,
            featured: j.featured,
            tags: j.tags,
            created_by: CreatedBy {
                id: j.created_by,
                display_name: row.owner_name,
            },
            is_active: j.is_active,
            created_at: j.created_at,
            updated_at: j.updated_at,
        }
    }
}

impl From<Jewelry> for JewelryResponse {
    fn from(item: Jewelry) -> Self {
        JewelryWithOwner {
            item,
            owner_name: None,
        }
        .into()
    }
}

/// Create payload for a catalog item
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewJewelry {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub gender: Gender,
    pub material: Material,
    #[validate(range(min = 0.0, message = "Price must be a positive number"))]
    pub price: f64,
    #[validate(range(min = 0.0, message = "Weight must be a positive number"))]
    pub weight: Option<f64>,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

fn default_true() -> bool {
    true
}

impl NewJewelry {
    /// Check domain rules and normalize text fields.
    pub fn normalized(mut self) -> AppResult<Self> {
        self.name = required_text("Name", &self.name)?;
        self.description = required_text("Description", &self.description)?;
        non_negative("price", self.price)?;
        if let Some(weight) = self.weight {
            non_negative("weight", weight)?;
        }
        if let Some(dimensions) = &self.dimensions {
            dimensions.check()?;
        }
        self.tags = clean_tags(self.tags);
        Ok(self)
    }

    /// Build the catalog entity owned by `created_by`.
    pub fn into_jewelry(self, created_by: Uuid) -> Jewelry {
        let now = Utc::now();
        Jewelry {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            category: self.category,
            subcategory: self.subcategory,
            gender: self.gender,
            material: self.material,
            images: self.images,
            price: self.price,
            weight: self.weight,
            weight_unit: self.weight_unit,
            dimensions: self.dimensions,
            in_stock: self.in_stock,
            featured: self.featured,
            tags: self.tags,
            created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update payload; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JewelryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub subcategory: Option<Subcategory>,
    pub gender: Option<Gender>,
    pub material: Option<Material>,
    #[validate(range(min = 0.0, message = "Price must be a positive number"))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, message = "Weight must be a positive number"))]
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub dimensions: Option<Dimensions>,
    pub images: Option<Vec<ImageRef>>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub is_active: Option<bool>,
}

impl JewelryUpdate {
    /// Validate and merge the present fields into `item`.
    pub fn apply(self, item: &mut Jewelry) -> AppResult<()> {
        if let Some(name) = self.name {
            item.name = required_text("Name", &name)?;
        }
        if let Some(description) = self.description {
            item.description = required_text("Description", &description)?;
        }
        if let Some(price) = self.price {
            non_negative("price", price)?;
            item.price = price;
        }
        if let Some(weight) = self.weight {
            non_negative("weight", weight)?;
            item.weight = Some(weight);
        }
        if let Some(dimensions) = self.dimensions {
            dimensions.check()?;
            item.dimensions = Some(dimensions);
        }
        if let Some(v) = self.category {
            item.category = v;
        }
        if let Some(v) = self.subcategory {
            item.subcategory = v;
        }
        if let Some(v) = self.gender {
            item.gender = v;
        }
        if let Some(v) = self.material {
            item.material = v;
        }
        if let Some(v) = self.weight_unit {
            item.weight_unit = v;
        }
        if let Some(images) = self.images {
            item.images = images;
        }
        if let Some(tags) = self.tags {
            item.tags = clean_tags(tags);
        }
        if let Some(v) = self.featured {
            item.featured = v;
        }
        if let Some(v) = self.in_stock {
            item.in_stock = v;
        }
        if let Some(v) = self.is_active {
            item.is_active = v;
        }
        item.updated_at = Utc::now();
        Ok(())
    }
}

fn required_text(label: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", label)));
    }
    Ok(trimmed.to_string())
}

fn non_negative(label: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{} must be a non-negative number",
            label
        )));
    }
    Ok(())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn item(owner: Uuid) -> Jewelry {
        let now = Utc::now();
        Jewelry {
            id: Uuid::new_v4(),
            name: "Classic Band".to_string(),
            description: "A plain gold band".to_string(),
            category: Category::Rings,
            subcategory: Subcategory::Gold,
            gender: Gender::Unisex,
            material: Material::Gold,
            images: Vec::new(),
            price: 250.0,
            weight: Some(4.2),
            weight_unit: WeightUnit::Grams,
            dimensions: None,
            in_stock: true,
            featured: false,
            tags: vec!["band".to_string()],
            created_by: owner,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NewJewelry {
        serde_json::from_value(serde_json::json!({
            "name": "  Pearl Drop  ",
            "description": "Freshwater pearl earrings",
            "category": "earrings",
            "subcategory": "pearl",
            "gender": "women",
            "material": "white_gold",
            "price": 180.5,
            "tags": [" pearl ", "", "drop"]
        }))
        .unwrap()
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(Material::RoseGold.as_str(), "rose_gold");
        assert_eq!(
            serde_json::to_string(&Material::WhiteGold).unwrap(),
            "\"white_gold\""
        );
        assert_eq!("necklaces".parse::<Category>().unwrap(), Category::Necklaces);
        assert_eq!(Category::ALL.len(), 11);
        assert_eq!(Subcategory::ALL.len(), 12);
    }

    #[test]
    fn test_units_default_when_omitted() {
        let dims: Dimensions = serde_json::from_value(serde_json::json!({"length": 12.0})).unwrap();
        assert_eq!(dims.unit, DimensionUnit::Mm);
        assert_eq!(WeightUnit::default(), WeightUnit::Grams);
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let err = "tiaras".parse::<Category>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid category: tiaras");

        let bad = serde_json::from_value::<NewJewelry>(serde_json::json!({
            "name": "x", "description": "y", "category": "tiaras",
            "subcategory": "gold", "gender": "men", "material": "gold", "price": 1.0
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_new_jewelry_defaults_and_normalization() {
        let p = payload().normalized().unwrap();
        assert_eq!(p.name, "Pearl Drop");
        assert_eq!(p.weight_unit, WeightUnit::Grams);
        assert!(p.in_stock);
        assert!(!p.featured);
        assert_eq!(p.tags, vec!["pearl".to_string(), "drop".to_string()]);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut p = payload();
        p.price = -1.0;
        assert!(p.validate().is_err());
        assert!(p.normalized().is_err());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut p = payload();
        p.name = "   ".to_string();
        assert!(p.normalized().is_err());
    }

    #[test]
    fn test_dimensions_default_unit() {
        let d: Dimensions = serde_json::from_str(r#"{"length": 20.0}"#).unwrap();
        assert_eq!(d.unit, DimensionUnit::Mm);
        assert!(d.check().is_ok());
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut j = fixtures::item(Uuid::new_v4());
        let update = JewelryUpdate {
            price: Some(300.0),
            featured: Some(true),
            ..Default::default()
        };
        update.apply(&mut j).unwrap();
        assert_eq!(j.price, 300.0);
        assert!(j.featured);
        assert_eq!(j.name, "Classic Band");
    }

    #[test]
    fn test_update_rejects_negative_weight() {
        let mut j = fixtures::item(Uuid::new_v4());
        let update = JewelryUpdate {
            weight: Some(-2.0),
            ..Default::default()
        };
        assert!(update.apply(&mut j).is_err());
    }

    #[test]
    fn test_toggle_active_flips_stored_value() {
        let mut j = fixtures::item(Uuid::new_v4());
        assert!(!j.toggle_active());
        assert!(j.toggle_active());
    }

    #[test]
    fn test_response_embeds_owner() {
        let owner = Uuid::new_v4();
        let resp = JewelryResponse::from(JewelryWithOwner {
            item: fixtures::item(owner),
            owner_name: Some("Shop Admin".to_string()),
        });
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["createdBy"]["displayName"], "Shop Admin");
        assert_eq!(json["weightUnit"], "grams");
        assert_eq!(json["inStock"], true);
    }
}
