//! Product Catalog
//!
//! Static lookup table of e-books and bundles. Loaded once at startup and
//! shared read-only across requests.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{Result, StorefrontError};

/// A single purchasable e-book
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    /// Display name, also used as the payment line-item name
    pub name: String,

    /// Price in major currency units
    pub price: Decimal,

    /// Deliverable file, relative to the download directory
    #[serde(default)]
    pub file: Option<String>,
}

/// A priced collection of products delivered as one file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    pub price: Decimal,

    /// Constituent product ids
    #[serde(default)]
    pub items: Vec<String>,

    #[serde(default)]
    pub file: Option<String>,
}

/// Raw catalog as written in a catalog file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub products: BTreeMap<String, Product>,

    #[serde(default)]
    pub bundles: BTreeMap<String, Bundle>,
}

/// Whether an entry is a single product or a bundle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Product,
    Bundle,
}

/// A validated catalog entry with its price in minor units
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub id: String,
    pub kind: EntryKind,
    pub name: String,
    pub price: Decimal,

    /// Price in minor units (pence)
    pub unit_amount: i64,

    pub file: Option<String>,

    /// Constituent product ids (bundles only)
    pub items: Vec<String>,
}

/// Immutable product and bundle lookup table
#[derive(Clone, Debug)]
pub struct Catalog {
    products: BTreeMap<String, CatalogEntry>,
    bundles: BTreeMap<String, CatalogEntry>,
}

/// Convert a major-unit price to minor units, rounding half away from zero
pub fn minor_units(price: Decimal) -> Option<i64> {
    if price.is_sign_negative() {
        return None;
    }
    price
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

fn build_entry(id: &str, kind: EntryKind, name: &str, price: Decimal, file: Option<&str>) -> Result<CatalogEntry> {
    let unit_amount = minor_units(price)
        .ok_or_else(|| StorefrontError::Catalog(format!("invalid price {price} for '{id}'")))?;

    Ok(CatalogEntry {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        price,
        unit_amount,
        file: file.map(str::to_string),
        items: Vec::new(),
    })
}

impl Catalog {
    /// Build and validate a catalog
    ///
    /// Rejects negative prices, bundles referencing unknown products, ids
    /// shared by a product and a bundle, and display names shared by two
    /// entries.
    pub fn new(definition: CatalogDefinition) -> Result<Self> {
        let mut products = BTreeMap::new();
        for (id, product) in &definition.products {
            let entry = build_entry(id, EntryKind::Product, &product.name, product.price, product.file.as_deref())?;
            products.insert(id.clone(), entry);
        }

        let mut bundles = BTreeMap::new();
        for (id, bundle) in &definition.bundles {
            if products.contains_key(id) {
                return Err(StorefrontError::Catalog(format!(
                    "id '{id}' is used by both a product and a bundle"
                )));
            }

            if let Some(missing) = bundle.items.iter().find(|item| !products.contains_key(*item)) {
                return Err(StorefrontError::Catalog(format!(
                    "bundle '{id}' references unknown product '{missing}'"
                )));
            }

            let mut entry = build_entry(id, EntryKind::Bundle, &bundle.name, bundle.price, bundle.file.as_deref())?;
            entry.items.clone_from(&bundle.items);
            bundles.insert(id.clone(), entry);
        }

        let mut names = HashSet::new();
        for entry in bundles.values().chain(products.values()) {
            if !names.insert(entry.name.as_str()) {
                return Err(StorefrontError::Catalog(format!(
                    "display name '{}' is used more than once",
                    entry.name
                )));
            }
        }

        tracing::debug!(
            products = products.len(),
            bundles = bundles.len(),
            "Catalog loaded"
        );

        Ok(Self { products, bundles })
    }

    /// Load a JSON catalog file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let definition: CatalogDefinition = serde_json::from_str(&raw)?;
        Self::new(definition)
    }

    /// The catalog shipped with the storefront
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_definition())
    }

    pub fn product(&self, id: &str) -> Option<&CatalogEntry> {
        self.products.get(id)
    }

    pub fn bundle(&self, id: &str) -> Option<&CatalogEntry> {
        self.bundles.get(id)
    }

    /// Look up by id, bundles first
    pub fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.bundle(id).or_else(|| self.product(id))
    }

    /// Look up by exact display name, bundles first
    pub fn entry_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.bundles
            .values()
            .find(|b| b.name == name)
            .or_else(|| self.products.values().find(|p| p.name == name))
    }

    pub fn products(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.products.values()
    }

    pub fn bundles(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.bundles.values()
    }
}

fn builtin_definition() -> CatalogDefinition {
    let product = |name: &str, price: Decimal, file: &str| Product {
        name: name.into(),
        price,
        file: Some(file.into()),
    };

    let products: BTreeMap<String, Product> = [
        // Sales series
        ("ebook-sdr", product("SDR Success Playbook", dec!(69), "sdr-success-playbook.pdf")),
        ("ebook-bdm", product("Business Development Playbook", dec!(69), "bdm-playbook.pdf")),
        ("ebook-am", product("Account Manager Playbook", dec!(69), "am-playbook.pdf")),
        // Sales training
        ("ebook-cold-calls", product("Mastering Cold Calls – Full Guide", dec!(29), "mastering-cold-calls.pdf")),
        // Coaching
        ("ebook-coaching", product("Unlocking Your Potential – Coaching Guide", dec!(29), "coaching-guide.pdf")),
        // Fitness
        ("ebook-fitness", product("Revitalise Your Life – Full Guide", dec!(29), "fitness-guide.pdf")),
        // Recruitment
        (
            "ebook-recruitment",
            product(
                "Building Your Personal Brand – Full Guide",
                dec!(29),
                "building-your-personal-brand-a-recruitment-advantage Full paid.pdf",
            ),
        ),
    ]
    .into_iter()
    .map(|(id, p)| (id.to_string(), p))
    .collect();

    let complete_items: Vec<String> = products.keys().cloned().collect();

    let bundles = [
        (
            "sales-series",
            Bundle {
                name: "Sales Excellence Series (3 Books)".into(),
                price: dec!(109),
                items: vec!["ebook-sdr".into(), "ebook-bdm".into(), "ebook-am".into()],
                file: Some("sales-excellence-series.zip".into()),
            },
        ),
        (
            "complete-bundle",
            Bundle {
                name: "Complete Resource Bundle (7 Books)".into(),
                price: dec!(171),
                items: complete_items,
                file: Some("complete-resource-bundle.zip".into()),
            },
        ),
    ]
    .into_iter()
    .map(|(id, b)| (id.to_string(), b))
    .collect();

    CatalogDefinition { products, bundles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.products().count(), 7);
        assert_eq!(catalog.bundles().count(), 2);

        let sdr = catalog.product("ebook-sdr").unwrap();
        assert_eq!(sdr.unit_amount, 6900);
        assert_eq!(sdr.file.as_deref(), Some("sdr-success-playbook.pdf"));

        let complete = catalog.bundle("complete-bundle").unwrap();
        assert_eq!(complete.items.len(), 7);
        assert_eq!(complete.unit_amount, 17100);
    }

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(minor_units(dec!(19.999)), Some(2000));
        assert_eq!(minor_units(dec!(0.005)), Some(1));
        assert_eq!(minor_units(dec!(29)), Some(2900));
        assert_eq!(minor_units(dec!(-1)), None);
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = Catalog::builtin().unwrap();

        let entry = catalog.entry_by_name("Business Development Playbook").unwrap();
        assert_eq!(entry.id, "ebook-bdm");
        assert_eq!(entry.kind, EntryKind::Product);

        let entry = catalog.entry_by_name("Sales Excellence Series (3 Books)").unwrap();
        assert_eq!(entry.kind, EntryKind::Bundle);

        assert!(catalog.entry_by_name("business development playbook").is_none());
    }

    #[test]
    fn test_bundle_with_unknown_product_rejected() {
        let mut definition = builtin_definition();
        definition
            .bundles
            .get_mut("sales-series")
            .unwrap()
            .items
            .push("ebook-missing".into());

        let err = Catalog::new(definition).unwrap_err();
        assert!(matches!(err, StorefrontError::Catalog(_)));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut definition = builtin_definition();
        definition.products.get_mut("ebook-am").unwrap().name = "SDR Success Playbook".into();

        assert!(Catalog::new(definition).is_err());
    }

    #[test]
    fn test_product_and_bundle_sharing_id_rejected() {
        let mut definition = builtin_definition();
        let bundle = definition.bundles.remove("sales-series").unwrap();
        definition.bundles.insert("ebook-sdr".into(), bundle);

        let err = Catalog::new(definition).unwrap_err();
        assert!(matches!(err, StorefrontError::Catalog(msg) if msg.contains("ebook-sdr")));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut definition = builtin_definition();
        definition.products.get_mut("ebook-am").unwrap().price = dec!(-5);

        assert!(Catalog::new(definition).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "products": {{
                    "guide": {{ "name": "Guide", "price": 12.5, "file": "guide.pdf" }}
                }},
                "bundles": {{
                    "all": {{ "name": "Everything", "price": "20", "items": ["guide"], "file": "all.zip" }}
                }}
            }}"#
        )
        .unwrap();

        let catalog = Catalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.product("guide").unwrap().unit_amount, 1250);
        assert_eq!(catalog.entry("all").unwrap().kind, EntryKind::Bundle);
    }
}
