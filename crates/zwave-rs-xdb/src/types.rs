// crates/zwave-rs-xdb/src/types.rs

//! Public, ergonomic data structures for the parsed product database.

use alloc::string::String;
use alloc::vec::Vec;
use zwave_rs::CommandClassId;
use zwave_rs::ZWaveNode;

// --- Product index ---

/// The manufacturer/product index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProductDatabase {
    pub manufacturers: Vec<Manufacturer>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manufacturer {
    /// `<Id>` (parsed from hex)
    pub id: u16,
    pub name: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Product {
    pub references: Vec<ProductReference>,
    pub model: String,
    pub labels: Vec<Label>,
    /// Path of the per-product file, relative to the database root.
    pub config_file: Option<String>,
}

/// A `(product type, product id)` pair as reported by MANUFACTURER_SPECIFIC.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProductReference {
    pub product_type: u16,
    pub product_id: u16,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Label {
    pub lang: Option<String>,
    pub text: String,
}

impl ProductDatabase {
    pub fn find_manufacturer(&self, manufacturer_id: u16) -> Option<&Manufacturer> {
        self.manufacturers.iter().find(|m| m.id == manufacturer_id)
    }

    /// Looks a product up by the three ids of a manufacturer specific report.
    pub fn find_product(
        &self,
        manufacturer_id: u16,
        product_type: u16,
        product_id: u16,
    ) -> Option<(&Manufacturer, &Product)> {
        let manufacturer = self.find_manufacturer(manufacturer_id)?;
        let reference = ProductReference {
            product_type,
            product_id,
        };
        manufacturer
            .products
            .iter()
            .find(|p| p.references.contains(&reference))
            .map(|p| (manufacturer, p))
    }

    /// The product of a node whose manufacturer information is known.
    pub fn find_for_node(&self, node: &ZWaveNode) -> Option<(&Manufacturer, &Product)> {
        let info = node.manufacturer()?;
        self.find_product(info.manufacturer_id, info.product_type, info.product_id)
    }
}

impl Product {
    /// Label in `lang`, falling back to the first label.
    pub fn label(&self, lang: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.lang.as_deref() == Some(lang))
            .or_else(|| self.labels.first())
            .map(|l| l.text.as_str())
    }
}

// --- Per-product file ---

/// Contents of a per-product file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProductDefinition {
    pub command_classes: Vec<CommandClassOverride>,
}

/// One `<Class>` entry. `get_supported` is `None` when the file leaves it unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandClassOverride {
    pub id: CommandClassId,
    pub get_supported: Option<bool>,
}
