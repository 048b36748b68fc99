//! Internal `serde` data structures that map directly to the product database XML.
//!
//! These structs are annotated with `serde` attributes to facilitate parsing via
//! `quick-xml` and are not intended for direct public use.

#![allow(clippy::pedantic)] // XML naming conventions differ from Rust

use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;

/// The root element of the product index, `<Manufacturers>`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "Manufacturers")]
pub struct Manufacturers {
    #[serde(rename = "Manufacturer", default)]
    pub manufacturer: Vec<Manufacturer>,
}

#[derive(Debug, Deserialize)]
pub struct Manufacturer {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Product", default)]
    pub product: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct Product {
    /// A product can ship under several type/id pairs.
    #[serde(rename = "Reference", default)]
    pub reference: Vec<Reference>,
    #[serde(rename = "Model", default)]
    pub model: String,
    #[serde(rename = "Label", default)]
    pub label: Vec<Label>,
    #[serde(rename = "ConfigFile", default)]
    pub config_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Reference {
    #[serde(rename = "Type")]
    pub product_type: String,
    #[serde(rename = "Id")]
    pub id: String,
}

/// `<Label lang="en">Text</Label>`
#[derive(Debug, Deserialize)]
pub struct Label {
    #[serde(rename = "@lang", default)]
    pub lang: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// The root element of a per-product file, `<Product>`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "Product")]
pub struct ProductFile {
    #[serde(rename = "CommandClasses", default)]
    pub command_classes: Option<CommandClasses>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommandClasses {
    #[serde(rename = "Class", default)]
    pub class: Vec<Class>,
}

/// `<Class><id>0x20</id><isGetSupported>false</isGetSupported></Class>`
#[derive(Debug, Deserialize)]
pub struct Class {
    pub id: String,
    #[serde(rename = "isGetSupported", default)]
    pub is_get_supported: Option<bool>,
}
