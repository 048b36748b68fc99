// src/lib.rs

#![no_std]
#![doc = "Parses the Z-Wave XML product database."]
#![doc = ""]
#![doc = "This `no_std + alloc` library provides type-safe parsing of:"]
#![doc = "- `load_product_database_from_str`: the manufacturer/product index."]
#![doc = "- `load_product_from_str`: a per-product file listing command class overrides."]
#![doc = "- `apply_command_classes`: applying those overrides to a node's registry."]

extern crate alloc;

// --- Crate Modules ---

mod error;
mod model;
mod parser;
mod types;

// --- Public API Re-exports ---

pub use error::XdbError;
pub use parser::{apply_command_classes, load_product_database_from_str, load_product_from_str};
pub use types::{
    CommandClassOverride, Label, Manufacturer, Product, ProductDatabase, ProductDefinition,
    ProductReference,
};
