// src/parser.rs

use crate::error::XdbError;
use crate::model;
use crate::types::{
    CommandClassOverride, Label, Manufacturer, Product, ProductDatabase, ProductDefinition,
    ProductReference,
};
use alloc::vec::Vec;
use core::num::ParseIntError;
use log::{debug, trace};
use zwave_rs::{CommandClassId, ZWaveNode};

/// Parses the product index (`<Manufacturers>`).
///
/// # Errors
/// Returns an `XdbError` if the XML is malformed or an id is not valid hex.
pub fn load_product_database_from_str(xml_content: &str) -> Result<ProductDatabase, XdbError> {
    let raw: model::Manufacturers = quick_xml::de::from_str(xml_content)?;

    let manufacturers = raw
        .manufacturer
        .iter()
        .map(parse_manufacturer)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Loaded product database: {} manufacturer(s), {} product(s)",
        manufacturers.len(),
        manufacturers.iter().map(|m| m.products.len()).sum::<usize>()
    );
    Ok(ProductDatabase { manufacturers })
}

/// Parses a per-product file (`<Product>`) and extracts its command class list.
///
/// A file without `<CommandClasses>` yields an empty definition.
pub fn load_product_from_str(xml_content: &str) -> Result<ProductDefinition, XdbError> {
    let raw: model::ProductFile = quick_xml::de::from_str(xml_content)?;

    let command_classes = raw
        .command_classes
        .map(|c| c.class)
        .unwrap_or_default()
        .iter()
        .map(|class| -> Result<CommandClassOverride, XdbError> {
            Ok(CommandClassOverride {
                id: CommandClassId(parse_hex_u8(&class.id).map_err(|_| {
                    XdbError::InvalidHexValue {
                        field: "Class/id",
                    }
                })?),
                get_supported: class.is_get_supported,
            })
        })
        .collect::<Result<Vec<_>, XdbError>>()?;

    Ok(ProductDefinition { command_classes })
}

/// Applies the product file's command classes to a node's registry.
///
/// Classes are added when missing and `isGetSupported` overrides are applied.
/// Returns the number of entries applied. Fails with `XdbError::Node` once the
/// node is past the interview stages that accept capability changes.
pub fn apply_command_classes(
    definition: &ProductDefinition,
    node: &mut ZWaveNode,
) -> Result<usize, XdbError> {
    for entry in &definition.command_classes {
        if node.add_command_class(entry.id)? {
            trace!("NODE {}: {} added from product database", node.id(), entry.id);
        }
        if let Some(supported) = entry.get_supported {
            node.set_get_supported(entry.id, supported)?;
            debug!(
                "NODE {}: {} get supported = {}",
                node.id(),
                entry.id,
                supported
            );
        }
    }
    Ok(definition.command_classes.len())
}

fn parse_manufacturer(raw: &model::Manufacturer) -> Result<Manufacturer, XdbError> {
    let id = parse_hex_u16(&raw.id).map_err(|_| XdbError::InvalidHexValue {
        field: "Manufacturer/Id",
    })?;
    let products = raw
        .product
        .iter()
        .map(parse_product)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Manufacturer {
        id,
        name: raw.name.trim().into(),
        products,
    })
}

fn parse_product(raw: &model::Product) -> Result<Product, XdbError> {
    if raw.reference.is_empty() {
        return Err(XdbError::MissingElement {
            element: "Product/Reference",
        });
    }
    let references = raw
        .reference
        .iter()
        .map(|r| -> Result<ProductReference, XdbError> {
            Ok(ProductReference {
                product_type: parse_hex_u16(&r.product_type)?,
                product_id: parse_hex_u16(&r.id)?,
            })
        })
        .collect::<Result<Vec<_>, XdbError>>()?;

    Ok(Product {
        references,
        model: raw.model.trim().into(),
        labels: raw
            .label
            .iter()
            .map(|l| Label {
                lang: l.lang.clone(),
                text: l.value.trim().into(),
            })
            .collect(),
        config_file: raw.config_file.as_ref().map(|f| f.trim().into()),
    })
}

/// Parses a "0x..." or "..." hex string into a u16.
pub fn parse_hex_u16(s: &str) -> Result<u16, ParseIntError> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    u16::from_str_radix(trimmed, 16)
}

/// Parses a "0x..." or "..." hex string into a u8.
pub fn parse_hex_u8(s: &str) -> Result<u8, ParseIntError> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    u8::from_str_radix(trimmed, 16)
}
