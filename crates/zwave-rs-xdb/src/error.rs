// crates/zwave-rs-xdb/src/error.rs

use alloc::fmt;
use core::num::ParseIntError;
use quick_xml::errors::serialize::DeError;
use zwave_rs::ZWaveError;

/// Errors that can occur while loading the product database.
#[derive(Debug)]
pub enum XdbError {
    /// An error from the underlying `quick-xml` deserializer.
    XmlParsing(DeError),

    /// A hex field (manufacturer id, product type, class id) had an invalid format.
    InvalidHexValue { field: &'static str },

    /// A required XML element was missing or empty.
    MissingElement { element: &'static str },

    /// The node refused the registry update.
    Node(ZWaveError),
}

impl From<DeError> for XdbError {
    fn from(e: DeError) -> Self {
        XdbError::XmlParsing(e)
    }
}

impl From<ZWaveError> for XdbError {
    fn from(e: ZWaveError) -> Self {
        XdbError::Node(e)
    }
}

/// Converts `ParseIntError` (from reading a hex id) into a user-friendly error.
impl From<ParseIntError> for XdbError {
    fn from(_: ParseIntError) -> Self {
        XdbError::InvalidHexValue { field: "id" }
    }
}

impl fmt::Display for XdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XdbError::XmlParsing(e) => write!(f, "XML parsing error: {}", e),
            XdbError::InvalidHexValue { field } => {
                write!(f, "Invalid hex value for field: {}", field)
            }
            XdbError::MissingElement { element } => {
                write!(f, "Missing required XML element: {}", element)
            }
            XdbError::Node(e) => write!(f, "Registry update rejected: {}", e),
        }
    }
}
