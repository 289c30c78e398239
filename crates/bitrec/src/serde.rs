//! JSON-deserializable record layout description.
//!
//! These types describe the *shape* of a record: the ordered field sequence
//! that makes up its wire schema. They are intended to be constructed from
//! JSON (for example a layout file shipped with your application) and then
//! converted into a [`FieldLink`].
//!
//! Converting validates what the wire cannot carry: array lengths above one
//! count byte and string initializers above the 6-bit length field.

use serde::{Deserialize, Serialize};

use crate::errors::LayoutError;
use crate::field::{Field, Width};
use crate::link::FieldLink;
use crate::wire;

/// Storage width of a number or array element.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub enum WidthDef {
    W8,
    W16,
    W32,
    W64,
}

impl From<WidthDef> for Width {
    fn from(value: WidthDef) -> Self {
        match value {
            WidthDef::W8 => Width::W8,
            WidthDef::W16 => Width::W16,
            WidthDef::W32 => Width::W32,
            WidthDef::W64 => Width::W64,
        }
    }
}

/// Description of a single field in registration order.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum FieldDef {
    /// Single boolean.
    Bool {
        #[serde(default)]
        init: bool,
    },
    /// Schema generation boundary.
    Version,
    /// Byte string of up to 63 bytes.
    Str {
        #[serde(default)]
        init: String,
    },
    /// Unsigned fixed-width number.
    Uint {
        width: WidthDef,
        #[serde(default)]
        init: u64,
    },
    /// Signed fixed-width number.
    Int {
        width: WidthDef,
        #[serde(default)]
        init: i64,
    },
    /// Unsigned number used as a bit set.
    Bits {
        width: WidthDef,
        #[serde(default)]
        init: u64,
    },
    /// Fixed-count array of unsigned numbers.
    UintArray {
        width: WidthDef,
        len: usize,
        #[serde(default)]
        init: u64,
    },
    /// Fixed-count array of signed numbers.
    IntArray {
        width: WidthDef,
        len: usize,
        #[serde(default)]
        init: i64,
    },
}

/// Top-level layout definition: the ordered list of fields.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RecordDef {
    pub fields: Vec<FieldDef>,
}

impl TryFrom<FieldDef> for Field {
    type Error = LayoutError;

    fn try_from(value: FieldDef) -> Result<Self, Self::Error> {
        match value {
            FieldDef::Bool { init } => Ok(Field::bool(init)),
            FieldDef::Version => Ok(Field::version()),
            FieldDef::Str { init } => {
                if init.len() > wire::MAX_STRING_LEN {
                    return Err(LayoutError::StringTooLong);
                }
                Ok(Field::string(init))
            }
            FieldDef::Uint { width, init } | FieldDef::Bits { width, init } => {
                Ok(match Width::from(width) {
                    Width::W8 => Field::u8(init as u8),
                    Width::W16 => Field::u16(init as u16),
                    Width::W32 => Field::u32(init as u32),
                    Width::W64 => Field::u64(init),
                })
            }
            FieldDef::Int { width, init } => Ok(match Width::from(width) {
                Width::W8 => Field::i8(init as i8),
                Width::W16 => Field::i16(init as i16),
                Width::W32 => Field::i32(init as i32),
                Width::W64 => Field::i64(init),
            }),
            FieldDef::UintArray { width, len, init } => {
                check_array_len(len)?;
                Ok(match Width::from(width) {
                    Width::W8 => Field::array_u8(init as u8, len),
                    Width::W16 => Field::array_u16(init as u16, len),
                    Width::W32 => Field::array_u32(init as u32, len),
                    Width::W64 => Field::array_u64(init, len),
                })
            }
            FieldDef::IntArray { width, len, init } => {
                check_array_len(len)?;
                Ok(match Width::from(width) {
                    Width::W8 => Field::array_i8(init as i8, len),
                    Width::W16 => Field::array_i16(init as i16, len),
                    Width::W32 => Field::array_i32(init as i32, len),
                    Width::W64 => Field::array_i64(init, len),
                })
            }
        }
    }
}

fn check_array_len(len: usize) -> Result<(), LayoutError> {
    if len == 0 {
        return Err(LayoutError::EmptyArray);
    }
    if len > u8::MAX as usize {
        return Err(LayoutError::ArrayTooLong);
    }
    Ok(())
}

impl TryFrom<RecordDef> for FieldLink {
    type Error = LayoutError;

    fn try_from(value: RecordDef) -> Result<Self, Self::Error> {
        let mut link = FieldLink::new();
        for def in value.fields {
            link.add(def.try_into()?);
        }
        Ok(link)
    }
}
