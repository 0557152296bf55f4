//! Datatype tags and the tagged [`Value`] sum type.
//!
//! Every stored value carries an explicit [`DataType`].  Because [`Value`] is
//! an enum with one payload per variant, the payload can never disagree with
//! its tag and dropping a value always releases the right payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of datatypes a configuration entry may have.
///
/// The discriminant order is also the order of [`DataType::ALL`] and of the
/// codec table in [`crate::format::codec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Text, written as `L"..."`.
    String,
    /// `true` or `false`.
    Bool,
    /// 32-bit signed integer in decimal.
    Int,
    /// 64-bit float.
    Double,
    /// Four floats written as `(x,y,z,w)`.
    Vec4,
    /// RGBA colour written as four 0–255 numbers, stored as 0.0–1.0.
    Color,
    /// Path of a file, written as `"..."` and validated as a file name.
    Filename,
    /// Path of a directory, written as `"..."` and validated as a directory name.
    Directory,
}

impl DataType {
    /// All datatypes in table order.
    pub const ALL: [DataType; 8] = [
        DataType::String,
        DataType::Bool,
        DataType::Int,
        DataType::Double,
        DataType::Vec4,
        DataType::Color,
        DataType::Filename,
        DataType::Directory,
    ];

    /// Canonical name used in the on-disk grammar.
    pub fn name(self) -> &'static str {
        match self {
            DataType::String => "STRING",
            DataType::Bool => "BOOL",
            DataType::Int => "INT",
            DataType::Double => "DOUBLE",
            DataType::Vec4 => "VEC4",
            DataType::Color => "COLOR",
            DataType::Filename => "FILENAME",
            DataType::Directory => "DIRECTORY",
        }
    }

    /// Looks up a datatype by its canonical name.  The match is case-sensitive.
    pub fn from_name(name: &str) -> Option<DataType> {
        DataType::ALL.into_iter().find(|dt| dt.name() == name)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown datatype name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown datatype name: {0:?}")]
pub struct UnknownDataType(pub String);

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::from_name(s).ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

/// Four-component float vector used by `VEC4` and `COLOR` entries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl From<[f32; 4]> for Vec4 {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// A tagged configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i32),
    Double(f64),
    Vec4(Vec4),
    /// Components already normalised to 0.0–1.0.
    Color(Vec4),
    Filename(String),
    Directory(String),
}

impl Value {
    /// Returns the datatype tag of this value.
    pub fn datatype(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Double(_) => DataType::Double,
            Value::Vec4(_) => DataType::Vec4,
            Value::Color(_) => DataType::Color,
            Value::Filename(_) => DataType::Filename,
            Value::Directory(_) => DataType::Directory,
        }
    }
}

/// Rust payload types that can be stored in and retrieved from a
/// [`super::Config`].
///
/// One payload type may serve several datatypes: a `String` can be stored as
/// `STRING`, `FILENAME` or `DIRECTORY`, and a [`Vec4`] as `VEC4` or `COLOR`.
pub trait ConfigValue: Sized {
    /// Wraps `self` into a [`Value`] tagged `datatype`, or hands `self` back
    /// when this payload type cannot carry that datatype.
    fn into_value(self, datatype: DataType) -> Result<Value, Self>;

    /// Borrows the payload of `value` if it has this payload type.
    fn from_value(value: &Value) -> Option<&Self>;
}

impl ConfigValue for String {
    fn into_value(self, datatype: DataType) -> Result<Value, Self> {
        match datatype {
            DataType::String => Ok(Value::String(self)),
            DataType::Filename => Ok(Value::Filename(self)),
            DataType::Directory => Ok(Value::Directory(self)),
            _ => Err(self),
        }
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::String(s) | Value::Filename(s) | Value::Directory(s) => Some(s),
            _ => None,
        }
    }
}

impl ConfigValue for bool {
    fn into_value(self, datatype: DataType) -> Result<Value, Self> {
        match datatype {
            DataType::Bool => Ok(Value::Bool(self)),
            _ => Err(self),
        }
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl ConfigValue for i32 {
    fn into_value(self, datatype: DataType) -> Result<Value, Self> {
        match datatype {
            DataType::Int => Ok(Value::Int(self)),
            _ => Err(self),
        }
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }
}

impl ConfigValue for f64 {
    fn into_value(self, datatype: DataType) -> Result<Value, Self> {
        match datatype {
            DataType::Double => Ok(Value::Double(self)),
            _ => Err(self),
        }
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Double(d) => Some(d),
            _ => None,
        }
    }
}

impl ConfigValue for Vec4 {
    fn into_value(self, datatype: DataType) -> Result<Value, Self> {
        match datatype {
            DataType::Vec4 => Ok(Value::Vec4(self)),
            DataType::Color => Ok(Value::Color(self)),
            _ => Err(self),
        }
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Vec4(v) | Value::Color(v) => Some(v),
            _ => None,
        }
    }
}
