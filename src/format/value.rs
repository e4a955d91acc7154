//! `FieldText` and the type-name driven formatter.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::FormatError;
use crate::catalog::{AttrLength, Attribute, TypeCatalog};
use crate::tuple::Datum;

/// Textual form of one attribute value.
///
/// Deserialization tries the variants in order, so JSON `5` is an `Int`
/// and `5.0` a `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldText {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes { hex: String },
}

impl FieldText {
    /// Hex form of raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        FieldText::Bytes {
            hex: hex::encode(bytes),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FieldText::Null => "null",
            FieldText::Bool(_) => "boolean",
            FieldText::Int(_) => "integer",
            FieldText::Float(_) => "float",
            FieldText::Text(_) => "text",
            FieldText::Bytes { .. } => "hex",
        }
    }
}

impl fmt::Display for FieldText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldText::Null => f.write_str("NULL"),
            FieldText::Bool(b) => write!(f, "{b}"),
            FieldText::Int(n) => write!(f, "{n}"),
            FieldText::Float(x) => write!(f, "{x}"),
            FieldText::Text(s) => write!(f, "{s:?}"),
            FieldText::Bytes { hex } => write!(f, "\\x{hex}"),
        }
    }
}

/// How a type's payload is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendering {
    Int { width: usize, signed: bool },
    Float { width: usize },
    Bool,
    Text,
    /// Fixed-width `name`: text followed by zero padding.
    PaddedText { width: usize },
    Bytes,
}

fn rendering(attr: &Attribute) -> Rendering {
    let type_name = attr.type_name.trim().to_ascii_lowercase();
    match (type_name.as_str(), attr.length) {
        ("int2" | "smallint" | "smallserial" | "serial2", AttrLength::Fixed(2)) => {
            Rendering::Int {
                width: 2,
                signed: true,
            }
        }
        ("int4" | "int" | "integer" | "serial" | "serial4" | "date", AttrLength::Fixed(4)) => {
            Rendering::Int {
                width: 4,
                signed: true,
            }
        }
        (
            "oid" | "xid" | "cid" | "regclass" | "regproc" | "regprocedure" | "regoper"
            | "regoperator" | "regtype" | "regconfig" | "regdictionary" | "regnamespace"
            | "regrole" | "regcollation",
            AttrLength::Fixed(4),
        ) => Rendering::Int {
            width: 4,
            signed: false,
        },
        (
            "int8" | "bigint" | "bigserial" | "serial8" | "time" | "timestamp" | "timestamptz"
            | "money",
            AttrLength::Fixed(8),
        ) => Rendering::Int {
            width: 8,
            signed: true,
        },
        ("float4" | "real", AttrLength::Fixed(4)) => Rendering::Float { width: 4 },
        ("float8" | "double precision", AttrLength::Fixed(8)) => Rendering::Float { width: 8 },
        ("bool" | "boolean", AttrLength::Fixed(1)) => Rendering::Bool,
        ("name", AttrLength::Fixed(width)) => Rendering::PaddedText { width },
        (
            "text" | "varchar" | "character varying" | "bpchar" | "character" | "json" | "xml"
            | "citext" | "cstring" | "name",
            AttrLength::Varlena | AttrLength::CString,
        ) => Rendering::Text,
        _ => Rendering::Bytes,
    }
}

fn read_int(bytes: &[u8], signed: bool) -> Option<i64> {
    match (bytes.len(), signed) {
        (2, _) => Some(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        (4, true) => Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64),
        (4, false) => Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64),
        (8, _) => {
            let mut word = [0u8; 8];
            word.copy_from_slice(bytes);
            Some(i64::from_le_bytes(word))
        }
        _ => None,
    }
}

fn read_float(bytes: &[u8]) -> Option<f64> {
    let value = match bytes.len() {
        4 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        8 => {
            let mut word = [0u8; 8];
            word.copy_from_slice(bytes);
            f64::from_le_bytes(word)
        }
        _ => return None,
    };
    // JSON has no NaN or infinity; every finite value prints and parses back exactly.
    value.is_finite().then_some(value)
}

fn read_padded_text(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0)?;
    if bytes[end..].iter().any(|&b| b != 0) {
        return None;
    }
    String::from_utf8(bytes[..end].to_vec()).ok()
}

/// Converts between payload bytes and [`FieldText`] per attribute type.
pub struct ValueFormatter;

impl ValueFormatter {
    /// Renders a decoded value.
    ///
    /// Values that do not fit their type's textual form (wrong width,
    /// invalid UTF-8, a bool byte other than 0/1, non-finite floats) fall
    /// back to `Bytes`, so formatting never fails.
    pub fn format(attr: &Attribute, datum: &Datum) -> FieldText {
        let Some(bytes) = datum.as_bytes() else {
            return FieldText::Null;
        };

        let rendered = match rendering(attr) {
            Rendering::Int { width, signed } if bytes.len() == width => {
                read_int(bytes, signed).map(FieldText::Int)
            }
            Rendering::Float { width } if bytes.len() == width => {
                read_float(bytes).map(FieldText::Float)
            }
            Rendering::Bool => match bytes {
                [0] => Some(FieldText::Bool(false)),
                [1] => Some(FieldText::Bool(true)),
                _ => None,
            },
            Rendering::Text => String::from_utf8(bytes.to_vec()).ok().map(FieldText::Text),
            Rendering::PaddedText { width } if bytes.len() == width => {
                read_padded_text(bytes).map(FieldText::Text)
            }
            _ => None,
        };
        rendered.unwrap_or_else(|| FieldText::from_bytes(bytes))
    }

    /// Parses a textual value into payload bytes.
    ///
    /// Accepts the variant `format` produces for the type, `Bytes` for any
    /// type, and a few lenient spellings (integers for floats, numeric or
    /// boolean strings).
    pub fn parse(attr: &Attribute, field: &FieldText) -> Result<Datum, FormatError> {
        let bytes = match (rendering(attr), field) {
            (_, FieldText::Null) => return Ok(Datum::Null),
            (_, FieldText::Bytes { hex }) => {
                let digits = hex.strip_prefix("\\x").unwrap_or(hex);
                hex::decode(digits).map_err(|source| FormatError::InvalidHex {
                    attribute: attr.name.clone(),
                    source,
                })?
            }
            (Rendering::Int { width, signed }, FieldText::Int(value)) => {
                encode_int(attr, *value, width, signed)?
            }
            (Rendering::Int { width, signed }, FieldText::Text(text)) => {
                let value = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| mismatch(attr, field))?;
                encode_int(attr, value, width, signed)?
            }
            (Rendering::Float { width }, FieldText::Float(value)) => {
                encode_float(attr, *value, width)?
            }
            (Rendering::Float { width }, FieldText::Int(value)) => {
                encode_float(attr, *value as f64, width)?
            }
            (Rendering::Float { width }, FieldText::Text(text)) => {
                let value = text
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| mismatch(attr, field))?;
                encode_float(attr, value, width)?
            }
            (Rendering::Bool, FieldText::Bool(value)) => vec![*value as u8],
            (Rendering::Bool, FieldText::Text(text)) => {
                match text.trim().to_ascii_lowercase().as_str() {
                    "t" | "true" | "yes" | "on" | "1" => vec![1],
                    "f" | "false" | "no" | "off" | "0" => vec![0],
                    _ => return Err(mismatch(attr, field)),
                }
            }
            (Rendering::Text | Rendering::Bytes, FieldText::Text(text))
                if !attr.length.is_fixed() =>
            {
                text.as_bytes().to_vec()
            }
            (Rendering::PaddedText { width }, FieldText::Text(text)) => {
                if text.len() >= width || text.contains('\0') {
                    return Err(FormatError::OutOfRange {
                        attribute: attr.name.clone(),
                        type_name: attr.type_name.clone(),
                        value: format!("{text:?}"),
                    });
                }
                let mut bytes = text.as_bytes().to_vec();
                bytes.resize(width, 0);
                bytes
            }
            _ => return Err(mismatch(attr, field)),
        };
        Ok(Datum::Value(bytes))
    }

    /// Formats one value per catalog attribute.
    pub fn format_all<'a>(
        catalog: &TypeCatalog,
        values: impl IntoIterator<Item = &'a Datum>,
    ) -> Vec<FieldText> {
        catalog
            .iter()
            .zip(values)
            .map(|(attr, datum)| Self::format(attr, datum))
            .collect()
    }

    /// Parses one value per catalog attribute.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::FieldCount` if `fields` does not have exactly
    /// one entry per attribute.
    pub fn parse_all(catalog: &TypeCatalog, fields: &[FieldText]) -> Result<Vec<Datum>, FormatError> {
        if fields.len() != catalog.len() {
            return Err(FormatError::FieldCount {
                expected: catalog.len(),
                actual: fields.len(),
            });
        }
        catalog
            .iter()
            .zip(fields)
            .map(|(attr, field)| Self::parse(attr, field))
            .collect()
    }
}

fn mismatch(attr: &Attribute, field: &FieldText) -> FormatError {
    FormatError::TypeMismatch {
        attribute: attr.name.clone(),
        type_name: attr.type_name.clone(),
        found: field.kind(),
    }
}

fn out_of_range(attr: &Attribute, value: impl fmt::Display) -> FormatError {
    FormatError::OutOfRange {
        attribute: attr.name.clone(),
        type_name: attr.type_name.clone(),
        value: value.to_string(),
    }
}

fn encode_int(attr: &Attribute, value: i64, width: usize, signed: bool) -> Result<Vec<u8>, FormatError> {
    let bytes = match (width, signed) {
        (2, _) => i16::try_from(value)
            .map_err(|_| out_of_range(attr, value))?
            .to_le_bytes()
            .to_vec(),
        (4, true) => i32::try_from(value)
            .map_err(|_| out_of_range(attr, value))?
            .to_le_bytes()
            .to_vec(),
        (4, false) => u32::try_from(value)
            .map_err(|_| out_of_range(attr, value))?
            .to_le_bytes()
            .to_vec(),
        _ => value.to_le_bytes().to_vec(),
    };
    Ok(bytes)
}

fn encode_float(attr: &Attribute, value: f64, width: usize) -> Result<Vec<u8>, FormatError> {
    if !value.is_finite() {
        return Err(out_of_range(attr, value));
    }
    if width == 4 {
        let narrow = value as f32;
        if !narrow.is_finite() {
            return Err(out_of_range(attr, value));
        }
        return Ok(narrow.to_le_bytes().to_vec());
    }
    Ok(value.to_le_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Alignment;

    fn attr(type_name: &str, length: AttrLength, align: Alignment) -> Attribute {
        Attribute::new("col", type_name, length, align)
    }

    fn int4() -> Attribute {
        attr("int4", AttrLength::Fixed(4), Alignment::Int)
    }

    fn text() -> Attribute {
        attr("text", AttrLength::Varlena, Alignment::Int)
    }

    fn value(bytes: &[u8]) -> Datum {
        Datum::from(bytes)
    }

    #[test]
    fn test_format_null() {
        assert_eq!(ValueFormatter::format(&int4(), &Datum::Null), FieldText::Null);
    }

    #[test]
    fn test_format_integers() {
        let int2 = attr("int2", AttrLength::Fixed(2), Alignment::Short);
        let int8 = attr("bigint", AttrLength::Fixed(8), Alignment::Double);
        let oid = attr("oid", AttrLength::Fixed(4), Alignment::Int);

        assert_eq!(
            ValueFormatter::format(&int2, &value(&(-5i16).to_le_bytes())),
            FieldText::Int(-5)
        );
        assert_eq!(
            ValueFormatter::format(&int4(), &value(&42i32.to_le_bytes())),
            FieldText::Int(42)
        );
        assert_eq!(
            ValueFormatter::format(&int8, &value(&i64::MIN.to_le_bytes())),
            FieldText::Int(i64::MIN)
        );
        assert_eq!(
            ValueFormatter::format(&oid, &value(&u32::MAX.to_le_bytes())),
            FieldText::Int(u32::MAX as i64)
        );
    }

    #[test]
    fn test_format_wrong_width_falls_back_to_bytes() {
        let odd = attr("int4", AttrLength::Fixed(3), Alignment::Int);
        assert_eq!(
            ValueFormatter::format(&odd, &value(&[1, 2, 3])),
            FieldText::from_bytes(&[1, 2, 3])
        );
    }

    #[test]
    fn test_format_floats() {
        let float4 = attr("float4", AttrLength::Fixed(4), Alignment::Int);
        let float8 = attr("float8", AttrLength::Fixed(8), Alignment::Double);

        assert_eq!(
            ValueFormatter::format(&float4, &value(&1.5f32.to_le_bytes())),
            FieldText::Float(1.5)
        );
        assert_eq!(
            ValueFormatter::format(&float8, &value(&0.1f64.to_le_bytes())),
            FieldText::Float(0.1)
        );
        assert_eq!(
            ValueFormatter::format(&float8, &value(&f64::NAN.to_le_bytes())),
            FieldText::from_bytes(&f64::NAN.to_le_bytes())
        );
    }

    #[test]
    fn test_format_bool() {
        let boolean = attr("bool", AttrLength::Fixed(1), Alignment::Char);
        assert_eq!(ValueFormatter::format(&boolean, &value(&[1])), FieldText::Bool(true));
        assert_eq!(ValueFormatter::format(&boolean, &value(&[0])), FieldText::Bool(false));
        assert_eq!(
            ValueFormatter::format(&boolean, &value(&[7])),
            FieldText::from_bytes(&[7])
        );
    }

    #[test]
    fn test_format_text() {
        assert_eq!(
            ValueFormatter::format(&text(), &value(b"hello")),
            FieldText::Text("hello".to_string())
        );
        assert_eq!(
            ValueFormatter::format(&text(), &value(&[0xFF, 0xFE])),
            FieldText::from_bytes(&[0xFF, 0xFE])
        );
    }

    #[test]
    fn test_format_unknown_type_is_hex() {
        let numeric = attr("numeric", AttrLength::Varlena, Alignment::Int);
        assert_eq!(
            ValueFormatter::format(&numeric, &value(&[0x00, 0x80])),
            FieldText::Bytes {
                hex: "0080".to_string()
            }
        );
    }

    #[test]
    fn test_padded_name() {
        let name = attr("name", AttrLength::Fixed(8), Alignment::Char);
        let stored = value(b"pg\0\0\0\0\0\0");
        let field = ValueFormatter::format(&name, &stored);
        assert_eq!(field, FieldText::Text("pg".to_string()));
        assert_eq!(ValueFormatter::parse(&name, &field).unwrap(), stored);

        let dirty = value(b"pg\0x\0\0\0\0");
        assert!(matches!(
            ValueFormatter::format(&name, &dirty),
            FieldText::Bytes { .. }
        ));

        let too_long = FieldText::Text("abcdefgh".to_string());
        assert!(matches!(
            ValueFormatter::parse(&name, &too_long),
            Err(FormatError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_roundtrips_format() {
        let cases = [
            (int4(), value(&(-7i32).to_le_bytes())),
            (
                attr("float4", AttrLength::Fixed(4), Alignment::Int),
                value(&0.1f32.to_le_bytes()),
            ),
            (
                attr("float8", AttrLength::Fixed(8), Alignment::Double),
                value(&(-2.5e-300f64).to_le_bytes()),
            ),
            (attr("bool", AttrLength::Fixed(1), Alignment::Char), value(&[1])),
            (text(), value("héllo".as_bytes())),
            (text(), value(&[0xC3])),
            (
                attr("uuid", AttrLength::Fixed(16), Alignment::Char),
                value(&[0xAB; 16]),
            ),
            (int4(), Datum::Null),
        ];
        for (attr, datum) in cases {
            let field = ValueFormatter::format(&attr, &datum);
            assert_eq!(ValueFormatter::parse(&attr, &field).unwrap(), datum, "{field}");
        }
    }

    #[test]
    fn test_parse_hex_for_any_type() {
        let field = FieldText::Bytes {
            hex: "\\x2a000000".to_string(),
        };
        assert_eq!(
            ValueFormatter::parse(&int4(), &field).unwrap(),
            value(&42i32.to_le_bytes())
        );

        let bad = FieldText::Bytes {
            hex: "zz".to_string(),
        };
        assert!(matches!(
            ValueFormatter::parse(&int4(), &bad),
            Err(FormatError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_parse_lenient_text() {
        let boolean = attr("bool", AttrLength::Fixed(1), Alignment::Char);
        let float8 = attr("float8", AttrLength::Fixed(8), Alignment::Double);
        assert_eq!(
            ValueFormatter::parse(&int4(), &FieldText::Text(" 12 ".to_string())).unwrap(),
            value(&12i32.to_le_bytes())
        );
        assert_eq!(
            ValueFormatter::parse(&boolean, &FieldText::Text("t".to_string())).unwrap(),
            value(&[1])
        );
        assert_eq!(
            ValueFormatter::parse(&float8, &FieldText::Int(3)).unwrap(),
            value(&3.0f64.to_le_bytes())
        );
    }

    #[test]
    fn test_parse_out_of_range() {
        let int2 = attr("int2", AttrLength::Fixed(2), Alignment::Short);
        let oid = attr("oid", AttrLength::Fixed(4), Alignment::Int);
        assert!(matches!(
            ValueFormatter::parse(&int2, &FieldText::Int(40_000)),
            Err(FormatError::OutOfRange { .. })
        ));
        assert!(matches!(
            ValueFormatter::parse(&oid, &FieldText::Int(-1)),
            Err(FormatError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_type_mismatch() {
        assert!(matches!(
            ValueFormatter::parse(&int4(), &FieldText::Bool(true)),
            Err(FormatError::TypeMismatch { found: "boolean", .. })
        ));
        assert!(matches!(
            ValueFormatter::parse(&text(), &FieldText::Int(1)),
            Err(FormatError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_all_counts() {
        let catalog = TypeCatalog::from_csv("a,int4,4,i;b,text,-1,i").unwrap();
        let err = ValueFormatter::parse_all(&catalog, &[FieldText::Null]).unwrap_err();
        assert!(matches!(err, FormatError::FieldCount { expected: 2, actual: 1 }));

        let values = ValueFormatter::parse_all(
            &catalog,
            &[FieldText::Int(1), FieldText::Text("x".to_string())],
        )
        .unwrap();
        assert_eq!(ValueFormatter::format_all(&catalog, &values).len(), 2);
    }

    #[test]
    fn test_json_shapes() {
        let fields: Vec<FieldText> =
            serde_json::from_str(r#"[null, true, 5, 5.5, "s", {"hex": "ff"}]"#).unwrap();
        assert_eq!(
            fields,
            vec![
                FieldText::Null,
                FieldText::Bool(true),
                FieldText::Int(5),
                FieldText::Float(5.5),
                FieldText::Text("s".to_string()),
                FieldText::Bytes {
                    hex: "ff".to_string()
                },
            ]
        );
        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"[null,true,5,5.5,"s",{"hex":"ff"}]"#
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldText::Null.to_string(), "NULL");
        assert_eq!(FieldText::Text("a".to_string()).to_string(), "\"a\"");
        assert_eq!(FieldText::from_bytes(&[0xDE, 0xAD]).to_string(), "\\xdead");
    }
}
