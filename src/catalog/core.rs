//! The catalog itself and its CSV loader.

use std::collections::HashSet;

use tracing::debug;

use super::error::CatalogError;
use super::types::{Alignment, AttrLength, Attribute};

/// System columns that a `pg_attribute` export lists but that are not
/// stored in the tuple's data area.
pub const SYSTEM_COLUMNS: [&str; 6] = ["tableoid", "ctid", "xmin", "xmax", "cmin", "cmax"];

/// Ordered column layout of one relation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeCatalog {
    attributes: Vec<Attribute>,
}

impl TypeCatalog {
    /// Builds a catalog from attributes in attribute-number order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyName` or `CatalogError::DuplicateName`.
    pub fn new(attributes: Vec<Attribute>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (record, attr) in attributes.iter().enumerate() {
            if attr.name.is_empty() {
                return Err(CatalogError::EmptyName { record });
            }
            if !seen.insert(attr.name.as_str()) {
                return Err(CatalogError::DuplicateName(attr.name.clone()));
            }
        }
        Ok(Self { attributes })
    }

    /// Parses `name,type,length,align` records separated by `;`.
    ///
    /// Fields are trimmed, empty records are ignored and system columns are
    /// skipped. `length` is a PostgreSQL `attlen` (> 0, -1 or -2) and
    /// `align` a `typalign` letter.
    ///
    /// ```
    /// use filenode_editor::catalog::TypeCatalog;
    ///
    /// let catalog = TypeCatalog::from_csv("id,int4,4,i;name,text,-1,i").unwrap();
    /// assert_eq!(catalog.len(), 2);
    /// ```
    pub fn from_csv(text: &str) -> Result<Self, CatalogError> {
        let mut attributes = Vec::new();

        for (record, line) in text.split(';').enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let [name, type_name, length, align] = fields[..] else {
                return Err(CatalogError::FieldCount {
                    record,
                    found: fields.len(),
                });
            };

            if name.is_empty() {
                return Err(CatalogError::EmptyName { record });
            }
            if SYSTEM_COLUMNS.contains(&name) {
                debug!(name, "skipping system column");
                continue;
            }

            let length = length
                .parse::<i32>()
                .ok()
                .and_then(AttrLength::from_attlen)
                .ok_or_else(|| CatalogError::InvalidLength {
                    name: name.to_string(),
                    value: length.to_string(),
                })?;

            let mut letters = align.chars();
            let align = match (letters.next(), letters.next()) {
                (Some(letter), None) => Alignment::from_typalign(letter),
                _ => None,
            }
            .ok_or_else(|| CatalogError::InvalidAlignment {
                name: name.to_string(),
                value: align.to_string(),
            })?;

            attributes.push(Attribute::new(name, type_name, length, align));
        }

        Self::new(attributes)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn get(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Index of the attribute with the given name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name == name)
    }
}
