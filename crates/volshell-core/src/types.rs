//! Structured-object layouts for the `dt` command.
//!
//! Member tables come from the type system as an ISF-style JSON export
//! (`user_types` -> `fields` -> `{offset, type}`). [`TypeCatalog`] loads
//! those tables and [`describe`] renders any [`ObjectHandle`] as aligned
//! columns.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// One member of a structured object, borrowed from its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMember<'a> {
    pub name: &'a str,
    pub offset: u64,
    pub type_name: &'a str,
}

/// A structured object whose member table can be listed.
pub trait ObjectHandle {
    /// Members in the table's natural order.
    fn members(&self) -> Vec<ObjectMember<'_>>;
}

/// Render the member table of `object` with offsets and names aligned.
///
/// Each line is `<pad><offset> <name><pad> <type name>`, padded to the
/// longest offset and the longest name. Member order is preserved.
pub fn describe<O: ObjectHandle + ?Sized>(object: &O) -> Vec<String> {
    let members = object.members();

    let mut longest_name = 0;
    let mut longest_offset = 0;
    for member in &members {
        longest_name = longest_name.max(member.name.chars().count());
        longest_offset = longest_offset.max(format!("{:#x}", member.offset).len());
    }

    members
        .iter()
        .map(|member| {
            let offset = format!("{:#x}", member.offset);
            format!(
                "{:>offset_width$} {:<name_width$} {}",
                offset,
                member.name,
                member.type_name,
                offset_width = longest_offset,
                name_width = longest_name,
            )
        })
        .collect()
}

/// Type reference of a field, as exported by the type system.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeDescriptor {
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subtype: Option<Box<TypeDescriptor>>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub bit_position: Option<u32>,
    #[serde(default)]
    pub bit_length: Option<u32>,
    #[serde(default, rename = "type")]
    pub element_type: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    fn inner(&self) -> Option<&TypeDescriptor> {
        self.subtype.as_deref().or(self.element_type.as_deref())
    }

    fn inner_name(&self) -> String {
        self.inner()
            .map(TypeDescriptor::type_name)
            .unwrap_or_else(|| "void".to_string())
    }

    /// Human-readable name, nested types included.
    pub fn type_name(&self) -> String {
        match self.kind.as_str() {
            "pointer" => format!("Pointer({})", self.inner_name()),
            "array" => format!("Array({}, {})", self.count.unwrap_or(0), self.inner_name()),
            "bitfield" => format!(
                "BitField({}, {}, {})",
                self.bit_position.unwrap_or(0),
                self.bit_length.unwrap_or(0),
                self.inner_name()
            ),
            _ => self.name.clone().unwrap_or_else(|| self.kind.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FieldEntry {
    offset: u64,
    #[serde(rename = "type")]
    type_info: TypeDescriptor,
}

#[derive(Debug, Clone, Deserialize)]
struct UserTypeEntry {
    #[serde(default)]
    size: u64,
    /// Kept in export order.
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TypeExport {
    #[serde(default)]
    user_types: HashMap<String, UserTypeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLayout {
    pub name: String,
    pub offset: u64,
    pub type_name: String,
}

/// Member table of one structured type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub size: u64,
    pub members: Vec<MemberLayout>,
}

impl StructLayout {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            members: Vec::new(),
        }
    }

    pub fn with_member(
        mut self,
        name: impl Into<String>,
        offset: u64,
        type_name: impl Into<String>,
    ) -> Self {
        self.members.push(MemberLayout {
            name: name.into(),
            offset,
            type_name: type_name.into(),
        });
        self
    }

    fn from_entry(name: &str, entry: UserTypeEntry) -> Result<Self> {
        let members = entry
            .fields
            .into_iter()
            .map(|(name, value)| -> Result<MemberLayout> {
                let field: FieldEntry = serde_json::from_value(value)?;
                Ok(MemberLayout {
                    type_name: field.type_info.type_name(),
                    name,
                    offset: field.offset,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            size: entry.size,
            members,
        })
    }
}

impl ObjectHandle for StructLayout {
    fn members(&self) -> Vec<ObjectMember<'_>> {
        self.members
            .iter()
            .map(|member| ObjectMember {
                name: &member.name,
                offset: member.offset,
                type_name: &member.type_name,
            })
            .collect()
    }
}

/// Named struct layouts available to a session.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, StructLayout>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let export: TypeExport = serde_json::from_str(json)?;
        let types = export
            .user_types
            .into_iter()
            .map(|(name, entry)| -> Result<(String, StructLayout)> {
                let layout = StructLayout::from_entry(&name, entry)?;
                Ok((name, layout))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        debug!("Loaded {} type layouts", types.len());
        Ok(Self { types })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn insert(&mut self, layout: StructLayout) {
        self.types.insert(layout.name.clone(), layout);
    }

    pub fn get(&self, name: &str) -> Result<&StructLayout> {
        self.types
            .get(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))
    }

    /// Type names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
