//! Java edition NBT: tag tree, binary codec and SNBT.

mod binary;
mod snbt;

pub use binary::{from_bytes, to_bytes};
pub use snbt::{from_snbt, to_snbt};

use crate::types::Error;
use indexmap::IndexMap;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumIs};

pub type Compound = IndexMap<String, Tag>;

/// Tag id as stored in binary NBT.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIs,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

/// A single NBT value.
///
/// Float equality compares bit patterns, so a record containing `NaN` is still equal to itself.
#[derive(Debug, Clone)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(ListTag),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    #[must_use]
    pub const fn kind(&self) -> TagKind {
        match self {
            Self::Byte(_) => TagKind::Byte,
            Self::Short(_) => TagKind::Short,
            Self::Int(_) => TagKind::Int,
            Self::Long(_) => TagKind::Long,
            Self::Float(_) => TagKind::Float,
            Self::Double(_) => TagKind::Double,
            Self::ByteArray(_) => TagKind::ByteArray,
            Self::String(_) => TagKind::String,
            Self::List(_) => TagKind::List,
            Self::Compound(_) => TagKind::Compound,
            Self::IntArray(_) => TagKind::IntArray,
            Self::LongArray(_) => TagKind::LongArray,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(str) => Some(str),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(int) => Some(*int),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_compound(&self) -> Option<&Compound> {
        match self {
            Self::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
        match self {
            Self::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&ListTag> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListTag> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Compound(a), Self::Compound(b)) => a == b,
            (Self::IntArray(a), Self::IntArray(b)) => a == b,
            (Self::LongArray(a), Self::LongArray(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Compound> for Tag {
    fn from(value: Compound) -> Self {
        Self::Compound(value)
    }
}

impl From<ListTag> for Tag {
    fn from(value: ListTag) -> Self {
        Self::List(value)
    }
}

/// Homogeneous list of tags.
///
/// An empty list may carry any element kind, [`TagKind::End`] included.
/// Two empty lists compare equal regardless of their kinds.
#[derive(Debug, Clone)]
pub struct ListTag {
    kind: TagKind,
    values: Vec<Tag>,
}

impl ListTag {
    #[must_use]
    pub const fn empty(kind: TagKind) -> Self {
        Self {
            kind,
            values: Vec::new(),
        }
    }

    /// Builds a list whose element kind is taken from the first value.
    pub fn from_values(values: Vec<Tag>) -> Result<Self, Error> {
        let kind = values.first().map_or(TagKind::End, Tag::kind);
        Self::new(kind, values)
    }

    pub fn new(kind: TagKind, values: Vec<Tag>) -> Result<Self, Error> {
        if let Some(found) =
            values.iter().map(Tag::kind).find(|found| *found != kind)
        {
            return Err(Error::MixedList {
                expected: kind,
                found,
            });
        }

        Ok(Self { kind, values })
    }

    #[must_use]
    pub const fn kind(&self) -> TagKind {
        self.kind
    }

    #[must_use]
    pub fn values(&self) -> &[Tag] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces the element at `index`. The replacement must be of the list's kind.
    ///
    /// Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: Tag) -> Result<(), Error> {
        if value.kind() != self.kind {
            return Err(Error::MixedList {
                expected: self.kind,
                found: value.kind(),
            });
        }

        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }

        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.values.iter()
    }
}

impl PartialEq for ListTag {
    fn eq(&self, other: &Self) -> bool {
        (self.kind == other.kind || self.values.is_empty())
            && self.values == other.values
    }
}

impl<'a> IntoIterator for &'a ListTag {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Root of an NBT document: a named compound.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedTag {
    pub name: String,
    pub root: Compound,
}

impl NamedTag {
    #[must_use]
    pub fn new(name: impl Into<String>, root: Compound) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}
