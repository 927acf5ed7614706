use crate::{
    constants::localization::MALFORMED_JSON_MSG,
    functions::is_candidate,
    json::{extract_json_text, translate_json},
    nbt::{Compound, ListTag, Tag},
    types::{Mode, TextMapping},
};
use log::warn;
use serde_json::Value;

/// Returns the parsed value if `str` looks like an embedded JSON object or array.
///
/// Strings that look like JSON but don't parse are treated as plain text.
fn embedded_json(str: &str) -> Option<Value> {
    let trimmed = str.trim();

    let enveloped = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));

    if !enveloped {
        return None;
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("{MALFORMED_JSON_MSG} {err}: {str}");
            None
        }
    }
}

/// Walks an NBT tree either collecting candidate strings ([`Mode::Read`]) or substituting them ([`Mode::Write`]).
///
/// String tags holding JSON text components are handed to the [`crate::json`] walker.
pub struct GenericBase<'a> {
    mode: Mode,
    mapping: Option<&'a TextMapping>,
    lines: Vec<String>,
}

impl<'a> GenericBase<'a> {
    #[must_use]
    pub const fn reader() -> Self {
        Self {
            mode: Mode::Read,
            mapping: None,
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub const fn writer(mapping: &'a TextMapping) -> Self {
        Self {
            mode: Mode::Write,
            mapping: Some(mapping),
            lines: Vec::new(),
        }
    }

    fn process_string(&mut self, str: &str) -> Option<String> {
        match self.mode {
            Mode::Read => {
                if let Some(json) = embedded_json(str) {
                    extract_json_text(&json, &mut self.lines);
                } else if is_candidate(str) {
                    self.lines.push(str.to_owned());
                }

                None
            }
            Mode::Write => {
                let mapping = self.mapping?;

                if let Some(json) = embedded_json(str) {
                    let translated = translate_json(&json, mapping);

                    // Unchanged components keep their original formatting
                    if translated == json {
                        return None;
                    }

                    serde_json::to_string(&translated).ok()
                } else {
                    mapping.get(str).map(str::to_owned)
                }
            }
        }
    }

    fn traverse(&mut self, tag: &Tag) -> Option<Tag> {
        match tag {
            Tag::String(str) => self.process_string(str).map(Tag::String),
            Tag::Compound(compound) => {
                self.traverse_compound(compound).map(Tag::Compound)
            }
            Tag::List(list) => self.traverse_list(list).map(Tag::List),
            _ => None,
        }
    }

    fn traverse_compound(&mut self, compound: &Compound) -> Option<Compound> {
        let mut output: Option<Compound> = None;

        for (i, (_, value)) in compound.iter().enumerate() {
            if let Some(translated) = self.traverse(value) {
                let output = output.get_or_insert_with(|| compound.clone());

                if let Some((_, slot)) = output.get_index_mut(i) {
                    *slot = translated;
                }
            }
        }

        output
    }

    fn traverse_list(&mut self, list: &ListTag) -> Option<ListTag> {
        let mut output: Option<ListTag> = None;

        for (i, value) in list.iter().enumerate() {
            if let Some(translated) = self.traverse(value) {
                let output = output.get_or_insert_with(|| list.clone());
                // Translation never changes a tag's kind
                let _ = output.set(i, translated);
            }
        }

        output
    }

    /// Collects every candidate string in `tag`, depth-first. Duplicates are kept.
    pub fn extract(mut self, tag: &Tag) -> Vec<String> {
        self.traverse(tag);
        self.lines
    }

    /// Returns the translated tree, or [`None`] if nothing in it changed.
    pub fn translate(mut self, tag: &Tag) -> Option<Tag> {
        self.traverse(tag).filter(|translated| translated != tag)
    }
}

/// Collects candidate strings from an NBT tree.
#[must_use]
pub fn extract_text(tag: &Tag) -> Vec<String> {
    GenericBase::reader().extract(tag)
}

/// Translates an NBT tree. The output always has the same shape as `tag`.
#[must_use]
pub fn translate_text(tag: &Tag, mapping: &TextMapping) -> Tag {
    GenericBase::writer(mapping)
        .translate(tag)
        .unwrap_or_else(|| tag.clone())
}
