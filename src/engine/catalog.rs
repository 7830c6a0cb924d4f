use rust_embed::Embed;
use serde::{Deserialize, Serialize};

use crate::engine::CatalogError;
use crate::engine::pool::PracticeCharacter;

#[derive(Embed)]
#[folder = "assets/kana/"]
struct KanaAssets;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Hiragana,
    Katakana,
}

impl Script {
    pub fn to_key(self) -> &'static str {
        match self {
            Script::Hiragana => "hiragana",
            Script::Katakana => "katakana",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "hiragana" => Some(Script::Hiragana),
            "katakana" => Some(Script::Katakana),
            _ => None,
        }
    }

    pub fn all() -> &'static [Script] {
        &[Script::Hiragana, Script::Katakana]
    }

    fn asset_name(self) -> String {
        format!("{}.json", self.to_key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KanaGroup {
    Basic,
    Dakuten,
    Combination,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub glyph: String,
    pub answers: Vec<String>,
    pub group: KanaGroup,
    #[serde(skip, default = "default_script")]
    pub script: Script,
}

fn default_script() -> Script {
    Script::Hiragana
}

#[derive(Clone, Debug)]
pub struct Selection {
    pub scripts: Vec<Script>,
    pub dakuten: bool,
    pub combinations: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            scripts: vec![Script::Hiragana],
            dakuten: false,
            combinations: false,
        }
    }
}

impl Selection {
    fn includes(&self, entry: &CatalogEntry) -> bool {
        self.scripts.contains(&entry.script)
            && match entry.group {
                KanaGroup::Basic => true,
                KanaGroup::Dakuten => self.dakuten,
                KanaGroup::Combination => self.combinations,
            }
    }
}

/// Static kana records, read once from the embedded assets.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn load() -> Result<Self, CatalogError> {
        let mut entries = Vec::new();
        for &script in Script::all() {
            entries.extend(Self::load_script(script)?);
        }
        Ok(Self { entries })
    }

    fn load_script(script: Script) -> Result<Vec<CatalogEntry>, CatalogError> {
        let name = script.asset_name();
        let file = KanaAssets::get(&name).ok_or_else(|| CatalogError::MissingAsset(name.clone()))?;
        let mut entries: Vec<CatalogEntry> = serde_json::from_slice(file.data.as_ref())
            .map_err(|source| CatalogError::Malformed {
                name: name.clone(),
                source,
            })?;
        for entry in &mut entries {
            entry.script = script;
            entry.answers = entry.answers.iter().map(|a| a.to_lowercase()).collect();
        }
        entries.retain(|e| !e.glyph.is_empty() && !e.answers.is_empty());
        Ok(entries)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Practice characters for a selection, all starting at `weight`.
    pub fn practice_set(
        &self,
        selection: &Selection,
        weight: f64,
    ) -> Result<Vec<PracticeCharacter>, CatalogError> {
        let chars: Vec<PracticeCharacter> = self
            .entries
            .iter()
            .filter(|e| selection.includes(e))
            .map(|e| PracticeCharacter {
                glyph: e.glyph.clone(),
                answers: e.answers.clone(),
                weight,
            })
            .collect();
        if chars.is_empty() {
            return Err(CatalogError::EmptySelection);
        }
        Ok(chars)
    }
}
