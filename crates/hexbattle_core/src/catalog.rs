//! # Archetype Catalog
//!
//! Unit templates keyed by id. Loaded once at startup, read-only after.
//!
//! ```toml
//! [[archetype]]
//! id = "attacker"
//! faction = "attacker"
//! hp = 10
//! movement_range = 1
//! visual_key = "axie_attacker"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::unit::{ArchetypeId, Faction};

/// Id of the built-in attacker template.
pub const ATTACKER: &str = "attacker";
/// Id of the built-in defender template.
pub const DEFENDER: &str = "defender";

/// A unit template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    /// Catalog key.
    pub id: ArchetypeId,
    /// Side spawned units fight for.
    pub faction: Faction,
    /// Starting and maximum hit points.
    pub hp: i32,
    /// Cells per turn.
    pub movement_range: u32,
    /// Opaque presentation key.
    #[serde(default)]
    pub visual_key: String,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    archetype: Vec<Archetype>,
}

/// Read-only archetype lookup.
#[derive(Clone, Debug, Default)]
pub struct ArchetypeCatalog {
    entries: Vec<Archetype>,
    index: HashMap<ArchetypeId, usize>,
}

impl ArchetypeCatalog {
    /// Builds a catalog, rejecting duplicate ids and non-positive hp.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Duplicate`] or [`CatalogError::InvalidHp`].
    pub fn new(entries: Vec<Archetype>) -> CatalogResult<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, archetype) in entries.iter().enumerate() {
            if archetype.hp <= 0 {
                return Err(CatalogError::InvalidHp {
                    id: archetype.id.to_string(),
                    hp: archetype.hp,
                });
            }
            if index.insert(archetype.id.clone(), i).is_some() {
                return Err(CatalogError::Duplicate(archetype.id.to_string()));
            }
        }
        Ok(Self { entries, index })
    }

    /// The two stock templates: attacker (10 hp, moves 1) and defender
    /// (30 hp, stationary).
    #[must_use]
    pub fn builtin() -> Self {
        let entries = vec![
            Archetype {
                id: ArchetypeId::new(ATTACKER),
                faction: Faction::Attacker,
                hp: 10,
                movement_range: 1,
                visual_key: ATTACKER.to_owned(),
            },
            Archetype {
                id: ArchetypeId::new(DEFENDER),
                faction: Faction::Defender,
                hp: 30,
                movement_range: 0,
                visual_key: DEFENDER.to_owned(),
            },
        ];
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Self { entries, index }
    }

    /// Parses a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Parse failures and the validation errors of [`Self::new`].
    pub fn from_toml_str(text: &str) -> CatalogResult<Self> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::new(file.archetype)
    }

    /// Reads and parses a catalog file.
    ///
    /// # Errors
    ///
    /// I/O failures plus everything [`Self::from_toml_str`] reports.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Template by id.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&Archetype> {
        self.index
            .get(id)
            .and_then(|&i| self.entries.get(i))
    }

    /// First template registered for `faction`; used when seeding rings.
    #[must_use]
    pub fn primary_for(&self, faction: Faction) -> Option<&Archetype> {
        self.entries.iter().find(|a| a.faction == faction)
    }

    /// All templates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.entries.iter()
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates() {
        let catalog = ArchetypeCatalog::builtin();
        let attacker = catalog.lookup(ATTACKER).unwrap();
        assert_eq!((attacker.hp, attacker.movement_range), (10, 1));
        let defender = catalog.primary_for(Faction::Defender).unwrap();
        assert_eq!((defender.hp, defender.movement_range), (30, 0));
        assert!(catalog.lookup("dragon").is_none());
    }

    #[test]
    fn test_from_toml() {
        let catalog = ArchetypeCatalog::from_toml_str(
            r#"
            [[archetype]]
            id = "scout"
            faction = "attacker"
            hp = 6
            movement_range = 2

            [[archetype]]
            id = "wall"
            faction = "defender"
            hp = 50
            movement_range = 0
            visual_key = "stone"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.primary_for(Faction::Attacker).unwrap().id.as_str(), "scout");
        assert_eq!(catalog.lookup("wall").unwrap().visual_key, "stone");
    }

    #[test]
    fn test_duplicate_rejected() {
        let text = r#"
            [[archetype]]
            id = "x"
            faction = "attacker"
            hp = 1
            movement_range = 1
            [[archetype]]
            id = "x"
            faction = "defender"
            hp = 1
            movement_range = 0
        "#;
        assert!(matches!(
            ArchetypeCatalog::from_toml_str(text),
            Err(CatalogError::Duplicate(id)) if id == "x"
        ));
    }

    #[test]
    fn test_nonpositive_hp_rejected() {
        let text = r#"
            [[archetype]]
            id = "ghost"
            faction = "attacker"
            hp = 0
            movement_range = 1
        "#;
        assert!(matches!(
            ArchetypeCatalog::from_toml_str(text),
            Err(CatalogError::InvalidHp { hp: 0, .. })
        ));
    }
}
