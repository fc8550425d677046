use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use butter_blast_core::LevelDescriptor;
use butter_blast_session::validate_level;
use serde::Deserialize;

const BUILTIN_CATALOG: &str = include_str!("../levels/world1.toml");

/// Ordered list of levels available to the player.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct LevelCatalog {
    levels: Vec<LevelDescriptor>,
}

impl LevelCatalog {
    /// Loads the campaign embedded in the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CATALOG).context("built-in level catalog is invalid")
    }

    /// Loads the catalog at `path`, or the built-in one when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::builtin();
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level catalog at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid level catalog at {}", path.display()))
    }

    /// Parses and validates catalog contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let catalog: Self =
            toml::from_str(contents).context("failed to parse level catalog toml contents")?;
        if catalog.levels.is_empty() {
            bail!("level catalog contains no levels");
        }
        for (index, level) in catalog.levels.iter().enumerate() {
            validate_level(level)
                .with_context(|| format!("level {} ('{}') is invalid", index + 1, level.name))?;
        }
        Ok(catalog)
    }

    /// Levels in play order.
    pub(crate) fn levels(&self) -> &[LevelDescriptor] {
        &self.levels
    }

    /// Looks up a level by its one-based number.
    pub(crate) fn level(&self, number: usize) -> Result<&LevelDescriptor> {
        number
            .checked_sub(1)
            .and_then(|index| self.levels.get(index))
            .with_context(|| {
                format!(
                    "level {number} does not exist; the catalog has {} levels",
                    self.levels.len()
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use butter_blast_core::{CellCoord, StatKey, TileKind};

    #[test]
    fn builtin_campaign_has_three_levels() {
        let catalog = LevelCatalog::builtin().expect("built-in catalog parses");
        let names: Vec<&str> = catalog
            .levels()
            .iter()
            .map(|level| level.name.as_str())
            .collect();
        assert_eq!(
            names,
            ["Learn Matching", "Collection Time", "Butter Blast Discovery"]
        );

        let first = catalog.level(1).expect("level 1");
        assert_eq!(first.moves, 30);
        assert_eq!(
            first.palette,
            vec![TileKind::Potato, TileKind::Butter, TileKind::Herb]
        );
        assert!(!first.specials_enabled);

        let third = catalog.level(3).expect("level 3");
        assert!(third.specials_enabled);
        assert_eq!(third.seeding.forced.len(), 5);
        assert_eq!(third.seeding.forced[2].cell, CellCoord::new(2, 3));
        assert_eq!(third.seeding.forced[2].kind, TileKind::Potato);
        assert_eq!(
            third.goals.iter().map(|goal| goal.stat).collect::<Vec<_>>(),
            vec![StatKey::Blasts, StatKey::Clear]
        );
    }

    #[test]
    fn level_numbers_are_one_based() {
        let catalog = LevelCatalog::builtin().expect("built-in catalog parses");
        assert!(catalog.level(0).is_err());
        assert!(catalog.level(4).is_err());
        assert_eq!(
            catalog.level(2).expect("level 2").name,
            "Collection Time"
        );
    }

    #[test]
    fn unknown_goal_stat_is_rejected() {
        let contents = r#"
            [[levels]]
            name = "Broken"
            moves = 10
            palette = ["potato", "butter", "herb"]

            [[levels.goals]]
            stat = "gravy"
            target = 3
        "#;

        assert!(LevelCatalog::parse(contents).is_err());
    }

    #[test]
    fn invalid_level_is_reported_with_its_number() {
        let contents = r#"
            [[levels]]
            name = "Empty"
            moves = 10
            palette = []
            goals = []
        "#;

        let error = LevelCatalog::parse(contents).expect_err("empty palette rejected");
        assert!(format!("{error:#}").contains("level 1 ('Empty') is invalid"));
    }
}
