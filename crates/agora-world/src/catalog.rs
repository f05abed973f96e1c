//! Read-only item catalog and the content rules built on it.
//!
//! The catalog is loaded once at startup and never mutated, so it lives
//! outside the world lock. It answers three questions for the action
//! engine: how much room an item takes, what using it does, and how the
//! cooking and fishing recipes are wired.

use std::collections::BTreeMap;

use agora_types::{ItemId, LocationId};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Static definition of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Catalog key.
    pub id: ItemId,
    /// Free-text description shown to planners.
    #[serde(default)]
    pub description: String,
    /// Capacity units one item occupies in a container.
    #[serde(default = "default_unit_capacity")]
    pub unit_capacity: u32,
    /// What consuming the item does.
    #[serde(default, with = "serde_yml::with::singleton_map")]
    pub kind: ItemKind,
}

const fn default_unit_capacity() -> u32 {
    1
}

/// How an item behaves when consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Eating or drinking applies attribute deltas.
    Consumable {
        /// Attribute name to delta.
        effect: BTreeMap<String, f64>,
    },
    /// Equipping permanently enlarges the inventory.
    Equipment {
        /// Extra inventory capacity per unit equipped.
        capacity_bonus: u32,
    },
    /// Cannot be consumed. Ingredients, tools, and trade goods.
    #[default]
    Material,
}

/// Cooking turns one unit of `input` into one unit of `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookRecipe {
    /// Raw ingredient.
    pub input: ItemId,
    /// Cooked result.
    pub output: ItemId,
    /// Simulated minutes the recipe takes.
    pub cook_minutes: f64,
}

/// A tool that can be used for cooking.
///
/// Tools with a `location` are installed there (the alias `home` means the
/// cook's own home) and require walking to them. Tools without one must
/// be carried in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookTool {
    /// Tool name as planners refer to it.
    pub id: ItemId,
    /// Where the tool is installed, if it is not portable.
    #[serde(default)]
    pub location: Option<LocationId>,
}

/// Content rules for fishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishingRules {
    /// Tool the player must hold.
    pub rod: ItemId,
    /// Item consumed per attempt.
    pub bait: ItemId,
    /// Item produced on a successful roll.
    pub catch: ItemId,
    /// Probability in `[0, 1]` that an attempt lands a catch.
    pub catch_chance: f64,
    /// Where fishing happens, if anywhere in particular.
    #[serde(default)]
    pub location: Option<LocationId>,
}

/// The read-only item catalog plus cooking and fishing rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: BTreeMap<ItemId, ItemDef>,
    recipes: BTreeMap<ItemId, CookRecipe>,
    tools: BTreeMap<ItemId, CookTool>,
    fuel: ItemId,
    fishing: FishingRules,
}

impl Catalog {
    /// Build a catalog, checking every cross-reference.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidContent`] if a recipe, tool, fuel, or
    /// fishing rule names an item that is not defined, or the catch
    /// chance lies outside `[0, 1]`.
    pub fn new(
        items: Vec<ItemDef>,
        recipes: Vec<CookRecipe>,
        tools: Vec<CookTool>,
        fuel: ItemId,
        fishing: FishingRules,
    ) -> Result<Self, WorldError> {
        let items: BTreeMap<ItemId, ItemDef> =
            items.into_iter().map(|def| (def.id.clone(), def)).collect();

        let require = |id: &ItemId, role: &str| -> Result<(), WorldError> {
            if items.contains_key(id) {
                Ok(())
            } else {
                Err(WorldError::InvalidContent {
                    reason: format!("{role} `{id}` is not in the catalog"),
                })
            }
        };

        for recipe in &recipes {
            require(&recipe.input, "recipe input")?;
            require(&recipe.output, "recipe output")?;
        }
        for tool in tools.iter().filter(|t| t.location.is_none()) {
            require(&tool.id, "portable tool")?;
        }
        require(&fuel, "fuel")?;
        require(&fishing.rod, "fishing rod")?;
        require(&fishing.bait, "fishing bait")?;
        require(&fishing.catch, "fishing catch")?;
        if !(0.0..=1.0).contains(&fishing.catch_chance) {
            return Err(WorldError::InvalidContent {
                reason: format!("catch chance {} is not a probability", fishing.catch_chance),
            });
        }

        Ok(Self {
            items,
            recipes: recipes
                .into_iter()
                .map(|r| (r.input.clone(), r))
                .collect(),
            tools: tools.into_iter().map(|t| (t.id.clone(), t)).collect(),
            fuel,
            fishing,
        })
    }

    /// Look up an item definition.
    pub fn get(&self, item: &str) -> Option<&ItemDef> {
        self.items.get(item)
    }

    /// Look up an item definition, failing if it is unknown.
    pub fn item(&self, item: &str) -> Result<&ItemDef, WorldError> {
        self.items.get(item).ok_or_else(|| WorldError::UnknownItem {
            item: ItemId::from(item),
        })
    }

    /// Capacity units one unit of `item` occupies.
    pub fn unit_capacity(&self, item: &str) -> Result<u32, WorldError> {
        self.item(item).map(|def| def.unit_capacity)
    }

    /// All item definitions in key order.
    pub fn items(&self) -> impl Iterator<Item = &ItemDef> {
        self.items.values()
    }

    /// The recipe that cooks `input`, if any.
    pub fn recipe(&self, input: &str) -> Option<&CookRecipe> {
        self.recipes.get(input)
    }

    /// A cooking tool by name.
    pub fn tool(&self, tool: &str) -> Option<&CookTool> {
        self.tools.get(tool)
    }

    /// All cooking tools in key order.
    pub fn tools(&self) -> impl Iterator<Item = &CookTool> {
        self.tools.values()
    }

    /// The fuel token every cooking attempt burns.
    pub const fn fuel(&self) -> &ItemId {
        &self.fuel
    }

    /// Fishing rules.
    pub const fn fishing(&self) -> &FishingRules {
        &self.fishing
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::content::GameContent;

    #[test]
    fn default_content_builds_a_valid_catalog() {
        let catalog = GameContent::default().catalog().unwrap();
        assert!(catalog.recipe("fish").is_some());
        assert_eq!(catalog.unit_capacity("fish").unwrap(), 1);
        assert!(catalog.item("dragon_egg").is_err());
    }

    #[test]
    fn dangling_recipe_is_rejected() {
        let content = GameContent::default();
        let mut recipes = content.recipes.clone();
        recipes.push(CookRecipe {
            input: ItemId::from("fish"),
            output: ItemId::from("smoked_unicorn"),
            cook_minutes: 5.0,
        });
        let result = Catalog::new(
            content.items.clone(),
            recipes,
            content.tools.clone(),
            content.fuel.clone(),
            content.fishing.clone(),
        );
        assert!(matches!(result, Err(WorldError::InvalidContent { .. })));
    }

    #[test]
    fn item_kinds_parse_from_yaml() {
        let yaml = r"
- id: bread
  kind:
    consumable:
      effect:
        hunger: 20
- id: backpack
  unit_capacity: 3
  kind:
    equipment:
      capacity_bonus: 20
- id: bait
";
        let items: Vec<ItemDef> = serde_yml::from_str(yaml).unwrap();
        assert!(matches!(items[0].kind, ItemKind::Consumable { .. }));
        assert_eq!(items[1].unit_capacity, 3);
        assert_eq!(items[2].kind, ItemKind::Material);
    }
}
