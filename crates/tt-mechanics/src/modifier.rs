//! Contextual modifiers for a die.
//!
//! Three tiers stack: `all` always applies, then the stance category
//! (`offense` or `defense`), then the sub-type category of the die's base
//! kind. Counter dice resolve exactly like their base kind. Unrecognised
//! tags only receive `all`.

use tt_core::{DieType, ModifierCategory, ModifierSet};

/// The categories that apply to a die type, outermost first.
pub fn modifier_categories(die_type: &DieType) -> Vec<ModifierCategory> {
    match die_type.kind() {
        Some(kind) => vec![
            ModifierCategory::All,
            kind.stance().modifier(),
            kind.modifier(),
        ],
        None => vec![ModifierCategory::All],
    }
}

/// Sum every category that applies to the die type. Never fails.
pub fn contextual_modifier(die_type: &DieType, modifiers: &ModifierSet) -> i32 {
    modifier_categories(die_type)
        .into_iter()
        .fold(0i32, |acc, category| {
            acc.saturating_add(modifiers.get(category))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_core::DieKind;

    fn sheet() -> ModifierSet {
        ModifierSet::new()
            .with(ModifierCategory::All, 1)
            .with(ModifierCategory::Offense, 2)
            .with(ModifierCategory::Defense, 10)
            .with(ModifierCategory::Speed, 100)
            .with(ModifierCategory::Slash, 4)
            .with(ModifierCategory::Block, 20)
    }

    #[test]
    fn offense_die_gets_all_offense_and_subtype() {
        let t = DieType::Standard(DieKind::Slash);
        assert_eq!(contextual_modifier(&t, &sheet()), 1 + 2 + 4);
    }

    #[test]
    fn counter_dice_match_their_base_kind() {
        let counter = DieType::parse("counter_slash");
        assert_eq!(contextual_modifier(&counter, &sheet()), 7);
        let counter_block = DieType::parse("counterblock");
        assert_eq!(contextual_modifier(&counter_block, &sheet()), 1 + 10 + 20);
    }

    #[test]
    fn absent_subtype_counts_as_zero() {
        let t = DieType::Standard(DieKind::Pierce);
        assert_eq!(contextual_modifier(&t, &sheet()), 3);
        let t = DieType::Standard(DieKind::Evade);
        assert_eq!(contextual_modifier(&t, &sheet()), 11);
    }

    #[test]
    fn unknown_tag_only_gets_all() {
        let t = DieType::parse("psychic");
        assert_eq!(modifier_categories(&t), vec![ModifierCategory::All]);
        assert_eq!(contextual_modifier(&t, &sheet()), 1);
    }

    #[test]
    fn speed_never_applies_to_dice() {
        for kind in DieKind::ALL {
            let cats = modifier_categories(&DieType::Standard(kind));
            assert_eq!(cats.len(), 3);
            assert!(!cats.contains(&ModifierCategory::Speed));
        }
    }

    #[test]
    fn empty_sheet_resolves_to_zero() {
        let t = DieType::Counter(DieKind::Blunt);
        assert_eq!(contextual_modifier(&t, &ModifierSet::new()), 0);
    }
}
