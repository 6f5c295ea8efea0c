use colored::Colorize;
use tt_core::DieType;
use tt_mechanics::{MechanicsConfig, RerollDescriptor, RollMode, RolledDie, StdDice};

pub fn run(
    config: &MechanicsConfig,
    formula: &str,
    modifier: i32,
    contextual: i32,
    mode: RollMode,
    json: bool,
) -> Result<(), String> {
    let mut descriptor = RerollDescriptor::for_formula(formula.trim(), DieType::parse("custom"), "roll");
    descriptor.flat_modifier = modifier;
    descriptor.contextual_modifier = contextual;
    descriptor.mode = mode;

    let mut dice = StdDice::from_seed_option(config.seed);
    let rolled = descriptor.roll(&mut dice).map_err(|e| e.to_string())?;
    print_roll(&rolled, json)
}

/// Print a roll as a trace line or as JSON.
pub fn print_roll(rolled: &RolledDie, json: bool) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(rolled).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }

    println!("{}", rolled.trace());
    println!("  {} {}", "Total:".bold(), rolled.total());
    Ok(())
}
