use std::path::Path;

use colored::Colorize;
use tt_mechanics::{ClientRole, CombatSession, DieOptions, MechanicsConfig};

pub fn run(
    config: &MechanicsConfig,
    roster: &Path,
    character: &str,
    skill: &str,
    options: DieOptions,
    declare: bool,
) -> Result<(), String> {
    let roster = super::load_roster(roster)?;
    let sheet = roster.find(character)?.clone();
    let dice = sheet.skill_by_name(skill).map_or(0, |s| s.dice.len());

    let mut session = CombatSession::new(config.clone()).map_err(|e| e.to_string())?;
    let player = session.connect(ClientRole::Player);
    let id = session
        .add_character(player, sheet)
        .map_err(|e| e.to_string())?;

    let message = if declare {
        session
            .declare_skill(player, id, skill)
            .map_err(|e| e.to_string())?
    } else {
        let (message, roll) = session
            .roll_skill(player, id, skill, &vec![options; dice])
            .map_err(|e| e.to_string())?;
        if roll.failures() > 0 {
            eprintln!("  {} {} dice could not be rolled", "warning:".yellow(), roll.failures());
        }
        message
    };

    if let Some(entry) = session.chat().get(message) {
        println!("{}", entry.speaker_name.bold());
        print!("{}", entry.body.text());
    }
    Ok(())
}
