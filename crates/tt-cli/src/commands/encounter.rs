use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use tt_mechanics::{ChatBody, ClientRole, CombatSession, MechanicsConfig, TurnAdvance};

pub fn run(config: MechanicsConfig, roster: &Path, rounds: u32) -> Result<(), String> {
    let roster = super::load_roster(roster)?;
    if roster.characters.is_empty() {
        println!("  No characters in roster.");
        return Ok(());
    }

    let mut session = CombatSession::new(config).map_err(|e| e.to_string())?;
    let gm = session.connect(ClientRole::GameMaster);
    for entry in roster.characters {
        let placements = entry.placements.max(1);
        let id = session
            .add_character(gm, entry.character)
            .map_err(|e| e.to_string())?;
        for _ in 0..placements {
            session.add_to_combat(gm, id).map_err(|e| e.to_string())?;
        }
    }

    session.roll_unrolled(gm).map_err(|e| e.to_string())?;
    session.start(gm).map_err(|e| e.to_string())?;

    for round in 1..=rounds.max(1) {
        print_order(&session, round);
        if round == rounds.max(1) {
            break;
        }
        loop {
            match session.next_turn(gm).map_err(|e| e.to_string())? {
                TurnAdvance::NewRound { .. } => break,
                TurnAdvance::Next { .. } => {}
            }
        }
        session.roll_unrolled(gm).map_err(|e| e.to_string())?;
    }

    println!("{}", "Chat log".bold());
    for entry in session.chat().entries() {
        match &entry.body {
            ChatBody::Content(text) => {
                println!("  {}: {}", entry.speaker_name.bold(), text.trim_end());
            }
            ChatBody::Flavor(text) => println!("  {}", text.trim_end().dimmed()),
        }
        for roll in &entry.rolls {
            println!("    {}", roll.trace());
        }
    }

    Ok(())
}

fn print_order(session: &CombatSession, round: u32) {
    let current = session
        .current_entry()
        .ok()
        .flatten()
        .map(|e| e.id);

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Name", "Initiative", "Clone"]);
    for (i, entry) in session.turn_order().iter().enumerate() {
        let marker = if Some(entry.id) == current { ">" } else { "" };
        let initiative = entry
            .initiative
            .map_or_else(|| "-".to_string(), |v| session.config().format_initiative(v));
        let clone = if entry.is_clone { "yes" } else { "" };
        table.add_row(vec![
            format!("{marker}{}", i + 1),
            entry.name.clone(),
            initiative,
            clone.to_string(),
        ]);
    }

    println!("{}", format!("Round {round}").bold());
    println!("{table}");
    println!();
}
