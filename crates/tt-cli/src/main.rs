//! CLI frontend for the Tabletop Tracker combat engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tt_mechanics::{DieOptions, RollMode};

#[derive(Parser)]
#[command(
    name = "tt",
    about = "Tabletop Tracker: dice, skills and initiative for tabletop combat",
    version,
    propagate_version = true
)]
struct Cli {
    /// Mechanics config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// RNG seed; overrides the config file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll a dice formula such as 2d6+3
    Roll {
        /// Formula in XdY+Z form
        formula: String,

        /// Free modifier added to the total
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        modifier: i32,

        /// Contextual modifier (ignored by paralysis and poise)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        contextual: i32,

        /// Every die shows 1
        #[arg(long)]
        paralysis: bool,

        /// Every die shows its maximum
        #[arg(long)]
        poise: bool,

        /// Print the roll and its reroll descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Roll a saved descriptor (or a saved roll) again
    Reroll {
        /// JSON file holding a descriptor or a `roll --json` result
        descriptor: PathBuf,

        /// Print the new roll as JSON
        #[arg(long)]
        json: bool,
    },

    /// Roll or declare a character's skill from a roster
    Skill {
        /// Roster JSON file
        roster: PathBuf,

        /// Character name (case-insensitive)
        #[arg(short, long)]
        character: String,

        /// Skill name (case-insensitive)
        #[arg(short, long)]
        skill: String,

        /// Free modifier applied to every die
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        modifier: i32,

        /// Every die shows 1
        #[arg(long)]
        paralysis: bool,

        /// Every die shows its maximum
        #[arg(long)]
        poise: bool,

        /// Show the dice without rolling
        #[arg(long)]
        declare: bool,
    },

    /// Run an encounter: place the roster, roll initiative, play rounds
    Encounter {
        /// Roster JSON file
        roster: PathBuf,

        /// Number of rounds to play
        #[arg(short, long, default_value = "1")]
        rounds: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = commands::load_config(cli.config.as_deref(), cli.seed).and_then(|config| {
        match cli.command {
            Commands::Roll {
                formula,
                modifier,
                contextual,
                paralysis,
                poise,
                json,
            } => mode(paralysis, poise).and_then(|mode| {
                commands::roll::run(&config, &formula, modifier, contextual, mode, json)
            }),
            Commands::Reroll { descriptor, json } => {
                commands::reroll::run(&config, &descriptor, json)
            }
            Commands::Skill {
                roster,
                character,
                skill,
                modifier,
                paralysis,
                poise,
                declare,
            } => mode(paralysis, poise).and_then(|_| {
                let options = DieOptions {
                    free_modifier: modifier,
                    paralysis,
                    poise,
                };
                commands::skill::run(&config, &roster, &character, &skill, options, declare)
            }),
            Commands::Encounter { roster, rounds } => {
                commands::encounter::run(config, &roster, rounds)
            }
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn mode(paralysis: bool, poise: bool) -> Result<RollMode, String> {
    RollMode::from_flags(paralysis, poise).map_err(|e| e.to_string())
}
