//! combat_sim - Headless encounter simulator for combat_core
//!
//! Runs one seeded encounter with a greedy autoplayer and prints a summary
//! (or the full event log as JSON).

mod simulation;

use anyhow::{bail, Context, Result};
use clap::Parser;
use combat_core::config::{load_enemy_configs, load_relic_configs, load_rules_config, load_status_configs};
use combat_core::{
    default_enemies, default_relics, default_rules_config, default_statuses, CombatContext, Combatant, EnemyRegistry,
    PlayerCombatant, RelicRegistry, RulesConfig, StandardRules, StatusRegistry,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use simulation::{starter_deck, EncounterSimulation};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Simulate a deckbuilder combat encounter
#[derive(Parser, Debug)]
#[command(name = "combat_sim")]
#[command(about = "Run a seeded combat encounter with an autoplayer", long_about = None)]
#[command(version)]
struct Cli {
    /// RNG seed for enemy AI and deck order
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Enemy ids to fight
    #[arg(short, long = "enemy", default_values_t = vec!["cultist".to_string()])]
    enemies: Vec<String>,

    /// Relic ids the player starts with
    #[arg(short, long = "relic", default_values_t = vec!["burning_blood".to_string()])]
    relics: Vec<String>,

    /// Player max health
    #[arg(long, default_value_t = 80)]
    health: i32,

    /// Stop after this many player turns
    #[arg(long, default_value_t = 50)]
    max_turns: u32,

    /// Directory with statuses.toml, relics.toml, enemies.toml and rules.toml overrides
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Print the event log as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

struct Catalogs {
    statuses: StatusRegistry,
    relics: RelicRegistry,
    enemies: EnemyRegistry,
    rules: RulesConfig,
}

impl Catalogs {
    /// Bundled catalogs, with any file present in `dir` replacing its default
    fn load(dir: Option<&PathBuf>) -> Result<Self> {
        let mut catalogs = Catalogs {
            statuses: default_statuses(),
            relics: default_relics(),
            enemies: default_enemies(),
            rules: default_rules_config(),
        };
        let Some(dir) = dir else {
            return Ok(catalogs);
        };

        let path = dir.join("statuses.toml");
        if path.exists() {
            catalogs.statuses =
                load_status_configs(&path).with_context(|| format!("loading {}", path.display()))?;
        }
        let path = dir.join("relics.toml");
        if path.exists() {
            catalogs.relics = load_relic_configs(&path).with_context(|| format!("loading {}", path.display()))?;
        }
        let path = dir.join("enemies.toml");
        if path.exists() {
            catalogs.enemies = load_enemy_configs(&path).with_context(|| format!("loading {}", path.display()))?;
        }
        let path = dir.join("rules.toml");
        if path.exists() {
            catalogs.rules = load_rules_config(&path).with_context(|| format!("loading {}", path.display()))?;
        }
        Ok(catalogs)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.enemies.is_empty() {
        bail!("at least one --enemy is required");
    }

    let catalogs = Catalogs::load(cli.config_dir.as_ref())?;
    let rules = StandardRules::new(catalogs.rules.clone());

    let mut player = PlayerCombatant::new("player", "Ironclad", cli.health);
    let mut relics = Vec::new();
    for id in &cli.relics {
        catalogs
            .relics
            .obtain(id, &mut player, &mut relics)
            .with_context(|| format!("obtaining relic {id}"))?;
    }

    let mut deck = starter_deck();
    deck.shuffle(&mut ChaCha8Rng::seed_from_u64(cli.seed));

    let mut ctx = CombatContext::new(&mut player, &mut relics, &catalogs.statuses, &rules)
        .with_seed(cli.seed)
        .with_deck(deck)
        .with_enemy_catalog(&catalogs.enemies);
    for id in &cli.enemies {
        ctx.spawn_enemy(id).with_context(|| format!("spawning enemy {id}"))?;
    }

    let result = EncounterSimulation::run(&mut ctx, cli.max_turns).context("running encounter")?;

    if cli.json {
        println!("{}", ctx.events_json()?);
        return Ok(());
    }
    drop(ctx);

    println!("Outcome:       {:?}", result.outcome);
    println!("Turns:         {}", result.turns);
    println!("Cards played:  {}", result.cards_played);
    println!("Damage dealt:  {}", result.damage_dealt);
    println!("Damage taken:  {}", result.damage_taken);
    println!("Gold gained:   {}", result.gold_gained);
    println!("Player health: {}/{}", player.current_health(), player.max_health());
    Ok(())
}
