//! initrack - command-line front end for the encounter tracker

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use initrack::combat::{
    resolve_amount, AbilityScores, CombatEvent, Combatant, CombatantKind, Encounter, PERMANENT,
};
use initrack::db::{Database, EncounterStore};
use initrack::{Config, TrackerError};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initiative and combat-state tracker for tabletop encounters
#[derive(Parser, Debug)]
#[command(name = "initrack", version, about)]
struct Args {
    /// Config file (defaults to ./initrack.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database path, overriding the config file
    #[arg(short, long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new, empty encounter
    New {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List stored encounters
    List,
    /// Show the turn order of an encounter
    Show { encounter: String },
    /// Add a combatant
    Add {
        encounter: String,
        name: String,
        #[arg(short, long, default_value = "monster")]
        kind: String,
        #[arg(long)]
        hp: i32,
        #[arg(long, default_value_t = 10)]
        ac: i32,
        /// Initiative modifier (ignored when --dex is given)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        init_mod: i32,
        /// Dexterity score; attaches a stat block and derives the modifier
        #[arg(long)]
        dex: Option<i32>,
    },
    /// Remove a combatant
    Remove { encounter: String, combatant: String },
    /// Roll initiative for everyone and start
    Start {
        encounter: String,
        /// Keep the current order instead of rolling
        #[arg(long)]
        keep_order: bool,
    },
    /// Advance to the next turn
    Next { encounter: String },
    /// Step back to the previous turn
    Prev { encounter: String },
    /// Damage a combatant ("current" targets whoever is acting)
    Damage {
        encounter: String,
        combatant: String,
        /// Integer or dice notation such as 2d6+3
        amount: String,
    },
    /// Heal a combatant
    Heal {
        encounter: String,
        combatant: String,
        amount: String,
    },
    /// Add or remove conditions
    Condition {
        #[command(subcommand)]
        action: ConditionCommand,
    },
    /// Set or roll initiative
    Init {
        #[command(subcommand)]
        action: InitCommand,
    },
    /// Move the combatant at one position to another (1-based)
    Move {
        encounter: String,
        from: usize,
        to: usize,
    },
    /// Replace the free-form notes on an encounter
    Notes { encounter: String, text: String },
    /// Stop the encounter, keeping combatant state
    End { encounter: String },
    /// Restore every combatant and stop the encounter
    Reset { encounter: String },
    /// Delete a stored encounter
    Delete { encounter: String },
    /// Print an encounter as JSON
    Export { encounter: String },
    /// Store an encounter from a JSON file
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ConditionCommand {
    Add {
        encounter: String,
        combatant: String,
        name: String,
        /// Turns remaining; -1 for permanent
        #[arg(long, default_value_t = PERMANENT, allow_negative_numbers = true)]
        duration: i32,
        #[arg(long, default_value = "")]
        description: String,
    },
    Remove {
        encounter: String,
        combatant: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum InitCommand {
    Set {
        encounter: String,
        combatant: String,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
    /// Roll for one combatant, or everyone when omitted
    Roll {
        encounter: String,
        combatant: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(database) = args.database.clone() {
        config.database = Some(database);
    }
    init_tracing(&config);

    let db = Database::new(config.database.as_deref()).await?;
    let store = db.encounters();

    run(&store, args.command).await
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(store: &EncounterStore, command: Command) -> Result<()> {
    match command {
        Command::New { name, description } => {
            let encounter = Encounter::new(&name).with_description(&description);
            store.save(&encounter).await?;
            info!(encounter = %encounter.id(), "encounter created");
            println!("{}", encounter.id());
        }
        Command::List => {
            for summary in store.list().await? {
                println!("{}  {}", summary.id, summary.name);
            }
        }
        Command::Show { encounter } => {
            let encounter = load(store, &encounter).await?;
            print!("{}", render(&encounter));
        }
        Command::Add {
            encounter,
            name,
            kind,
            hp,
            ac,
            init_mod,
            dex,
        } => {
            let kind: CombatantKind = kind.parse()?;
            let mut combatant = Combatant::new(&name, kind, hp)?
                .with_armor_class(ac)
                .with_initiative_modifier(init_mod);
            if let Some(dexterity) = dex {
                combatant = combatant.with_stats(AbilityScores {
                    dexterity,
                    ..AbilityScores::default()
                });
            }
            mutate(store, &encounter, |enc| enc.add_combatant(combatant)).await?;
        }
        Command::Remove {
            encounter,
            combatant,
        } => {
            mutate(store, &encounter, |enc| {
                let id = combatant_id(enc, &combatant)?;
                enc.remove_combatant(&id).map(|_| ())
            })
            .await?;
        }
        Command::Start {
            encounter,
            keep_order,
        } => {
            mutate(store, &encounter, |enc| {
                if keep_order {
                    enc.start_as_ordered().map(|_| ())
                } else {
                    enc.start().map(|_| ())
                }
            })
            .await?;
        }
        Command::Next { encounter } => {
            mutate(store, &encounter, |enc| {
                enc.next_turn()
                    .map(|_| ())
                    .ok_or_else(|| TrackerError::precondition("encounter is not running"))
            })
            .await?;
        }
        Command::Prev { encounter } => {
            mutate(store, &encounter, |enc| {
                enc.previous_turn()
                    .map(|_| ())
                    .ok_or_else(|| TrackerError::precondition("encounter is not running"))
            })
            .await?;
        }
        Command::Damage {
            encounter,
            combatant,
            amount,
        } => {
            let amount = resolve_amount(&amount)?;
            mutate(store, &encounter, |enc| {
                if combatant.eq_ignore_ascii_case("current") {
                    enc.deal_damage_to_current(amount).map(|_| ())
                } else {
                    let id = combatant_id(enc, &combatant)?;
                    enc.deal_damage(&id, amount).map(|_| ())
                }
            })
            .await?;
        }
        Command::Heal {
            encounter,
            combatant,
            amount,
        } => {
            let amount = resolve_amount(&amount)?;
            mutate(store, &encounter, |enc| {
                let id = combatant_id(enc, &combatant)?;
                enc.heal(&id, amount).map(|_| ())
            })
            .await?;
        }
        Command::Condition { action } => match action {
            ConditionCommand::Add {
                encounter,
                combatant,
                name,
                duration,
                description,
            } => {
                mutate(store, &encounter, |enc| {
                    let id = combatant_id(enc, &combatant)?;
                    enc.add_condition(&id, &name, duration, &description)
                        .map(|_| ())
                })
                .await?;
            }
            ConditionCommand::Remove {
                encounter,
                combatant,
                name,
            } => {
                mutate(store, &encounter, |enc| {
                    let id = combatant_id(enc, &combatant)?;
                    if enc.remove_condition(&id, &name)? {
                        Ok(())
                    } else {
                        Err(TrackerError::NotFound {
                            entity: "condition",
                            id: name.clone(),
                        })
                    }
                })
                .await?;
            }
        },
        Command::Init { action } => match action {
            InitCommand::Set {
                encounter,
                combatant,
                value,
            } => {
                mutate(store, &encounter, |enc| {
                    let id = combatant_id(enc, &combatant)?;
                    enc.set_initiative(&id, value).map(|_| ())
                })
                .await?;
            }
            InitCommand::Roll {
                encounter,
                combatant,
            } => {
                mutate(store, &encounter, |enc| match &combatant {
                    Some(key) => {
                        let id = combatant_id(enc, key)?;
                        enc.roll_initiative(&id).map(|_| ())
                    }
                    None => {
                        enc.roll_all_initiative();
                        Ok(())
                    }
                })
                .await?;
            }
        },
        Command::Move {
            encounter,
            from,
            to,
        } => {
            if from == 0 || to == 0 {
                bail!("positions start at 1");
            }
            mutate(store, &encounter, |enc| enc.move_combatant(from - 1, to - 1)).await?;
        }
        Command::Notes { encounter, text } => {
            mutate(store, &encounter, |enc| {
                enc.set_notes(&text);
                Ok(())
            })
            .await?;
        }
        Command::End { encounter } => {
            mutate(store, &encounter, |enc| {
                enc.end();
                Ok(())
            })
            .await?;
        }
        Command::Reset { encounter } => {
            mutate(store, &encounter, |enc| {
                enc.reset();
                Ok(())
            })
            .await?;
        }
        Command::Delete { encounter } => {
            let id = load(store, &encounter).await?.id().to_string();
            store.delete(&id).await?;
            info!(encounter = %id, "encounter deleted");
        }
        Command::Export { encounter } => {
            let encounter = load(store, &encounter).await?;
            println!("{}", serde_json::to_string_pretty(&encounter)?);
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            let encounter = Encounter::from_json(&value)?;
            store.save(&encounter).await?;
            println!("{}", encounter.id());
        }
    }
    Ok(())
}

async fn load(store: &EncounterStore, key: &str) -> Result<Encounter> {
    match store.find(key).await? {
        Some(encounter) => Ok(encounter),
        None => Err(TrackerError::NotFound {
            entity: "encounter",
            id: key.to_string(),
        }
        .into()),
    }
}

/// Load, apply one operation, save, then print what happened
async fn mutate<F>(store: &EncounterStore, key: &str, op: F) -> Result<()>
where
    F: FnOnce(&mut Encounter) -> Result<(), TrackerError>,
{
    let mut encounter = load(store, key).await?;
    op(&mut encounter)?;
    store.save(&encounter).await?;

    for event in encounter.drain_events() {
        if let Some(line) = describe(&encounter, &event) {
            println!("{line}");
        }
    }
    print!("{}", render(&encounter));
    Ok(())
}

fn combatant_id(encounter: &Encounter, key: &str) -> Result<String, TrackerError> {
    encounter
        .find(key)
        .map(|c| c.id().to_string())
        .ok_or_else(|| TrackerError::combatant_not_found(key))
}

fn name_of<'a>(encounter: &'a Encounter, id: &'a str) -> &'a str {
    encounter.combatant(id).map(Combatant::name).unwrap_or(id)
}

fn describe(encounter: &Encounter, event: &CombatEvent) -> Option<String> {
    let who = event
        .combatant_id()
        .map(|id| name_of(encounter, id))
        .unwrap_or_default();
    let line = match event {
        CombatEvent::EncounterStarted { .. } => format!("Encounter started, {who} acts first"),
        CombatEvent::RoundStarted { round } => format!("-- Round {round} --"),
        CombatEvent::TurnStarted { round, .. } => format!("Round {round}: {who}'s turn"),
        CombatEvent::Damaged { amount, health, .. } => {
            format!("{who} takes {amount} damage ({health} HP left)")
        }
        CombatEvent::Healed { amount, health, .. } => {
            format!("{who} heals {amount} ({health} HP)")
        }
        CombatEvent::Downed { .. } => format!("{who} falls unconscious"),
        CombatEvent::Revived { .. } => format!("{who} is back on their feet"),
        CombatEvent::ConditionExpired { condition, .. } => {
            format!("{who} is no longer {condition}")
        }
        CombatEvent::InitiativeChanged { score, .. } => format!("{who} initiative {score}"),
        _ => return None,
    };
    Some(line)
}

fn render(encounter: &Encounter) -> String {
    let state = if encounter.is_active() {
        format!("round {}", encounter.round())
    } else {
        "not started".to_string()
    };
    let mut out = format!("{} ({state})\n", encounter.name());
    if !encounter.notes().is_empty() {
        out.push_str(&format!("  {}\n", encounter.notes()));
    }
    let current = encounter.current().map(Combatant::id);

    for (i, c) in encounter.combatants().enumerate() {
        let marker = if Some(c.id()) == current { ">" } else { " " };
        let conditions: Vec<String> = c
            .condition_list()
            .iter()
            .map(|cond| {
                if cond.is_permanent() {
                    cond.name.clone()
                } else {
                    format!("{}({})", cond.name, cond.remaining_duration)
                }
            })
            .collect();
        out.push_str(&format!(
            "{marker}{:>2}. {:<18} {:<8} init {:>3}  HP {:>3}/{:<3} {:<9} AC {:>2}  {}\n",
            i + 1,
            c.name(),
            c.kind().to_string(),
            c.initiative_score(),
            c.current_health(),
            c.max_health(),
            c.health_status().label(),
            c.armor_class(),
            conditions.join(", ")
        ));
    }
    out
}
