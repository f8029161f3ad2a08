//! # Questgrid Command Line
//!
//! Generates one level, optionally plays a scripted run of actions on it, and
//! prints the result as an ASCII map or a JSON snapshot.

use clap::Parser;
use log::info;
use questgrid::generation::utils::create_rng;
use questgrid::{
    build_goal_plans, Biome, Direction, EntityKind, EnvHints, Feature, GameEvent,
    GenerationConfig, GoalStack, LayoutStyle, LevelDefinition, LevelSession, LevelSnapshot,
    LevelSpec, Position, QuestGridError, QuestGridResult, Scene, TimeOfDay,
};
use std::path::PathBuf;

/// Command line arguments for questgrid.
#[derive(Parser, Debug)]
#[command(name = "questgrid")]
#[command(about = "Seeded quest level generator with reachability-checked placement")]
#[command(version)]
struct Args {
    /// Random seed for level generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Biome (meadow, forest, town, beach, snow, desert, ruins, castle)
    #[arg(long)]
    biome: Option<String>,

    /// Layout style (crossroads, oasis, ring_road, ...)
    #[arg(long)]
    layout: Option<String>,

    /// Time of day (day, dawn, sunset, night)
    #[arg(long)]
    time: Option<String>,

    /// Comma-separated terrain features (path, water, trees, rocks, flowers)
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,

    /// Comma-separated theme tags
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Comma-separated goal plan (cure, key_and_door, lost_item, repair_bridge)
    #[arg(long)]
    goals: Option<String>,

    /// Free-form description mined for goal and environment hints
    #[arg(long)]
    prompt: Option<String>,

    /// JSON generation config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Actions to play after reset: n,s,e,w to move, i to interact, b1..b3 to buy
    #[arg(long)]
    script: Option<String>,

    /// Print the level snapshot as JSON instead of a map
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// One scripted player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptAction {
    Move(Direction),
    Interact,
    Buy(usize),
}

fn main() -> QuestGridResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level)?;
    info!("Starting questgrid v{}", questgrid::VERSION);

    let config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    let definition = build_definition(&args, &config)?;
    let mut session = LevelSession::new(definition, config)?;

    let mut log = Vec::new();
    if let Some(script) = &args.script {
        for action in parse_script(script)? {
            let events = match action {
                ScriptAction::Move(direction) => session.move_player(direction),
                ScriptAction::Interact => session.interact(),
                ScriptAction::Buy(index) => session.buy(index)?,
            };
            log.extend(events);
        }
    }

    let snapshot = session.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render_ascii(&snapshot));
        for event in &log {
            if let GameEvent::Message { text } = event {
                println!("> {}", text);
            }
        }
        print_status(&snapshot);
    }
    Ok(())
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> QuestGridResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        let level: tracing::Level = log_level
            .parse()
            .map_err(|_| QuestGridError::InvalidConfig(format!("unknown log level: {}", log_level)))?;
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        let level: log::LevelFilter = log_level
            .parse()
            .map_err(|_| QuestGridError::InvalidConfig(format!("unknown log level: {}", log_level)))?;
        env_logger::Builder::new()
            .filter_level(level)
            .format_target(false)
            .init();
    }

    Ok(())
}

/// Resolves CLI flags and prompt hints into a level definition.
///
/// Explicit flags win over prompt hints; anything left open is drawn from the
/// seeded RNG.
fn build_definition(args: &Args, config: &GenerationConfig) -> QuestGridResult<LevelDefinition> {
    let seed = args.seed.unwrap_or(12345);
    let mut rng = create_rng(seed);
    let prompt = args.prompt.as_deref().unwrap_or("");

    let mut hints = EnvHints::extract(prompt);
    if let Some(biome) = &args.biome {
        hints.biome = Some(biome.parse::<Biome>()?);
    }
    if let Some(layout) = &args.layout {
        hints.layout_style = Some(layout.parse::<LayoutStyle>()?);
    }
    if let Some(time) = &args.time {
        hints.time_of_day = Some(time.parse::<TimeOfDay>()?);
    }

    let mut spec = LevelSpec::designed(seed, Biome::Meadow, &hints, &mut rng);
    if !args.features.is_empty() {
        let features = args
            .features
            .iter()
            .map(|f| f.parse::<Feature>())
            .collect::<QuestGridResult<Vec<_>>>()?;
        spec = spec.with_features(features);
    }
    let mut tags = spec.theme_tags.clone();
    tags.insert(spec.biome.name().to_string());
    tags.extend(args.tags.iter().cloned());
    spec = spec.with_theme_tags(tags);

    let selection: Vec<GoalStack> = args.goals.iter().map(|raw| GoalStack::parse_plan(raw)).collect();
    let goals = build_goal_plans(prompt, &selection, 1, &mut rng)
        .into_iter()
        .next()
        .unwrap_or_default();

    info!(
        "Level {}: {} / {} with goals {:?}",
        seed,
        spec.biome,
        spec.layout_style,
        goals.goals()
    );
    Ok(LevelDefinition::with_defaults(spec, goals, config))
}

fn parse_script(script: &str) -> QuestGridResult<Vec<ScriptAction>> {
    script
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let action = match token.to_lowercase().as_str() {
                "n" => ScriptAction::Move(Direction::North),
                "s" => ScriptAction::Move(Direction::South),
                "e" => ScriptAction::Move(Direction::East),
                "w" => ScriptAction::Move(Direction::West),
                "i" => ScriptAction::Interact,
                other => match other.strip_prefix('b').and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) if n >= 1 => ScriptAction::Buy(n - 1),
                    _ => {
                        return Err(QuestGridError::InvalidAction(format!(
                            "unknown script action: {:?}",
                            token
                        )))
                    }
                },
            };
            Ok(action)
        })
        .collect()
}

fn entity_glyph(kind: EntityKind) -> char {
    match kind {
        EntityKind::Npc => 'N',
        EntityKind::Ingredient => 'i',
        EntityKind::LostItem => '?',
        EntityKind::MixStation => 'M',
        EntityKind::Chest => 'C',
        EntityKind::Key => 'k',
        EntityKind::Door => 'D',
        EntityKind::BridgeTile => 'H',
        EntityKind::BuildingEntrance => 'E',
        EntityKind::Pickup => '*',
    }
}

/// Draws the active scene, one character per tile.
fn render_ascii(snapshot: &LevelSnapshot) -> String {
    let bounds = snapshot.bounds;
    let outdoor = snapshot.scene == Scene::Outdoor;
    let mut out = String::new();
    for y in 0..bounds.height {
        for x in 0..bounds.width {
            let pos = Position::new(x, y);
            let entity = snapshot
                .entities
                .iter()
                .find(|e| e.position == pos)
                .filter(|_| outdoor);
            let glyph = if pos == snapshot.player {
                '@'
            } else if let Some(entity) = entity {
                entity_glyph(entity.kind)
            } else if outdoor && snapshot.water.contains(&pos) {
                '~'
            } else if snapshot.solid.contains(&pos) {
                '#'
            } else if outdoor && snapshot.path.contains(&pos) {
                ':'
            } else {
                '.'
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn print_status(snapshot: &LevelSnapshot) {
    let goals: Vec<&str> = snapshot.goals.iter().map(|g| g.name()).collect();
    println!(
        "seed {} | {} / {} | goals: {}",
        snapshot.spec.seed,
        snapshot.spec.biome,
        snapshot.spec.layout_style,
        goals.join(", ")
    );
    for (label, done) in &snapshot.steps {
        println!("  [{}] {}", if *done { 'x' } else { ' ' }, label);
    }
    println!(
        "gold {}g | reachable {} tiles | {}",
        snapshot.inventory.gold,
        snapshot.reachable.len(),
        if snapshot.won { "level won" } else { "in progress" }
    );
}
