use clap::Subcommand;
use restbell_core::{ExerciseStore, NewExercise};

#[derive(Subcommand)]
pub enum ExerciseAction {
    /// Add an exercise
    Add {
        /// Exercise name
        name: String,
        /// Number of sets
        #[arg(long, default_value = "3")]
        sets: u32,
        /// Work duration in seconds; makes the exercise time-based
        #[arg(long)]
        work: Option<u32>,
        /// Rest between sets in seconds
        #[arg(long, default_value = "90")]
        rest: u32,
        /// Delay before the next exercise in seconds
        #[arg(long, default_value = "0")]
        before_next: u32,
    },
    /// List exercises in workout order
    List,
    /// Show one exercise
    Show { id: i64 },
    /// Remove an exercise
    Remove { id: i64 },
    /// Link two exercises as a superset
    Pair { a: i64, b: i64 },
    /// Remove an exercise's superset link
    Unpair { id: i64 },
    /// Show the superset lead for an exercise
    Lead { id: i64 },
}

pub fn run(action: ExerciseAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ExerciseStore::open()?;
    match action {
        ExerciseAction::Add {
            name,
            sets,
            work,
            rest,
            before_next,
        } => {
            let record = store.add(&NewExercise {
                name,
                sets,
                time_based: work.is_some(),
                work_secs: work.unwrap_or(0),
                rest_secs: rest,
                time_before_next_secs: before_next,
            })?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        ExerciseAction::List => {
            let records = store.list()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        ExerciseAction::Show { id } => {
            let record = store.get(id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        ExerciseAction::Remove { id } => {
            store.remove(id)?;
            println!("{{\"removed\": {id}}}");
        }
        ExerciseAction::Pair { a, b } => {
            store.pair(a, b)?;
            println!("{{\"paired\": [{a}, {b}]}}");
        }
        ExerciseAction::Unpair { id } => {
            store.unpair(id)?;
            println!("{{\"unpaired\": {id}}}");
        }
        ExerciseAction::Lead { id } => {
            let lead = store.superset_lead(id)?;
            println!("{}", serde_json::to_string_pretty(&lead)?);
        }
    }
    Ok(())
}
