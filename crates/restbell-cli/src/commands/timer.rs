use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Subcommand;
use tokio::sync::mpsc;

use restbell_core::{
    Clock, Config, Dispatcher, Event, ExerciseStore, IntervalSpec, SystemClock, Ticker,
    TimerEngine,
};

use crate::sinks::{LogNotifier, TerminalCue};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or resume) the timer for an exercise
    Start { id: i64 },
    /// Pause the timer
    Pause { id: i64 },
    /// Print the current timer state as JSON
    Status { id: i64 },
    /// Complete the current block (set done / skip rest)
    Complete { id: i64 },
    /// Jump to a specific interval unit (1-based)
    Jump { id: i64, index: u32 },
    /// Reset the timer to the first set
    Reset { id: i64 },
    /// Run a foreground 1 Hz loop until the timer stops
    Watch { id: i64 },
}

fn engine_key(id: i64) -> String {
    format!("engine:{id}")
}

/// Load the persisted live engine if one exists, else rebuild from the
/// exercise record's written-back progress.
fn load_engine(
    store: &ExerciseStore,
    config: &Config,
    id: i64,
) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let record = store.get(id)?;
    if let Ok(Some(json)) = store.kv_get(&engine_key(id)) {
        if let Ok(engine) = serde_json::from_str::<TimerEngine>(&json) {
            return Ok(engine);
        }
    }
    let spec = IntervalSpec::try_from(&record)?;
    Ok(TimerEngine::with_progress(
        spec,
        config.auto_behavior(),
        record.current_index,
        record.elapsed_ms,
    ))
}

/// Persist the live engine and write progress back to the exercise record
/// so reopening resumes mid-phase.
fn persist(
    store: &ExerciseStore,
    id: i64,
    engine: &TimerEngine,
) -> Result<(), Box<dyn std::error::Error>> {
    store.kv_set(&engine_key(id), &serde_json::to_string(engine)?)?;
    store.save_progress(id, engine.index(), engine.elapsed_ms())?;
    Ok(())
}

fn dispatcher(config: &Config) -> Dispatcher<TerminalCue, LogNotifier> {
    Dispatcher::new(
        TerminalCue,
        LogNotifier::default(),
        config.dispatch_settings(),
    )
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ExerciseStore::open()?;
    let config = Config::load_or_default();

    type Command = Box<dyn FnOnce(&mut TimerEngine, u64) -> Vec<Event>>;
    let (id, command): (i64, Command) = match action {
        TimerAction::Watch { id } => return watch(&store, &config, id),
        TimerAction::Start { id } => (id, Box::new(|e, now| e.start(now).into_iter().collect())),
        TimerAction::Pause { id } => (id, Box::new(|e, now| e.pause(now).into_iter().collect())),
        TimerAction::Status { id } => (id, Box::new(|_, _| Vec::new())),
        TimerAction::Complete { id } => {
            (id, Box::new(|e, now| e.complete(now).into_iter().collect()))
        }
        TimerAction::Jump { id, index } => (
            id,
            Box::new(move |e, _| e.reset_to(index).into_iter().collect()),
        ),
        TimerAction::Reset { id } => (id, Box::new(|e, _| e.reset().into_iter().collect())),
    };

    let mut engine = load_engine(&store, &config, id)?;
    let now = SystemClock.now_ms();

    // Each invocation is a process resume: catch up suspended wall time
    // before applying the command.
    let mut events = engine.reconcile(now);
    events.extend(command(&mut engine, now));

    let mut dispatcher = dispatcher(&config);
    for event in &events {
        dispatcher.handle(event, now);
    }

    persist(&store, id, &engine)?;
    println!("{}", serde_json::to_string_pretty(&engine.snapshot(now))?);
    Ok(())
}

fn watch(
    store: &ExerciseStore,
    config: &Config,
    id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Arc::new(SystemClock);
    let mut engine = load_engine(store, config, id)?;
    let mut dispatcher = dispatcher(config);

    let now = clock.now_ms();
    for event in engine.reconcile(now) {
        dispatcher.handle(&event, now);
    }
    if !engine.is_running() {
        persist(store, id, &engine)?;
        println!("{}", serde_json::to_string_pretty(&engine.snapshot(now))?);
        return Ok(());
    }

    let engine = Arc::new(Mutex::new(engine));
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Ticker::spawn(engine.clone(), clock.clone(), tx);
        let mut display = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                maybe_event = rx.recv() => match maybe_event {
                    Some(event) => dispatcher.handle(&event, clock.now_ms()),
                    // Ticker ended: the engine stopped running.
                    None => break,
                },
                _ = display.tick() => {
                    let now = clock.now_ms();
                    let snapshot = match engine.lock() {
                        Ok(engine) => engine.snapshot(now),
                        Err(_) => break,
                    };
                    if let Ok(json) = serde_json::to_string(&snapshot) {
                        println!("{json}");
                    }
                    if !snapshot.running {
                        break;
                    }
                }
            }
        }
        handle.stop().await;
    });

    let now = clock.now_ms();
    let engine = engine
        .lock()
        .map_err(|_| "timer state lock poisoned")?
        .clone();
    persist(store, id, &engine)?;
    println!("{}", serde_json::to_string_pretty(&engine.snapshot(now))?);
    Ok(())
}
