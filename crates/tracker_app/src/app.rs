use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use tracker_core::{update, AppState, Effect, Msg, RecordFields, UserId};
use tracker_logging::{tracker_debug, tracker_info};

use crate::commands::{self, Command, HELP};
use crate::config;
use crate::effects::EffectRunner;
use crate::render::render;

enum Input {
    Line(String),
    Engine(Msg),
    Closed,
}

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = config::resolve_path(config_path);
    let config = config::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    tracker_logging::initialize(
        config.log.destination,
        config.log.level,
        &tracker_logging::log_file_path(config.log.file.as_deref()),
    );
    tracker_info!("Starting tracker (backend={})", config.backend.name());

    let (input_tx, input_rx) = mpsc::channel::<Input>();

    let engine_tx = input_tx.clone();
    let runner = EffectRunner::new(&config.backend, move |msg| {
        engine_tx.send(Input::Engine(msg)).is_ok()
    })
    .context("starting store backend")?;

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(Input::Closed);
    });

    let mut state = AppState::new();
    if let Some(user) = config.user {
        dispatch(&mut state, &runner, Msg::SignedIn(UserId::new(user)));
    }
    state.consume_dirty();
    print!("{}", render(&state.view()));
    prompt();

    while let Ok(input) = input_rx.recv() {
        match input {
            Input::Engine(msg) => dispatch(&mut state, &runner, msg),
            Input::Line(line) => {
                match commands::parse(&line, &state.view()) {
                    Ok(None) => {}
                    Ok(Some(Command::Dispatch(msg))) => dispatch(&mut state, &runner, msg),
                    Ok(Some(Command::RemoteInsert(fields))) => {
                        remote_insert(&state, &runner, fields)
                    }
                    Ok(Some(Command::Help)) => println!("{HELP}"),
                    Ok(Some(Command::Quit)) => break,
                    Err(err) => println!("{err}"),
                }
                // An empty line redraws the board.
                if !print_view(&mut state) && line.trim().is_empty() {
                    print!("{}", render(&state.view()));
                }
                prompt();
                continue;
            }
            Input::Closed => break,
        }
        if print_view(&mut state) {
            prompt();
        }
    }

    tracker_info!("Tracker stopped");
    Ok(())
}

fn dispatch(state: &mut AppState, runner: &EffectRunner, msg: Msg) {
    let fetched = match &msg {
        Msg::RecordsFetched { generation, .. } => Some(*generation),
        _ => None,
    };
    let stale = fetched.is_some() && state.records().in_flight() != fetched;

    let (next, effects) = update(std::mem::take(state), msg);
    *state = next;

    if let Some(generation) = fetched {
        if stale {
            tracker_debug!("Discarding stale fetch generation={}", generation.value());
        } else if effects
            .iter()
            .any(|effect| matches!(effect, Effect::FetchRecords { .. }))
        {
            tracker_debug!(
                "Fetch generation={} superseded, fetching again",
                generation.value()
            );
        }
    }
    runner.enqueue(effects);
}

fn remote_insert(state: &AppState, runner: &EffectRunner, fields: RecordFields) {
    let (Some(store), Some(user)) = (runner.memory_store(), state.user()) else {
        println!("`remote` needs the memory backend and a signed-in user");
        return;
    };
    let record = store.insert(user, fields);
    tracker_info!("Simulated remote insert id={}", record.id);
}

/// Prints the board if anything changed since the last render.
fn print_view(state: &mut AppState) -> bool {
    if !state.consume_dirty() {
        return false;
    }
    print!("{}", render(&state.view()));
    true
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
