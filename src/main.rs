use std::io::{self, BufWriter, Write};

use bevy::log::{LogPlugin, error, info};
use bevy::prelude::*;

use snow2d::diagnostics::{kinetic_energy, min_height};
use snow2d::math::Vector;
use snow2d::{MpmPlugin, MpmState, SnowPlasticity, SolverParams, create_box};

const DEFAULT_FRAMES: u64 = 60;

fn main() {
    let frames = match std::env::args().nth(1).map(|arg| arg.parse::<u64>()) {
        None => DEFAULT_FRAMES,
        Some(Ok(frames)) => frames,
        Some(Err(err)) => {
            eprintln!("usage: snow2d [frames]  ({err})");
            std::process::exit(2);
        }
    };

    let mut positions = create_box(Vector::new(0.5, 0.5), Vector::new(0.6, 0.6), 0.01);
    positions.extend(create_box(
        Vector::new(0.45, 0.4),
        Vector::new(0.55, 0.55),
        0.01,
    ));

    let mut app = App::new();
    app.add_plugins(LogPlugin::default()).add_plugins(
        MpmPlugin::new(SolverParams::default())
            .with_positions(positions)
            .with_snow_plasticity(SnowPlasticity::default()),
    );

    for _ in 0..frames {
        app.update();
        let Some(state) = app.world().get_resource::<MpmState>() else {
            error!("simulation state missing");
            std::process::exit(1);
        };
        if state.is_halted() {
            break;
        }
    }

    let Some(state) = app.world().get_resource::<MpmState>() else {
        std::process::exit(1);
    };
    info!(
        "finished {} frames ({} steps), lowest particle {:.4}, kinetic energy {:.4e}",
        state.frame(),
        state.step_count(),
        min_height(state.particles()).unwrap_or_default(),
        kinetic_energy(state.particles())
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Err(err) = state.dump(&mut out).and_then(|()| out.flush()) {
        error!("failed to write dump: {}", err);
        std::process::exit(1);
    }

    if state.halt_reason().is_some() {
        std::process::exit(1);
    }
}
