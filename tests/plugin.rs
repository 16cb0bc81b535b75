use bevy::prelude::*;

use snow2d::math::Vector;
use snow2d::{MpmPlugin, MpmState, SolverParams, create_box};

#[test]
fn plugin_advances_one_frame_per_update() {
    let params = SolverParams::default();
    let positions = create_box(Vector::new(0.45, 0.6), Vector::new(0.55, 0.7), 0.02);
    let count = positions.len();

    let mut app = App::new();
    app.add_plugins(MpmPlugin::new(params.clone()).with_positions(positions));

    app.update();
    app.update();

    let state = app.world().resource::<MpmState>();
    assert_eq!(state.particle_count(), count);
    assert_eq!(state.frame(), 2);
    assert_eq!(state.step_count(), 2 * params.substeps_per_frame() as u64);
    assert!(state.particles().iter().all(|p| p.velocity.y < 0.0));
    assert_eq!(app.world().resource::<SolverParams>(), &params);
}

#[test]
fn invalid_params_leave_the_app_without_state() {
    let mut app = App::new();
    app.add_plugins(MpmPlugin::new(SolverParams::default().with_dt(0.0)));
    app.update();

    assert!(app.world().get_resource::<MpmState>().is_none());
}
