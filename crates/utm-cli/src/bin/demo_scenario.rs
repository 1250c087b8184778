//! Golden Demo Scenario - deterministic conflict test.
//!
//! Runs a scripted scenario with two delivery requests whose direct paths
//! cross near the center of the operational area. It demonstrates the full
//! UTM loop in-process, with no server:
//!
//! 1. Two vehicles sit idle near the Hospital SENSITIVE zone.
//! 2. Two deliveries are submitted on crossing routes.
//! 3. The resolver detects the conflict and resolves it (altitude
//!    re-stratification, speed damping, or dynamic replan).
//! 4. Both missions commit conflict-free; one is walked through its full
//!    lifecycle to Delivered.
//!
//! Usage:
//!   cargo run -p utm-cli --bin demo_scenario

use clap::Parser;
use utm_core::{Config, Event, MissionPhase, Point4D, Service, Vehicle};

/// Golden Demo Scenario
#[derive(Parser, Debug)]
#[command(author, version, about = "Golden Demo: deterministic crossing-route scenario")]
struct Args {
    /// Print every event drained from the event queue, not just a summary.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║          UTM CORE: GOLDEN DEMO SCENARIO                        ║");
    println!("║          Deterministic Crossing-Route Conflict                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();

    let config = Config::default();
    let vehicles = vec![
        Vehicle::new(1, Point4D::new(37.760, -122.430, 0.0, 0.0)),
        Vehicle::new(2, Point4D::new(37.762, -122.428, 0.0, 0.0)),
    ];
    let service = Service::new(config, vehicles);
    let events = service.subscribe_events().expect("events claimed exactly once");

    println!("[SETUP] 2 vehicles idle near (37.76, -122.43)");
    println!();

    println!("[SCENARIO] Alpha: west → east across the operational area");
    println!("           Beta:  north → south, crossing Alpha's path near the center");
    println!();

    let alpha_pickup = (37.770, -122.440);
    let alpha_delivery = (37.750, -122.400);
    let beta_pickup = (37.790, -122.420);
    let beta_delivery = (37.730, -122.420);

    println!("[SUBMIT] Alpha: {alpha_pickup:?} -> {alpha_delivery:?}");
    let alpha_id = match service.submit_delivery(alpha_pickup, alpha_delivery) {
        Ok(id) => {
            println!("[SUBMIT] ✓ Alpha committed as mission {id}");
            id
        }
        Err(e) => {
            println!("[SUBMIT] ✗ Alpha rejected: {e}");
            return Ok(());
        }
    };

    println!("[SUBMIT] Beta:  {beta_pickup:?} -> {beta_delivery:?}");
    let beta_id = match service.submit_delivery(beta_pickup, beta_delivery) {
        Ok(id) => {
            println!("[SUBMIT] ✓ Beta committed as mission {id} (conflict, if any, was resolved)");
            id
        }
        Err(e) => {
            println!("[SUBMIT] ✗ Beta rejected: {e}");
            0
        }
    };
    println!();

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║  EVENT QUEUE                                                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    let mut conflict_count = 0u32;
    let mut mission_created_count = 0u32;
    while let Ok(event) = events.try_recv() {
        match &event {
            Event::ConflictDetected { conflict } => {
                conflict_count += 1;
                if args.verbose {
                    println!(
                        "  [CONFLICT] missions {} / {} at t={:.1}s (h_sep={:.1}m v_sep={:.1}m)",
                        conflict.mission_a, conflict.mission_b, conflict.t, conflict.h_sep, conflict.v_sep
                    );
                }
            }
            Event::MissionCreated { mission_id, vehicle_id } => {
                mission_created_count += 1;
                if args.verbose {
                    println!("  [COMMIT] mission {mission_id} assigned to vehicle {vehicle_id}");
                }
            }
            other => {
                if args.verbose {
                    println!("  [EVENT] {other:?}");
                }
            }
        }
    }
    println!(
        "  {conflict_count} conflict(s) observed during resolution, {mission_created_count} mission(s) committed"
    );
    println!();

    if beta_id != 0 {
        println!("╔═══════════════════════════════════════════════════════════════╗");
        println!("║  MISSION LIFECYCLE — walking Alpha through to delivery         ║");
        println!("╚═══════════════════════════════════════════════════════════════╝");
        for phase in [MissionPhase::EnRoutePickup, MissionPhase::Carrying, MissionPhase::Delivered] {
            service.mark_mission_phase(alpha_id, phase)?;
            println!("  [{alpha_id}] -> {phase:?}");
        }
    }

    println!();
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║  FLEET STATE                                                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    for vehicle in service.list_vehicles() {
        println!("  vehicle {} — {:?}", vehicle.id, vehicle.state);
    }
    for mission in service.list_missions() {
        println!(
            "  mission {} — vehicle {} — {:?} — {} waypoints",
            mission.id,
            mission.vehicle_id,
            mission.phase,
            mission.trajectory.waypoints.len()
        );
    }

    println!();
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║  DEMO COMPLETE                                                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");

    Ok(())
}
