//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `crisisconnect_core` linkage.
//! - Walk one guest-to-signed-in journey against an in-memory backend.
//! - Keep output deterministic for quick local sanity checks.

use crisisconnect_core::{AppError, CrisisApp};
use std::process::ExitCode;

const DEMO_EMAIL: &str = "demo@crisisconnect.local";
const DEMO_PASSWORD: &str = "demo-password";

fn main() -> ExitCode {
    println!("crisisconnect_core ping={}", crisisconnect_core::ping());
    println!(
        "crisisconnect_core version={}",
        crisisconnect_core::core_version()
    );
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let app = CrisisApp::local_in_memory()?;

    let visit = app.navigate("/app")?;
    println!("guest /app -> {}", visit.route.path);

    app.auth()
        .sign_up(DEMO_EMAIL, DEMO_PASSWORD, Some("Demo User"))?;
    let visit = app.refresh_route()?;
    if let Some(visit) = visit {
        println!("signed in -> {}", visit.route.path);
    }

    let contacts = app.contacts().list_contacts()?;
    println!("contacts={}", contacts.len());

    let resources = app.resources().list_resources()?;
    println!("resources={}", resources.len());

    let nearby = app.nearby(None);
    if let Some(closest) = nearby.resources.first() {
        println!("nearest={} ({})", closest.name, closest.distance_label());
    }

    app.auth().sign_out()?;
    println!("signed_in={}", app.snapshot().is_signed_in());
    Ok(())
}
