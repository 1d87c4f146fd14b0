// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Demo - Scripted terminal frontend

mod script;
mod submitter;

use haul_wizard_core::catalogs::{cmr_form, modify_transport_form, status_form};
use haul_wizard_core::{
    FieldCatalog, SettingsStore, WizardBridge, WizardController, WizardEvent, WizardSettings,
};
use std::process::ExitCode;
use std::sync::Arc;
use submitter::ConsoleSubmitter;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("haul_wizard_demo=info,haul_wizard_core=info")
            }),
        )
        .init();

    tracing::info!("Starting Haul Wizard demo v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let form = args.next().unwrap_or_else(|| "status".to_string());
    let script_path = args.next();

    match run(&form, script_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_catalog(form: &str) -> Result<FieldCatalog, String> {
    let catalog = match form {
        "cmr" => cmr_form(),
        "status" => status_form(),
        "modify-transport" => modify_transport_form(),
        other => return Err(format!("Unknown form: {}", other)),
    };
    catalog.map_err(|e| e.to_string())
}

fn load_settings() -> WizardSettings {
    match SettingsStore::new() {
        Ok(store) => store.get(),
        Err(e) => {
            tracing::warn!("Settings unavailable, using defaults: {}", e);
            WizardSettings::default()
        }
    }
}

fn run(form: &str, script_path: Option<&str>) -> Result<(), String> {
    let catalog = Arc::new(load_catalog(form)?);
    let steps = match script_path {
        Some(path) => script::load(path)?,
        None => script::builtin(&catalog),
    };

    let settings = load_settings();
    let controller =
        WizardController::from_settings(catalog.clone(), &settings).map_err(|e| e.to_string())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create Tokio runtime: {}", e))?;

    let bridge = WizardBridge::spawn(
        runtime.handle(),
        controller,
        Arc::new(ConsoleSubmitter::default()),
    );

    runtime.block_on(async move {
        let events = bridge.event_receiver();
        println!("== {} ==", catalog.title());

        for step in steps {
            if let Some(view) = bridge.view().await {
                tracing::debug!(page = view.page, fields = ?view.fields, "Current page");
            }
            step.send(&bridge).await;

            // Submissions report twice: once when started, once when settled
            let settled = loop {
                let Ok(event) = events.recv().await else {
                    return Err("Wizard stopped unexpectedly".to_string());
                };
                print_event(&event);
                if event != WizardEvent::Submitting {
                    break event;
                }
            };
            if matches!(settled, WizardEvent::Completed(_)) {
                break;
            }
        }

        if let Some(view) = bridge.view().await {
            println!("Final state: {:?}", view.state);
        }
        bridge.shutdown().await;
        Ok(())
    })
}

fn print_event(event: &WizardEvent) {
    match event {
        WizardEvent::AnswerRecorded { key } => println!("  set {}", key),
        WizardEvent::Moved {
            page, total_pages, ..
        } => println!("-> page {} of {}", page, total_pages),
        WizardEvent::Blocked { missing } => {
            println!("!! required fields missing: {}", missing.join(", "))
        }
        WizardEvent::ExitWizard => println!("<- left the wizard"),
        WizardEvent::Stayed => println!("   submission cancelled"),
        WizardEvent::Submitting => println!(".. submitting"),
        WizardEvent::Completed(ack) => println!(
            "ok submitted (reference {})",
            ack.reference.as_deref().unwrap_or("none")
        ),
        WizardEvent::SubmitFailed(err) => println!("!! submission failed: {}", err),
        WizardEvent::Rejected(reason) => println!("!! {}", reason),
    }
}
