//! Actions behind the one-shot effects.

use tracing::{debug, error, info, warn};

use crate::config::{HostConfig, PauseMethod};
use crate::error::{EffectError, HostError};
use crate::host::{HostServices, TickFacts};
use crate::logging::routine;

/// Console commands applied once when hosting begins.
pub fn configure_commands(config: &HostConfig) -> Vec<String> {
    let mut commands = vec![
        format!("sleepAnnounceMode {}", config.sleep_announce_mode.as_arg()),
        format!(
            "moveBuildingPermission {}",
            config.move_building_permission.as_arg()
        ),
    ];
    if config.unban_all_enabled {
        commands.push("unbanAll".to_string());
    }
    commands
}

/// Issues every configure command; fails if any of them failed.
pub(crate) fn auto_configure(
    config: &HostConfig,
    services: &HostServices,
) -> Result<(), EffectError> {
    info!("Applying host configuration");
    let commands = configure_commands(config);
    let attempted = commands.len();
    let mut failed = 0;

    for command in &commands {
        match services.commands.execute(command) {
            Ok(()) => routine(config.log_level, &format!("Executed `{command}`")),
            Err(e) => {
                error!("{e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(EffectError::Commands { attempted, failed });
    }
    Ok(())
}

/// Pauses the session with the configured method.
///
/// Already paused counts as done. Not paused while time stands still (menus,
/// cutscenes) is not ready yet.
pub(crate) fn auto_pause(
    config: &HostConfig,
    services: &HostServices,
    facts: &TickFacts,
) -> Result<(), EffectError> {
    debug!(
        "Attempting auto-pause (paused: {}, time passing: {})",
        facts.paused, facts.time_passing
    );

    if facts.paused {
        debug!("Session already paused");
        return Ok(());
    }
    if !facts.time_passing {
        return Err(EffectError::NotReady("time is not passing".into()));
    }

    match config.pause_method {
        PauseMethod::Direct => {
            services.pause.pause_direct()?;
            services.notify("Game paused");
            info!("Auto-paused (direct)");
        }
        PauseMethod::Chatbox => {
            services.pause.request_pause_vote()?;
            info!("Auto-paused (pause vote)");
        }
    }
    Ok(())
}

/// Reads the invite code and hands it to the clipboard.
///
/// A missing code is not ready yet. Clipboard trouble does not fail the
/// capture: the code was obtained, and is logged for manual copying instead.
pub(crate) fn capture_invite_code(
    config: &HostConfig,
    services: &HostServices,
) -> Result<(), EffectError> {
    let source = services
        .invite_codes
        .as_ref()
        .ok_or(HostError::Unavailable("invite code source"))?;

    debug!("Looking for invite code");
    let code = source
        .try_get_invite_code()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| EffectError::NotReady("invite code not available yet".into()))?;

    let copied = match &services.clipboard {
        Some(clipboard) => clipboard.set_text(&code),
        None => Err(HostError::Unavailable("clipboard")),
    };
    if let Err(e) = copied {
        error!("Could not copy invite code: {e}");
        if config.show_manual_copy_message {
            warn!("Invite code: {code} (copy it manually)");
        }
    }

    if config.show_hud_notifications {
        services.notify(&format!("Invite code {code} copied to clipboard"));
    }
    routine(config.log_level, &format!("Invite code captured: {code}"));
    Ok(())
}
