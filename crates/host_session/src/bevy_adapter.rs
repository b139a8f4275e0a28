#![cfg(feature = "bevy")]

//! Drives the orchestrator from a Bevy app's `Update` schedule.
//!
//! The host game keeps [`EngineFacts`] current and writes [`HostEvent`]
//! messages; this plugin forwards both once per frame.

use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::*;

use crate::config::HostConfig;
use crate::host::{EngineEvent, HostServices, TickFacts};
use crate::orchestrator::Orchestrator;

#[derive(Message, Debug, Clone)]
pub struct HostEvent(pub EngineEvent);

#[derive(Resource, Debug, Clone, Copy, Default, Deref, DerefMut)]
pub struct EngineFacts(pub TickFacts);

/// Non-send resource holding the orchestrator.
pub struct HostSession(pub Orchestrator);

pub struct HostSessionPlugin {
    pub config: Arc<HostConfig>,
    pub services: HostServices,
    pub data_dir: PathBuf,
}

impl Plugin for HostSessionPlugin {
    fn build(&self, app: &mut App) {
        let orchestrator =
            Orchestrator::start(self.config.clone(), self.services.clone(), &self.data_dir);

        app.add_message::<HostEvent>()
            .init_resource::<EngineFacts>()
            .insert_non_send_resource(HostSession(orchestrator))
            .add_systems(Update, drive_host_session);
    }
}

fn drive_host_session(
    mut events: MessageReader<HostEvent>,
    facts: Res<EngineFacts>,
    mut session: NonSendMut<HostSession>,
) {
    let facts = facts.0;
    for HostEvent(event) in events.read() {
        session.0.on_event(event, &facts);
    }
    session.0.on_tick(&facts);
}
