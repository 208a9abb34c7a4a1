//! Widget session manager
//!
//! Owns the host document and at most one [`WidgetSession`] per container.
//! `initialize` always tears down the container's previous session before
//! injecting anything, so two widget scripts never coexist for one container.
//! Sessions for different containers are independent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use docsie_auth::{CONFIG_ATTRIBUTE, DOCSIE_SCRIPT_URL, DOCSIE_STYLESHEET_URL};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::{BootstrapConfig, Handshake, build_config_attribute, url_with_token};
use crate::error::{BootstrapError, Result};
use crate::host::{Host, NodeId, ScriptSpec};
use crate::lifecycle::{WidgetAction, WidgetEvent, WidgetPhase, handle_event};
use crate::signal::{LoadCell, LoadFuture, LoadSignal, SharedCell, lock};

/// Resources and metadata of one live widget mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSession {
    pub container: String,
    pub generation: u64,
    pub handshake: Handshake,
    pub stylesheet: NodeId,
    pub script: NodeId,
    /// Value written to `data-docsie`
    pub config_attribute: String,
}

pub struct WidgetBootstrap<H: Host> {
    host: H,
    sessions: HashMap<String, WidgetSession>,
    cells: HashMap<String, SharedCell>,
    next_generation: u64,
}

impl<H: Host> WidgetBootstrap<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            sessions: HashMap::new(),
            cells: HashMap::new(),
            next_generation: 1,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn session(&self, container: &str) -> Option<&WidgetSession> {
        self.sessions.get(container)
    }

    pub fn phase(&self, container: &str) -> WidgetPhase {
        self.cells
            .get(container)
            .map_or(WidgetPhase::Idle, |cell| lock(cell).phase)
    }

    /// Mount the widget into `container`.
    ///
    /// Any previous session for the container is cleaned up first; if it was
    /// still loading, its future resolves to [`BootstrapError::Superseded`].
    /// The returned future settles exactly once, when the host reports the
    /// script's outcome or when this session is itself superseded.
    pub fn initialize(
        &mut self,
        container: &str,
        config: &BootstrapConfig,
        handshake: Handshake,
    ) -> Result<LoadFuture> {
        config.validate()?;
        self.cleanup(container);

        let generation = self.bump_generation();
        let cell = self
            .cells
            .entry(container.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(LoadCell::default())))
            .clone();

        let (tx, rx) = oneshot::channel();
        {
            let mut state = lock(&cell);
            let (phase, action) = handle_event(state.phase, WidgetEvent::Initialize);
            debug_assert_eq!(action, WidgetAction::Inject, "cleanup leaves the container idle");
            state.phase = phase;
            state.generation = generation;
            state.pending = Some(tx);
        }

        match self.inject(container, config, handshake, generation, &cell) {
            Ok(session) => {
                info!(
                    container,
                    generation,
                    ?handshake,
                    authenticated = config.is_authenticated(),
                    "Docsie widget injected"
                );
                self.sessions.insert(container.to_owned(), session);
                Ok(LoadFuture::new(rx))
            }
            Err(e) => {
                warn!(container, error = %e, "Docsie widget injection failed");
                let mut state = lock(&cell);
                state.phase = WidgetPhase::Idle;
                state.pending = None;
                state.generation = self.bump_generation();
                Err(e)
            }
        }
    }

    /// Tear down the session for `container`.
    ///
    /// Removes the injected script and stylesheet and empties the container.
    /// The widget global's cleanup hook is shared by every mount on the page,
    /// so it only runs once the last live session is gone. Safe to call
    /// repeatedly or without a prior `initialize`; never fails.
    pub fn cleanup(&mut self, container: &str) {
        let stale_generation = self.bump_generation();
        let action = match self.cells.get(container) {
            Some(cell) => {
                let mut state = lock(cell);
                let (phase, action) = handle_event(state.phase, WidgetEvent::Cleanup);
                state.phase = phase;
                state.generation = stale_generation;
                let pending = state.pending.take();
                if action == WidgetAction::AbandonAndTeardown {
                    if let Some(tx) = pending {
                        let _ = tx.send(Err(BootstrapError::Superseded));
                    }
                }
                action
            }
            None => WidgetAction::Teardown,
        };

        let session = self.sessions.remove(container);
        if let Some(session) = &session {
            if self.host.is_attached(session.script) {
                self.host.remove_node(session.script);
            }
            if self.host.is_attached(session.stylesheet) {
                self.host.remove_node(session.stylesheet);
            }
        }

        self.host.clear_container(container);

        if session.is_some() {
            // The hook lives on the page-wide widget global; other mounts still need it
            if self.sessions.is_empty() {
                match self.host.invoke_widget_cleanup() {
                    Ok(true) => debug!(container, "widget cleanup hook invoked"),
                    Ok(false) => {}
                    Err(e) => warn!(container, error = %e, "error during Docsie cleanup"),
                }
            }
            debug!(container, ?action, "Docsie widget removed");
        }
    }

    /// Tear down every live session.
    pub fn cleanup_all(&mut self) {
        let containers: Vec<String> = self.sessions.keys().cloned().collect();
        for container in containers {
            self.cleanup(&container);
        }
    }

    fn inject(
        &mut self,
        container: &str,
        config: &BootstrapConfig,
        handshake: Handshake,
        generation: u64,
        cell: &SharedCell,
    ) -> Result<WidgetSession> {
        let stylesheet = self.host.append_stylesheet(DOCSIE_STYLESHEET_URL)?;

        let injected = self.inject_script(container, config, handshake, generation, cell);
        match injected {
            Ok((script, config_attribute)) => Ok(WidgetSession {
                container: container.to_owned(),
                generation,
                handshake,
                stylesheet,
                script,
                config_attribute,
            }),
            Err(e) => {
                self.host.remove_node(stylesheet);
                Err(e)
            }
        }
    }

    fn inject_script(
        &mut self,
        container: &str,
        config: &BootstrapConfig,
        handshake: Handshake,
        generation: u64,
        cell: &SharedCell,
    ) -> Result<(NodeId, String)> {
        if handshake == Handshake::Redirect
            && let Some(token) = config.token()
            && let Some(next) = url_with_token(&self.host.current_url(), token)
        {
            self.host.replace_url(&next)?;
            debug!(container, "token placed in page URL");
        }

        let config_attribute = build_config_attribute(config, handshake, &self.host.current_url());

        if !self.host.mark_widget_root(container) {
            debug!(container, "container not present; widget will pick its own root");
        }

        let spec = ScriptSpec {
            src: DOCSIE_SCRIPT_URL.to_owned(),
            is_async: true,
            config_attribute: (CONFIG_ATTRIBUTE.to_owned(), config_attribute.clone()),
            signal: LoadSignal::new(cell.clone(), generation, container),
        };
        let script = self.host.append_script(spec)?;
        Ok((script, config_attribute))
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

impl<H: Host> Drop for WidgetBootstrap<H> {
    fn drop(&mut self) {
        // Settle any pending futures rather than leaving them dangling.
        for cell in self.cells.values() {
            if let Some(tx) = lock(cell).pending.take() {
                let _ = tx.send(Err(BootstrapError::Superseded));
            }
        }
    }
}
