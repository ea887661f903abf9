// ── Sync session ──
//
// Owns one engine per resource type, the admin gate, and the realtime
// channel. The pump task routes each push message to the engine for its
// table; a lagged receiver or a reconnect triggers a forced refetch of
// every collection in use, so missed events cannot leave stale data.

use std::sync::Arc;

use folio_api::{ChannelState, RealtimeHandle, RealtimeMessage, RestClient, TransportConfig};
use strum::IntoEnumIterator;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::StaticAuthorizer;
use crate::config::SessionConfig;
use crate::engine::{EngineOptions, ResourceEngine};
use crate::error::CoreError;
use crate::model::{Project, Resource, ResourceKind, SocialLink, TechItem, WorkExperience};
use crate::realtime::ApplyOutcome;
use crate::remote::{HttpRemote, RemoteSource};

// ── ConnectionState ──────────────────────────────────────────────

/// Realtime connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    /// Realtime is disabled or has no usable URL; REST still works.
    Offline,
}

/// The network functions behind each resource type.
pub struct Remotes {
    pub projects: Arc<dyn RemoteSource<Project>>,
    pub tech_stack: Arc<dyn RemoteSource<TechItem>>,
    pub social_links: Arc<dyn RemoteSource<SocialLink>>,
    pub work_experience: Arc<dyn RemoteSource<WorkExperience>>,
}

impl Remotes {
    pub fn http(client: &RestClient) -> Self {
        Self {
            projects: Arc::new(HttpRemote::new(client.clone())),
            tech_stack: Arc::new(HttpRemote::new(client.clone())),
            social_links: Arc::new(HttpRemote::new(client.clone())),
            work_experience: Arc::new(HttpRemote::new(client.clone())),
        }
    }
}

struct Connection {
    cancel: CancellationToken,
    realtime: RealtimeHandle,
    tasks: Vec<JoinHandle<()>>,
}

// ── SyncSession ──────────────────────────────────────────────────

/// Entry point for consumers. Cheaply cloneable via `Arc<SessionInner>`.
#[derive(Clone)]
pub struct SyncSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    authorizer: Arc<StaticAuthorizer>,
    projects: ResourceEngine<Project>,
    tech_stack: ResourceEngine<TechItem>,
    social_links: ResourceEngine<SocialLink>,
    work_experience: ResourceEngine<WorkExperience>,
    connection_state: watch::Sender<ConnectionState>,
    connection: Mutex<Option<Connection>>,
}

impl SyncSession {
    /// Build a session talking to the REST surface in `config`. Does not
    /// connect the realtime channel; call [`connect()`](Self::connect).
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let mut transport = TransportConfig {
            timeout: config.timeout,
            ..TransportConfig::default()
        };
        if let Some(token) = &config.token {
            transport = transport.with_bearer_token(token.clone());
        }
        let client = RestClient::new(config.api_url.as_str(), &transport)?;
        Ok(Self::with_remotes(config, Remotes::http(&client)))
    }

    /// Build a session over caller-supplied network functions.
    pub fn with_remotes(config: SessionConfig, remotes: Remotes) -> Self {
        let authorizer = Arc::new(StaticAuthorizer::new(config.admin));
        let options = EngineOptions {
            fetch_timeout: config.fetch_timeout,
            echo_window: config.echo_window,
        };
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(SessionInner {
                projects: ResourceEngine::new(remotes.projects, authorizer.clone(), options),
                tech_stack: ResourceEngine::new(remotes.tech_stack, authorizer.clone(), options),
                social_links: ResourceEngine::new(
                    remotes.social_links,
                    authorizer.clone(),
                    options,
                ),
                work_experience: ResourceEngine::new(
                    remotes.work_experience,
                    authorizer.clone(),
                    options,
                ),
                config,
                authorizer,
                connection_state,
                connection: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn authorizer(&self) -> &Arc<StaticAuthorizer> {
        &self.inner.authorizer
    }

    // ── Engines ──────────────────────────────────────────────────

    pub fn projects(&self) -> &ResourceEngine<Project> {
        &self.inner.projects
    }

    pub fn tech_stack(&self) -> &ResourceEngine<TechItem> {
        &self.inner.tech_stack
    }

    pub fn social_links(&self) -> &ResourceEngine<SocialLink> {
        &self.inner.social_links
    }

    pub fn work_experience(&self) -> &ResourceEngine<WorkExperience> {
        &self.inner.work_experience
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Open the realtime channel and start the pump. A no-op when already
    /// connected. With realtime disabled the session goes `Offline`.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let mut connection = self.inner.connection.lock().await;
        if connection.is_some() {
            return Ok(());
        }

        let url = if self.inner.config.realtime_enabled {
            self.inner.config.resolved_realtime_url()
        } else {
            None
        };
        let Some(url) = url else {
            self.inner.connection_state.send_replace(ConnectionState::Offline);
            info!("realtime disabled, session offline");
            return Ok(());
        };

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let cancel = CancellationToken::new();
        let tables = ResourceKind::iter().map(|k| k.table().to_owned()).collect();
        let realtime = RealtimeHandle::connect(
            url,
            tables,
            self.inner.config.reconnect.clone(),
            cancel.clone(),
            self.inner.config.token.clone(),
        );

        let tasks = vec![
            tokio::spawn(realtime_pump(
                self.clone(),
                realtime.subscribe(),
                cancel.clone(),
            )),
            tokio::spawn(state_mirror(self.clone(), realtime.state(), cancel.clone())),
        ];

        *connection = Some(Connection {
            cancel,
            realtime,
            tasks,
        });
        info!("realtime session started");
        Ok(())
    }

    /// Stop the realtime channel and join background tasks. Cached data
    /// stays; see [`logout()`](Self::logout).
    pub async fn disconnect(&self) {
        let Some(connection) = self.inner.connection.lock().await.take() else {
            return;
        };
        connection.realtime.shutdown();
        connection.cancel.cancel();
        for handle in connection.tasks {
            let _ = handle.await;
        }
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Drop admin rights and every cached collection.
    pub async fn logout(&self) {
        self.inner.authorizer.set_admin(false);
        self.disconnect().await;
        self.reset_cache();
        info!("logged out, cache cleared");
    }

    /// Clear every collection and return all coordinators to `Idle`.
    pub fn reset_cache(&self) {
        self.inner.projects.reset();
        self.inner.tech_stack.reset();
        self.inner.social_links.reset();
        self.inner.work_experience.reset();
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Realtime routing ─────────────────────────────────────────

    /// Hand a push message to the engine owning its table.
    pub fn route(&self, message: &RealtimeMessage) -> Option<ApplyOutcome> {
        match message.table.parse::<ResourceKind>().ok()? {
            ResourceKind::Projects => self.inner.projects.on_message(message),
            ResourceKind::TechStack => self.inner.tech_stack.on_message(message),
            ResourceKind::SocialLinks => self.inner.social_links.on_message(message),
            ResourceKind::WorkExperience => self.inner.work_experience.on_message(message),
        }
    }

    /// Optimistic writes still waiting on the server, across all types.
    pub fn pending_mutations(&self) -> usize {
        self.inner.projects.mutator().pending().len()
            + self.inner.tech_stack.mutator().pending().len()
            + self.inner.social_links.mutator().pending().len()
            + self.inner.work_experience.mutator().pending().len()
    }

    /// Force-reload every collection that has been requested.
    pub async fn refetch_requested(&self) {
        refetch(&self.inner.projects).await;
        refetch(&self.inner.tech_stack).await;
        refetch(&self.inner.social_links).await;
        refetch(&self.inner.work_experience).await;
    }
}

async fn refetch<T: Resource>(engine: &ResourceEngine<T>) {
    if !engine.is_requested() {
        return;
    }
    if let Err(e) = engine.ensure_loaded(true).await {
        warn!(kind = %T::KIND, error = %e, "refetch failed");
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Route realtime messages into the engines until cancelled.
async fn realtime_pump(
    session: SyncSession,
    mut rx: broadcast::Receiver<Arc<RealtimeMessage>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Ok(message) => {
                    session.route(&message);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "realtime receiver lagged, refetching");
                    session.refetch_requested().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Mirror channel state into the session state; refetch after a reconnect.
async fn state_mirror(
    session: SyncSession,
    mut rx: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
) {
    // A reconnect can be coalesced away by the watch channel, so a second
    // `Connected` counts as one too.
    let mut dropped = false;
    let mut connected_before = false;
    loop {
        let state = rx.borrow_and_update().clone();
        let mapped = match state {
            ChannelState::Connecting => ConnectionState::Connecting,
            ChannelState::Connected => ConnectionState::Connected,
            ChannelState::Reconnecting { attempt } => {
                dropped = true;
                ConnectionState::Reconnecting { attempt }
            }
            ChannelState::Closed => ConnectionState::Disconnected,
        };
        session.inner.connection_state.send_replace(mapped.clone());

        if mapped == ConnectionState::Connected {
            if dropped || connected_before {
                info!("realtime reconnected, refetching");
                session.refetch_requested().await;
            }
            dropped = false;
            connected_before = true;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    #[tokio::test]
    async fn disabled_realtime_goes_offline() {
        let mut config = SessionConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        config.realtime_enabled = false;
        let session = SyncSession::new(config).unwrap();

        session.connect().await.unwrap();
        assert_eq!(*session.connection_state().borrow(), ConnectionState::Offline);
        session.disconnect().await;
    }

    #[test]
    fn route_ignores_unknown_tables() {
        let config = SessionConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let session = SyncSession::new(config).unwrap();
        let message = RealtimeMessage {
            event_type: folio_api::ChangeType::Insert,
            table: "comments".into(),
            new_record: None,
            old_record: None,
            commit_timestamp: None,
        };
        assert_eq!(session.route(&message), None);
    }

    async fn list_requests(server: &wiremock::MockServer) -> usize {
        server.received_requests().await.unwrap_or_default().len()
    }

    #[tokio::test]
    async fn back_to_back_connected_states_trigger_a_refetch() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        let config = SessionConfig::new(Url::parse(&server.uri()).unwrap());
        let session = SyncSession::new(config).unwrap();
        session.projects().ensure_loaded(false).await.unwrap();
        assert_eq!(list_requests(&server).await, 1);

        let (tx, rx) = watch::channel(ChannelState::Connecting);
        let cancel = CancellationToken::new();
        let mirror = tokio::spawn(state_mirror(session.clone(), rx, cancel.clone()));
        let mut mirrored = session.connection_state();

        tx.send_replace(ChannelState::Connected);
        mirrored
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();
        tokio::task::yield_now().await;
        assert_eq!(list_requests(&server).await, 1);

        // The Reconnecting in between was coalesced away.
        tx.send_replace(ChannelState::Connected);
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while list_requests(&server).await < 2 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        mirror.await.unwrap();
    }
}
