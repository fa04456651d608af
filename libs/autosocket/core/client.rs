use crate::config::{ClientConfig, FaultInjector};
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::event_bus::EventBus;
use crate::listener::{spawn_dispatcher, ListenerId, Listeners, Topic};
use crate::queue::CommandQueue;
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// How often waiting phases re-check an externally cleared shutdown flag
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Internal command messages for the client task
#[derive(Debug)]
enum ClientCommand<K: CommandKind> {
    /// Start connecting (or retry now if waiting for backoff)
    Connect,
    /// Transmit if open, otherwise queue
    Send(Command<K>),
    /// Drop the live connection as if the server had closed it
    ForceClose,
    /// Close the connection and stop the task
    Shutdown,
}

/// Lifecycle notifications from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The very first connection opened
    Connected,
    /// A connection opened after an earlier one had been established
    Reconnected,
    /// The open connection was lost
    Disconnected,
    /// Waiting `delay` before reconnection attempt `attempt`
    Reconnecting { attempt: u32, delay: Duration },
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// Self-healing WebSocket client
///
/// Keeps one logical connection alive across network failures:
/// - Reconnects with capped exponential backoff, forever
/// - Queues the latest command per kind while disconnected and flushes
///   the queue as soon as a connection opens
/// - Decodes inbound frames into `E` and fans them out to listeners
///
/// All socket I/O happens on one tokio task that owns the connection and
/// the pending queue; listeners run on a dedicated dispatcher thread.
///
/// # Type Parameters
/// - `K`: closed set of outbound command kinds
/// - `E`: closed set of inbound events
pub struct AutoSocket<K, E>
where
    K: CommandKind,
    E: InboundEvent,
{
    /// Endpoint of the transport, for logs and diagnostics
    endpoint: String,
    /// Atomic connection state
    state: Arc<AtomicConnectionState>,
    /// Atomic metrics
    metrics: Arc<AtomicMetrics>,
    /// Command channel to the client task
    command_tx: mpsc::UnboundedSender<ClientCommand<K>>,
    /// Lifecycle event fan-out shared with the client task
    events: Arc<EventBus>,
    /// Listener registry shared with the dispatcher thread
    listeners: Listeners<E>,
    /// Fault injection switch shared with the client task
    fault_injector: Arc<FaultInjector>,
    /// Shutdown flag reference (true = running)
    shutdown_flag: Arc<AtomicBool>,
    /// Main task handle (tokio task for async I/O)
    task_handle: Option<tokio::task::JoinHandle<()>>,
    /// Dispatcher thread handle
    dispatcher_handle: Option<std::thread::JoinHandle<()>>,
}

impl<K, E> AutoSocket<K, E>
where
    K: CommandKind,
    E: InboundEvent,
{
    /// Create a client from configuration
    ///
    /// Spawns the client task and the dispatcher thread. No connection is
    /// attempted until [`AutoSocket::connect`] is called.
    ///
    /// This is called by the builder's `build()` method.
    pub(crate) fn new(config: ClientConfig) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SocketError::Configuration("AutoSocket must be built inside a tokio runtime".into())
        })?;

        let endpoint = config.endpoint().to_string();
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Disconnected));
        let metrics = Arc::new(AtomicMetrics::new());
        let shutdown_flag = Arc::clone(&config.shutdown_flag);
        let fault_injector = Arc::clone(&config.fault_injector);
        let listeners = Listeners::new();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let events = Arc::new(EventBus::new());
        let (frame_tx, frame_rx) = unbounded();

        let dispatcher_handle =
            spawn_dispatcher(listeners.clone(), frame_rx, Arc::clone(&shutdown_flag)).map_err(
                |e| SocketError::Configuration(format!("Failed to spawn dispatcher: {}", e)),
            )?;

        let task = ClientTask {
            config,
            state: Arc::clone(&state),
            metrics: Arc::clone(&metrics),
            queue: CommandQueue::new(),
            command_rx,
            events: Arc::clone(&events),
            frame_tx,
            initialized: false,
        };
        let task_handle = runtime.spawn(task.run());

        Ok(Self {
            endpoint,
            state,
            metrics,
            command_tx,
            events,
            listeners,
            fault_injector,
            shutdown_flag,
            task_handle: Some(task_handle),
            dispatcher_handle: Some(dispatcher_handle),
        })
    }

    /// Begin establishing the connection
    ///
    /// Returns immediately; progress is observable through
    /// [`AutoSocket::connection_state`] and lifecycle events. Call once at
    /// startup. While open this is a no-op; during a backoff wait it
    /// retries immediately.
    pub fn connect(&self) -> Result<()> {
        self.command(ClientCommand::Connect)
    }

    /// Send a command, or queue it until the next (re)connection
    ///
    /// While disconnected only the most recent command per kind is kept.
    ///
    /// # Errors
    /// - [`SocketError::InvalidCommand`] if an argument contains `:`
    /// - [`SocketError::ChannelSend`] if the client has shut down
    pub fn send_command<I, S>(&self, kind: K, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = Command::new(kind, args)?;
        self.send(command)
    }

    /// Send an already built command
    pub fn send(&self, command: Command<K>) -> Result<()> {
        self.command(ClientCommand::Send(command))
    }

    /// Subscribe a listener
    pub fn on<F>(&self, topic: Topic<E::Name>, handler: F) -> ListenerId
    where
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        self.listeners.on(topic, handler)
    }

    /// Unsubscribe a listener; unknown `(topic, id)` pairs are ignored
    pub fn off(&self, topic: Topic<E::Name>, id: ListenerId) -> bool {
        self.listeners.off(topic, id)
    }

    /// Shared listener registry
    ///
    /// Clones can be handed to collaborators that subscribe on their own.
    pub fn listeners(&self) -> &Listeners<E> {
        &self.listeners
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Check if the connection is fully established
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Check if the reconnect loop is running
    #[inline]
    pub fn is_reconnecting(&self) -> bool {
        self.state.is_reconnecting()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            frames_sent: self.metrics.frames_sent(),
            frames_received: self.metrics.frames_received(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state.get(),
        }
    }

    /// Try to receive a lifecycle event from the client's backlog (non-blocking)
    ///
    /// The backlog keeps the most recent [`EVENT_BACKLOG`] events.
    ///
    /// [`EVENT_BACKLOG`]: crate::event_bus::EVENT_BACKLOG
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.events.backlog().try_recv().ok()
    }

    /// Receive a lifecycle event from the backlog (blocking)
    pub fn recv_event(&self) -> std::result::Result<ClientEvent, crossbeam_channel::RecvError> {
        self.events.backlog().recv()
    }

    /// Receive a lifecycle event from the backlog, giving up after `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        match self.events.backlog().recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Subscribe to lifecycle events
    ///
    /// Each receiver gets its own copy of every event published after the
    /// call. Dropping it unsubscribes; the channel disconnects once the
    /// client is gone.
    pub fn events(&self) -> Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Fault-injection handle for manual testing
    pub fn debug_hooks(&self) -> DebugHooks<K> {
        DebugHooks {
            command_tx: self.command_tx.clone(),
            fault_injector: Arc::clone(&self.fault_injector),
        }
    }

    /// Get a reference to the shutdown flag
    ///
    /// Setting it to `false` stops the client before its next reconnection
    /// attempt.
    pub fn shutdown_flag(&self) -> &Arc<AtomicBool> {
        &self.shutdown_flag
    }

    /// Shutdown the client
    ///
    /// Closes the live connection, stops reconnecting and waits for the
    /// dispatcher thread to drain.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down client for {}", self.endpoint);

        self.shutdown_flag.store(false, Ordering::Release);
        let _ = self.command_tx.send(ClientCommand::Shutdown);

        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                error!("Client task ended abnormally: {}", e);
            }
        }

        // The task dropped its frame sender; the dispatcher exits once drained
        if let Some(handle) = self.dispatcher_handle.take() {
            let joined = tokio::task::spawn_blocking(move || handle.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                warn!("Dispatcher thread did not exit cleanly");
            }
        }

        info!("Client shut down");
        Ok(())
    }

    fn command(&self, command: ClientCommand<K>) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| SocketError::ChannelSend(e.to_string()))
    }
}

impl<K, E> Drop for AutoSocket<K, E>
where
    K: CommandKind,
    E: InboundEvent,
{
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            self.shutdown_flag.store(false, Ordering::Release);
            let _ = self.command_tx.send(ClientCommand::Shutdown);
        }
    }
}

/// Manual fault injection
///
/// `close_connection` drops the live connection and makes every following
/// attempt fail; `reconnect` lifts the failure and connects right away.
/// Useful for exercising offline behaviour by hand.
#[derive(Clone)]
pub struct DebugHooks<K: CommandKind> {
    command_tx: mpsc::UnboundedSender<ClientCommand<K>>,
    fault_injector: Arc<FaultInjector>,
}

impl<K: CommandKind> DebugHooks<K> {
    pub fn close_connection(&self) -> Result<()> {
        self.fault_injector.set_fail_connections(true);
        self.command_tx
            .send(ClientCommand::ForceClose)
            .map_err(|e| SocketError::ChannelSend(e.to_string()))
    }

    pub fn reconnect(&self) -> Result<()> {
        self.fault_injector.set_fail_connections(false);
        self.command_tx
            .send(ClientCommand::Connect)
            .map_err(|e| SocketError::ChannelSend(e.to_string()))
    }

    /// Toggle injected failures without touching the live connection
    pub fn set_fail_connections(&self, fail: bool) {
        self.fault_injector.set_fail_connections(fail);
    }

    /// Close the live connection without injecting failures
    pub fn force_close(&self) -> Result<()> {
        self.command_tx
            .send(ClientCommand::ForceClose)
            .map_err(|e| SocketError::ChannelSend(e.to_string()))
    }
}

/// Phases of the client task state machine
enum Phase {
    /// Nothing to do until `connect()`
    Idle,
    /// Opening a connection; `attempt` is 0 for the initial `connect()`
    Establishing { attempt: u32 },
    /// Connection established
    Open(Connection),
    /// Waiting before reconnection attempt `attempt`
    Backoff { attempt: u32 },
    /// Shut down
    Stopped,
}

/// Outcome of waiting on an establishment attempt
enum Established {
    Opened(Connection),
    Failed(String),
    Shutdown,
}

/// State owned by the client task
struct ClientTask<K: CommandKind> {
    config: ClientConfig,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    queue: CommandQueue<K>,
    command_rx: mpsc::UnboundedReceiver<ClientCommand<K>>,
    events: Arc<EventBus>,
    frame_tx: Sender<WsMessage>,
    /// Set after the first successful connection
    initialized: bool,
}

impl<K: CommandKind> ClientTask<K> {
    /// Main client task loop
    async fn run(mut self) {
        let mut phase = Phase::Idle;

        loop {
            phase = match phase {
                Phase::Idle => self.idle().await,
                Phase::Establishing { attempt } => self.establish(attempt).await,
                Phase::Open(connection) => self.serve(connection).await,
                Phase::Backoff { attempt } => self.backoff(attempt).await,
                Phase::Stopped => break,
            };
        }

        self.state.set(ConnectionState::Disconnected);
        info!("Client task exiting");
    }

    fn is_running(&self) -> bool {
        self.config.shutdown_flag.load(Ordering::Acquire)
    }

    fn emit(&self, event: ClientEvent) {
        self.events.publish(event);
    }

    fn enqueue(&mut self, command: Command<K>) {
        debug!("Queueing {} while disconnected", command.kind.as_str());
        if self.queue.push(command).is_some() {
            debug!("Superseded an older pending command of the same kind");
        }
    }

    /// Wait for `connect()`, queueing commands meanwhile
    async fn idle(&mut self) -> Phase {
        self.state.set(ConnectionState::Disconnected);

        loop {
            if !self.is_running() {
                return Phase::Stopped;
            }

            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::Connect) => return Phase::Establishing { attempt: 0 },
                    Some(ClientCommand::Send(command)) => self.enqueue(command),
                    Some(ClientCommand::ForceClose) => debug!("No connection to close"),
                    Some(ClientCommand::Shutdown) | None => return Phase::Stopped,
                },
                _ = tokio::time::sleep(SHUTDOWN_POLL_INTERVAL) => {}
            }
        }
    }

    /// Run one establishment attempt to completion
    async fn establish(&mut self, attempt: u32) -> Phase {
        if !self.is_running() {
            return Phase::Stopped;
        }

        self.state.set(if attempt == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        });

        match self.attempt_connection().await {
            Established::Opened(connection) => self.on_open(connection).await,
            Established::Failed(reason) => {
                warn!(
                    "Connection attempt {} to {} failed: {}",
                    attempt,
                    self.config.endpoint(),
                    reason
                );
                Phase::Backoff { attempt: attempt + 1 }
            }
            Established::Shutdown => Phase::Stopped,
        }
    }

    /// Open a connection within the configured timeout
    ///
    /// Commands arriving meanwhile are queued; a shutdown abandons the
    /// attempt.
    async fn attempt_connection(&mut self) -> Established {
        if self.config.fault_injector.fails_connections() {
            return Established::Failed("injected connection failure".into());
        }

        let transport = Arc::clone(&self.config.transport);
        let timeout = self.config.options.connection_timeout;
        let open = tokio::time::timeout(timeout, async move { transport.open().await });
        tokio::pin!(open);

        loop {
            tokio::select! {
                result = &mut open => {
                    return match result {
                        Ok(Ok(connection)) => Established::Opened(connection),
                        Ok(Err(e)) => Established::Failed(e.to_string()),
                        Err(_) => {
                            let elapsed = format!("no connection after {:?}", timeout);
                            Established::Failed(SocketError::Timeout(elapsed).to_string())
                        }
                    };
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::Send(command)) => self.enqueue(command),
                    Some(ClientCommand::Connect) => {
                        debug!("Connection attempt already in progress")
                    }
                    Some(ClientCommand::ForceClose) => debug!("No open connection to close"),
                    Some(ClientCommand::Shutdown) | None => return Established::Shutdown,
                }
            }
        }
    }

    /// Announce the new connection and flush pending commands
    async fn on_open(&mut self, mut connection: Connection) -> Phase {
        info!("Connected to {}", self.config.endpoint());
        self.state.set(ConnectionState::Open);
        self.config.reconnect_strategy.reset();

        if self.initialized {
            self.metrics.increment_reconnects();
            self.emit(ClientEvent::Reconnected);
        } else {
            self.initialized = true;
            self.emit(ClientEvent::Connected);
        }

        let pending = self.queue.drain();
        if !pending.is_empty() {
            debug!("Flushing {} pending commands", pending.len());
        }

        let mut remaining = pending.into_iter();
        while let Some(command) = remaining.next() {
            if let Err(e) = connection.sink.send(command.to_message()).await {
                warn!("Flush interrupted: {}", e);
                self.queue.restore(std::iter::once(command).chain(remaining));
                return self.on_lost();
            }
            self.metrics.increment_sent();
        }

        Phase::Open(connection)
    }

    /// Pump frames and commands until the connection goes away
    async fn serve(&mut self, mut connection: Connection) -> Phase {
        loop {
            if !self.is_running() {
                let _ = connection.sink.close().await;
                return Phase::Stopped;
            }

            tokio::select! {
                frame = connection.stream.next() => match frame {
                    Some(Ok(frame)) => {
                        self.metrics.increment_received();
                        if self.frame_tx.send(frame).is_err() {
                            warn!("Dispatcher is gone, dropping frame");
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Connection error: {}", e);
                        return self.on_lost();
                    }
                    None => {
                        let closed = SocketError::ConnectionClosed("stream ended by peer".into());
                        warn!("{}", closed);
                        return self.on_lost();
                    }
                },
                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::Send(command)) => {
                        let frame = command.to_message();
                        match connection.sink.send(frame).await {
                            Ok(()) => self.metrics.increment_sent(),
                            Err(e) => {
                                warn!(
                                    "Send failed, keeping {} for the next flush: {}",
                                    command.kind.as_str(),
                                    e
                                );
                                self.enqueue(command);
                                return self.on_lost();
                            }
                        }
                    }
                    Some(ClientCommand::Connect) => debug!("Already connected"),
                    Some(ClientCommand::ForceClose) => {
                        info!("Force-closing connection");
                        let _ = connection.sink.close().await;
                        return self.on_lost();
                    }
                    Some(ClientCommand::Shutdown) | None => {
                        let _ = connection.sink.close().await;
                        return Phase::Stopped;
                    }
                },
                _ = tokio::time::sleep(SHUTDOWN_POLL_INTERVAL) => {}
            }
        }
    }

    /// Transition after an unexpected loss of the open connection
    fn on_lost(&mut self) -> Phase {
        self.state.set(ConnectionState::Disconnected);
        self.emit(ClientEvent::Disconnected);

        if self.is_running() {
            Phase::Backoff { attempt: 1 }
        } else {
            Phase::Stopped
        }
    }

    /// Wait out the backoff delay, then retry
    async fn backoff(&mut self, attempt: u32) -> Phase {
        if !self.is_running() {
            return Phase::Stopped;
        }

        let delay = match self.config.reconnect_strategy.next_delay(attempt) {
            Some(delay) => delay,
            None => {
                warn!("Reconnection strategy exhausted, waiting for connect()");
                return Phase::Idle;
            }
        };

        self.state.set(ConnectionState::Reconnecting);
        self.emit(ClientEvent::Reconnecting { attempt, delay });
        info!("Reconnecting in {:?} (attempt {})", delay, attempt);

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            if !self.is_running() {
                debug!("Shutdown flag set during reconnection delay");
                return Phase::Stopped;
            }

            tokio::select! {
                _ = &mut sleep => return Phase::Establishing { attempt },
                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::Send(command)) => self.enqueue(command),
                    Some(ClientCommand::Connect) => {
                        debug!("connect() during backoff, retrying now");
                        return Phase::Establishing { attempt };
                    }
                    Some(ClientCommand::ForceClose) => debug!("Reconnect already in progress"),
                    Some(ClientCommand::Shutdown) | None => return Phase::Stopped,
                },
                _ = tokio::time::sleep(SHUTDOWN_POLL_INTERVAL) => {}
            }
        }
    }
}
