
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use liturgy_reader::audio::{
    AudioOutput, CpalOutput, DeviceManager, DisconnectedOutput, MonotonicClock, PlaybackEngine, RenderEvent,
};
use liturgy_reader::cli::{CliApp, Commands, ParseError, ReaderCommand, StatusDisplay};
use liturgy_reader::config::ConfigManager;
use liturgy_reader::content::{ContentClient, GeminiClient};
use liturgy_reader::logging::ReaderLogger;
use liturgy_reader::navigation::DayNavigator;
use liturgy_reader::{PlaybackState, ReaderError, ReadingSet, ViewMode};
use log::{error, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// Main application controller that coordinates all components
pub struct AppController {
    content: ContentClient,
    engine: PlaybackEngine,
    navigator: DayNavigator,
    readings: Option<ReadingSet>,
    reflection: Option<String>,
    view_mode: ViewMode,
    config_manager: ConfigManager,
    device_manager: Option<DeviceManager>,
    output_device: Option<String>,
    render_events: Option<UnboundedReceiver<RenderEvent>>,
    logger: ReaderLogger,
}

impl AppController {
    /// Wire the Gemini client and the audio output from the loaded configuration
    pub fn new(config_manager: ConfigManager) -> Result<Self, ReaderError> {
        let config = config_manager.get_config().clone();
        let logger = ReaderLogger::new();

        let api_key = config.resolve_api_key()?;
        let gemini = Arc::new(GeminiClient::new(&config, api_key)?);
        let content = ContentClient::new(gemini.clone(), &config.reading_language, logger.clone());

        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let mut device_manager = None;
        let mut output_device = None;
        let output: Arc<dyn AudioOutput> =
            match Self::open_output(config.preferred_device.as_deref(), config.default_volume, event_sender) {
                Ok((output, manager)) => {
                    output_device = Some(output.device_name().to_string());
                    device_manager = Some(manager);
                    Arc::new(output)
                }
                Err(e) => {
                    warn!("No audio output available: {}", e);
                    Arc::new(DisconnectedOutput::new(e.to_string()))
                }
            };

        let engine = PlaybackEngine::new(
            gemini,
            output,
            Arc::new(MonotonicClock::new()),
            config.speech_sample_rate,
            logger.clone(),
        );

        let mut app = Self::with_parts(content, engine, DayNavigator::new(), config_manager, event_receiver, logger);
        app.device_manager = device_manager;
        app.output_device = output_device;
        Ok(app)
    }

    /// Assemble a controller from already-built collaborators
    pub fn with_parts(
        content: ContentClient,
        engine: PlaybackEngine,
        navigator: DayNavigator,
        config_manager: ConfigManager,
        render_events: UnboundedReceiver<RenderEvent>,
        logger: ReaderLogger,
    ) -> Self {
        Self {
            content,
            engine,
            navigator,
            readings: None,
            reflection: None,
            view_mode: ViewMode::Reading,
            config_manager,
            device_manager: None,
            output_device: None,
            render_events: Some(render_events),
            logger,
        }
    }

    fn open_output(
        preferred_device: Option<&str>,
        volume: f32,
        events: mpsc::UnboundedSender<RenderEvent>,
    ) -> Result<(CpalOutput, DeviceManager), ReaderError> {
        let mut device_manager = DeviceManager::new()?;
        device_manager.select_device_with_fallback(preferred_device)?;
        let output = CpalOutput::new(&device_manager, volume, events)?;
        Ok((output, device_manager))
    }

    /// Apply saved settings to the engine
    pub fn initialize(&mut self) -> Result<(), ReaderError> {
        let volume = self.config_manager.get_config().default_volume;
        self.engine.set_volume(volume)?;
        Ok(())
    }

    /// Fetch the readings of the navigator's current day.
    ///
    /// The previous passage's audio is dropped before the request goes out, so
    /// nothing from the old day can play under the new heading.
    pub async fn load_day(&mut self) -> Result<(), ReaderError> {
        self.view_mode = ViewMode::Reading;
        self.reflection = None;
        self.readings = None;
        self.engine.reset_for_new_text("");

        let set = self.content.fetch_reading_set(&self.navigator.label()).await?;

        let intro = &self.config_manager.get_config().gospel_intro;
        self.engine.reset_for_new_text(&set.narration_text(intro));
        self.readings = Some(set);
        Ok(())
    }

    async fn show_day(&mut self) -> Result<(), ReaderError> {
        println!("Loading the readings for {}...", self.navigator.label());
        self.load_day().await?;
        self.display_current_view();
        Ok(())
    }

    /// Toggle the gospel audio on the runtime so the prompt stays responsive
    pub fn toggle_playback(&self) -> JoinHandle<Result<PlaybackState, ReaderError>> {
        let engine = self.engine.clone();
        let state = engine.state();
        if matches!(state, PlaybackState::Idle | PlaybackState::Paused)
            && !engine.has_audio()
            && !engine.source_text().is_empty()
        {
            println!("{}", StatusDisplay::playback_notice(PlaybackState::Loading));
        }

        tokio::spawn(async move {
            let result = engine.toggle().await.map_err(ReaderError::from);
            match &result {
                Ok(state) => println!("{}", StatusDisplay::playback_notice(*state)),
                Err(e) => StatusDisplay::display_error(e),
            }
            result
        })
    }

    /// Execute a single interactive command
    pub async fn execute_command(&mut self, command: ReaderCommand) -> Result<(), ReaderError> {
        match command {
            ReaderCommand::Today => {
                self.navigator.go_to_today();
                self.show_day().await?;
            }
            ReaderCommand::Next => {
                self.navigator.next_day();
                self.show_day().await?;
            }
            ReaderCommand::Previous => {
                self.navigator.previous_day();
                self.show_day().await?;
            }
            ReaderCommand::Date(date) => {
                self.navigator.jump_to(date);
                self.show_day().await?;
            }
            ReaderCommand::Retry => {
                self.show_day().await?;
            }
            ReaderCommand::Read => {
                self.view_mode = ViewMode::Reading;
                self.display_current_view();
            }
            ReaderCommand::Reflect => {
                if self.readings.is_none() {
                    println!("No readings loaded. Type 'retry' to fetch them again.");
                    return Ok(());
                }
                self.view_mode = ViewMode::Reflection;
                self.ensure_reflection().await;
                self.display_current_view();
            }
            ReaderCommand::Toggle => {
                // The spawned task reports its own outcome
                let _ = self.toggle_playback();
            }
            ReaderCommand::Status => {
                println!("{}", self.day_summary());
                StatusDisplay::display_playback_status(&self.engine.status(), self.output_device.as_deref());
            }
            ReaderCommand::Volume(level) => {
                let volume = level as f32 / 100.0;
                self.engine.set_volume(volume)?;
                self.config_manager.set_volume(volume)?;
                println!("OK: Volume {}%", level);
            }
            ReaderCommand::Devices => {
                let devices = self.device_manager.as_ref().map(DeviceManager::list_devices).unwrap_or_default();
                StatusDisplay::display_devices(&devices, self.output_device.as_deref());
            }
            ReaderCommand::Exit => {}
        }

        Ok(())
    }

    /// Fetch the reflection once per loaded day; a failure caches the fixed text
    async fn ensure_reflection(&mut self) {
        if self.reflection.is_some() {
            return;
        }
        if let Some(set) = &self.readings {
            println!("Preparing a reflection...");
            let reflection = self.content.fetch_reflection_or_fallback(&set.gospel.text).await;
            self.reflection = Some(reflection);
        }
    }

    /// One-line summary of the displayed day and view
    fn day_summary(&self) -> String {
        let today = if self.navigator.is_today() { " (today)" } else { "" };
        format!("Day: {}{} · View: {}", self.navigator.short_label(), today, self.view_mode.as_str())
    }

    fn display_current_view(&self) {
        let Some(set) = &self.readings else {
            println!("No readings loaded. Type 'retry' to fetch them again.");
            return;
        };
        match (self.view_mode, &self.reflection) {
            (ViewMode::Reflection, Some(reflection)) => {
                StatusDisplay::display_day_header(set, &self.navigator.label());
                StatusDisplay::display_reflection(set, reflection);
            }
            _ => StatusDisplay::display_reading_set(set, &self.navigator.label()),
        }
    }

    /// Apply an output event to the engine and tell the user when it mattered
    fn handle_render_event(&self, event: RenderEvent) {
        if !self.engine.handle_render_event(&event) {
            return;
        }
        match event {
            RenderEvent::Finished { .. } => println!("\nThe gospel reading has finished"),
            RenderEvent::StreamError { message, .. } => {
                println!("\nPlayback paused: {}", message);
            }
        }
    }

    /// Run interactive mode
    pub async fn run_interactive_mode(&mut self) -> Result<(), ReaderError> {
        println!("Liturgy Reader v{}", env!("CARGO_PKG_VERSION"));
        println!("Type 'help' for available commands, 'exit' or 'quit' to quit.");
        println!();

        if let Err(e) = self.show_day().await {
            StatusDisplay::display_error(&e);
        }

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_flag_clone = shutdown_flag.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            println!("\nReceived interrupt signal. Shutting down gracefully...");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }) {
            warn!("Could not install the Ctrl-C handler: {}", e);
        }

        // Dedicated stdin thread so render events are handled while waiting for input
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line.trim().to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut render_events = self.render_events.take();
        let mut interval = tokio::time::interval(Duration::from_millis(100));
        let mut awaiting_input = false;

        loop {
            if shutdown_flag.load(Ordering::Relaxed) {
                break;
            }

            if !awaiting_input {
                print!("> ");
                let _ = std::io::Write::flush(&mut std::io::stdout());
                awaiting_input = true;
            }

            tokio::select! {
                biased;

                line = rx.recv() => {
                    awaiting_input = false;
                    let Some(line) = line else {
                        // EOF
                        println!();
                        break;
                    };
                    if line.is_empty() {
                        continue;
                    }
                    match CliApp::parse_command(&line) {
                        Ok(ReaderCommand::Exit) => {
                            println!("Goodbye!");
                            break;
                        }
                        Ok(command) => {
                            if let Err(e) = self.execute_command(command).await {
                                self.report_error(&e);
                            }
                        }
                        Err(ParseError::HelpRequested) => CliApp::display_help(),
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            println!("Type 'help' for available commands.");
                        }
                    }
                }

                Some(event) = recv_event(&mut render_events) => {
                    self.handle_render_event(event);
                    awaiting_input = false;
                }

                _ = interval.tick() => {}
            }
        }

        self.render_events = render_events;
        self.shutdown()
    }

    /// Run a single command and return
    pub async fn run_one_shot(&mut self, command: Commands) -> Result<(), ReaderError> {
        match command {
            Commands::Read { date } => {
                if let Some(date) = date {
                    self.navigator.jump_to(date);
                }
                self.load_day().await?;
                self.display_current_view();
            }
            Commands::Reflect { date } => {
                if let Some(date) = date {
                    self.navigator.jump_to(date);
                }
                self.load_day().await?;
                self.view_mode = ViewMode::Reflection;
                self.ensure_reflection().await;
                self.display_current_view();
            }
            Commands::Play { date } => {
                if let Some(date) = date {
                    self.navigator.jump_to(date);
                }
                self.load_day().await?;
                if let Some(set) = &self.readings {
                    StatusDisplay::display_day_header(set, &self.navigator.label());
                }
                println!("{}", StatusDisplay::playback_notice(PlaybackState::Loading));
                self.engine.toggle().await?;
                println!("{} (Ctrl-C stops)", StatusDisplay::playback_notice(PlaybackState::Playing));
                self.play_until_finished().await?;
            }
            Commands::Devices => {
                let devices = self.device_manager.as_ref().map(DeviceManager::list_devices).unwrap_or_default();
                StatusDisplay::display_devices(&devices, self.output_device.as_deref());
            }
        }
        Ok(())
    }

    async fn play_until_finished(&mut self) -> Result<(), ReaderError> {
        let mut render_events = self.render_events.take();
        while self.engine.state() == PlaybackState::Playing {
            tokio::select! {
                event = recv_event(&mut render_events) => match event {
                    Some(event) => self.handle_render_event(event),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }
        self.render_events = render_events;
        self.engine.stop()?;
        Ok(())
    }

    fn report_error(&self, error: &ReaderError) {
        let level = error.severity().log_level();
        log::log!(level, "{}", error);
        StatusDisplay::display_error(error);
    }

    /// Stop playback and persist settings
    pub fn shutdown(&mut self) -> Result<(), ReaderError> {
        println!("Shutting down...");

        if let Err(e) = self.engine.stop() {
            eprintln!("Warning: Error stopping playback: {}", e);
        }

        let volume = self.engine.volume();
        if let Err(e) = self.config_manager.update_config(|config| config.default_volume = volume) {
            eprintln!("Warning: Error saving configuration: {}", e);
        }

        let stats = self.logger.get_event_statistics();
        info!(
            "Session summary: {} synthesis requests, {} renders, {} stale events ignored",
            stats.synthesis_requests, stats.renders_started, stats.stale_events
        );
        Ok(())
    }
}

// Pending forever once the output side is gone, so select! falls through to other branches
async fn recv_event(receiver: &mut Option<UnboundedReceiver<RenderEvent>>) -> Option<RenderEvent> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

fn list_devices() -> Result<(), ReaderError> {
    let mut device_manager = DeviceManager::new()?;
    if let Err(e) = device_manager.select_default_device() {
        warn!("No default output device: {}", e);
    }
    let current = device_manager.current_device_name().unwrap_or(None);
    StatusDisplay::display_devices(&device_manager.list_devices(), current.as_deref());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ReaderError> {
    if let Err(e) = ReaderLogger::init() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let cli = CliApp::parse();

    // Listing devices needs neither the configuration nor an API key
    if let Some(Commands::Devices) = cli.command {
        if let Err(e) = list_devices() {
            StatusDisplay::display_simple_error(&e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    let mut app = match config_manager.map_err(ReaderError::from).and_then(AppController::new) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            StatusDisplay::display_simple_error(&e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.initialize() {
        warn!("Could not apply saved settings: {}", e);
    }

    let result = match cli.command {
        Some(command) => app.run_one_shot(command).await,
        None => app.run_interactive_mode().await,
    };

    if let Err(e) = result {
        StatusDisplay::display_simple_error(&e);
        std::process::exit(1);
    }

    info!("Application shutdown complete");
    Ok(())
}
