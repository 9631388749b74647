//! Event loop: one transport frame, one draw and one key poll per refresh.

use std::{path::PathBuf, time::Duration};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use retimbre::{
    runtime::{CpalOutput, FrameOutcome, PreviewPlayer, TransportController, Upload},
    synth::{Instrument, INSTRUMENTS},
};

use crate::ui::{self, spectrum::SpectrumAnalyzer, Message, View};

pub struct App {
    transport: TransportController<CpalOutput>,
    /// Plays the raw upload on its own stream, outside the session
    preview: PreviewPlayer<CpalOutput>,
    spectrum: SpectrumAnalyzer,
    /// Path being typed after pressing `o`
    input: Option<String>,
    message: Option<Message>,
    should_quit: bool,
}

impl App {
    pub fn new(
        transport: TransportController<CpalOutput>,
        preview: PreviewPlayer<CpalOutput>,
    ) -> Self {
        let spectrum = SpectrumAnalyzer::new(
            transport.config().window_size,
            transport.analysis_rate() as f32,
        );
        Self {
            transport,
            preview,
            spectrum,
            input: None,
            message: None,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            if self.transport.tick() == FrameOutcome::Ended {
                self.message = Some(Message::Info("finished".into()));
            }
            self.preview.sync(self.transport.previews());
            self.spectrum.update(self.transport.analysis_window());

            terminal.draw(|frame| ui::render(frame, &self.view()))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// Load and start playing a file, reporting the outcome in the status line.
    pub fn open(&mut self, path: PathBuf) {
        let upload = match Upload::from_path(&path) {
            Ok(upload) => upload,
            Err(err) => {
                self.message = Some(Message::Error(format!("{}: {err}", path.display())));
                return;
            }
        };
        let name = upload.name.clone();
        self.message = Some(match self.transport.upload(upload) {
            Ok(()) => Message::Info(format!("playing {name}")),
            Err(err) => Message::Error(format!("{name}: {err}")),
        });
    }

    fn handle_key(&mut self, key: KeyCode) {
        if let Some(input) = self.input.as_mut() {
            match key {
                KeyCode::Enter => {
                    let path = std::mem::take(input);
                    self.input = None;
                    if !path.trim().is_empty() {
                        self.open(PathBuf::from(path.trim()));
                    }
                }
                KeyCode::Esc => self.input = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('o') => self.input = Some(String::new()),
            KeyCode::Char('s') => {
                if self.transport.user_stop() {
                    self.message = Some(Message::Info("stopped".into()));
                }
            }
            KeyCode::Char('p') => self.toggle_preview(),
            KeyCode::Left => self.select(self.transport.instrument().prev()),
            KeyCode::Right => self.select(self.transport.instrument().next()),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                self.select(INSTRUMENTS[index]);
            }
            _ => {}
        }
    }

    fn toggle_preview(&mut self) {
        let Some(href) = self.transport.preview().map(|p| p.href().to_owned()) else {
            self.message = Some(Message::Error("nothing to preview".into()));
            return;
        };
        self.message = Some(match self.preview.toggle(self.transport.previews(), &href) {
            Ok(true) => Message::Info("previewing upload".into()),
            Ok(false) => Message::Info("preview stopped".into()),
            Err(err) => Message::Error(format!("preview: {err}")),
        });
    }

    fn select(&mut self, instrument: Instrument) {
        self.transport.set_instrument(instrument);
    }

    fn view(&self) -> View<'_> {
        View {
            state: self.transport.state(),
            can_stop: self.transport.can_stop(),
            instrument: self.transport.instrument(),
            estimate: self.transport.last_estimate(),
            voice: self.transport.voice(),
            source: self.transport.source_info(),
            preview: self.transport.preview().map(|p| p.href()),
            previewing: self.preview.is_playing(),
            window: self.transport.analysis_window(),
            spectrum: self.spectrum.data(),
            input: self.input.as_deref(),
            message: self.message.as_ref(),
        }
    }
}
