//! App: terminal init and the frame loop (input → update → draw).

use crate::Args;
use crate::controller::GameController;
use crate::input::{Command, key_to_command};
use crate::theme::Theme;
use crate::ui::{self, RenderContext};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

pub struct App {
    controller: GameController,
    render: RenderContext,
    frame_duration: Duration,
    last_frame: Instant,
}

impl App {
    pub fn new(args: &Args, theme: Theme) -> Result<Self> {
        anyhow::ensure!(
            args.frame_rate.is_finite() && args.frame_rate > 0.0,
            "frame rate must be positive, got {}",
            args.frame_rate
        );
        let mut controller = GameController::from_seed(args.seed);
        if args.no_menu {
            controller.reset();
        }
        Ok(Self {
            controller,
            render: RenderContext::new(theme, !args.no_animation),
            frame_duration: Duration::from_secs_f64(1.0 / args.frame_rate),
            last_frame: Instant::now(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        self.last_frame = Instant::now();
        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        log::info!(
            "exiting in {:?} with score {}",
            self.controller.state(),
            self.controller.score()
        );

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let deadline = self.last_frame + self.frame_duration;
            let timeout = deadline.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key_to_command(key) {
                        Some(Command::Quit) => return Ok(()),
                        Some(Command::Game(action)) => self.controller.handle_input(action),
                        None => {}
                    }
                }
            }

            let now = Instant::now();
            let delta = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            self.controller.update(delta.as_secs_f64());
            if let Some(cascade) = self.controller.take_cascade() {
                self.render.flash(&cascade.cleared);
            }

            let snapshot = self.controller.snapshot();
            let render = &mut self.render;
            terminal.draw(|f| ui::draw(f, &snapshot, render, now))?;
        }
    }
}
