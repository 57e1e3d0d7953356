use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

use menagerie_engine::Command;

/// `None` signals the game interrupt (Esc).
pub type CommandSignal = Option<Command>;

#[derive(Debug)]
pub struct CrosstermHandler {
    handles: Option<(JoinHandle<()>, Arc<AtomicBool>)>,
}

impl Drop for CrosstermHandler {
    fn drop(&mut self) {
        if let Some((_handle, running_flag)) = self.handles.take() {
            running_flag.store(false, Ordering::Release);
        }
    }
}

impl CrosstermHandler {
    pub fn new(sender: &Sender<CommandSignal>, keybinds: &HashMap<KeyCode, Command>) -> Self {
        let flag = Arc::new(AtomicBool::new(true));
        let handle = Self::spawn(sender.clone(), flag.clone(), keybinds.clone());
        CrosstermHandler {
            handles: Some((handle, flag)),
        }
    }

    fn spawn(
        sender: Sender<CommandSignal>,
        flag: Arc<AtomicBool>,
        keybinds: HashMap<KeyCode, Command>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            loop {
                // Maybe stop thread.
                let running = flag.load(Ordering::Acquire);
                if !running {
                    break;
                }
                let event = match event::read() {
                    Ok(event) => event,
                    // Spurious io::Error: ignore.
                    Err(_) => continue,
                };
                let command_signal = match event {
                    // Escape pressed: send interrupt.
                    Event::Key(KeyEvent {
                        code: KeyCode::Esc,
                        kind: KeyEventKind::Press,
                        ..
                    }) => None,
                    // Candidate key pressed.
                    Event::Key(KeyEvent {
                        code: key,
                        kind: KeyEventKind::Press,
                        ..
                    }) => match keybinds.get(&key) {
                        // Binding found: send the command.
                        Some(&command) => Some(command),
                        // No binding: ignore.
                        None => continue,
                    },
                    // Don't care about other events: ignore.
                    _ => continue,
                };
                let _ = sender.send(command_signal);
            }
        })
    }
}
