//! Terminal stand-in for a platform speech engine.
//!
//! `speak` queues the same callbacks a browser engine would fire (start, one
//! boundary per word, end) and the reader loop drains them at the configured
//! pace, printing each highlighted word.

use anyhow::{Result, bail};
use readalong_core::highlight::spoken_words;
use readalong_core::speech::{CANCELED, EngineEvent, SpeechController, SpeechEngine, SpeechNotice, Utterance, Voice};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct ConsoleEngine {
    queue: VecDeque<(u64, EngineEvent)>,
    current: Option<u64>,
    voices: Vec<Voice>,
}

fn voice(name: &str, lang: &str, local_service: bool) -> Voice {
    Voice {
        name: name.to_string(),
        lang: lang.to_string(),
        local_service,
    }
}

impl ConsoleEngine {
    pub fn new() -> Self {
        Self {
            voices: vec![
                voice("Samantha", "en-US", true),
                voice("Daniel", "en-GB", true),
                voice("Google US English", "en-US", false),
                voice("Monica", "es-ES", true),
                voice("Jorge", "es-ES", true),
            ],
            ..Self::default()
        }
    }

    /// Next callback to deliver, oldest first.
    pub fn next_event(&mut self) -> Option<(u64, EngineEvent)> {
        let next = self.queue.pop_front();
        if matches!(next, Some((_, EngineEvent::End))) {
            self.current = None;
        }
        next
    }
}

impl SpeechEngine for ConsoleEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        if utterance.text.trim().is_empty() {
            bail!("nothing to speak");
        }
        debug!(
            id = utterance.id,
            lang = %utterance.lang,
            voice = ?utterance.voice.as_ref().map(|voice| voice.name.as_str()),
            "Console engine queued utterance"
        );
        self.current = Some(utterance.id);
        self.queue.push_back((utterance.id, EngineEvent::Start));
        for word in spoken_words(&utterance.text) {
            self.queue.push_back((
                utterance.id,
                EngineEvent::Boundary {
                    char_index: word.start_offset,
                    char_length: word.text.len(),
                },
            ));
        }
        self.queue.push_back((utterance.id, EngineEvent::End));
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(id) = self.current {
            self.queue.push_front((id, EngineEvent::Pause));
        }
    }

    fn resume(&mut self) {
        if let Some(id) = self.current {
            self.queue.push_front((id, EngineEvent::Resume));
        }
    }

    fn cancel(&mut self) {
        self.queue.clear();
        if let Some(id) = self.current.take() {
            self.queue.push_back((id, EngineEvent::Error(CANCELED.to_string())));
        }
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }
}

/// Delay between words for `words_per_minute` at `rate`.
pub fn word_delay(words_per_minute: u32, rate: f32) -> Duration {
    let per_minute = (words_per_minute.max(1) as f32 * rate.max(0.1)).max(1.0);
    Duration::from_secs_f32(60.0 / per_minute)
}

/// Drain engine callbacks until the utterance settles or `stop` is raised.
/// Returns the time spent speaking.
pub fn play(
    controller: &mut SpeechController<ConsoleEngine>,
    words_per_minute: u32,
    stop: &Arc<AtomicBool>,
) -> Duration {
    let started = Instant::now();
    let mut out = std::io::stdout();
    loop {
        if stop.load(Ordering::SeqCst) {
            controller.stop();
            info!("Speech interrupted");
            break;
        }
        let Some((id, event)) = controller.engine_mut().next_event() else {
            break;
        };
        let boundary = matches!(event, EngineEvent::Boundary { .. });
        controller.handle_event(id, event);
        if boundary {
            if let Some(word) = controller.highlighted_word() {
                let _ = write!(out, "{word} ");
                let _ = out.flush();
            }
            thread::sleep(word_delay(words_per_minute, controller.settings().rate));
        }
    }
    let _ = writeln!(out);
    for notice in controller.take_notices() {
        match notice {
            SpeechNotice::Finished => debug!("Speech finished"),
            SpeechNotice::Failed(reason) => warn!(%reason, "Speech failed"),
        }
    }
    started.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use readalong_core::Language;
    use readalong_core::speech::{SpeechSettings, SpeechStatus};

    fn controller() -> SpeechController<ConsoleEngine> {
        SpeechController::new(ConsoleEngine::new(), SpeechSettings::default())
    }

    #[test]
    fn picks_preferred_voice_for_language() {
        let mut controller = controller();
        let voice = controller.settings().voice.clone().expect("voice");
        assert_eq!(voice.name, "Daniel");
        controller.set_language(Language::Secondary);
        let voice = controller.settings().voice.clone().expect("voice");
        assert_eq!(voice.name, "Jorge");
    }

    #[test]
    fn play_walks_every_word_and_goes_idle() {
        let mut controller = controller();
        controller.speak("one two three");
        let stop = Arc::new(AtomicBool::new(false));
        play(&mut controller, 60_000, &stop);
        assert_eq!(controller.status(), SpeechStatus::Idle);
        assert!(controller.engine_mut().next_event().is_none());
    }

    #[test]
    fn stop_flag_cancels_before_any_word() {
        let mut controller = controller();
        controller.speak("one two three");
        let stop = Arc::new(AtomicBool::new(true));
        play(&mut controller, 60_000, &stop);
        assert_eq!(controller.status(), SpeechStatus::Idle);
        assert!(controller.highlight().is_none());
    }

    #[test]
    fn restart_supersedes_queued_events() {
        let mut controller = controller();
        controller.speak("alpha beta");
        let (id, event) = controller.engine_mut().next_event().expect("start");
        controller.handle_event(id, event);
        controller.set_rate(1.5);
        // The cancellation of the first utterance is swallowed.
        let (stale, event) = controller.engine_mut().next_event().expect("error");
        assert_eq!(event, EngineEvent::Error(CANCELED.to_string()));
        controller.handle_event(stale, event);
        let (id, event) = controller.engine_mut().next_event().expect("restart");
        assert_ne!(id, stale);
        assert_eq!(event, EngineEvent::Start);
    }

    #[test]
    fn word_delay_scales_with_rate() {
        assert_eq!(word_delay(60, 1.0), Duration::from_secs(1));
        assert!(word_delay(60, 2.0) < word_delay(60, 1.0));
    }
}
