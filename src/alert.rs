//! Alert debouncing.
//!
//! Converts a stream of Fallen verdicts into notification commands without
//! re-triggering excessively. The message lifetime is an explicit deadline
//! checked by `tick`, not a timer callback, so all state mutation happens on
//! the loop that owns the debouncer.

use std::time::{Duration, Instant};

use crate::classify::Verdict;

/// Commands for the notification boundary (audio player / message surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationCommand {
    PlayAudio,
    ShowMessage { text: String, duration: Duration },
    ClearMessage,
}

/// Session-scoped alert state machine.
///
/// Scope is deliberately process-wide, not per-person: two people falling in
/// the same window produce a single alert pair.
pub struct AlertDebouncer {
    cooldown: Duration,
    message_duration: Duration,
    message_text: String,
    last_alert: Option<Instant>,
    message_visible: bool,
    clear_deadline: Option<Instant>,
}

impl AlertDebouncer {
    pub fn new(cooldown: Duration, message_duration: Duration) -> Self {
        Self {
            cooldown,
            message_duration,
            message_text: "Fall detected".to_string(),
            last_alert: None,
            message_visible: false,
            clear_deadline: None,
        }
    }

    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.message_text = text.into();
        self
    }

    pub fn message_visible(&self) -> bool {
        self.message_visible
    }

    /// Feed one verdict. Emits the audio + message pair on a fresh Fallen
    /// verdict; Normal and abstained verdicts never alert.
    ///
    /// While the message is visible, further Fallen verdicts are swallowed
    /// even when the cooldown has separately elapsed: visibility gating
    /// takes precedence over the cooldown timer.
    pub fn observe(&mut self, verdict: Option<Verdict>, now: Instant) -> Vec<NotificationCommand> {
        if verdict != Some(Verdict::Fallen) {
            return Vec::new();
        }
        if self.message_visible {
            return Vec::new();
        }
        let cooled_down = match self.last_alert {
            Some(last) => now.duration_since(last) >= self.cooldown,
            None => true,
        };
        if !cooled_down {
            return Vec::new();
        }

        self.last_alert = Some(now);
        self.message_visible = true;
        self.clear_deadline = Some(now + self.message_duration);

        vec![
            NotificationCommand::PlayAudio,
            NotificationCommand::ShowMessage {
                text: self.message_text.clone(),
                duration: self.message_duration,
            },
        ]
    }

    /// Expire the visible message once its deadline has passed.
    ///
    /// Returns `ClearMessage` exactly once per shown message.
    pub fn tick(&mut self, now: Instant) -> Option<NotificationCommand> {
        let deadline = self.clear_deadline?;
        if now < deadline {
            return None;
        }
        self.clear_deadline = None;
        self.message_visible = false;
        Some(NotificationCommand::ClearMessage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> AlertDebouncer {
        AlertDebouncer::new(Duration::from_secs(5), Duration::from_secs(3))
    }

    #[test]
    fn first_fallen_verdict_alerts() {
        let mut d = debouncer();
        let t0 = Instant::now();

        let commands = d.observe(Some(Verdict::Fallen), t0);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], NotificationCommand::PlayAudio);
        assert!(matches!(
            commands[1],
            NotificationCommand::ShowMessage { ref text, duration }
                if text == "Fall detected" && duration == Duration::from_secs(3)
        ));
        assert!(d.message_visible());
    }

    #[test]
    fn normal_and_abstained_verdicts_never_alert() {
        let mut d = debouncer();
        let t0 = Instant::now();

        assert!(d.observe(Some(Verdict::Normal), t0).is_empty());
        assert!(d.observe(None, t0).is_empty());
        assert!(!d.message_visible());
    }

    #[test]
    fn repeat_verdicts_within_window_are_swallowed() {
        let mut d = debouncer();
        let t0 = Instant::now();

        assert_eq!(d.observe(Some(Verdict::Fallen), t0).len(), 2);
        // 1s later: message still visible, nothing new.
        assert!(d
            .observe(Some(Verdict::Fallen), t0 + Duration::from_secs(1))
            .is_empty());
    }

    #[test]
    fn visibility_gates_even_after_cooldown_elapsed() {
        // Cooldown shorter than the message lifetime: the still-visible
        // message must win over the elapsed cooldown.
        let mut d = AlertDebouncer::new(Duration::from_secs(1), Duration::from_secs(10));
        let t0 = Instant::now();

        assert_eq!(d.observe(Some(Verdict::Fallen), t0).len(), 2);
        assert!(d
            .observe(Some(Verdict::Fallen), t0 + Duration::from_secs(2))
            .is_empty());
    }

    #[test]
    fn clear_fires_exactly_once_after_duration() {
        let mut d = debouncer();
        let t0 = Instant::now();

        d.observe(Some(Verdict::Fallen), t0);
        assert_eq!(d.tick(t0 + Duration::from_secs(1)), None);
        assert_eq!(
            d.tick(t0 + Duration::from_secs(3)),
            Some(NotificationCommand::ClearMessage)
        );
        assert_eq!(d.tick(t0 + Duration::from_secs(4)), None);
        assert!(!d.message_visible());
    }

    #[test]
    fn new_alert_after_clear_and_cooldown() {
        let mut d = debouncer();
        let t0 = Instant::now();

        d.observe(Some(Verdict::Fallen), t0);
        d.tick(t0 + Duration::from_secs(3));

        // Cooldown (5s from the first alert) not yet elapsed at t0+4.
        assert!(d
            .observe(Some(Verdict::Fallen), t0 + Duration::from_secs(4))
            .is_empty());

        // Both gates open at t0+5.
        let commands = d.observe(Some(Verdict::Fallen), t0 + Duration::from_secs(5));
        assert_eq!(commands.len(), 2);
    }
}
