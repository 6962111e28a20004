//! Transcript fan-out.
//!
//! The session machine hands each finished [`Transcript`] to a
//! [`TranscriptDispatcher`], which forwards it to every live subscriber.
//! Consumers (text insertion, logging, a UI) subscribe once and receive
//! exactly one transcript per successful session.  A parallel feedback
//! channel carries coarse success/failure pulses for consumers that only
//! care about the outcome, not the text.

use tokio::sync::mpsc;

use crate::transcribe::Transcript;

/// Outcome pulse emitted once per completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// A transcript was produced and dispatched.
    Success,
    /// The session ended in an error.
    Failure,
}

// ---------------------------------------------------------------------------
// TranscriptDispatcher
// ---------------------------------------------------------------------------

/// Fan-out hub for transcripts and feedback pulses.
///
/// Subscribers that drop their receiver are pruned on the next publish;
/// publishing with zero subscribers is a silent no-op.
#[derive(Default)]
pub struct TranscriptDispatcher {
    transcript_subs: Vec<mpsc::UnboundedSender<Transcript>>,
    feedback_subs: Vec<mpsc::UnboundedSender<Feedback>>,
}

impl TranscriptDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new transcript consumer.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Transcript> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.transcript_subs.push(tx);
        rx
    }

    /// Register a new feedback consumer.
    pub fn subscribe_feedback(&mut self) -> mpsc::UnboundedReceiver<Feedback> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feedback_subs.push(tx);
        rx
    }

    /// Deliver `transcript` to every live subscriber, dropping closed ones.
    pub fn publish(&mut self, transcript: &Transcript) {
        self.transcript_subs
            .retain(|tx| tx.send(transcript.clone()).is_ok());
        log::debug!(
            "dispatched transcript ({} chars) to {} subscriber(s)",
            transcript.text.len(),
            self.transcript_subs.len()
        );
    }

    /// Deliver a success/failure pulse to every live feedback subscriber.
    pub fn notify(&mut self, feedback: Feedback) {
        self.feedback_subs.retain(|tx| tx.send(feedback).is_ok());
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.transcript_subs.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(text: &str) -> Transcript {
        Transcript {
            text: text.into(),
            request_id: None,
        }
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let mut dispatcher = TranscriptDispatcher::new();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();

        dispatcher.publish(&transcript("hello"));

        assert_eq!(a.try_recv().expect("a").text, "hello");
        assert_eq!(b.try_recv().expect("b").text, "hello");
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let mut dispatcher = TranscriptDispatcher::new();
        dispatcher.publish(&transcript("unheard"));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut dispatcher = TranscriptDispatcher::new();
        let rx = dispatcher.subscribe();
        let mut live = dispatcher.subscribe();
        drop(rx);

        dispatcher.publish(&transcript("still here"));

        assert_eq!(dispatcher.subscriber_count(), 1);
        assert_eq!(live.try_recv().expect("live").text, "still here");
    }

    #[test]
    fn each_publish_delivers_exactly_once() {
        let mut dispatcher = TranscriptDispatcher::new();
        let mut rx = dispatcher.subscribe();

        dispatcher.publish(&transcript("one"));

        assert_eq!(rx.try_recv().expect("first").text, "one");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn feedback_pulses_are_delivered() {
        let mut dispatcher = TranscriptDispatcher::new();
        let mut rx = dispatcher.subscribe_feedback();

        dispatcher.notify(Feedback::Success);
        dispatcher.notify(Feedback::Failure);

        assert_eq!(rx.try_recv().expect("first"), Feedback::Success);
        assert_eq!(rx.try_recv().expect("second"), Feedback::Failure);
    }
}
