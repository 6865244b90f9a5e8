//! crossbeam-backed channel carrying [`Event`]s out of a pipeline run.
//!
//! Sending never fails: once the receiving side is gone, events are dropped.

use crossbeam_channel::{Receiver, Sender};

use super::{Event, GroupEvent, PipelineEvent, PipelinePhase, Progress};

/// Producer half handed to a pipeline run. Cheap to clone across workers.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    /// Deliver `event`, discarding it if nobody is listening.
    ///
    /// Blocks only on a full bounded channel.
    pub fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Send a status line
    pub fn status(&self, message: impl Into<String>) {
        self.send(Event::Status(message.into()));
    }

    /// Send a progress update for `phase`
    pub fn progress(&self, phase: PipelinePhase, current: usize, total: usize) {
        self.send(Event::Progress(Progress {
            phase,
            current,
            total,
        }));
    }

    /// Announce that the run moved to `phase`
    pub fn phase(&self, phase: PipelinePhase) {
        self.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
    }

    /// Stream a change to the near-duplicate groups
    pub fn group(&self, event: GroupEvent) {
        self.send(Event::Group(event));
    }
}

/// Consumer half, held by the UI or CLI.
pub struct EventReceiver {
    rx: Receiver<Event>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is dropped
    pub fn recv(&self) -> Option<Event> {
        self.rx.recv().ok()
    }

    /// Next event if one is queued
    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Blocking iterator that ends when the run drops its sender
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.rx.iter()
    }

    /// Everything queued right now, without waiting
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded pair; a slow consumer never stalls the pipeline.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(crossbeam_channel::unbounded())
    }

    /// Pair holding at most `capacity` undelivered events.
    ///
    /// A full channel blocks the sending worker, so only use this with a
    /// consumer that drains continuously.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        Self::wrap(crossbeam_channel::bounded(capacity))
    }

    fn wrap((tx, rx): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (EventSender { tx }, EventReceiver { rx })
    }
}

/// Sender whose receiver is already gone, for runs nobody watches.
pub fn null_sender() -> EventSender {
    EventChannel::new().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn progress_crosses_threads() {
        let (sender, receiver) = EventChannel::new();
        thread::spawn(move || sender.progress(PipelinePhase::Walking, 5, 0))
            .join()
            .unwrap();

        match receiver.recv() {
            Some(Event::Progress(p)) => {
                assert_eq!(p.phase, PipelinePhase::Walking);
                assert_eq!(p.current, 5);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn helpers_wrap_their_payloads() {
        let (sender, receiver) = EventChannel::new();
        sender.status("Collecting files...");
        sender.phase(PipelinePhase::Verifying);
        sender.group(GroupEvent::Merged {
            group_id: "group_0".into(),
            absorbed_id: "group_1".into(),
        });

        let events = receiver.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Event::Status(text) if text == "Collecting files..."));
        assert!(matches!(
            events[1],
            Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: PipelinePhase::Verifying
            })
        ));
        assert!(matches!(events[2], Event::Group(GroupEvent::Merged { .. })));
    }

    #[test]
    fn sending_without_a_receiver_is_harmless() {
        let sender = null_sender();
        sender.status("nobody listens");
        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn bounded_pair_holds_capacity_events() {
        let (sender, receiver) = EventChannel::bounded(2);
        sender.status("one");
        sender.status("two");

        assert_eq!(receiver.drain().len(), 2);
        assert!(receiver.try_recv().is_none());
    }
}
