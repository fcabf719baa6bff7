use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandSource};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub timestamp: u64,
    pub source: CommandSource,
    pub command: Command,
}

/// Ring buffer of recently dispatched commands
pub struct EventLog {
    events: VecDeque<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(500)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            next_id: 1,
            max_events,
        }
    }

    /// Log a command as an event
    pub fn log(&mut self, command: Command, source: CommandSource) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let event = Event {
            id: self.next_id,
            timestamp,
            source,
            command,
        };

        self.next_id += 1;
        self.events.push_back(event);

        // Trim old events
        while self.events.len() > self.max_events {
            self.events.pop_front();
        }
    }

    /// Get all events since a given ID
    pub fn get_events_since(&self, since_id: u64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.id > since_id)
            .cloned()
            .collect()
    }

    /// Get the latest event ID
    pub fn latest_id(&self) -> u64 {
        self.events.back().map(|e| e.id).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_and_old_events_are_trimmed() {
        let mut log = EventLog::with_capacity(2);
        log.log(Command::Start, CommandSource::Keyboard);
        log.log(Command::SetBpm(100), CommandSource::Keyboard);
        log.log(Command::Stop, CommandSource::CommandLine);
        assert_eq!(log.len(), 2);
        assert_eq!(log.latest_id(), 3);

        let since = log.get_events_since(2);
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].command, Command::Stop);
        assert_eq!(since[0].source, CommandSource::CommandLine);
    }

    #[test]
    fn empty_log_reports_zero() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.latest_id(), 0);
    }
}
