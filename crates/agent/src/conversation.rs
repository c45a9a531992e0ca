use std::collections::VecDeque;

use autostream_core::domain::conversation::{ConversationTurn, Intent};

/// Bounded turn buffer plus a monotonic count of processed messages.
///
/// The buffer keeps the last `memory_window` turns; prompts only see the last
/// `prompt_window` of those. The counter is not bounded by the window.
#[derive(Clone, Debug)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    memory_window: usize,
    prompt_window: usize,
    turn_count: usize,
}

impl ConversationMemory {
    pub fn new(memory_window: usize, prompt_window: usize) -> Self {
        let memory_window = memory_window.max(1);
        Self {
            turns: VecDeque::with_capacity(memory_window),
            memory_window,
            prompt_window: prompt_window.min(memory_window),
            turn_count: 0,
        }
    }

    pub fn record(&mut self, user_message: &str, intent: Intent, agent_response: &str) {
        if self.turns.len() == self.memory_window {
            self.turns.pop_front();
        }
        self.turns.push_back(ConversationTurn {
            user_message: user_message.to_string(),
            intent,
            agent_response: agent_response.to_string(),
        });
        self.turn_count += 1;
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn recent_for_prompt(&self) -> impl Iterator<Item = &ConversationTurn> {
        let skip = self.turns.len().saturating_sub(self.prompt_window);
        self.turns.iter().skip(skip)
    }

    /// `User: ...\nAgent: ...` pairs for the prompt window, or `None` before the first turn.
    pub fn transcript(&self) -> Option<String> {
        let lines = self
            .recent_for_prompt()
            .map(|turn| format!("User: {}\nAgent: {}", turn.user_message, turn.agent_response))
            .collect::<Vec<_>>();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    pub fn classifier_context(&self) -> String {
        match self.transcript() {
            Some(transcript) => format!("Recent conversation:\n{transcript}"),
            None => crate::prompts::NO_HISTORY.to_string(),
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.turn_count = 0;
    }
}
